mod common;
use caminos_router::*;
use caminos_router::routing::*;
use common::*;

fn parameters_for(scheme:RoutingScheme, number_of_nodes:usize, grid_size:usize, virtual_channels:usize) -> RouterParameters
{
    let mut parameters = RouterParameters::new(0);
    parameters.routing_scheme = scheme;
    parameters.number_of_nodes = number_of_nodes;
    parameters.grid_size = grid_size;
    parameters.virtual_channels = virtual_channels;
    parameters.ports = scheme.minimum_ports();
    parameters
}

fn ring_distance(from:usize, to:usize, size:usize) -> usize
{
    let forward = (to+size-from)%size;
    forward.min(size-forward)
}

/// Follow the first candidate from `source` until the packet is ejected, checking every hop. Returns the number of hops.
fn walk(routing:&dyn Routing, parameters:&RouterParameters, source:usize, destination:usize, message_class:MessageClass) -> usize
{
    let packet = Packet::new(source,destination,message_class,1,0);
    let class_range = class_virtual_channels(message_class,parameters.virtual_channels);
    let mut current = source;
    let mut hops = 0;
    loop
    {
        let candidates = routing.next(&packet,current).expect("a route must exist");
        assert!(!candidates.is_empty());
        assert!(candidates.virtual_channels.iter().all(|vc|class_range.contains(vc)),"{:?} leaves the class range {:?}",candidates,class_range);
        let port = candidates.ports[0];
        if port==LOCAL_PORT
        {
            assert_eq!(current,destination);
            assert_eq!(routing.neighbour(current,port),Location::ServerPort(current));
            return hops;
        }
        match routing.neighbour(current,port)
        {
            Location::RouterPort{router_index,router_port} =>
            {
                // Links are symmetric.
                assert_eq!(routing.neighbour(router_index,router_port),Location::RouterPort{router_index:current,router_port:port});
                current = router_index;
            },
            other => panic!("packet from {} to {} routed at {} through port {} towards {:?}",source,destination,current,port,other),
        }
        hops += 1;
        assert!(hops<=parameters.number_of_nodes,"packet from {} to {} does not reach its destination",source,destination);
    }
}

fn walk_every_pair(parameters:&RouterParameters, expected_hops:&dyn Fn(usize,usize)->usize)
{
    parameters.validate().expect("valid parameters");
    let routing = new_routing(RoutingBuilderArgument{parameters});
    let nodes = parameters.number_of_nodes;
    for source in 0..nodes
    {
        for destination in 0..nodes
        {
            for &message_class in [MessageClass::Request,MessageClass::Response].iter()
            {
                let hops = walk(routing.as_ref(),parameters,source,destination,message_class);
                assert_eq!(hops,expected_hops(source,destination),"hops from {} to {}",source,destination);
            }
        }
    }
}

#[test]
fn point_to_point_routes_terminate()
{
    let parameters = parameters_for(RoutingScheme::PointToPoint,2,8,2);
    walk_every_pair(&parameters,&|source,destination| if source==destination {0} else {1});
}

#[test]
fn mesh_routes_are_minimal()
{
    for &(nodes,grid) in [(16,4),(8,4),(12,3)].iter()
    {
        let parameters = parameters_for(RoutingScheme::MeshXY,nodes,grid,2);
        walk_every_pair(&parameters,&|source,destination|{
            let dx = (source%grid) as isize - (destination%grid) as isize;
            let dy = (source/grid) as isize - (destination/grid) as isize;
            (dx.abs()+dy.abs()) as usize
        });
    }
}

#[test]
fn torus_routes_are_minimal()
{
    for &(nodes,grid) in [(16,4),(25,5),(8,4)].iter()
    {
        let parameters = parameters_for(RoutingScheme::Torus,nodes,grid,16);
        let rows = nodes/grid;
        walk_every_pair(&parameters,&|source,destination|{
            ring_distance(source%grid,destination%grid,grid) + ring_distance(source/grid,destination/grid,rows)
        });
    }
}

#[test]
fn bidirectional_ring_routes_are_minimal()
{
    for &nodes in [3,6,7].iter()
    {
        let parameters = parameters_for(RoutingScheme::BidirectionalRing,nodes,8,8);
        walk_every_pair(&parameters,&|source,destination|ring_distance(source,destination,nodes));
    }
}

#[test]
fn unidirectional_ring_routes_go_clockwise()
{
    for &nodes in [3,5].iter()
    {
        let parameters = parameters_for(RoutingScheme::UnidirectionalRing,nodes,8,4);
        walk_every_pair(&parameters,&|source,destination|(destination+nodes-source)%nodes);
    }
}

#[test]
fn unidirectional_ring_changes_channel_after_the_dateline()
{
    let parameters = parameters_for(RoutingScheme::UnidirectionalRing,5,8,4);
    let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
    let packet = Packet::new(3,1,MessageClass::Request,1,0);
    let channels : Vec<usize> = [3,4,0].iter().map(|&node|routing.next(&packet,node).expect("route").virtual_channels[0]).collect();
    assert_eq!(channels,vec![1,1,0]);
    let response = Packet::new(3,1,MessageClass::Response,1,0);
    assert_eq!(routing.next(&response,4).expect("route").virtual_channels,vec![3]);
    assert_eq!(routing.next(&response,0).expect("route").virtual_channels,vec![2]);
}

#[test]
fn mesh_corner_ports_are_unconnected()
{
    let parameters = parameters_for(RoutingScheme::MeshXY,16,4,2);
    let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
    assert_eq!(routing.neighbour(0,X_NEGATIVE),Location::None);
    assert_eq!(routing.neighbour(0,Y_NEGATIVE),Location::None);
    assert_eq!(routing.neighbour(15,X_POSITIVE),Location::None);
    assert_eq!(routing.neighbour(15,Y_POSITIVE),Location::None);
    assert_eq!(routing.neighbour(0,X_POSITIVE),Location::RouterPort{router_index:1,router_port:X_NEGATIVE});
    assert_eq!(routing.neighbour(0,Y_POSITIVE),Location::RouterPort{router_index:4,router_port:Y_NEGATIVE});
    assert_eq!(routing.neighbour(0,Z_POSITIVE),Location::None);
}

#[test]
fn torus_wraps_around()
{
    let parameters = parameters_for(RoutingScheme::Torus,64,8,16);
    let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
    assert_eq!(routing.neighbour(0,X_NEGATIVE),Location::RouterPort{router_index:7,router_port:X_POSITIVE});
    assert_eq!(routing.neighbour(0,Y_NEGATIVE),Location::RouterPort{router_index:56,router_port:Y_POSITIVE});
    let candidates = routing.next(&Packet::new(0,7,MessageClass::Request,1,0),0).expect("route");
    assert_eq!(candidates,RoutingCandidates::new(X_NEGATIVE,vec![3]));
    let candidates = routing.next(&Packet::new(0,4,MessageClass::Response,1,0),0).expect("route");
    assert_eq!(candidates,RoutingCandidates::new(X_POSITIVE,vec![8]));
}

#[test]
fn routes_outside_the_network_fail()
{
    let parameters = parameters_for(RoutingScheme::MeshXY,16,4,2);
    let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
    match routing.next(&Packet::new(0,16,MessageClass::Request,1,0),0)
    {
        Err(error) => assert_eq!(error.kind,ErrorKind::RoutingFailure{current_node:0,destination:16}),
        Ok(candidates) => panic!("routed outside the network through {:?}",candidates),
    }
}

#[test]
fn schemes_by_name_and_index()
{
    assert_eq!(RoutingScheme::from_configuration(&literal("Torus")).expect("scheme"),RoutingScheme::Torus);
    assert_eq!(RoutingScheme::from_configuration(&literal("Ring")).expect("scheme"),RoutingScheme::BidirectionalRing);
    assert_eq!(RoutingScheme::from_configuration(&number(4)).expect("scheme"),RoutingScheme::UnidirectionalRing);
    assert!(RoutingScheme::from_configuration(&number(5)).is_err());
    assert!(RoutingScheme::from_configuration(&literal("Dragonfly")).is_err());
}

#[test]
fn route_computation_keeps_a_table_per_channel()
{
    let parameters = parameters_for(RoutingScheme::MeshXY,16,4,4);
    let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
    let mut rc = RouteComputation::new(std::rc::Rc::new(parameters),routing,LOCAL_PORT);
    assert!(rc.is_empty());
    rc.push(&packet_in_vc(0,5,MessageClass::Response,1,2));
    assert_eq!(rc.entry(2).possible_out_ports,vec![X_POSITIVE]);
    assert_eq!(rc.entry(2).possible_out_vcs,vec![2,3]);
    assert_eq!(rc.get_output_port(2),X_POSITIVE);
    assert_eq!(rc.get_virtual_channel(2),2);
    assert!(!rc.is_empty());
    rc.clear(2);
    assert!(rc.is_empty());
}
