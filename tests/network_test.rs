mod common;
use caminos_router::*;
use caminos_router::traffic::uniform_random_packets;
use common::*;
use rand::{rngs::StdRng,SeedableRng};

fn summary(packets:&[Packet]) -> Vec<(usize,usize,Vec<u8>)>
{
    let mut summary : Vec<(usize,usize,Vec<u8>)> = packets.iter().map(|p|(p.source,p.destination,p.payload.clone())).collect();
    summary.sort();
    summary
}

fn delivered_summary(network:&Network) -> Vec<(usize,usize,Vec<u8>)>
{
    let delivered : Vec<Packet> = (0..network.number_of_nodes()).flat_map(|node|{
        assert!(network.delivered(node).iter().all(|p|p.destination==node));
        network.delivered(node).to_vec()
    }).collect();
    summary(&delivered)
}

/// Inject the packets, run the network dry and check every packet arrived intact.
fn drain(mut network:Network, packets:Vec<Packet>)
{
    let expected = summary(&packets);
    for packet in packets
    {
        network.inject(packet).expect("packet inside the network");
    }
    network.run_until_idle(200_000).expect("the network must drain");
    assert_eq!(network.total_delivered(),expected.len());
    assert_eq!(delivered_summary(&network),expected);
    for node in 0..network.number_of_nodes()
    {
        let router = network.router(node);
        assert!(router.is_idle());
        assert!(router.vc_allocator().no_requestors());
        assert!(router.switch_allocator().is_empty());
        assert!(router.credit_table().iter().all(|&credits|credits==router.parameters().credits),"router {} lost credits",node);
    }
}

fn small_mesh(granularity:TransferGranularity) -> RouterParameters
{
    let mut parameters = mesh_parameters(0,4,16);
    parameters.virtual_channels = 4;
    parameters.credits = 4;
    parameters.buffer_size = 4;
    parameters.granularity = granularity;
    if granularity==TransferGranularity::Flit
    {
        parameters.injection_credit_return = 1;
    }
    parameters
}

#[test]
fn mesh_drains_whole_packets()
{
    let network = Network::new(small_mesh(TransferGranularity::Packet),1).expect("valid network");
    let mut rng = StdRng::seed_from_u64(3);
    drain(network,uniform_random_packets(16,300,4,&mut rng));
}

#[test]
fn mesh_drains_flits()
{
    let network = Network::new(small_mesh(TransferGranularity::Flit),2).expect("valid network");
    let mut rng = StdRng::seed_from_u64(4);
    drain(network,uniform_random_packets(16,200,3,&mut rng));
}

#[test]
fn unidirectional_ring_drains_flits()
{
    let cv = create_network_config(create_router_config(vec![
        ("rc_scheme",literal("UnidirectionalRing")),
        ("ports",number(3)),
        ("vcs",number(4)),
        ("credits",number(4)),
        ("buffer_size",number(4)),
        ("no_nodes",number(6)),
        ("granularity",literal("Flit")),
    ]),2);
    let network = Network::from_configuration(&cv).expect("valid network");
    assert_eq!(network.number_of_nodes(),6);
    assert_eq!(network.router(5).node_id(),5);
    assert_eq!(network.router(0).parameters().injection_credit_return,1);
    let mut rng = StdRng::seed_from_u64(5);
    drain(network,uniform_random_packets(6,150,5,&mut rng));
}

/// A 4x4 torus with the scarcest buffering each granularity allows, so that packets block around the wraparound links.
fn small_torus(granularity:TransferGranularity) -> RouterParameters
{
    let mut parameters = mesh_parameters(0,4,16);
    parameters.routing_scheme = RoutingScheme::Torus;
    parameters.virtual_channels = 16;
    parameters.granularity = granularity;
    match granularity
    {
        TransferGranularity::Packet =>
        {
            parameters.credits = 1;
            parameters.buffer_size = 1;
        },
        TransferGranularity::Flit =>
        {
            parameters.credits = 2;
            parameters.buffer_size = 2;
            parameters.injection_credit_return = 1;
        },
    }
    parameters
}

fn small_ring(granularity:TransferGranularity) -> RouterParameters
{
    let mut parameters = small_torus(granularity);
    parameters.routing_scheme = RoutingScheme::BidirectionalRing;
    parameters.ports = 3;
    parameters.virtual_channels = 8;
    parameters.number_of_nodes = 8;
    parameters
}

#[test]
fn torus_drains_whole_packets()
{
    for seed in 20..23
    {
        let network = Network::new(small_torus(TransferGranularity::Packet),1).expect("valid network");
        let mut rng = StdRng::seed_from_u64(seed);
        drain(network,uniform_random_packets(16,800,2,&mut rng));
    }
}

#[test]
fn torus_drains_flits()
{
    for seed in 30..33
    {
        let network = Network::new(small_torus(TransferGranularity::Flit),1).expect("valid network");
        let mut rng = StdRng::seed_from_u64(seed);
        drain(network,uniform_random_packets(16,800,6,&mut rng));
    }
}

#[test]
fn bidirectional_ring_drains_whole_packets()
{
    for seed in 40..43
    {
        let network = Network::new(small_ring(TransferGranularity::Packet),1).expect("valid network");
        let mut rng = StdRng::seed_from_u64(seed);
        drain(network,uniform_random_packets(8,800,2,&mut rng));
    }
}

#[test]
fn bidirectional_ring_drains_flits()
{
    for seed in 50..53
    {
        let network = Network::new(small_ring(TransferGranularity::Flit),1).expect("valid network");
        let mut rng = StdRng::seed_from_u64(seed);
        drain(network,uniform_random_packets(8,800,6,&mut rng));
    }
}

#[test]
fn point_to_point_drains_both_ways()
{
    let network = Network::new(point_to_point_parameters(0),1).expect("valid network");
    let mut rng = StdRng::seed_from_u64(6);
    drain(network,uniform_random_packets(2,60,2,&mut rng));
}

/// Run the packets through a 3x3 mesh checking after every cycle that no credit of a link between routers is created or lost.
fn check_credit_conservation(granularity:TransferGranularity, seed:u64)
{
    let parameters = {
        let mut parameters = mesh_parameters(0,3,9);
        parameters.virtual_channels = 2;
        parameters.credits = 3;
        parameters.buffer_size = 3;
        parameters.granularity = granularity;
        if granularity==TransferGranularity::Flit
        {
            parameters.injection_credit_return = 1;
        }
        parameters
    };
    let mut network = Network::new(parameters,1).expect("valid network");
    let mut rng = StdRng::seed_from_u64(seed);
    for packet in uniform_random_packets(9,120,4,&mut rng)
    {
        network.inject(packet).expect("packet inside the network");
    }
    let mut checked_links = 0;
    while !network.is_idle()
    {
        assert!(network.cycle()<50_000,"the network must drain");
        network.step();
        for node in 0..9
        {
            for port in 1..5
            {
                for vc in 0..2
                {
                    if let Some(balance) = network.credit_balance(node,port,vc)
                    {
                        assert_eq!(balance,3,"credits of router {} port {} vc {} at cycle {}",node,port,vc,network.cycle());
                        checked_links += 1;
                    }
                }
            }
        }
    }
    assert!(checked_links>0);
    assert_eq!(network.total_delivered(),120);
    // Ports towards the NIC or unconnected have no balance.
    assert_eq!(network.credit_balance(0,0,0),None);
    assert_eq!(network.credit_balance(0,2,0),None);
}

#[test]
fn credits_are_conserved_every_cycle()
{
    check_credit_conservation(TransferGranularity::Flit,8);
}

#[test]
fn credits_are_conserved_every_cycle_with_whole_packets()
{
    check_credit_conservation(TransferGranularity::Packet,10);
}

#[test]
fn idle_routers_stop_their_clock()
{
    let mut network = Network::new(point_to_point_parameters(0),1).expect("valid network");
    network.step();
    for node in 0..2
    {
        assert!(!network.router(node).is_clocking());
        assert_eq!(network.router(node).statistics().empty_cycles,1);
    }
    for _ in 0..10
    {
        network.step();
    }
    assert_eq!(network.router(0).statistics().empty_cycles,1);
    assert_eq!(network.cycle(),11);

    network.inject(Packet::new(0,1,MessageClass::Response,2,network.cycle())).expect("packet inside the network");
    network.step();
    // The packet is still in the link.
    assert!(!network.router(0).is_clocking());
    network.step();
    assert!(network.router(0).is_clocking());
    network.run_until_idle(1_000).expect("the network must drain");
    assert_eq!(network.delivered(1).len(),1);
    for node in 0..2
    {
        let router = network.router(node);
        assert!(!router.is_clocking());
        assert!(router.statistics().empty_cycles>=2);
        assert_eq!(router.statistics().packets_out,1);
    }
}

#[test]
fn networks_are_validated()
{
    assert!(Network::new(small_mesh(TransferGranularity::Packet),0).is_err());
    let mut parameters = small_mesh(TransferGranularity::Packet);
    parameters.grid_size = 5;
    assert!(Network::new(parameters,1).is_err());
    let mut network = Network::new(small_mesh(TransferGranularity::Packet),1).expect("valid network");
    assert!(network.inject(Packet::new(0,16,MessageClass::Request,1,0)).is_err());
    let cv = create_network_config(create_router_config(vec![("rc_scheme",literal("Hypercube"))]),1);
    assert!(Network::from_configuration(&cv).is_err());
}

#[test]
fn network_statistics_gather_every_router()
{
    let mut network = Network::new(small_mesh(TransferGranularity::Packet),1).expect("valid network");
    let mut rng = StdRng::seed_from_u64(9);
    for packet in uniform_random_packets(16,40,2,&mut rng)
    {
        network.inject(packet).expect("packet inside the network");
    }
    network.run_until_idle(50_000).expect("the network must drain");
    let packets_out : usize = (0..16).map(|node|network.router(node).statistics().packets_out).sum();
    assert!(packets_out>=40);
    match network.aggregate_statistics()
    {
        ConfigurationValue::Object(name,pairs) =>
        {
            assert_eq!(name,"network");
            assert_eq!(pairs[1],("delivered_packets".to_string(),number(40)));
            match &pairs[2].1
            {
                ConfigurationValue::Array(routers) => assert_eq!(routers.len(),16),
                other => panic!("unexpected routers {:?}",other),
            }
        },
        other => panic!("unexpected statistics {:?}",other),
    }
}
