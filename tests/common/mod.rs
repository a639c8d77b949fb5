#![allow(dead_code)]
use caminos_router::*;
use caminos_router::event::Emission;

pub fn number(x:usize) -> ConfigurationValue
{
    ConfigurationValue::Number(x as f64)
}

pub fn literal(s:&str) -> ConfigurationValue
{
    ConfigurationValue::Literal(s.to_string())
}

pub fn create_router_config(fields: Vec<(&str,ConfigurationValue)>) -> ConfigurationValue
{
    ConfigurationValue::Object("Router".to_string(), fields.into_iter().map(|(k,v)|(k.to_string(),v)).collect())
}

pub fn create_network_config(router: ConfigurationValue, link_delay: usize) -> ConfigurationValue
{
    ConfigurationValue::Object("Network".to_string(), vec![
        ("router".to_string(), router),
        ("link_delay".to_string(), number(link_delay)),
    ])
}

pub fn mesh_parameters(node_id:usize, grid_size:usize, number_of_nodes:usize) -> RouterParameters
{
    let mut parameters = RouterParameters::new(node_id);
    parameters.ports = 5;
    parameters.grid_size = grid_size;
    parameters.number_of_nodes = number_of_nodes;
    parameters
}

pub fn point_to_point_parameters(node_id:usize) -> RouterParameters
{
    let mut parameters = RouterParameters::new(node_id);
    parameters.ports = 2;
    parameters.virtual_channels = 2;
    parameters.credits = 4;
    parameters.buffer_size = 4;
    parameters.number_of_nodes = 2;
    parameters.routing_scheme = RoutingScheme::PointToPoint;
    parameters
}

/// A packet already placed in the virtual channel `vc`, as an upstream router would send it.
pub fn packet_in_vc(source:usize, destination:usize, message_class:MessageClass, size:usize, vc:usize) -> Packet
{
    let mut packet = Packet::new(source,destination,message_class,size,0);
    packet.virtual_channel = vc;
    packet
}

/// Run `tock` for `cycles` cycles starting at `first_cycle`, collecting every emission with the cycle it happened.
pub fn run_router(router:&mut Router, first_cycle:Time, cycles:Time) -> Vec<(Time,Emission)>
{
    let mut emissions = vec![];
    for cycle in first_cycle..first_cycle+cycles
    {
        for emission in router.tock(cycle).emissions
        {
            emissions.push((cycle,emission));
        }
    }
    emissions
}
