/*!

A Routing defines the ways to select the output port and virtual channel by which a packet leaves a router.

The routing scheme is chosen by the `rc_scheme` field of the router configuration. See [`new_routing`](fn.new_routing.html).

Ports are numbered the same in every router.
* 0 `nic`, the local port towards the network interface of the node.
* 1 `xPos` and 2 `xNeg`. In rings they are the clockwise (towards `id+1`) and counter-clockwise ports. In a point to point
network 1 is the port towards the other node.
* 3 `yPos` and 4 `yNeg`.
* 5 `zPos` and 6 `zNeg`, which no scheme uses.

Virtual channels are split by message class: with a single virtual channel both classes share it; otherwise requests use the lower half and
responses the upper half. Schemes with wraparound links split each half further into channel groups, see
[`ring_channel_group`](fn.ring_channel_group.html): a hop uses the upper pair of groups while the rest of its path along that ring
still has to take the wraparound link, and the lower pair once it has taken it. Negative hops take the odd groups. A torus keeps
apart the groups of each dimension.

*/

/// Contains PointToPoint, BidirectionalRing, UnidirectionalRing.
pub mod basic;
/// Contains MeshXY and Torus.
pub mod cartesian;

use std::fmt::Debug;
use std::ops::Range;
use std::rc::Rc;

use crate::config::{RouterParameters,RoutingScheme};
use crate::error::Error;
use crate::packet::{MessageClass,Packet};

pub use self::basic::*;
pub use self::cartesian::*;

pub const LOCAL_PORT: usize = 0;
pub const X_POSITIVE: usize = 1;
pub const X_NEGATIVE: usize = 2;
pub const Y_POSITIVE: usize = 3;
pub const Y_NEGATIVE: usize = 4;
pub const Z_POSITIVE: usize = 5;
pub const Z_NEGATIVE: usize = 6;
pub const CLOCKWISE: usize = X_POSITIVE;
pub const COUNTER_CLOCKWISE: usize = X_NEGATIVE;
///The names the ports receive in configurations and reports.
pub const PORT_NAMES: [&str;7] = ["nic","xPos","xNeg","yPos","yNeg","zPos","zNeg"];

///What is at the other side of a router port.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Location
{
	///The port `router_port` of the router `router_index`.
	RouterPort{
		router_index: usize,
		router_port: usize,
	},
	///The network interface of the given node.
	ServerPort(usize),
	///Nothing is connected.
	None,
}

///The candidates as provided by the routing. The router takes the first of each list; the remaining ones are alternatives.
#[derive(Clone,Debug,Default,PartialEq,Eq)]
pub struct RoutingCandidates
{
	pub ports: Vec<usize>,
	pub virtual_channels: Vec<usize>,
}

impl RoutingCandidates
{
	pub fn new(port:usize, virtual_channels:Vec<usize>) -> RoutingCandidates
	{
		RoutingCandidates{
			ports: vec![port],
			virtual_channels,
		}
	}
	pub fn is_empty(&self) -> bool
	{
		self.ports.is_empty() || self.virtual_channels.is_empty()
	}
}

///A routing algorithm together with the wiring it assumes.
pub trait Routing : Debug
{
	///Compute the candidate egresses for `packet` at the router of `current_node`.
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>;
	///The other side of the port `port` of the router of `node`.
	fn neighbour(&self, node:usize, port:usize) -> Location;
}

pub struct RoutingBuilderArgument<'a>
{
	///The parameters of the router. The routing uses the scheme, the network size and the number of virtual channels.
	pub parameters: &'a RouterParameters,
}

/**Build a routing for the scheme in the parameters.

* `PointToPoint` needs exactly two nodes.
* `MeshXY` and `Torus` arrange `number_of_nodes` in rows of `grid_size` nodes.
* `Ring` and `UnidirectionalRing` use the nodes in index order.
**/
pub fn new_routing(arg: RoutingBuilderArgument) -> Rc<dyn Routing>
{
	let parameters = arg.parameters;
	match parameters.routing_scheme
	{
		RoutingScheme::PointToPoint => Rc::new(PointToPoint::new(parameters.virtual_channels)),
		RoutingScheme::MeshXY => Rc::new(MeshXY::new(parameters.grid_size,parameters.number_of_nodes,parameters.virtual_channels)),
		RoutingScheme::Torus => Rc::new(Torus::new(parameters.grid_size,parameters.number_of_nodes,parameters.virtual_channels)),
		RoutingScheme::BidirectionalRing => Rc::new(BidirectionalRing::new(parameters.number_of_nodes,parameters.virtual_channels)),
		RoutingScheme::UnidirectionalRing => Rc::new(UnidirectionalRing::new(parameters.number_of_nodes,parameters.virtual_channels)),
	}
}

///The range of virtual channels reserved to a message class.
pub fn class_virtual_channels(class:MessageClass, virtual_channels:usize) -> Range<usize>
{
	if virtual_channels<=1
	{
		return 0..1;
	}
	let half = virtual_channels/2;
	match class
	{
		MessageClass::Request => 0..half,
		MessageClass::Response => half..virtual_channels,
	}
}

///Number of channel groups a bidirectional ring uses inside each class range.
pub const RING_CHANNEL_GROUPS: usize = 4;

///The channel group of a hop along a ring, below [`RING_CHANNEL_GROUPS`](constant.RING_CHANNEL_GROUPS.html).
///`crosses_wrap` tells whether the remaining path along the ring still includes the wraparound link.
pub fn ring_channel_group(positive:bool, crosses_wrap:bool) -> usize
{
	let stage = if crosses_wrap {2} else {0};
	let direction = if positive {0} else {1};
	stage+direction
}

///The virtual channels of the class range whose offset from the start of the range is `group` modulo `groups`.
///A class range shorter than `groups` folds the groups onto its channels.
pub fn group_virtual_channels(class:MessageClass, virtual_channels:usize, group:usize, groups:usize) -> Vec<usize>
{
	let range = class_virtual_channels(class,virtual_channels);
	let start = range.start;
	if range.len()<groups
	{
		return vec![start+group%range.len()];
	}
	range.filter(|vc|(vc-start)%groups==group).collect()
}

///The route of a virtual channel of an input port.
#[derive(Clone,Debug,Default)]
pub struct RouteTableEntry
{
	pub possible_out_ports: Vec<usize>,
	pub possible_out_vcs: Vec<usize>,
	///The last candidates handed out by the round robin accessors.
	pub out_port: Option<usize>,
	pub out_vc: Option<usize>,
	port_cursor: usize,
	vc_cursor: usize,
	pub route_valid: bool,
}

///The route computation unit of an input port. It keeps the candidates of the packet at the front of each virtual channel.
#[derive(Debug)]
pub struct RouteComputation
{
	parameters: Rc<RouterParameters>,
	routing: Rc<dyn Routing>,
	///The input port this unit serves.
	port: usize,
	entries: Vec<RouteTableEntry>,
}

impl RouteComputation
{
	pub fn new(parameters:Rc<RouterParameters>, routing:Rc<dyn Routing>, port:usize) -> RouteComputation
	{
		let entries = vec![RouteTableEntry::default(); parameters.virtual_channels];
		RouteComputation{
			parameters,
			routing,
			port,
			entries,
		}
	}
	///Route `packet`, which is at the front of its virtual channel. Previous candidates of that channel are replaced.
	pub fn push(&mut self, packet:&Packet)
	{
		let vc = packet.virtual_channel;
		self.clear(vc);
		let node = self.parameters.node_id;
		let candidates = match self.routing.next(packet,node)
		{
			Ok(candidates) => candidates,
			Err(error) => panic!("route computation at node {} port {} vc {} failed: {}",node,self.port,vc,error),
		};
		if candidates.is_empty()
		{
			panic!("route computation at node {} port {} vc {} gave no candidates towards {}",node,self.port,vc,packet.destination);
		}
		let entry = &mut self.entries[vc];
		entry.possible_out_ports = candidates.ports;
		entry.possible_out_vcs = candidates.virtual_channels;
		entry.route_valid = true;
	}
	///Forget the route of a virtual channel.
	pub fn clear(&mut self, vc:usize)
	{
		self.entries[vc] = RouteTableEntry::default();
	}
	///Whether no virtual channel holds a route.
	pub fn is_empty(&self) -> bool
	{
		self.entries.iter().all(|entry|!entry.route_valid)
	}
	pub fn entry(&self, vc:usize) -> &RouteTableEntry
	{
		&self.entries[vc]
	}
	///Next candidate output port of `vc` in round robin order.
	pub fn get_output_port(&mut self, vc:usize) -> usize
	{
		let entry = &mut self.entries[vc];
		assert!(entry.route_valid,"no route in vc {}",vc);
		let port = entry.possible_out_ports[entry.port_cursor];
		entry.port_cursor = (entry.port_cursor+1) % entry.possible_out_ports.len();
		entry.out_port = Some(port);
		port
	}
	///Next candidate output virtual channel of `vc` in round robin order.
	pub fn get_virtual_channel(&mut self, vc:usize) -> usize
	{
		let entry = &mut self.entries[vc];
		assert!(entry.route_valid,"no route in vc {}",vc);
		let out_vc = entry.possible_out_vcs[entry.vc_cursor];
		entry.vc_cursor = (entry.vc_cursor+1) % entry.possible_out_vcs.len();
		entry.out_vc = Some(out_vc);
		out_vc
	}
}
