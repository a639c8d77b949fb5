
use crate::error::Error;
use crate::packet::Packet;
use crate::routing::{Routing,RoutingCandidates,Location,class_virtual_channels,group_virtual_channels,ring_channel_group,RING_CHANNEL_GROUPS,LOCAL_PORT,CLOCKWISE,COUNTER_CLOCKWISE};

///Two nodes joined by a link on the port 1 of each router.
///The virtual channel is given by the message class alone.
#[derive(Debug)]
pub struct PointToPoint
{
	virtual_channels: usize,
}

impl PointToPoint
{
	pub fn new(virtual_channels:usize) -> PointToPoint
	{
		PointToPoint{ virtual_channels }
	}
}

impl Routing for PointToPoint
{
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>
	{
		if packet.destination>=2 || current_node>=2
		{
			return Err(error!(routing_failure,current_node,packet.destination).with_message("point to point networks have nodes 0 and 1".to_string()));
		}
		let vcs = class_virtual_channels(packet.message_class,self.virtual_channels).collect();
		if packet.destination==current_node
		{
			Ok(RoutingCandidates::new(LOCAL_PORT,vcs))
		}
		else
		{
			Ok(RoutingCandidates::new(CLOCKWISE,vcs))
		}
	}
	fn neighbour(&self, node:usize, port:usize) -> Location
	{
		match port
		{
			LOCAL_PORT => Location::ServerPort(node),
			CLOCKWISE => Location::RouterPort{ router_index:1-node, router_port:CLOCKWISE },
			_ => Location::None,
		}
	}
}

fn ring_neighbour(size:usize, node:usize, port:usize) -> Location
{
	match port
	{
		LOCAL_PORT => Location::ServerPort(node),
		CLOCKWISE => Location::RouterPort{ router_index:(node+1)%size, router_port:COUNTER_CLOCKWISE },
		COUNTER_CLOCKWISE => Location::RouterPort{ router_index:(node+size-1)%size, router_port:CLOCKWISE },
		_ => Location::None,
	}
}

///A ring with links in both directions. Packets go by the shortest direction, clockwise on ties.
///Clockwise hops use the even channel groups of the class and counter-clockwise hops the odd ones. Hops whose remaining path
///still takes the link between the last node and node 0 use the upper pair of groups.
#[derive(Debug)]
pub struct BidirectionalRing
{
	size: usize,
	virtual_channels: usize,
}

impl BidirectionalRing
{
	pub fn new(size:usize, virtual_channels:usize) -> BidirectionalRing
	{
		BidirectionalRing{ size, virtual_channels }
	}
}

impl Routing for BidirectionalRing
{
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>
	{
		let target = packet.destination;
		if target>=self.size || current_node>=self.size
		{
			return Err(error!(routing_failure,current_node,target));
		}
		let forward = (target+self.size-current_node)%self.size;
		if forward==0
		{
			return Ok(RoutingCandidates::new(LOCAL_PORT,class_virtual_channels(packet.message_class,self.virtual_channels).collect()));
		}
		let positive = forward <= self.size/2;
		let crosses_wrap = if positive { target < current_node } else { target > current_node };
		let port = if positive {CLOCKWISE} else {COUNTER_CLOCKWISE};
		let group = ring_channel_group(positive,crosses_wrap);
		Ok(RoutingCandidates::new(port,group_virtual_channels(packet.message_class,self.virtual_channels,group,RING_CHANNEL_GROUPS)))
	}
	fn neighbour(&self, node:usize, port:usize) -> Location
	{
		ring_neighbour(self.size,node,port)
	}
}

///A ring traversed only clockwise. The link from the last node to node 0 is the dateline:
///packets whose remaining path crosses it use the odd virtual channels of their class, and the even ones after it.
#[derive(Debug)]
pub struct UnidirectionalRing
{
	size: usize,
	virtual_channels: usize,
}

impl UnidirectionalRing
{
	pub fn new(size:usize, virtual_channels:usize) -> UnidirectionalRing
	{
		UnidirectionalRing{ size, virtual_channels }
	}
}

impl Routing for UnidirectionalRing
{
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>
	{
		let target = packet.destination;
		if target>=self.size || current_node>=self.size
		{
			return Err(error!(routing_failure,current_node,target));
		}
		if target==current_node
		{
			return Ok(RoutingCandidates::new(LOCAL_PORT,class_virtual_channels(packet.message_class,self.virtual_channels).collect()));
		}
		let crosses_dateline = target < current_node;
		let group = if crosses_dateline {1} else {0};
		Ok(RoutingCandidates::new(CLOCKWISE,group_virtual_channels(packet.message_class,self.virtual_channels,group,2)))
	}
	fn neighbour(&self, node:usize, port:usize) -> Location
	{
		ring_neighbour(self.size,node,port)
	}
}
