
use crate::error::Error;
use crate::packet::Packet;
use crate::routing::{Routing,RoutingCandidates,Location,class_virtual_channels,group_virtual_channels,ring_channel_group,RING_CHANNEL_GROUPS,LOCAL_PORT,X_POSITIVE,X_NEGATIVE,Y_POSITIVE,Y_NEGATIVE};

///Coordinates of a grid of nodes. The first coordinate varies faster.
#[derive(Debug,Clone)]
pub struct CartesianData
{
	pub sides: Vec<usize>,
	pub size: usize,
}

impl CartesianData
{
	pub fn new(sides:&[usize]) -> CartesianData
	{
		CartesianData{
			sides:sides.to_vec(),
			size: sides.iter().product(),
		}
	}
	pub fn unpack(&self, mut router_index: usize) -> Vec<usize>
	{
		if router_index>=self.size
		{
			panic!("router_index={} is greater than the size of the CartesianData={}",router_index,self.size);
		}
		let mut r=Vec::with_capacity(self.sides.len());
		for side in self.sides.iter()
		{
			r.push(router_index%side);
			router_index/=side;
		}
		r
	}
	pub fn pack(&self, coordinates:&[usize]) -> usize
	{
		//check that the coordinates are within the sides
		for (c,s) in coordinates.iter().zip(self.sides.iter())
		{
			if *c>=*s
			{
				panic!("coordinate {} is greater than the side {}",c,s);
			}
		}
		let mut r=0;
		let mut stride=1;
		for (i,side) in self.sides.iter().enumerate()
		{
			r+=coordinates[i]*stride;
			stride*=side;
		}
		r
	}
	///The grid of `number_of_nodes` nodes in rows of `grid_size`.
	fn grid(grid_size:usize, number_of_nodes:usize) -> CartesianData
	{
		CartesianData::new(&[grid_size,number_of_nodes/grid_size])
	}
}

//The positive and negative ports of each dimension.
const DIMENSION_PORTS: [(usize,usize);2] = [(X_POSITIVE,X_NEGATIVE),(Y_POSITIVE,Y_NEGATIVE)];

///The dimension and direction reached through `port`, if it is a grid port.
fn port_dimension(port:usize) -> Option<(usize,bool)>
{
	DIMENSION_PORTS.iter().enumerate().find_map(|(dimension,&(positive,negative))|{
		if port==positive { Some((dimension,true)) }
		else if port==negative { Some((dimension,false)) }
		else { None }
	})
}

///Dimension order routing on a 2D mesh. The X coordinate is corrected first, then the Y coordinate.
///Any virtual channel of the message class can be used.
#[derive(Debug)]
pub struct MeshXY
{
	cartesian_data: CartesianData,
	virtual_channels: usize,
}

impl MeshXY
{
	pub fn new(grid_size:usize, number_of_nodes:usize, virtual_channels:usize) -> MeshXY
	{
		MeshXY{
			cartesian_data: CartesianData::grid(grid_size,number_of_nodes),
			virtual_channels,
		}
	}
}

impl Routing for MeshXY
{
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>
	{
		if packet.destination>=self.cartesian_data.size || current_node>=self.cartesian_data.size
		{
			return Err(error!(routing_failure,current_node,packet.destination));
		}
		let vcs : Vec<usize> = class_virtual_channels(packet.message_class,self.virtual_channels).collect();
		let here = self.cartesian_data.unpack(current_node);
		let there = self.cartesian_data.unpack(packet.destination);
		for (dimension,&(positive,negative)) in DIMENSION_PORTS.iter().enumerate()
		{
			if there[dimension] > here[dimension]
			{
				return Ok(RoutingCandidates::new(positive,vcs));
			}
			if there[dimension] < here[dimension]
			{
				return Ok(RoutingCandidates::new(negative,vcs));
			}
		}
		Ok(RoutingCandidates::new(LOCAL_PORT,vcs))
	}
	fn neighbour(&self, node:usize, port:usize) -> Location
	{
		if port==LOCAL_PORT
		{
			return Location::ServerPort(node);
		}
		let (dimension,positive) = match port_dimension(port)
		{
			Some(x) => x,
			None => return Location::None,
		};
		let mut coordinates = self.cartesian_data.unpack(node);
		let side = self.cartesian_data.sides[dimension];
		if positive
		{
			if coordinates[dimension]+1 >= side
			{
				return Location::None;
			}
			coordinates[dimension]+=1;
		}
		else
		{
			if coordinates[dimension]==0
			{
				return Location::None;
			}
			coordinates[dimension]-=1;
		}
		let (back_positive,back_negative) = DIMENSION_PORTS[dimension];
		Location::RouterPort{
			router_index: self.cartesian_data.pack(&coordinates),
			router_port: if positive { back_negative } else { back_positive },
		}
	}
}

///Dimension order routing on a 2D torus. In each dimension the shortest direction is taken, the positive one on ties.
///Each dimension has its own four channel groups inside the class range, chosen as in a bidirectional ring: negative hops take the odd
///groups, and hops that still have to take the wraparound link of the dimension take the upper pair.
#[derive(Debug)]
pub struct Torus
{
	cartesian_data: CartesianData,
	virtual_channels: usize,
}

impl Torus
{
	pub fn new(grid_size:usize, number_of_nodes:usize, virtual_channels:usize) -> Torus
	{
		Torus{
			cartesian_data: CartesianData::grid(grid_size,number_of_nodes),
			virtual_channels,
		}
	}
}

impl Routing for Torus
{
	fn next(&self, packet:&Packet, current_node:usize) -> Result<RoutingCandidates,Error>
	{
		if packet.destination>=self.cartesian_data.size || current_node>=self.cartesian_data.size
		{
			return Err(error!(routing_failure,current_node,packet.destination));
		}
		let here = self.cartesian_data.unpack(current_node);
		let there = self.cartesian_data.unpack(packet.destination);
		for (dimension,&(positive_port,negative_port)) in DIMENSION_PORTS.iter().enumerate()
		{
			if there[dimension]==here[dimension]
			{
				continue;
			}
			let side = self.cartesian_data.sides[dimension];
			let forward = (there[dimension]+side-here[dimension])%side;
			let positive = forward <= side/2;
			let crosses_wrap = if positive { there[dimension] < here[dimension] } else { there[dimension] > here[dimension] };
			let port = if positive {positive_port} else {negative_port};
			let group = dimension*RING_CHANNEL_GROUPS + ring_channel_group(positive,crosses_wrap);
			let groups = DIMENSION_PORTS.len()*RING_CHANNEL_GROUPS;
			return Ok(RoutingCandidates::new(port,group_virtual_channels(packet.message_class,self.virtual_channels,group,groups)));
		}
		Ok(RoutingCandidates::new(LOCAL_PORT,class_virtual_channels(packet.message_class,self.virtual_channels).collect()))
	}
	fn neighbour(&self, node:usize, port:usize) -> Location
	{
		if port==LOCAL_PORT
		{
			return Location::ServerPort(node);
		}
		let (dimension,positive) = match port_dimension(port)
		{
			Some(x) => x,
			None => return Location::None,
		};
		let mut coordinates = self.cartesian_data.unpack(node);
		let side = self.cartesian_data.sides[dimension];
		coordinates[dimension] = if positive { (coordinates[dimension]+1)%side } else { (coordinates[dimension]+side-1)%side };
		let (back_positive,back_negative) = DIMENSION_PORTS[dimension];
		Location::RouterPort{
			router_index: self.cartesian_data.pack(&coordinates),
			router_port: if positive { back_negative } else { back_positive },
		}
	}
}
