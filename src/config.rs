/*!

Configuration values and the parameters consumed when building a router.

The textual format of configuration files is out of the scope of this crate; whoever reads them is expected to produce a
`ConfigurationValue`. A router is described by an object such as

```ignore
Router{
	id: 5,//required
	ports: 7,
	vcs: 4,//at least 16 with "Torus", 8 with "Ring" and 4 with "UnidirectionalRing"
	credits: 30,
	buffer_size: 30,
	rc_scheme: "MeshXY",//or "PointToPoint", "Torus", "Ring", "UnidirectionalRing", or its index 0..=4
	no_nodes: 64,
	grid_size: 8,
	granularity: "Packet",//or "Flit"
	//injection_credit_return: 8,//credits returned to the local port per packet. Defaults to 8 with packets and 1 with flits.
}
```

*/

use crate::error::Error;
use crate::event::Time;

///A parsed configuration value.
#[derive(Clone,Debug,PartialEq)]
pub enum ConfigurationValue
{
	Literal(String),
	Number(f64),
	Object(String,Vec<(String,ConfigurationValue)>),
	Array(Vec<ConfigurationValue>),
	True,
	False,
}

/// match arms against the keys of an object
/// first argument, `$cv:expr`, is the ConfigurationValue expected to be the object
/// second argument, `$name:literal`, is the name the Object should have.
/// third argument, `$valueid:ident`, is the variable name capturing the value in the object's elements
///    and can be used in the arms
/// the remaining arguments are the arms of the match.
/// Returns from the enclosing function with an `Err` on unknown keys.
#[macro_export]
macro_rules! match_object{
	($cv:expr, $name:literal, $valueid:ident, $($arm:tt)* ) => {{
		match_object!($cv,[$name],$valueid,$($arm)*)
	}};
	($cv:expr, $names:expr, $valueid:ident, $($arm:tt)* ) => {{
		if let &$crate::config::ConfigurationValue::Object(ref cv_name, ref cv_pairs) = $cv
		{
			if !$names.iter().any(|&x|x==cv_name)
			{
				return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Expected one of {:?} but got `{}`",$names,cv_name)));
			}
			for &(ref name,ref $valueid) in cv_pairs
			{
				match AsRef::<str>::as_ref(&name)
				{
					$( $arm )*
					"legend_name" => (),
					_ => return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Nothing to do with field {} in {}",name,$names.get(0).unwrap_or_else(||&"None")))),
				}
			}
		}
		else
		{
			return Err($crate::error!(ill_formed_configuration,$cv.clone()).with_message(format!("Trying to create a {} from a non-Object",$names.get(0).unwrap_or_else(||&"None"))));
		}
	}};
}

impl ConfigurationValue
{
	pub fn as_str(&self) -> Result<&str,Error>
	{
		match self
		{
			&ConfigurationValue::Literal(ref s) => Ok(s),
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	pub fn as_usize(&self) -> Result<usize,Error>
	{
		match self
		{
			&ConfigurationValue::Number(x) =>{
				// Casting from a float to an integer will round the float towards zero, saturating at the bounds.
				let res =  x as usize;
				let y = res as f64;
				let tolerance = 1e-5;
				if x-y > tolerance || x-y < -tolerance {
					Err(error!(ill_formed_configuration, self.clone()))
				} else {
					Ok( res )
				}
			},
			_ => Err(error!(ill_formed_configuration, self.clone() )),
		}
	}
	pub fn as_time(&self) -> Result<Time,Error>
	{
		self.as_usize().map(|x|x as Time)
	}
	/// Build a generic IllFormedConfiguration error from this ConfigurationValue.
	pub fn ill(&self,message:&str) -> Error
	{
		error!(ill_formed_configuration,self.clone()).with_message(message.to_string())
	}
}

///How much data crosses the crossbar in a switch traversal.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum TransferGranularity
{
	///Whole packets are buffered and forwarded as a unit.
	Packet,
	///Packets are split into head/body/tail flits, forwarded one per traversal.
	Flit,
}

impl TransferGranularity
{
	pub fn from_configuration(value:&ConfigurationValue) -> Result<TransferGranularity,Error>
	{
		match value.as_str()?
		{
			"Packet" | "packet" => Ok(TransferGranularity::Packet),
			"Flit" | "flit" => Ok(TransferGranularity::Flit),
			other => Err(value.ill(&format!("unknown granularity {}",other))),
		}
	}
}

///The routing algorithm selected for a router.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum RoutingScheme
{
	///Two nodes joined by a single link.
	PointToPoint,
	///Dimension order routing (X then Y) on a 2D mesh.
	MeshXY,
	///Dimension order routing on a 2D torus, shortest direction in each dimension.
	Torus,
	///Shortest direction on a bidirectional ring.
	BidirectionalRing,
	///Always clockwise on a unidirectional ring.
	UnidirectionalRing,
}

impl RoutingScheme
{
	pub fn from_configuration(value:&ConfigurationValue) -> Result<RoutingScheme,Error>
	{
		match value
		{
			&ConfigurationValue::Literal(ref name) => match name.as_ref()
			{
				"PointToPoint" => Ok(RoutingScheme::PointToPoint),
				"MeshXY" | "XY" => Ok(RoutingScheme::MeshXY),
				"Torus" => Ok(RoutingScheme::Torus),
				"Ring" | "BidirectionalRing" => Ok(RoutingScheme::BidirectionalRing),
				"UnidirectionalRing" => Ok(RoutingScheme::UnidirectionalRing),
				_ => Err(value.ill("unknown routing scheme")),
			},
			&ConfigurationValue::Number(_) => match value.as_usize()?
			{
				0 => Ok(RoutingScheme::PointToPoint),
				1 => Ok(RoutingScheme::MeshXY),
				2 => Ok(RoutingScheme::Torus),
				3 => Ok(RoutingScheme::BidirectionalRing),
				4 => Ok(RoutingScheme::UnidirectionalRing),
				_ => Err(value.ill("routing scheme index out of range")),
			},
			_ => Err(value.ill("bad value for rc_scheme")),
		}
	}
	///The number of router ports the scheme makes use of, the local port included.
	pub fn minimum_ports(&self) -> usize
	{
		match self
		{
			RoutingScheme::PointToPoint => 2,
			RoutingScheme::MeshXY | RoutingScheme::Torus => 5,
			RoutingScheme::BidirectionalRing | RoutingScheme::UnidirectionalRing => 3,
		}
	}
	///The number of virtual channels required to give each message class its own channel for every channel group of the scheme.
	///Rings need a group for each side of the wraparound link in each direction, and a torus a set of those per dimension.
	pub fn minimum_virtual_channels(&self) -> usize
	{
		match self
		{
			RoutingScheme::PointToPoint | RoutingScheme::MeshXY => 1,
			RoutingScheme::UnidirectionalRing => 4,
			RoutingScheme::BidirectionalRing => 8,
			RoutingScheme::Torus => 16,
		}
	}
}

///Parameters of a router. Immutable once the router is built; shared with each of its units.
#[derive(Clone,Debug,PartialEq)]
pub struct RouterParameters
{
	///Index of the node this router belongs to.
	pub node_id: usize,
	pub ports: usize,
	pub virtual_channels: usize,
	///Initial credits towards each downstream virtual channel.
	pub credits: usize,
	///Capacity of each input virtual channel, in transfer units.
	pub buffer_size: usize,
	pub routing_scheme: RoutingScheme,
	pub number_of_nodes: usize,
	///Number of columns of the mesh or torus.
	pub grid_size: usize,
	pub granularity: TransferGranularity,
	///Credits sent back through the local port when a unit taken from it traverses the switch.
	pub injection_credit_return: usize,
}

impl RouterParameters
{
	///Default parameters for the router at `node_id`.
	pub fn new(node_id:usize) -> RouterParameters
	{
		RouterParameters{
			node_id,
			ports: 7,
			virtual_channels: 4,
			credits: 30,
			buffer_size: 30,
			routing_scheme: RoutingScheme::MeshXY,
			number_of_nodes: 64,
			grid_size: 8,
			granularity: TransferGranularity::Packet,
			injection_credit_return: 8,
		}
	}
	pub fn from_configuration(cv:&ConfigurationValue) -> Result<RouterParameters,Error>
	{
		let mut node_id=None;
		let mut ports=None;
		let mut virtual_channels=None;
		let mut credits=None;
		let mut buffer_size=None;
		let mut routing_scheme=None;
		let mut number_of_nodes=None;
		let mut grid_size=None;
		let mut granularity=None;
		let mut injection_credit_return=None;
		match_object!(cv,"Router",value,
			"id" | "node_id" => node_id = Some(value.as_usize()?),
			"ports" => ports = Some(value.as_usize()?),
			"vcs" | "virtual_channels" => virtual_channels = Some(value.as_usize()?),
			"credits" => credits = Some(value.as_usize()?),
			"buffer_size" => buffer_size = Some(value.as_usize()?),
			"rc_scheme" | "routing_scheme" => routing_scheme = Some(RoutingScheme::from_configuration(value)?),
			"no_nodes" | "number_of_nodes" => number_of_nodes = Some(value.as_usize()?),
			"grid_size" => grid_size = Some(value.as_usize()?),
			"granularity" => granularity = Some(TransferGranularity::from_configuration(value)?),
			"injection_credit_return" => injection_credit_return = Some(value.as_usize()?),
		);
		let node_id = node_id.ok_or_else(||error!(missing_parameter,"id").with_message("Specify node_id for the router".to_string()))?;
		let defaults = RouterParameters::new(node_id);
		let granularity = granularity.unwrap_or(defaults.granularity);
		let injection_credit_return = injection_credit_return.unwrap_or(match granularity
		{
			TransferGranularity::Packet => defaults.injection_credit_return,
			TransferGranularity::Flit => 1,
		});
		let parameters = RouterParameters{
			node_id,
			ports: ports.unwrap_or(defaults.ports),
			virtual_channels: virtual_channels.unwrap_or(defaults.virtual_channels),
			credits: credits.unwrap_or(defaults.credits),
			buffer_size: buffer_size.unwrap_or(defaults.buffer_size),
			routing_scheme: routing_scheme.unwrap_or(defaults.routing_scheme),
			number_of_nodes: number_of_nodes.unwrap_or(defaults.number_of_nodes),
			grid_size: grid_size.unwrap_or(defaults.grid_size),
			granularity,
			injection_credit_return,
		};
		parameters.validate()?;
		Ok(parameters)
	}
	///Check the parameters are coherent among themselves.
	pub fn validate(&self) -> Result<(),Error>
	{
		if self.ports==0 || self.virtual_channels==0 || self.credits==0 || self.buffer_size==0 || self.injection_credit_return==0
		{
			return Err(error!(bad_argument).with_message(format!("ports, vcs, credits, buffer_size and injection_credit_return must be positive in {:?}",self)));
		}
		if self.credits > self.buffer_size
		{
			return Err(error!(bad_argument).with_message(format!("{} credits would overflow buffers of {} units",self.credits,self.buffer_size)));
		}
		if self.ports < self.routing_scheme.minimum_ports()
		{
			return Err(error!(bad_argument).with_message(format!("{:?} requires at least {} ports but the router has {}",self.routing_scheme,self.routing_scheme.minimum_ports(),self.ports)));
		}
		if self.virtual_channels < self.routing_scheme.minimum_virtual_channels()
		{
			return Err(error!(bad_argument).with_message(format!("{:?} requires at least {} virtual channels but the router has {}",self.routing_scheme,self.routing_scheme.minimum_virtual_channels(),self.virtual_channels)));
		}
		if self.node_id >= self.number_of_nodes
		{
			return Err(error!(bad_argument).with_message(format!("node {} outside a network of {} nodes",self.node_id,self.number_of_nodes)));
		}
		match self.routing_scheme
		{
			RoutingScheme::PointToPoint => if self.number_of_nodes!=2
			{
				return Err(error!(bad_argument).with_message(format!("PointToPoint joins exactly 2 nodes, not {}",self.number_of_nodes)));
			},
			RoutingScheme::MeshXY | RoutingScheme::Torus => if self.grid_size==0 || self.number_of_nodes % self.grid_size != 0
			{
				return Err(error!(bad_argument).with_message(format!("a grid of {} columns does not tile {} nodes",self.grid_size,self.number_of_nodes)));
			},
			RoutingScheme::BidirectionalRing | RoutingScheme::UnidirectionalRing => (),
		}
		Ok(())
	}
	///Number of input/output virtual channel pairs, this is, the number of pipeline slots.
	pub fn slots(&self) -> usize
	{
		self.ports*self.virtual_channels
	}
}
