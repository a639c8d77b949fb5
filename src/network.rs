/*!

A network of routers, one per node, with a network interface (NIC) attached to the local port of each router.

This is the scheduling and link machinery the routers expect around them. Every message put in a link arrives `link_delay`
cycles later. Each cycle:
1. The messages arriving this cycle are delivered. Arrivals to a router with its clock disabled enable it again.
2. Each NIC injects at most one unit into its router, if it has credits for it.
3. Every router with its clock enabled runs `tock`. Its emissions are put in the links.

A network is described by an object such as
```ignore
Network{
	router: Router{
		rc_scheme: "MeshXY",
		ports: 5,
		vcs: 2,
		no_nodes: 16,
		grid_size: 4,
	},//the `id` is given by the network to each router
	link_delay: 1,
}
```

*/

use std::collections::VecDeque;
use std::rc::Rc;

use log::debug;

use crate::config::{ConfigurationValue,RouterParameters,TransferGranularity};
use crate::error::Error;
use crate::event::{ClockAction,Event,EventGeneration,EventQueue,Time};
use crate::packet::{Flit,LinkMessage,Packet};
use crate::router::Router;
use crate::routing::{class_virtual_channels,new_routing,Location,Routing,RoutingBuilderArgument,LOCAL_PORT};

///The network interface of a node. It injects the packets generated at the node and consumes the packets addressed to it.
#[derive(Debug)]
pub struct Nic
{
	node: usize,
	granularity: TransferGranularity,
	virtual_channels: usize,
	///Credits spent per unit injected. The router returns the same amount when the unit leaves its local port.
	injection_credit_return: usize,
	///Credits towards each virtual channel of the local port of the router.
	credits: Vec<usize>,
	///Units waiting to be injected.
	queue: VecDeque<Flit>,
	///The head of the packet being received in each virtual channel.
	reassembly: Vec<Option<Packet>>,
	delivered: Vec<Packet>,
}

impl Nic
{
	pub fn new(node:usize, parameters:&RouterParameters) -> Nic
	{
		let vcs = parameters.virtual_channels;
		Nic{
			node,
			granularity: parameters.granularity,
			virtual_channels: vcs,
			injection_credit_return: parameters.injection_credit_return,
			credits: vec![parameters.credits*parameters.injection_credit_return;vcs],
			queue: VecDeque::new(),
			reassembly: vec![None;vcs],
			delivered: vec![],
		}
	}
	///Queue a packet for injection in the first virtual channel of its class.
	pub fn enqueue(&mut self, mut packet:Packet)
	{
		packet.virtual_channel = class_virtual_channels(packet.message_class,self.virtual_channels).start;
		match self.granularity
		{
			TransferGranularity::Packet => self.queue.push_back(Flit::whole(packet)),
			TransferGranularity::Flit => self.queue.extend(Flit::segment(packet)),
		}
	}
	///The unit to send to the router this cycle, if any and there are credits for it.
	pub fn try_inject(&mut self, cycle:Time) -> Option<LinkMessage>
	{
		let vc = self.queue.front()?.virtual_channel;
		if self.credits[vc] < self.injection_credit_return
		{
			return None;
		}
		self.credits[vc] -= self.injection_credit_return;
		let mut flit = self.queue.pop_front()?;
		if let Some(ref mut packet) = flit.packet
		{
			packet.send_cycle = cycle;
		}
		Some(match self.granularity
		{
			TransferGranularity::Packet => match flit.packet
			{
				Some(packet) => LinkMessage::Packet(packet),
				None => panic!("nic {} queued a unit without packet",self.node),
			},
			TransferGranularity::Flit => LinkMessage::Flit(flit),
		})
	}
	///Apply a message from the router. Returns the credit to send back, if any.
	pub fn receive(&mut self, message:LinkMessage) -> Option<LinkMessage>
	{
		match message
		{
			LinkMessage::Credit{virtual_channel,count} =>
			{
				self.credits[virtual_channel] += count;
				None
			},
			LinkMessage::Packet(packet) =>
			{
				let virtual_channel = packet.virtual_channel;
				self.consume(packet);
				Some(LinkMessage::Credit{virtual_channel,count:1})
			},
			LinkMessage::Flit(flit) =>
			{
				let virtual_channel = flit.virtual_channel;
				let is_tail = flit.is_tail();
				if let Some(packet) = flit.packet
				{
					if self.reassembly[virtual_channel].is_some()
					{
						panic!("nic {} received a head in vc {} before the tail of the previous packet",self.node,virtual_channel);
					}
					self.reassembly[virtual_channel] = Some(packet);
				}
				if is_tail
				{
					match self.reassembly[virtual_channel].take()
					{
						Some(packet) => self.consume(packet),
						None => panic!("nic {} received a tail in vc {} without head",self.node,virtual_channel),
					}
				}
				Some(LinkMessage::Credit{virtual_channel,count:1})
			},
		}
	}
	fn consume(&mut self, packet:Packet)
	{
		if packet.destination!=self.node
		{
			panic!("nic {} consumed a packet addressed to {}",self.node,packet.destination);
		}
		self.delivered.push(packet);
	}
	///Whether nothing waits for injection and no packet is half received.
	pub fn is_idle(&self) -> bool
	{
		self.queue.is_empty() && self.reassembly.iter().all(|p|p.is_none())
	}
	pub fn delivered(&self) -> &[Packet]
	{
		&self.delivered
	}
	pub fn credits(&self, vc:usize) -> usize
	{
		self.credits[vc]
	}
}

pub struct Network
{
	routers: Vec<Router>,
	nics: Vec<Nic>,
	///Used for the wiring of the ports.
	routing: Rc<dyn Routing>,
	link_delay: Time,
	event_queue: EventQueue,
	cycle: Time,
}

impl Network
{
	///Build a network with a router per node from `template`, whose `node_id` is ignored.
	pub fn new(template:RouterParameters, link_delay:Time) -> Result<Network,Error>
	{
		if link_delay==0
		{
			return Err(error!(bad_argument).with_message("links need a delay of at least one cycle".to_string()));
		}
		let mut routers = Vec::with_capacity(template.number_of_nodes);
		let mut nics = Vec::with_capacity(template.number_of_nodes);
		for node in 0..template.number_of_nodes
		{
			let parameters = RouterParameters{ node_id:node, ..template.clone() };
			nics.push(Nic::new(node,&parameters));
			routers.push(Router::new(parameters)?);
		}
		let routing = new_routing(RoutingBuilderArgument{parameters:&template});
		Ok(Network{
			routers,
			nics,
			routing,
			link_delay,
			event_queue: EventQueue::new(link_delay as usize+1),
			cycle: 0,
		})
	}
	pub fn from_configuration(cv:&ConfigurationValue) -> Result<Network,Error>
	{
		let mut router = None;
		let mut link_delay = 1;
		match_object!(cv,"Network",value,
			"router" => router = Some(value),
			"link_delay" => link_delay = value.as_time()?,
		);
		let router = router.ok_or_else(||error!(missing_parameter,"router"))?;
		//The id of the template is irrelevant; give one if missing.
		let router = match router
		{
			ConfigurationValue::Object(name,pairs) if !pairs.iter().any(|(key,_)|key=="id" || key=="node_id") =>
			{
				let mut pairs = pairs.clone();
				pairs.push((String::from("id"),ConfigurationValue::Number(0.0)));
				ConfigurationValue::Object(name.clone(),pairs)
			},
			other => other.clone(),
		};
		Network::new(RouterParameters::from_configuration(&router)?,link_delay)
	}
	///Queue a packet in the NIC of its source node.
	pub fn inject(&mut self, packet:Packet) -> Result<(),Error>
	{
		let nodes = self.nics.len();
		if packet.source>=nodes || packet.destination>=nodes
		{
			return Err(error!(bad_argument).with_message(format!("packet from {} to {} in a network of {} nodes",packet.source,packet.destination,nodes)));
		}
		self.nics[packet.source].enqueue(packet);
		Ok(())
	}
	fn send_from_router(&mut self, router:usize, port:usize, message:LinkMessage)
	{
		let event = match self.routing.neighbour(router,port)
		{
			Location::RouterPort{router_index,router_port} => Event::ToRouter{ router:router_index, port:router_port, message },
			Location::ServerPort(node) => Event::ToNic{ node, message },
			Location::None => panic!("router {} emitted {:?} through the unconnected port {}",router,message,port),
		};
		self.event_queue.enqueue(EventGeneration{ delay:self.link_delay, event });
	}
	///Simulate a cycle.
	pub fn step(&mut self)
	{
		let cycle = self.cycle;
		for event in self.event_queue.take_current()
		{
			match event
			{
				Event::ToRouter{router,port,message} =>
				{
					self.routers[router].handle_link_arrival(port,message);
				},
				Event::ToNic{node,message} =>
				{
					if let Some(credit) = self.nics[node].receive(message)
					{
						self.event_queue.enqueue(EventGeneration{
							delay: self.link_delay,
							event: Event::ToRouter{ router:node, port:LOCAL_PORT, message:credit },
						});
					}
				},
			}
		}
		for node in 0..self.nics.len()
		{
			if let Some(message) = self.nics[node].try_inject(cycle)
			{
				self.event_queue.enqueue(EventGeneration{
					delay: self.link_delay,
					event: Event::ToRouter{ router:node, port:LOCAL_PORT, message },
				});
			}
		}
		for index in 0..self.routers.len()
		{
			if !self.routers[index].is_clocking()
			{
				continue;
			}
			let outcome = self.routers[index].tock(cycle);
			for emission in outcome.emissions
			{
				self.send_from_router(index,emission.port,emission.message);
			}
			if outcome.clock==ClockAction::Unregister
			{
				debug!("network: router {} unregistered at cycle {}",index,cycle);
			}
		}
		self.event_queue.advance();
		self.cycle += 1;
	}
	///Whether nothing remains anywhere: NICs, routers or links.
	pub fn is_idle(&self) -> bool
	{
		self.event_queue.pending()==0 && self.nics.iter().all(|nic|nic.is_idle()) && self.routers.iter().all(|router|router.is_idle())
	}
	///Step until idle. Returns the cycle reached, or an error if it takes more than `max_cycles`.
	pub fn run_until_idle(&mut self, max_cycles:Time) -> Result<Time,Error>
	{
		let limit = self.cycle+max_cycles;
		while !self.is_idle()
		{
			if self.cycle>=limit
			{
				return Err(error!(undetermined).with_message(format!("the network is not idle after {} cycles",max_cycles)));
			}
			self.step();
		}
		Ok(self.cycle)
	}
	///The packets consumed at `node`, in order of consumption.
	pub fn delivered(&self, node:usize) -> &[Packet]
	{
		self.nics[node].delivered()
	}
	pub fn total_delivered(&self) -> usize
	{
		self.nics.iter().map(|nic|nic.delivered().len()).sum()
	}
	pub fn router(&self, node:usize) -> &Router
	{
		&self.routers[node]
	}
	pub fn nic(&self, node:usize) -> &Nic
	{
		&self.nics[node]
	}
	pub fn number_of_nodes(&self) -> usize
	{
		self.routers.len()
	}
	///The cycle to be simulated next.
	pub fn cycle(&self) -> Time
	{
		self.cycle
	}
	/**The credits of `(port,vc)` at the router `node` plus everything they stand for: the units stored at the other side of the link
	and the units and credits travelling through it. It is constant for links between routers. Returns `None` for other ports.
	**/
	pub fn credit_balance(&self, node:usize, port:usize, vc:usize) -> Option<usize>
	{
		let (other,other_port) = match self.routing.neighbour(node,port)
		{
			Location::RouterPort{router_index,router_port} => (router_index,router_port),
			_ => return None,
		};
		let mut balance = self.routers[node].credits(port,vc) + self.routers[other].input_buffer(other_port).get_occupancy(vc);
		for event in self.event_queue.iter()
		{
			match event
			{
				Event::ToRouter{router,port:arrival_port,message} if *router==other && *arrival_port==other_port => match message
				{
					LinkMessage::Packet(packet) if packet.virtual_channel==vc => balance+=1,
					LinkMessage::Flit(flit) if flit.virtual_channel==vc => balance+=1,
					_ => (),
				},
				Event::ToRouter{router,port:arrival_port,message:LinkMessage::Credit{virtual_channel,count}} if *router==node && *arrival_port==port && *virtual_channel==vc => balance+=count,
				_ => (),
			}
		}
		Some(balance)
	}
	pub fn aggregate_statistics(&self) -> ConfigurationValue
	{
		ConfigurationValue::Object(String::from("network"),vec![
			(String::from("cycle"),ConfigurationValue::Number(self.cycle as f64)),
			(String::from("delivered_packets"),ConfigurationValue::Number(self.total_delivered() as f64)),
			(String::from("routers"),ConfigurationValue::Array(self.routers.iter().map(|router|router.aggregate_statistics()).collect())),
		])
	}
}
