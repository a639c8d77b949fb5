/*!

The router: a multi-port, multi-virtual-channel switch with a four stage pipeline.

* IB/RC. A unit at the front of an empty input virtual channel is admitted and routed.
* VCA. The input virtual channel requests the first candidate output virtual channel and waits for its grant.
* SWA. Holding an output virtual channel, it requests the crossbar of the output port.
* ST. Granted the crossbar, the unit traverses it, a credit is sent upstream and, with the last unit of the packet, the slot is released.

Each cycle, `tock` runs switch traversal, then switch allocation, then virtual channel allocation (which also admits new packets).
Resources released by a traversal are then visible to the allocations of the same cycle.

Flow control is credit based. `downstream_credits[out_port][out_vc]` counts the free units in the buffer at the other side of the link;
it is decremented on each send and incremented by the `Credit` messages arriving through that port.

A router with every slot empty asks to stop being clocked. It is clocked again after the next arrival.

*/

pub mod input_buffer;

pub use input_buffer::InputBuffer;

use std::rc::Rc;

use log::{debug,trace};

use crate::allocator::{VCAllocator,SwitchAllocator};
use crate::config::{ConfigurationValue,RouterParameters,TransferGranularity};
use crate::error::Error;
use crate::event::{ClockAction,Emission,Time,TockOutcome};
use crate::matrix::Matrix;
use crate::measures::RouterStatistics;
use crate::packet::{Flit,LinkMessage,MessageClass};
use crate::routing::{new_routing,Routing,RouteComputation,RoutingBuilderArgument,LOCAL_PORT,PORT_NAMES};

///The stage of a pipeline slot.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum PipelineStage
{
	Empty,
	///Admitted and routed.
	IB,
	///Waiting for an output virtual channel.
	VCARequested,
	///Holding an output virtual channel.
	VCA,
	///Holding an output virtual channel and waiting for the crossbar.
	SWARequested,
	///Holding the crossbar.
	ST,
}

///The state of the packet at the front of an input virtual channel.
///The round-robin cursors used to replay the candidate lists live in the `RouteTableEntry` of the same channel,
///reachable through [`Router::route_computation`](struct.Router.html#method.route_computation).
#[derive(Clone,Debug,PartialEq)]
pub struct PipelineEntry
{
	pub in_port: usize,
	pub in_vc: usize,
	///The granted output, once VCA succeeds.
	pub out_port: Option<usize>,
	pub out_vc: Option<usize>,
	pub candidate_ports: Vec<usize>,
	pub candidate_vcs: Vec<usize>,
	pub stage: PipelineStage,
	///Cycle in which the packet was admitted.
	pub arrival_cycle: Time,
	///Size of the packet in flits.
	pub packet_length: usize,
	pub message_class: Option<MessageClass>,
	pub source: Option<usize>,
	pub destination: Option<usize>,
}

impl PipelineEntry
{
	fn empty(in_port:usize, in_vc:usize) -> PipelineEntry
	{
		PipelineEntry{
			in_port,
			in_vc,
			out_port: None,
			out_vc: None,
			candidate_ports: vec![],
			candidate_vcs: vec![],
			stage: PipelineStage::Empty,
			arrival_cycle: 0,
			packet_length: 0,
			message_class: None,
			source: None,
			destination: None,
		}
	}
	///The granted output. Only valid from the VCA stage on.
	fn output(&self) -> (usize,usize)
	{
		match (self.out_port,self.out_vc)
		{
			(Some(port),Some(vc)) => (port,vc),
			_ => panic!("slot of port {} vc {} in stage {:?} has no output virtual channel",self.in_port,self.in_vc,self.stage),
		}
	}
}

pub struct Router
{
	///Shared with the route computation units.
	parameters: Rc<RouterParameters>,
	routing: Rc<dyn Routing>,
	///`pipeline[in_port*virtual_channels+in_vc]`
	pipeline: Vec<PipelineEntry>,
	input_buffers: Vec<InputBuffer>,
	route_computation: Vec<RouteComputation>,
	///`downstream_credits[out_port][out_vc]`
	downstream_credits: Matrix<usize>,
	vc_allocator: VCAllocator,
	switch_allocator: SwitchAllocator,
	///Whether `tock` is expected to be called each cycle.
	currently_clocking: bool,
	statistics: RouterStatistics,
}

impl Router
{
	pub fn new(parameters:RouterParameters) -> Result<Router,Error>
	{
		parameters.validate()?;
		let routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
		let mut router = Router{
			vc_allocator: VCAllocator::new(&parameters),
			switch_allocator: SwitchAllocator::new(&parameters),
			parameters: Rc::new(parameters),
			routing,
			pipeline: vec![],
			input_buffers: vec![],
			route_computation: vec![],
			downstream_credits: Matrix::constant(0,0,0),
			currently_clocking: true,
			statistics: RouterStatistics::new(),
		};
		router.resize();
		Ok(router)
	}
	/**Build a router from a configuration such as
	```ignore
	Router{
		id: 3,
		ports: 5,
		vcs: 2,
		rc_scheme: "MeshXY",
		no_nodes: 16,
		grid_size: 4,
	}
	```
	See [`RouterParameters`](../config/struct.RouterParameters.html) for every key.
	**/
	pub fn from_configuration(cv:&ConfigurationValue) -> Result<Router,Error>
	{
		Router::new(RouterParameters::from_configuration(cv)?)
	}
	///Reset every table to its empty state, sized by the current parameters. Statistics are kept.
	pub fn resize(&mut self)
	{
		let parameters = self.parameters.clone();
		let ports = parameters.ports;
		let vcs = parameters.virtual_channels;
		self.pipeline = (0..ports*vcs).map(|index|PipelineEntry::empty(index/vcs,index%vcs)).collect();
		self.input_buffers = (0..ports).map(|_|InputBuffer::new(vcs,parameters.buffer_size)).collect();
		self.route_computation = (0..ports).map(|port|RouteComputation::new(parameters.clone(),self.routing.clone(),port)).collect();
		self.downstream_credits = Matrix::constant(parameters.credits,ports,vcs);
		self.vc_allocator.resize(&parameters);
		self.switch_allocator.resize(&parameters);
		self.currently_clocking = true;
	}
	///Replace the parameters, rebuilding the routing and resizing every table. Anything in the router is dropped.
	pub fn reconfigure(&mut self, parameters:RouterParameters) -> Result<(),Error>
	{
		parameters.validate()?;
		debug!("router {} reconfigured to {} ports and {} virtual channels with {:?}",parameters.node_id,parameters.ports,parameters.virtual_channels,parameters.routing_scheme);
		self.routing = new_routing(RoutingBuilderArgument{parameters:&parameters});
		self.parameters = Rc::new(parameters);
		self.resize();
		Ok(())
	}
	///Apply a message arriving through `port`. Returns true if the router was not being clocked and must be clocked again.
	pub fn handle_link_arrival(&mut self, port:usize, message:LinkMessage) -> bool
	{
		match message
		{
			LinkMessage::Credit{virtual_channel,count} =>
			{
				*self.downstream_credits.get_mut(port,virtual_channel) += count;
			},
			LinkMessage::Packet(packet) =>
			{
				if self.parameters.granularity!=TransferGranularity::Packet
				{
					panic!("router {} with flit granularity received a whole packet through port {}",self.parameters.node_id,port);
				}
				self.statistics.track_arrival(packet.size,true);
				self.input_buffers[port].push(Flit::whole(packet));
			},
			LinkMessage::Flit(flit) =>
			{
				if self.parameters.granularity!=TransferGranularity::Flit
				{
					panic!("router {} with packet granularity received a flit through port {}",self.parameters.node_id,port);
				}
				self.statistics.track_arrival(1,flit.is_head());
				self.input_buffers[port].push(flit);
			},
		}
		if self.currently_clocking
		{
			false
		}
		else
		{
			debug!("router {} resumes its clock after an arrival through {}",self.parameters.node_id,port_name(port));
			self.currently_clocking = true;
			true
		}
	}
	///Run a cycle of the pipeline. The emissions must be delivered through the links of their ports.
	pub fn tock(&mut self, cycle:Time) -> TockOutcome
	{
		let mut emissions = vec![];
		self.do_st(cycle,&mut emissions);
		self.do_swa(cycle);
		self.do_vca(cycle);
		let clock = if self.pipeline.iter().all(|entry|entry.stage==PipelineStage::Empty)
		{
			if self.currently_clocking
			{
				debug!("router {} stops its clock at cycle {}",self.parameters.node_id,cycle);
			}
			self.currently_clocking = false;
			self.statistics.track_empty_cycle();
			ClockAction::Unregister
		}
		else
		{
			ClockAction::KeepTicking
		};
		TockOutcome{ emissions, clock }
	}
	///Switch traversal of the slots holding the crossbar.
	fn do_st(&mut self, cycle:Time, emissions:&mut Vec<Emission>)
	{
		let vcs = self.parameters.virtual_channels;
		for index in 0..self.pipeline.len()
		{
			if self.pipeline[index].stage!=PipelineStage::ST
			{
				continue;
			}
			let ip = index/vcs;
			let ic = index%vcs;
			let (op,oc) = self.pipeline[index].output();
			let granularity = self.parameters.granularity;
			if granularity==TransferGranularity::Packet && self.pipeline[index].arrival_cycle+self.pipeline[index].packet_length as Time > cycle
			{
				//The packet is still being received. The slot keeps its grant and its switch request meanwhile, so another slot
				//may win the same output port in a later cycle and both traverse it in the same tock, each on its own channel.
				continue;
			}
			if *self.downstream_credits.get(op,oc)==0 || self.input_buffers[ip].is_buffer_empty(ic)
			{
				self.pipeline[index].stage = PipelineStage::VCA;
				self.switch_allocator.clear_requestor(op,ip,ic);
				continue;
			}
			let mut flit = match self.input_buffers[ip].pull(ic)
			{
				Some(flit) => flit,
				None => unreachable!(),
			};
			flit.set_virtual_channel(oc);
			if let Some(ref mut packet) = flit.packet
			{
				packet.send_cycle = cycle;
			}
			let is_tail = flit.is_tail();
			trace!("router {} cycle {}: port {} vc {} traverses to port {} vc {}",self.parameters.node_id,cycle,ip,ic,op,oc);
			match granularity
			{
				TransferGranularity::Packet =>
				{
					let packet = match flit.packet
					{
						Some(packet) => packet,
						None => panic!("router {} stores a unit without packet in port {} vc {}",self.parameters.node_id,ip,ic),
					};
					self.statistics.track_traversal(packet.size,cycle);
					emissions.push(Emission{ port:op, message:LinkMessage::Packet(packet) });
				},
				TransferGranularity::Flit =>
				{
					self.statistics.track_traversal(1,cycle);
					emissions.push(Emission{ port:op, message:LinkMessage::Flit(flit) });
				},
			}
			*self.downstream_credits.get_mut(op,oc) -= 1;
			let count = if ip==LOCAL_PORT { self.parameters.injection_credit_return } else { 1 };
			emissions.push(Emission{ port:ip, message:LinkMessage::Credit{virtual_channel:ic,count} });
			if is_tail
			{
				let latency = cycle - self.pipeline[index].arrival_cycle;
				assert!(latency>0,"router {} packet left in the cycle it arrived",self.parameters.node_id);
				self.statistics.track_packet_out(latency);
				self.release(index);
			}
			else
			{
				self.switch_allocator.request(op,oc,ip,ic,cycle);
				self.pipeline[index].stage = PipelineStage::SWARequested;
			}
		}
	}
	///Free a slot whose packet has completely left.
	fn release(&mut self, index:usize)
	{
		let entry = &self.pipeline[index];
		let (ip,ic) = (entry.in_port,entry.in_vc);
		let (op,oc) = entry.output();
		self.vc_allocator.clear_winner(op,oc,ip,ic);
		self.switch_allocator.clear_requestor(op,ip,ic);
		self.route_computation[ip].clear(ic);
		self.pipeline[index] = PipelineEntry::empty(ip,ic);
	}
	///Switch allocation. Winners go to ST; losers keep their virtual channel and go back to VCA.
	fn do_swa(&mut self, cycle:Time)
	{
		for index in 0..self.pipeline.len()
		{
			if self.pipeline[index].stage!=PipelineStage::SWARequested || self.switch_allocator.is_empty()
			{
				continue;
			}
			let entry = &self.pipeline[index];
			let (ip,ic) = (entry.in_port,entry.in_vc);
			let (op,oc) = entry.output();
			let won = match self.switch_allocator.pick_winner(op,cycle)
			{
				Some(winner) => winner.entry_port==ip && winner.entry_vc==ic,
				None => false,
			};
			if won && !self.input_buffers[ip].is_buffer_empty(ic) && *self.downstream_credits.get(op,oc)>0
			{
				self.pipeline[index].stage = PipelineStage::ST;
			}
			else
			{
				self.pipeline[index].stage = PipelineStage::VCA;
				self.switch_allocator.clear_requestor(op,ip,ic);
			}
		}
	}
	///Virtual channel allocation, admission of new packets, and the requests for the next cycle.
	fn do_vca(&mut self, cycle:Time)
	{
		let vcs = self.parameters.virtual_channels;
		if !self.vc_allocator.no_requestors()
		{
			for grant in self.vc_allocator.pick_winner()
			{
				let index = grant.entry_port*vcs+grant.entry_vc;
				let entry = &mut self.pipeline[index];
				if entry.stage!=PipelineStage::VCARequested
				{
					continue;
				}
				entry.out_port = Some(grant.requested_port);
				entry.out_vc = Some(grant.requested_vc);
				entry.stage = PipelineStage::VCA;
				if !self.input_buffers[grant.entry_port].is_buffer_empty(grant.entry_vc)
				{
					self.switch_allocator.request(grant.requested_port,grant.requested_vc,grant.entry_port,grant.entry_vc,cycle);
					entry.stage = PipelineStage::SWARequested;
				}
			}
		}
		//Slots that hold a virtual channel but lost the crossbar or were waiting for data.
		for entry in self.pipeline.iter_mut()
		{
			if entry.stage==PipelineStage::VCA && !self.input_buffers[entry.in_port].is_buffer_empty(entry.in_vc)
			{
				let (op,oc) = entry.output();
				self.switch_allocator.request(op,oc,entry.in_port,entry.in_vc,cycle);
				entry.stage = PipelineStage::SWARequested;
			}
		}
		//Admission and route computation.
		for index in 0..self.pipeline.len()
		{
			let ip = index/vcs;
			let ic = index%vcs;
			if self.pipeline[index].stage!=PipelineStage::Empty
			{
				continue;
			}
			let flit = match self.input_buffers[ip].peek(ic)
			{
				Some(flit) => flit,
				None => continue,
			};
			let packet = match (flit.is_head(),&flit.packet)
			{
				(true,Some(packet)) => packet,
				_ => panic!("router {} port {} vc {} has a {:?} flit at the front of an empty slot",self.parameters.node_id,ip,ic,flit.kind),
			};
			if packet.virtual_channel!=ic
			{
				panic!("router {} received a packet marked for vc {} in vc {}",self.parameters.node_id,packet.virtual_channel,ic);
			}
			let rc = &mut self.route_computation[ip];
			rc.push(packet);
			let route = rc.entry(ic);
			let entry = &mut self.pipeline[index];
			entry.candidate_ports = route.possible_out_ports.clone();
			entry.candidate_vcs = route.possible_out_vcs.clone();
			entry.stage = PipelineStage::IB;
			entry.arrival_cycle = cycle;
			entry.packet_length = packet.size;
			entry.message_class = Some(packet.message_class);
			entry.source = Some(packet.source);
			entry.destination = Some(packet.destination);
		}
		//Request the first candidate while there is space at the other side.
		for entry in self.pipeline.iter_mut()
		{
			if entry.stage!=PipelineStage::IB
			{
				continue;
			}
			let op = entry.candidate_ports[0];
			let oc = entry.candidate_vcs[0];
			if !self.vc_allocator.is_requested(op,oc,entry.in_port,entry.in_vc) && *self.downstream_credits.get(op,oc)>0
			{
				entry.stage = PipelineStage::VCARequested;
				self.vc_allocator.request(op,oc,entry.in_port,entry.in_vc);
			}
		}
	}
	pub fn parameters(&self) -> &RouterParameters
	{
		&self.parameters
	}
	pub fn routing(&self) -> &dyn Routing
	{
		self.routing.as_ref()
	}
	pub fn node_id(&self) -> usize
	{
		self.parameters.node_id
	}
	pub fn pipeline(&self) -> &[PipelineEntry]
	{
		&self.pipeline
	}
	pub fn entry(&self, port:usize, vc:usize) -> &PipelineEntry
	{
		&self.pipeline[port*self.parameters.virtual_channels+vc]
	}
	pub fn stage(&self, port:usize, vc:usize) -> PipelineStage
	{
		self.entry(port,vc).stage
	}
	///Credits towards the virtual channel `vc` of the neighbour at `port`.
	pub fn credits(&self, port:usize, vc:usize) -> usize
	{
		*self.downstream_credits.get(port,vc)
	}
	pub fn credit_table(&self) -> &Matrix<usize>
	{
		&self.downstream_credits
	}
	pub fn input_buffer(&self, port:usize) -> &InputBuffer
	{
		&self.input_buffers[port]
	}
	pub fn input_buffers(&self) -> &[InputBuffer]
	{
		&self.input_buffers
	}
	pub fn route_computation(&self, port:usize) -> &RouteComputation
	{
		&self.route_computation[port]
	}
	pub fn vc_allocator(&self) -> &VCAllocator
	{
		&self.vc_allocator
	}
	pub fn switch_allocator(&self) -> &SwitchAllocator
	{
		&self.switch_allocator
	}
	pub fn is_clocking(&self) -> bool
	{
		self.currently_clocking
	}
	///Whether no packet is inside the router.
	pub fn is_idle(&self) -> bool
	{
		self.pipeline.iter().all(|entry|entry.stage==PipelineStage::Empty) && self.input_buffers.iter().all(|b|b.total_occupancy()==0)
	}
	pub fn statistics(&self) -> &RouterStatistics
	{
		&self.statistics
	}
	pub fn reset_statistics(&mut self)
	{
		self.statistics = RouterStatistics::new();
	}
	pub fn aggregate_statistics(&self) -> ConfigurationValue
	{
		ConfigurationValue::Object(String::from("router"),vec![
			(String::from("node_id"),ConfigurationValue::Number(self.parameters.node_id as f64)),
			(String::from("statistics"),self.statistics.to_configuration_value()),
		])
	}
	pub fn stats_report(&self) -> String
	{
		self.statistics.report(&format!("Router[{}]",self.parameters.node_id))
	}
	pub fn print_stats(&self)
	{
		println!("{}",self.stats_report());
	}
}

fn port_name(port:usize) -> String
{
	match PORT_NAMES.get(port)
	{
		Some(name) => name.to_string(),
		None => format!("port{}",port),
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::config::RoutingScheme;
	use crate::packet::Packet;
	fn point_to_point(node_id:usize) -> Router
	{
		let mut parameters = RouterParameters::new(node_id);
		parameters.ports = 2;
		parameters.virtual_channels = 2;
		parameters.credits = 4;
		parameters.buffer_size = 4;
		parameters.number_of_nodes = 2;
		parameters.routing_scheme = RoutingScheme::PointToPoint;
		Router::new(parameters).expect("valid router")
	}
	#[test]
	fn a_packet_walks_the_stages()
	{
		let mut router = point_to_point(0);
		let packet = Packet::new(0,1,MessageClass::Request,1,0);
		assert!(!router.handle_link_arrival(LOCAL_PORT,LinkMessage::Packet(packet)));
		let outcome = router.tock(0);
		assert!(outcome.emissions.is_empty());
		assert_eq!(outcome.clock,ClockAction::KeepTicking);
		assert_eq!(router.stage(0,0),PipelineStage::VCARequested);
		assert_eq!(router.entry(0,0).candidate_ports,vec![1]);
		assert_eq!(router.entry(0,0).candidate_vcs,vec![0]);
		router.tock(1);
		assert_eq!(router.stage(0,0),PipelineStage::SWARequested);
		assert_eq!(router.entry(0,0).out_vc,Some(0));
		router.tock(2);
		assert_eq!(router.stage(0,0),PipelineStage::ST);
		let outcome = router.tock(3);
		assert_eq!(outcome.clock,ClockAction::Unregister);
		assert_eq!(outcome.emissions.len(),2);
		assert_eq!(outcome.emissions[0].port,1);
		match &outcome.emissions[0].message
		{
			LinkMessage::Packet(packet) => assert_eq!((packet.virtual_channel,packet.send_cycle),(0,3)),
			other => panic!("expected a packet, got {:?}",other),
		}
		assert_eq!(outcome.emissions[1],Emission{port:0,message:LinkMessage::Credit{virtual_channel:0,count:8}});
		assert_eq!(router.credits(1,0),3);
		assert!(router.is_idle());
		assert!(!router.is_clocking());
		assert_eq!(router.statistics().packets_out,1);
		assert_eq!(router.statistics().empty_cycles,1);
		assert!(router.route_computation(0).is_empty());
		assert!(router.handle_link_arrival(1,LinkMessage::Credit{virtual_channel:0,count:1}));
		assert_eq!(router.credits(1,0),4);
	}
	#[test]
	fn long_packets_wait_until_received()
	{
		let mut router = point_to_point(0);
		router.handle_link_arrival(LOCAL_PORT,LinkMessage::Packet(Packet::new(0,1,MessageClass::Request,5,0)));
		for cycle in 0..5
		{
			assert!(router.tock(cycle).emissions.is_empty());
		}
		assert_eq!(router.stage(0,0),PipelineStage::ST);
		let outcome = router.tock(5);
		assert_eq!(outcome.emissions.len(),2);
		assert_eq!(router.statistics().latency.mean(),5.0);
		assert_eq!(router.statistics().flits_out,5);
	}
	#[test]
	#[should_panic(expected="flit granularity")]
	fn wrong_granularity_panics()
	{
		let mut parameters = RouterParameters::new(0);
		parameters.granularity = TransferGranularity::Flit;
		let mut router = Router::new(parameters).expect("valid router");
		router.handle_link_arrival(0,LinkMessage::Packet(Packet::new(0,1,MessageClass::Request,1,0)));
	}
}
