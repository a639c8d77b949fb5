
use log::trace;

use crate::allocator::round_robin_order;
use crate::config::RouterParameters;
use crate::event::Time;
use crate::matrix::Matrix;

///A request for the crossbar from an input virtual channel that already holds the output virtual channel `requested_vc`.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct SwitchRequest
{
	pub entry_port: usize,
	pub entry_vc: usize,
	pub requested_vc: usize,
	///Cycle in which the request was first latched.
	pub request_cycle: Time,
}

#[derive(Clone,Copy,Debug)]
struct SwitchWinner
{
	requestor: usize,
	request: SwitchRequest,
	win_cycle: Time,
}

///Allocator of the crossbar. Each output port is granted to at most one requestor per cycle.
#[derive(Debug)]
pub struct SwitchAllocator
{
	ports: usize,
	virtual_channels: usize,
	///`requests[out_port][requestor]`.
	requests: Matrix<Option<SwitchRequest>>,
	///The last grant of each output port.
	last_winner: Vec<Option<SwitchWinner>>,
}

impl SwitchAllocator
{
	pub fn new(parameters:&RouterParameters) -> SwitchAllocator
	{
		let mut allocator = SwitchAllocator{
			ports: 0,
			virtual_channels: 0,
			requests: Matrix::constant(None,0,0),
			last_winner: vec![],
		};
		allocator.resize(parameters);
		allocator
	}
	///Drop every request and grant and size the tables for the given parameters.
	pub fn resize(&mut self, parameters:&RouterParameters)
	{
		self.ports = parameters.ports;
		self.virtual_channels = parameters.virtual_channels;
		self.requests = Matrix::constant(None,self.ports,self.ports*self.virtual_channels);
		self.last_winner = vec![None;self.ports];
	}
	///Latch a request of `(in_port,in_vc)` for `out_port`. A request already latched keeps its original cycle.
	pub fn request(&mut self, out_port:usize, out_vc:usize, in_port:usize, in_vc:usize, now:Time)
	{
		let requestor = in_port*self.virtual_channels+in_vc;
		let slot = self.requests.get_mut(out_port,requestor);
		if let Some(request) = slot.as_ref()
		{
			if request.requested_vc==out_vc
			{
				return;
			}
		}
		*slot = Some(SwitchRequest{
			entry_port: in_port,
			entry_vc: in_vc,
			requested_vc: out_vc,
			request_cycle: now,
		});
	}
	pub fn is_requested(&self, out_port:usize, in_port:usize, in_vc:usize) -> bool
	{
		self.requests.get(out_port,in_port*self.virtual_channels+in_vc).is_some()
	}
	///Whether no input requests `out_port`.
	pub fn no_requestors(&self, out_port:usize) -> bool
	{
		self.requests.row(out_port).iter().all(|slot|slot.is_none())
	}
	///Whether no input requests any output port.
	pub fn is_empty(&self) -> bool
	{
		self.requests.iter().all(|slot|slot.is_none())
	}
	///The grant of `out_port` for the cycle `now`. The first call in a cycle arbitrates in round robin among the requestors;
	///later calls in the same cycle return the same winner. Returns `None` when nobody requests the port.
	pub fn pick_winner(&mut self, out_port:usize, now:Time) -> Option<SwitchRequest>
	{
		if let Some(winner) = self.last_winner[out_port]
		{
			if winner.win_cycle==now
			{
				return Some(winner.request);
			}
		}
		if self.no_requestors(out_port)
		{
			return None;
		}
		let requestors = self.ports*self.virtual_channels;
		let last = match self.last_winner[out_port]
		{
			Some(winner) => winner.requestor,
			None => requestors-1,
		};
		let requests = &self.requests;
		let found = round_robin_order(last,requestors).find_map(|requestor|(*requests.get(out_port,requestor)).map(|request|(requestor,request)));
		match found
		{
			Some((requestor,request)) =>
			{
				trace!("switch allocator: port {} granted to port {} vc {} at cycle {}",out_port,request.entry_port,request.entry_vc,now);
				self.last_winner[out_port] = Some(SwitchWinner{ requestor, request, win_cycle:now });
				Some(request)
			},
			None => panic!("switch allocator of port {} has requests but no winner at cycle {}",out_port,now),
		}
	}
	///Remove the request of `(in_port,in_vc)` for `out_port`.
	pub fn clear_requestor(&mut self, out_port:usize, in_port:usize, in_vc:usize)
	{
		*self.requests.get_mut(out_port,in_port*self.virtual_channels+in_vc) = None;
	}
}
