
use std::collections::VecDeque;

use log::trace;

use crate::allocator::{VCARequest,round_robin_order};
use crate::config::RouterParameters;
use crate::matrix::Matrix;

///Allocator of output virtual channels.
///Each output port keeps a pool with the tokens of its free virtual channels. Granting a channel takes its token from the pool,
///and `clear_winner` puts it back.
#[derive(Debug)]
pub struct VCAllocator
{
	ports: usize,
	virtual_channels: usize,
	///`requests[out_port][requestor]`. An input virtual channel can request a single channel of each output port.
	requests: Matrix<Option<VCARequest>>,
	///The requests currently holding a token, by output port.
	current_winners: Vec<Vec<VCARequest>>,
	///`last_winner[out_port][out_vc]`, the requestor of the last grant.
	last_winner: Matrix<usize>,
	///The free output virtual channels of each output port.
	token_pool: Vec<VecDeque<usize>>,
}

impl VCAllocator
{
	pub fn new(parameters:&RouterParameters) -> VCAllocator
	{
		let mut allocator = VCAllocator{
			ports: 0,
			virtual_channels: 0,
			requests: Matrix::constant(None,0,0),
			current_winners: vec![],
			last_winner: Matrix::constant(0,0,0),
			token_pool: vec![],
		};
		allocator.resize(parameters);
		allocator
	}
	///Drop every request and grant and size the tables for the given parameters.
	pub fn resize(&mut self, parameters:&RouterParameters)
	{
		self.ports = parameters.ports;
		self.virtual_channels = parameters.virtual_channels;
		let requestors = self.ports*self.virtual_channels;
		self.requests = Matrix::constant(None,self.ports,requestors);
		self.current_winners = vec![vec![];self.ports];
		self.last_winner = Matrix::constant(requestors-1,self.ports,self.virtual_channels);
		self.token_pool = (0..self.ports).map(|_|(0..self.virtual_channels).collect()).collect();
	}
	///Latch the request of `(in_port,in_vc)` for `(out_port,out_vc)`.
	///Returns whether the request is recorded, which is false if the input virtual channel already requests another channel of `out_port`.
	pub fn request(&mut self, out_port:usize, out_vc:usize, in_port:usize, in_vc:usize) -> bool
	{
		let requestor = in_port*self.virtual_channels+in_vc;
		let slot = self.requests.get_mut(out_port,requestor);
		if let Some(request) = slot.as_ref()
		{
			return request.requested_vc==out_vc;
		}
		*slot = Some(VCARequest{
			entry_port: in_port,
			entry_vc: in_vc,
			requested_port: out_port,
			requested_vc: out_vc,
		});
		true
	}
	pub fn is_requested(&self, out_port:usize, out_vc:usize, in_port:usize, in_vc:usize) -> bool
	{
		let requestor = in_port*self.virtual_channels+in_vc;
		match self.requests.get(out_port,requestor)
		{
			Some(request) => request.requested_vc==out_vc,
			None => false,
		}
	}
	///Whether there is no request at all, granted or not.
	pub fn no_requestors(&self) -> bool
	{
		self.requests.iter().all(|slot|slot.is_none())
	}
	///Grant every free output virtual channel to one of its requestors, in round robin.
	///Returns the new grants; they are also kept in `winners` until cleared.
	pub fn pick_winner(&mut self) -> Vec<VCARequest>
	{
		let requestors = self.ports*self.virtual_channels;
		let mut granted = vec![];
		for out_port in 0..self.ports
		{
			let tokens : Vec<usize> = self.token_pool[out_port].iter().cloned().collect();
			for out_vc in tokens
			{
				let last = *self.last_winner.get(out_port,out_vc);
				let winner = round_robin_order(last,requestors).find_map(|requestor|{
					match self.requests.get(out_port,requestor)
					{
						Some(request) if request.requested_vc==out_vc => Some((requestor,*request)),
						_ => None,
					}
				});
				if let Some((requestor,request)) = winner
				{
					trace!("vc allocator: port {} vc {} granted to port {} vc {}",out_port,out_vc,request.entry_port,request.entry_vc);
					*self.last_winner.get_mut(out_port,out_vc) = requestor;
					self.token_pool[out_port].retain(|&token|token!=out_vc);
					self.current_winners[out_port].push(request);
					granted.push(request);
				}
			}
		}
		granted
	}
	///Release the grant of `(out_port,out_vc)` held by `(in_port,in_vc)`, removing its request and returning the token to the pool.
	pub fn clear_winner(&mut self, out_port:usize, out_vc:usize, in_port:usize, in_vc:usize)
	{
		let requestor = in_port*self.virtual_channels+in_vc;
		*self.requests.get_mut(out_port,requestor) = None;
		let winners = &mut self.current_winners[out_port];
		let position = winners.iter().position(|w|w.requested_vc==out_vc && w.entry_port==in_port && w.entry_vc==in_vc);
		match position
		{
			Some(index) =>
			{
				winners.swap_remove(index);
			},
			None => panic!("clearing a virtual channel grant that does not exist: port {} vc {} from port {} vc {}",out_port,out_vc,in_port,in_vc),
		}
		self.token_pool[out_port].push_back(out_vc);
	}
	///The requests holding a channel of `out_port`.
	pub fn winners(&self, out_port:usize) -> &[VCARequest]
	{
		&self.current_winners[out_port]
	}
	///The number of free channels of `out_port`.
	pub fn free_tokens(&self, out_port:usize) -> usize
	{
		self.token_pool[out_port].len()
	}
}
