
use std::collections::VecDeque;

use crate::packet::Flit;

///The buffers of an input port, one queue per virtual channel.
///Whole packets are stored as `Whole` flits, so each entry is a transfer unit of the router granularity.
#[derive(Debug,Clone)]
pub struct InputBuffer
{
	queues: Vec<VecDeque<Flit>>,
	///Maximum number of units in each queue.
	capacity: usize,
}

impl InputBuffer
{
	pub fn new(virtual_channels:usize, capacity:usize) -> InputBuffer
	{
		InputBuffer{
			queues: (0..virtual_channels).map(|_|VecDeque::with_capacity(capacity)).collect(),
			capacity,
		}
	}
	///Append a unit to the queue of its virtual channel. Exceeding the capacity means the sender ignored its credits and panics.
	pub fn push(&mut self, flit:Flit)
	{
		let vc = flit.virtual_channel;
		if vc>=self.queues.len()
		{
			panic!("virtual channel {} does not exist, there are {}",vc,self.queues.len());
		}
		let queue = &mut self.queues[vc];
		if queue.len()>=self.capacity
		{
			panic!("buffer overflow in virtual channel {}: {} units already stored",vc,queue.len());
		}
		queue.push_back(flit);
	}
	pub fn pull(&mut self, vc:usize) -> Option<Flit>
	{
		self.queues[vc].pop_front()
	}
	pub fn peek(&self, vc:usize) -> Option<&Flit>
	{
		self.queues[vc].front()
	}
	pub fn get_occupancy(&self, vc:usize) -> usize
	{
		self.queues[vc].len()
	}
	pub fn is_buffer_full(&self, vc:usize) -> bool
	{
		self.queues[vc].len()>=self.capacity
	}
	pub fn is_buffer_empty(&self, vc:usize) -> bool
	{
		self.queues[vc].is_empty()
	}
	///Number of units stored in all the virtual channels.
	pub fn total_occupancy(&self) -> usize
	{
		self.queues.iter().map(|q|q.len()).sum()
	}
}
