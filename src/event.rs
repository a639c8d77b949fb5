
use std::convert::TryInto;

use crate::packet::LinkMessage;

/// An amount of cycles.
pub type Time = u64;

///A message leaving a router through one of its ports.
#[derive(Clone,Debug,PartialEq)]
pub struct Emission
{
	pub port: usize,
	pub message: LinkMessage,
}

///What the router asks of its clock after a cycle.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum ClockAction
{
	///Call `tock` again next cycle.
	KeepTicking,
	///Nothing remains in the pipeline; stop calling `tock` until an arrival re-enables the clock.
	Unregister,
}

///The result of one router cycle.
#[derive(Clone,Debug,PartialEq)]
pub struct TockOutcome
{
	///Messages to be put in the links, in the order they were generated.
	pub emissions: Vec<Emission>,
	pub clock: ClockAction,
}

///The events stored in the event queue.
#[derive(Clone,Debug)]
pub enum Event
{
	///A message reaching the input side of a router port.
	ToRouter{
		router: usize,
		port: usize,
		message: LinkMessage,
	},
	///A message reaching the network interface of a node.
	ToNic{
		node: usize,
		message: LinkMessage,
	},
}

///Encapsulates a request for insertion on the event queue.
pub struct EventGeneration
{
	///To insert the event after `delay` cycles.
	pub delay: Time,
	///The actual event to be inserted.
	pub event: Event,
}

///The event queue structure managing the insertion and extraction of events.
pub struct EventQueue
{
	event_circle: Vec<Vec<Event>>,
	//offset currently being accessed.
	current: usize,
}

impl EventQueue
{
	///Creates a new EventQueue. `size` should be greater than any possible delay.
	pub fn new (size:usize) -> EventQueue
	{
		assert!(size>0,"the event queue needs at least one slot");
		EventQueue{
			event_circle: vec![ vec![] ; size ],
			current:0,
		}
	}
	///Advances the queue by a cycle. This drops the events in the finished cycle.
	pub fn advance(&mut self)
	{
		//Better to drop the old Vec; otherwise their capacity is covering a lot of memory.
		self.event_circle[self.current]=Vec::new();
		self.current=(self.current+1)%self.event_circle.len();
	}
	///Extract the events of the current cycle, in insertion order.
	pub fn take_current(&mut self) -> Vec<Event>
	{
		std::mem::take(&mut self.event_circle[self.current])
	}
	///Adds an event to be executed at the cycle `current_cycle + delay`.
	pub fn enqueue(&mut self, event_generation:EventGeneration)
	{
		let delay : usize = event_generation.delay.try_into().expect("delay does not fit in usize");
		if delay>=self.event_circle.len()
		{
			panic!("Delay too long");
		}
		let position=(self.current+delay) % self.event_circle.len();
		self.event_circle[position].push(event_generation.event);
	}
	///Number of events waiting in any cycle.
	pub fn pending(&self) -> usize
	{
		self.event_circle.iter().map(|v|v.len()).sum()
	}
	///All the waiting events, in no particular order.
	pub fn iter(&self) -> impl Iterator<Item=&Event>
	{
		self.event_circle.iter().flat_map(|v|v.iter())
	}
}
