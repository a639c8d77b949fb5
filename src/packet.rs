/*!

The units moved around the network: packets, the flits they are split into, and the messages exchanged over links.

A packet is owned by a single holder at any time. It is moved from the injecting endpoint into a link, from the link into
an input buffer, and so on until the consuming endpoint drops it.

*/

use crate::event::Time;

///The coherence message class of a packet. Each class gets its own virtual channels.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum MessageClass
{
	Request,
	Response,
}

#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Packet
{
	///Node that generated the packet.
	pub source: usize,
	///Node the packet is addressed to.
	pub destination: usize,
	pub message_class: MessageClass,
	///Virtual channel the packet is travelling by in the current hop.
	pub virtual_channel: usize,
	///Size in flits.
	pub size: usize,
	///Cycle at which the packet was created at its source.
	pub creation_cycle: Time,
	///Cycle at which the packet was last sent through a link.
	pub send_cycle: Time,
	pub payload: Vec<u8>,
}

impl Packet
{
	pub fn new(source:usize, destination:usize, message_class:MessageClass, size:usize, creation_cycle:Time) -> Packet
	{
		assert!(size>0,"packets have at least one flit");
		Packet{
			source,
			destination,
			message_class,
			virtual_channel: 0,
			size,
			creation_cycle,
			send_cycle: creation_cycle,
			payload: vec![],
		}
	}
	pub fn with_payload(mut self, payload:Vec<u8>) -> Packet
	{
		self.payload = payload;
		self
	}
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum FlitKind
{
	Head,
	Body,
	Tail,
	///A packet carried as a single unit, both head and tail.
	Whole,
}

///A flow control unit. Only the leading flit of a packet carries the packet itself.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct Flit
{
	pub kind: FlitKind,
	pub virtual_channel: usize,
	pub packet: Option<Packet>,
}

impl Flit
{
	///Wrap a packet as a single unit.
	pub fn whole(packet:Packet) -> Flit
	{
		Flit{
			kind: FlitKind::Whole,
			virtual_channel: packet.virtual_channel,
			packet: Some(packet),
		}
	}
	///Split a packet into a head, `size-2` bodies and a tail. Single flit packets give a `Whole` flit.
	pub fn segment(packet:Packet) -> Vec<Flit>
	{
		let size = packet.size;
		let virtual_channel = packet.virtual_channel;
		if size<=1
		{
			return vec![Flit::whole(packet)];
		}
		let mut flits = Vec::with_capacity(size);
		flits.push(Flit{ kind:FlitKind::Head, virtual_channel, packet:Some(packet) });
		for _ in 1..size-1
		{
			flits.push(Flit{ kind:FlitKind::Body, virtual_channel, packet:None });
		}
		flits.push(Flit{ kind:FlitKind::Tail, virtual_channel, packet:None });
		flits
	}
	pub fn is_head(&self) -> bool
	{
		matches!(self.kind, FlitKind::Head | FlitKind::Whole)
	}
	pub fn is_tail(&self) -> bool
	{
		matches!(self.kind, FlitKind::Tail | FlitKind::Whole)
	}
	///Set the virtual channel of the flit, and of its packet if it carries it.
	pub fn set_virtual_channel(&mut self, virtual_channel:usize)
	{
		self.virtual_channel = virtual_channel;
		if let Some(ref mut packet) = self.packet
		{
			packet.virtual_channel = virtual_channel;
		}
	}
}

///What travels through a link in one direction.
#[derive(Clone,Debug,PartialEq,Eq)]
pub enum LinkMessage
{
	///Return of `count` buffer slots of `virtual_channel` to the upstream sender.
	Credit{
		virtual_channel: usize,
		count: usize,
	},
	///A whole packet, when the transfer granularity is a packet.
	Packet(Packet),
	///A single flit, when the transfer granularity is a flit.
	Flit(Flit),
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn segment_marks_head_and_tail()
	{
		let mut packet = Packet::new(0,3,MessageClass::Request,4,0);
		packet.virtual_channel = 2;
		let flits = Flit::segment(packet.clone());
		assert_eq!(flits.len(),4);
		assert!(flits[0].is_head() && !flits[0].is_tail());
		assert_eq!(flits[0].packet.as_ref(),Some(&packet));
		assert!(flits[1].packet.is_none() && !flits[1].is_head() && !flits[1].is_tail());
		assert!(flits[3].is_tail());
		assert!(flits.iter().all(|f|f.virtual_channel==2));
		let single = Flit::segment(Packet::new(0,3,MessageClass::Response,1,0));
		assert_eq!(single.len(),1);
		assert!(single[0].is_head() && single[0].is_tail());
	}
}
