/*!

The allocators of the router pipeline.

* [`VCAllocator`](virtual_channel/struct.VCAllocator.html) grants output virtual channels to input virtual channels. A granted output virtual
channel stays with its holder until the holder releases it.
* [`SwitchAllocator`](switch/struct.SwitchAllocator.html) grants each output port of the crossbar to one of the input virtual channels that
hold an output virtual channel in it. Grants last a single cycle.

Both arbitrate in round robin. Each search starts just after the last winner, so a requestor never wins twice in a row while others
wait. Requestors are numbered as `entry_port*virtual_channels+entry_vc`.

*/

pub mod virtual_channel;
pub mod switch;

pub use virtual_channel::VCAllocator;
pub use switch::{SwitchAllocator,SwitchRequest};

/// A request to a Virtual Channel Allocator.
/// A packet in the virtual channel `entry_vc` of the port `entry_port` is requesting to go to the virtual channel `requested_vc` of the port `requested_port`.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct VCARequest
{
	pub entry_port: usize,
	pub entry_vc: usize,
	pub requested_port: usize,
	pub requested_vc: usize,
}

impl VCARequest
{
	///The index of the requestor among all the input virtual channels.
	pub fn requestor(&self, num_vcs:usize) -> usize
	{
		self.entry_port*num_vcs+self.entry_vc
	}
}

///The index after `last` in a round robin over `size` requestors.
pub(crate) fn round_robin_order(last:usize, size:usize) -> impl Iterator<Item=usize>
{
	(1..=size).map(move |offset|(last+offset)%size)
}
