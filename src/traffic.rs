/*!

Generators of packets to feed a [`Network`](../network/struct.Network.html).

```ignore
let mut rng = StdRng::seed_from_u64(10);
for packet in uniform_random_packets(16,500,4,&mut rng)
{
	network.inject(packet)?;
}
```

*/

use rand::prelude::StdRng;
use rand::Rng;

use crate::packet::{MessageClass,Packet};

/**
`count` packets of `size` flits between nodes chosen uniformly at random. The destination is never the source, unless there is a single node.
Each packet is a request or a response with equal probability and carries `size` random bytes of payload.
**/
pub fn uniform_random_packets(number_of_nodes:usize, count:usize, size:usize, rng:&mut StdRng) -> Vec<Packet>
{
	assert!(number_of_nodes>0,"there must be some node");
	(0..count).map(|_|{
		let source = rng.gen_range(0..number_of_nodes);
		let destination = if number_of_nodes==1 { 0 } else {
			//pick among the others
			let d = rng.gen_range(0..number_of_nodes-1);
			if d>=source { d+1 } else { d }
		};
		let message_class = if rng.gen::<bool>() { MessageClass::Request } else { MessageClass::Response };
		let payload = (0..size).map(|_|rng.gen::<u8>()).collect();
		Packet::new(source,destination,message_class,size,0).with_payload(payload)
	}).collect()
}
