/*!
caminos-router
=====

This crate provides a cycle-level model of an on-chip network router: a multi-port, multi-virtual-channel switch with a four stage
pipeline, round-robin arbitration and credit-based flow control.

# Usage

This crate is `caminos-router`. To use it add `caminos-router` to your dependencies in your project's `Cargo.toml`.

```toml
[dependencies]
caminos-router = "0.1"
```

# Public Interface

A [`Router`](router/struct.Router.html) is built from its [`RouterParameters`](config/struct.RouterParameters.html), either directly or from a
[`ConfigurationValue`](config/enum.ConfigurationValue.html) describing a `Router{...}` object. Whoever simulates the router must
* deliver the messages arriving to each port with `Router::handle_link_arrival`,
* call `Router::tock` each cycle while `Router::is_clocking` holds, and
* put the emissions returned by `tock` in the links of their ports.

The [`Network`](network/struct.Network.html) does exactly that for a whole network, with a network interface in the local port of each router.

```ignore
use caminos_router::{Network,RouterParameters,traffic::uniform_random_packets};
use rand::{rngs::StdRng,SeedableRng};

let mut parameters = RouterParameters::new(0);
parameters.ports = 5;
parameters.number_of_nodes = 16;
parameters.grid_size = 4;
let mut network = Network::new(parameters,1)?;
let mut rng = StdRng::seed_from_u64(1);
for packet in uniform_random_packets(16,100,4,&mut rng)
{
	network.inject(packet)?;
}
network.run_until_idle(100_000)?;
```

# Router pipeline

Each input virtual channel owns a pipeline slot, which goes through `Empty`, `IB`, `VCARequested`, `VCA`, `SWARequested` and `ST`.
See the [`router`](router/index.html) module. The routing schemes are in the [`routing`](routing/index.html) module and the
allocators in the [`allocator`](allocator/index.html) module.

# Logging

The crate logs through the `log` facade. Clock changes and reconfigurations are at the `debug` level and allocator grants and switch
traversals at the `trace` level. No logger is installed by the library.

*/

#[macro_use]
pub mod error;
#[macro_use]
pub mod config;
pub mod matrix;
pub mod event;
pub mod packet;
pub mod measures;
pub mod routing;
pub mod allocator;
pub mod router;
pub mod network;
pub mod traffic;

pub use config::{ConfigurationValue,RouterParameters,RoutingScheme,TransferGranularity};
pub use error::{Error,ErrorKind};
pub use event::{ClockAction,Emission,Time,TockOutcome};
pub use network::{Network,Nic};
pub use packet::{Flit,FlitKind,LinkMessage,MessageClass,Packet};
pub use router::{PipelineStage,Router};
