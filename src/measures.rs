/*!

Statistics gathered by a router. They are only produced; nothing in the pipeline reads them to take decisions.

The values reported by `RouterStatistics::to_configuration_value` are:
* `flits_in` is the number of flits received through any port. A whole packet counts its size.
* `flits_out` is the number of flits sent through any port.
* `packets_in` and `packets_out` count packets received and completely forwarded.
* `last_flit_cycle` is the last cycle in which something traversed the switch.
* `empty_cycles` counts the cycles the router spent with its clock disabled because nothing was in the pipeline.
* `latency` is an object with the `count`, `average` and `variance` of the cycles spent by packets inside the router, from
their admission until their last unit traverses the switch.

*/

use crate::config::ConfigurationValue;
use crate::event::Time;

///Running mean and variance, updated one sample at a time.
#[derive(Clone,Debug,Default,PartialEq)]
pub struct LatencyAccumulator
{
	count: usize,
	mean: f64,
	//Sum of squared differences to the current mean.
	m2: f64,
}

impl LatencyAccumulator
{
	pub fn track(&mut self, sample:Time)
	{
		let x = sample as f64;
		self.count += 1;
		let delta = x - self.mean;
		self.mean += delta / self.count as f64;
		self.m2 += delta * (x - self.mean);
	}
	pub fn count(&self) -> usize
	{
		self.count
	}
	///Average of the samples. 0 when there are none.
	pub fn mean(&self) -> f64
	{
		self.mean
	}
	///Population variance of the samples. 0 with fewer than 2 samples.
	pub fn variance(&self) -> f64
	{
		if self.count<2 { 0.0 } else { self.m2 / self.count as f64 }
	}
	pub fn to_configuration_value(&self) -> ConfigurationValue
	{
		ConfigurationValue::Object(String::from("latency"),vec![
			(String::from("count"),ConfigurationValue::Number(self.count as f64)),
			(String::from("average"),ConfigurationValue::Number(self.mean())),
			(String::from("variance"),ConfigurationValue::Number(self.variance())),
		])
	}
}

#[derive(Clone,Debug,Default,PartialEq)]
pub struct RouterStatistics
{
	pub flits_in: usize,
	pub flits_out: usize,
	pub packets_in: usize,
	pub packets_out: usize,
	pub last_flit_cycle: Time,
	pub empty_cycles: usize,
	pub latency: LatencyAccumulator,
}

impl RouterStatistics
{
	pub fn new() -> RouterStatistics
	{
		RouterStatistics::default()
	}
	pub fn track_arrival(&mut self, flits:usize, is_head:bool)
	{
		self.flits_in += flits;
		if is_head
		{
			self.packets_in += 1;
		}
	}
	pub fn track_traversal(&mut self, flits:usize, cycle:Time)
	{
		self.flits_out += flits;
		self.last_flit_cycle = cycle;
	}
	///A packet has left the router completely after `latency` cycles in it.
	pub fn track_packet_out(&mut self, latency:Time)
	{
		self.packets_out += 1;
		self.latency.track(latency);
	}
	pub fn track_empty_cycle(&mut self)
	{
		self.empty_cycles += 1;
	}
	pub fn to_configuration_value(&self) -> ConfigurationValue
	{
		ConfigurationValue::Object(String::from("router_statistics"),vec![
			(String::from("flits_in"),ConfigurationValue::Number(self.flits_in as f64)),
			(String::from("flits_out"),ConfigurationValue::Number(self.flits_out as f64)),
			(String::from("packets_in"),ConfigurationValue::Number(self.packets_in as f64)),
			(String::from("packets_out"),ConfigurationValue::Number(self.packets_out as f64)),
			(String::from("last_flit_cycle"),ConfigurationValue::Number(self.last_flit_cycle as f64)),
			(String::from("empty_cycles"),ConfigurationValue::Number(self.empty_cycles as f64)),
			(String::from("latency"),self.latency.to_configuration_value()),
		])
	}
	///A multi-line human readable report, each line prefixed by `label`.
	pub fn report(&self, label:&str) -> String
	{
		let lines = [
			format!("{} flits_in: {}",label,self.flits_in),
			format!("{} flits_out: {}",label,self.flits_out),
			format!("{} packets_in: {}",label,self.packets_in),
			format!("{} packets_out: {}",label,self.packets_out),
			format!("{} average_packet_latency: {:.3}",label,self.latency.mean()),
			format!("{} packet_latency_variance: {:.3}",label,self.latency.variance()),
			format!("{} last_flit_cycle: {}",label,self.last_flit_cycle),
			format!("{} empty_cycles: {}",label,self.empty_cycles),
		];
		itertools::join(lines.iter(),"\n")
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	#[test]
	fn latency_mean_and_variance()
	{
		let mut accumulator = LatencyAccumulator::default();
		assert_eq!(accumulator.variance(),0.0);
		for sample in [2,4,4,4,5,5,7,9]
		{
			accumulator.track(sample);
		}
		assert_eq!(accumulator.count(),8);
		assert!((accumulator.mean()-5.0).abs()<1e-9);
		assert!((accumulator.variance()-4.0).abs()<1e-9);
	}
	#[test]
	fn report_contains_every_counter()
	{
		let mut statistics = RouterStatistics::new();
		statistics.track_arrival(4,true);
		statistics.track_traversal(4,17);
		statistics.track_packet_out(3);
		let report = statistics.report("Router[3]");
		assert!(report.contains("Router[3] flits_in: 4"));
		assert!(report.contains("last_flit_cycle: 17"));
		assert_eq!(report.lines().count(),8);
		match statistics.to_configuration_value()
		{
			ConfigurationValue::Object(name,pairs) =>
			{
				assert_eq!(name,"router_statistics");
				assert_eq!(pairs.len(),7);
			},
			_ => panic!("statistics must be an object"),
		}
	}
}
