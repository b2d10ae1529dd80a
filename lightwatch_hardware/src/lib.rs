pub mod error;
#[cfg(feature = "hardware")]
pub mod mcp3208;

use lightwatch_traits::{EncoderPins, LightSensor};

/// Simulated photoresistor: a steady baseline with a periodic transient
/// dip, plus a small deterministic ripple. Produces the same waveform on
/// every run so dip counts are reproducible.
pub struct SimulatedLightSensor {
    tick: u64,
    baseline_volts: f64,
    dip_depth_volts: f64,
    dip_every: u64,
    dip_len: u64,
}

impl SimulatedLightSensor {
    pub fn new() -> Self {
        Self {
            tick: 0,
            baseline_volts: 1.60,
            dip_depth_volts: 0.40,
            // One ~20-sample dip every 400 ticks: a few dips per second at
            // the nominal 1 kHz rate.
            dip_every: 400,
            dip_len: 20,
        }
    }
}

impl Default for SimulatedLightSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl LightSensor for SimulatedLightSensor {
    fn read_volts(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let t = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let dipping = t % self.dip_every < self.dip_len;
        let base = if dipping {
            self.baseline_volts - self.dip_depth_volts
        } else {
            self.baseline_volts
        };
        // Small ripple so the trace is not perfectly flat.
        let ripple = 0.005 * ((t % 10) as f64 - 4.5) / 4.5;
        Ok(base + ripple)
    }
}

/// Simulated rotary encoder: steps through one full quadrature cycle every
/// `ticks_per_edge` reads, so a decoder sees a slow continuous clockwise
/// rotation.
pub struct SimulatedEncoder {
    reads: u64,
    reads_per_edge: u64,
}

impl SimulatedEncoder {
    pub fn new(reads_per_edge: u64) -> Self {
        Self {
            reads: 0,
            reads_per_edge: reads_per_edge.max(1),
        }
    }
}

impl EncoderPins for SimulatedEncoder {
    fn read_levels(&mut self) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
        const CYCLE: [(bool, bool); 4] =
            [(false, false), (false, true), (true, true), (true, false)];
        let edge = (self.reads / self.reads_per_edge) as usize % CYCLE.len();
        self.reads = self.reads.wrapping_add(1);
        Ok(CYCLE[edge])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn simulated_sensor_dips_periodically() {
        let mut sensor = SimulatedLightSensor::new();
        let mut low = 0;
        let mut high = 0;
        for _ in 0..400 {
            let v = sensor.read_volts().expect("simulated read");
            if v < 1.4 { low += 1 } else { high += 1 }
        }
        assert_eq!(low, 20);
        assert_eq!(high, 380);
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    fn simulated_encoder_walks_the_gray_cycle(#[case] reads_per_edge: u64) {
        let mut enc = SimulatedEncoder::new(reads_per_edge);
        let mut previous = enc.read_levels().expect("read");
        for _ in 0..32 {
            let current = enc.read_levels().expect("read");
            let changed = (previous.0 != current.0) as u8 + (previous.1 != current.1) as u8;
            assert!(changed <= 1, "gray cycle must change one line at a time");
            previous = current;
        }
    }
}
