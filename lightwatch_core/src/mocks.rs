//! Test and helper mocks for lightwatch_core.

use lightwatch_traits::{EncoderPins, LightSensor};

/// Sensor that replays a fixed sequence, then repeats the last value.
pub struct ScriptedSensor {
    seq: Vec<f64>,
    idx: usize,
}

impl ScriptedSensor {
    pub fn new(seq: impl Into<Vec<f64>>) -> Self {
        Self {
            seq: seq.into(),
            idx: 0,
        }
    }
}

impl LightSensor for ScriptedSensor {
    fn read_volts(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let v = if self.idx < self.seq.len() {
            let x = self.seq[self.idx];
            self.idx += 1;
            x
        } else {
            self.seq.last().copied().unwrap_or(0.0)
        };
        Ok(v)
    }
}

/// Sensor that always fails; every tick is skipped.
pub struct FailingSensor;

impl LightSensor for FailingSensor {
    fn read_volts(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("failing sensor")))
    }
}

/// Encoder lines that walk a scripted state sequence. Each state is held
/// for `hold` consecutive reads (default 2, matching the decoder's
/// consensus double read); the final state persists forever.
pub struct ScriptedPins {
    states: Vec<(bool, bool)>,
    idx: usize,
    hold: usize,
    served: usize,
}

impl ScriptedPins {
    pub fn new(states: impl Into<Vec<(bool, bool)>>) -> Self {
        Self::with_hold(states, 2)
    }

    pub fn with_hold(states: impl Into<Vec<(bool, bool)>>, hold: usize) -> Self {
        let states = states.into();
        assert!(!states.is_empty(), "scripted pins need at least one state");
        Self {
            states,
            idx: 0,
            hold: hold.max(1),
            served: 0,
        }
    }
}

impl EncoderPins for ScriptedPins {
    fn read_levels(&mut self) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
        let state = self.states[self.idx];
        self.served += 1;
        if self.served >= self.hold && self.idx + 1 < self.states.len() {
            self.idx += 1;
            self.served = 0;
        }
        Ok(state)
    }
}

/// Encoder lines whose reads always fail.
pub struct FailingPins;

impl EncoderPins for FailingPins {
    fn read_levels(&mut self) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("failing pins")))
    }
}
