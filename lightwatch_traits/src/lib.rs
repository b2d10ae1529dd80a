pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Analog light sensor returning one volts reading per call.
///
/// A read may fail transiently (bus contention, conversion glitch); callers
/// decide whether a failed read is skipped or fatal.
pub trait LightSensor {
    fn read_volts(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Two-line rotary encoder input: the current logic levels of the A and B
/// lines. A failed read is a hard error for the caller to propagate.
pub trait EncoderPins {
    fn read_levels(&mut self) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>>;
}

impl LightSensor for Box<dyn LightSensor + Send> {
    fn read_volts(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_volts()
    }
}

impl EncoderPins for Box<dyn EncoderPins + Send> {
    fn read_levels(&mut self) -> Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_levels()
    }
}
