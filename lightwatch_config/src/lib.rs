#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the light sampler.
//!
//! The `Config` tree is deserialized from TOML and validated before use;
//! every section has sensible defaults so a minimal file (or none at all)
//! runs the simulator out of the box.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// SPI channel of the photoresistor divider on the ADC (0..=7).
    pub channel: u8,
    /// ADC reference voltage.
    pub vref_volts: f64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            vref_volts: 3.3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplerCfg {
    /// Sampling rate in Hz.
    pub rate_hz: u32,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self { rate_hz: 1000 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EncoderCfg {
    /// Encoder A line (BCM pin number).
    pub line_a: u8,
    /// Encoder B line (BCM pin number).
    pub line_b: u8,
    /// Valid edges per mechanical detent.
    pub edges_per_detent: u32,
}

impl Default for EncoderCfg {
    fn default() -> Self {
        Self {
            line_a: 7,
            line_b: 8,
            edges_per_detent: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DipCfg {
    /// Volts below the running average to trigger a dip.
    pub trigger_delta: f64,
    /// Volts below the running average to release one (hysteresis).
    pub release_delta: f64,
    /// Minimum consecutive below-trigger samples to qualify.
    pub min_width: u32,
    /// Quiet samples required after release before re-arming.
    pub min_gap: u32,
}

impl Default for DipCfg {
    fn default() -> Self {
        Self {
            trigger_delta: 0.10,
            release_delta: 0.07,
            min_width: 2,
            min_gap: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerCfg {
    /// UDP port for the command service.
    pub port: u16,
}

impl Default for ServerCfg {
    fn default() -> Self {
        Self { port: 12345 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log
    pub level: Option<String>, // "info","debug"
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub sampler: SamplerCfg,
    pub encoder: EncoderCfg,
    pub dips: DipCfg,
    pub server: ServerCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Read, parse, and validate a config file.
    pub fn load(path: &std::path::Path) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("reading {}: {e}", path.display()))?;
        let config: Config =
            toml::from_str(&text).map_err(|e| eyre::eyre!("parsing {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.sensor.channel > 7 {
            eyre::bail!("sensor channel must be 0..=7");
        }
        if self.sensor.vref_volts <= 0.0 || !self.sensor.vref_volts.is_finite() {
            eyre::bail!("vref_volts must be a positive, finite voltage");
        }
        if self.sampler.rate_hz == 0 {
            eyre::bail!("sampler rate_hz must be > 0");
        }
        if self.encoder.line_a == self.encoder.line_b {
            eyre::bail!("encoder lines A and B must differ");
        }
        if self.encoder.edges_per_detent == 0 {
            eyre::bail!("edges_per_detent must be > 0");
        }
        if !self.dips.trigger_delta.is_finite() || self.dips.trigger_delta <= 0.0 {
            eyre::bail!("dip trigger_delta must be positive and finite");
        }
        if !self.dips.release_delta.is_finite() || self.dips.release_delta < 0.0 {
            eyre::bail!("dip release_delta must be non-negative and finite");
        }
        if self.dips.release_delta >= self.dips.trigger_delta {
            eyre::bail!("dip release_delta must be below trigger_delta (hysteresis band)");
        }
        if self.dips.min_width == 0 {
            eyre::bail!("dip min_width must be > 0");
        }
        Ok(())
    }
}
