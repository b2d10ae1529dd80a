//! MCP3208 12-bit SPI ADC and GPIO encoder lines (Linux targets).

use crate::error::{HwError, Result};
use lightwatch_traits::{EncoderPins, LightSensor};
use tracing::trace;

const SPI_CLOCK_HZ: u32 = 1_000_000;
const ADC_FULL_SCALE: f64 = 4096.0;

/// Single-ended MCP3208 channel read over SPI, converted to volts against
/// the supplied reference.
pub struct Mcp3208LightSensor {
    spi: rppal::spi::Spi,
    channel: u8,
    vref_volts: f64,
}

impl Mcp3208LightSensor {
    /// Open the ADC on the primary SPI bus.
    pub fn open(channel: u8, vref_volts: f64) -> Result<Self> {
        Self::new(rppal::spi::Bus::Spi0, channel, vref_volts)
    }

    pub fn new(bus: rppal::spi::Bus, channel: u8, vref_volts: f64) -> Result<Self> {
        if channel > 7 {
            return Err(HwError::Spi(format!("channel {channel} out of range 0..=7")));
        }
        if vref_volts <= 0.0 {
            return Err(HwError::Spi(format!("vref {vref_volts} must be positive")));
        }
        let spi = rppal::spi::Spi::new(
            bus,
            rppal::spi::SlaveSelect::Ss0,
            SPI_CLOCK_HZ,
            rppal::spi::Mode::Mode0,
        )
        .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self {
            spi,
            channel,
            vref_volts,
        })
    }

    /// One conversion: start bit + single-ended mode + channel select in
    /// the first two bytes, 12 result bits across the last two.
    pub fn read_raw(&mut self) -> Result<u16> {
        let tx = [
            0x06 | ((self.channel & 0x04) >> 2),
            (self.channel & 0x03) << 6,
            0x00,
        ];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = (u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2]);
        trace!(raw, "mcp3208 conversion");
        Ok(raw)
    }
}

impl LightSensor for Mcp3208LightSensor {
    fn read_volts(&mut self) -> std::result::Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self.read_raw()?;
        Ok(f64::from(raw) * (self.vref_volts / ADC_FULL_SCALE))
    }
}

/// Encoder A/B lines as pulled-up GPIO inputs.
pub struct GpioEncoderPins {
    line_a: rppal::gpio::InputPin,
    line_b: rppal::gpio::InputPin,
}

impl GpioEncoderPins {
    pub fn new(pin_a: u8, pin_b: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let line_a = gpio
            .get(pin_a)
            .map_err(|e| HwError::Gpio(format!("line A pin {pin_a}: {e}")))?
            .into_input_pullup();
        let line_b = gpio
            .get(pin_b)
            .map_err(|e| HwError::Gpio(format!("line B pin {pin_b}: {e}")))?
            .into_input_pullup();
        Ok(Self { line_a, line_b })
    }
}

impl EncoderPins for GpioEncoderPins {
    fn read_levels(
        &mut self,
    ) -> std::result::Result<(bool, bool), Box<dyn std::error::Error + Send + Sync>> {
        Ok((self.line_a.is_high(), self.line_b.is_high()))
    }
}
