//! Background light-level sampling.
//!
//! Spawns a producer thread that owns the `LightSensor`, appends one reading
//! per tick into the shared [`SampleBuffer`], and keeps the running average
//! and total count current. Ticks are paced by the provided `Clock` at the
//! configured rate (nominally 1 kHz).
//!
//! Safety: each `Sampler` spawns exactly one thread that is shut down when
//! the `Sampler` is stopped or dropped, preventing thread leaks.

use crate::buffer::SampleBuffer;
use crate::error::{CoreError, Result};
use eyre::WrapErr;
use lightwatch_traits::{Clock, LightSensor};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct Sampler {
    buffer: SampleBuffer,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Start sampling at `rate_hz` into a fresh buffer. Fails without side
    /// effects when the rate is zero or the producer thread cannot be
    /// spawned.
    pub fn start<S, C>(sensor: S, rate_hz: u32, clock: C) -> Result<Self>
    where
        S: LightSensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::start_with_buffer(sensor, rate_hz, clock, SampleBuffer::default())
    }

    /// Start sampling into an existing buffer handle (shared with the
    /// command server and orchestrator).
    pub fn start_with_buffer<S, C>(
        mut sensor: S,
        rate_hz: u32,
        clock: C,
        buffer: SampleBuffer,
    ) -> Result<Self>
    where
        S: LightSensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        if rate_hz == 0 {
            return Err(eyre::Report::new(CoreError::State(
                "sample rate must be > 0 Hz".into(),
            )));
        }
        let period = Duration::from_micros(crate::util::period_us(rate_hz));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let producer_buffer = buffer.clone();

        let join_handle = std::thread::Builder::new()
            .name("lightwatch-sampler".into())
            .spawn(move || {
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("sampler thread received shutdown signal");
                        break;
                    }

                    if producer_buffer.is_full() {
                        // Deliberate backpressure: drop the tick without
                        // touching the sensor until the next swap.
                        tracing::trace!("window full, tick dropped");
                    } else {
                        match sensor.read_volts() {
                            Ok(volts) => {
                                producer_buffer.push(volts);
                            }
                            Err(e) => {
                                // Transient read failure aborts only this tick.
                                tracing::warn!(error = %e, "sensor read failed, tick skipped");
                            }
                        }
                    }

                    if shutdown_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    clock.sleep(period);
                }
                tracing::trace!("sampler thread exiting cleanly");
            })
            .wrap_err("spawning sampler thread")?;

        Ok(Self {
            buffer,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Handle to the shared window state; clones observe the same data.
    pub fn buffer(&self) -> SampleBuffer {
        self.buffer.clone()
    }

    pub fn swap_to_history(&self) {
        self.buffer.swap_to_history();
    }

    pub fn history(&self) -> Vec<f64> {
        self.buffer.history()
    }

    pub fn average(&self) -> f64 {
        self.buffer.average()
    }

    pub fn total_count(&self) -> i64 {
        self.buffer.total_count()
    }

    /// Signal the producer to end, join it, and return the buffer to its
    /// initial empty/unseeded state.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "sampler thread panicked during shutdown");
            }
        }
        self.buffer.reset();
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "sampler thread panicked during shutdown");
            }
        }
    }
}
