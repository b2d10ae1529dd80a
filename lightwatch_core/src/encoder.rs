//! Quadrature decoding for a mechanical rotary encoder.
//!
//! Raw A/B levels are debounced with a consensus double read, folded through
//! a Gray-code transition table, and accumulated until a full detent's worth
//! of edges has been seen at a detent-aligned state. `EncoderEvents` wraps a
//! decoder in a background poll thread and hands detent events to the
//! consumer over a bounded channel.

use crate::error::{CoreError, Result};
use crossbeam_channel as xch;
use eyre::WrapErr;
use lightwatch_traits::{Clock, EncoderPins};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Signed step for each (previous, current) 2-bit state pair. Zero marks a
/// bounce or an invalid multi-edge jump.
const TRANSITION: [i8; 16] = [
    0, 1, -1, 0, //
    -1, 0, 0, 1, //
    1, 0, 0, -1, //
    0, -1, 1, 0,
];

pub const DEFAULT_EDGES_PER_DETENT: u32 = 4;

/// Interval between polls while waiting out a timeout.
const POLL_INTERVAL: Duration = Duration::from_micros(500);
/// Gap between the two reads of a consensus pair.
const DOUBLE_READ_GAP: Duration = Duration::from_micros(200);
/// Mechanical settle time after emitting a detent.
const SETTLE: Duration = Duration::from_micros(800);
/// Consensus attempts before falling back to the last raw reading.
const CONSENSUS_ATTEMPTS: u32 = 3;

/// One detent of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// Signed step: +1 clockwise, -1 counter-clockwise.
    pub fn delta(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

pub struct QuadratureDecoder<P: EncoderPins, C: Clock> {
    pins: P,
    clock: C,
    previous: u8,
    edge_accum: i32,
    edges_per_detent: i32,
}

impl<P: EncoderPins, C: Clock> QuadratureDecoder<P, C> {
    /// Prime the decoder with the current line state. Fails when the lines
    /// cannot be read.
    pub fn new(pins: P, edges_per_detent: u32, clock: C) -> Result<Self> {
        let edges = if edges_per_detent > 0 {
            edges_per_detent
        } else {
            DEFAULT_EDGES_PER_DETENT
        };
        let mut decoder = Self {
            pins,
            clock,
            previous: 0,
            edge_accum: 0,
            edges_per_detent: edges as i32,
        };
        decoder.previous = decoder.read_state().wrap_err("priming encoder state")?;
        Ok(decoder)
    }

    /// Debounced consensus read: two reads a short interval apart must
    /// agree; after `CONSENSUS_ATTEMPTS` disagreements, the last raw
    /// reading is used.
    fn read_state(&mut self) -> Result<u8> {
        for _ in 0..CONSENSUS_ATTEMPTS {
            let first = self.read_raw()?;
            self.clock.sleep(DOUBLE_READ_GAP);
            let second = self.read_raw()?;
            if first == second {
                return Ok(second);
            }
        }
        self.read_raw()
    }

    fn read_raw(&mut self) -> Result<u8> {
        let (a, b) = self
            .pins
            .read_levels()
            .map_err(|e| eyre::Report::new(CoreError::Hardware(e.to_string())))
            .wrap_err("reading encoder lines")?;
        Ok(((a as u8) << 1) | (b as u8))
    }

    /// One non-blocking check. `Ok(None)` means no completed detent yet; a
    /// line read failure is an error, distinct from "no movement".
    fn step_once(&mut self) -> Result<Option<Direction>> {
        let current = self.read_state()?;
        let step = TRANSITION[(((self.previous & 0x3) << 2) | (current & 0x3)) as usize];
        if step == 0 {
            return Ok(None);
        }
        self.previous = current;
        self.edge_accum += i32::from(step);

        let reached = if self.edge_accum >= self.edges_per_detent {
            Some(Direction::Clockwise)
        } else if self.edge_accum <= -self.edges_per_detent {
            Some(Direction::CounterClockwise)
        } else {
            None
        };

        if let Some(direction) = reached {
            // Emit only at a detent-aligned state (both lines equal);
            // otherwise hold the accumulator at the threshold so a
            // mid-detent mechanism cannot overshoot.
            if current == 0b00 || current == 0b11 {
                self.edge_accum = 0;
                self.clock.sleep(SETTLE);
                return Ok(Some(direction));
            }
            self.edge_accum = match direction {
                Direction::Clockwise => self.edges_per_detent,
                Direction::CounterClockwise => -self.edges_per_detent,
            };
        }
        Ok(None)
    }

    /// Poll for one detent. A zero timeout performs exactly one check;
    /// otherwise checks repeat at a short interval until a direction is
    /// produced or the deadline elapses (`Ok(None)`).
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<Direction>> {
        let deadline = self.clock.now() + timeout;
        loop {
            if let Some(direction) = self.step_once()? {
                return Ok(Some(direction));
            }
            if timeout.is_zero() {
                return Ok(None);
            }
            self.clock.sleep(POLL_INTERVAL);
            if self.clock.now() >= deadline {
                return Ok(None);
            }
        }
    }
}

/// Background poll thread forwarding detent events over a bounded channel.
///
/// The thread owns the decoder and is shut down when `EncoderEvents` is
/// dropped. Read failures end the thread after a logged error; the consumer
/// observes the disconnect.
pub struct EncoderEvents {
    rx: xch::Receiver<Direction>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl EncoderEvents {
    pub fn spawn<P, C>(mut decoder: QuadratureDecoder<P, C>, poll_timeout: Duration) -> Result<Self>
    where
        P: EncoderPins + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(32);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::Builder::new()
            .name("lightwatch-encoder".into())
            .spawn(move || {
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("encoder thread received shutdown signal");
                        break;
                    }
                    match decoder.poll(poll_timeout) {
                        Ok(Some(direction)) => {
                            if tx.send(direction).is_err() {
                                tracing::debug!("encoder consumer disconnected, exiting thread");
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "encoder read failed, stopping polls");
                            break;
                        }
                    }
                }
                tracing::trace!("encoder thread exiting cleanly");
            })
            .wrap_err("spawning encoder thread")?;

        Ok(Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    /// Drain all detent events seen since the last call into a net step
    /// count.
    pub fn drain_steps(&self) -> i32 {
        self.rx.try_iter().map(Direction::delta).sum()
    }

    pub fn try_recv(&self) -> Option<Direction> {
        self.rx.try_recv().ok()
    }
}

impl Drop for EncoderEvents {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            if let Err(e) = handle.join() {
                tracing::warn!(?e, "encoder thread panicked during shutdown");
            }
        }
    }
}
