//! Double-buffered sample store shared between the producer thread and its
//! consumers.
//!
//! One mutex serializes every operation: append, swap, copy-out, average
//! read, and count read are each atomic with respect to one another. There
//! is no finer-grained locking and no nested acquisition.

use std::sync::{Arc, Mutex, PoisonError};

/// Maximum samples held per one-second window. Appends beyond this are
/// dropped silently until the next swap (accepted backpressure, not a
/// fault).
pub const MAX_WINDOW_SAMPLES: usize = 2000;

/// Exponentially smoothed running average over all accepted samples.
/// The first sample seeds the value directly; afterwards
/// `new = 0.999 * old + 0.001 * sample`.
#[derive(Debug, Default)]
struct RunningAverage {
    seeded: bool,
    value: f64,
}

impl RunningAverage {
    fn update(&mut self, volts: f64) {
        if self.seeded {
            self.value = 0.999 * self.value + 0.001 * volts;
        } else {
            self.value = volts;
            self.seeded = true;
        }
    }

    fn get(&self) -> f64 {
        if self.seeded { self.value } else { 0.0 }
    }
}

#[derive(Debug)]
struct Window {
    active: Vec<f64>,
    history: Vec<f64>,
    total: i64,
    average: RunningAverage,
}

impl Window {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            active: Vec::with_capacity(capacity),
            history: Vec::with_capacity(capacity),
            total: 0,
            average: RunningAverage::default(),
        }
    }
}

/// Clonable handle to the shared window state. The sampler owns production;
/// consumers (command server, orchestrator) hold clones and only ever get
/// copies out, never references into internal storage.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    inner: Arc<Mutex<Window>>,
    capacity: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(MAX_WINDOW_SAMPLES)
    }
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Window::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one accepted reading. Returns false when the active window is
    /// already full and the reading was dropped; the average and total are
    /// untouched in that case.
    pub fn push(&self, volts: f64) -> bool {
        let mut w = self.lock();
        if w.active.len() >= self.capacity {
            return false;
        }
        w.active.push(volts);
        w.total += 1;
        w.average.update(volts);
        true
    }

    /// Atomically replace `history` with the current `active` contents and
    /// empty `active`. Called by the orchestrator once per window.
    pub fn swap_to_history(&self) {
        let mut guard = self.lock();
        let w = &mut *guard;
        std::mem::swap(&mut w.active, &mut w.history);
        w.active.clear();
    }

    /// Independent copy of the last completed window; the caller owns it.
    pub fn history(&self) -> Vec<f64> {
        self.lock().history.clone()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// 0.0 until the first sample has been accepted.
    pub fn average(&self) -> f64 {
        self.lock().average.get()
    }

    /// Monotonically increasing count of all samples ever accepted,
    /// unaffected by swaps.
    pub fn total_count(&self) -> i64 {
        self.lock().total
    }

    pub fn active_len(&self) -> usize {
        self.lock().active.len()
    }

    /// True when the active window has no room left this second.
    pub fn is_full(&self) -> bool {
        self.lock().active.len() >= self.capacity
    }

    /// Empty both windows and return counters/average to their initial
    /// state. Used when sampling stops.
    pub fn reset(&self) {
        let mut w = self.lock();
        w.active.clear();
        w.history.clear();
        w.total = 0;
        w.average = RunningAverage::default();
    }
}
