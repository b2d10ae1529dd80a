#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core light-sampling engine (hardware-agnostic).
//!
//! All hardware interactions go through the `lightwatch_traits::LightSensor`
//! and `lightwatch_traits::EncoderPins` traits.
//!
//! ## Architecture
//!
//! - **Buffering**: double-buffered one-second windows with a running
//!   average (`buffer` module)
//! - **Sampling**: paced producer thread feeding the buffer (`sampler`)
//! - **Dip detection**: four-state hysteresis machine over a completed
//!   window (`dips`)
//! - **Quadrature decoding**: Gray-code transition machine with debounce
//!   and detent alignment (`encoder`)
//! - **Command protocol**: UDP request/response engine with session memory
//!   (`server`)
//!
//! Shared state is one mutex around the window store plus a cooperative
//! [`ShutdownFlag`]; there is no other shared mutable state in the core.

pub mod buffer;
pub mod dips;
pub mod encoder;
pub mod error;
pub mod mocks;
pub mod sampler;
pub mod server;
pub mod shutdown;
pub mod util;

pub use buffer::{MAX_WINDOW_SAMPLES, SampleBuffer};
pub use dips::{DipConfig, count_dips};
pub use encoder::{DEFAULT_EDGES_PER_DETENT, Direction, EncoderEvents, QuadratureDecoder};
pub use error::{CoreError, Result};
pub use sampler::Sampler;
pub use server::{CommandServer, DEFAULT_PORT};
pub use shutdown::ShutdownFlag;
