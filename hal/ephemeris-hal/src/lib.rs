//! Ephemeris Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the diary storage core is written
//! against, so the same core logic runs on real flash controllers and on the
//! in-memory simulator used for host-side tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ephemeris-core (storage + diary)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ephemeris-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ephemeris-hal-│       │   SimFlash    │
//! │    stm32f0    │       │ (sim feature) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::FlashBank`] - Raw flash controller access
//! - [`time::Monotonic`] - Monotonic millisecond tick source

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod time;

#[cfg(feature = "sim")]
pub mod sim;

// Re-export key traits at crate root for convenience
pub use flash::{FlashBank, ERASED_BYTE, ERASED_HALFWORD};
pub use time::Monotonic;
