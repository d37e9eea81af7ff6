//! STM32F0-specific HAL for Ephemeris diary storage
//!
//! This crate provides STM32F0-specific constants for use with the
//! `ephemeris-hal` traits: flash geometry, the diary's reserved page layout,
//! and the controller unlock key sequence.
//!
//! The register-level [`FlashBank`](ephemeris_hal::FlashBank) implementation
//! lives in the firmware crate where the peripheral access types are
//! available; this crate only pins down the numbers both sides must agree on.

#![no_std]

pub mod flash;

pub use flash::{DIARY_CONTENT_PAGE, DIARY_INDEX_PAGE, FLASH_PAGE_SIZE};
