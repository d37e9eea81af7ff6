//! Board-agnostic diary storage core
//!
//! This crate contains everything between the raw flash controller and the
//! command surface, with no dependency on specific hardware:
//!
//! - Flash access policy (bounded waits, verify-after-write, lock discipline)
//! - EEPROM emulation over two page-erasable flash pages
//! - Append-only diary index, forward-growing content allocator, compaction
//! - At-rest obfuscation cipher
//!
//! The hardware itself is injected through the `ephemeris-hal` traits, so the
//! whole stack runs unchanged against the in-memory simulator in tests.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod cipher;
pub mod diary;
pub mod error;
pub mod layout;
pub mod storage;

// Re-export the main types at crate root for convenience
pub use diary::{Diary, EntryRecord};
pub use error::Error;
pub use layout::DiaryLayout;
pub use storage::{Eeprom, FlashDriver};
