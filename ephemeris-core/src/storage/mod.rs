//! Flash access policy and EEPROM emulation
//!
//! Two layers: [`FlashDriver`] wraps the raw controller with the rules that
//! make it safe to use (bounded waits, verify, lock discipline), and
//! [`Eeprom`] presents a flat byte-addressable space on top of it.

pub mod driver;
pub mod eeprom;

pub use driver::FlashDriver;
pub use eeprom::Eeprom;
