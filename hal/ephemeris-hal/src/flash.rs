//! Raw flash controller abstraction
//!
//! Provides the trait implemented by chip-specific flash controllers
//! (and by the simulator). The trait is deliberately thin: it exposes the
//! controller's status flags and primitive operations, while all policy -
//! bounded busy-waits, verify-after-write, the unlock/lock discipline - lives
//! in `ephemeris-core`'s storage driver, where it can be tested on the host.
//!
//! The API is blocking. Flash controllers in this class halt or stall the
//! core during program/erase anyway, and a blocking contract is simpler to
//! reason about than callbacks for operations measured in milliseconds.

/// Bit pattern of an erased byte. Erasing a page resets every byte to this.
pub const ERASED_BYTE: u8 = 0xFF;

/// Bit pattern of an erased halfword.
pub const ERASED_HALFWORD: u16 = 0xFFFF;

/// Raw access to one flash bank
///
/// Implementations map directly onto the controller registers:
///
/// - Programming can only flip bits from 1 to 0; only a page erase brings
///   bits back to 1. Callers must respect this (the storage driver does).
/// - Program and read operate on halfword (2-byte) granularity and
///   halfword-aligned addresses, assumed atomic at that granularity.
/// - While [`is_locked`](Self::is_locked) returns true, program and erase
///   requests must have no effect on the array.
pub trait FlashBank {
    /// Check whether a program/erase operation is ongoing (the BSY flag).
    fn is_busy(&self) -> bool;

    /// Check whether the controller is locked against program/erase.
    fn is_locked(&self) -> bool;

    /// Unlock the controller (key sequence on real hardware).
    ///
    /// Callers treat unlock as idempotent; implementations may assume they
    /// are only invoked while locked.
    fn unlock(&mut self);

    /// Relock the controller.
    fn lock(&mut self);

    /// Start erasing the page containing `page_address`.
    ///
    /// `page_address` must be page-aligned (enforced by the storage driver).
    /// The operation runs in the background; poll [`is_busy`](Self::is_busy)
    /// for completion, then call [`clear_erase`](Self::clear_erase).
    fn start_page_erase(&mut self, page_address: u32);

    /// Clear the erase-enable condition.
    ///
    /// Must be called once per [`start_page_erase`](Self::start_page_erase),
    /// whether the erase completed or was abandoned on timeout.
    fn clear_erase(&mut self);

    /// Program one halfword at a halfword-aligned address.
    ///
    /// The destination must be erased. Poll [`is_busy`](Self::is_busy) for
    /// completion; the result is only trustworthy after a readback.
    fn program_halfword(&mut self, address: u32, value: u16);

    /// Read one halfword. Direct array read, never busy, no side effects.
    fn read_halfword(&self, address: u32) -> u16;
}

impl<F: FlashBank> FlashBank for &mut F {
    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }

    fn unlock(&mut self) {
        (**self).unlock()
    }

    fn lock(&mut self) {
        (**self).lock()
    }

    fn start_page_erase(&mut self, page_address: u32) {
        (**self).start_page_erase(page_address)
    }

    fn clear_erase(&mut self) {
        (**self).clear_erase()
    }

    fn program_halfword(&mut self, address: u32, value: u16) {
        (**self).program_halfword(address, value)
    }

    fn read_halfword(&self, address: u32) -> u16 {
        (**self).read_halfword(address)
    }
}
