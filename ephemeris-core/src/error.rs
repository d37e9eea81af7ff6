//! Storage error taxonomy
//!
//! Every fallible operation in the stack returns one of these. None of the
//! flash-layer failures are retried internally: a verify mismatch or a
//! timeout on this kind of memory is not something a bounded retry reliably
//! fixes, so the error is surfaced to the caller instead.

/// Errors from the flash, emulation, and diary layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Virtual address or page address outside the managed range or
    /// not aligned for the requested operation
    InvalidAddress,
    /// Layout geometry rejected at construction
    InvalidLayout,
    /// Page erase did not complete within its time budget
    EraseTimeout,
    /// Page read back non-erased after an erase completed
    EraseVerifyFailed,
    /// Halfword program did not complete within its time budget
    WriteTimeout,
    /// Post-write readback mismatch, or attempt to program a location
    /// that is neither erased nor already holding the target value
    WriteFailed,
    /// Content arena cannot fit the new entry
    InsufficientSpace,
    /// Content exceeds the per-entry size bound
    ContentTooLarge,
    /// Index table reached its declared entry capacity
    IndexFull,
    /// Entry index is at or past the current entry count
    IndexOutOfRange,
    /// Direct access hit a deleted (sentinel) record
    EntryDeleted,
    /// No entry carries the requested tag
    TagNotFound,
    /// Caller buffer too small for the entry plus terminator
    BufferTooSmall,
}
