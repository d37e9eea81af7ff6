//! Monotonic tick source
//!
//! The storage core consumes time in two places: entry timestamps and the
//! deadline base for bounded flash busy-waits. Both come through this trait
//! so the tick source (SysTick on hardware, a counter in tests) is injected
//! rather than global.

/// Monotonic millisecond tick
///
/// The tick must never go backwards; wraparound after ~49 days is handled by
/// callers using wrapping subtraction for intervals.
pub trait Monotonic {
    /// Current tick in milliseconds since an arbitrary epoch.
    fn now_ms(&self) -> u32;
}

impl<T: Monotonic> Monotonic for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
