//! In-memory flash and clock simulators
//!
//! Host-side stand-ins for the hardware: [`SimFlash`] implements the
//! [`FlashBank`] contract over a RAM array with real flash semantics
//! (erase sets all-ones, programming only clears bits, lock is honored),
//! and [`SimClock`] is a [`Monotonic`] tick that advances on every read so
//! busy-wait loops make progress in tests.
//!
//! Fault injection hooks cover the paths real hardware makes hard to reach
//! on demand: a stuck BSY flag for timeout tests and a dropped program
//! pulse for verify-failure tests.

use core::cell::Cell;

use crate::flash::{FlashBank, ERASED_BYTE};
use crate::time::Monotonic;

/// Simulated page size, matching STM32F0x1 flash.
pub const SIM_PAGE_SIZE: u32 = 2048;

/// Number of simulated pages (index page + content page).
pub const SIM_PAGE_COUNT: usize = 2;

/// Total simulated flash size in bytes.
pub const SIM_FLASH_SIZE: usize = SIM_PAGE_SIZE as usize * SIM_PAGE_COUNT;

/// Two-page in-memory flash bank
///
/// Addresses are absolute, offset by the `base` passed at construction, so
/// tests can use the same addresses as the real part.
pub struct SimFlash {
    mem: [u8; SIM_FLASH_SIZE],
    base: u32,
    locked: bool,
    erase_armed: bool,
    force_busy: bool,
    drop_program_in: Option<u32>,
}

impl SimFlash {
    /// Create a freshly erased, locked flash bank starting at `base`.
    pub fn new(base: u32) -> Self {
        Self {
            mem: [ERASED_BYTE; SIM_FLASH_SIZE],
            base,
            locked: true,
            erase_armed: false,
            force_busy: false,
            drop_program_in: None,
        }
    }

    /// Hold the BSY flag asserted so every bounded wait times out.
    pub fn set_force_busy(&mut self, busy: bool) {
        self.force_busy = busy;
    }

    /// Silently drop the `n`-th upcoming program pulse (0 = the next one).
    ///
    /// The dropped halfword stays in its previous state, so the driver's
    /// readback verify sees the mismatch.
    pub fn drop_program_in(&mut self, n: u32) {
        self.drop_program_in = Some(n);
    }

    /// Raw view of a flash range, for test assertions.
    ///
    /// # Panics
    ///
    /// Panics if the range falls outside the simulated array.
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        let start = self.offset(address);
        &self.mem[start..start + len]
    }

    /// Check that a flash range reads as the erased pattern.
    pub fn is_erased(&self, address: u32, len: usize) -> bool {
        self.contents(address, len).iter().all(|&b| b == ERASED_BYTE)
    }

    fn offset(&self, address: u32) -> usize {
        (address - self.base) as usize
    }
}

impl FlashBank for SimFlash {
    fn is_busy(&self) -> bool {
        self.force_busy
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn start_page_erase(&mut self, page_address: u32) {
        if self.locked {
            return;
        }
        self.erase_armed = true;
        let page = self.offset(page_address) & !(SIM_PAGE_SIZE as usize - 1);
        for byte in &mut self.mem[page..page + SIM_PAGE_SIZE as usize] {
            *byte = ERASED_BYTE;
        }
    }

    fn clear_erase(&mut self) {
        self.erase_armed = false;
    }

    fn program_halfword(&mut self, address: u32, value: u16) {
        if self.locked {
            return;
        }
        if let Some(n) = self.drop_program_in {
            if n == 0 {
                self.drop_program_in = None;
                return;
            }
            self.drop_program_in = Some(n - 1);
        }
        // NOR semantics: programming can only clear bits
        let i = self.offset(address);
        self.mem[i] &= value as u8;
        self.mem[i + 1] &= (value >> 8) as u8;
    }

    fn read_halfword(&self, address: u32) -> u16 {
        let i = self.offset(address);
        u16::from_le_bytes([self.mem[i], self.mem[i + 1]])
    }
}

/// Simulated monotonic clock
///
/// Advances by `step_ms` on every read, so a busy-poll loop always reaches
/// its deadline in a finite number of iterations.
pub struct SimClock {
    now: Cell<u32>,
    step_ms: u32,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Create a clock starting at zero that advances 1 ms per read.
    pub fn new() -> Self {
        Self::with_step(1)
    }

    /// Create a clock advancing `step_ms` per read.
    pub fn with_step(step_ms: u32) -> Self {
        Self {
            now: Cell::new(0),
            step_ms,
        }
    }
}

impl Monotonic for SimClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step_ms));
        now
    }
}
