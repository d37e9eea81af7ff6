//! EEPROM emulation layer
//!
//! Presents a flat, byte-addressable virtual space `[0, size)` on top of the
//! halfword-programmed physical region. Byte pairs pack little-endian into
//! halfwords; an odd trailing byte occupies the low byte of its halfword
//! with the high byte programmed to zero.
//!
//! Every mutating call brackets the flash with unlock/lock, including on
//! error paths: a failed write must never leave the controller unlocked.

use ephemeris_hal::{FlashBank, Monotonic, ERASED_HALFWORD};

use crate::error::Error;
use crate::storage::driver::FlashDriver;

/// Byte-addressable view of the managed flash region
///
/// `base` is the physical address of virtual zero and must be page-aligned;
/// `size` is the extent of the virtual space in bytes.
pub struct Eeprom<F, C> {
    driver: FlashDriver<F, C>,
    base: u32,
    size: u32,
}

impl<F: FlashBank, C: Monotonic> Eeprom<F, C> {
    /// Map `size` bytes of flash starting at physical `base`.
    pub fn new(driver: FlashDriver<F, C>, base: u32, size: u32) -> Self {
        Self { driver, base, size }
    }

    /// Extent of the virtual space in bytes.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Erase unit size of the underlying flash.
    pub fn page_size(&self) -> u32 {
        self.driver.page_size()
    }

    /// The injected tick source.
    pub fn clock(&self) -> &C {
        self.driver.clock()
    }

    fn check_range(&self, address: u32, len: usize) -> Result<(), Error> {
        if address % 2 != 0 {
            return Err(Error::InvalidAddress);
        }
        if address as u64 + len as u64 > self.size as u64 {
            return Err(Error::InvalidAddress);
        }
        Ok(())
    }

    /// Pack the halfword starting at byte `i`, zero-filling a lone high byte.
    fn pack(data: &[u8], i: usize) -> u16 {
        if i + 1 < data.len() {
            u16::from_le_bytes([data[i], data[i + 1]])
        } else {
            data[i] as u16
        }
    }

    /// Write `data` at a halfword-aligned virtual address.
    ///
    /// Before unlocking, the whole destination range is scanned: every
    /// halfword must be erased or already hold its target value, otherwise
    /// [`Error::WriteFailed`] is returned with flash untouched. Each
    /// programmed halfword is verified by readback.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Error> {
        self.check_range(address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        let physical = self.base + address;
        let mut i = 0;
        while i < data.len() {
            let current = self.driver.read_halfword(physical + i as u32);
            let value = Self::pack(data, i);
            if current != ERASED_HALFWORD && current != value {
                return Err(Error::WriteFailed);
            }
            i += 2;
        }

        self.driver.unlock();
        let result = self.program_all(physical, data);
        self.driver.lock();
        result
    }

    fn program_all(&mut self, physical: u32, data: &[u8]) -> Result<(), Error> {
        let mut i = 0;
        while i < data.len() {
            self.driver
                .program_halfword(physical + i as u32, Self::pack(data, i))?;
            i += 2;
        }
        Ok(())
    }

    /// Read `buffer.len()` bytes from a halfword-aligned virtual address.
    pub fn read(&self, address: u32, buffer: &mut [u8]) -> Result<(), Error> {
        self.check_range(address, buffer.len())?;

        let physical = self.base + address;
        let mut i = 0;
        while i < buffer.len() {
            let value = self.driver.read_halfword(physical + i as u32);
            buffer[i] = value as u8;
            if i + 1 < buffer.len() {
                buffer[i + 1] = (value >> 8) as u8;
            }
            i += 2;
        }
        Ok(())
    }

    /// Erase the page at a page-aligned virtual address.
    pub fn erase(&mut self, page_address: u32) -> Result<(), Error> {
        if page_address >= self.size {
            return Err(Error::InvalidAddress);
        }
        self.driver.unlock();
        let result = self.driver.erase_page(self.base + page_address);
        self.driver.lock();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemeris_hal::sim::{SimClock, SimFlash, SIM_PAGE_SIZE};
    use ephemeris_hal::FlashBank as _;

    const BASE: u32 = 0x0800_F800;
    const SIZE: u32 = 2 * SIM_PAGE_SIZE;

    fn eeprom<'a>(
        flash: &'a mut SimFlash,
        clock: &'a SimClock,
    ) -> Eeprom<&'a mut SimFlash, &'a SimClock> {
        Eeprom::new(
            FlashDriver::new(flash, clock, SIM_PAGE_SIZE),
            BASE,
            SIZE,
        )
    }

    #[test]
    fn round_trips_even_length() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        ee.write(0x40, b"abcdef").unwrap();
        let mut buf = [0u8; 6];
        ee.read(0x40, &mut buf).unwrap();
        assert_eq!(&buf, b"abcdef");
    }

    #[test]
    fn round_trips_odd_length() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        ee.write(0x40, b"hello").unwrap();
        let mut buf = [0u8; 5];
        ee.read(0x40, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn out_of_range_access_is_rejected() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        assert_eq!(ee.write(SIZE - 2, b"abcd"), Err(Error::InvalidAddress));
        let mut buf = [0u8; 4];
        assert_eq!(ee.read(SIZE - 2, &mut buf), Err(Error::InvalidAddress));
        // right at the end is fine
        assert_eq!(ee.write(SIZE - 4, b"abcd"), Ok(()));
    }

    #[test]
    fn odd_address_is_rejected() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        assert_eq!(ee.write(0x41, b"ab"), Err(Error::InvalidAddress));
    }

    #[test]
    fn overwrite_fails_before_touching_flash() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        ee.write(0x40, b"abcd").unwrap();
        assert_eq!(ee.write(0x40, b"efgh"), Err(Error::WriteFailed));
        let mut buf = [0u8; 4];
        ee.read(0x40, &mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn rewriting_identical_data_succeeds() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        ee.write(0x40, b"abcd").unwrap();
        assert_eq!(ee.write(0x40, b"abcd"), Ok(()));
    }

    #[test]
    fn lock_is_restored_after_failed_write() {
        let mut flash = SimFlash::new(BASE);
        flash.drop_program_in(1);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        assert_eq!(ee.write(0x40, b"abcd"), Err(Error::WriteFailed));
        drop(ee);
        assert!(flash.is_locked());
    }

    #[test]
    fn erase_clears_a_whole_virtual_page() {
        let mut flash = SimFlash::new(BASE);
        let clock = SimClock::new();
        let mut ee = eeprom(&mut flash, &clock);
        ee.write(SIM_PAGE_SIZE + 0x10, b"data").unwrap();
        ee.erase(SIM_PAGE_SIZE).unwrap();
        drop(ee);
        assert!(flash.is_erased(BASE + SIM_PAGE_SIZE, SIM_PAGE_SIZE as usize));
        assert!(flash.is_locked());
    }
}
