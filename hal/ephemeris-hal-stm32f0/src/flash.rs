//! Flash geometry for STM32F0 diary storage
//!
//! The diary reserves the last two 2KB pages of a 64KB STM32F0x1 part.
//! Index records and content bytes live on separate pages so that an index
//! compaction erase can never take live content with it: page 62 holds the
//! metadata table, page 63 the content arena.

// Re-export the trait this chip's firmware driver implements
pub use ephemeris_hal::flash::FlashBank;

/// Start of the flash array in the memory map.
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Page size for the STM32F0x1 series (2KB erase units).
pub const FLASH_PAGE_SIZE: u32 = 2048;

/// FLASH_KEYR unlock sequence, first key.
pub const FLASH_KEY1: u32 = 0x4567_0123;

/// FLASH_KEYR unlock sequence, second key.
pub const FLASH_KEY2: u32 = 0xCDEF_89AB;

/// Page 62: the diary's metadata index table.
pub const DIARY_INDEX_PAGE: u32 = 0x0800_F800;

/// Page 63: the diary's content arena.
pub const DIARY_CONTENT_PAGE: u32 = 0x0801_0000;

/// Total bytes of the reserved diary region (both pages).
pub const DIARY_REGION_SIZE: u32 = 2 * FLASH_PAGE_SIZE;

// The layout only works if the two regions really are distinct erase units
// abutting each other.
const _: () = assert!(DIARY_INDEX_PAGE % FLASH_PAGE_SIZE == 0);
const _: () = assert!(DIARY_CONTENT_PAGE % FLASH_PAGE_SIZE == 0);
const _: () = assert!(DIARY_CONTENT_PAGE == DIARY_INDEX_PAGE + FLASH_PAGE_SIZE);
const _: () = assert!(DIARY_INDEX_PAGE >= FLASH_BASE);
