//! Diary region geometry
//!
//! The diary owns a small run of flash pages, split into two regions that
//! must sit on disjoint erase units:
//!
//! ```text
//! ┌────────────────────────┬────────────────────────┐
//! │ index region           │ content arena          │
//! │ (whole pages, fixed-   │ (whole pages, forward- │
//! │  size metadata records)│  growing payloads)     │
//! └────────────────────────┴────────────────────────┘
//! ```
//!
//! Delete compaction erases the entire index region and rewrites it, so any
//! content byte sharing an index erase unit would be destroyed. The layout
//! therefore counts whole pages per region and refuses anything else.
//!
//! Addresses here are virtual: zero is the first index byte, and the
//! emulation layer adds the physical base.

use crate::diary::record::RECORD_SIZE;
use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Declared maximum number of diary entries.
///
/// The index page fits more records than this (2048 / 26 = 78); the declared
/// bound keeps RAM staging buffers small and matches existing diaries.
pub const MAX_ENTRIES: usize = 50;

/// Maximum content bytes per entry.
pub const MAX_CONTENT_LEN: usize = 128;

/// Geometry of one diary region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiaryLayout {
    /// Erase unit size in bytes
    pub page_size: u32,
    /// Whole pages reserved for the metadata index
    pub index_pages: u32,
    /// Whole pages reserved for the content arena
    pub content_pages: u32,
    /// Declared entry bound, at most [`MAX_ENTRIES`]
    pub max_entries: usize,
}

impl DiaryLayout {
    /// Standard layout: one index page followed by one content page.
    pub const fn two_page(page_size: u32) -> Self {
        Self {
            page_size,
            index_pages: 1,
            content_pages: 1,
            max_entries: MAX_ENTRIES,
        }
    }

    /// Bytes reserved for the index region.
    pub const fn index_size(&self) -> u32 {
        self.index_pages * self.page_size
    }

    /// First virtual address of the content arena.
    pub const fn content_base(&self) -> u32 {
        self.index_size()
    }

    /// One past the last virtual address of the content arena.
    pub const fn content_end(&self) -> u32 {
        self.index_size() + self.content_pages * self.page_size
    }

    /// Total bytes of the managed region.
    pub const fn total_size(&self) -> u32 {
        self.content_end()
    }

    /// How many metadata records the index region can physically hold.
    pub const fn record_capacity(&self) -> usize {
        self.index_size() as usize / RECORD_SIZE
    }

    /// Virtual address of the metadata slot at `index`.
    pub const fn slot_address(&self, index: usize) -> u32 {
        (index * RECORD_SIZE) as u32
    }

    /// Check the geometry invariants.
    ///
    /// Rejects layouts where the declared entry bound does not fit the index
    /// region: an undersized table would let the log's tail spill into the
    /// content arena, silently corrupting it.
    pub fn validate(&self) -> Result<(), Error> {
        if self.page_size == 0 || self.page_size % 2 != 0 {
            return Err(Error::InvalidLayout);
        }
        if self.index_pages == 0 || self.content_pages == 0 {
            return Err(Error::InvalidLayout);
        }
        if self.max_entries == 0 || self.max_entries > MAX_ENTRIES {
            return Err(Error::InvalidLayout);
        }
        if self.record_capacity() < self.max_entries {
            return Err(Error::InvalidLayout);
        }
        Ok(())
    }
}

// Cross-check the standard STM32F0 geometry at compile time: the declared
// entry bound must fit the index page, and one entry must fit the arena.
const STM32F0_LAYOUT: DiaryLayout = DiaryLayout::two_page(2048);
const _: () = assert!(STM32F0_LAYOUT.record_capacity() >= STM32F0_LAYOUT.max_entries);
const _: () = assert!(MAX_CONTENT_LEN as u32 <= STM32F0_LAYOUT.content_end() - STM32F0_LAYOUT.content_base());
