//! Diary index and content allocator
//!
//! An append-only record store on top of the EEPROM emulation:
//!
//! - the index region holds a dense prefix of valid records, terminated by
//!   the first sentinel (erased) slot
//! - content is allocated strictly forward: each entry lands just past the
//!   highest byte any earlier entry reached, rounded up to the next even
//!   address
//! - deleting compacts the index (erase + rewrite of the survivors) and
//!   abandons the entry's content bytes until their page is erased by a
//!   later epoch - a deliberate space leak, inherent to log-structured
//!   allocation without wear leveling
//!
//! Durability ordering in [`store`](Diary::store): content bytes are fully
//! programmed before the metadata record, so an interrupted store can only
//! leave orphaned unreferenced bytes, never an index entry pointing at
//! incomplete content.

pub mod record;

pub use record::{EntryRecord, RECORD_SIZE, SENTINEL_ADDRESS, TAG_LEN};

use ephemeris_hal::{FlashBank, Monotonic, ERASED_BYTE};
use heapless::Vec;

use crate::cipher;
use crate::error::Error;
use crate::layout::{DiaryLayout, MAX_CONTENT_LEN, MAX_ENTRIES};
use crate::storage::Eeprom;
use record::pack_tag;

/// Tagged, timestamped record store over emulated EEPROM
pub struct Diary<F, C> {
    eeprom: Eeprom<F, C>,
    layout: DiaryLayout,
    key: u8,
}

impl<F: FlashBank, C: Monotonic> Diary<F, C> {
    /// Open a diary with the default obfuscation key.
    pub fn new(eeprom: Eeprom<F, C>, layout: DiaryLayout) -> Result<Self, Error> {
        Self::with_key(eeprom, layout, cipher::DEFAULT_KEY)
    }

    /// Open a diary with a caller-provided obfuscation key.
    ///
    /// Validates the layout geometry against the emulated region. No flash
    /// is touched: an erased region already is a valid, empty diary.
    pub fn with_key(eeprom: Eeprom<F, C>, layout: DiaryLayout, key: u8) -> Result<Self, Error> {
        layout.validate()?;
        if layout.page_size != eeprom.page_size() || layout.total_size() > eeprom.size() {
            return Err(Error::InvalidLayout);
        }
        Ok(Self {
            eeprom,
            layout,
            key,
        })
    }

    /// Number of valid records: the dense prefix before the first sentinel.
    ///
    /// Re-derived from flash on every call, O(entries).
    pub fn entry_count(&self) -> Result<usize, Error> {
        let mut count = 0;
        while count < self.layout.record_capacity() {
            if self.record_at(count)?.is_sentinel() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    fn record_at(&self, index: usize) -> Result<EntryRecord, Error> {
        let mut bytes = [0u8; RECORD_SIZE];
        self.eeprom.read(self.layout.slot_address(index), &mut bytes)?;
        Ok(EntryRecord::decode(&bytes))
    }

    /// Where the next entry's content would start.
    ///
    /// One past the highest byte used by any current record, rounded up to
    /// an even address (flash programs in two-byte units), then advanced
    /// past any programmed bytes sitting above that mark. Deleting the
    /// newest entry leaves its content orphaned up there; handing those
    /// addresses out again would make every following write fail its
    /// pre-scan, so orphans are skipped, never reused.
    ///
    /// An empty index restarts at the arena base: the first store's page
    /// erase reclaims whatever the previous epoch left behind.
    pub fn next_free_content_address(&self) -> Result<u32, Error> {
        let count = self.entry_count()?;
        if count == 0 {
            return Ok(self.layout.content_base());
        }
        let mut highest = self.layout.content_base();
        for index in 0..count {
            let entry = self.record_at(index)?;
            let end = entry.content_address + entry.length as u32;
            if end > highest {
                highest = end;
            }
        }

        let mut next = (highest + 1) & !1;
        // scan the rest of the high-water page for orphans; a run reaching
        // the page boundary continues into the next page, which the orphan's
        // own store already erased. Pages past the scan stay subject to the
        // first-writer erase.
        let page_size = self.layout.page_size;
        let content_end = self.layout.content_end();
        let mut window_end = (next - next % page_size + page_size).min(content_end);
        let mut probe = next;
        while probe < window_end {
            if !self.halfword_erased(probe)? {
                next = probe + 2;
                if next == window_end {
                    window_end = (window_end + page_size).min(content_end);
                }
            }
            probe += 2;
        }
        Ok(next)
    }

    fn halfword_erased(&self, address: u32) -> Result<bool, Error> {
        let mut bytes = [0u8; 2];
        self.eeprom.read(address, &mut bytes)?;
        Ok(bytes == [ERASED_BYTE; 2])
    }

    /// Store a new entry at the end of the log.
    ///
    /// The tag is truncated to [`TAG_LEN`]` - 1` bytes. Unless
    /// `already_encrypted` is set, content is obfuscated with the diary key
    /// before it hits flash. All space checks happen before anything is
    /// written; after that, content goes in first and the metadata record
    /// second, so a failure part-way leaves the entry count unchanged.
    pub fn store(&mut self, tag: &str, content: &[u8], already_encrypted: bool) -> Result<(), Error> {
        if content.len() > MAX_CONTENT_LEN {
            return Err(Error::ContentTooLarge);
        }
        let count = self.entry_count()?;
        if count >= self.layout.max_entries {
            return Err(Error::IndexFull);
        }
        let content_address = self.next_free_content_address()?;
        let end = content_address + content.len() as u32;
        if end > self.layout.content_end() {
            return Err(Error::InsufficientSpace);
        }

        let timestamp = self.eeprom.clock().now_ms();
        let entry = EntryRecord::new(tag, content_address, content.len() as u16, timestamp);

        let mut staged: Vec<u8, MAX_CONTENT_LEN> = Vec::new();
        staged
            .extend_from_slice(content)
            .map_err(|_| Error::ContentTooLarge)?;
        if !already_encrypted {
            cipher::apply_in_place(&mut staged, self.key);
        }

        self.erase_entered_pages(content_address, end)?;
        self.eeprom.write(content_address, &staged)?;
        self.eeprom
            .write(self.layout.slot_address(count), &entry.encode())?;
        Ok(())
    }

    /// Erase every content page this write is the first to reach.
    ///
    /// The allocator only moves forward, so a page base at or past the new
    /// entry's start holds no live bytes; erasing it reclaims orphans from
    /// the previous epoch. Pages below the start are never touched.
    fn erase_entered_pages(&mut self, start: u32, end: u32) -> Result<(), Error> {
        let page_size = self.layout.page_size;
        let mut page = if start % page_size == 0 {
            start
        } else {
            start - start % page_size + page_size
        };
        while page < end {
            self.eeprom.erase(page)?;
            page += page_size;
        }
        Ok(())
    }

    /// Read an entry's content into `buffer`, which must hold at least
    /// `length + 1` bytes; the content is null-terminated in the buffer.
    ///
    /// With `decrypt` set, the obfuscation is undone in place with the
    /// diary key. Returns the content length.
    pub fn retrieve(&self, index: usize, buffer: &mut [u8], decrypt: bool) -> Result<usize, Error> {
        let count = self.entry_count()?;
        if index >= count {
            return Err(Error::IndexOutOfRange);
        }
        let entry = self.record_at(index)?;
        if entry.is_sentinel() {
            return Err(Error::EntryDeleted);
        }

        let length = entry.length as usize;
        if buffer.len() < length + 1 {
            return Err(Error::BufferTooSmall);
        }
        self.eeprom.read(entry.content_address, &mut buffer[..length])?;
        buffer[length] = 0;
        if decrypt {
            cipher::apply_in_place(&mut buffer[..length], self.key);
        }
        Ok(length)
    }

    /// Find the lowest-index entry whose tag matches exactly.
    ///
    /// The query is truncated and null-padded the same way stored tags are,
    /// so a tag that was cut off at store time still matches its original.
    pub fn find_by_tag(&self, tag: &str) -> Result<(usize, EntryRecord), Error> {
        let query = pack_tag(tag);
        let count = self.entry_count()?;
        for index in 0..count {
            let entry = self.record_at(index)?;
            if !entry.is_sentinel() && entry.tag == query {
                return Ok((index, entry));
            }
        }
        Err(Error::TagNotFound)
    }

    /// Remove the entry at `index`, compacting the log.
    ///
    /// All validation happens before the irreversible erase, and every
    /// surviving record is staged in memory first: the index region is then
    /// erased and rewritten contiguously in original order, followed by an
    /// explicit end-of-log sentinel. The deleted entry's content bytes stay
    /// orphaned in the arena.
    pub fn delete(&mut self, index: usize) -> Result<(), Error> {
        let count = self.entry_count()?;
        if index >= count {
            return Err(Error::IndexOutOfRange);
        }
        if self.record_at(index)?.is_sentinel() {
            return Err(Error::EntryDeleted);
        }

        let mut survivors: Vec<EntryRecord, MAX_ENTRIES> = Vec::new();
        for i in 0..count {
            if i == index {
                continue;
            }
            survivors
                .push(self.record_at(i)?)
                .map_err(|_| Error::IndexFull)?;
        }

        let page_size = self.layout.page_size;
        let mut page = 0;
        while page < self.layout.index_size() {
            self.eeprom.erase(page)?;
            page += page_size;
        }

        for (slot, entry) in survivors.iter().enumerate() {
            self.eeprom
                .write(self.layout.slot_address(slot), &entry.encode())?;
        }
        // every halfword of the marker short-circuits against erased flash
        self.eeprom.write(
            self.layout.slot_address(survivors.len()),
            &EntryRecord::sentinel().encode(),
        )?;
        Ok(())
    }

    /// All current records, in index order.
    pub fn list(&self) -> Result<Vec<EntryRecord, MAX_ENTRIES>, Error> {
        let count = self.entry_count()?;
        let mut entries = Vec::new();
        for index in 0..count {
            entries
                .push(self.record_at(index)?)
                .map_err(|_| Error::IndexFull)?;
        }
        Ok(entries)
    }
}
