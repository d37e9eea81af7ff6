//! On-flash metadata record layout
//!
//! Each diary entry is described by one fixed-size record in the index
//! region:
//!
//! ```text
//! offset  size  field
//!      0     4  content_address (LE, virtual)
//!      4     2  length (LE)
//!      6    16  tag (null-padded, max 15 payload bytes)
//!     22     4  timestamp (LE)
//! ```
//!
//! A record whose `content_address` is all-ones marks "slot empty / end of
//! log". That is simply what erased flash reads as, so an empty table needs
//! no header, magic, or initialization pass: fresh and erased are the same
//! state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed on-flash tag width, terminator included.
pub const TAG_LEN: usize = 16;

/// Serialized record size in bytes. Even, so records stay halfword-aligned.
pub const RECORD_SIZE: usize = 26;

/// `content_address` value marking an empty slot (the erased bit pattern).
pub const SENTINEL_ADDRESS: u32 = 0xFFFF_FFFF;

/// One diary index record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntryRecord {
    /// Virtual address of the first content byte
    pub content_address: u32,
    /// Content length in bytes
    pub length: u16,
    /// Null-padded tag bytes
    pub tag: [u8; TAG_LEN],
    /// Tick captured when the entry was stored
    pub timestamp: u32,
}

impl EntryRecord {
    /// Build a record, truncating and null-padding the tag.
    pub fn new(tag: &str, content_address: u32, length: u16, timestamp: u32) -> Self {
        Self {
            content_address,
            length,
            tag: pack_tag(tag),
            timestamp,
        }
    }

    /// The all-ones end-of-log marker.
    pub const fn sentinel() -> Self {
        Self {
            content_address: SENTINEL_ADDRESS,
            length: 0xFFFF,
            tag: [0xFF; TAG_LEN],
            timestamp: 0xFFFF_FFFF,
        }
    }

    /// Check for the empty-slot marker.
    pub fn is_sentinel(&self) -> bool {
        self.content_address == SENTINEL_ADDRESS
    }

    /// Tag as a string slice, up to the first terminator.
    ///
    /// Returns an empty string for tags that are not valid UTF-8 (possible
    /// only for flash written by other tooling).
    pub fn tag_str(&self) -> &str {
        let end = self.tag.iter().position(|&b| b == 0).unwrap_or(TAG_LEN);
        core::str::from_utf8(&self.tag[..end]).unwrap_or("")
    }

    /// Serialize into the on-flash layout.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..4].copy_from_slice(&self.content_address.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.length.to_le_bytes());
        bytes[6..22].copy_from_slice(&self.tag);
        bytes[22..26].copy_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }

    /// Deserialize from the on-flash layout.
    pub fn decode(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&bytes[6..22]);
        Self {
            content_address: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u16::from_le_bytes([bytes[4], bytes[5]]),
            tag,
            timestamp: u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]),
        }
    }
}

/// Truncate and null-pad a tag to its fixed on-flash width.
pub fn pack_tag(tag: &str) -> [u8; TAG_LEN] {
    let mut packed = [0u8; TAG_LEN];
    let bytes = tag.as_bytes();
    let n = bytes.len().min(TAG_LEN - 1);
    packed[..n].copy_from_slice(&bytes[..n]);
    packed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let record = EntryRecord::new("note1", 0x820, 42, 123456);
        let decoded = EntryRecord::decode(&record.encode());
        assert_eq!(decoded, record);
    }

    #[test]
    fn sentinel_encodes_as_all_ones() {
        assert_eq!(EntryRecord::sentinel().encode(), [0xFF; RECORD_SIZE]);
        assert!(EntryRecord::sentinel().is_sentinel());
    }

    #[test]
    fn erased_slot_decodes_as_sentinel() {
        let decoded = EntryRecord::decode(&[0xFF; RECORD_SIZE]);
        assert!(decoded.is_sentinel());
    }

    #[test]
    fn tag_is_truncated_to_fifteen_bytes() {
        let record = EntryRecord::new("a-tag-well-beyond-the-limit", 0, 0, 0);
        assert_eq!(record.tag_str(), "a-tag-well-beyo");
        assert_eq!(record.tag[TAG_LEN - 1], 0);
    }

    #[test]
    fn short_tags_are_null_padded() {
        let packed = pack_tag("hi");
        assert_eq!(&packed[..2], b"hi");
        assert!(packed[2..].iter().all(|&b| b == 0));
    }
}
