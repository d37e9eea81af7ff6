//! At-rest obfuscation cipher
//!
//! A keyed XOR stream with a rotating 8-bit key register: each byte is XORed
//! with the current key, then the key rotates right by 3 bits. The key
//! schedule depends only on position, so applying the same transform twice
//! with the same starting key returns the original bytes - encryption and
//! decryption are the same call.
//!
//! This is **not** cryptography. The transform is trivially reversible and
//! exists only so diary content is not stored as readable plaintext; it is
//! kept for compatibility with existing on-flash data.

/// Default key, matching existing stored diaries.
pub const DEFAULT_KEY: u8 = 0x55;

/// Apply the obfuscation transform in place.
///
/// Involutive: applying it twice with the same `key` restores the input.
pub fn apply_in_place(data: &mut [u8], key: u8) {
    let mut key = key;
    for byte in data.iter_mut() {
        *byte ^= key;
        key = key.rotate_right(3);
    }
}
