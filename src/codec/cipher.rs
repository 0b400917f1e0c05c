//! Cipher stage: XXTEA over 32-bit little-endian words.
//!
//! The key is zero-padded/truncated to exactly 16 bytes. The round count is
//! `6 + 52 / word_count`, with the fixed additive constant `0x9E3779B9` per
//! round. The wire format appends one trailing word carrying the original
//! byte length, so the decoder can strip the word-alignment padding.
//!
//! This stage is obfuscation, not confidentiality: the key ships in the
//! same artifact as the ciphertext, and there is no integrity check — a
//! wrong key silently yields wrong plaintext that only fails later, at the
//! decompression stage.

use super::CodecError;

const DELTA: u32 = 0x9E37_79B9;

/// Normalize a key to exactly 16 bytes (zero-padded or truncated).
pub fn fix_key(key: &[u8]) -> [u8; 16] {
    let mut fixed = [0u8; 16];
    let n = key.len().min(16);
    fixed[..n].copy_from_slice(&key[..n]);
    fixed
}

/// The per-round mixing function.
///
/// Combines the current word's neighbors, the round sum, and a key term
/// selected by `(word_index & 3) ^ round_parity`.
#[inline]
fn mx(sum: u32, y: u32, z: u32, p: usize, e: u32, k: &[u32; 4]) -> u32 {
    (((z >> 5) ^ (y << 2)).wrapping_add((y >> 3) ^ (z << 4)))
        ^ ((sum ^ y).wrapping_add(k[((p as u32 & 3) ^ e) as usize] ^ z))
}

/// Pack the 16-byte key into four little-endian words.
fn key_words(key: &[u8; 16]) -> [u32; 4] {
    let mut words = [0u32; 4];
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        words[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Bytes -> little-endian words, appending one word with the byte length.
fn to_words_with_length(bytes: &[u8]) -> Vec<u32> {
    let n = bytes.len().div_ceil(4);
    let mut words = vec![0u32; n + 1];
    for (i, &b) in bytes.iter().enumerate() {
        words[i >> 2] |= u32::from(b) << ((i & 3) << 3);
    }
    words[n] = bytes.len() as u32;
    words
}

/// Bytes -> little-endian words without a length word (zero-padded).
fn to_words(bytes: &[u8]) -> Vec<u32> {
    let n = bytes.len().div_ceil(4);
    let mut words = vec![0u32; n];
    for (i, &b) in bytes.iter().enumerate() {
        words[i >> 2] |= u32::from(b) << ((i & 3) << 3);
    }
    words
}

/// Words -> bytes, every word fully expanded.
fn from_words(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

/// Words -> bytes, trailing word interpreted as the original byte length.
///
/// The length word is the only structural check the cipher has; it catches
/// gross corruption but is not an integrity guarantee.
fn from_words_with_length(words: &[u32]) -> Result<Vec<u8>, CodecError> {
    let n = (words.len() - 1) * 4;
    let m = *words.last().expect("non-empty word array") as usize;
    if m + 3 < n || m > n {
        return Err(CodecError::CipherLength);
    }
    let mut bytes = from_words(&words[..words.len() - 1]);
    bytes.truncate(m);
    Ok(bytes)
}

fn encrypt_words(v: &mut [u32], k: &[u32; 4]) {
    let length = v.len();
    if length < 2 {
        return;
    }
    let n = length - 1;
    let mut z = v[n];
    let mut sum = 0u32;
    let mut q = 6 + 52 / length;
    while q > 0 {
        q -= 1;
        sum = sum.wrapping_add(DELTA);
        let e = (sum >> 2) & 3;
        for p in 0..n {
            let y = v[p + 1];
            v[p] = v[p].wrapping_add(mx(sum, y, z, p, e, k));
            z = v[p];
        }
        let y = v[0];
        v[n] = v[n].wrapping_add(mx(sum, y, z, n, e, k));
        z = v[n];
    }
}

fn decrypt_words(v: &mut [u32], k: &[u32; 4]) {
    let length = v.len();
    if length < 2 {
        return;
    }
    let n = length - 1;
    let q = (6 + 52 / length) as u32;
    let mut y = v[0];
    let mut sum = q.wrapping_mul(DELTA);
    while sum != 0 {
        let e = (sum >> 2) & 3;
        for p in (1..=n).rev() {
            let z = v[p - 1];
            v[p] = v[p].wrapping_sub(mx(sum, y, z, p, e, k));
            y = v[p];
        }
        let z = v[n];
        v[0] = v[0].wrapping_sub(mx(sum, y, z, 0, e, k));
        y = v[0];
        sum = sum.wrapping_sub(DELTA);
    }
}

/// Encrypt a byte buffer. Empty input passes through unchanged.
pub fn encrypt(data: &[u8], key: &[u8; 16]) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let k = key_words(key);
    let mut words = to_words_with_length(data);
    encrypt_words(&mut words, &k);
    from_words(&words)
}

/// Decrypt a byte buffer. Empty input passes through unchanged.
pub fn decrypt(data: &[u8], key: &[u8; 16]) -> Result<Vec<u8>, CodecError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let k = key_words(key);
    let mut words = to_words(data);
    if words.len() < 2 {
        return Err(CodecError::CipherLength);
    }
    decrypt_words(&mut words, &k);
    from_words_with_length(&words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> [u8; 16] {
        fix_key(s.as_bytes())
    }

    #[test]
    fn test_fix_key_pads_and_truncates() {
        assert_eq!(&fix_key(b"k")[..2], &[b'k', 0]);
        assert_eq!(fix_key(b"0123456789abcdefEXTRA"), *b"0123456789abcdef");
    }

    #[test]
    fn test_roundtrip() {
        let k = key("secret");
        let data = b"some plaintext that spans multiple words";
        let enc = encrypt(data, &k);
        assert_ne!(&enc[..data.len().min(enc.len())], &data[..]);
        assert_eq!(decrypt(&enc, &k).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_word_misaligned() {
        let k = key("k");
        for len in 1..=9 {
            let data: Vec<u8> = (0..len as u8).collect();
            let enc = encrypt(&data, &k);
            assert_eq!(enc.len() % 4, 0);
            assert_eq!(decrypt(&enc, &k).unwrap(), data, "len {len}");
        }
    }

    #[test]
    fn test_roundtrip_empty() {
        let k = key("k");
        assert!(encrypt(b"", &k).is_empty());
        assert!(decrypt(b"", &k).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_key_yields_wrong_plaintext_silently() {
        let enc = encrypt(b"hello world, this is a longer message", &key("right"));
        // A wrong key either trips the length word or returns garbage —
        // it never reproduces the plaintext and never reports "bad key".
        match decrypt(&enc, &key("wrong")) {
            Ok(plain) => assert_ne!(plain, b"hello world, this is a longer message"),
            Err(CodecError::CipherLength) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_round_count_matches_schedule() {
        // 2 words -> 6 + 52/2 = 32 rounds; just pin the constant in place.
        assert_eq!(6 + 52 / 2, 32usize);
        assert_eq!(DELTA, 0x9E37_79B9);
    }
}
