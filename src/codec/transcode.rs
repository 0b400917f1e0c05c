//! Text-safe transcoding: bytes -> a string an HTML document cannot alter.
//!
//! Two schemes, both reversible, both emitting only non-ASCII BMP code
//! points (no `<`, `&`, quotes, or surrogates — nothing HTML or script
//! parsing can split, re-interpret, or percent-escape):
//!
//! - [`pack`]/[`unpack`]: 15 bits per code point, drawn from two disjoint
//!   repertoires (a 32768-character main set and a 128-character tail set
//!   for a short final group). The final group's unused low bits are padded
//!   with ones; any other pattern is a decode error.
//! - [`widen`]/[`unwiden`]: a simpler fixed-width scheme used by the `wide`
//!   strategy — 15 bits per code point from a single contiguous range, with
//!   a terminal marker bit instead of repertoire switching. Larger output,
//!   trivially valid.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

use super::CodecError;

const BITS_PER_CHAR: u32 = 15;
const BITS_PER_BYTE: u32 = 8;

/// Code point ranges (inclusive) of the 15-bit repertoire: 32768 characters.
const MAIN_RANGES: &[(u32, u32)] = &[
    (0x04A0, 0x04BF),
    (0x0500, 0x051F),
    (0x0680, 0x06BF),
    (0x0760, 0x079F),
    (0x07C0, 0x07DF),
    (0x1000, 0x101F),
    (0x10A0, 0x10BF),
    (0x1100, 0x115F),
    (0x1180, 0x119F),
    (0x11E0, 0x123F),
    (0x1260, 0x127F),
    (0x12E0, 0x12FF),
    (0x1320, 0x133F),
    (0x13A0, 0x13DF),
    (0x1420, 0x165F),
    (0x16A0, 0x16DF),
    (0x1780, 0x179F),
    (0x1820, 0x185F),
    (0x18C0, 0x18DF),
    (0x1980, 0x199F),
    (0x19E0, 0x19FF),
    (0x1A20, 0x1A3F),
    (0x1BC0, 0x1BDF),
    (0x1C00, 0x1C1F),
    (0x1D00, 0x1D1F),
    (0x21E0, 0x21FF),
    (0x22C0, 0x22DF),
    (0x2340, 0x23DF),
    (0x2400, 0x241F),
    (0x2500, 0x275F),
    (0x2780, 0x27BF),
    (0x2800, 0x297F),
    (0x29A0, 0x29BF),
    (0x2A20, 0x2A5F),
    (0x2A80, 0x2ABF),
    (0x2AE0, 0x2B5F),
    (0x2C00, 0x2C1F),
    (0x2C80, 0x2CDF),
    (0x2D00, 0x2D1F),
    (0x2D40, 0x2D5F),
    (0x2EA0, 0x2EDF),
    (0x31C0, 0x31DF),
    (0x3400, 0x4D9F),
    (0x4DC0, 0x9FBF),
    (0xA000, 0xA47F),
    (0xA4A0, 0xA4BF),
    (0xA500, 0xA5FF),
    (0xA640, 0xA65F),
    (0xA6A0, 0xA6DF),
    (0xA700, 0xA75F),
    (0xA780, 0xA79F),
    (0xA840, 0xA85F),
];

/// Code point ranges of the 7-bit tail repertoire: 128 characters.
const TAIL_RANGES: &[(u32, u32)] = &[(0x0180, 0x019F), (0x0240, 0x029F)];

struct Tables {
    /// 15-bit value -> character.
    enc_main: Vec<char>,
    /// 7-bit value -> character.
    enc_tail: Vec<char>,
    /// character -> (bit width, value).
    dec: FxHashMap<char, (u32, u16)>,
}

fn expand(ranges: &[(u32, u32)]) -> Vec<char> {
    let mut chars = Vec::new();
    for &(first, last) in ranges {
        for cp in first..=last {
            chars.push(char::from_u32(cp).expect("repertoire avoids surrogates"));
        }
    }
    chars
}

static TABLES: LazyLock<Tables> = LazyLock::new(|| {
    let enc_main = expand(MAIN_RANGES);
    let enc_tail = expand(TAIL_RANGES);
    debug_assert_eq!(enc_main.len(), 1 << BITS_PER_CHAR);
    debug_assert_eq!(enc_tail.len(), 1 << (BITS_PER_CHAR - BITS_PER_BYTE));

    let mut dec = FxHashMap::default();
    for (z, &chr) in enc_main.iter().enumerate() {
        dec.insert(chr, (BITS_PER_CHAR, z as u16));
    }
    for (z, &chr) in enc_tail.iter().enumerate() {
        dec.insert(chr, (BITS_PER_CHAR - BITS_PER_BYTE, z as u16));
    }
    Tables {
        enc_main,
        enc_tail,
        dec,
    }
});

// ============================================================================
// 15-bit repertoire scheme (`bitpack`)
// ============================================================================

/// Pack bytes into the two-repertoire 15-bit encoding.
pub fn pack(bytes: &[u8]) -> String {
    let tables = &*TABLES;
    let mut out = String::with_capacity(bytes.len() * 8 / 15 + 1);
    let mut acc: u32 = 0;
    let mut nbits: u32 = 0;

    for &byte in bytes {
        acc = (acc << BITS_PER_BYTE) | u32::from(byte);
        nbits += BITS_PER_BYTE;
        while nbits >= BITS_PER_CHAR {
            let z = (acc >> (nbits - BITS_PER_CHAR)) & 0x7FFF;
            nbits -= BITS_PER_CHAR;
            out.push(tables.enc_main[z as usize]);
        }
    }

    // Final group: pad the unused low bits with ones. A remainder of seven
    // bits or fewer fits the tail repertoire, anything longer the main one.
    if nbits > 0 {
        if nbits <= 7 {
            let pad = 7 - nbits;
            let z = ((acc << pad) | ((1 << pad) - 1)) & 0x7F;
            out.push(tables.enc_tail[z as usize]);
        } else {
            let pad = BITS_PER_CHAR - nbits;
            let z = ((acc << pad) | ((1 << pad) - 1)) & 0x7FFF;
            out.push(tables.enc_main[z as usize]);
        }
    }

    out
}

/// Invert [`pack`].
///
/// Rejects characters outside the repertoires, a tail character anywhere
/// but the final position, and a final group whose unused bits are not all
/// ones.
pub fn unpack(text: &str) -> Result<Vec<u8>, CodecError> {
    let tables = &*TABLES;
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::with_capacity(chars.len() * 15 / 8);
    let mut acc: u32 = 0;
    let mut nbits: u32 = 0;

    for (i, &chr) in chars.iter().enumerate() {
        let &(width, z) = tables
            .dec
            .get(&chr)
            .ok_or(CodecError::UnknownChar(chr, i))?;
        if width != BITS_PER_CHAR && i != chars.len() - 1 {
            return Err(CodecError::EarlySecondary(i));
        }

        acc = (acc << width) | u32::from(z);
        nbits += width;
        while nbits >= BITS_PER_BYTE {
            out.push((acc >> (nbits - BITS_PER_BYTE)) as u8);
            nbits -= BITS_PER_BYTE;
            acc &= (1 << nbits) - 1;
        }
    }

    // The leftover bits are the padding sentinel: all ones, or reject.
    // (Zero leftover bits trivially satisfies the check.)
    if acc != (1u32 << nbits) - 1 {
        return Err(CodecError::PaddingMismatch);
    }

    Ok(out)
}

// ============================================================================
// Fixed-width scheme (`wide`)
// ============================================================================

/// First code point of the `wide` range (past ASCII and C1 controls).
const WIDE_BASE: u32 = 0x00A0;

/// Pack bytes into the single-range fixed-width encoding.
///
/// The bit stream is the input bytes, then one marker `1` bit, then zero
/// fill to a multiple of 15.
pub fn widen(bytes: &[u8]) -> String {
    let total_bits = bytes.len() as u64 * 8 + 1;
    let nchars = total_bits.div_ceil(u64::from(BITS_PER_CHAR));
    let mut out = String::with_capacity(nchars as usize);

    let mut acc: u32 = 0;
    let mut nbits: u32 = 0;

    for &byte in bytes {
        wide_push(&mut out, &mut acc, &mut nbits, u32::from(byte), 8);
    }
    wide_push(&mut out, &mut acc, &mut nbits, 1, 1); // end-of-data marker
    if nbits > 0 {
        let pad = BITS_PER_CHAR - nbits;
        wide_push(&mut out, &mut acc, &mut nbits, 0, pad);
    }

    out
}

/// Append `width` bits to the wide-scheme bit accumulator, flushing full
/// 15-bit groups as characters.
fn wide_push(out: &mut String, acc: &mut u32, nbits: &mut u32, value: u32, width: u32) {
    *acc = (*acc << width) | value;
    *nbits += width;
    while *nbits >= BITS_PER_CHAR {
        let z = (*acc >> (*nbits - BITS_PER_CHAR)) & 0x7FFF;
        *nbits -= BITS_PER_CHAR;
        *acc &= (1 << *nbits) - 1;
        out.push(char::from_u32(WIDE_BASE + z).expect("below surrogate range"));
    }
}

/// Invert [`widen`].
pub fn unwiden(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut bits: Vec<bool> = Vec::with_capacity(text.chars().count() * 15);
    for (i, chr) in text.chars().enumerate() {
        let cp = chr as u32;
        if !(WIDE_BASE..WIDE_BASE + (1 << BITS_PER_CHAR)).contains(&cp) {
            return Err(CodecError::UnknownChar(chr, i));
        }
        let z = cp - WIDE_BASE;
        for j in (0..BITS_PER_CHAR).rev() {
            bits.push((z >> j) & 1 == 1);
        }
    }

    // Strip zero fill back to the marker bit, which must exist and must
    // leave a whole number of bytes before it.
    let marker = bits
        .iter()
        .rposition(|&b| b)
        .ok_or(CodecError::PaddingMismatch)?;
    if marker % 8 != 0 {
        return Err(CodecError::PaddingMismatch);
    }

    let mut out = Vec::with_capacity(marker / 8);
    for byte_bits in bits[..marker].chunks_exact(8) {
        let mut byte = 0u8;
        for &bit in byte_bits {
            byte = (byte << 1) | u8::from(bit);
        }
        out.push(byte);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repertoire_sizes() {
        assert_eq!(TABLES.enc_main.len(), 32768);
        assert_eq!(TABLES.enc_tail.len(), 128);
        assert_eq!(TABLES.dec.len(), 32768 + 128);
    }

    #[test]
    fn test_pack_output_is_html_inert() {
        let data: Vec<u8> = (0..=255).collect();
        for chr in pack(&data).chars() {
            assert!(!chr.is_ascii(), "ASCII {chr:?} leaked into packed output");
        }
    }

    #[test]
    fn test_pack_roundtrip_all_lengths() {
        for len in 0..=33 {
            let data: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(37)).collect();
            assert_eq!(unpack(&pack(&data)).unwrap(), data, "len {len}");
        }
    }

    #[test]
    fn test_pack_empty() {
        assert_eq!(pack(b""), "");
        assert_eq!(unpack("").unwrap(), b"");
    }

    #[test]
    fn test_unpack_unknown_char() {
        assert!(matches!(
            unpack("abc"),
            Err(CodecError::UnknownChar('a', 0))
        ));
    }

    #[test]
    fn test_unpack_tail_char_before_end() {
        let tail = TABLES.enc_tail[0];
        let main = TABLES.enc_main[0];
        let text: String = [tail, main].iter().collect();
        assert!(matches!(unpack(&text), Err(CodecError::EarlySecondary(0))));
    }

    #[test]
    fn test_unpack_padding_mismatch() {
        // One byte leaves seven data bits + zero pad bits... actually one
        // byte -> 8 bits -> one tail char (7 bits) won't fit, so it emits
        // one main char with 7 pad bits. Clearing those pads must be
        // rejected.
        let encoded = pack(&[0xFF]);
        assert_eq!(encoded.chars().count(), 1);
        let z_all_ones = TABLES.dec[&encoded.chars().next().unwrap()].1;
        let tampered: String = std::iter::once(TABLES.enc_main[(z_all_ones & !0x7F) as usize])
            .collect();
        assert!(matches!(
            unpack(&tampered),
            Err(CodecError::PaddingMismatch)
        ));
    }

    #[test]
    fn test_widen_roundtrip_all_lengths() {
        for len in 0..=33 {
            let data: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(91)).collect();
            assert_eq!(unwiden(&widen(&data)).unwrap(), data, "len {len}");
        }
    }

    #[test]
    fn test_widen_output_avoids_markup_chars() {
        let data: Vec<u8> = (0..=255).collect();
        for chr in widen(&data).chars() {
            assert!(chr as u32 >= WIDE_BASE);
            assert!(!chr.is_ascii());
        }
    }

    #[test]
    fn test_unwiden_bad_padding() {
        // A single all-zero character has no marker bit at all.
        let text: String = std::iter::once(char::from_u32(WIDE_BASE).unwrap()).collect();
        assert!(matches!(unwiden(&text), Err(CodecError::PaddingMismatch)));
    }
}
