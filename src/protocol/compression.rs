//! Decompressor untuk compressed IPC payload
//!
//! LZ-style expansion dengan back-reference table 256 slot yang di-index
//! oleh XOR dua byte output yang bersebelahan. Table di-update (catch-up)
//! setelah setiap literal DAN setiap copy, jadi back-reference berikutnya
//! bisa menunjuk ke byte hasil copy itu sendiri.
//!
//! Layout input:
//! ┌───────────────────────────────┬──────────────────────────────────┐
//! │ uncompressed total size (i32) │ flag byte, lalu 8 token per flag │
//! └───────────────────────────────┴──────────────────────────────────┘

use super::endian::Endianness;
use super::message::HEADER_SIZE;
use crate::error::ReaderError;

/// Batas atas rasio output / input compressed stream
const MAX_EXPANSION: usize = 128;

/// Expand payload (tanpa 8-byte header). Empat byte pertama adalah
/// ukuran message uncompressed termasuk header.
pub fn decompress(compressed: &[u8], endianness: Endianness) -> Result<Vec<u8>, ReaderError> {
    let size_bytes: [u8; 4] = match compressed.get(..4).and_then(|b| b.try_into().ok()) {
        Some(b) => b,
        None => return Err(ReaderError::InvalidCompressedSize(0)),
    };
    let total = match endianness {
        Endianness::Big => i32::from_be_bytes(size_bytes),
        Endianness::Little => i32::from_le_bytes(size_bytes),
    };
    let size = total.saturating_sub(HEADER_SIZE as i32);
    if size <= 0 {
        return Err(ReaderError::InvalidCompressedSize(size));
    }
    let size = size as usize;
    // satu flag byte + 8 copy token (2 byte input, max 257 byte output)
    if size > compressed.len().saturating_sub(4).saturating_mul(MAX_EXPANSION) {
        return Err(ReaderError::Compression("declared size exceeds maximum expansion"));
    }

    let mut out = vec![0u8; size];
    let mut refs = [0usize; 256];

    let input = |d: usize| -> Result<u8, ReaderError> {
        compressed
            .get(d)
            .copied()
            .ok_or(ReaderError::Compression("input exhausted"))
    };

    let mut bit: u32 = 0;
    let mut flags: u8 = 0;
    let mut s = 0usize; // output cursor
    let mut p = 0usize; // catch-up cursor
    let mut d = 4usize; // input cursor
    let mut n = 0usize;

    while s < size {
        if bit == 0 {
            flags = input(d)?;
            d += 1;
            bit = 1;
        }

        let is_copy = u32::from(flags) & bit != 0;
        if is_copy {
            let mut r = refs[input(d)? as usize];
            d += 1;
            if s + 2 > size || r + 2 > s {
                return Err(ReaderError::Compression("back-reference out of range"));
            }
            out[s] = out[r];
            out[s + 1] = out[r + 1];
            s += 2;
            r += 2;

            n = input(d)? as usize;
            d += 1;
            if s + n > size || r + n > size {
                return Err(ReaderError::Compression("copy overruns output"));
            }
            // overlap diperbolehkan: byte per byte, forward
            for m in 0..n {
                out[s + m] = out[r + m];
            }
        } else {
            out[s] = input(d)?;
            s += 1;
            d += 1;
        }

        while p + 1 < s {
            refs[(out[p] ^ out[p + 1]) as usize] = p;
            p += 1;
        }

        if is_copy {
            s += n;
            p = s;
        }

        bit <<= 1;
        if bit == 256 {
            bit = 0;
        }
    }

    Ok(out)
}
