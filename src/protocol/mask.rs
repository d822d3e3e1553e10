//! WebSocket payload masking (RFC 6455 Section 5.3).
//!
//! Masking XORs every payload byte `i` with `key[i % 4]`. A payload that is
//! delivered in pieces must keep track of where in the key it stopped: that
//! position is the mask *phase*, and after `n` bytes starting at phase `p` it
//! is `(p + n) % 4`.

/// Scalar byte-by-byte XOR masking starting at phase 0.
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Mask `data` in place, starting at `phase`, and return the phase after the
/// last byte.
///
/// Processes 4 bytes at a time with a key rotated to the starting phase, so
/// the result is identical to the byte-wise loop for any split of the input.
#[inline]
pub fn apply_mask_from(data: &mut [u8], mask: [u8; 4], phase: u8) -> u8 {
    let phase = phase & 3;
    let rotated = rotate_key(mask, phase);
    let key = u32::from_ne_bytes(rotated);

    let mut chunks = data.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let val = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&(val ^ key).to_ne_bytes());
    }
    for (i, byte) in chunks.into_remainder().iter_mut().enumerate() {
        *byte ^= rotated[i];
    }

    next_phase(phase, data.len())
}

/// Copy `src` into `dst` while unmasking, starting at `phase`; returns the
/// phase after the last byte.
///
/// `dst` and `src` must have equal length.
#[inline]
pub fn unmask_into(dst: &mut [u8], src: &[u8], mask: [u8; 4], phase: u8) -> u8 {
    debug_assert_eq!(dst.len(), src.len());
    dst.copy_from_slice(src);
    apply_mask_from(dst, mask, phase)
}

/// Phase reached after masking `len` bytes starting at `phase`.
#[inline]
#[must_use]
pub const fn next_phase(phase: u8, len: usize) -> u8 {
    ((phase as usize + (len & 3)) & 3) as u8
}

#[inline]
const fn rotate_key(mask: [u8; 4], phase: u8) -> [u8; 4] {
    let p = phase as usize;
    [
        mask[p & 3],
        mask[(p + 1) & 3],
        mask[(p + 2) & 3],
        mask[(p + 3) & 3],
    ]
}

/// Per-connection source of masking keys.
///
/// Seeded once from the OS random source, then advanced with a mixing
/// function so every outgoing frame gets a different key without a syscall.
#[derive(Debug, Clone)]
pub struct MaskGenerator {
    counter: u32,
}

impl MaskGenerator {
    /// Create a generator seeded from the OS random source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counter: random_seed(),
        }
    }

    /// Create a generator with a fixed seed. Useful for reproducible tests.
    #[must_use]
    pub const fn with_seed(seed: u32) -> Self {
        Self { counter: seed }
    }

    /// Produce the next masking key.
    pub fn next_key(&mut self) -> [u8; 4] {
        self.counter = self.counter.wrapping_add(0x9E37_79B9);
        let a = self.counter;
        let b = a.wrapping_mul(0x85EB_CA6B);
        let c = b ^ (b >> 13);
        let d = c.wrapping_mul(0xC2B2_AE35);
        d.to_le_bytes()
    }
}

impl Default for MaskGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Falls back to system time if getrandom fails.
fn random_seed() -> u32 {
    let mut buf = [0u8; 4];
    if getrandom::getrandom(&mut buf).is_ok() {
        u32::from_le_bytes(buf)
    } else {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u32)
            .unwrap_or(0x1234_5678)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];

    #[test]
    fn test_apply_mask_rfc_example() {
        let mut data = b"Hello".to_vec();
        apply_mask(&mut data, MASK);
        assert_eq!(data, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
        apply_mask(&mut data, MASK);
        assert_eq!(data, b"Hello");
    }

    #[test]
    fn test_apply_mask_from_matches_scalar() {
        for len in 0..40 {
            let original: Vec<u8> = (0..len as u8).collect();
            let mut expected = original.clone();
            apply_mask(&mut expected, MASK);

            let mut fast = original.clone();
            let phase = apply_mask_from(&mut fast, MASK, 0);
            assert_eq!(fast, expected, "len {len}");
            assert_eq!(phase as usize, len % 4);
        }
    }

    #[test]
    fn test_apply_mask_from_split_at_every_offset() {
        let original: Vec<u8> = (0..=255u8).cycle().take(103).collect();
        let mut expected = original.clone();
        apply_mask(&mut expected, MASK);

        for split in 0..original.len() {
            let mut data = original.clone();
            let (head, tail) = data.split_at_mut(split);
            let phase = apply_mask_from(head, MASK, 0);
            let phase = apply_mask_from(tail, MASK, phase);
            assert_eq!(data, expected, "split at {split}");
            assert_eq!(phase as usize, original.len() % 4);
        }
    }

    #[test]
    fn test_unmask_into() {
        let masked = [0x7f, 0x9f, 0x4d, 0x51, 0x58];
        let mut out = [0u8; 5];
        let phase = unmask_into(&mut out[..2], &masked[..2], MASK, 0);
        assert_eq!(phase, 2);
        let phase = unmask_into(&mut out[2..], &masked[2..], MASK, phase);
        assert_eq!(phase, 1);
        assert_eq!(&out, b"Hello");
    }

    #[test]
    fn test_next_phase() {
        assert_eq!(next_phase(0, 0), 0);
        assert_eq!(next_phase(3, 1), 0);
        assert_eq!(next_phase(2, 7), 1);
        assert_eq!(next_phase(1, usize::MAX), 0);
    }

    #[test]
    fn test_mask_generator_varies() {
        let mut generator = MaskGenerator::with_seed(42);
        let a = generator.next_key();
        let b = generator.next_key();
        assert_ne!(a, b);

        let mut replay = MaskGenerator::with_seed(42);
        assert_eq!(replay.next_key(), a);
    }
}
