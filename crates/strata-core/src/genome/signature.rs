use std::fmt::{self, Display, Formatter};

use strata_error::{StrataResult, strata_err};

/// A 128 bit value identifying the active code of a genome. It doubles as
/// the look-up key of the fitness cache.
///
/// Syntactically distinct but logically equivalent genomes map to the same
/// signature: the hash is computed over the pre-order pack of the active
/// subtree, so introns and argument-index shuffling do not contribute.
///
/// A string of 128 zero bits means empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub data: [u64; 2],
}

impl Signature {
    pub fn new(a: u64, b: u64) -> Self {
        Signature { data: [a, b] }
    }

    pub fn is_empty(&self) -> bool {
        self.data[0] == 0 && self.data[1] == 0
    }

    /// Parses the `lo hi` textual form produced by [Display].
    pub fn parse(s: &str) -> StrataResult<Self> {
        let mut parts = s.split_whitespace();
        let lo = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed signature '{}'", s))?;
        let hi = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| strata_err!(Parse: "malformed signature '{}'", s))?;

        Ok(Signature::new(lo, hi))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.data[0], self.data[1])
    }
}

const C1: u64 = 0x87c3_7b91_1142_53d5;
const C2: u64 = 0x4cf5_ad43_2745_937f;

#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}

/// MurmurHash3, x64 128 bit variant.
pub fn murmur3(key: &[u8], seed: u32) -> Signature {
    let len = key.len();
    let n_blocks = len / 16;

    let mut h1 = seed as u64;
    let mut h2 = seed as u64;

    for block in key.chunks_exact(16) {
        let mut k1 = u64::from_le_bytes(block[0..8].try_into().unwrap());
        let mut k2 = u64::from_le_bytes(block[8..16].try_into().unwrap());

        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;

        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;

        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x3849_5ab5);
    }

    let tail = &key[n_blocks * 16..];
    let mut k1: u64 = 0;
    let mut k2: u64 = 0;

    for i in (8..tail.len()).rev() {
        k2 ^= (tail[i] as u64) << ((i - 8) * 8);
    }
    if tail.len() > 8 {
        k2 = k2.wrapping_mul(C2);
        k2 = k2.rotate_left(33);
        k2 = k2.wrapping_mul(C1);
        h2 ^= k2;
    }

    for i in (0..tail.len().min(8)).rev() {
        k1 ^= (tail[i] as u64) << (i * 8);
    }
    if !tail.is_empty() {
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(31);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= len as u64;
    h2 ^= len as u64;

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    h1 = fmix64(h1);
    h2 = fmix64(h2);

    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);

    Signature::new(h1, h2)
}
