//! GF(2^8) arithmetic.
//!
//! Field elements are bytes; addition is XOR and multiplication goes through
//! log/exp tables generated from the primitive polynomial
//! `x^8 + x^4 + x^3 + x^2 + 1` (0x11d) at compile time.

const POLY: u16 = 0x11d;

struct Tables {
    /// `exp[i] = g^i`, doubled so `exp[log a + log b]` never wraps.
    exp: [u8; 512],
    log: [u8; 256],
}

const fn build_tables() -> Tables {
    let mut exp = [0u8; 512];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 255 {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= POLY;
        }
        i += 1;
    }
    while i < 512 {
        exp[i] = exp[i - 255];
        i += 1;
    }
    Tables { exp, log }
}

static TABLES: Tables = build_tables();

/// Multiply two field elements.
#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let la = TABLES.log[a as usize] as usize;
    let lb = TABLES.log[b as usize] as usize;
    TABLES.exp[la + lb]
}

/// Multiplicative inverse. `inv(0)` is defined as 0; callers never divide by it.
#[inline]
pub fn inv(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    TABLES.exp[255 - TABLES.log[a as usize] as usize]
}

/// Divide `a` by a non-zero `b`.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    debug_assert_ne!(b, 0, "division by zero in GF(2^8)");
    mul(a, inv(b))
}

/// Split-nibble multiplication table for a constant `c`.
///
/// The first 16 bytes hold `c * x` for `x` in `0..16`, the last 16 bytes hold
/// `c * (x << 4)`, so `c * b = lo[b & 0x0f] ^ hi[b >> 4]`.
pub fn mul_table(c: u8) -> [u8; 32] {
    let mut table = [0u8; 32];
    for x in 0..16u8 {
        table[x as usize] = mul(c, x);
        table[16 + x as usize] = mul(c, x << 4);
    }
    table
}

/// `dst[i] ^= c * src[i]` for every byte, with `table = mul_table(c)`.
#[inline]
pub fn mul_add_slice(table: &[u8; 32], src: &[u8], dst: &mut [u8]) {
    debug_assert_eq!(src.len(), dst.len());
    let (lo, hi) = table.split_at(16);
    for (d, &s) in dst.iter_mut().zip(src) {
        *d ^= lo[(s & 0x0f) as usize] ^ hi[(s >> 4) as usize];
    }
}
