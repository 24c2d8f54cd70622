/// [Szudzik pairing function][szudzik-pairing], wrapping on overflow.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// [Pairing function][pairing] for two `u64` values.
///
/// [pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Fibonacci hashing: spreads the bits of `x` so that the low bits used by
/// the direct-mapped caches depend on the whole word.
pub fn mix64(x: u64) -> u64 {
    x.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(29)
}

pub trait MyHash {
    /// Structural hash, stable for the lifetime of the value.
    fn hash(&self) -> u64;
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        pairing2(self.0, self.1)
    }
}

impl MyHash for (u64, u64, u64) {
    fn hash(&self) -> u64 {
        pairing3(self.0, self.1, self.2)
    }
}

/// Seeded `djb2` hash of a tree label.
///
/// The eight bytes of `seed` (most significant first) are folded into the
/// initial state before the UTF-16 code units of `label`, so that the same
/// label under two different parents yields two different identities.
pub fn djb2(seed: u64, label: &str) -> u64 {
    let mut hash: u64 = 5381;

    for shift in (0..8).rev() {
        hash = hash.wrapping_mul(33) ^ ((seed >> (shift * 8)) & 0xFF);
    }
    for unit in label.encode_utf16() {
        hash = hash.wrapping_mul(33) ^ unit as u64;
    }

    hash
}
