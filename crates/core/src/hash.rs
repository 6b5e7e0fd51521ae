//! Deterministic 32-bit hashing for stable creative-direction picks.
//!
//! FNV-1a over Unicode scalar values. The same key must pick the same
//! variant across runs and machines, so `std::hash` (randomized) is out.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a hash of a string, folding each char's scalar value.
pub fn stable_hash(value: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for ch in value.chars() {
        hash ^= ch as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Pick an item from a non-empty slice by hashing `key`.
///
/// Returns `None` only for an empty slice.
pub fn pick_by_hash<'a, T>(items: &'a [T], key: &str) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = (stable_hash(key) as usize) % items.len();
    items.get(index)
}
