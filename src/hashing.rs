use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Deterministic string hash used to derive per-stream seed offsets. `FxHasher` has no random
/// state, so the same name always yields the same offset across runs and platforms of equal
/// pointer width.
pub fn hash_str(value: &str) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_distinct() {
        assert_eq!(hash_str("TransmissionRng"), hash_str("TransmissionRng"));
        assert_ne!(hash_str("TransmissionRng"), hash_str("DiagnosisRng"));
    }
}
