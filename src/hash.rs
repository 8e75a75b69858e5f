//! Content hashing for deterministic [`Placeholder`](crate::lazy::Placeholder)
//! keys (§4.6). A BLAKE3 fingerprint of `(plan, arg_keys)` gives the lazy
//! graph structural equality: two calls that would do the same work collapse
//! to the same key, so the task graph dedups them the way the reference
//! build graph dedups diamond dependencies.

/// A 32-byte BLAKE3 hash, used both as a task key and (per invariant 6 in
/// §8) as the collision-detector for structural equality: `key(plan,
/// arg_keys)` collides if and only if `plan` and `arg_keys` are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash32([u8; 32]);

impl From<blake3::Hash> for Hash32 {
    fn from(value: blake3::Hash) -> Self {
        Hash32(*value.as_bytes())
    }
}

impl Hash32 {
    pub fn hash(buffer: impl AsRef<[u8]>) -> Self {
        blake3::hash(buffer.as_ref()).into()
    }

    /// Combines a plan's identity with its already-hashed argument keys.
    /// The whole serialized plan participates, not just the chosen algorithm
    /// name, so two plans differing in their translation chains still land
    /// on distinct keys.
    pub fn for_plan_call(plan: &crate::plan::Plan, arg_keys: &[Hash32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(plan.algorithm_name.as_bytes());
        hasher.update(plan.chosen_concrete_algorithm.as_bytes());
        for arg in &plan.args {
            hasher.update(arg.source_type.0.as_bytes());
            for step in &arg.steps {
                hasher.update(step.translator.0.as_bytes());
                hasher.update(step.resulting_type.0.as_bytes());
            }
        }
        hasher.update(plan.return_concrete_type.0.as_bytes());
        for key in arg_keys {
            hasher.update(&key.0);
        }
        hasher.finalize().into()
    }

    pub fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut acc = vec![0u8; 64];
        for (i, &byte) in self.0.iter().enumerate() {
            acc[i * 2] = HEX[(byte >> 4) as usize];
            acc[i * 2 + 1] = HEX[(byte & 0xF) as usize];
        }
        String::from_utf8(acc).unwrap()
    }
}

impl std::fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}
