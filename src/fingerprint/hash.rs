use sha2::{Digest, Sha256};

const HASH_HEX_LEN: usize = 16;

/// Reproducible 64-bit hash of the `|`-joined parts, as 16 lowercase hex chars.
pub fn stable_hash<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (index, part) in parts.into_iter().enumerate() {
        if index > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_ref().as_bytes());
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_HEX_LEN);
    digest
}

pub fn combine(lhs: &str, rhs: &str) -> String {
    stable_hash([lhs, rhs])
}
