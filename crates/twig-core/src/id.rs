//! ID generation for todo records
//!
//! Format: prefix-xxxxxx (6 lowercase Crockford base32 chars)

use sha2::{Digest, Sha256};
use uuid::Uuid;

const ID_HASH_LEN: usize = 6;

/// Generate a todo ID
///
/// Hashes a v4 UUID together with the current timestamp. The result is
/// not guaranteed unique on its own; the store retries on collision.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4();
    let timestamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(uuid.as_bytes());
    hasher.update(timestamp.to_le_bytes());

    let hash = hasher.finalize();

    // 5 bytes encode to exactly 8 base32 chars
    let encoded = base32::encode(base32::Alphabet::Crockford, &hash[..5])
        .to_lowercase()
        .chars()
        .take(ID_HASH_LEN)
        .collect::<String>();

    format!("{}-{}", prefix, encoded)
}
