use chrono::Utc;
use sha2::{Digest as _, Sha256};

/// Lowercase hex SHA-256 digest of the given bytes.
pub(crate) fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Current time in milliseconds since the epoch.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
