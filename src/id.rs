//! Opaque task identifiers.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const PREFIX: &str = "tm-";

/// Hex digits kept from the digest.
const HEX_LEN: usize = 10;

/// Derive a fresh task id from where the task sits and when it was made.
///
/// The parent id, title and creation instant are hashed together with a
/// random salt, so two identical subtasks of one parent still differ.
pub fn generate_id(title: &str, parent_id: Option<&str>, created_at: DateTime<Utc>) -> String {
    let salt: u64 = rand::random();
    let digest = Sha256::new()
        .chain_update(parent_id.unwrap_or_default())
        .chain_update([0u8])
        .chain_update(title)
        .chain_update(created_at.timestamp_micros().to_be_bytes())
        .chain_update(salt.to_be_bytes())
        .finalize();

    let hex: String = digest[..HEX_LEN / 2].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", PREFIX, hex)
}
