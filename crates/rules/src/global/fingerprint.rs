//! Content fingerprint of a fetched row set.

use sha2::{Digest, Sha256};

use crate::store::GlobalRuleRow;

/// SHA-256 over the ordered row set.
pub type Fingerprint = [u8; 32];

/// Hash every row's id, enabled flag and descriptor bytes, in order.
///
/// Two row sets with the same fingerprint are treated as identical, so a
/// reordered or edited table always produces a new generation.
pub fn fingerprint(rows: &[GlobalRuleRow]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update((rows.len() as u64).to_le_bytes());
    for row in rows {
        hasher.update(row.id.to_le_bytes());
        hasher.update([row.enabled as u8]);
        hasher.update((row.descriptor.len() as u64).to_le_bytes());
        hasher.update(&row.descriptor);
    }
    hasher.finalize().into()
}
