// Raffle Draw Engine - Dataset checksum
use arrayref::array_ref;
use sha2::{Digest, Sha256};

use crate::constants::CHECKSUM_PREFIX_LEN;
use crate::state::Participant;

/// Order-independent fingerprint of a participant dataset.
///
/// Each participant becomes `name|email|entries`; the lines are sorted before hashing
/// so a re-import in a different row order fingerprints identically.
pub fn compute_checksum(participants: &[Participant]) -> String {
    let mut lines: Vec<String> = participants
        .iter()
        .map(|p| format!("{}|{}|{}", p.name, p.email, p.entries))
        .collect();
    lines.sort();

    let digest = Sha256::digest(lines.join("\n").as_bytes());
    let prefix = array_ref![digest.as_slice(), 0, CHECKSUM_PREFIX_LEN / 2];
    hex::encode(prefix)
}

/// Whether `participants` still matches a recorded checksum.
pub fn matches(participants: &[Participant], checksum: &str) -> bool {
    compute_checksum(participants).eq_ignore_ascii_case(checksum)
}
