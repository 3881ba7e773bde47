// Raffle Draw Engine - Audit log
//
// The log is built as the draw happens and exported verbatim. Given the same
// participant dataset, anyone can re-run the selection from the logged seed and
// config and check that it reproduces the logged winner sequence.
use borsh::{BorshDeserialize, BorshSerialize};
use log::info;
use serde::{Deserialize, Serialize};

use crate::checksum;
use crate::error::{DrawError, DrawResult};
use crate::prize::Prize;
use crate::rng::{parse_seed, SeededRandom};
use crate::selector::{exclusion_set, select};
use crate::state::{total_tickets, Participant, RaffleConfig, UnixTimestamp, Winner};
use crate::utils::{rfc3339_millis, rfc3339_millis_opt};

/// One recorded winner, in draw order
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub position: u32,
    pub name: String,
    pub email: String,
    pub entries: u64,
    #[serde(with = "rfc3339_millis")]
    pub timestamp: UnixTimestamp,
    pub is_bonus: bool,
    pub prize: Option<String>,
    pub draw_index: Option<u32>,
}

/// A winner that was drawn and then taken back
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UndoRecord {
    pub position: u32,
    pub email: String,
    #[serde(with = "rfc3339_millis")]
    pub timestamp: UnixTimestamp,
}

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub draw_id: String,
    #[serde(with = "rfc3339_millis")]
    pub timestamp: UnixTimestamp,
    pub checksum: String,
    pub seed: String,
    pub config: RaffleConfig,
    pub total_participants: u64,
    pub total_tickets: u64,
    pub entries: Vec<AuditEntry>,
    #[serde(default)]
    pub undone: Vec<UndoRecord>,
    #[serde(default, with = "rfc3339_millis_opt")]
    pub locked_at: Option<UnixTimestamp>,
}

impl AuditLog {
    /// Snapshot taken when a session starts
    pub fn open(
        draw_id: &str,
        timestamp: UnixTimestamp,
        checksum: &str,
        seed: &str,
        config: &RaffleConfig,
        pool: &[Participant],
    ) -> DrawResult<Self> {
        Ok(Self {
            draw_id: draw_id.to_string(),
            timestamp,
            checksum: checksum.to_string(),
            seed: seed.to_string(),
            config: config.clone(),
            total_participants: pool.len() as u64,
            total_tickets: total_tickets(pool)?,
            entries: Vec::new(),
            undone: Vec::new(),
            locked_at: None,
        })
    }

    pub fn record(&mut self, winner: &Winner, prize: Option<&Prize>) {
        self.entries.push(AuditEntry {
            position: winner.position,
            name: winner.participant.name.clone(),
            email: winner.participant.email.clone(),
            entries: winner.participant.entries,
            timestamp: winner.timestamp,
            is_bonus: winner.is_bonus,
            prize: prize.map(|p| p.name.clone()),
            draw_index: winner.draw_index,
        });
    }

    /// Remove the last entry, noting the undo
    pub fn pop(&mut self, timestamp: UnixTimestamp) -> Option<AuditEntry> {
        let entry = self.entries.pop()?;
        self.undone.push(UndoRecord {
            position: entry.position,
            email: entry.email.clone(),
            timestamp,
        });
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.undone.clear();
    }

    pub fn seal(&mut self, timestamp: UnixTimestamp) {
        self.locked_at = Some(timestamp);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> DrawResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DrawError::ExportFailed(e.to_string()))
    }

    pub fn from_json(src: &str) -> DrawResult<Self> {
        serde_json::from_str(src).map_err(|e| DrawError::ExportFailed(e.to_string()))
    }
}

/// Check that `log` was produced from `pool` by the weighted selector.
///
/// Every entry must carry the RNG stream index it was drawn at; the generator is
/// positioned there and the selection re-run with the preceding entries excluded.
pub fn verify(pool: &[Participant], log: &AuditLog) -> DrawResult<()> {
    if !checksum::matches(pool, &log.checksum) {
        return Err(DrawError::ChecksumMismatch {
            expected: log.checksum.clone(),
            found: checksum::compute_checksum(pool),
        });
    }

    let seed = parse_seed(&log.seed).ok_or_else(|| DrawError::InvalidSeed(log.seed.clone()))?;
    let mut drawn: Vec<String> = Vec::with_capacity(log.entries.len());

    for entry in &log.entries {
        let mismatch = DrawError::AuditMismatch { position: entry.position };
        let index = entry.draw_index.ok_or_else(|| mismatch.clone())?;

        let mut rng = SeededRandom::resume(seed, index);
        let excluded = exclusion_set(log.config.allow_repeats, drawn.iter().cloned());
        let picked = select(pool, &excluded, &mut rng).map_err(|_| mismatch.clone())?;

        let key = entry.email.trim().to_lowercase();
        if picked.key() != key {
            return Err(mismatch);
        }
        drawn.push(key);
    }

    info!("Audit log {} verified: {} entries", log.draw_id, log.entries.len());
    Ok(())
}
