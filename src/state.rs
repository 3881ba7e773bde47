// Raffle Draw Engine - State
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;
use crate::error::{DrawError, DrawResult};

/// Milliseconds since the Unix epoch
pub type UnixTimestamp = i64;

/// Optional descriptive fields carried through from ingestion
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantMetadata {
    pub team: Option<String>,
    pub region: Option<String>,
    pub manager: Option<String>,
    pub employee_id: Option<String>,
}

/// An entrant in the pool
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Opaque identity assigned by ingestion
    pub id: String,
    /// Display name
    pub name: String,
    /// Email, the natural dedup/exclusion key
    pub email: String,
    /// Ticket count, at least 1
    pub entries: u64,
    #[serde(default)]
    pub metadata: ParticipantMetadata,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>, entries: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            entries,
            metadata: ParticipantMetadata::default(),
        }
    }

    /// Exclusion key: the lower-cased email
    pub fn key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// How winners are presented
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RevealMode {
    /// One winner revealed and confirmed at a time
    Sequential,
    /// Whole list computed at once, then finalized
    Bulk,
}

/// Raffle settings
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RaffleConfig {
    pub number_of_winners: u32,
    pub allow_repeats: bool,
    /// Every Nth position is a bonus round, 0 disables
    pub bonus_round_interval: u32,
    pub reveal_mode: RevealMode,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            number_of_winners: 1,
            allow_repeats: false,
            bonus_round_interval: 0,
            reveal_mode: RevealMode::Sequential,
        }
    }
}

impl RaffleConfig {
    pub fn with_winners(mut self, number_of_winners: u32) -> Self {
        self.number_of_winners = number_of_winners;
        self
    }

    pub fn with_repeats(mut self, allow_repeats: bool) -> Self {
        self.allow_repeats = allow_repeats;
        self
    }

    pub fn with_bonus_interval(mut self, interval: u32) -> Self {
        self.bonus_round_interval = interval;
        self
    }

    pub fn with_reveal_mode(mut self, mode: RevealMode) -> Self {
        self.reveal_mode = mode;
        self
    }

    pub fn validate(&self) -> DrawResult<()> {
        if self.number_of_winners == 0 {
            return Err(DrawError::InvalidConfig("number of winners must be at least 1"));
        }
        Ok(())
    }

    /// Whether the 1-based `position` falls on a bonus round
    pub fn is_bonus(&self, position: u32) -> bool {
        self.bonus_round_interval > 0 && position % self.bonus_round_interval == 0
    }
}

/// A recorded winner
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub participant: Participant,
    /// 1-based draw position
    pub position: u32,
    pub timestamp: UnixTimestamp,
    pub is_bonus: bool,
    /// RNG stream index that selected this winner, None if recorded by hand
    pub draw_index: Option<u32>,
}

/// Lifecycle of the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawStatus {
    /// No session yet
    Setup,
    /// Session created, zero or more winners recorded
    Active,
    /// Winners frozen
    Locked,
}

/// The mutable aggregate of one draw
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DrawSession {
    pub draw_id: String,
    /// String-encoded 32-bit seed
    pub seed: String,
    pub checksum: String,
    pub winners: Vec<Winner>,
    pub draw_count: u32,
    pub locked: bool,
    pub locked_at: Option<UnixTimestamp>,
    /// Set while replaying
    pub replay_cursor: Option<u32>,
    /// RNG values consumed from the seed so far
    pub draws_consumed: u32,
    pub audit: AuditLog,
}

impl DrawSession {
    pub fn status(&self) -> DrawStatus {
        if self.locked {
            DrawStatus::Locked
        } else {
            DrawStatus::Active
        }
    }

    /// Keys of everyone who has won so far
    pub fn winner_keys(&self) -> Vec<String> {
        self.winners.iter().map(|w| w.participant.key()).collect()
    }

    pub fn has_won(&self, key: &str) -> bool {
        self.winners.iter().any(|w| w.participant.key() == key)
    }

    /// Serialize for storage
    pub fn pack(&self) -> DrawResult<Vec<u8>> {
        self.try_to_vec().map_err(|_| DrawError::InvalidSessionData)
    }

    /// Restore from stored bytes
    pub fn unpack(src: &[u8]) -> DrawResult<Self> {
        Self::try_from_slice(src).map_err(|_| DrawError::InvalidSessionData)
    }
}

/// Sum of tickets across `pool`
pub fn total_tickets(pool: &[Participant]) -> DrawResult<u64> {
    pool.iter()
        .try_fold(0u64, |total, p| total.checked_add(p.entries))
        .ok_or(DrawError::TicketOverflow)
}
