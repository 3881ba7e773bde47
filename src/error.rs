// Raffle Draw Engine - Errors
use thiserror::Error;

/// Errors that may be returned by the draw engine.
///
/// Every error refuses the requested transition and leaves the session as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// Not enough participants for the configured winner count
    #[error("Not enough participants: {available} available, {required} required")]
    InsufficientParticipants { available: usize, required: u32 },

    /// Every eligible participant has already won
    #[error("No eligible participants remain in the pool")]
    PoolExhausted,

    /// The session has been locked
    #[error("Draw session is locked")]
    SessionLocked,

    /// The configured number of winners has been drawn
    #[error("All winners have already been drawn")]
    DrawComplete,

    /// Undo requested with no recorded winners
    #[error("There is no winner to undo")]
    NothingToUndo,

    /// The eligible participants hold zero tickets between them
    #[error("Eligible participants hold no tickets")]
    ZeroWeightPool,

    /// Ticket counts add up past what a u64 can hold
    #[error("Ticket total overflows")]
    TicketOverflow,

    /// No session has been started
    #[error("No draw session is active")]
    NoActiveSession,

    /// Replay requested with no recorded winners
    #[error("There are no winners to replay")]
    NothingToReplay,

    /// Replay step requested outside replay mode
    #[error("Replay has not been started")]
    NotReplaying,

    /// Replay cursor has reached the end of the winners list
    #[error("Replay is complete")]
    ReplayComplete,

    /// Participant key does not exist in the pool
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    /// Participant already won and repeats are disallowed
    #[error("Participant has already won: {0}")]
    AlreadyWon(String),

    /// Nothing is waiting to be committed
    #[error("There is no pending draw result")]
    NothingPending,

    /// Raffle configuration rejected
    #[error("Invalid raffle configuration: {0}")]
    InvalidConfig(&'static str),

    /// Seed is not a valid 32-bit integer
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Dataset fingerprint differs from the one recorded for the draw
    #[error("Dataset checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    /// Re-running the selection did not reproduce the logged winner
    #[error("Audit log entry at position {position} could not be reproduced")]
    AuditMismatch { position: u32 },

    /// Stored session bytes could not be decoded
    #[error("Invalid session data")]
    InvalidSessionData,

    /// Instruction bytes could not be decoded
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Export serialization failed
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

pub type DrawResult<T> = Result<T, DrawError>;
