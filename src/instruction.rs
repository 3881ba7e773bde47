// Raffle Draw Engine - Instructions
use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{DrawError, DrawResult};

/// Operations accepted by the draw engine.
///
/// Hosts that queue operations (auto-save, remote facilitator screens) pack
/// these into bytes and feed them to a single writer.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum DrawInstruction {
    /// Start a new session, minting a seed unless one is given
    StartSession {
        /// Seed to reproduce a published draw
        seed: Option<u32>,
    },

    /// Select the next candidate without recording it
    DrawNext,

    /// Record a participant as the next winner
    RecordWinner {
        /// Lower-cased email of the participant
        participant_key: String,
    },

    /// Draw every remaining winner and hold them for review
    BulkDraw,

    /// Commit the pending bulk candidates
    FinalizeBulk,

    /// Drop the pending bulk candidates
    DiscardBulk,

    /// Remove the most recent winner
    UndoLast,

    /// Clear winners, keeping seed and checksum
    Restart,

    /// Freeze the session
    Lock,

    /// Begin playback of the recorded winners
    EnterReplay,

    /// Next winner in playback
    ReplayNext,

    /// Leave playback
    ExitReplay,
}

impl DrawInstruction {
    /// Unpacks a byte buffer into a DrawInstruction
    pub fn unpack(input: &[u8]) -> DrawResult<Self> {
        Self::try_from_slice(input).map_err(|_| DrawError::InvalidInstructionData)
    }

    /// Packs a DrawInstruction into a byte buffer
    pub fn pack(&self) -> DrawResult<Vec<u8>> {
        self.try_to_vec().map_err(|_| DrawError::InvalidInstructionData)
    }

    /// Whether the instruction can write the stored session.
    ///
    /// Replay steps count: the replay cursor is part of the session. Bulk
    /// candidates live on the engine only, so discarding them does not.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::DiscardBulk)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "Start Session",
            Self::DrawNext => "Draw Next",
            Self::RecordWinner { .. } => "Record Winner",
            Self::BulkDraw => "Bulk Draw",
            Self::FinalizeBulk => "Finalize Bulk",
            Self::DiscardBulk => "Discard Bulk",
            Self::UndoLast => "Undo Last",
            Self::Restart => "Restart",
            Self::Lock => "Lock",
            Self::EnterReplay => "Enter Replay",
            Self::ReplayNext => "Replay Next",
            Self::ExitReplay => "Exit Replay",
        }
    }
}
