// Raffle Draw Engine - Instruction Processor
use log::{info, warn};

use crate::engine::DrawEngine;
use crate::error::{DrawError, DrawResult};
use crate::instruction::DrawInstruction;
use crate::state::{DrawSession, Participant, Winner};

/// What a processed instruction produced, for the presentation layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    SessionStarted {
        draw_id: String,
        seed: String,
        /// The session this one replaced
        previous: Option<Box<DrawSession>>,
    },
    Candidate(Participant),
    WinnerRecorded(Winner),
    BulkCandidates(Vec<Winner>),
    BulkFinalized(usize),
    BulkDiscarded,
    Undone(Winner),
    Restarted,
    Locked,
    ReplayStarted,
    Replayed(Winner),
    ReplayExited,
}

/// Instruction dispatcher.
pub struct Processor;

impl Processor {
    /// Process packed instruction bytes
    pub fn process_packed(engine: &mut DrawEngine, instruction_data: &[u8]) -> DrawResult<DrawOutcome> {
        let instruction = DrawInstruction::unpack(instruction_data)?;
        Self::process(engine, instruction)
    }

    pub fn process(engine: &mut DrawEngine, instruction: DrawInstruction) -> DrawResult<DrawOutcome> {
        info!("Instruction: {}", instruction.name());

        let result = Self::dispatch(engine, instruction);
        if let Err(e) = &result {
            warn!("Instruction refused: {}", e);
        }
        result
    }

    /// Process an instruction and, if it can change the session, return the
    /// packed session for the host to store.
    pub fn process_and_snapshot(
        engine: &mut DrawEngine,
        instruction: DrawInstruction,
    ) -> DrawResult<(DrawOutcome, Option<Vec<u8>>)> {
        let mutating = instruction.is_mutating();
        let outcome = Self::process(engine, instruction)?;

        let snapshot = match (mutating, engine.session()) {
            (true, Some(session)) => Some(session.pack()?),
            _ => None,
        };
        Ok((outcome, snapshot))
    }

    fn dispatch(engine: &mut DrawEngine, instruction: DrawInstruction) -> DrawResult<DrawOutcome> {
        match instruction {
            DrawInstruction::StartSession { seed } => {
                let previous = match seed {
                    Some(seed) => engine.start_session_with_seed(seed)?,
                    None => engine.start_session()?,
                };
                let session = engine.session().ok_or(DrawError::NoActiveSession)?;
                Ok(DrawOutcome::SessionStarted {
                    draw_id: session.draw_id.clone(),
                    seed: session.seed.clone(),
                    previous: previous.map(Box::new),
                })
            }
            DrawInstruction::DrawNext => engine.draw_next().cloned().map(DrawOutcome::Candidate),
            DrawInstruction::RecordWinner { participant_key } => engine
                .record_winner(&participant_key)
                .cloned()
                .map(DrawOutcome::WinnerRecorded),
            DrawInstruction::BulkDraw => engine
                .bulk_draw()
                .map(|candidates| DrawOutcome::BulkCandidates(candidates.to_vec())),
            DrawInstruction::FinalizeBulk => engine.finalize_bulk().map(DrawOutcome::BulkFinalized),
            DrawInstruction::DiscardBulk => engine.discard_bulk().map(|_| DrawOutcome::BulkDiscarded),
            DrawInstruction::UndoLast => engine.undo_last().map(DrawOutcome::Undone),
            DrawInstruction::Restart => engine.restart().map(|_| DrawOutcome::Restarted),
            DrawInstruction::Lock => engine.lock().map(|_| DrawOutcome::Locked),
            DrawInstruction::EnterReplay => engine.enter_replay().map(|_| DrawOutcome::ReplayStarted),
            DrawInstruction::ReplayNext => engine.replay_next().cloned().map(DrawOutcome::Replayed),
            DrawInstruction::ExitReplay => engine.exit_replay().map(|_| DrawOutcome::ReplayExited),
        }
    }
}
