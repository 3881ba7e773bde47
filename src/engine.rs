// Raffle Draw Engine - Draw state machine
use log::{debug, info};

use crate::audit::AuditLog;
use crate::checksum::{self, compute_checksum};
use crate::error::{DrawError, DrawResult};
use crate::prize::{prize_for, PrizeConfig};
use crate::rng::{fresh_seed, parse_seed, SeededRandom};
use crate::selector::{exclusion_set, select_index};
use crate::state::{DrawSession, DrawStatus, Participant, RaffleConfig, Winner};
use crate::utils::{new_draw_id, now};

/// A candidate selected by `draw_next`, waiting to be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingDraw {
    /// Index into the pool
    index: usize,
    /// RNG stream index the candidate was drawn at
    draw_index: u32,
}

/// Owns one participant pool and at most one active draw session.
///
/// Callers hold `&mut DrawEngine` for every mutating call, which serializes
/// operations against the session.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    pool: Vec<Participant>,
    config: RaffleConfig,
    prizes: Option<PrizeConfig>,
    session: Option<DrawSession>,
    rng: SeededRandom,
    pending: Option<PendingDraw>,
    pending_bulk: Vec<Winner>,
}

impl DrawEngine {
    pub fn new(pool: Vec<Participant>, config: RaffleConfig, prizes: Option<PrizeConfig>) -> Self {
        Self {
            pool,
            config,
            prizes,
            session: None,
            rng: SeededRandom::new(0),
            pending: None,
            pending_bulk: Vec::new(),
        }
    }

    /// Rebuild an engine around a stored session.
    ///
    /// The pool must fingerprint to the session's checksum and the config must
    /// match the one the session was started with. The RNG continues from where
    /// the stored session left off.
    pub fn resume(
        pool: Vec<Participant>,
        config: RaffleConfig,
        prizes: Option<PrizeConfig>,
        session: DrawSession,
    ) -> DrawResult<Self> {
        config.validate()?;
        if config != session.audit.config {
            return Err(DrawError::InvalidConfig("configuration differs from the recorded draw"));
        }

        if !checksum::matches(&pool, &session.checksum) {
            return Err(DrawError::ChecksumMismatch {
                expected: session.checksum.clone(),
                found: compute_checksum(&pool),
            });
        }

        let seed = parse_seed(&session.seed).ok_or_else(|| DrawError::InvalidSeed(session.seed.clone()))?;
        let rng = SeededRandom::resume(seed, session.draws_consumed);

        info!(
            "Session resumed: id={}, winners={}, locked={}",
            session.draw_id,
            session.winners.len(),
            session.locked
        );

        Ok(Self {
            pool,
            config,
            prizes,
            session: Some(session),
            rng,
            pending: None,
            pending_bulk: Vec::new(),
        })
    }

    pub fn status(&self) -> DrawStatus {
        self.session.as_ref().map_or(DrawStatus::Setup, DrawSession::status)
    }

    pub fn pool(&self) -> &[Participant] {
        &self.pool
    }

    pub fn config(&self) -> &RaffleConfig {
        &self.config
    }

    pub fn prizes(&self) -> Option<&PrizeConfig> {
        self.prizes.as_ref()
    }

    pub fn session(&self) -> Option<&DrawSession> {
        self.session.as_ref()
    }

    pub fn into_session(self) -> Option<DrawSession> {
        self.session
    }

    pub fn winners(&self) -> &[Winner] {
        self.session.as_ref().map(|s| s.winners.as_slice()).unwrap_or(&[])
    }

    pub fn draw_count(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.draw_count)
    }

    pub fn is_locked(&self) -> bool {
        self.session.as_ref().map_or(false, |s| s.locked)
    }

    pub fn replay_cursor(&self) -> Option<u32> {
        self.session.as_ref().and_then(|s| s.replay_cursor)
    }

    /// Candidate from the last `draw_next`, not yet recorded
    pub fn pending_candidate(&self) -> Option<&Participant> {
        self.pending.map(|p| &self.pool[p.index])
    }

    /// Candidates from the last `bulk_draw`, not yet finalized
    pub fn pending_bulk(&self) -> &[Winner] {
        &self.pending_bulk
    }

    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.session.as_ref().map(|s| &s.audit)
    }

    /// Replace the raffle settings. Only allowed before the first winner is recorded.
    pub fn set_config(&mut self, config: RaffleConfig) -> DrawResult<()> {
        config.validate()?;
        if let Some(session) = self.session.as_mut() {
            ensure_unlocked(session)?;
            if !session.winners.is_empty() {
                return Err(DrawError::InvalidConfig("configuration is fixed once drawing has started"));
            }
            if !config.allow_repeats && (self.pool.len() as u64) < u64::from(config.number_of_winners) {
                return Err(DrawError::InsufficientParticipants {
                    available: self.pool.len(),
                    required: config.number_of_winners,
                });
            }
            session.audit.config = config.clone();
        }
        self.config = config;
        self.clear_pending();
        Ok(())
    }

    pub fn set_prizes(&mut self, prizes: Option<PrizeConfig>) {
        self.prizes = prizes;
    }

    /// Start a new session with a freshly minted seed, returning the previous session.
    pub fn start_session(&mut self) -> DrawResult<Option<DrawSession>> {
        self.start_session_with_seed(fresh_seed())
    }

    /// Start a new session from a known seed, returning the previous session.
    pub fn start_session_with_seed(&mut self, seed: u32) -> DrawResult<Option<DrawSession>> {
        self.config.validate()?;

        let required = self.config.number_of_winners;
        if self.pool.is_empty() || (!self.config.allow_repeats && (self.pool.len() as u64) < u64::from(required)) {
            return Err(DrawError::InsufficientParticipants {
                available: self.pool.len(),
                required,
            });
        }

        let draw_id = new_draw_id();
        let timestamp = now();
        let seed_text = seed.to_string();
        let checksum = compute_checksum(&self.pool);
        let audit = AuditLog::open(&draw_id, timestamp, &checksum, &seed_text, &self.config, &self.pool)?;

        let session = DrawSession {
            draw_id,
            seed: seed_text,
            checksum,
            winners: Vec::new(),
            draw_count: 0,
            locked: false,
            locked_at: None,
            replay_cursor: None,
            draws_consumed: 0,
            audit,
        };

        info!(
            "Session started: id={}, seed={}, checksum={}, participants={}",
            session.draw_id,
            session.seed,
            session.checksum,
            self.pool.len()
        );

        self.rng = SeededRandom::new(seed);
        self.clear_pending();
        Ok(self.session.replace(session))
    }

    /// Select the next winner without recording it.
    ///
    /// The candidate stays pending until `record_winner` confirms it. Calling
    /// again before recording draws a fresh candidate.
    pub fn draw_next(&mut self) -> DrawResult<&Participant> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;
        ensure_remaining(session, &self.config)?;

        let excluded = exclusion_set(self.config.allow_repeats, session.winner_keys());
        let draw_index = self.rng.consumed();
        let index = select_index(&self.pool, &excluded, &mut self.rng)?;

        session.draws_consumed = self.rng.consumed();
        session.replay_cursor = None;
        self.pending_bulk.clear();
        self.pending = Some(PendingDraw { index, draw_index });

        let candidate = &self.pool[index];
        debug!("Candidate drawn: email={}, draw_index={}", candidate.email, draw_index);
        Ok(candidate)
    }

    /// Record the participant with `key` as the next winner.
    ///
    /// When `key` matches the pending candidate, its draw index is kept so the
    /// audit log can be verified later.
    pub fn record_winner(&mut self, key: &str) -> DrawResult<&Winner> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;
        ensure_remaining(session, &self.config)?;

        let key = key.trim().to_lowercase();
        // Rows may share a key; prefer the row that was actually drawn.
        let pending = self.pending.filter(|p| self.pool[p.index].key() == key);
        let index = match pending {
            Some(p) => p.index,
            None => self
                .pool
                .iter()
                .position(|p| p.key() == key)
                .ok_or_else(|| DrawError::UnknownParticipant(key.clone()))?,
        };

        if !self.config.allow_repeats && session.has_won(&key) {
            return Err(DrawError::AlreadyWon(key));
        }

        let draw_index = pending.map(|p| p.draw_index);
        self.pending = None;

        let position = session.winners.len() as u32 + 1;
        let winner = Winner {
            participant: self.pool[index].clone(),
            position,
            timestamp: now(),
            is_bonus: self.config.is_bonus(position),
            draw_index,
        };

        session.replay_cursor = None;
        self.pending_bulk.clear();
        commit_winner(session, self.prizes.as_ref(), winner);

        let winner = &session.winners[session.winners.len() - 1];
        info!(
            "Winner recorded: position={}, email={}, bonus={}",
            winner.position, winner.participant.email, winner.is_bonus
        );
        Ok(winner)
    }

    /// Draw every remaining winner in one pass and hold them for review.
    ///
    /// Stops early once the pool is exhausted. Fails only if not a single
    /// candidate could be drawn.
    pub fn bulk_draw(&mut self) -> DrawResult<&[Winner]> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;
        ensure_remaining(session, &self.config)?;

        let recorded = session.winners.len() as u32;
        let mut remaining = self.config.number_of_winners - recorded;
        if !self.config.allow_repeats {
            let eligible = (self.pool.len() as u64).saturating_sub(u64::from(recorded));
            remaining = remaining.min(eligible.min(u64::from(u32::MAX)) as u32);
        }

        // Draw on a copy so a failed pass leaves the stream untouched.
        let mut rng = self.rng.clone();
        let mut drawn = session.winner_keys();
        let mut candidates: Vec<Winner> = Vec::with_capacity(remaining as usize);
        let timestamp = now();

        for _ in 0..remaining {
            let excluded = exclusion_set(self.config.allow_repeats, drawn.iter().cloned());
            let draw_index = rng.consumed();
            let index = match select_index(&self.pool, &excluded, &mut rng) {
                Ok(index) => index,
                Err(e) if candidates.is_empty() => return Err(e),
                Err(_) => break,
            };

            let participant = self.pool[index].clone();
            let position = recorded + candidates.len() as u32 + 1;
            drawn.push(participant.key());
            candidates.push(Winner {
                participant,
                position,
                timestamp,
                is_bonus: self.config.is_bonus(position),
                draw_index: Some(draw_index),
            });
        }

        self.rng = rng;
        session.draws_consumed = self.rng.consumed();
        session.replay_cursor = None;
        self.pending = None;
        self.pending_bulk = candidates;

        info!("Bulk draw: {} candidates pending", self.pending_bulk.len());
        Ok(&self.pending_bulk)
    }

    /// Commit the pending bulk candidates to the session.
    pub fn finalize_bulk(&mut self) -> DrawResult<usize> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;
        if self.pending_bulk.is_empty() {
            return Err(DrawError::NothingPending);
        }

        let timestamp = now();
        let candidates = std::mem::take(&mut self.pending_bulk);
        let count = candidates.len();
        for mut winner in candidates {
            winner.timestamp = timestamp;
            commit_winner(session, self.prizes.as_ref(), winner);
        }
        session.replay_cursor = None;

        info!("Bulk draw finalized: {} winners recorded", count);
        Ok(count)
    }

    /// Drop the pending bulk candidates.
    pub fn discard_bulk(&mut self) -> DrawResult<()> {
        if self.session.is_none() {
            return Err(DrawError::NoActiveSession);
        }
        if self.pending_bulk.is_empty() {
            return Err(DrawError::NothingPending);
        }
        self.pending_bulk.clear();
        info!("Bulk draw discarded");
        Ok(())
    }

    /// Remove the most recent winner. The RNG stream is not rewound.
    pub fn undo_last(&mut self) -> DrawResult<Winner> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;

        let winner = session.winners.pop().ok_or(DrawError::NothingToUndo)?;
        session.audit.pop(now());
        session.draw_count = session.draw_count.saturating_sub(1);
        session.replay_cursor = None;
        self.pending = None;
        self.pending_bulk.clear();

        info!("Undo: position={}, email={}", winner.position, winner.participant.email);
        Ok(winner)
    }

    /// Clear all winners while keeping the seed, checksum, pool and config.
    ///
    /// The RNG is rewound to the start of the seed's stream.
    pub fn restart(&mut self) -> DrawResult<()> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;

        session.winners.clear();
        session.audit.clear();
        session.draw_count = 0;
        session.draws_consumed = 0;
        session.replay_cursor = None;
        self.rng.reset();
        self.pending = None;
        self.pending_bulk.clear();

        info!("Session restarted: id={}", session.draw_id);
        Ok(())
    }

    /// Freeze the winners list. Irreversible.
    pub fn lock(&mut self) -> DrawResult<()> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        ensure_unlocked(session)?;

        let timestamp = now();
        session.locked = true;
        session.locked_at = Some(timestamp);
        session.audit.seal(timestamp);
        session.replay_cursor = None;
        self.pending = None;
        self.pending_bulk.clear();

        info!("Session locked: id={}, winners={}", session.draw_id, session.winners.len());
        Ok(())
    }

    /// Start playing back the recorded winners from the first.
    pub fn enter_replay(&mut self) -> DrawResult<()> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        if session.winners.is_empty() {
            return Err(DrawError::NothingToReplay);
        }
        session.replay_cursor = Some(0);
        info!("Replay started: {} winners", session.winners.len());
        Ok(())
    }

    /// Next winner in playback order.
    pub fn replay_next(&mut self) -> DrawResult<&Winner> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        let cursor = session.replay_cursor.ok_or(DrawError::NotReplaying)?;
        if cursor as usize >= session.winners.len() {
            return Err(DrawError::ReplayComplete);
        }
        session.replay_cursor = Some(cursor + 1);
        Ok(&session.winners[cursor as usize])
    }

    pub fn exit_replay(&mut self) -> DrawResult<()> {
        let session = self.session.as_mut().ok_or(DrawError::NoActiveSession)?;
        session.replay_cursor = None;
        Ok(())
    }

    fn clear_pending(&mut self) {
        self.pending = None;
        self.pending_bulk.clear();
    }
}

fn ensure_unlocked(session: &DrawSession) -> DrawResult<()> {
    if session.locked {
        return Err(DrawError::SessionLocked);
    }
    Ok(())
}

fn ensure_remaining(session: &DrawSession, config: &RaffleConfig) -> DrawResult<()> {
    if session.winners.len() as u64 >= u64::from(config.number_of_winners) {
        return Err(DrawError::DrawComplete);
    }
    Ok(())
}

fn commit_winner(session: &mut DrawSession, prizes: Option<&PrizeConfig>, winner: Winner) {
    let prize = prize_for(prizes, winner.position as usize - 1);
    session.audit.record(&winner, prize);
    session.winners.push(winner);
    session.draw_count = session.winners.len() as u32;
}
