use std::collections::HashSet;

use raffle_draw::{
    audit::verify,
    prize::{Prize, PrizeConfig},
    DrawEngine, DrawError, DrawStatus, Participant, RaffleConfig, RevealMode,
};

const SEED: u32 = 424242;

fn participants(count: usize) -> Vec<Participant> {
    (0..count)
        .map(|i| {
            Participant::new(
                format!("p{}", i),
                format!("Person {}", i),
                format!("person{}@example.com", i),
                (i as u64 % 4) + 1,
            )
        })
        .collect()
}

// Engine with a started session
fn setup(pool_size: usize, config: RaffleConfig) -> DrawEngine {
    let mut engine = DrawEngine::new(participants(pool_size), config, None);
    engine.start_session_with_seed(SEED).unwrap();
    engine
}

// Draw and confirm the next winner, returning its key
fn draw_and_record(engine: &mut DrawEngine) -> String {
    let key = engine.draw_next().unwrap().key();
    engine.record_winner(&key).unwrap();
    key
}

#[test]
fn test_new_engine_is_in_setup() {
    let engine = DrawEngine::new(participants(3), RaffleConfig::default(), None);
    assert_eq!(engine.status(), DrawStatus::Setup);
    assert!(engine.session().is_none());
    assert!(engine.winners().is_empty());
}

#[test]
fn test_operations_require_a_session() {
    let mut engine = DrawEngine::new(participants(3), RaffleConfig::default(), None);
    assert_eq!(engine.draw_next().unwrap_err(), DrawError::NoActiveSession);
    assert_eq!(engine.undo_last().unwrap_err(), DrawError::NoActiveSession);
    assert_eq!(engine.lock().unwrap_err(), DrawError::NoActiveSession);
    assert_eq!(engine.enter_replay().unwrap_err(), DrawError::NoActiveSession);
}

#[test]
fn test_start_session_rejects_empty_pool() {
    let mut engine = DrawEngine::new(vec![], RaffleConfig::default().with_repeats(true), None);
    assert_eq!(
        engine.start_session().unwrap_err(),
        DrawError::InsufficientParticipants { available: 0, required: 1 }
    );
    assert_eq!(engine.status(), DrawStatus::Setup);
}

#[test]
fn test_start_session_rejects_too_few_participants() {
    let mut engine = DrawEngine::new(participants(3), RaffleConfig::default().with_winners(5), None);
    assert_eq!(
        engine.start_session().unwrap_err(),
        DrawError::InsufficientParticipants { available: 3, required: 5 }
    );
}

#[test]
fn test_repeats_allow_more_winners_than_participants() {
    let mut engine = setup(2, RaffleConfig::default().with_winners(6).with_repeats(true));
    for _ in 0..6 {
        draw_and_record(&mut engine);
    }
    assert_eq!(engine.winners().len(), 6);
    assert_eq!(engine.draw_next().unwrap_err(), DrawError::DrawComplete);
}

#[test]
fn test_zero_winners_is_invalid() {
    let mut engine = DrawEngine::new(participants(3), RaffleConfig::default().with_winners(0), None);
    assert!(matches!(engine.start_session(), Err(DrawError::InvalidConfig(_))));
}

#[test]
fn test_start_session_snapshots_seed_and_checksum() {
    let engine = setup(4, RaffleConfig::default());
    let session = engine.session().unwrap();

    assert_eq!(engine.status(), DrawStatus::Active);
    assert_eq!(session.seed, SEED.to_string());
    assert_eq!(session.checksum.len(), 16);
    assert_eq!(session.draw_count, 0);
    assert!(!session.locked);
    assert!(session.winners.is_empty());
}

#[test]
fn test_fresh_seeds_are_minted_per_session() {
    let mut engine = DrawEngine::new(participants(4), RaffleConfig::default(), None);
    engine.start_session().unwrap();
    let seed: u32 = engine.session().unwrap().seed.parse().unwrap();
    assert!(seed < 0x7FFF_FFFF);
}

#[test]
fn test_new_session_leaves_previous_untouched() {
    let mut engine = setup(5, RaffleConfig::default().with_winners(2));
    draw_and_record(&mut engine);
    engine.lock().unwrap();
    let before = engine.session().unwrap().clone();

    let previous = engine.start_session_with_seed(SEED + 1).unwrap().unwrap();
    assert_eq!(previous, before);

    let current = engine.session().unwrap();
    assert_ne!(current.draw_id, previous.draw_id);
    assert_eq!(current.seed, (SEED + 1).to_string());
    assert!(current.winners.is_empty());
    assert!(!current.locked);
}

#[test]
fn test_draw_next_does_not_record() {
    let mut engine = setup(5, RaffleConfig::default().with_winners(2));
    let candidate = engine.draw_next().unwrap().clone();

    assert!(engine.winners().is_empty());
    assert_eq!(engine.pending_candidate(), Some(&candidate));

    engine.record_winner(&candidate.key()).unwrap();
    assert_eq!(engine.winners().len(), 1);
    assert_eq!(engine.winners()[0].participant, candidate);
    assert_eq!(engine.winners()[0].position, 1);
    assert_eq!(engine.winners()[0].draw_index, Some(0));
    assert_eq!(engine.pending_candidate(), None);
}

#[test]
fn test_same_seed_same_sequence() {
    let config = RaffleConfig::default().with_winners(5);
    let mut first = setup(10, config.clone());
    let mut second = setup(10, config);

    let a: Vec<String> = (0..5).map(|_| draw_and_record(&mut first)).collect();
    let b: Vec<String> = (0..5).map(|_| draw_and_record(&mut second)).collect();
    assert_eq!(a, b);
}

#[test]
fn test_no_duplicate_winners() {
    let mut engine = setup(8, RaffleConfig::default().with_winners(8));
    let keys: Vec<String> = (0..8).map(|_| draw_and_record(&mut engine)).collect();
    let distinct: HashSet<&String> = keys.iter().collect();

    assert_eq!(distinct.len(), 8);
    assert_eq!(engine.draw_next().unwrap_err(), DrawError::DrawComplete);
}

#[test]
fn test_pool_exhausted_when_keys_collide() {
    // three rows but only two distinct emails
    let pool = vec![
        Participant::new("1", "Ada", "ada@example.com", 1),
        Participant::new("2", "Ada L.", "ADA@example.com", 2),
        Participant::new("3", "Grace", "grace@example.com", 1),
    ];
    let mut engine = DrawEngine::new(pool, RaffleConfig::default().with_winners(3), None);
    engine.start_session_with_seed(SEED).unwrap();

    draw_and_record(&mut engine);
    draw_and_record(&mut engine);
    let consumed = engine.session().unwrap().draws_consumed;

    assert_eq!(engine.draw_next().unwrap_err(), DrawError::PoolExhausted);
    assert_eq!(engine.winners().len(), 2);
    assert_eq!(engine.session().unwrap().draws_consumed, consumed);
}

// Test that recording a drawn candidate keeps the exact row when emails collide
#[test]
fn test_record_keeps_drawn_row_when_keys_collide() {
    let pool = vec![
        Participant::new("1", "Ada", "ada@example.com", 1),
        Participant::new("2", "Ada L.", "ADA@example.com", 50),
        Participant::new("3", "Grace", "grace@example.com", 1),
    ];
    let config = RaffleConfig::default().with_winners(1);

    let mut checked = 0;
    for seed in 0..20 {
        let mut engine = DrawEngine::new(pool.clone(), config.clone(), None);
        engine.start_session_with_seed(seed).unwrap();
        let candidate = engine.draw_next().unwrap().clone();
        if candidate.id != "2" {
            continue;
        }

        let winner = engine.record_winner(&candidate.key()).unwrap().clone();
        assert_eq!(winner.participant, candidate);
        assert_eq!(winner.participant.entries, 50);
        assert_eq!(winner.draw_index, Some(0));
        assert_eq!(verify(&pool, engine.audit_log().unwrap()), Ok(()));
        checked += 1;
    }
    assert!(checked > 0);
}

// Test that a key without a pending match falls back to the first row
#[test]
fn test_manual_record_uses_first_matching_row() {
    let pool = vec![
        Participant::new("1", "Ada", "ada@example.com", 1),
        Participant::new("2", "Ada L.", "ADA@example.com", 50),
    ];
    let mut engine = DrawEngine::new(pool, RaffleConfig::default().with_winners(1), None);
    engine.start_session_with_seed(SEED).unwrap();

    let winner = engine.record_winner("Ada@Example.com").unwrap();
    assert_eq!(winner.participant.id, "1");
    assert_eq!(winner.draw_index, None);
}

#[test]
fn test_start_rejects_overflowing_ticket_total() {
    let pool = vec![
        Participant::new("1", "Ada", "ada@example.com", u64::MAX),
        Participant::new("2", "Grace", "grace@example.com", 1),
    ];
    let mut engine = DrawEngine::new(pool, RaffleConfig::default(), None);

    assert_eq!(engine.start_session_with_seed(SEED).unwrap_err(), DrawError::TicketOverflow);
    assert_eq!(engine.status(), DrawStatus::Setup);
}

#[test]
fn test_record_rejects_unknown_and_repeat_winners() {
    let mut engine = setup(4, RaffleConfig::default().with_winners(3));
    assert_eq!(
        engine.record_winner("nobody@example.com").unwrap_err(),
        DrawError::UnknownParticipant("nobody@example.com".to_string())
    );

    let key = draw_and_record(&mut engine);
    assert_eq!(engine.record_winner(&key).unwrap_err(), DrawError::AlreadyWon(key));
    assert_eq!(engine.winners().len(), 1);
}

#[test]
fn test_manual_record_has_no_draw_index() {
    let mut engine = setup(4, RaffleConfig::default().with_winners(2));

    let winner = engine.record_winner(" Person3@Example.com ").unwrap();
    assert_eq!(winner.participant.id, "p3");
    assert_eq!(winner.draw_index, None);
}

#[test]
fn test_bonus_cadence() {
    let mut engine = setup(3, RaffleConfig::default().with_winners(9).with_repeats(true).with_bonus_interval(3));
    for _ in 0..9 {
        draw_and_record(&mut engine);
    }
    for winner in engine.winners() {
        assert_eq!(winner.is_bonus, winner.position % 3 == 0, "position {}", winner.position);
    }

    let mut engine = setup(5, RaffleConfig::default().with_winners(5));
    for _ in 0..5 {
        draw_and_record(&mut engine);
    }
    assert!(engine.winners().iter().all(|w| !w.is_bonus));
}

#[test]
fn test_undo_leaves_no_residue() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(4));
    draw_and_record(&mut engine);
    let winners_before = engine.winners().to_vec();
    let audit_before = engine.audit_log().unwrap().entries.clone();

    let key = draw_and_record(&mut engine);
    let undone = engine.undo_last().unwrap();

    assert_eq!(undone.participant.key(), key);
    assert_eq!(engine.winners(), winners_before.as_slice());
    assert_eq!(engine.audit_log().unwrap().entries, audit_before);
    assert_eq!(engine.draw_count(), 1);

    let undo_records = &engine.audit_log().unwrap().undone;
    assert_eq!(undo_records.len(), 1);
    assert_eq!(undo_records[0].position, 2);
    assert_eq!(undo_records[0].email, undone.participant.email);
}

#[test]
fn test_undo_does_not_rewind_randomness() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(3));
    draw_and_record(&mut engine);
    let consumed = engine.session().unwrap().draws_consumed;

    engine.undo_last().unwrap();
    assert_eq!(engine.session().unwrap().draws_consumed, consumed);

    engine.draw_next().unwrap();
    assert_eq!(engine.session().unwrap().draws_consumed, consumed + 1);
}

#[test]
fn test_nothing_to_undo() {
    let mut engine = setup(3, RaffleConfig::default());
    assert_eq!(engine.undo_last().unwrap_err(), DrawError::NothingToUndo);
}

#[test]
fn test_restart_keeps_seed_and_checksum() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(3));
    let first = draw_and_record(&mut engine);
    draw_and_record(&mut engine);
    let (seed, checksum, draw_id) = {
        let session = engine.session().unwrap();
        (session.seed.clone(), session.checksum.clone(), session.draw_id.clone())
    };

    engine.restart().unwrap();
    let session = engine.session().unwrap();
    assert!(session.winners.is_empty());
    assert!(session.audit.entries.is_empty());
    assert_eq!(session.draw_count, 0);
    assert_eq!(session.seed, seed);
    assert_eq!(session.checksum, checksum);
    assert_eq!(session.draw_id, draw_id);

    // the stream starts over from the seed
    assert_eq!(engine.draw_next().unwrap().key(), first);
}

#[test]
fn test_lock_is_irreversible() {
    let mut engine = setup(5, RaffleConfig::default().with_winners(3));
    let key = draw_and_record(&mut engine);
    engine.lock().unwrap();

    assert_eq!(engine.status(), DrawStatus::Locked);
    assert_eq!(engine.undo_last().unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.restart().unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.draw_next().unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.bulk_draw().unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.record_winner(&key).unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.lock().unwrap_err(), DrawError::SessionLocked);
    assert_eq!(engine.winners().len(), 1);

    engine.enter_replay().unwrap();
    assert_eq!(engine.replay_next().unwrap().participant.key(), key);
}

#[test]
fn test_lock_with_no_winners() {
    let mut engine = setup(3, RaffleConfig::default());
    engine.lock().unwrap();

    let session = engine.session().unwrap();
    assert!(session.locked);
    assert!(session.locked_at.is_some());
    assert_eq!(session.audit.locked_at, session.locked_at);
    assert_eq!(engine.enter_replay().unwrap_err(), DrawError::NothingToReplay);
}

#[test]
fn test_replay_plays_back_recorded_winners() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(4));
    let keys: Vec<String> = (0..4).map(|_| draw_and_record(&mut engine)).collect();
    let consumed = engine.session().unwrap().draws_consumed;

    assert_eq!(engine.replay_next().unwrap_err(), DrawError::NotReplaying);
    engine.enter_replay().unwrap();
    assert_eq!(engine.replay_cursor(), Some(0));

    for (i, key) in keys.iter().enumerate() {
        let winner = engine.replay_next().unwrap();
        assert_eq!(&winner.participant.key(), key);
        assert_eq!(winner.position as usize, i + 1);
    }
    assert_eq!(engine.replay_next().unwrap_err(), DrawError::ReplayComplete);

    let session = engine.session().unwrap();
    assert_eq!(session.draws_consumed, consumed);
    assert_eq!(session.winners.len(), 4);

    engine.exit_replay().unwrap();
    assert_eq!(engine.replay_cursor(), None);
}

#[test]
fn test_mutation_ends_replay() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(4));
    draw_and_record(&mut engine);
    draw_and_record(&mut engine);

    engine.enter_replay().unwrap();
    engine.replay_next().unwrap();
    engine.undo_last().unwrap();
    assert_eq!(engine.replay_cursor(), None);
}

#[test]
fn test_bulk_draw_matches_sequential_path() {
    let config = RaffleConfig::default()
        .with_winners(5)
        .with_bonus_interval(2)
        .with_reveal_mode(RevealMode::Bulk);

    let mut sequential = setup(9, config.clone());
    let expected: Vec<String> = (0..5).map(|_| draw_and_record(&mut sequential)).collect();

    let mut bulk = setup(9, config);
    let candidates = bulk.bulk_draw().unwrap().to_vec();
    assert!(bulk.winners().is_empty());

    let keys: Vec<String> = candidates.iter().map(|w| w.participant.key()).collect();
    assert_eq!(keys, expected);
    for (i, candidate) in candidates.iter().enumerate() {
        assert_eq!(candidate.position as usize, i + 1);
        assert_eq!(candidate.is_bonus, candidate.position % 2 == 0);
    }

    assert_eq!(bulk.finalize_bulk().unwrap(), 5);
    assert!(bulk.pending_bulk().is_empty());
    assert_eq!(bulk.winners().len(), 5);
    assert_eq!(bulk.audit_log().unwrap().entries.len(), 5);
    assert_eq!(bulk.draw_next().unwrap_err(), DrawError::DrawComplete);
    assert_eq!(
        bulk.session().unwrap().draws_consumed,
        sequential.session().unwrap().draws_consumed
    );
}

#[test]
fn test_bulk_draw_continues_after_recorded_winners() {
    let mut engine = setup(6, RaffleConfig::default().with_winners(4));
    let first = draw_and_record(&mut engine);

    let candidates = engine.bulk_draw().unwrap().to_vec();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[0].position, 2);
    assert!(candidates.iter().all(|w| w.participant.key() != first));
}

#[test]
fn test_bulk_draw_stops_when_pool_runs_out() {
    let pool = vec![
        Participant::new("1", "Ada", "ada@example.com", 1),
        Participant::new("2", "Ada L.", "ada@example.com", 1),
        Participant::new("3", "Grace", "grace@example.com", 1),
    ];
    let mut engine = DrawEngine::new(pool, RaffleConfig::default().with_winners(3), None);
    engine.start_session_with_seed(SEED).unwrap();

    assert_eq!(engine.bulk_draw().unwrap().len(), 2);
    engine.finalize_bulk().unwrap();
    assert_eq!(engine.bulk_draw().unwrap_err(), DrawError::PoolExhausted);
}

#[test]
fn test_discard_bulk() {
    let mut engine = setup(5, RaffleConfig::default().with_winners(3));
    engine.bulk_draw().unwrap();
    engine.discard_bulk().unwrap();

    assert!(engine.pending_bulk().is_empty());
    assert!(engine.winners().is_empty());
    assert_eq!(engine.finalize_bulk().unwrap_err(), DrawError::NothingPending);
    assert_eq!(engine.discard_bulk().unwrap_err(), DrawError::NothingPending);
}

#[test]
fn test_config_fixed_after_first_winner() {
    let mut engine = setup(5, RaffleConfig::default().with_winners(3));
    engine
        .set_config(RaffleConfig::default().with_winners(2).with_bonus_interval(2))
        .unwrap();
    assert_eq!(engine.session().unwrap().audit.config.bonus_round_interval, 2);

    draw_and_record(&mut engine);
    assert!(matches!(
        engine.set_config(RaffleConfig::default().with_winners(4)),
        Err(DrawError::InvalidConfig(_))
    ));
    assert_eq!(engine.config().number_of_winners, 2);
}

#[test]
fn test_winners_receive_positional_prizes() {
    let prizes = PrizeConfig::Sequential(vec![Prize::new("Laptop"), Prize::new("Mug")]);
    let mut engine = DrawEngine::new(participants(5), RaffleConfig::default().with_winners(3), Some(prizes));
    engine.start_session_with_seed(SEED).unwrap();
    for _ in 0..3 {
        draw_and_record(&mut engine);
    }

    let prize_names: Vec<Option<String>> = engine
        .audit_log()
        .unwrap()
        .entries
        .iter()
        .map(|e| e.prize.clone())
        .collect();
    assert_eq!(
        prize_names,
        vec![
            Some("Laptop".to_string()),
            Some("Mug".to_string()),
            Some("Mug".to_string())
        ]
    );
}
