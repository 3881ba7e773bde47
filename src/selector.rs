// Raffle Draw Engine - Weighted selection
use std::collections::HashSet;

use log::debug;

use crate::error::{DrawError, DrawResult};
use crate::rng::RandomSource;
use crate::state::Participant;

/// Pick one participant from `pool`, weighted by ticket count, skipping keys in `excluded`.
///
/// Eligible participants are walked in pool order, so the same pool, exclusions and
/// random value always yield the same participant. The random source is only consumed
/// once there is something to pick from.
pub fn select<'a, R: RandomSource + ?Sized>(
    pool: &'a [Participant],
    excluded: &HashSet<String>,
    rng: &mut R,
) -> DrawResult<&'a Participant> {
    select_index(pool, excluded, rng).map(|index| &pool[index])
}

/// Same as [`select`], returning the winner's index in `pool`.
pub fn select_index<R: RandomSource + ?Sized>(
    pool: &[Participant],
    excluded: &HashSet<String>,
    rng: &mut R,
) -> DrawResult<usize> {
    let eligible: Vec<(usize, u64)> = pool
        .iter()
        .enumerate()
        .filter(|(_, p)| !excluded.contains(&p.key()))
        .map(|(index, p)| (index, p.entries))
        .collect();

    let (last, _) = *eligible.last().ok_or(DrawError::PoolExhausted)?;

    let total_weight = eligible
        .iter()
        .try_fold(0u64, |total, &(_, entries)| total.checked_add(entries))
        .ok_or(DrawError::TicketOverflow)?;
    if total_weight == 0 {
        return Err(DrawError::ZeroWeightPool);
    }

    let target = rng.next_f64() * total_weight as f64;
    debug!("Selecting: eligible={}, total_weight={}, target={}", eligible.len(), total_weight, target);

    // bounded by total_weight
    let mut cumulative: u64 = 0;
    for &(index, entries) in &eligible {
        cumulative += entries;
        if cumulative as f64 >= target {
            return Ok(index);
        }
    }

    // floating drift
    Ok(last)
}

/// Exclusion set for the next draw given the keys already drawn.
pub fn exclusion_set<I>(allow_repeats: bool, drawn: I) -> HashSet<String>
where
    I: IntoIterator<Item = String>,
{
    if allow_repeats {
        HashSet::new()
    } else {
        drawn.into_iter().collect()
    }
}
