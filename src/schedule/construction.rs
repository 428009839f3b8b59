use std::collections::BTreeSet;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use crate::error::{Result, RotaError};
use super::bench::BenchGenerator;
use super::pairing::{courts_from_pairs, pair_up, PlayCounters};
use super::types::{PersonId, Schedule, ScheduleParams, TimeSlotAllocation, PLAYERS_PER_COURT};

/// Builds a fresh schedule for `roster` using the thread-local RNG
pub fn build_schedule(roster: &[PersonId], params: &ScheduleParams) -> Result<Schedule> {
    build_schedule_with_rng(roster, params, &mut rand::thread_rng())
}

/// Builds a fresh schedule: a fair bench rotation, then greedy pairing of
/// whoever is left in each slot.
///
/// Fails with `InsufficientSquad` when there are fewer people than seats.
pub fn build_schedule_with_rng<R: Rng + ?Sized>(
    roster: &[PersonId],
    params: &ScheduleParams,
    rng: &mut R,
) -> Result<Schedule> {
    let n_courts = params.n_courts;
    if n_courts == 0 {
        return Err(RotaError::InvalidParams("need at least one court".into()));
    }

    let mut seen = BTreeSet::new();
    for &person in roster {
        if !seen.insert(person) {
            return Err(RotaError::DuplicatePerson(person));
        }
    }

    let n_players_per_slot = n_courts * PLAYERS_PER_COURT;
    if roster.len() < n_players_per_slot {
        return Err(RotaError::InsufficientSquad {
            squad_size: roster.len(),
            n_courts,
        });
    }
    let n_bench = roster.len() - n_players_per_slot;

    let mut bench_generator = BenchGenerator::with_rng(n_bench, roster, StdRng::seed_from_u64(rng.gen()));
    let mut counters = PlayCounters::zeroed(roster);

    let mut time_slots = Vec::with_capacity(params.n_slots);
    for _ in 0..params.n_slots {
        let bench = bench_generator
            .next()
            .ok_or_else(|| RotaError::Internal("bench generator ran dry".into()))?;
        let benched: BTreeSet<PersonId> = bench.iter().copied().collect();
        let players: BTreeSet<PersonId> = seen.difference(&benched).copied().collect();

        let pairs = pair_up(players, &mut counters, rng)?;
        let court_allocations = courts_from_pairs(pairs)?;
        time_slots.push(TimeSlotAllocation { court_allocations, bench });
    }

    log::debug!(
        "built schedule: {} people, {} courts, {} slots, {} on the bench",
        roster.len(),
        n_courts,
        params.n_slots,
        n_bench
    );
    Ok(Schedule { n_courts, time_slots })
}
