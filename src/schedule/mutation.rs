use std::collections::BTreeSet;
use rand::Rng;
use crate::error::{Result, RotaError};
use super::pairing::{courts_from_pairs, pair_up, PlayCounters};
use super::types::{PersonId, PersonPath, Schedule, TimeSlotAllocation};

/// Finds where `person` sits in slot `i_slot`
pub fn path_of_person(schedule: &Schedule, i_slot: usize, person: PersonId) -> Result<PersonPath> {
    let slot = schedule.slot(i_slot)?;
    for (court, allocation) in slot.court_allocations.iter().enumerate() {
        for (pair, members) in allocation.iter().enumerate() {
            if let Some(seat) = members.iter().position(|&p| p == person) {
                return Ok(PersonPath::Playing { court, pair, seat });
            }
        }
    }

    slot.bench
        .iter()
        .position(|&p| p == person)
        .map(|index| PersonPath::Bench { index })
        .ok_or(RotaError::PersonNotFound(person))
}

fn person_at(slot: &TimeSlotAllocation, path: PersonPath) -> PersonId {
    match path {
        PersonPath::Playing { court, pair, seat } => slot.court_allocations[court][pair][seat],
        PersonPath::Bench { index } => slot.bench[index],
    }
}

fn seat_mut(slot: &mut TimeSlotAllocation, path: PersonPath) -> &mut PersonId {
    match path {
        PersonPath::Playing { court, pair, seat } => &mut slot.court_allocations[court][pair][seat],
        PersonPath::Bench { index } => &mut slot.bench[index],
    }
}

/// Copy of `schedule` with the occupants of two seats in one slot exchanged
fn with_seats_exchanged(schedule: &Schedule, i_slot: usize, path0: PersonPath, path1: PersonPath) -> Schedule {
    let mut new_schedule = schedule.clone();
    let slot = &mut new_schedule.time_slots[i_slot];
    let person0 = person_at(slot, path0);
    let person1 = person_at(slot, path1);
    *seat_mut(slot, path0) = person1;
    *seat_mut(slot, path1) = person0;
    new_schedule
}

/// Moves two players between their teams, leaving each partner where they
/// were. Both must be on a court in that slot.
pub fn with_pairs_swapped(
    schedule: &Schedule,
    i_slot: usize,
    person0: PersonId,
    person1: PersonId,
) -> Result<Schedule> {
    let path0 = path_of_person(schedule, i_slot, person0)?;
    let path1 = path_of_person(schedule, i_slot, person1)?;
    if !path0.is_playing() || !path1.is_playing() {
        return Err(RotaError::ExpectedPlaying);
    }
    Ok(with_seats_exchanged(schedule, i_slot, path0, path1))
}

/// Exchanges two people's places in one slot, bench included
pub fn with_persons_swapped(
    schedule: &Schedule,
    i_slot: usize,
    person0: PersonId,
    person1: PersonId,
) -> Result<Schedule> {
    let path0 = path_of_person(schedule, i_slot, person0)?;
    let path1 = path_of_person(schedule, i_slot, person1)?;
    Ok(with_seats_exchanged(schedule, i_slot, path0, path1))
}

/// Re-pairs one slot with the thread-local RNG
pub fn with_slot_retried(schedule: &Schedule, i_slot: usize) -> Result<Schedule> {
    with_slot_retried_with_rng(schedule, i_slot, &mut rand::thread_rng())
}

/// Throws away the pairings of slot `i_slot` and pairs its players afresh.
///
/// The bench is kept. Counters are rebuilt from every other slot so the new
/// pairs steer away from partnerships used elsewhere in the schedule.
pub fn with_slot_retried_with_rng<R: Rng + ?Sized>(
    schedule: &Schedule,
    i_slot: usize,
    rng: &mut R,
) -> Result<Schedule> {
    let slot = schedule.slot(i_slot)?;
    let squad = schedule.squad()?;

    let mut counters = PlayCounters::zeroed(&squad);
    for (i, other) in schedule.time_slots.iter().enumerate() {
        if i != i_slot {
            counters.record_slot(other)?;
        }
    }

    let players: BTreeSet<PersonId> = slot.players().collect();
    let pairs = pair_up(players, &mut counters, rng)?;
    let court_allocations = courts_from_pairs(pairs)?;

    let mut new_schedule = schedule.clone();
    new_schedule.time_slots[i_slot] = TimeSlotAllocation {
        court_allocations,
        bench: slot.bench.clone(),
    };
    Ok(new_schedule)
}
