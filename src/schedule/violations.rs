use std::collections::{BTreeMap, HashMap};
use serde::Serialize;
use crate::error::{Result, RotaError};
use super::types::{pair_key, PairKey, PersonId, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SittingOutSubKind {
    /// Benched less than the fair share, i.e. playing too much
    TooFew,
    /// Benched more than the fair share
    TooMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SittingOutFairnessViolation {
    pub person_id: PersonId,
    pub sub_kind: SittingOutSubKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoDuplicatePairsViolation {
    pub pair_key: PairKey,
}

/// Both violation lists for one schedule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Violations {
    pub sitting_out_fairness: Vec<SittingOutFairnessViolation>,
    pub no_duplicate_pairs: Vec<NoDuplicatePairsViolation>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.sitting_out_fairness.is_empty() && self.no_duplicate_pairs.is_empty()
    }
}

/// Evaluates every rule against `schedule`
pub fn violations(schedule: &Schedule) -> Result<Violations> {
    Ok(Violations {
        sitting_out_fairness: sitting_out_fairness_violations(schedule)?,
        no_duplicate_pairs: no_duplicate_pairs_violations(schedule),
    })
}

/// People benched outside `floor..=ceil` of their fair share of bench
/// slots, `bench_size * n_slots / squad_size`.
///
/// Fails with `InconsistentSquads` when the slots disagree about who is in
/// the squad.
pub fn sitting_out_fairness_violations(schedule: &Schedule) -> Result<Vec<SittingOutFairnessViolation>> {
    let squad = schedule.squad()?;
    let Some(first) = schedule.time_slots.first() else {
        return Ok(Vec::new());
    };
    if squad.is_empty() {
        return Ok(Vec::new());
    }

    let n_slots = schedule.n_slots();
    let n_sitting_out = first.bench.len();
    let n_persons = squad.len();

    let total = n_sitting_out * n_slots;
    let min_n_slots = total / n_persons;
    let max_n_slots = total.div_ceil(n_persons);

    let mut n_slots_sitting_out: BTreeMap<PersonId, usize> = squad.iter().map(|&p| (p, 0)).collect();
    for slot in &schedule.time_slots {
        for person in &slot.bench {
            let n_times = n_slots_sitting_out
                .get_mut(person)
                .ok_or(RotaError::InconsistentSquads)?;
            *n_times += 1;
        }
    }

    let mut found = Vec::new();
    for (&person_id, &n) in &n_slots_sitting_out {
        if n < min_n_slots {
            found.push(SittingOutFairnessViolation {
                person_id,
                sub_kind: SittingOutSubKind::TooFew,
            });
        }
        if n > max_n_slots {
            found.push(SittingOutFairnessViolation {
                person_id,
                sub_kind: SittingOutSubKind::TooMany,
            });
        }
    }
    Ok(found)
}

/// One violation per partnership that occurs more than once anywhere in
/// the schedule, sorted by key
pub fn no_duplicate_pairs_violations(schedule: &Schedule) -> Vec<NoDuplicatePairsViolation> {
    let mut n_times_paired: HashMap<PairKey, usize> = HashMap::new();
    for slot in &schedule.time_slots {
        for pair in slot.pairs() {
            *n_times_paired.entry(pair_key(pair)).or_insert(0) += 1;
        }
    }

    let mut found: Vec<NoDuplicatePairsViolation> = n_times_paired
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(pair_key, _)| NoDuplicatePairsViolation { pair_key })
        .collect();
    found.sort_by_key(|v| v.pair_key);
    found
}

/// No partnership repeats anywhere in the schedule
pub fn is_converged(schedule: &Schedule) -> bool {
    no_duplicate_pairs_violations(schedule).is_empty()
}
