use std::collections::{BTreeSet, HashMap};
use rand::Rng;
use crate::error::{Result, RotaError};
use super::types::{pair_key, CourtAllocation, Pair, PairKey, PersonId, TimeSlotAllocation, PAIRS_PER_COURT};

/// Running tallies the pairing heuristic steers by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayCounters {
    times_played: HashMap<PersonId, usize>,
    times_paired: HashMap<PairKey, usize>,
}

impl PlayCounters {
    /// Every person and every unordered pair of the squad starts at zero
    pub fn zeroed(squad: &[PersonId]) -> Self {
        let mut times_played = HashMap::with_capacity(squad.len());
        let mut times_paired = HashMap::new();
        for (i1, &id1) in squad.iter().enumerate() {
            times_played.insert(id1, 0);
            for &id2 in &squad[i1 + 1..] {
                times_paired.insert(PairKey::new(id1, id2), 0);
            }
        }
        Self { times_played, times_paired }
    }

    pub fn times_played(&self, person: PersonId) -> Option<usize> {
        self.times_played.get(&person).copied()
    }

    pub fn times_paired(&self, a: PersonId, b: PersonId) -> Option<usize> {
        self.times_paired.get(&PairKey::new(a, b)).copied()
    }

    /// Counts one pairing: the pair itself and a game for each member
    pub fn record_pair(&mut self, pair: &Pair) -> Result<()> {
        let key = pair_key(pair);
        let n_paired = self
            .times_paired
            .get_mut(&key)
            .ok_or_else(|| RotaError::Internal(format!("no pair counter for {}", key)))?;
        *n_paired += 1;

        for person in pair {
            let n_played = self
                .times_played
                .get_mut(person)
                .ok_or_else(|| RotaError::Internal(format!("no play counter for {}", person)))?;
            *n_played += 1;
        }
        Ok(())
    }

    /// Counts every pair playing in an existing slot
    pub fn record_slot(&mut self, slot: &TimeSlotAllocation) -> Result<()> {
        for pair in slot.pairs() {
            self.record_pair(pair)?;
        }
        Ok(())
    }
}

/// Picks the candidate who has played the most, ties broken uniformly at
/// random by reservoir sampling
fn random_maximal_person<R: Rng + ?Sized>(
    counters: &PlayCounters,
    candidates: &BTreeSet<PersonId>,
    rng: &mut R,
) -> Result<PersonId> {
    let mut max_n_times = 0;
    let mut chosen = None;
    let mut n_tied = 0u32;
    for &candidate in candidates {
        let n_times = counters
            .times_played(candidate)
            .ok_or_else(|| RotaError::Internal(format!("no play counter for {}", candidate)))?;
        if chosen.is_none() || n_times > max_n_times {
            max_n_times = n_times;
            n_tied = 0;
        }
        if n_times == max_n_times {
            n_tied += 1;
            if rng.gen_range(0..n_tied) == 0 {
                chosen = Some(candidate);
            }
        }
    }
    chosen.ok_or_else(|| RotaError::Internal("could not find person".into()))
}

/// Picks the candidate `person` has partnered least often, ties broken the
/// same way
fn random_minimal_partner<R: Rng + ?Sized>(
    counters: &PlayCounters,
    person: PersonId,
    candidates: &BTreeSet<PersonId>,
    rng: &mut R,
) -> Result<PersonId> {
    let mut min_n_times = usize::MAX;
    let mut chosen = None;
    let mut n_tied = 0u32;
    for &candidate in candidates {
        let n_times = counters.times_paired(person, candidate).ok_or_else(|| {
            RotaError::Internal(format!("no pair counter for {}", PairKey::new(person, candidate)))
        })?;
        if n_times < min_n_times {
            min_n_times = n_times;
            n_tied = 0;
        }
        if n_times == min_n_times {
            n_tied += 1;
            if rng.gen_range(0..n_tied) == 0 {
                chosen = Some(candidate);
            }
        }
    }
    chosen.ok_or_else(|| RotaError::Internal("could not find partner".into()))
}

/// Pairs off everyone in `available`, updating `counters` as each pair forms.
///
/// The most-played person is placed first so that the least-played are left
/// to be chosen as partners; each partner is the one least often paired with
/// them so far. Greedy: repeats can still happen and are left to retries.
pub fn pair_up<R: Rng + ?Sized>(
    mut available: BTreeSet<PersonId>,
    counters: &mut PlayCounters,
    rng: &mut R,
) -> Result<Vec<Pair>> {
    if available.len() % 2 != 0 {
        return Err(RotaError::Internal(format!(
            "cannot pair up an odd number ({}) of players",
            available.len()
        )));
    }

    let mut pairs = Vec::with_capacity(available.len() / 2);
    while !available.is_empty() {
        let player1 = random_maximal_person(counters, &available, rng)?;
        available.remove(&player1);
        let player2 = random_minimal_partner(counters, player1, &available, rng)?;
        available.remove(&player2);

        let pair = [player1, player2];
        counters.record_pair(&pair)?;
        pairs.push(pair);
    }
    Ok(pairs)
}

/// Deals pairs two at a time onto courts
pub fn courts_from_pairs(pairs: Vec<Pair>) -> Result<Vec<CourtAllocation>> {
    if pairs.len() % PAIRS_PER_COURT != 0 {
        return Err(RotaError::Internal(format!(
            "{} pairs do not fill whole courts",
            pairs.len()
        )));
    }
    Ok(pairs.chunks_exact(PAIRS_PER_COURT).map(|c| [c[0], c[1]]).collect())
}
