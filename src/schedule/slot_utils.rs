use std::collections::BTreeSet;
use rand::Rng;
use rand::seq::SliceRandom;
use super::types::PersonId;

/// Display label for a slot index (slot 0 is "Game 1")
pub fn slot_label(i_slot: usize) -> String {
    format!("Game {}", i_slot + 1)
}

/// Returns the items in a uniformly random order
pub fn shuffled<T, I, R>(xs: I, rng: &mut R) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    R: Rng + ?Sized,
{
    let mut out: Vec<T> = xs.into_iter().collect();
    out.shuffle(rng);
    out
}

/// Draws up to `n` people out of `pool`, removing them from it.
///
/// Candidates in `hard_excluded` are never drawn. Candidates in `avoid` are
/// only drawn once everyone else has been used up, so the result overlaps
/// `avoid` as little as the pool allows. The sample is short only when fewer
/// than `n` people are eligible at all.
pub fn sample_avoiding<R: Rng + ?Sized>(
    pool: &mut BTreeSet<PersonId>,
    n: usize,
    avoid: &BTreeSet<PersonId>,
    hard_excluded: &BTreeSet<PersonId>,
    rng: &mut R,
) -> Vec<PersonId> {
    let (preferred, fallback): (Vec<PersonId>, Vec<PersonId>) = pool
        .iter()
        .copied()
        .filter(|p| !hard_excluded.contains(p))
        .partition(|p| !avoid.contains(p));

    let mut sample = shuffled(preferred, rng);
    sample.truncate(n);
    if sample.len() < n {
        let mut top_up = shuffled(fallback, rng);
        top_up.truncate(n - sample.len());
        sample.extend(top_up);
    }

    for p in &sample {
        pool.remove(p);
    }
    sample
}
