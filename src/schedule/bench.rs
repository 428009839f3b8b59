use std::collections::{BTreeSet, VecDeque};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use super::slot_utils::{sample_avoiding, shuffled};
use super::types::PersonId;

/// Endless, fair sequence of benches for one squad.
///
/// Every refill of the internal queue appends exactly one permutation of the
/// squad, so starting from a fresh generator, any `squad.len()` consecutive
/// benches sit every person out exactly `n_bench` times. Nobody is benched
/// twice in a row unless the bench is more than half the squad.
#[derive(Debug, Clone)]
pub struct BenchGenerator<R = StdRng> {
    n_bench: usize,
    squad: BTreeSet<PersonId>,
    prev_bench: BTreeSet<PersonId>,
    bench_queue: VecDeque<PersonId>,
    rng: R,
}

impl BenchGenerator<StdRng> {
    pub fn new(n_bench: usize, squad: &[PersonId]) -> Self {
        Self::with_rng(n_bench, squad, StdRng::from_entropy())
    }
}

impl<R: Rng> BenchGenerator<R> {
    /// Bench size is clamped to the squad size
    pub fn with_rng(n_bench: usize, squad: &[PersonId], rng: R) -> Self {
        let squad: BTreeSet<PersonId> = squad.iter().copied().collect();
        Self {
            n_bench: n_bench.min(squad.len()),
            squad,
            prev_bench: BTreeSet::new(),
            bench_queue: VecDeque::new(),
            rng,
        }
    }

    pub fn n_bench(&self) -> usize {
        self.n_bench
    }

    fn replenish(&mut self) {
        let n_missing = self.n_bench - self.bench_queue.len();
        let mut replenish_pool = self.squad.clone();

        // Top up the next bench with people neither queued nor just benched
        let queued: BTreeSet<PersonId> = self.bench_queue.iter().copied().collect();
        let initial = sample_avoiding(
            &mut replenish_pool,
            n_missing,
            &self.prev_bench,
            &queued,
            &mut self.rng,
        );
        self.bench_queue.extend(initial);

        // The bench after that should not overlap the one now at the front
        let queued: BTreeSet<PersonId> = self.bench_queue.iter().copied().collect();
        let next = sample_avoiding(
            &mut replenish_pool,
            self.n_bench,
            &queued,
            &BTreeSet::new(),
            &mut self.rng,
        );
        self.bench_queue.extend(next);

        let rest = shuffled(replenish_pool, &mut self.rng);
        self.bench_queue.extend(rest);
    }
}

impl<R: Rng> Iterator for BenchGenerator<R> {
    type Item = Vec<PersonId>;

    /// Never returns `None`
    fn next(&mut self) -> Option<Vec<PersonId>> {
        if self.bench_queue.len() < self.n_bench {
            self.replenish();
        }

        let bench: Vec<PersonId> = self.bench_queue.drain(..self.n_bench).collect();
        self.prev_bench = bench.iter().copied().collect();
        Some(bench)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_squad(n_players: u32) -> Vec<PersonId> {
        (0..n_players).map(|i| 2000 + i).collect()
    }

    /// Draws `n_draws` benches, checking no back-to-back repeats, and
    /// returns how often each person sat out.
    fn bench_counts<R: Rng>(
        generator: &mut BenchGenerator<R>,
        squad: &[PersonId],
        n_draws: usize,
        expect_disjoint: bool,
    ) -> HashMap<PersonId, usize> {
        let mut n_times: HashMap<PersonId, usize> = squad.iter().map(|&p| (p, 0)).collect();
        let mut prev: BTreeSet<PersonId> = BTreeSet::new();
        for bench in generator.by_ref().take(n_draws) {
            let as_set: BTreeSet<PersonId> = bench.iter().copied().collect();
            assert_eq!(as_set.len(), bench.len(), "bench lists someone twice");
            if expect_disjoint {
                assert!(prev.is_disjoint(&as_set), "{:?} benched twice in a row", prev.intersection(&as_set));
            }
            for p in &bench {
                *n_times.get_mut(p).unwrap() += 1;
            }
            prev = as_set;
        }
        n_times
    }

    #[test]
    fn test_can_generate_benches() {
        let squad_size = 12;
        let n_bench = 3;
        let squad = make_squad(squad_size);
        for _trial in 0..1000 {
            let mut generator = BenchGenerator::new(n_bench, &squad);
            let counts = bench_counts(&mut generator, &squad, n_bench * squad_size as usize, true);
            let first = counts[&squad[0]];
            assert!(counts.values().all(|&n| n == first));
        }
    }

    #[test]
    fn test_window_of_squad_size_is_fair() {
        let mut rng = StdRng::seed_from_u64(99);
        for squad_size in 5..=14u32 {
            let squad = make_squad(squad_size);
            for n_bench in 1..=(squad_size as usize / 2) {
                let seed: u64 = rng.gen();
                let mut generator = BenchGenerator::with_rng(n_bench, &squad, StdRng::seed_from_u64(seed));
                let counts = bench_counts(&mut generator, &squad, squad_size as usize, true);
                assert!(
                    counts.values().all(|&n| n == n_bench),
                    "squad {} bench {}: {:?}",
                    squad_size,
                    n_bench,
                    counts
                );
            }
        }
    }

    #[test]
    fn test_oversized_bench_stays_fair() {
        // Nine people on one court: five sit out every slot
        let squad = make_squad(9);
        let mut generator = BenchGenerator::with_rng(5, &squad, StdRng::seed_from_u64(5));
        let counts = bench_counts(&mut generator, &squad, 9, false);
        assert!(counts.values().all(|&n| n == 5), "{:?}", counts);
    }

    #[test]
    fn test_empty_bench() {
        let squad = make_squad(8);
        let mut generator = BenchGenerator::new(0, &squad);
        for _ in 0..10 {
            assert_eq!(generator.next(), Some(vec![]));
        }
    }

    #[test]
    fn test_bench_size_clamped() {
        let generator = BenchGenerator::new(10, &make_squad(4));
        assert_eq!(generator.n_bench(), 4);
    }
}
