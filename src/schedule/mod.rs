pub mod types;
pub mod slot_utils;
pub mod bench;
pub mod pairing;
pub mod construction;
pub mod violations;
pub mod mutation;
pub mod retry;

pub use types::{
    pair_key, CourtAllocation, Pair, PairKey, PersonId, PersonPath, Schedule, ScheduleParams,
    TimeSlotAllocation, PLAYERS_PER_COURT,
};
pub use slot_utils::slot_label;
pub use bench::BenchGenerator;
pub use construction::{build_schedule, build_schedule_with_rng};
pub use violations::{
    is_converged, no_duplicate_pairs_violations, sitting_out_fairness_violations, violations,
    NoDuplicatePairsViolation, SittingOutFairnessViolation, SittingOutSubKind, Violations,
};
pub use mutation::{path_of_person, with_pairs_swapped, with_persons_swapped, with_slot_retried};
pub use retry::SlotRetryIterator;
