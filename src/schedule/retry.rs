use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use crate::error::Result;
use super::mutation::with_slot_retried_with_rng;
use super::types::Schedule;

/// Endlessly re-pairs one slot at a time, holding the latest schedule.
///
/// Slots are visited in rotation by [`advance`](Self::advance); callers
/// decide when to stop.
#[derive(Debug, Clone)]
pub struct SlotRetryIterator<R = StdRng> {
    schedule: Schedule,
    next_slot: usize,
    rng: R,
}

impl SlotRetryIterator<StdRng> {
    pub fn new(schedule: Schedule) -> Self {
        Self::with_rng(schedule, StdRng::from_entropy())
    }
}

impl<R: Rng> SlotRetryIterator<R> {
    pub fn with_rng(schedule: Schedule, rng: R) -> Self {
        Self {
            schedule,
            next_slot: 0,
            rng,
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Continues from a schedule edited elsewhere; the rotation carries on
    pub fn rebase(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    /// Retries the next slot in rotation and returns the new schedule.
    /// A schedule without slots comes back unchanged.
    pub fn advance(&mut self) -> Result<Schedule> {
        let n_slots = self.schedule.n_slots();
        if n_slots == 0 {
            return Ok(self.schedule.clone());
        }
        let i_slot = self.next_slot % n_slots;
        self.next_slot = (i_slot + 1) % n_slots;
        self.advance_slot(i_slot)
    }

    /// Retries a caller-chosen slot and returns the new schedule
    pub fn advance_slot(&mut self, i_slot: usize) -> Result<Schedule> {
        let new_schedule = with_slot_retried_with_rng(&self.schedule, i_slot, &mut self.rng)?;
        self.schedule = new_schedule.clone();
        Ok(new_schedule)
    }
}
