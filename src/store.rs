//! Application state shared between the HTTP handlers, the CLI and the
//! background generation task.
//!
//! Holds the current page, the chosen squad and params, the current
//! schedule and the generation state. Every edit replaces the schedule with
//! a new value produced by the pure operators in [`crate::schedule`], and
//! each new schedule is published on a watch channel.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Result, RotaError};
use crate::schedule::{
    build_schedule, with_pairs_swapped, with_persons_swapped, with_slot_retried, PersonId, Schedule,
    ScheduleParams, SlotRetryIterator, PLAYERS_PER_COURT,
};

/// First sequence number handed out to a generation run
const FIRST_SEQNUM: u64 = 4001;

/// Which view the operator is on; generation only runs on the review page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    ManagePool,
    ChooseSquad,
    ReviewSchedule,
    SchedulePrintLayout,
}

/// Whether a background repair run is in progress
#[derive(Debug)]
pub enum GenerationState {
    Idle,
    Running {
        seqnum: u64,
        retry_iterator: SlotRetryIterator,
    },
}

impl GenerationState {
    pub fn seqnum(&self) -> Option<u64> {
        match self {
            GenerationState::Idle => None,
            GenerationState::Running { seqnum, .. } => Some(*seqnum),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, GenerationState::Running { .. })
    }
}

/// Person picked out on the review page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "person_id", rename_all = "kebab-case")]
pub enum PersonHighlight {
    Inactive,
    Active(PersonId),
}

#[derive(Debug)]
pub struct StoreState {
    pub page: Page,
    pub squad: BTreeSet<PersonId>,
    pub params: ScheduleParams,
    pub schedule: Option<Schedule>,
    pub generation: GenerationState,
    pub highlight: PersonHighlight,
}

impl StoreState {
    fn defined_schedule(&self) -> Result<&Schedule> {
        self.schedule.as_ref().ok_or(RotaError::NoSchedule)
    }
}

pub struct Store {
    state: Mutex<StoreState>,
    next_seqnum: AtomicU64,
    schedule_tx: watch::Sender<Option<Schedule>>,
}

impl Store {
    pub fn new(params: ScheduleParams) -> Self {
        let (schedule_tx, _) = watch::channel(None);
        Self {
            state: Mutex::new(StoreState {
                page: Page::ManagePool,
                squad: BTreeSet::new(),
                params,
                schedule: None,
                generation: GenerationState::Idle,
                highlight: PersonHighlight::Inactive,
            }),
            next_seqnum: AtomicU64::new(FIRST_SEQNUM),
            schedule_tx,
        }
    }

    /// Locks the state. Never hold the guard across an `.await`.
    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Observes every schedule the store publishes from now on
    pub fn subscribe(&self) -> watch::Receiver<Option<Schedule>> {
        self.schedule_tx.subscribe()
    }

    fn next_seqnum(&self) -> u64 {
        self.next_seqnum.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn publish(&self, schedule: &Schedule) {
        self.schedule_tx.send_replace(Some(schedule.clone()));
    }

    pub fn page(&self) -> Page {
        self.lock().page
    }

    pub fn set_page(&self, page: Page) {
        self.lock().page = page;
    }

    pub fn squad(&self) -> Vec<PersonId> {
        self.lock().squad.iter().copied().collect()
    }

    pub fn params(&self) -> ScheduleParams {
        self.lock().params.clone()
    }

    pub fn set_params(&self, params: ScheduleParams) {
        self.lock().params = params;
    }

    pub fn schedule(&self) -> Option<Schedule> {
        self.lock().schedule.clone()
    }

    pub fn generation_seqnum(&self) -> Option<u64> {
        self.lock().generation.seqnum()
    }

    pub fn is_generating(&self) -> bool {
        self.lock().generation.is_running()
    }

    pub fn highlight(&self) -> PersonHighlight {
        self.lock().highlight
    }

    pub fn set_highlight(&self, person: PersonId) {
        self.lock().highlight = PersonHighlight::Active(person);
    }

    pub fn clear_highlight(&self) {
        self.lock().highlight = PersonHighlight::Inactive;
    }

    /// Adds or removes one person, then resizes to as many courts as the
    /// squad can fill (at least one). Returns whether they are now selected.
    pub fn toggle_in_squad(&self, person: PersonId) -> bool {
        let mut state = self.lock();
        let selected = if state.squad.remove(&person) {
            false
        } else {
            state.squad.insert(person);
            true
        };
        fit_courts_to_squad(&mut state);
        selected
    }

    pub fn clear_squad(&self) {
        let mut state = self.lock();
        state.squad.clear();
        state.params.n_courts = 1;
    }

    /// Selects exactly `ids`, e.g. the whole pool
    pub fn set_squad_to(&self, ids: impl IntoIterator<Item = PersonId>) {
        let mut state = self.lock();
        state.squad = ids.into_iter().collect();
        fit_courts_to_squad(&mut state);
    }

    /// Drops someone deleted from the pool; court count is left alone
    pub fn ensure_not_in_squad(&self, person: PersonId) {
        self.lock().squad.remove(&person);
    }

    /// Builds a new schedule from the squad and params, starts a generation
    /// run for it and switches to the review page. Returns the run's
    /// sequence number.
    pub fn generate_fresh_schedule(&self) -> Result<u64> {
        let (squad, params) = {
            let state = self.lock();
            (state.squad.iter().copied().collect::<Vec<_>>(), state.params.clone())
        };
        let schedule = build_schedule(&squad, &params)?;
        Ok(self.install_schedule(schedule))
    }

    /// Replaces the schedule, starts a new run over it and switches to the
    /// review page, superseding any run in progress. The sequence number is
    /// taken under the lock so the installed run always has the highest one.
    pub fn install_schedule(&self, schedule: Schedule) -> u64 {
        let mut state = self.lock();
        let seqnum = self.next_seqnum();
        state.page = Page::ReviewSchedule;
        state.generation = GenerationState::Running {
            seqnum,
            retry_iterator: SlotRetryIterator::new(schedule.clone()),
        };
        self.publish(&schedule);
        state.schedule = Some(schedule);
        log::info!("installed new schedule (run {})", seqnum);
        seqnum
    }

    /// Applies a pure edit to the current schedule. A running iterator is
    /// rebased so background retries continue from the edited schedule.
    fn edit_schedule<F>(&self, edit: F) -> Result<Schedule>
    where
        F: FnOnce(&Schedule) -> Result<Schedule>,
    {
        let mut state = self.lock();
        let new_schedule = edit(state.defined_schedule()?)?;
        if let GenerationState::Running { retry_iterator, .. } = &mut state.generation {
            retry_iterator.rebase(new_schedule.clone());
        }
        self.publish(&new_schedule);
        state.schedule = Some(new_schedule.clone());
        Ok(new_schedule)
    }

    pub fn swap_pairs_in_slot(&self, i_slot: usize, person0: PersonId, person1: PersonId) -> Result<Schedule> {
        self.edit_schedule(|s| with_pairs_swapped(s, i_slot, person0, person1))
    }

    pub fn swap_persons_in_slot(&self, i_slot: usize, person0: PersonId, person1: PersonId) -> Result<Schedule> {
        self.edit_schedule(|s| with_persons_swapped(s, i_slot, person0, person1))
    }

    pub fn retry_slot(&self, i_slot: usize) -> Result<Schedule> {
        self.edit_schedule(|s| with_slot_retried(s, i_slot))
    }

    /// Advances the running retry iterator by one step
    pub fn retry_next(&self) -> Result<Schedule> {
        let mut state = self.lock();
        let GenerationState::Running { retry_iterator, .. } = &mut state.generation else {
            return Err(RotaError::NotRunning);
        };
        let new_schedule = retry_iterator.advance()?;
        self.publish(&new_schedule);
        state.schedule = Some(new_schedule.clone());
        Ok(new_schedule)
    }

    /// Stops any run in progress; harmless when already idle
    pub fn cancel_generation(&self) {
        let mut state = self.lock();
        if let Some(seqnum) = state.generation.seqnum() {
            log::info!("cancelling generation run {}", seqnum);
        }
        state.generation = GenerationState::Idle;
    }
}

fn fit_courts_to_squad(state: &mut StoreState) {
    state.params.n_courts = (state.squad.len() / PLAYERS_PER_COURT).max(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_squad(n: u32, n_slots: usize) -> Store {
        let store = Store::new(ScheduleParams {
            n_slots,
            ..ScheduleParams::default()
        });
        store.set_squad_to(1..=n);
        store
    }

    #[test]
    fn test_squad_selection_resizes_courts() {
        let store = Store::new(ScheduleParams::default());
        assert!(store.toggle_in_squad(1));
        assert_eq!(store.params().n_courts, 1);
        store.set_squad_to(1..=13);
        assert_eq!(store.params().n_courts, 3);
        assert!(!store.toggle_in_squad(13));
        assert_eq!(store.params().n_courts, 3);
        assert!(!store.toggle_in_squad(12));
        assert_eq!(store.params().n_courts, 2);
        store.ensure_not_in_squad(1);
        assert_eq!(store.squad(), (2..=11).collect::<Vec<_>>());
        store.clear_squad();
        assert!(store.squad().is_empty());
        assert_eq!(store.params().n_courts, 1);
    }

    #[test]
    fn test_generate_fresh_schedule_starts_run() {
        let store = store_with_squad(10, 4);
        let seqnum = store.generate_fresh_schedule().unwrap();
        assert!(seqnum >= FIRST_SEQNUM);
        assert_eq!(store.generation_seqnum(), Some(seqnum));
        assert_eq!(store.page(), Page::ReviewSchedule);
        let schedule = store.schedule().unwrap();
        assert_eq!(schedule.n_courts, 2);
        assert_eq!(schedule.n_slots(), 4);
        assert_eq!(*store.subscribe().borrow(), Some(schedule));

        let next = store.generate_fresh_schedule().unwrap();
        assert!(next > seqnum);
    }

    #[test]
    fn test_generate_with_small_squad_fails() {
        let store = store_with_squad(3, 4);
        assert!(matches!(
            store.generate_fresh_schedule(),
            Err(RotaError::InsufficientSquad { squad_size: 3, n_courts: 1 })
        ));
        assert!(store.schedule().is_none());
        assert!(!store.is_generating());
    }

    #[test]
    fn test_edits_need_a_schedule() {
        let store = store_with_squad(8, 3);
        assert!(matches!(store.retry_slot(0), Err(RotaError::NoSchedule)));
        assert!(matches!(store.retry_next(), Err(RotaError::NotRunning)));
    }

    #[test]
    fn test_swap_rebases_running_iterator() {
        let store = store_with_squad(9, 3);
        store.generate_fresh_schedule().unwrap();
        let schedule = store.schedule().unwrap();
        let bench0 = schedule.time_slots[0].bench[0];
        let player0 = schedule.time_slots[0].court_allocations[0][0][0];

        let swapped = store.swap_persons_in_slot(0, bench0, player0).unwrap();
        assert_eq!(swapped.time_slots[0].bench[0], player0);

        // retrying keeps the edited bench, so the iterator saw the edit
        let retried = store.retry_next().unwrap();
        assert_eq!(retried.time_slots[0].bench, swapped.time_slots[0].bench);
        assert_eq!(store.schedule(), Some(retried));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let store = store_with_squad(8, 3);
        store.cancel_generation();
        store.generate_fresh_schedule().unwrap();
        assert!(store.is_generating());
        store.cancel_generation();
        store.cancel_generation();
        assert!(!store.is_generating());
        assert!(matches!(store.retry_next(), Err(RotaError::NotRunning)));
        // manual edits still work while idle
        assert!(store.retry_slot(1).is_ok());
    }

    #[test]
    fn test_concurrent_installs_keep_highest_seqnum() {
        let store = store_with_squad(8, 2);
        let schedule = build_schedule(&store.squad(), &store.params()).unwrap();
        let issued: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..50)
                            .map(|_| store.install_schedule(schedule.clone()))
                            .collect::<Vec<u64>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(store.generation_seqnum(), issued.iter().copied().max());
        assert_eq!(store.page(), Page::ReviewSchedule);
    }

    #[test]
    fn test_highlight() {
        let store = Store::new(ScheduleParams::default());
        assert_eq!(store.highlight(), PersonHighlight::Inactive);
        store.set_highlight(7);
        assert_eq!(store.highlight(), PersonHighlight::Active(7));
        store.clear_highlight();
        assert_eq!(store.highlight(), PersonHighlight::Inactive);
    }
}
