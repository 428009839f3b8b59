use std::fmt;
use serde::{Serialize, Deserialize};
use crate::error::{Result, RotaError};

/// Identifies a pool member; stable for the lifetime of the pool
pub type PersonId = u32;

/// A doubles team; seat order is kept as generated (or as edited)
pub type Pair = [PersonId; 2];

/// The two pairs facing each other on one court
pub type CourtAllocation = [Pair; 2];

pub const PAIRS_PER_COURT: usize = 2;
pub const PLAYERS_PER_PAIR: usize = 2;
pub const PLAYERS_PER_COURT: usize = PAIRS_PER_COURT * PLAYERS_PER_PAIR;

/// Who plays on which court, and who sits out, during one time slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotAllocation {
    pub court_allocations: Vec<CourtAllocation>,
    pub bench: Vec<PersonId>,
}

impl TimeSlotAllocation {
    /// Every pair on every court, in court order
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> + '_ {
        self.court_allocations.iter().flat_map(|court| court.iter())
    }

    /// Everyone on a court this slot
    pub fn players(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.pairs().flat_map(|pair| pair.iter().copied())
    }

    /// Sorted list of everyone taking part in this slot, playing or benched
    pub fn squad(&self) -> Vec<PersonId> {
        let mut squad: Vec<PersonId> = self.players().collect();
        squad.extend(self.bench.iter().copied());
        squad.sort_unstable();
        squad
    }
}

/// A complete rota: a fixed number of courts and one allocation per slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub n_courts: usize,
    pub time_slots: Vec<TimeSlotAllocation>,
}

impl Schedule {
    pub fn n_slots(&self) -> usize {
        self.time_slots.len()
    }

    /// Borrow one slot, failing on a bad index
    pub fn slot(&self, i_slot: usize) -> Result<&TimeSlotAllocation> {
        self.time_slots.get(i_slot).ok_or(RotaError::SlotOutOfRange {
            index: i_slot,
            n_slots: self.time_slots.len(),
        })
    }

    /// The sorted squad shared by every slot.
    ///
    /// Fails with `InconsistentSquads` if any two slots disagree, or if a
    /// slot lists someone twice. An empty schedule has an empty squad.
    pub fn squad(&self) -> Result<Vec<PersonId>> {
        let Some(first) = self.time_slots.first() else {
            return Ok(Vec::new());
        };
        let squad = first.squad();
        if squad.windows(2).any(|w| w[0] == w[1]) {
            return Err(RotaError::InconsistentSquads);
        }
        for slot in &self.time_slots[1..] {
            if slot.squad() != squad {
                return Err(RotaError::InconsistentSquads);
            }
        }
        Ok(squad)
    }
}

/// Order-independent identity of a pair, displayed as `"low+high"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PairKey(PersonId, PersonId);

impl PairKey {
    pub fn new(a: PersonId, b: PersonId) -> Self {
        if a <= b { PairKey(a, b) } else { PairKey(b, a) }
    }

    pub fn ids(&self) -> (PersonId, PersonId) {
        (self.0, self.1)
    }
}

/// Canonical key of a pair, used to spot repeated partnerships
pub fn pair_key(pair: &Pair) -> PairKey {
    PairKey::new(pair[0], pair[1])
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.0, self.1)
    }
}

impl From<PairKey> for String {
    fn from(key: PairKey) -> String {
        key.to_string()
    }
}

impl TryFrom<String> for PairKey {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let (a, b) = s.split_once('+').ok_or_else(|| format!("bad pair key {:?}", s))?;
        let a: PersonId = a.trim().parse().map_err(|_| format!("bad pair key {:?}", s))?;
        let b: PersonId = b.trim().parse().map_err(|_| format!("bad pair key {:?}", s))?;
        Ok(PairKey::new(a, b))
    }
}

/// Where a person sits within one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PersonPath {
    Playing { court: usize, pair: usize, seat: usize },
    Bench { index: usize },
}

impl PersonPath {
    pub fn is_playing(&self) -> bool {
        matches!(self, PersonPath::Playing { .. })
    }
}

/// Parameters an operator chooses before generating a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    pub n_courts: usize,
    pub n_slots: usize,
    pub display_title: String,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            n_courts: 4,
            n_slots: 8,
            display_title: "Court allocation".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(courts: Vec<CourtAllocation>, bench: Vec<PersonId>) -> TimeSlotAllocation {
        TimeSlotAllocation { court_allocations: courts, bench }
    }

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(pair_key(&[2, 1]), pair_key(&[1, 2]));
        assert_eq!(pair_key(&[12, 3]).to_string(), "3+12");
    }

    #[test]
    fn test_pair_key_serializes_as_string() {
        let json = serde_json::to_string(&PairKey::new(9, 4)).unwrap();
        assert_eq!(json, "\"4+9\"");
        let back: PairKey = serde_json::from_str("\"9+4\"").unwrap();
        assert_eq!(back.ids(), (4, 9));
        assert!(serde_json::from_str::<PairKey>("\"nine\"").is_err());
    }

    #[test]
    fn test_slot_squad_includes_bench() {
        let s = slot(vec![[[5, 1], [3, 2]]], vec![4]);
        assert_eq!(s.squad(), vec![1, 2, 3, 4, 5]);
        assert_eq!(s.players().collect::<Vec<_>>(), vec![5, 1, 3, 2]);
    }

    #[test]
    fn test_squad_of_schedule_detects_mismatch() {
        let good = Schedule {
            n_courts: 1,
            time_slots: vec![
                slot(vec![[[1, 2], [3, 4]]], vec![5]),
                slot(vec![[[5, 2], [3, 1]]], vec![4]),
            ],
        };
        assert_eq!(good.squad().unwrap(), vec![1, 2, 3, 4, 5]);

        let bad = Schedule {
            n_courts: 1,
            time_slots: vec![
                slot(vec![[[1, 2], [3, 4]]], vec![5]),
                slot(vec![[[1, 2], [3, 4]]], vec![6]),
            ],
        };
        assert!(matches!(bad.squad(), Err(RotaError::InconsistentSquads)));
    }

    #[test]
    fn test_squad_rejects_person_listed_twice() {
        let bad = Schedule {
            n_courts: 1,
            time_slots: vec![slot(vec![[[1, 2], [3, 4]]], vec![1])],
        };
        assert!(matches!(bad.squad(), Err(RotaError::InconsistentSquads)));
    }

    #[test]
    fn test_slot_out_of_range() {
        let schedule = Schedule { n_courts: 1, time_slots: vec![] };
        assert!(matches!(
            schedule.slot(0),
            Err(RotaError::SlotOutOfRange { index: 0, n_slots: 0 })
        ));
        assert!(schedule.squad().unwrap().is_empty());
    }

    #[test]
    fn test_default_params() {
        let params: ScheduleParams = serde_json::from_str("{\"n_courts\": 2}").unwrap();
        assert_eq!(params.n_courts, 2);
        assert_eq!(params.n_slots, 8);
        assert_eq!(params.display_title, "Court allocation");
    }
}
