use serde::Deserialize;

use crate::schedule::{ScheduleParams, PLAYERS_PER_COURT};

/// Partial params update from the CLI or the HTTP API; absent fields keep
/// their current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamsUpdate {
    pub n_courts: Option<usize>,
    pub n_slots: Option<usize>,
    pub display_title: Option<String>,
}

impl ParamsUpdate {
    pub fn is_empty(&self) -> bool {
        self.n_courts.is_none() && self.n_slots.is_none() && self.display_title.is_none()
    }

    /// Returns `current` with the update applied
    pub fn applied_to(&self, current: &ScheduleParams) -> ScheduleParams {
        ScheduleParams {
            n_courts: self.n_courts.unwrap_or(current.n_courts),
            n_slots: self.n_slots.unwrap_or(current.n_slots),
            display_title: self
                .display_title
                .as_ref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| current.display_title.clone()),
        }
    }
}

/// Validates a complete set of params
pub fn validate_params(params: &ScheduleParams) -> Result<(), String> {
    if params.n_courts == 0 {
        return Err("Number of courts must be at least 1".to_string());
    }
    if params.n_slots == 0 {
        return Err("Number of games must be at least 1".to_string());
    }
    if params.display_title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    Ok(())
}

/// Checks whether a squad of `squad_size` can fill every court
pub fn can_make_schedule(squad_size: usize, params: &ScheduleParams) -> Result<(), String> {
    validate_params(params)?;
    let needed = params.n_courts * PLAYERS_PER_COURT;
    if squad_size < needed {
        let courts = if params.n_courts == 1 { "court" } else { "courts" };
        return Err(format!(
            "Need at least {} people for {} {} (squad has {})",
            needed, params.n_courts, courts, squad_size
        ));
    }
    Ok(())
}
