pub mod params;
pub mod export;

pub use params::{can_make_schedule, validate_params, ParamsUpdate};
pub use export::export_schedule_to_csv;
