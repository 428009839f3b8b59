use std::path::Path;

use csv::WriterBuilder;

use crate::error::Result;
use crate::schedule::{slot_label, PersonId, Schedule};

/// Exports a schedule as CSV
///
/// One row per court per slot (`slot,court,pair1_a,pair1_b,pair2_a,pair2_b`),
/// then one `bench` row per slot listing everyone sitting out in the player
/// columns. Rows may therefore have different lengths.
pub fn export_schedule_to_csv<F>(schedule: &Schedule, name_of: F, csv_path: &Path) -> Result<()>
where
    F: Fn(PersonId) -> String,
{
    let mut wtr = WriterBuilder::new().flexible(true).from_path(csv_path)?;

    wtr.write_record(["slot", "court", "pair1_a", "pair1_b", "pair2_a", "pair2_b"])?;

    for (i_slot, slot) in schedule.time_slots.iter().enumerate() {
        let label = slot_label(i_slot);
        for (i_court, court) in slot.court_allocations.iter().enumerate() {
            let [[a, b], [c, d]] = *court;
            wtr.write_record([
                label.clone(),
                (i_court + 1).to_string(),
                name_of(a),
                name_of(b),
                name_of(c),
                name_of(d),
            ])?;
        }
        if !slot.bench.is_empty() {
            let mut row = vec![label, "bench".to_string()];
            row.extend(slot.bench.iter().map(|&p| name_of(p)));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    log::debug!("exported {} slots to {}", schedule.n_slots(), csv_path.display());
    Ok(())
}
