use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;

use crate::error::Result;
use crate::schedule::{slot_label, CourtAllocation, PersonId, Schedule, SittingOutSubKind, Violations};

/// Formats one court as `A & B vs C & D`
pub fn format_court<F>(court: &CourtAllocation, name_of: &F) -> String
where
    F: Fn(PersonId) -> String,
{
    let [[a, b], [c, d]] = *court;
    format!("{} & {} vs {} & {}", name_of(a), name_of(b), name_of(c), name_of(d))
}

/// Renders the print layout: the title, then one block per slot with a line
/// per court and the people sitting out
pub fn format_schedule<F>(schedule: &Schedule, title: &str, name_of: F) -> String
where
    F: Fn(PersonId) -> String,
{
    let mut out = String::new();
    let _ = writeln!(out, "** {} **", title);

    for (i_slot, slot) in schedule.time_slots.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", slot_label(i_slot));
        for (i_court, court) in slot.court_allocations.iter().enumerate() {
            let _ = writeln!(out, "  Court {}: {}", i_court + 1, format_court(court, &name_of));
        }
        if !slot.bench.is_empty() {
            let names: Vec<String> = slot.bench.iter().map(|&p| name_of(p)).collect();
            let _ = writeln!(out, "  Sitting out: {}", names.join(", "));
        }
    }
    out
}

/// Writes the print layout to `path`, stamped with the current local time
pub fn write_schedule_to_file<F, P>(schedule: &Schedule, title: &str, name_of: F, path: P) -> Result<()>
where
    F: Fn(PersonId) -> String,
    P: AsRef<Path>,
{
    let mut file = File::create(path)?;
    writeln!(file, "Generated {}", Local::now().format("%Y-%m-%d %H:%M"))?;
    write!(file, "{}", format_schedule(schedule, title, name_of))?;
    Ok(())
}

/// Prints a schedule followed by whatever violations remain
pub fn print_schedule<F>(schedule: &Schedule, title: &str, violations: &Violations, name_of: F)
where
    F: Fn(PersonId) -> String,
{
    println!("\n{}", format_schedule(schedule, title, &name_of));

    if violations.is_empty() {
        println!("No violations.");
        return;
    }
    for v in &violations.no_duplicate_pairs {
        let (a, b) = v.pair_key.ids();
        println!("⚠️  {} and {} are paired more than once", name_of(a), name_of(b));
    }
    for v in &violations.sitting_out_fairness {
        let how = match v.sub_kind {
            SittingOutSubKind::TooFew => "too rarely",
            SittingOutSubKind::TooMany => "too often",
        };
        println!("⚠️  {} sits out {}", name_of(v.person_id), how);
    }
}
