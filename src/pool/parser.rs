use csv::Reader;
use std::collections::HashMap;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// One person read from a roster CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
}

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1" || lower == "y"
}

/// Loads a roster from a CSV file with a header row
///
/// The name column is the first header containing "name" (any case), or
/// column 0 if there is none. An optional column whose header contains
/// "active" drops rows marked as anything but yes/true/1. Rows with a blank
/// name are skipped, and a repeated name (ignoring case) replaces the
/// earlier row so the file order of the last mention wins.
pub fn import_roster_csv<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RosterEntry>> {
    let mut reader = Reader::from_path(csv_path)?;

    let headers = reader.headers()?.clone();
    let name_col = headers
        .iter()
        .position(|h| h.to_lowercase().contains("name"))
        .unwrap_or(0);
    let active_col = headers
        .iter()
        .position(|h| h.to_lowercase().contains("active"));

    // Track entries by lowercased name so repeats replace earlier rows
    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<Option<RosterEntry>> = Vec::new();

    for result in reader.records() {
        let record = result?;

        let name = record.get(name_col).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let key = name.to_lowercase();

        let active = active_col
            .map(|col| parse_bool(record.get(col).unwrap_or("")))
            .unwrap_or(true);

        // A later row for the same person supersedes the earlier one
        if let Some(&i) = index_by_name.get(&key) {
            entries[i] = None;
        }
        if active {
            index_by_name.insert(key, entries.len());
            entries.push(Some(RosterEntry { name }));
        } else {
            index_by_name.remove(&key);
        }
    }

    let entries: Vec<RosterEntry> = entries.into_iter().flatten().collect();
    log::debug!("read {} roster entries", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(entries: &[RosterEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(" Yes "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_import_by_name_column() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("roster.csv");
        fs::write(&path, "id,Player Name,phone\n1,Alice,555\n2,  ,556\n3,Bob,557\n")?;
        let entries = import_roster_csv(&path)?;
        assert_eq!(names(&entries), vec!["Alice", "Bob"]);
        Ok(())
    }

    #[test]
    fn test_later_rows_win() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("roster.csv");
        fs::write(
            &path,
            "name,active\nAlice,yes\nBob,yes\nalice,no\nCarol,yes\nBOB,yes\n",
        )?;
        let entries = import_roster_csv(&path)?;
        assert_eq!(names(&entries), vec!["Carol", "BOB"]);
        Ok(())
    }

    #[test]
    fn test_falls_back_to_first_column() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("roster.csv");
        fs::write(&path, "who\nDana\nEve\n")?;
        assert_eq!(names(&import_roster_csv(&path)?), vec!["Dana", "Eve"]);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(import_roster_csv("/definitely/not/here.csv").is_err());
    }
}
