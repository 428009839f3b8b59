//! Pool of people and saved schedule parameters, persisted as one JSON file.

pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotaError};
use crate::schedule::{PersonId, ScheduleParams};

pub use parser::{import_roster_csv, RosterEntry};

/// Someone who can be picked for a squad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMember {
    pub id: PersonId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct PoolDocument {
    next_id: PersonId,
    members: Vec<PoolMember>,
    params: ScheduleParams,
}

impl Default for PoolDocument {
    fn default() -> Self {
        Self {
            next_id: 1,
            members: Vec::new(),
            params: ScheduleParams::default(),
        }
    }
}

/// The pool document together with where it lives on disk
#[derive(Debug, Clone)]
pub struct PoolFile {
    path: PathBuf,
    doc: PoolDocument,
}

fn checked_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RotaError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

impl PoolFile {
    /// Loads the pool at `path`; a missing file gives an empty pool
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let doc: PoolDocument = serde_json::from_str(&content)?;
            log::debug!("loaded {} pool members from {}", doc.members.len(), path.display());
            doc
        } else {
            log::info!("no pool file at {}, starting empty", path.display());
            PoolDocument::default()
        };
        Ok(Self { path, doc })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.doc)?)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn members(&self) -> &[PoolMember] {
        &self.doc.members
    }

    pub fn member(&self, id: PersonId) -> Option<&PoolMember> {
        self.doc.members.iter().find(|m| m.id == id)
    }

    pub fn ids(&self) -> Vec<PersonId> {
        self.doc.members.iter().map(|m| m.id).collect()
    }

    /// Name of `id`, or `#id` for someone no longer in the pool
    pub fn display_name(&self, id: PersonId) -> String {
        self.member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("#{}", id))
    }

    /// Adds a member under a fresh id; ids are never reused
    pub fn add_member(&mut self, name: &str) -> Result<PersonId> {
        let name = checked_name(name)?;
        let id = self.doc.next_id;
        self.doc.next_id += 1;
        self.doc.members.push(PoolMember { id, name });
        Ok(id)
    }

    pub fn edit_member_name(&mut self, id: PersonId, new_name: &str) -> Result<()> {
        let name = checked_name(new_name)?;
        let member = self
            .doc
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RotaError::PersonNotFound(id))?;
        member.name = name;
        Ok(())
    }

    /// Removes a member; returns whether anyone was removed
    pub fn delete_member(&mut self, id: PersonId) -> bool {
        let before = self.doc.members.len();
        self.doc.members.retain(|m| m.id != id);
        self.doc.members.len() != before
    }

    /// Adds every imported entry that is not already in the pool by name.
    /// Returns the ids of the people added.
    pub fn import(&mut self, entries: &[RosterEntry]) -> Result<Vec<PersonId>> {
        let mut added = Vec::new();
        for entry in entries {
            let exists = self
                .doc
                .members
                .iter()
                .any(|m| m.name.eq_ignore_ascii_case(entry.name.trim()));
            if !exists {
                added.push(self.add_member(&entry.name)?);
            }
        }
        Ok(added)
    }

    pub fn params(&self) -> &ScheduleParams {
        &self.doc.params
    }

    pub fn set_params(&mut self, params: ScheduleParams) {
        self.doc.params = params;
    }

    pub fn set_n_courts(&mut self, n_courts: usize) {
        self.doc.params.n_courts = n_courts;
    }

    pub fn set_n_slots(&mut self, n_slots: usize) {
        self.doc.params.n_slots = n_slots;
    }

    pub fn set_display_title(&mut self, title: &str) {
        self.doc.params.display_title = title.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_pool() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let pool = PoolFile::load(temp_dir.path().join("pool.json"))?;
        assert!(pool.members().is_empty());
        assert_eq!(pool.params(), &ScheduleParams::default());
        Ok(())
    }

    #[test]
    fn test_members_persist() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("pool.json");

        {
            let mut pool = PoolFile::load(&path)?;
            assert_eq!(pool.add_member("  Alice ")?, 1);
            assert_eq!(pool.add_member("Bob")?, 2);
            pool.set_n_courts(2);
            pool.set_display_title("Tuesday club");
            pool.save()?;
        }

        let pool = PoolFile::load(&path)?;
        assert_eq!(pool.ids(), vec![1, 2]);
        assert_eq!(pool.display_name(1), "Alice");
        assert_eq!(pool.params().n_courts, 2);
        assert_eq!(pool.params().display_title, "Tuesday club");
        Ok(())
    }

    #[test]
    fn test_ids_are_not_reused() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut pool = PoolFile::load(temp_dir.path().join("pool.json"))?;
        let a = pool.add_member("A")?;
        assert!(pool.delete_member(a));
        assert!(!pool.delete_member(a));
        let b = pool.add_member("B")?;
        assert_ne!(a, b);
        assert_eq!(pool.display_name(a), format!("#{}", a));
        Ok(())
    }

    #[test]
    fn test_edit_and_validate_names() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut pool = PoolFile::load(temp_dir.path().join("pool.json"))?;
        let id = pool.add_member("Carol")?;
        pool.edit_member_name(id, "Caroline")?;
        assert_eq!(pool.display_name(id), "Caroline");
        assert!(matches!(pool.add_member("   "), Err(RotaError::InvalidName(_))));
        assert!(matches!(pool.edit_member_name(99, "X"), Err(RotaError::PersonNotFound(99))));
        Ok(())
    }

    #[test]
    fn test_import_skips_known_names() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut pool = PoolFile::load(temp_dir.path().join("pool.json"))?;
        pool.add_member("Dana")?;
        let entries = vec![
            RosterEntry { name: "dana".into() },
            RosterEntry { name: "Eve".into() },
        ];
        let added = pool.import(&entries)?;
        assert_eq!(added.len(), 1);
        assert_eq!(pool.members().len(), 2);
        Ok(())
    }
}
