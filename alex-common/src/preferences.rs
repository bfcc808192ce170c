//! User preferences with an explicit load/persist boundary
//!
//! Holds the dark/light theme choice and the saved participant address
//! book. Nothing reads or writes the preferences file except
//! [`PreferencesStore`]; callers pass a loaded [`Preferences`] value around
//! and persist it explicitly after mutating it.

use crate::config::{default_config_dir, write_atomic};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(Error::InvalidInput(format!(
                "Unknown theme {:?} (expected \"dark\" or \"light\")",
                other
            ))),
        }
    }
}

/// Address book entry reused when filling meeting forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedParticipant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Persisted user preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// `None` until the user picks a theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    pub saved_participants: Vec<SavedParticipant>,
}

impl Preferences {
    /// Theme to apply before first render
    pub fn effective_theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    /// Flip dark/light and return the new theme
    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.effective_theme().toggled();
        self.theme = Some(next);
        next
    }

    /// Add a saved participant; requires a name and an email containing `@`
    pub fn add_participant(&mut self, name: &str, email: &str) -> Result<SavedParticipant> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput(
                "Please enter valid name and email".to_string(),
            ));
        }
        let participant = SavedParticipant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.saved_participants.push(participant.clone());
        Ok(participant)
    }

    /// Remove a saved participant by id; returns whether one was removed
    pub fn remove_participant(&mut self, id: Uuid) -> bool {
        let before = self.saved_participants.len();
        self.saved_participants.retain(|p| p.id != id);
        self.saved_participants.len() != before
    }
}

/// Owns the preferences file location
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/alex/preferences.toml`
    pub fn default_location() -> Result<Self> {
        default_config_dir()
            .map(|dir| Self::new(dir.join("preferences.toml")))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences; a missing or unreadable file yields defaults
    pub fn load(&self) -> Preferences {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No preferences file, using defaults");
                return Preferences::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read preferences");
                return Preferences::default();
            }
        };

        match toml::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Invalid preferences file, using defaults"
                );
                Preferences::default()
            }
        }
    }

    /// Persist preferences atomically
    pub fn persist(&self, prefs: &Preferences) -> Result<()> {
        let content = toml::to_string_pretty(prefs)
            .map_err(|e| Error::Config(format!("Serialize preferences failed: {}", e)))?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parse_and_toggle() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn test_toggle_from_unset_goes_dark() {
        let mut prefs = Preferences::default();
        assert_eq!(prefs.effective_theme(), Theme::Light);
        assert_eq!(prefs.toggle_theme(), Theme::Dark);
        assert_eq!(prefs.theme, Some(Theme::Dark));
    }

    #[test]
    fn test_add_participant_validation() {
        let mut prefs = Preferences::default();
        assert!(prefs.add_participant("", "a@x.com").is_err());
        assert!(prefs.add_participant("Ann", "ann.example.com").is_err());
        let id = prefs.add_participant(" Ann ", "ann@example.com").unwrap().id;
        assert_eq!(prefs.saved_participants[0].name, "Ann");
        assert!(prefs.remove_participant(id));
        assert!(!prefs.remove_participant(id));
    }

    #[test]
    fn test_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::new(dir.path().join("nested").join("preferences.toml"));

        assert_eq!(store.load(), Preferences::default());

        let mut prefs = Preferences::default();
        prefs.theme = Some(Theme::Dark);
        prefs.add_participant("Bo", "bo@example.com").unwrap();
        store.persist(&prefs).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("theme = \"dark\""));
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "theme = [").unwrap();
        assert_eq!(PreferencesStore::new(path).load(), Preferences::default());
    }
}
