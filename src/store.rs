//! Local persistence for the two board records.
//!
//! Each record is read once at startup and rewritten wholesale after every
//! change. Read failures degrade to the built-in defaults; nothing here is
//! allowed to stop the board from starting.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::background::BackgroundSettings;
use crate::core::subject::SubjectEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {record}: {source}")]
    Encode {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub trait SettingsRepository {
    /// Stored background settings, or `None` if absent or unreadable.
    fn load_background(&self) -> Option<BackgroundSettings>;
    fn save_background(&self, settings: &BackgroundSettings) -> Result<(), StoreError>;
    /// Stored subject list, or `None` if absent or unreadable.
    fn load_subjects(&self) -> Option<Vec<SubjectEntry>>;
    fn save_subjects(&self, subjects: &[SubjectEntry]) -> Result<(), StoreError>;
}

/// Background settings from `repo`, falling back to the default when the record is invalid.
pub fn load_background_or_default(repo: &dyn SettingsRepository) -> BackgroundSettings {
    match repo.load_background() {
        Some(settings) if settings.is_valid() => settings,
        Some(settings) => {
            log::warn!(
                "Stored background settings for mode {:?} have no image, using default",
                settings.mode
            );
            BackgroundSettings::default()
        }
        None => BackgroundSettings::default(),
    }
}

/// JSON files in the board's data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    background_path: PathBuf,
    subjects_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(background_path: PathBuf, subjects_path: PathBuf) -> Self {
        Self {
            background_path,
            subjects_path,
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::error!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    record: &'static str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| StoreError::Encode { record, source })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl SettingsRepository for JsonFileStore {
    fn load_background(&self) -> Option<BackgroundSettings> {
        read_json(&self.background_path)
    }

    fn save_background(&self, settings: &BackgroundSettings) -> Result<(), StoreError> {
        write_json(&self.background_path, "background settings", settings)
    }

    fn load_subjects(&self) -> Option<Vec<SubjectEntry>> {
        read_json(&self.subjects_path)
    }

    fn save_subjects(&self, subjects: &[SubjectEntry]) -> Result<(), StoreError> {
        write_json(&self.subjects_path, "subjects", subjects)
    }
}

/// In-process store, used where no files should be touched.
#[derive(Debug, Default)]
pub struct MemoryStore {
    background: RefCell<Option<BackgroundSettings>>,
    subjects: RefCell<Option<Vec<SubjectEntry>>>,
}

impl SettingsRepository for MemoryStore {
    fn load_background(&self) -> Option<BackgroundSettings> {
        self.background.borrow().clone()
    }

    fn save_background(&self, settings: &BackgroundSettings) -> Result<(), StoreError> {
        *self.background.borrow_mut() = Some(settings.clone());
        Ok(())
    }

    fn load_subjects(&self) -> Option<Vec<SubjectEntry>> {
        self.subjects.borrow().clone()
    }

    fn save_subjects(&self, subjects: &[SubjectEntry]) -> Result<(), StoreError> {
        *self.subjects.borrow_mut() = Some(subjects.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> JsonFileStore {
        JsonFileStore::new(dir.join("background.json"), dir.join("subjects.json"))
    }
    use crate::core::background::BackgroundMode;
    use crate::core::subject::{SubjectBoard, default_subjects};

    #[test]
    fn missing_files_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.load_background().is_none());
        assert!(store.load_subjects().is_none());
        assert_eq!(load_background_or_default(&store), BackgroundSettings::default());
    }

    #[test]
    fn records_are_written_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir.path().join("nested"));

        let settings = BackgroundSettings::custom("data:image/png;base64,AAAA".into());
        store.save_background(&settings).unwrap();
        assert_eq!(store.load_background(), Some(settings));

        store.save_background(&BackgroundSettings::default()).unwrap();
        assert_eq!(store.load_background(), Some(BackgroundSettings::default()));
    }

    #[test]
    fn corrupt_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("background.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("subjects.json"), "[1, 2, 3]").unwrap();
        let store = store_in(dir.path());

        assert_eq!(load_background_or_default(&store), BackgroundSettings::default());
        assert!(store.load_subjects().is_none());
    }

    #[test]
    fn invalid_settings_are_replaced() {
        let store = MemoryStore::default();
        store
            .save_background(&BackgroundSettings {
                mode: BackgroundMode::Custom,
                image_reference: None,
                last_refreshed_at: None,
            })
            .unwrap();
        assert_eq!(load_background_or_default(&store), BackgroundSettings::default());
    }

    #[test]
    fn saved_subject_list_round_trips_through_board() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let mut board = SubjectBoard::default();
        let saved = board.save(2, "foo".into()).unwrap();
        store.save_subjects(saved).unwrap();

        let reloaded = SubjectBoard::new(store.load_subjects().unwrap());
        assert_eq!(reloaded.entries()[2].task, "foo");
        assert_eq!(reloaded.entries()[3], default_subjects()[3]);
    }

    #[test]
    fn reads_hand_written_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("background.json"),
            r#"{"mode":"daily-remote","image_reference":"https://example.com/img","last_refreshed_at":"2026-03-09T08:00:00+08:00"}"#,
        )
        .unwrap();
        let store = store_in(dir.path());
        let settings = store.load_background().unwrap();
        assert_eq!(settings.mode, BackgroundMode::DailyRemote);
        assert!(settings.last_refreshed_at.is_some());
    }
}
