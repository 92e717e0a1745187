//! Recorded section narration stored in SQLite.
//!
//! One row per `(story_id, section_index)`; saving a retake replaces the row.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::OptionalExtension;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

/// A narrated section and where its audio lives.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingEntry {
    pub story_id: u32,
    pub index: u32,
    pub audio_path: PathBuf,
    pub duration_ms: f64,
    pub recorded_at: DateTime<Local>,
}

impl RecordingEntry {
    pub fn new(story_id: u32, index: u32, audio_path: PathBuf, duration_ms: f64) -> Self {
        Self {
            story_id,
            index,
            audio_path,
            duration_ms,
            recorded_at: Local::now(),
        }
    }
}

/// Manages the recordings database.
pub struct RecordingStore {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl RecordingStore {
    /// Creates a store backed by `recordings.db` in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            database_path: data_dir.join("recordings.db"),
            connection: None,
        }
    }

    /// Opens the connection and creates the table on first use.
    fn get_connection(&mut self) -> Result<&Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = Connection::open(&self.database_path)?;
                connection.execute(
                    "CREATE TABLE IF NOT EXISTS recordings (
                        story_id INTEGER NOT NULL,
                        section_index INTEGER NOT NULL,
                        audio_path TEXT NOT NULL,
                        duration_ms REAL NOT NULL,
                        recorded_at TEXT NOT NULL,
                        PRIMARY KEY (story_id, section_index)
                    )",
                    [],
                )?;
                tracing::debug!("Recording store opened at {}", self.database_path.display());
                connection
            }
        };

        Ok(self.connection.insert(connection))
    }

    /// Saves or replaces the recording for a section.
    pub fn set_recording(&mut self, entry: &RecordingEntry) -> Result<()> {
        let connection = self.get_connection()?;
        connection.execute(
            "INSERT INTO recordings (story_id, section_index, audio_path, duration_ms, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(story_id, section_index) DO UPDATE SET
                audio_path = excluded.audio_path,
                duration_ms = excluded.duration_ms,
                recorded_at = excluded.recorded_at",
            params![
                entry.story_id,
                entry.index,
                entry.audio_path.to_string_lossy().into_owned(),
                entry.duration_ms,
                entry.recorded_at.to_rfc3339(),
            ],
        )?;
        tracing::debug!(
            "Recording saved for {}:{} ({:.0}ms)",
            entry.story_id,
            entry.index,
            entry.duration_ms
        );
        Ok(())
    }

    pub fn get_recording(&mut self, story_id: u32, index: u32) -> Result<Option<RecordingEntry>> {
        let connection = self.get_connection()?;
        let entry = connection
            .query_row(
                "SELECT story_id, section_index, audio_path, duration_ms, recorded_at
                 FROM recordings WHERE story_id = ?1 AND section_index = ?2",
                params![story_id, index],
                read_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// All recordings of a story, ordered by section index.
    pub fn recordings_for_story(&mut self, story_id: u32) -> Result<Vec<RecordingEntry>> {
        let connection = self.get_connection()?;
        let mut statement = connection.prepare(
            "SELECT story_id, section_index, audio_path, duration_ms, recorded_at
             FROM recordings WHERE story_id = ?1 ORDER BY section_index ASC",
        )?;
        let entries = statement
            .query_map(params![story_id], read_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Forgets a section's recording. Returns whether a row existed.
    pub fn remove_recording(&mut self, story_id: u32, index: u32) -> Result<bool> {
        let connection = self.get_connection()?;
        let removed = connection.execute(
            "DELETE FROM recordings WHERE story_id = ?1 AND section_index = ?2",
            params![story_id, index],
        )?;
        Ok(removed > 0)
    }
}

fn read_entry(row: &Row<'_>) -> rusqlite::Result<RecordingEntry> {
    let timestamp_str = row.get::<_, String>(4)?;
    let recorded_at = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| rusqlite::Error::InvalidParameterName("Invalid timestamp format".to_string()))?;

    Ok(RecordingEntry {
        story_id: row.get(0)?,
        index: row.get(1)?,
        audio_path: PathBuf::from(row.get::<_, String>(2)?),
        duration_ms: row.get(3)?,
        recorded_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RecordingStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn saves_and_reads_back() {
        let (_dir, mut store) = store();
        let entry = RecordingEntry::new(32, 1, PathBuf::from("/r/obs-en-32-01.m4a"), 5000.0);
        store.set_recording(&entry).unwrap();

        let loaded = store.get_recording(32, 1).unwrap().unwrap();
        assert_eq!(loaded.audio_path, entry.audio_path);
        assert_eq!(loaded.duration_ms, 5000.0);
        assert!(store.get_recording(32, 2).unwrap().is_none());
    }

    #[test]
    fn retake_replaces_existing_row() {
        let (_dir, mut store) = store();
        store
            .set_recording(&RecordingEntry::new(1, 1, PathBuf::from("a.m4a"), 1000.0))
            .unwrap();
        store
            .set_recording(&RecordingEntry::new(1, 1, PathBuf::from("b.m4a"), 2500.0))
            .unwrap();

        let all = store.recordings_for_story(1).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].audio_path, PathBuf::from("b.m4a"));
        assert_eq!(all[0].duration_ms, 2500.0);
    }

    #[test]
    fn story_recordings_are_sorted_and_filtered() {
        let (_dir, mut store) = store();
        for (story, index) in [(5, 3), (5, 1), (6, 1), (5, 2)] {
            store
                .set_recording(&RecordingEntry::new(story, index, PathBuf::from("x"), 100.0))
                .unwrap();
        }
        let indices: Vec<u32> = store
            .recordings_for_story(5)
            .unwrap()
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn remove_reports_whether_a_row_existed() {
        let (_dir, mut store) = store();
        store
            .set_recording(&RecordingEntry::new(2, 4, PathBuf::from("x"), 1.0))
            .unwrap();
        assert!(store.remove_recording(2, 4).unwrap());
        assert!(!store.remove_recording(2, 4).unwrap());
    }

    #[test]
    fn persists_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        RecordingStore::new(dir.path())
            .set_recording(&RecordingEntry::new(9, 9, PathBuf::from("keep.m4a"), 42.0))
            .unwrap();
        let mut reopened = RecordingStore::new(dir.path());
        assert!(reopened.get_recording(9, 9).unwrap().is_some());
    }
}
