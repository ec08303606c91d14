use crate::error::StoreError;
use crate::history::{GameRecord, WinCounts};
use crate::save::SavedGame;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SAVE_FILE: &str = "saved_game.json";
const HISTORY_FILE: &str = "history.json";
const WINS_FILE: &str = "wins.json";

/// JSON files in one directory: the autosave, the game history and the win table.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Store {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Write through a temp file so a crash never leaves half a record behind.
    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.path(file);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "stored");
        Ok(())
    }

    /// `Ok(None)` if the file is absent. A file that does not parse is deleted
    /// and reported as absent.
    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable file");
                self.remove(file)?;
                Ok(None)
            }
        }
    }

    fn remove(&self, file: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(file)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_game(&self, saved: &SavedGame) -> Result<(), StoreError> {
        self.write_json(SAVE_FILE, saved)
    }

    pub fn load_game(&self) -> Result<Option<SavedGame>, StoreError> {
        self.read_json(SAVE_FILE)
    }

    pub fn has_saved_game(&self) -> bool {
        self.path(SAVE_FILE).is_file()
    }

    pub fn clear_saved_game(&self) -> Result<(), StoreError> {
        self.remove(SAVE_FILE)
    }

    /// Finished games, oldest first.
    pub fn history(&self) -> Result<Vec<GameRecord>, StoreError> {
        Ok(self.read_json(HISTORY_FILE)?.unwrap_or_default())
    }

    pub fn append_history(&self, record: GameRecord) -> Result<(), StoreError> {
        let mut history = self.history()?;
        history.push(record);
        self.write_json(HISTORY_FILE, &history)
    }

    pub fn win_counts(&self) -> Result<WinCounts, StoreError> {
        Ok(self.read_json(WINS_FILE)?.unwrap_or_default())
    }

    pub fn record_win(&self, name: &str) -> Result<(), StoreError> {
        let mut wins = self.win_counts()?;
        wins.record_win(name);
        self.write_json(WINS_FILE, &wins)
    }
}
