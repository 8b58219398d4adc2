use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::WordCount;
use crate::words::Room;

/// Word frequency source and local write path.
pub trait CountStore {
    fn counts(&self, room: &Room) -> WordCount;
    fn increment(&mut self, room: &Room, word: &str) -> Result<u32>;
    fn reset(&mut self, room: &Room) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    rooms: BTreeMap<String, WordCount>,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: BTreeMap<String, WordCount>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl CountStore for MemoryStore {
    fn counts(&self, room: &Room) -> WordCount {
        self.rooms.get(room.as_str()).cloned().unwrap_or_default()
    }

    fn increment(&mut self, room: &Room, word: &str) -> Result<u32> {
        Ok(bump(&mut self.rooms, room, word))
    }

    fn reset(&mut self, room: &Room) -> Result<()> {
        self.rooms.remove(room.as_str());
        Ok(())
    }
}

/// Counts persisted as one JSON document. A missing or unreadable file
/// reads as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    rooms: BTreeMap<String, WordCount>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let rooms = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => snapshot.rooms,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "store unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        debug!(path = %path.display(), rooms = rooms.len(), "store opened");
        Self { path, rooms }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let snapshot = Snapshot {
            rooms: self.rooms.clone(),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&snapshot)?)?;
        Ok(())
    }
}

impl CountStore for JsonFileStore {
    fn counts(&self, room: &Room) -> WordCount {
        self.rooms.get(room.as_str()).cloned().unwrap_or_default()
    }

    fn increment(&mut self, room: &Room, word: &str) -> Result<u32> {
        let count = bump(&mut self.rooms, room, word);
        self.flush()?;
        Ok(count)
    }

    fn reset(&mut self, room: &Room) -> Result<()> {
        self.rooms.remove(room.as_str());
        self.flush()
    }
}

fn bump(rooms: &mut BTreeMap<String, WordCount>, room: &Room, word: &str) -> u32 {
    let count = rooms
        .entry(room.as_str().to_string())
        .or_default()
        .entry(word.to_string())
        .or_insert(0);
    *count += 1;
    *count
}

#[cfg(test)]
mod tests {
    use super::*;

    mod memory_store {
        use super::*;

        #[test]
        fn increments_per_room() {
            let mut store = MemoryStore::new();
            let acme = Room::parse("acme");
            assert_eq!(store.increment(&acme, "excited").expect("inc"), 1);
            assert_eq!(store.increment(&acme, "excited").expect("inc"), 2);
            store.increment(&Room::default(), "scared").expect("inc");

            assert_eq!(store.counts(&acme).get("excited"), Some(&2));
            assert_eq!(store.counts(&acme).get("scared"), None);
            assert_eq!(store.counts(&Room::default()).len(), 1);
        }

        #[test]
        fn reset_clears_only_that_room() {
            let mut store = MemoryStore::new();
            let acme = Room::parse("acme");
            store.increment(&acme, "excited").expect("inc");
            store.increment(&Room::default(), "scared").expect("inc");
            store.reset(&acme).expect("reset");
            assert!(store.counts(&acme).is_empty());
            assert!(!store.counts(&Room::default()).is_empty());
        }
    }

    mod json_file_store {
        use super::*;

        #[test]
        fn missing_file_reads_empty() {
            let dir = tempfile::tempdir().expect("tempdir");
            let store = JsonFileStore::open(dir.path().join("counts.json"));
            assert!(store.counts(&Room::default()).is_empty());
        }

        #[test]
        fn persists_across_reopen() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("counts.json");
            {
                let mut store = JsonFileStore::open(&path);
                store.increment(&Room::default(), "curious").expect("inc");
                store.increment(&Room::default(), "curious").expect("inc");
            }
            let store = JsonFileStore::open(&path);
            assert_eq!(store.counts(&Room::default()).get("curious"), Some(&2));
            assert_eq!(store.path(), path.as_path());
        }

        #[test]
        fn corrupt_file_reads_empty() {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("counts.json");
            fs::write(&path, b"{not json").expect("write");
            let store = JsonFileStore::open(&path);
            assert!(store.counts(&Room::default()).is_empty());
        }
    }
}
