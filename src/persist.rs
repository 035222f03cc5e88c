//! Team and stats cache, saved as JSON between runs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::PersistError;
use crate::state::{AppState, EntityRef};
use crate::stats::{StatsCache, StatsRecord};
use crate::team::Team;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub team: Vec<EntityRef>,
    #[serde(default)]
    pub stats: BTreeMap<u16, StatsRecord>,
}

impl Session {
    pub fn capture(state: &AppState) -> Self {
        Self {
            team: state.team.members().to_vec(),
            stats: state.stats.records().clone(),
        }
    }

    /// Fresh state seeded with this session's team and stats.
    pub fn into_state(self) -> AppState {
        let (team, dropped) = Team::rehydrate(self.team);
        if dropped > 0 {
            tracing::warn!(dropped, "session team had duplicate or overflow members");
        }
        AppState {
            team,
            stats: StatsCache::from_records(self.stats),
            ..AppState::default()
        }
    }
}

/// Owns the session file and orders writes to it.
///
/// Tickets are taken in dispatch order. A write holding an older ticket than
/// the last one on disk is skipped.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    issued: AtomicU64,
    written: Mutex<u64>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            issued: AtomicU64::new(0),
            written: Mutex::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn next_ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// `Ok(false)` when a newer snapshot already reached the file.
    pub async fn save(&self, ticket: u64, session: &Session) -> Result<bool, PersistError> {
        let mut written = self.written.lock().await;
        if ticket <= *written {
            tracing::debug!(ticket, latest = *written, "skipping superseded session save");
            return Ok(false);
        }
        write_atomic(&self.path, ticket, session).await?;
        *written = ticket;
        Ok(true)
    }

    pub async fn load(&self) -> Result<Option<Session>, PersistError> {
        load_session(&self.path).await
    }
}

pub async fn save_session(path: &Path, session: &Session) -> Result<(), PersistError> {
    write_atomic(path, 0, session).await
}

/// Writes a sibling temp file, then renames it over `path`.
async fn write_atomic(path: &Path, ticket: u64, session: &Session) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    let json = serde_json::to_string_pretty(session).map_err(|source| PersistError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(format!(".{}-{ticket}.tmp", std::process::id()));
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|source| PersistError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    if let Err(source) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(PersistError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// `Ok(None)` when no session has been saved yet.
pub async fn load_session(path: &Path) -> Result<Option<Session>, PersistError> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|source| PersistError::Format {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("poketeam-persist-{}-{name}", std::process::id()))
            .join("session.json")
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let path = scratch_path("roundtrip");
        let mut stats = BTreeMap::new();
        stats.insert(25, StatsRecord::from([("hp".to_string(), 35)]));
        let session = Session {
            team: vec![
                EntityRef::from_catalog(25, "pikachu"),
                EntityRef::from_catalog(1, "bulbasaur"),
            ],
            stats,
        };

        save_session(&path, &session).await.unwrap();
        let loaded = load_session(&path).await.unwrap();
        assert_eq!(loaded, Some(session));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let path = scratch_path("missing");
        assert_eq!(load_session(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_format_error() {
        let path = scratch_path("corrupt");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = load_session(&path).await.unwrap_err();
        assert!(matches!(err, PersistError::Format { .. }));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    fn team_of(ids: &[u16]) -> Session {
        Session {
            team: ids
                .iter()
                .map(|id| EntityRef::from_catalog(*id, format!("mon{id}")))
                .collect(),
            stats: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_older_ticket_never_overwrites_newer() {
        let path = scratch_path("ordering");
        let store = SessionStore::new(&path);
        let older = store.next_ticket();
        let newer = store.next_ticket();

        assert!(store.save(newer, &team_of(&[2])).await.unwrap());
        assert!(!store.save(older, &team_of(&[1])).await.unwrap());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.team[0].id, 2);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_aborted_save_leaves_newer_snapshot_intact() {
        let path = scratch_path("aborted");
        let store = std::sync::Arc::new(SessionStore::new(&path));

        let mut big = team_of(&[1]);
        for id in 0..40_000u16 {
            big.stats
                .insert(id, StatsRecord::from([("hp".to_string(), id)]));
        }
        let first = store.next_ticket();
        let slow = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.save(first, &big).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        slow.abort();

        let second = store.next_ticket();
        assert!(store.save(second, &team_of(&[2])).await.unwrap());
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.team.len(), 1);
        assert_eq!(loaded.team[0].id, 2);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[test]
    fn test_stats_field_optional() {
        let session: Session = serde_json::from_str(r#"{"team":[]}"#).unwrap();
        assert!(session.stats.is_empty());
    }

    #[test]
    fn test_into_state_rehydrates_team() {
        let session = Session {
            team: vec![
                EntityRef::from_catalog(1, "bulbasaur"),
                EntityRef::from_catalog(1, "bulbasaur"),
                EntityRef::from_catalog(4, "charmander"),
            ],
            stats: BTreeMap::new(),
        };
        let state = session.into_state();
        assert_eq!(state.team.ids(), vec![1, 4]);
    }

    #[test]
    fn test_capture_reads_team_and_stats() {
        let mut state = AppState::default();
        state.team.add(EntityRef::from_catalog(7, "squirtle"));
        state
            .stats
            .complete(7, StatsRecord::from([("speed".to_string(), 43)]));
        let session = Session::capture(&state);
        assert_eq!(session.team.len(), 1);
        assert_eq!(session.stats[&7]["speed"], 43);
    }
}
