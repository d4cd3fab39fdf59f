//! StateStore - Per-Camera Privacy State Files
//!
//! ## Responsibilities
//!
//! - One pretty-printed JSON snapshot per camera (`privacy_state_<camera>.json`)
//! - Atomic replace on save (temp file + rename)
//! - Read/write failures are warnings; in-memory state stays authoritative

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Snapshot written after every successful transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub privacy_enabled: bool,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub privacy_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub camera_name: String,
}

/// RFC 3339, or a naive ISO timestamp interpreted as local time
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// State file directory
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path separators in the name are replaced so the file stays in `dir`
    pub fn path_for(&self, camera_name: &str) -> PathBuf {
        let safe: String = camera_name
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("privacy_state_{}.json", safe))
    }

    /// `None` when the file is absent or unreadable
    pub async fn load(&self, camera_name: &str) -> Option<PersistedState> {
        let path = self.path_for(camera_name);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(camera = %camera_name, path = %path.display(), error = %e, "Failed to read state file");
                return None;
            }
        };

        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(camera = %camera_name, path = %path.display(), error = %e, "Ignoring malformed state file");
                None
            }
        }
    }

    /// Best effort; returns whether the snapshot reached disk
    pub async fn save(&self, state: &PersistedState) -> bool {
        match self.write(state).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(camera = %state.camera_name, error = %e, "Failed to save state");
                false
            }
        }
    }

    async fn write(&self, state: &PersistedState) -> crate::error::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&state.camera_name);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        tracing::debug!(camera = %state.camera_name, path = %path.display(), "State saved");
        Ok(())
    }
}
