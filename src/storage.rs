use crate::models::{
    Comment, CommunityPost, JournalEntry, Message, Profile, UserStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_anonymous: bool,
}

/// Everything the local backend keeps, persisted as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendData {
    pub next_id: u64,
    pub users: Vec<UserRecord>,
    pub profiles: BTreeMap<Uuid, Profile>,
    pub sessions: BTreeMap<String, Uuid>,
    pub journal_entries: Vec<JournalEntry>,
    pub community_posts: Vec<CommunityPost>,
    pub comments: Vec<Comment>,
    pub user_status: BTreeMap<Uuid, UserStatus>,
    pub messages: Vec<Message>,
}

impl BackendData {
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

/// Loads the document at `path`. A missing file starts empty; a file that
/// cannot be read or parsed is an error so it is never overwritten.
pub async fn load_data(path: &Path) -> io::Result<BackendData> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!("failed to parse data file {}: {err}", path.display());
            io::Error::from(err)
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("no data file at {}, starting empty", path.display());
            Ok(BackendData::default())
        }
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            Err(err)
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes the whole document to a sibling temp file, then renames it over `path`.
pub async fn persist_data(path: &Path, data: &BackendData) -> io::Result<()> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_data_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "wellness_journal_storage_{tag}_{}_{}.json",
            std::process::id(),
            nanos
        ));
        path
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let data = load_data(&unique_data_path("missing")).await.unwrap();
        assert_eq!(data.next_id, 0);
        assert!(data.users.is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error_and_left_alone() {
        let path = unique_data_path("malformed");
        let original = br#"{"users":[{"id":"not-a-uuid","is_anonymous":true}]}"#;
        fs::write(&path, original).await.unwrap();

        let err = load_data(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(fs::read(&path).await.unwrap(), original.to_vec());
    }

    #[tokio::test]
    async fn persist_replaces_file_without_leftovers() {
        let path = unique_data_path("persist");
        let mut data = BackendData::default();
        data.allocate_id();
        persist_data(&path, &data).await.unwrap();
        data.allocate_id();
        persist_data(&path, &data).await.unwrap();

        assert_eq!(load_data(&path).await.unwrap().next_id, 2);
        assert!(!temp_path(&path).exists());
    }
}
