//! JSON persistence of the run's outputs

use crate::error::{Error, Result};
use crate::types::{Leaderboard, NormalizedRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `value` as indented UTF-8 JSON, replacing `path` atomically
///
/// The document goes to a sibling temporary file first and is renamed over
/// the target, so readers never observe a half-written file. Missing parent
/// directories are created.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path)?;
    debug!(path = %path.display(), tmp = %tmp.display(), bytes = bytes.len(), "Writing JSON");

    if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Read a JSON document written by [`save_json`]
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a persisted posts file
pub async fn load_posts(path: &Path) -> Result<Vec<NormalizedRecord>> {
    load_json(path).await
}

/// Read a persisted leaderboard file
pub async fn load_leaderboard(path: &Path) -> Result<Leaderboard> {
    load_json(path).await
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::Other(format!("not a file path: {}", path.display())))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Author, LeaderboardEntry, Metrics};
    use tempfile::TempDir;

    fn sample_post() -> NormalizedRecord {
        NormalizedRecord {
            timestamp: Some("2025-11-18T10:00:00Z".to_string()),
            id: Some("1".to_string()),
            text: Some("привет, мир".to_string()),
            metrics: Metrics {
                likes: 1,
                ..Default::default()
            },
            media: vec![],
            author: Author {
                handle: Some("alice".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn writes_indented_utf8_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("all_tweets.json");

        save_json(&path, &vec![sample_post()]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("привет, мир"), "non-ASCII kept literal");
        assert!(text.contains("\n  {\n    \"created_at\""), "two-space indent: {text}");

        let loaded = load_posts(&path).await.unwrap();
        assert_eq!(loaded, vec![sample_post()]);
    }

    #[tokio::test]
    async fn overwrites_existing_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leaderboard.json");
        std::fs::write(&path, "stale content that is much longer than the new document").unwrap();

        let board: Leaderboard = vec![(
            "alice".to_string(),
            LeaderboardEntry {
                posts: 1,
                ..Default::default()
            },
        )];
        save_json(&path, &board).await.unwrap();

        assert_eq!(load_leaderboard(&path).await.unwrap(), board);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("leaderboard.json")]);
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site").join("data").join("leaderboard.json");

        save_json(&path, &Vec::<NormalizedRecord>::new()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[tokio::test]
    async fn loading_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();

        let err = load_posts(&dir.path().join("nope.json")).await.unwrap_err();

        assert!(matches!(err, Error::Io(_)), "got {err:?}");
    }

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path(Path::new("out/leaderboard.json")).unwrap(),
            PathBuf::from("out/leaderboard.json.tmp")
        );
        assert!(temp_path(Path::new("/")).is_err());
    }
}
