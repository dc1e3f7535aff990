use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use std::{env, path::Path, path::PathBuf};
use tokio::fs;

pub const CONFIG_FILE: &str = "config.json";
pub const CALENDAR_LOG_FILE: &str = "calendar_log.json";
pub const SOUNDS_DIR: &str = "sounds";

pub fn resolve_data_dir() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_DIR") {
        return PathBuf::from(path);
    }

    PathBuf::from("data")
}

#[derive(Debug)]
pub enum Loaded<T> {
    Found(T),
    Missing,
    Corrupt(String),
}

/// Reads and parses a JSON document. Unreadable or invalid files are reported
/// as `Corrupt` so callers can fall back without touching the file.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => Loaded::Found(data),
            Err(err) => Loaded::Corrupt(format!("failed to parse {}: {err}", path.display())),
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Loaded::Missing,
        Err(err) => Loaded::Corrupt(format!("failed to read {}: {err}", path.display())),
    }
}

pub async fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let payload = serde_json::to_vec_pretty(data)?;
    fs::write(path, payload).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn missing_and_corrupt_files_are_distinguished() {
        let dir = test_support::temp_dir("storage");
        let path = dir.join("doc.json");

        assert!(matches!(read_json::<BTreeMap<String, u32>>(&path).await, Loaded::Missing));

        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), 1u32);
        write_json(&path, &doc).await.unwrap();
        match read_json::<BTreeMap<String, u32>>(&path).await {
            Loaded::Found(back) => assert_eq!(back, doc),
            other => panic!("unexpected {other:?}"),
        }

        fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(read_json::<BTreeMap<String, u32>>(&path).await, Loaded::Corrupt(_)));

        let _ = fs::remove_dir_all(&dir).await;
    }
}
