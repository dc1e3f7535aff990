use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::AudioManifest;

/// Sound categories the UI knows how to play; nothing else is served.
pub const SOUND_FOLDERS: [&str; 5] = [
    "wheel_tick",
    "wheel_stop",
    "calendar_mark",
    "month_complete",
    "save_success",
];

pub fn is_known_category(category: &str) -> bool {
    SOUND_FOLDERS.contains(&category)
}

/// `{ category: ["/api/audio/<category>/<file>.mp3", ...] }` for every known
/// category. A missing sounds directory gives an empty manifest.
pub async fn build_manifest(sounds_dir: &Path) -> Result<AudioManifest, AppError> {
    let mut manifest = AudioManifest::new();
    if !fs::try_exists(sounds_dir).await.unwrap_or(false) {
        warn!("[AUDIO] sounds directory not found: {}", sounds_dir.display());
        return Ok(manifest);
    }

    for category in SOUND_FOLDERS {
        let folder = sounds_dir.join(category);
        let mut files = Vec::new();
        if fs::try_exists(&folder).await.unwrap_or(false) {
            let mut entries = fs::read_dir(&folder).await.map_err(|err| {
                error!("[AUDIO] error scanning {}: {err}", folder.display());
                AppError::internal(err)
            })?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.to_lowercase().ends_with(".mp3") {
                    files.push(format!("/api/audio/{category}/{name}"));
                }
            }
            files.sort();
        }
        manifest.insert(category.to_string(), files);
    }

    info!("[AUDIO] manifest generated");
    Ok(manifest)
}

/// Resolves a file inside a whitelisted category folder.
pub fn resolve_sound(sounds_dir: &Path, category: &str, filename: &str) -> Result<PathBuf, AppError> {
    if !is_known_category(category) {
        warn!("[AUDIO] access denied for category: {category}");
        return Err(AppError::forbidden("Forbidden"));
    }
    let bad_name = filename.is_empty()
        || filename.contains(['/', '\\'])
        || filename == ".."
        || filename == ".";
    if bad_name {
        warn!("[AUDIO] rejected file name: {filename}");
        return Err(AppError::forbidden("Forbidden"));
    }
    Ok(sounds_dir.join(category).join(filename))
}

pub async fn read_sound(sounds_dir: &Path, category: &str, filename: &str) -> Result<Vec<u8>, AppError> {
    let path = resolve_sound(sounds_dir, category, filename)?;
    match fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            error!("[AUDIO] file not found: {category}/{filename}");
            Err(AppError::not_found("File Not Found"))
        }
        Err(err) => {
            error!("[AUDIO] error serving file: {err}");
            Err(AppError::internal(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_dir;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn missing_sounds_dir_gives_empty_manifest() {
        let dir = temp_dir("audio_missing");
        let manifest = build_manifest(&dir).await.unwrap();
        assert!(manifest.is_empty());
    }

    #[tokio::test]
    async fn manifest_lists_mp3_files_per_category() {
        let dir = temp_dir("audio_scan");
        let ticks = dir.join("wheel_tick");
        fs::create_dir_all(&ticks).await.unwrap();
        fs::write(ticks.join("b.mp3"), b"b").await.unwrap();
        fs::write(ticks.join("a.mp3"), b"a").await.unwrap();
        fs::write(ticks.join("notes.txt"), b"skip").await.unwrap();
        fs::create_dir_all(dir.join("unlisted")).await.unwrap();

        let manifest = build_manifest(&dir).await.unwrap();
        assert_eq!(manifest.len(), SOUND_FOLDERS.len());
        assert_eq!(
            manifest["wheel_tick"],
            ["/api/audio/wheel_tick/a.mp3", "/api/audio/wheel_tick/b.mp3"]
        );
        assert!(manifest["wheel_stop"].is_empty());
        assert!(!manifest.contains_key("unlisted"));

        assert_eq!(read_sound(&dir, "wheel_tick", "a.mp3").await.unwrap(), b"a");
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn serving_is_limited_to_known_categories() {
        let dir = temp_dir("audio_serve");
        let err = read_sound(&dir, "secrets", "a.mp3").await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let err = read_sound(&dir, "wheel_tick", "..").await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let err = read_sound(&dir, "wheel_tick", "missing.mp3").await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
