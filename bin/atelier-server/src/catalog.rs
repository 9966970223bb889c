//! Model and style metadata, scanned from the filesystem on request.
//!
//! The catalog deliberately re-reads the directories on every call so that
//! weights dropped in (or removed) while the server is running show up
//! without a restart.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

/// File extensions recognised as model weights.
const WEIGHT_EXTENSIONS: [&str; 5] = ["safetensors", "ckpt", "pt", "pth", "gguf"];

/// One entry in a style-preset JSON file.  Only the name is served; the
/// prompt templates are consumed by the generation engine.
#[derive(Debug, Deserialize)]
struct StylePreset {
    name: String,
}

/// Filename lists produced by a catalog refresh.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub model_filenames: Vec<String>,
    pub lora_filenames: Vec<String>,
}

/// Scans configured directories for model weights and style presets.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models_dir: PathBuf,
    loras_dir: PathBuf,
    styles_dir: PathBuf,
}

impl ModelCatalog {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        loras_dir: impl Into<PathBuf>,
        styles_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            models_dir: models_dir.into(),
            loras_dir: loras_dir.into(),
            styles_dir: styles_dir.into(),
        }
    }

    /// Re-scan the model and LoRA directories.
    pub async fn refresh(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            model_filenames: scan_weights(&self.models_dir).await,
            lora_filenames: scan_weights(&self.loras_dir).await,
        }
    }

    /// Collect style names from every `.json` file in the styles directory,
    /// in filename order, de-duplicated.
    pub async fn styles(&self) -> Vec<String> {
        let mut files = match list_files(&self.styles_dir).await {
            Some(files) => files,
            None => return Vec::new(),
        };
        files.retain(|p| p.extension().and_then(|e| e.to_str()) == Some("json"));
        files.sort();

        let mut names = Vec::new();
        for path in files {
            let raw = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read style file");
                    continue;
                }
            };
            match serde_json::from_str::<Vec<StylePreset>>(&raw) {
                Ok(presets) => names.extend(presets.into_iter().map(|p| p.name)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse style file");
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        names.retain(|n| seen.insert(n.clone()));
        names
    }
}

/// Filenames in `dir` with a recognised weight extension, sorted.
async fn scan_weights(dir: &Path) -> Vec<String> {
    let files = match list_files(dir).await {
        Some(files) => files,
        None => return Vec::new(),
    };
    let mut names: Vec<String> = files
        .into_iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| WEIGHT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

/// Regular files directly under `dir`; `None` when the directory is missing
/// or unreadable (a normal condition on fresh installs).
async fn list_files(dir: &Path) -> Option<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "catalog directory not readable");
            return None;
        }
    };
    let mut files = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                    files.push(entry.path());
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read catalog directory entry");
                break;
            }
        }
    }
    Some(files)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("atelier-catalog-test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn refresh_filters_by_weight_extension() {
        let root = scratch_root();
        let models = root.join("checkpoints");
        let loras = root.join("loras");
        tokio::fs::create_dir_all(&models).await.unwrap();
        tokio::fs::create_dir_all(&loras).await.unwrap();
        for name in ["base.safetensors", "old.ckpt", "notes.txt", "preview.png"] {
            tokio::fs::write(models.join(name), b"").await.unwrap();
        }
        tokio::fs::write(loras.join("detail.safetensors"), b"").await.unwrap();

        let catalog = ModelCatalog::new(&models, &loras, root.join("styles"));
        let snapshot = catalog.refresh().await;
        assert_eq!(snapshot.model_filenames, ["base.safetensors", "old.ckpt"]);
        assert_eq!(snapshot.lora_filenames, ["detail.safetensors"]);

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn missing_directories_yield_empty_lists() {
        let root = scratch_root();
        let catalog = ModelCatalog::new(
            root.join("checkpoints"),
            root.join("loras"),
            root.join("styles"),
        );
        let snapshot = catalog.refresh().await;
        assert!(snapshot.model_filenames.is_empty());
        assert!(snapshot.lora_filenames.is_empty());
        assert!(catalog.styles().await.is_empty());
    }

    #[tokio::test]
    async fn styles_collects_names_in_file_order() {
        let root = scratch_root();
        let styles = root.join("styles");
        tokio::fs::create_dir_all(&styles).await.unwrap();
        tokio::fs::write(
            styles.join("a_base.json"),
            r#"[{"name": "cinematic", "prompt": "cinematic {prompt}"},
                {"name": "sketch", "prompt": "pencil sketch of {prompt}"}]"#,
        )
        .await
        .unwrap();
        tokio::fs::write(
            styles.join("b_extra.json"),
            r#"[{"name": "sketch"}, {"name": "anime"}]"#,
        )
        .await
        .unwrap();
        tokio::fs::write(styles.join("readme.txt"), "not styles").await.unwrap();

        let catalog = ModelCatalog::new(root.join("x"), root.join("y"), &styles);
        assert_eq!(catalog.styles().await, ["cinematic", "sketch", "anime"]);

        tokio::fs::remove_dir_all(&root).await.ok();
    }
}
