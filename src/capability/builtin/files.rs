//! File capabilities confined to a workspace root.

use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::capability::{Capability, CapabilityArguments, FnCapability, ParameterSchema};
use crate::error::DispatchError;

const READ_LOG_MAX_BYTES: u64 = 65_536;
const DEFAULT_LOG_MARKER: &str = "Process Result:";

/// Resolve an existing file named by the model, rejecting anything that
/// lands outside `root` once symlinks and `..` are resolved.
pub(crate) async fn resolve_existing(
    capability: &str,
    root: &Path,
    requested: &str,
) -> Result<PathBuf, DispatchError> {
    let root = canonical_root(capability, root).await?;
    let candidate = tokio::fs::canonicalize(root.join(requested))
        .await
        .map_err(|e| DispatchError::execution(capability, format!("cannot open {requested}: {e}")))?;
    if !candidate.starts_with(&root) {
        return Err(outside_workspace(capability, requested));
    }
    Ok(candidate)
}

/// Resolve a file the capability is about to create. Only plain relative
/// components are accepted; missing parent directories are created.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub(crate) async fn resolve_new(
    capability: &str,
    root: &Path,
    requested: &str,
) -> Result<PathBuf, DispatchError> {
    let relative = Path::new(requested);
    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if requested.trim().is_empty() || !plain {
        return Err(outside_workspace(capability, requested));
    }

    let root = canonical_root(capability, root).await?;
    let target = root.join(relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DispatchError::execution(capability, format!("cannot create {}: {e}", parent.display())))?;
        let parent = tokio::fs::canonicalize(parent).await?;
        if !parent.starts_with(&root) {
            return Err(outside_workspace(capability, requested));
        }
    }
    Ok(target)
}

async fn canonical_root(capability: &str, root: &Path) -> Result<PathBuf, DispatchError> {
    tokio::fs::canonicalize(root).await.map_err(|e| {
        DispatchError::execution(capability, format!("workspace {} is unavailable: {e}", root.display()))
    })
}

fn outside_workspace(capability: &str, requested: &str) -> DispatchError {
    DispatchError::execution(capability, format!("{requested} is outside the workspace"))
}

/// `read_log(path, marker?)`: text after the last marker in a log file
/// under `root`.
///
/// Only the last 64 KB of the file are read. Returns that tail whole when
/// the marker does not occur in it.
pub fn read_log_capability(root: impl Into<PathBuf>) -> Arc<dyn Capability> {
    let root = Arc::new(root.into());
    Arc::new(FnCapability::new(
        "read_log",
        "Read a container log file and return the output of its latest run",
        ParameterSchema::object()
            .string("path", "Log file path, relative to the workspace", true)
            .string("marker", "Line marker that starts a run's output", false)
            .build(),
        move |args: CapabilityArguments| {
            let root = Arc::clone(&root);
            async move {
                let requested = args.get_str("path")?;
                let marker = args.get_str_opt("marker").unwrap_or(DEFAULT_LOG_MARKER);

                let path = resolve_existing("read_log", &root, requested).await?;
                let tail = read_tail(&path, READ_LOG_MAX_BYTES)
                    .await
                    .map_err(|e| DispatchError::execution("read_log", format!("failed to read {requested}: {e}")))?;

                Ok(latest_run(&tail, marker).to_string())
            }
        },
    ))
}

async fn read_tail(path: &Path, max_bytes: u64) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(max_bytes))).await?;

    let mut buf = Vec::new();
    file.take(max_bytes).read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn latest_run<'a>(content: &'a str, marker: &str) -> &'a str {
    match content.rfind(marker) {
        Some(idx) => content[idx + marker.len()..].trim(),
        None => content.trim_start_matches('\u{FFFD}').trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> CapabilityArguments {
        CapabilityArguments::new(value.as_object().cloned().unwrap_or_default())
    }

    fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn read_log_returns_text_after_last_marker() {
        let dir = workspace(&[(
            "prophet-container.log",
            "boot\nProcess Result: old run\nnoise\nProcess Result:\n[실패] prophet | OOM\n",
        )]);

        let out = read_log_capability(dir.path())
            .execute(&args(json!({"path": "prophet-container.log"})))
            .await
            .unwrap();
        assert_eq!(out, "[실패] prophet | OOM");
    }

    #[tokio::test]
    async fn read_log_without_marker_returns_whole_file() {
        let dir = workspace(&[("run.log", "  all good  \n")]);

        let out = read_log_capability(dir.path())
            .execute(&args(json!({"path": "run.log", "marker": "==>"})))
            .await
            .unwrap();
        assert_eq!(out, "all good");
    }

    #[tokio::test]
    async fn read_log_reads_only_the_tail() {
        let big = format!("Process Result: stale\n{}\nProcess Result: latest\n", "x".repeat(200_000));
        let dir = workspace(&[("big.log", &big)]);

        let out = read_log_capability(dir.path())
            .execute(&args(json!({"path": "big.log"})))
            .await
            .unwrap();
        assert_eq!(out, "latest");
    }

    #[tokio::test]
    async fn read_log_rejects_paths_outside_workspace() {
        let dir = workspace(&[("run.log", "ok")]);
        let cap = read_log_capability(dir.path());

        for path in ["../../../../../../etc/passwd", "/etc/passwd"] {
            let err = cap.execute(&args(json!({ "path": path }))).await.unwrap_err();
            assert!(matches!(err, DispatchError::CapabilityExecution { .. }));
            assert!(err.to_string().contains("outside the workspace"), "{path}: {err}");
        }
    }

    #[tokio::test]
    async fn read_log_missing_file_is_execution_error() {
        let dir = workspace(&[]);
        let err = read_log_capability(dir.path())
            .execute(&args(json!({"path": "not-here.log"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::CapabilityExecution { .. }));
    }

    #[tokio::test]
    async fn new_files_stay_inside_workspace() {
        let dir = workspace(&[]);

        let target = resolve_new("take_screenshot", dir.path(), "shots/home.png").await.unwrap();
        assert!(target.ends_with("shots/home.png"));
        assert!(dir.path().join("shots").is_dir());

        for bad in ["../escape.png", "/tmp/abs.png", "", "a/../../b.png"] {
            assert!(resolve_new("take_screenshot", dir.path(), bad).await.is_err(), "{bad}");
        }
    }
}
