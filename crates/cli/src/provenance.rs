use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What produced an artifact: the surface, the command and its arguments.
#[derive(Clone, Debug, Serialize)]
pub struct Payload {
    pub surface: String,
    pub command: &'static str,
    pub params: Value,
}

impl Payload {
    pub fn new(surface: impl Into<String>, command: &'static str, params: Value) -> Self {
        Self {
            surface: surface.into(),
            command,
            params,
        }
    }
}

/// Write `<artifact>.provenance.json` next to `artifact` and return its path.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: &Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let path = provenance_path(artifact);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating provenance dir {}", parent.display()))?;
        }
    }

    let callsite = Location::caller();
    let doc = json!({
        "code_rev": current_git_rev(),
        "bigger_version": bigger::VERSION,
        "callsite": {
            "file": callsite.file(),
            "line": callsite.line()
        },
        "payload": payload,
        "outputs": [artifact.to_string_lossy()]
    });
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn provenance_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("artifact"));
    name.push(".provenance.json");
    artifact.with_file_name(name)
}

/// Commit hash from `GIT_COMMIT` (build time, then run time) or `git rev-parse`.
pub fn current_git_rev() -> String {
    if let Some(rev) = option_env!("GIT_COMMIT").filter(|s| !s.is_empty()) {
        return rev.to_string();
    }
    if let Ok(rev) = std::env::var("GIT_COMMIT") {
        if !rev.is_empty() {
            return rev;
        }
    }
    Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sidecar_name_replaces_the_extension() {
        let derived = provenance_path(Path::new("/tmp/out/a0-image.json"));
        assert_eq!(derived, Path::new("/tmp/out/a0-image.provenance.json"));
        let bare = provenance_path(Path::new("lamination"));
        assert_eq!(bare, Path::new("lamination.provenance.json"));
    }

    #[test]
    fn sidecar_records_payload_and_outputs() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("image.json");
        let payload = Payload::new("flute", "apply", json!({"word": "a0.A1"}));
        let path = write_sidecar(&artifact, &payload).unwrap();
        assert!(path.exists());
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["payload"]["surface"], "flute");
        assert_eq!(parsed["payload"]["command"], "apply");
        assert_eq!(parsed["payload"]["params"]["word"], "a0.A1");
        assert_eq!(parsed["bigger_version"], bigger::VERSION);
        assert!(parsed["callsite"]["line"].as_u64().is_some());
    }
}
