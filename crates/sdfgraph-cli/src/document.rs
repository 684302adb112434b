//! Loading scene documents and picking the scope a command works on.

use std::fs;
use std::path::{Path, PathBuf};

use sdfgraph_frames::FrameScope;
use sdfgraph_types::Root;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML document {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse JSON document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported document extension for {0} (expected .toml or .json)")]
    UnsupportedExtension(PathBuf),

    #[error("no world or model named '{0}' in document")]
    ScopeNotFound(String),

    #[error("document contains no world or model")]
    Empty,
}

/// Read a document, choosing the parser by file extension.
pub fn load(path: &Path) -> Result<Root, DocumentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let text = |path: &Path| {
        fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let root: Root = match ext.as_deref() {
        Some("toml") => toml::from_str(&text(path)?).map_err(|source| DocumentError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        Some("json") => serde_json::from_str(&text(path)?).map_err(|source| DocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        _ => return Err(DocumentError::UnsupportedExtension(path.to_path_buf())),
    };

    debug!(
        path = %path.display(),
        worlds = root.world_count(),
        models = root.model_count(),
        "loaded document"
    );
    Ok(root)
}

/// The world or top-level model named `name`; without a name, the first
/// world, else the first model.  Worlds win over models of the same name.
pub fn select_scope<'a>(root: &'a Root, name: Option<&str>) -> Result<FrameScope<'a>, DocumentError> {
    match name {
        Some(name) => root
            .world_by_name(name)
            .map(FrameScope::World)
            .or_else(|| root.model_by_name(name).map(FrameScope::Model))
            .ok_or_else(|| DocumentError::ScopeNotFound(name.to_string())),
        None => root
            .worlds
            .first()
            .map(FrameScope::World)
            .or_else(|| root.models.first().map(FrameScope::Model))
            .ok_or(DocumentError::Empty),
    }
}

/// Every scope `check` visits: all worlds, then all top-level models.
pub fn all_scopes(root: &Root) -> impl Iterator<Item = FrameScope<'_>> {
    root.worlds
        .iter()
        .map(FrameScope::World)
        .chain(root.models.iter().map(FrameScope::Model))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_DOC: &str = r#"
[[world]]
name = "default"

[[world.model]]
name = "box"

[[world.model.link]]
name = "body"

[[model]]
name = "arm"

[[model.link]]
name = "base"
"#;

    fn write(dir: &tempfile::TempDir, file: &str, text: &str) -> PathBuf {
        let path = dir.path().join(file);
        fs::write(&path, text).expect("write");
        path
    }

    #[test]
    fn loads_toml_and_json_by_extension() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let root = load(&write(&dir, "scene.toml", TOML_DOC)).expect("toml");
        assert_eq!(root.world_count(), 1);
        assert_eq!(root.model_count(), 1);

        let json = serde_json::to_string(&root).expect("serialize");
        let again = load(&write(&dir, "scene.JSON", &json)).expect("json");
        assert_eq!(again, root);
    }

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = load(&write(&dir, "scene.sdf", TOML_DOC)).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedExtension(_)));

        let err = load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = load(&write(&dir, "bad.toml", "[[model]]\nname = 3\n")).unwrap_err();
        assert!(matches!(err, DocumentError::Toml { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn scope_selection() {
        let root: Root = toml::from_str(TOML_DOC).expect("parse");
        assert!(matches!(select_scope(&root, None), Ok(FrameScope::World(w)) if w.name == "default"));
        assert!(matches!(select_scope(&root, Some("arm")), Ok(FrameScope::Model(m)) if m.name == "arm"));
        assert!(matches!(
            select_scope(&root, Some("nope")),
            Err(DocumentError::ScopeNotFound(name)) if name == "nope"
        ));

        let models_only: Root = toml::from_str("[[model]]\nname = \"solo\"\n").expect("parse");
        assert!(matches!(select_scope(&models_only, None), Ok(FrameScope::Model(m)) if m.name == "solo"));
        assert!(matches!(select_scope(&Root::default(), None), Err(DocumentError::Empty)));
        assert_eq!(all_scopes(&root).count(), 2);
    }
}
