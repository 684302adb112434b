//! Frame-graph operations behind the CLI subcommands and shell commands.

use anyhow::Result;
use sdfgraph_frames::{
    FrameScope, build_frame_attached_to_graph, build_kinematic_graph, build_pose_relative_to_graph,
    resolve_frame_attached_to_body, resolve_pose, resolve_pose_relative_to_root,
    validate_frame_attached_to_graph, validate_pose_relative_to_graph,
};
use sdfgraph_types::{Errors, Model, Pose, Root};
use tracing::{info, instrument, warn};

use crate::document::{self, DocumentError};

/// Every error found in one world or top-level model.
#[derive(Debug)]
pub struct ScopeReport {
    pub label: String,
    pub errors: Errors,
}

pub fn scope_label(scope: FrameScope<'_>) -> String {
    match scope {
        FrameScope::World(w) => format!("world [{}]", w.name),
        FrameScope::Model(m) => format!("model [{}]", m.name),
    }
}

/// Build and validate every graph of every scope in `root`.
#[instrument(skip_all)]
pub fn check(root: &Root) -> Vec<ScopeReport> {
    let reports: Vec<ScopeReport> = document::all_scopes(root).map(check_scope).collect();
    info!(
        scopes = reports.len(),
        errors = reports.iter().map(|r| r.errors.len()).sum::<usize>(),
        "checked document"
    );
    reports
}

fn check_scope(scope: FrameScope<'_>) -> ScopeReport {
    let mut errors = Errors::new();
    match scope {
        FrameScope::Model(model) => kinematic_errors(model, &mut errors),
        FrameScope::World(world) => {
            for model in &world.models {
                kinematic_errors(model, &mut errors);
            }
        }
    }

    let (attached, build_errors) = build_frame_attached_to_graph(scope);
    errors.extend(build_errors);
    errors.extend(validate_frame_attached_to_graph(&attached));

    let (relative, build_errors) = build_pose_relative_to_graph(scope);
    errors.extend(build_errors);
    errors.extend(validate_pose_relative_to_graph(&relative));

    ScopeReport {
        label: scope_label(scope),
        errors,
    }
}

fn kinematic_errors(model: &Model, errors: &mut Errors) {
    let (_, found) = build_kinematic_graph(model);
    errors.extend(found);
    for nested in &model.models {
        kinematic_errors(nested, errors);
    }
}

/// A query failed: unknown scope, a broken frame graph, or the frame did not
/// resolve.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(
        "{label} has {} frame graph error(s), first: {}; run `check` for the full list",
        .errors.len(),
        first_error(.errors)
    )]
    Invalid { label: String, errors: Errors },
    #[error(transparent)]
    Frame(#[from] sdfgraph_types::FrameError),
}

fn first_error(errors: &Errors) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// Resolvers only run on graphs that built and validated cleanly.
fn ensure_valid(scope: FrameScope<'_>, errors: Errors) -> Result<(), QueryError> {
    if errors.is_empty() {
        return Ok(());
    }
    warn!(scope = %scope.name(), errors = errors.len(), "refusing to query an invalid frame graph");
    Err(QueryError::Invalid {
        label: scope_label(scope),
        errors,
    })
}

/// Name of the body `frame` is attached to.
pub fn body(root: &Root, scope: Option<&str>, frame: &str) -> Result<String, QueryError> {
    let scope = document::select_scope(root, scope)?;
    let (graph, mut errors) = build_frame_attached_to_graph(scope);
    errors.extend(validate_frame_attached_to_graph(&graph));
    ensure_valid(scope, errors)?;
    Ok(resolve_frame_attached_to_body(&graph, frame)?)
}

/// Pose of `frame` relative to `relative_to`, or to the scope root.
pub fn pose(
    root: &Root,
    scope: Option<&str>,
    frame: &str,
    relative_to: Option<&str>,
) -> Result<Pose, QueryError> {
    let scope = document::select_scope(root, scope)?;
    let (graph, mut errors) = build_pose_relative_to_graph(scope);
    errors.extend(validate_pose_relative_to_graph(&graph));
    ensure_valid(scope, errors)?;
    let pose = match relative_to {
        Some(target) => resolve_pose(&graph, frame, target)?,
        None => resolve_pose_relative_to_root(&graph, frame)?,
    };
    Ok(pose)
}

/// Pretty-printed JSON schema of the document format.
pub fn schema() -> Result<String> {
    let schema = schemars::schema_for!(Root);
    Ok(serde_json::to_string_pretty(&schema)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfgraph_types::ErrorCode;

    const SCENE: &str = r#"
[[world]]
name = "default"

[[world.frame]]
name = "dock"
pose = [1, 0, 0, 0, 0, 0]

[[world.model]]
name = "cart"
relative_to = "dock"

[[world.model.link]]
name = "chassis"
pose = [0, 1, 0, 0, 0, 0]

[[model]]
name = "broken"

[[model.link]]
name = "base"

[[model.joint]]
name = "j"
type = "fixed"
parent = "base"
child = "ghost"
"#;

    fn scene() -> Root {
        toml::from_str(SCENE).expect("parse")
    }

    #[test]
    fn check_reports_per_scope() {
        let reports = check(&scene());
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].label, "world [default]");
        assert!(reports[0].errors.is_empty(), "{:?}", reports[0].errors);

        assert_eq!(reports[1].label, "model [broken]");
        assert!(reports[1].errors.iter().any(|e| e.code == ErrorCode::ElementMissing));
    }

    #[test]
    fn body_and_pose_queries() {
        let root = scene();
        assert_eq!(body(&root, None, "cart").unwrap(), "cart::chassis");

        let p = pose(&root, None, "cart::chassis", None).unwrap();
        assert!(p.approx_eq(&Pose::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0), 1e-12));
        let p = pose(&root, None, "cart::chassis", Some("dock")).unwrap();
        assert!(p.approx_eq(&Pose::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn query_errors_are_typed() {
        let root = scene();
        assert!(matches!(body(&root, Some("nope"), "x"), Err(QueryError::Document(_))));
        match pose(&root, None, "missing", None) {
            Err(QueryError::Frame(e)) => assert_eq!(e.code, ErrorCode::PoseRelativeToInvalid),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn queries_refuse_invalid_graphs() {
        let root = scene();
        match body(&root, Some("broken"), "__model__") {
            Err(QueryError::Invalid { label, errors }) => {
                assert_eq!(label, "model [broken]");
                assert!(errors.iter().any(|e| e.message.contains("[ghost]")));
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = pose(&root, Some("broken"), "base", None).unwrap_err();
        assert!(err.to_string().starts_with("model [broken] has "), "{err}");
    }

    #[test]
    fn bad_nested_canonical_link_is_not_answered() {
        let text = r#"
[[model]]
name = "outer"

[[model.link]]
name = "base"

[[model.model]]
name = "inner"
canonical_link = "mark"

[[model.model.link]]
name = "L"

[[model.model.frame]]
name = "mark"
"#;
        let root: Root = toml::from_str(text).expect("parse");
        let reports = check(&root);
        assert!(reports[0].errors.iter().any(|e| e.code == ErrorCode::ElementIncorrectType));
        assert!(matches!(body(&root, None, "inner"), Err(QueryError::Invalid { .. })));
    }

    #[test]
    fn schema_describes_the_document() {
        let schema = schema().unwrap();
        assert!(schema.contains("\"Root\""));
        assert!(schema.contains("canonical_link"));
    }
}
