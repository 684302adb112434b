//! [`FrameAttachedToGraph`] – which rigid body does each frame move with?
//!
//! Edges point from a frame toward the entity it is attached to:
//!
//! | vertex           | attached to                                        |
//! |------------------|----------------------------------------------------|
//! | link             | nothing (a body)                                   |
//! | joint            | its child link                                     |
//! | explicit frame   | `attached_to`, or the enclosing scope frame        |
//! | model frame      | the canonical link, or the parent scope frame when |
//! |                  | a nested model has no links                        |
//! | world            | nothing (a body)                                   |
//!
//! Following the edges from any vertex of a valid graph ends at a link or at
//! the world.

use sdfgraph_types::{ErrorCode, Errors, FrameError, Model, World};
use tracing::{debug, instrument};

use crate::graph::{DirectedGraph, VertexId, WalkEnd};
use crate::scope::{FrameScope, FrameType, ScopeVertices, add_scope_vertices};

/// Attachment graph of one model or world.
#[derive(Debug, Clone)]
pub struct FrameAttachedToGraph {
    graph: DirectedGraph<FrameType, ()>,
    scope_name: String,
    root: VertexId,
}

impl FrameAttachedToGraph {
    pub fn graph(&self) -> &DirectedGraph<FrameType, ()> {
        &self.graph
    }

    /// Name of the model or world the graph was built for.
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// The scope's own frame (`__model__` or `world`).
    pub fn root(&self) -> VertexId {
        self.root
    }

    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.graph.unique_vertex(name)
    }

    fn name_of(&self, id: VertexId) -> &str {
        self.graph.vertex(id).map_or("", |v| v.name())
    }

    fn kind_of(&self, id: VertexId) -> Option<FrameType> {
        self.graph.vertex(id).map(|v| *v.data())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Build
// ────────────────────────────────────────────────────────────────────────────

/// Build the attachment graph of a model or world.
///
/// All unresolvable references are reported; the offending entity is left
/// without an outgoing edge and the build continues.
pub fn build_frame_attached_to_graph<'a>(
    scope: impl Into<FrameScope<'a>>,
) -> (FrameAttachedToGraph, Errors) {
    build(scope.into())
}

#[instrument(skip_all, fields(scope = %scope.name()))]
fn build(scope: FrameScope<'_>) -> (FrameAttachedToGraph, Errors) {
    let mut graph = DirectedGraph::new();
    let mut errors = Errors::new();
    let vertices = add_scope_vertices(&mut graph, scope, &mut errors);

    match scope {
        FrameScope::Model(model) => {
            if model.links.is_empty() {
                errors.push(FrameError::new(
                    ErrorCode::ElementMissing,
                    format!("A model must have at least one link; model [{}] has none.", model.name),
                ));
            }
            add_model_edges(&mut graph, model, &vertices, None, &mut errors);
        }
        FrameScope::World(world) => add_world_edges(&mut graph, world, &vertices, &mut errors),
    }

    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        errors = errors.len(),
        "built attached-to graph"
    );
    let graph = FrameAttachedToGraph {
        graph,
        scope_name: scope.name().to_string(),
        root: vertices.sentinel,
    };
    (graph, errors)
}

fn add_world_edges(
    graph: &mut DirectedGraph<FrameType, ()>,
    world: &World,
    vertices: &ScopeVertices,
    errors: &mut Errors,
) {
    for (frame, &id) in world.frames.iter().zip(&vertices.frames) {
        attach(graph, vertices, id, &frame.name, &frame.attached_to, errors);
    }
    for (model, child) in world.models.iter().zip(&vertices.children) {
        add_model_edges(graph, model, child, Some(vertices.sentinel), errors);
    }
}

/// `parent` is the enclosing scope frame, `None` for the top-level model.
fn add_model_edges(
    graph: &mut DirectedGraph<FrameType, ()>,
    model: &Model,
    vertices: &ScopeVertices,
    parent: Option<VertexId>,
    errors: &mut Errors,
) {
    // Model frame → canonical link.  A broken explicit canonical_link leaves
    // the model frame as a non-body sink for validation to flag.
    match canonical_link(graph, model, vertices, errors) {
        Canonical::Link(link) => {
            graph.add_edge(vertices.sentinel, link, ());
        }
        Canonical::NoLinks => {
            if let Some(parent) = parent {
                graph.add_edge(vertices.sentinel, parent, ());
            }
        }
        Canonical::Invalid => {}
    }

    // Joint → child link.
    for (joint, &id) in model.joints.iter().zip(&vertices.joints) {
        match vertices.resolve(graph, &joint.child) {
            Some(child) if graph.vertex(child).map(|v| *v.data()) == Some(FrameType::Link) => {
                graph.add_edge(id, child, ());
            }
            _ => errors.push(FrameError::new(
                ErrorCode::FrameAttachedToInvalid,
                format!(
                    "Joint [{}] child link name [{}] not found in model [{}].",
                    joint.name, joint.child, model.name
                ),
            )),
        }
    }

    for (frame, &id) in model.frames.iter().zip(&vertices.frames) {
        attach(graph, vertices, id, &frame.name, &frame.attached_to, errors);
    }

    for (nested, child) in model.models.iter().zip(&vertices.children) {
        add_model_edges(graph, nested, child, Some(vertices.sentinel), errors);
    }
}

enum Canonical {
    Link(VertexId),
    /// No `canonical_link` and no links to default to.
    NoLinks,
    Invalid,
}

/// Resolve a model's canonical link.  An explicit `canonical_link` that
/// does not name a link is an error; an absent one falls back to the first
/// link.
fn canonical_link(
    graph: &DirectedGraph<FrameType, ()>,
    model: &Model,
    vertices: &ScopeVertices,
    errors: &mut Errors,
) -> Canonical {
    if model.canonical_link.is_empty() {
        return match vertices.links.first() {
            Some(&link) => Canonical::Link(link),
            None => Canonical::NoLinks,
        };
    }
    let Some(id) = vertices.resolve(graph, &model.canonical_link) else {
        errors.push(FrameError::new(
            ErrorCode::ElementMissing,
            format!(
                "canonical_link [{}] of model [{}] does not match a unique entity in the model.",
                model.canonical_link, model.name
            ),
        ));
        return Canonical::Invalid;
    };
    match graph.vertex(id).map(|v| *v.data()) {
        Some(FrameType::Link) => Canonical::Link(id),
        kind => {
            errors.push(FrameError::new(
                ErrorCode::ElementIncorrectType,
                format!(
                    "canonical_link [{}] of model [{}] is a {}, not a link.",
                    model.canonical_link,
                    model.name,
                    kind.map_or_else(|| "missing entity".to_string(), |k| k.to_string())
                ),
            ));
            Canonical::Invalid
        }
    }
}

/// Add the edge for an explicit frame: its `attached_to` target, or the
/// enclosing scope frame when the reference is empty.
fn attach(
    graph: &mut DirectedGraph<FrameType, ()>,
    vertices: &ScopeVertices,
    id: VertexId,
    name: &str,
    attached_to: &str,
    errors: &mut Errors,
) {
    if attached_to.is_empty() {
        graph.add_edge(id, vertices.sentinel, ());
        return;
    }
    match vertices.resolve(graph, attached_to) {
        Some(target) => {
            graph.add_edge(id, target, ());
        }
        None => errors.push(FrameError::new(
            ErrorCode::FrameAttachedToInvalid,
            format!(
                "attached_to name [{attached_to}] specified by frame with name [{name}] does not \
                 match a unique frame in scope [{}].",
                vertices.frame_name(graph)
            ),
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validate
// ────────────────────────────────────────────────────────────────────────────

/// Check the structural invariants of an attachment graph.
///
/// Every vertex must have at most one outgoing edge, no walk may cycle, and
/// every walk must end at a link or the world.  Returns every violation.
#[instrument(skip_all, fields(scope = %graph.scope_name))]
pub fn validate_frame_attached_to_graph(graph: &FrameAttachedToGraph) -> Errors {
    let mut errors = Errors::new();
    let g = &graph.graph;

    for vertex in g.vertices() {
        let out = g.out_degree(vertex.id());
        if out > 1 {
            errors.push(FrameError::new(
                ErrorCode::FrameAttachedToInvalid,
                format!(
                    "FrameAttachedToGraph vertex [{}] has {out} outgoing edges; a frame can only \
                     be attached to one other frame.",
                    vertex.name()
                ),
            ));
            continue;
        }

        match g.walk_to_sink(vertex.id()).end {
            WalkEnd::Sink(sink) => {
                let kind = graph.kind_of(sink);
                if !kind.is_some_and(FrameType::is_body) {
                    errors.push(FrameError::new(
                        ErrorCode::FrameAttachedToInvalid,
                        format!(
                            "FrameAttachedToGraph vertex [{}] is attached to [{}], a {}; frames \
                             must ultimately be attached to a link or the world.",
                            vertex.name(),
                            graph.name_of(sink),
                            kind.map_or_else(|| "missing vertex".to_string(), |k| k.to_string())
                        ),
                    ));
                }
            }
            // Reported on the forking vertex itself.
            WalkEnd::Fork(_) => {}
            WalkEnd::StepLimit => errors.push(FrameError::new(
                ErrorCode::FrameAttachedToCycle,
                format!(
                    "FrameAttachedToGraph cycle detected; walking from vertex [{}] never reaches \
                     a link or the world.",
                    vertex.name()
                ),
            )),
        }
    }

    debug!(errors = errors.len(), "validated attached-to graph");
    errors
}

// ────────────────────────────────────────────────────────────────────────────
// Resolve
// ────────────────────────────────────────────────────────────────────────────

/// Name of the link (or `world`) the frame `frame_name` is attached to.
pub fn resolve_frame_attached_to_body(
    graph: &FrameAttachedToGraph,
    frame_name: &str,
) -> Result<String, FrameError> {
    let Some(start) = graph.vertex_id(frame_name) else {
        return Err(FrameError::new(
            ErrorCode::FrameAttachedToInvalid,
            format!("FrameAttachedToGraph unable to find unique frame with name [{frame_name}] in graph."),
        ));
    };

    match graph.graph.walk_to_sink(start).end {
        WalkEnd::Sink(sink) if graph.kind_of(sink).is_some_and(FrameType::is_body) => {
            Ok(graph.name_of(sink).to_string())
        }
        WalkEnd::Sink(sink) => Err(FrameError::new(
            ErrorCode::FrameAttachedToInvalid,
            format!(
                "Frame [{frame_name}] resolved to [{}], which is not a link or the world.",
                graph.name_of(sink)
            ),
        )),
        WalkEnd::Fork(at) => Err(FrameError::new(
            ErrorCode::FrameAttachedToInvalid,
            format!(
                "Frame [{frame_name}] cannot be resolved: vertex [{}] is attached to more than one frame.",
                graph.name_of(at)
            ),
        )),
        WalkEnd::StepLimit => Err(FrameError::new(
            ErrorCode::FrameAttachedToCycle,
            format!(
                "Internal error: walking from frame [{frame_name}] exceeded {} steps; the \
                 FrameAttachedToGraph contains a cycle.",
                graph.graph.vertex_count()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdfgraph_types::{Frame, Joint, JointType, Link};

    /// `F00 → F0 → F1 → F2 → L`, model frame → L.
    fn frame_chain() -> Model {
        let mut model = Model::new("model_frame_attached_to");
        model.links.push(Link::new("L"));
        model.frames.push(Frame::new("F00").attached_to("F0"));
        model.frames.push(Frame::new("F0").attached_to("F1"));
        model.frames.push(Frame::new("F1").attached_to("F2"));
        model.frames.push(Frame::new("F2").attached_to("L"));
        model
    }

    #[test]
    fn chain_resolves_every_frame_to_link() {
        let (graph, errors) = build_frame_attached_to_graph(&frame_chain());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(validate_frame_attached_to_graph(&graph).is_empty());
        assert_eq!(graph.graph().vertex_count(), 6);
        assert_eq!(graph.graph().edge_count(), 5);

        for name in ["__model__", "L", "F00", "F0", "F1", "F2"] {
            assert_eq!(resolve_frame_attached_to_body(&graph, name).unwrap(), "L", "frame {name}");
        }
    }

    #[test]
    fn unknown_frame_is_one_invalid_error() {
        let (graph, _) = build_frame_attached_to_graph(&frame_chain());
        let err = resolve_frame_attached_to_body(&graph, "invalid").unwrap_err();
        assert_eq!(err.code, ErrorCode::FrameAttachedToInvalid);
        assert!(err.message.contains(
            "FrameAttachedToGraph unable to find unique frame with name [invalid] in graph."
        ));
    }

    #[test]
    fn joint_is_attached_to_child_link() {
        let mut model = Model::new("m");
        model.links.push(Link::new("P"));
        model.links.push(Link::new("C"));
        model.joints.push(Joint::new("J", JointType::Revolute, "P", "C"));
        model.frames.push(Frame::new("F").attached_to("J"));

        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert!(errors.is_empty());
        assert_eq!(resolve_frame_attached_to_body(&graph, "J").unwrap(), "C");
        assert_eq!(resolve_frame_attached_to_body(&graph, "F").unwrap(), "C");
        assert_eq!(resolve_frame_attached_to_body(&graph, "__model__").unwrap(), "P");
    }

    #[test]
    fn canonical_link_overrides_first_link() {
        let mut model = frame_chain();
        model.links.insert(0, Link::new("other"));
        model.canonical_link = "L".to_string();
        model.frames.push(Frame::new("loose"));

        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert!(errors.is_empty());
        assert_eq!(resolve_frame_attached_to_body(&graph, "loose").unwrap(), "L");
    }

    #[test]
    fn canonical_link_must_be_a_link() {
        let mut model = frame_chain();
        model.canonical_link = "F1".to_string();
        let (_, errors) = build_frame_attached_to_graph(&model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementIncorrectType);

        model.canonical_link = "nope".to_string();
        let (_, errors) = build_frame_attached_to_graph(&model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementMissing);
    }

    #[test]
    fn unresolved_reference_is_reported_and_build_continues() {
        let mut model = frame_chain();
        model.frames.push(Frame::new("bad").attached_to("ghost"));
        model.frames.push(Frame::new("good"));

        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::FrameAttachedToInvalid);
        assert!(errors[0].message.contains("[ghost]"));
        assert_eq!(resolve_frame_attached_to_body(&graph, "good").unwrap(), "L");

        // `bad` has no edge and is itself a non-body sink.
        let validation = validate_frame_attached_to_graph(&graph);
        assert_eq!(validation.len(), 1);
        assert!(validation[0].message.contains("[bad]"));
    }

    #[test]
    fn cycle_is_detected() {
        let mut model = Model::new("m");
        model.links.push(Link::new("L"));
        model.frames.push(Frame::new("A").attached_to("B"));
        model.frames.push(Frame::new("B").attached_to("A"));

        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert!(errors.is_empty());

        let validation = validate_frame_attached_to_graph(&graph);
        let cycles: Vec<_> = validation
            .iter()
            .filter(|e| e.code == ErrorCode::FrameAttachedToCycle)
            .collect();
        assert_eq!(cycles.len(), 2);

        let err = resolve_frame_attached_to_body(&graph, "A").unwrap_err();
        assert_eq!(err.code, ErrorCode::FrameAttachedToCycle);
    }

    #[test]
    fn self_attachment_is_a_cycle() {
        let mut model = Model::new("m");
        model.links.push(Link::new("L"));
        model.frames.push(Frame::new("A").attached_to("A"));
        let (graph, _) = build_frame_attached_to_graph(&model);
        let validation = validate_frame_attached_to_graph(&graph);
        assert_eq!(validation.len(), 1);
        assert_eq!(validation[0].code, ErrorCode::FrameAttachedToCycle);
    }

    #[test]
    fn model_without_links_is_reported() {
        let mut model = Model::new("empty");
        model.frames.push(Frame::new("F"));
        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementMissing);

        // Both the model frame and F end at the model frame, which is no body.
        let validation = validate_frame_attached_to_graph(&graph);
        assert_eq!(validation.len(), 2);
        assert!(validation.iter().all(|e| e.code == ErrorCode::FrameAttachedToInvalid));
    }

    #[test]
    fn duplicate_names_are_unresolvable() {
        let mut model = frame_chain();
        model.frames.push(Frame::new("F0"));
        let (graph, errors) = build_frame_attached_to_graph(&model);
        // F00 → F0 is ambiguous now.
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("[F0]"));
        assert!(resolve_frame_attached_to_body(&graph, "F0").is_err());
    }

    #[test]
    fn world_frames_attach_to_world_and_models_to_links() {
        let mut world = World::new("default");
        let mut model = Model::new("box");
        model.links.push(Link::new("link"));
        model.frames.push(Frame::new("lid"));
        world.models.push(model);
        world.frames.push(Frame::new("F_world"));
        world.frames.push(Frame::new("F_box").attached_to("box"));
        world.frames.push(Frame::new("F_link").attached_to("box::link"));

        let (graph, errors) = build_frame_attached_to_graph(&world);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(validate_frame_attached_to_graph(&graph).is_empty());
        assert_eq!(graph.scope_name(), "default");
        assert_eq!(resolve_frame_attached_to_body(&graph, "world").unwrap(), "world");
        assert_eq!(resolve_frame_attached_to_body(&graph, "F_world").unwrap(), "world");
        assert_eq!(resolve_frame_attached_to_body(&graph, "box").unwrap(), "box::link");
        assert_eq!(resolve_frame_attached_to_body(&graph, "F_box").unwrap(), "box::link");
        assert_eq!(resolve_frame_attached_to_body(&graph, "F_link").unwrap(), "box::link");
        assert_eq!(resolve_frame_attached_to_body(&graph, "box::lid").unwrap(), "box::link");
    }

    #[test]
    fn nested_model_without_links_attaches_to_parent() {
        let mut holder = Model::new("holder");
        holder.frames.push(Frame::new("mark"));
        let mut model = frame_chain();
        model.models.push(holder);

        let (graph, errors) = build_frame_attached_to_graph(&model);
        assert!(errors.is_empty());
        assert!(validate_frame_attached_to_graph(&graph).is_empty());
        assert_eq!(resolve_frame_attached_to_body(&graph, "holder::mark").unwrap(), "L");
    }

    #[test]
    fn nested_model_with_bad_canonical_link_stays_unattached() {
        let mut inner = Model::new("inner");
        inner.links.push(Link::new("L"));
        inner.frames.push(Frame::new("mark"));
        inner.canonical_link = "mark".to_string();
        let mut outer = Model::new("outer");
        outer.links.push(Link::new("base"));
        outer.models.push(inner);

        let (graph, errors) = build_frame_attached_to_graph(&outer);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ElementIncorrectType);

        // Must not fall back to the parent's link.
        let err = resolve_frame_attached_to_body(&graph, "inner").unwrap_err();
        assert_eq!(err.code, ErrorCode::FrameAttachedToInvalid);
        let validation = validate_frame_attached_to_graph(&graph);
        assert!(validation.iter().any(|e| e.message.contains("[inner]")));
        assert_eq!(resolve_frame_attached_to_body(&graph, "inner::L").unwrap(), "inner::L");
    }

    #[test]
    fn fork_is_reported_once() {
        let (mut graph, _) = build_frame_attached_to_graph(&frame_chain());
        let f0 = graph.vertex_id("F0").unwrap();
        let l = graph.vertex_id("L").unwrap();
        graph.graph.add_edge(f0, l, ());

        let validation = validate_frame_attached_to_graph(&graph);
        assert_eq!(validation.len(), 1);
        assert!(validation[0].message.contains("[F0] has 2 outgoing edges"));

        let err = resolve_frame_attached_to_body(&graph, "F00").unwrap_err();
        assert_eq!(err.code, ErrorCode::FrameAttachedToInvalid);
    }
}
