//! [`PoseRelativeToGraph`] – where is each frame, expressed in which frame?
//!
//! Edges point from a frame toward the frame its authored pose is expressed
//! in; the edge weight is the authored pose.
//!
//! | vertex           | relative to (when `relative_to` is empty)          |
//! |------------------|----------------------------------------------------|
//! | link             | the enclosing scope frame                          |
//! | joint            | its child link                                     |
//! | explicit frame   | `attached_to`, else the enclosing scope frame      |
//! | nested model     | the parent scope frame                             |
//! | root             | nothing                                            |
//!
//! The root is `__model__` for a model and `world` for a world.  A model's
//! own pose is an edge only when the model is nested in another scope.
//!
//! # Example
//!
//! ```rust
//! use sdfgraph_frames::relative_to::{build_pose_relative_to_graph, resolve_pose};
//! use sdfgraph_types::{Frame, Link, Model, Pose};
//!
//! let mut model = Model::new("m");
//! model.links.push(Link::new("base").with_pose(Pose::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)));
//! model.frames.push(
//!     Frame::new("tool")
//!         .relative_to("base")
//!         .with_pose(Pose::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0)),
//! );
//!
//! let (graph, errors) = build_pose_relative_to_graph(&model);
//! assert!(errors.is_empty());
//!
//! let pose = resolve_pose(&graph, "tool", "__model__").unwrap();
//! assert!(pose.approx_eq(&Pose::new(1.0, 0.0, 1.0, 0.0, 0.0, 0.0), 1e-12));
//! ```

use sdfgraph_types::{ErrorCode, Errors, Frame, FrameError, Model, Pose, World};
use tracing::{debug, instrument};

use crate::graph::{DirectedGraph, VertexId, WalkEnd};
use crate::scope::{FrameScope, FrameType, ScopeVertices, add_scope_vertices};

/// Relative-pose graph of one model or world.
#[derive(Debug, Clone)]
pub struct PoseRelativeToGraph {
    graph: DirectedGraph<FrameType, Pose>,
    scope_name: String,
    root: VertexId,
}

impl PoseRelativeToGraph {
    pub fn graph(&self) -> &DirectedGraph<FrameType, Pose> {
        &self.graph
    }

    /// Name of the model or world the graph was built for.
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// The root sentinel (`__model__` or `world`).
    pub fn root(&self) -> VertexId {
        self.root
    }

    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.graph.unique_vertex(name)
    }

    fn name_of(&self, id: VertexId) -> &str {
        self.graph.vertex(id).map_or("", |v| v.name())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Build
// ────────────────────────────────────────────────────────────────────────────

/// Build the relative-pose graph of a model or world.
///
/// Every unresolvable `relative_to` is reported as
/// [`ErrorCode::PoseRelativeToInvalid`]; the entity is left without an
/// outgoing edge and the build continues.
pub fn build_pose_relative_to_graph<'a>(
    scope: impl Into<FrameScope<'a>>,
) -> (PoseRelativeToGraph, Errors) {
    build(scope.into())
}

#[instrument(skip_all, fields(scope = %scope.name()))]
fn build(scope: FrameScope<'_>) -> (PoseRelativeToGraph, Errors) {
    let mut graph = DirectedGraph::new();
    let mut errors = Errors::new();
    let vertices = add_scope_vertices(&mut graph, scope, &mut errors);

    match scope {
        FrameScope::Model(model) => add_model_edges(&mut graph, model, &vertices, &mut errors),
        FrameScope::World(world) => add_world_edges(&mut graph, world, &vertices, &mut errors),
    }

    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        errors = errors.len(),
        "built relative-to graph"
    );
    let graph = PoseRelativeToGraph {
        graph,
        scope_name: scope.name().to_string(),
        root: vertices.sentinel,
    };
    (graph, errors)
}

fn add_world_edges(
    graph: &mut DirectedGraph<FrameType, Pose>,
    world: &World,
    vertices: &ScopeVertices,
    errors: &mut Errors,
) {
    for (frame, &id) in world.frames.iter().zip(&vertices.frames) {
        let target = Reference::of_frame(frame);
        relate(graph, vertices, id, "frame", &frame.name, target, None, frame.pose, errors);
    }
    for (model, child) in world.models.iter().zip(&vertices.children) {
        add_nested_model_edges(graph, model, child, vertices, errors);
    }
}

fn add_nested_model_edges(
    graph: &mut DirectedGraph<FrameType, Pose>,
    model: &Model,
    vertices: &ScopeVertices,
    parent: &ScopeVertices,
    errors: &mut Errors,
) {
    relate(
        graph,
        parent,
        vertices.sentinel,
        "model",
        &model.name,
        Reference::relative_to(&model.relative_to),
        None,
        model.pose,
        errors,
    );
    add_model_edges(graph, model, vertices, errors);
}

fn add_model_edges(
    graph: &mut DirectedGraph<FrameType, Pose>,
    model: &Model,
    vertices: &ScopeVertices,
    errors: &mut Errors,
) {
    for (link, &id) in model.links.iter().zip(&vertices.links) {
        let target = Reference::relative_to(&link.relative_to);
        relate(graph, vertices, id, "link", &link.name, target, None, link.pose, errors);
    }

    for (joint, &id) in model.joints.iter().zip(&vertices.joints) {
        // An empty relative_to means the child link frame.
        let default = if joint.relative_to.is_empty() {
            match vertices.resolve(graph, &joint.child) {
                Some(child) => Some(child),
                None => {
                    errors.push(FrameError::new(
                        ErrorCode::PoseRelativeToInvalid,
                        format!(
                            "Joint [{}] child link name [{}] not found in model [{}]; the joint \
                             pose cannot be placed.",
                            joint.name, joint.child, model.name
                        ),
                    ));
                    continue;
                }
            }
        } else {
            None
        };
        let target = Reference::relative_to(&joint.relative_to);
        relate(graph, vertices, id, "joint", &joint.name, target, default, joint.pose, errors);
    }

    for (frame, &id) in model.frames.iter().zip(&vertices.frames) {
        let target = Reference::of_frame(frame);
        relate(graph, vertices, id, "frame", &frame.name, target, None, frame.pose, errors);
    }

    for (nested, child) in model.models.iter().zip(&vertices.children) {
        add_nested_model_edges(graph, nested, child, vertices, errors);
    }
}

/// A frame name together with the field it was read from.
#[derive(Clone, Copy)]
struct Reference<'a> {
    field: &'static str,
    name: &'a str,
}

impl<'a> Reference<'a> {
    fn relative_to(name: &'a str) -> Self {
        Self {
            field: "relative_to",
            name,
        }
    }

    /// An explicit frame falls back to its `attached_to` frame.
    fn of_frame(frame: &'a Frame) -> Self {
        if frame.relative_to.is_empty() && !frame.attached_to.is_empty() {
            Self {
                field: "attached_to",
                name: &frame.attached_to,
            }
        } else {
            Self::relative_to(&frame.relative_to)
        }
    }
}

/// Add the edge `id → reference` weighted by `pose`.  An empty reference
/// means `default`, or the scope frame when there is no default.
#[allow(clippy::too_many_arguments)]
fn relate(
    graph: &mut DirectedGraph<FrameType, Pose>,
    vertices: &ScopeVertices,
    id: VertexId,
    kind: &str,
    name: &str,
    reference: Reference<'_>,
    default: Option<VertexId>,
    pose: Pose,
    errors: &mut Errors,
) {
    let target = if reference.name.is_empty() {
        Some(default.unwrap_or(vertices.sentinel))
    } else {
        vertices.resolve(graph, reference.name)
    };
    match target {
        Some(target) => {
            graph.add_edge(id, target, pose);
        }
        None => errors.push(FrameError::new(
            ErrorCode::PoseRelativeToInvalid,
            format!(
                "{} name [{}] specified by {kind} with name [{name}] does not match a unique \
                 frame in scope [{}].",
                reference.field,
                reference.name,
                vertices.frame_name(graph)
            ),
        )),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validate
// ────────────────────────────────────────────────────────────────────────────

/// Check the structural invariants of a relative-pose graph.
///
/// The root must have no outgoing edge, every other vertex exactly one, and
/// every walk must reach the root without cycling.  Returns every violation.
#[instrument(skip_all, fields(scope = %graph.scope_name))]
pub fn validate_pose_relative_to_graph(graph: &PoseRelativeToGraph) -> Errors {
    let mut errors = Errors::new();
    let g = &graph.graph;

    for vertex in g.vertices() {
        let out = g.out_degree(vertex.id());
        if vertex.id() == graph.root {
            if out != 0 {
                errors.push(FrameError::new(
                    ErrorCode::PoseRelativeToInvalid,
                    format!(
                        "PoseRelativeToGraph root vertex [{}] has {out} outgoing edges; it should \
                         have none.",
                        vertex.name()
                    ),
                ));
            }
            continue;
        }
        match out {
            1 => {}
            0 => {
                errors.push(FrameError::new(
                    ErrorCode::PoseRelativeToInvalid,
                    format!(
                        "PoseRelativeToGraph vertex [{}] has no outgoing edge; its pose is not \
                         expressed relative to any frame.",
                        vertex.name()
                    ),
                ));
                continue;
            }
            n => {
                errors.push(FrameError::new(
                    ErrorCode::PoseRelativeToInvalid,
                    format!(
                        "PoseRelativeToGraph vertex [{}] has {n} outgoing edges; a pose can only \
                         be relative to one frame.",
                        vertex.name()
                    ),
                ));
                continue;
            }
        }

        match g.walk_to_sink(vertex.id()).end {
            WalkEnd::Sink(sink) if sink == graph.root => {}
            WalkEnd::Sink(sink) => errors.push(FrameError::new(
                ErrorCode::PoseRelativeToInvalid,
                format!(
                    "PoseRelativeToGraph vertex [{}] resolves to [{}] instead of the root [{}].",
                    vertex.name(),
                    graph.name_of(sink),
                    graph.name_of(graph.root)
                ),
            )),
            WalkEnd::Fork(_) => {}
            WalkEnd::StepLimit => errors.push(FrameError::new(
                ErrorCode::PoseRelativeToCycle,
                format!(
                    "PoseRelativeToGraph cycle detected; walking from vertex [{}] never reaches \
                     the root [{}].",
                    vertex.name(),
                    graph.name_of(graph.root)
                ),
            )),
        }
    }

    debug!(errors = errors.len(), "validated relative-to graph");
    errors
}

// ────────────────────────────────────────────────────────────────────────────
// Resolve
// ────────────────────────────────────────────────────────────────────────────

/// Pose of `frame_name` relative to the graph root, composing every edge on
/// the way up.
pub fn resolve_pose_relative_to_root(
    graph: &PoseRelativeToGraph,
    frame_name: &str,
) -> Result<Pose, FrameError> {
    let Some(start) = graph.vertex_id(frame_name) else {
        return Err(FrameError::new(
            ErrorCode::PoseRelativeToInvalid,
            format!("PoseRelativeToGraph unable to find unique frame with name [{frame_name}] in graph."),
        ));
    };

    let walk = graph.graph.walk_to_sink(start);
    match walk.end {
        WalkEnd::Sink(sink) if sink == graph.root => Ok(walk
            .edges
            .iter()
            .fold(Pose::identity(), |pose, edge| *edge.data() * pose)),
        WalkEnd::Sink(sink) => Err(FrameError::new(
            ErrorCode::PoseRelativeToInvalid,
            format!(
                "Frame [{frame_name}] resolves to [{}] instead of the root [{}].",
                graph.name_of(sink),
                graph.name_of(graph.root)
            ),
        )),
        WalkEnd::Fork(at) => Err(FrameError::new(
            ErrorCode::PoseRelativeToInvalid,
            format!(
                "Frame [{frame_name}] cannot be resolved: vertex [{}] is relative to more than one frame.",
                graph.name_of(at)
            ),
        )),
        WalkEnd::StepLimit => Err(FrameError::new(
            ErrorCode::PoseRelativeToCycle,
            format!(
                "Internal error: walking from frame [{frame_name}] exceeded {} steps; the \
                 PoseRelativeToGraph contains a cycle.",
                graph.graph.vertex_count()
            ),
        )),
    }
}

/// Pose of `from` expressed in the frame `to`.
pub fn resolve_pose(graph: &PoseRelativeToGraph, from: &str, to: &str) -> Result<Pose, FrameError> {
    let from_pose = resolve_pose_relative_to_root(graph, from)?;
    let to_pose = resolve_pose_relative_to_root(graph, to)?;
    Ok(to_pose.inverse() * from_pose)
}
