//! Frame scopes and the vertex phase shared by the attached-to and
//! relative-to graphs.
//!
//! Both graphs have the same vertex set.  A scope (model or world) gets one
//! sentinel vertex for its own implicit frame, followed by one vertex per
//! link, joint and explicit frame, then each nested model (whose vertex is
//! the nested scope's sentinel) followed by its contents.  Entities of nested
//! models are named `<model>::<entity>`.

use std::fmt;

use sdfgraph_types::{ErrorCode, Errors, FrameError, MODEL_FRAME, Model, WORLD_FRAME, World};
use tracing::warn;

use crate::graph::{DirectedGraph, VertexId};

/// Separator between a nested model's name and its entities' names.
pub const SCOPE_DELIMITER: &str = "::";

/// Kind of entity a frame-graph vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Link,
    Joint,
    Frame,
    /// A model's implicit frame (top-level sentinel or nested model).
    Model,
    /// The world's implicit frame.
    World,
}

impl FrameType {
    /// Links and the world are the only rigid bodies a frame can end up
    /// attached to.
    pub fn is_body(self) -> bool {
        matches!(self, FrameType::Link | FrameType::World)
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FrameType::Link => "link",
            FrameType::Joint => "joint",
            FrameType::Frame => "frame",
            FrameType::Model => "model",
            FrameType::World => "world",
        };
        f.write_str(s)
    }
}

/// The model or world a frame graph is built for.
#[derive(Debug, Clone, Copy)]
pub enum FrameScope<'a> {
    Model(&'a Model),
    World(&'a World),
}

impl FrameScope<'_> {
    pub fn name(&self) -> &str {
        match self {
            FrameScope::Model(m) => &m.name,
            FrameScope::World(w) => &w.name,
        }
    }

    /// Name of the root sentinel vertex.
    pub fn root_frame(&self) -> &'static str {
        match self {
            FrameScope::Model(_) => MODEL_FRAME,
            FrameScope::World(_) => WORLD_FRAME,
        }
    }
}

impl<'a> From<&'a Model> for FrameScope<'a> {
    fn from(model: &'a Model) -> Self {
        FrameScope::Model(model)
    }
}

impl<'a> From<&'a World> for FrameScope<'a> {
    fn from(world: &'a World) -> Self {
        FrameScope::World(world)
    }
}

/// Join a scope prefix and a local name.
pub(crate) fn scoped(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{SCOPE_DELIMITER}{name}")
    }
}

/// Vertex ids of one scope, aligned with the declaration order of its
/// entities.  `children` is aligned with the scope's models.
#[derive(Debug)]
pub(crate) struct ScopeVertices {
    pub prefix: String,
    pub sentinel: VertexId,
    pub is_world: bool,
    pub links: Vec<VertexId>,
    pub joints: Vec<VertexId>,
    pub frames: Vec<VertexId>,
    pub children: Vec<ScopeVertices>,
}

impl ScopeVertices {
    /// Resolve a reference written inside this scope.  `__model__` names the
    /// scope's own frame; anything else is looked up under the scope prefix
    /// and must match exactly one vertex.
    pub fn resolve<E>(&self, graph: &DirectedGraph<FrameType, E>, reference: &str) -> Option<VertexId> {
        if !self.is_world && reference == MODEL_FRAME {
            return Some(self.sentinel);
        }
        graph.unique_vertex(&scoped(&self.prefix, reference))
    }

    /// Display name of this scope's frame, for messages.
    pub fn frame_name<'g, E>(&self, graph: &'g DirectedGraph<FrameType, E>) -> &'g str {
        graph.vertex(self.sentinel).map_or("", |v| v.name())
    }
}

/// Add the vertices of `scope` (recursively) to `graph`.
pub(crate) fn add_scope_vertices<E>(
    graph: &mut DirectedGraph<FrameType, E>,
    scope: FrameScope<'_>,
    errors: &mut Errors,
) -> ScopeVertices {
    let vertices = match scope {
        FrameScope::Model(model) => {
            let sentinel = graph.add_vertex(MODEL_FRAME, FrameType::Model);
            add_model_contents(graph, model, String::new(), sentinel, errors)
        }
        FrameScope::World(world) => {
            let sentinel = graph.add_vertex(WORLD_FRAME, FrameType::World);
            let frames = world
                .frames
                .iter()
                .map(|f| add_named(graph, "", &f.name, FrameType::Frame, errors))
                .collect();
            let children = world
                .models
                .iter()
                .map(|m| add_nested_model(graph, m, "", errors))
                .collect();
            ScopeVertices {
                prefix: String::new(),
                sentinel,
                is_world: true,
                links: Vec::new(),
                joints: Vec::new(),
                frames,
                children,
            }
        }
    };

    for name in graph.duplicate_names() {
        warn!(
            scope = scope.name(),
            frame = name,
            "duplicate frame name; references to it cannot be resolved"
        );
    }
    vertices
}

fn add_nested_model<E>(
    graph: &mut DirectedGraph<FrameType, E>,
    model: &Model,
    parent_prefix: &str,
    errors: &mut Errors,
) -> ScopeVertices {
    let sentinel = add_named(graph, parent_prefix, &model.name, FrameType::Model, errors);
    let prefix = scoped(parent_prefix, &model.name);
    add_model_contents(graph, model, prefix, sentinel, errors)
}

fn add_model_contents<E>(
    graph: &mut DirectedGraph<FrameType, E>,
    model: &Model,
    prefix: String,
    sentinel: VertexId,
    errors: &mut Errors,
) -> ScopeVertices {
    let links = model
        .links
        .iter()
        .map(|l| add_named(graph, &prefix, &l.name, FrameType::Link, errors))
        .collect();
    let joints = model
        .joints
        .iter()
        .map(|j| add_named(graph, &prefix, &j.name, FrameType::Joint, errors))
        .collect();
    let frames = model
        .frames
        .iter()
        .map(|f| add_named(graph, &prefix, &f.name, FrameType::Frame, errors))
        .collect();
    let children = model
        .models
        .iter()
        .map(|m| add_nested_model(graph, m, &prefix, errors))
        .collect();
    ScopeVertices {
        prefix,
        sentinel,
        is_world: false,
        links,
        joints,
        frames,
        children,
    }
}

fn add_named<E>(
    graph: &mut DirectedGraph<FrameType, E>,
    prefix: &str,
    name: &str,
    kind: FrameType,
    errors: &mut Errors,
) -> VertexId {
    if name.is_empty() {
        let owner = if prefix.is_empty() { "scope root" } else { prefix };
        errors.push(FrameError::new(
            ErrorCode::AttributeMissing,
            format!("A {kind} name is required, but the name is not set (in {owner})."),
        ));
    }
    graph.add_vertex(scoped(prefix, name), kind)
}
