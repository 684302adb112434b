//! `sdfgraph-frames` – frame semantics for robot and world descriptions.
//!
//! Builds three directed graphs from a [`Model`][sdfgraph_types::Model] or
//! [`World`][sdfgraph_types::World], checks them, and answers queries.
//!
//! # Modules
//!
//! - [`graph`] – [`DirectedGraph`][graph::DirectedGraph]: write-once graph of
//!   named vertices with bounded sink walks.
//! - [`kinematic`] – [`KinematicGraph`][kinematic::KinematicGraph]: links and
//!   the joints between them.
//! - [`attached_to`] – [`FrameAttachedToGraph`][attached_to::FrameAttachedToGraph]:
//!   which rigid body each frame is fixed to.
//! - [`relative_to`] – [`PoseRelativeToGraph`][relative_to::PoseRelativeToGraph]:
//!   the frame each authored pose is expressed in, and pose resolution.
//! - [`scope`] – vertex naming shared by the two frame graphs.
//!
//! Builders collect every problem they find and return it next to the
//! (possibly partial) graph; validators return the list of violations;
//! resolvers return a single [`FrameError`][sdfgraph_types::FrameError].
//! None of them panic on malformed input.

pub mod attached_to;
pub mod graph;
pub mod kinematic;
pub mod relative_to;
pub mod scope;

pub use attached_to::{
    FrameAttachedToGraph, build_frame_attached_to_graph, resolve_frame_attached_to_body,
    validate_frame_attached_to_graph,
};
pub use graph::{DirectedGraph, Edge, EdgeId, SinkWalk, Vertex, VertexId, WalkEnd};
pub use kinematic::{KinematicGraph, build_kinematic_graph};
pub use relative_to::{
    PoseRelativeToGraph, build_pose_relative_to_graph, resolve_pose,
    resolve_pose_relative_to_root, validate_pose_relative_to_graph,
};
pub use scope::{FrameScope, FrameType, SCOPE_DELIMITER};
