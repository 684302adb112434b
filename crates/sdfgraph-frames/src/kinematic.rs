//! [`KinematicGraph`] – links as vertices, joints as parent → child edges.

use sdfgraph_types::{ErrorCode, Errors, FrameError, Model, Pose};
use tracing::{debug, instrument, warn};

use crate::graph::{DirectedGraph, VertexId};

/// Kinematic structure of one model.  Vertex payload is the link's authored
/// pose, edge payload the joint name.
#[derive(Debug, Clone, Default)]
pub struct KinematicGraph {
    graph: DirectedGraph<Pose, String>,
}

impl KinematicGraph {
    pub fn graph(&self) -> &DirectedGraph<Pose, String> {
        &self.graph
    }

    /// Vertex id of the link named `name`, when exactly one link has it.
    pub fn link_id(&self, name: &str) -> Option<VertexId> {
        self.graph.unique_vertex(name)
    }

    /// Links with no incoming joint, in declaration order.  A single-rooted
    /// mechanism has exactly one.
    pub fn root_links(&self) -> Vec<&str> {
        self.graph
            .vertices()
            .filter(|v| self.graph.in_degree(v.id()) == 0)
            .map(|v| v.name())
            .collect()
    }
}

/// Build the kinematic graph of `model`'s own links and joints.
///
/// A joint whose parent or child link is not among the model's links is
/// reported as [`ErrorCode::ElementMissing`] and skipped; the remaining
/// joints are still added.
#[instrument(skip_all, fields(model = %model.name))]
pub fn build_kinematic_graph(model: &Model) -> (KinematicGraph, Errors) {
    let mut graph = DirectedGraph::new();
    let mut errors = Errors::new();

    for link in &model.links {
        graph.add_vertex(link.name.clone(), link.pose);
    }

    for joint in &model.joints {
        let parent = graph.unique_vertex(&joint.parent);
        let child = graph.unique_vertex(&joint.child);
        let (Some(parent), Some(child)) = (parent, child) else {
            for (role, name, id) in [("parent", &joint.parent, parent), ("child", &joint.child, child)] {
                if id.is_none() {
                    errors.push(FrameError::new(
                        ErrorCode::ElementMissing,
                        format!(
                            "Joint [{}] {role} link name [{name}] not found in model [{}].",
                            joint.name, model.name
                        ),
                    ));
                }
            }
            warn!(joint = %joint.name, "skipping joint with unresolved links");
            continue;
        };
        graph.add_edge(parent, child, joint.name.clone());
    }

    debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "built kinematic graph"
    );
    (KinematicGraph { graph }, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdfgraph_types::{Joint, JointType, Link};

    fn pendulum() -> Model {
        let mut model = Model::new("double_pendulum_with_base");
        model.links.push(Link::new("base"));
        model.links.push(Link::new("upper_link").with_pose(Pose::new(0.0, 0.0, 2.1, -1.5708, 0.0, 0.0)));
        model.links.push(Link::new("lower_link"));
        model.joints.push(Joint::new("upper_joint", JointType::Revolute, "base", "upper_link"));
        model.joints.push(Joint::new("lower_joint", JointType::Revolute, "upper_link", "lower_link"));
        model
    }

    #[test]
    fn chain_has_one_edge_per_joint() {
        let (graph, errors) = build_kinematic_graph(&pendulum());
        assert!(errors.is_empty());
        assert_eq!(graph.graph().vertex_count(), 3);
        assert_eq!(graph.graph().edge_count(), 2);

        let upper = graph.link_id("upper_link").unwrap();
        let edge = graph.graph().in_edges(upper).next().unwrap();
        assert_eq!(edge.data(), "upper_joint");
        assert_eq!(edge.from(), graph.link_id("base").unwrap());
        assert!(graph.graph().vertex(upper).unwrap().data().approx_eq(
            &Pose::new(0.0, 0.0, 2.1, -1.5708, 0.0, 0.0),
            1e-12
        ));
    }

    #[test]
    fn chain_is_single_rooted() {
        let (graph, _) = build_kinematic_graph(&pendulum());
        assert_eq!(graph.root_links(), vec!["base"]);
    }

    #[test]
    fn missing_links_are_reported_and_skipped() {
        let mut model = pendulum();
        model.joints.insert(0, Joint::new("bad", JointType::Fixed, "ghost", "phantom"));

        let (graph, errors) = build_kinematic_graph(&model);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code == ErrorCode::ElementMissing));
        assert!(errors[0].message.contains("[ghost]"));
        assert!(errors[1].message.contains("[phantom]"));
        // The valid joints after the bad one are still built.
        assert_eq!(graph.graph().edge_count(), 2);
    }

    #[test]
    fn disconnected_links_are_extra_roots() {
        let mut model = pendulum();
        model.links.push(Link::new("floating"));
        let (graph, _) = build_kinematic_graph(&model);
        assert_eq!(graph.root_links(), vec!["base", "floating"]);
    }
}
