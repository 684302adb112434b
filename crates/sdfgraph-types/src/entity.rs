//! Typed scene-description document.
//!
//! These are plain owned values, one per entity, as produced by a document
//! loader.  Field names follow the SDF element names; collections serialize
//! under their singular element name so a TOML document reads like the XML
//! it mirrors:
//!
//! ```toml
//! [[model]]
//! name = "arm"
//!
//! [[model.link]]
//! name = "base"
//!
//! [[model.frame]]
//! name = "tool"
//! attached_to = "base"
//! pose = [0, 0, 0.5, 0, 0, 0]
//! ```
//!
//! An empty `relative_to` / `attached_to` string means "use the default",
//! which depends on the entity kind (see the frame graphs).  Names are **not** checked for
//! uniqueness here; the frame graphs detect duplicates themselves.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// Reserved name of a model's own implicit frame.
pub const MODEL_FRAME: &str = "__model__";

/// Reserved name of the world's implicit frame.
pub const WORLD_FRAME: &str = "world";

fn default_version() -> String {
    "1.7".to_string()
}

fn default_true() -> bool {
    true
}

// ────────────────────────────────────────────────────────────────────────────
// Root
// ────────────────────────────────────────────────────────────────────────────

/// A whole document: any number of worlds, or free-standing models and
/// lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Root {
    /// Format revision of the document.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(rename = "world", default, skip_serializing_if = "Vec::is_empty")]
    pub worlds: Vec<World>,
    #[serde(rename = "model", default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<Model>,
    #[serde(rename = "light", default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<Light>,
}

impl Default for Root {
    fn default() -> Self {
        Self {
            version: default_version(),
            worlds: Vec::new(),
            models: Vec::new(),
            lights: Vec::new(),
        }
    }
}

impl Root {
    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn world_by_name(&self, name: &str) -> Option<&World> {
        self.worlds.iter().find(|w| w.name == name)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// World
// ────────────────────────────────────────────────────────────────────────────

/// A world: the outermost frame scope.  Its implicit frame is named
/// [`WORLD_FRAME`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct World {
    pub name: String,
    #[serde(rename = "frame", default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
    #[serde(rename = "model", default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<Model>,
    #[serde(rename = "light", default, skip_serializing_if = "Vec::is_empty")]
    pub lights: Vec<Light>,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn find_frame(&self, name: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.name == name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

/// A model: a named scope of links, joints, explicit frames and nested
/// models.  Its implicit frame is named [`MODEL_FRAME`] from inside the model
/// and by the model's own name from its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    /// Frame the model pose is expressed in; empty = parent scope.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relative_to: String,
    /// Link the model frame is attached to; empty = first link.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub canonical_link: String,
    #[serde(rename = "static", default)]
    pub is_static: bool,
    #[serde(default)]
    pub self_collide: bool,
    #[serde(default = "default_true")]
    pub allow_auto_disable: bool,
    #[serde(default)]
    pub enable_wind: bool,
    #[serde(rename = "link", default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(rename = "joint", default, skip_serializing_if = "Vec::is_empty")]
    pub joints: Vec<Joint>,
    #[serde(rename = "frame", default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<Frame>,
    #[serde(rename = "model", default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<Model>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            pose: Pose::identity(),
            relative_to: String::new(),
            canonical_link: String::new(),
            is_static: false,
            self_collide: false,
            allow_auto_disable: true,
            enable_wind: false,
            links: Vec::new(),
            joints: Vec::new(),
            frames: Vec::new(),
            models: Vec::new(),
        }
    }
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn find_link(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn find_joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn find_frame(&self, name: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.name == name)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn find_model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Link / Joint / Frame / Light
// ────────────────────────────────────────────────────────────────────────────

/// A rigid body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relative_to: String,
}

impl Link {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn relative_to(mut self, frame: impl Into<String>) -> Self {
        self.relative_to = frame.into();
        self
    }
}

/// Kind of a [`Joint`].
///
/// Names are matched case-insensitively when loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JointType {
    Ball,
    Continuous,
    #[default]
    Fixed,
    Gearbox,
    Prismatic,
    Revolute,
    Revolute2,
    Screw,
    Universal,
}

impl std::fmt::Display for JointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JointType::Ball => "ball",
            JointType::Continuous => "continuous",
            JointType::Fixed => "fixed",
            JointType::Gearbox => "gearbox",
            JointType::Prismatic => "prismatic",
            JointType::Revolute => "revolute",
            JointType::Revolute2 => "revolute2",
            JointType::Screw => "screw",
            JointType::Universal => "universal",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for JointType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "ball" => JointType::Ball,
            "continuous" => JointType::Continuous,
            "fixed" => JointType::Fixed,
            "gearbox" => JointType::Gearbox,
            "prismatic" => JointType::Prismatic,
            "revolute" => JointType::Revolute,
            "revolute2" => JointType::Revolute2,
            "screw" => JointType::Screw,
            "universal" => JointType::Universal,
            _ => return Err(format!("unknown joint type [{s}]")),
        };
        Ok(kind)
    }
}

impl<'de> Deserialize<'de> for JointType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A joint connecting a parent link to a child link.  Its frame is attached
/// to the child link and, by default, its pose is expressed in the child
/// link's frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Joint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: JointType,
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relative_to: String,
}

impl Joint {
    pub fn new(
        name: impl Into<String>,
        kind: JointType,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: parent.into(),
            child: child.into(),
            ..Self::default()
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn relative_to(mut self, frame: impl Into<String>) -> Self {
        self.relative_to = frame.into();
        self
    }
}

/// An explicit, named frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    /// Entity this frame moves with; empty = enclosing scope.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attached_to: String,
    /// Frame the pose is expressed in; empty = `attached_to`, or the
    /// enclosing scope when that is empty too.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relative_to: String,
}

impl Frame {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn attached_to(mut self, frame: impl Into<String>) -> Self {
        self.attached_to = frame.into();
        self
    }

    pub fn relative_to(mut self, frame: impl Into<String>) -> Self {
        self.relative_to = frame.into();
        self
    }
}

/// A light source.  Lights are carried for completeness of the document;
/// they are not vertices of the frame graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Light {
    pub name: String,
    /// `point`, `directional` or `spot`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relative_to: String,
    #[serde(default)]
    pub cast_shadows: bool,
}
