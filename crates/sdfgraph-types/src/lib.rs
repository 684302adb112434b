//! `sdfgraph-types` – shared vocabulary of the sdfgraph workspace.
//!
//! # Modules
//!
//! - [`entity`] – the typed scene document: [`Root`], [`World`], [`Model`],
//!   [`Link`], [`Joint`], [`Frame`] and [`Light`].
//! - [`pose`] – [`Pose`]: rigid-body transforms with parent-on-the-left
//!   composition.
//! - [`error`] – [`ErrorCode`] and [`FrameError`], the error vocabulary of the
//!   frame graphs.

pub mod entity;
pub mod error;
pub mod pose;

pub use entity::{Frame, Joint, JointType, Light, Link, MODEL_FRAME, Model, Root, WORLD_FRAME, World};
pub use error::{ErrorCode, Errors, FrameError};
pub use pose::{Pose, Quaternion, Vector3};
