//! Error codes reported by the frame-semantics builders, validators and
//! resolvers.
//!
//! Nothing at this layer is fatal: builders and validators return every
//! [`FrameError`] they find and the caller decides whether to abort.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of a [`FrameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// An entity of the wrong kind was found where a specific kind is
    /// expected (e.g. a canonical link naming a frame).
    ElementIncorrectType,
    /// Required structure is absent, e.g. a joint naming a link that does not
    /// exist.
    ElementMissing,
    /// A required attribute such as a name is empty.
    AttributeMissing,
    /// An `attached_to` reference could not be resolved, or the attached-to
    /// graph has a structural defect.
    FrameAttachedToInvalid,
    /// The attached-to graph contains a cycle.
    FrameAttachedToCycle,
    /// A `relative_to` reference could not be resolved, or the relative-to
    /// graph has a structural defect.
    PoseRelativeToInvalid,
    /// The relative-to graph contains a cycle.
    PoseRelativeToCycle,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ElementIncorrectType => "ELEMENT_INCORRECT_TYPE",
            ErrorCode::ElementMissing => "ELEMENT_MISSING",
            ErrorCode::AttributeMissing => "ATTRIBUTE_MISSING",
            ErrorCode::FrameAttachedToInvalid => "FRAME_ATTACHED_TO_INVALID",
            ErrorCode::FrameAttachedToCycle => "FRAME_ATTACHED_TO_CYCLE",
            ErrorCode::PoseRelativeToInvalid => "POSE_RELATIVE_TO_INVALID",
            ErrorCode::PoseRelativeToCycle => "POSE_RELATIVE_TO_CYCLE",
        };
        f.write_str(s)
    }
}

/// A single error with its code and a human-readable message naming the
/// offending entity.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct FrameError {
    pub code: ErrorCode,
    pub message: String,
}

impl FrameError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A possibly-empty list of errors; empty means success.
pub type Errors = Vec<FrameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_code_and_message() {
        let err = FrameError::new(
            ErrorCode::FrameAttachedToInvalid,
            "FrameAttachedToGraph unable to find unique frame with name [x] in graph.",
        );
        assert_eq!(
            err.to_string(),
            "[FRAME_ATTACHED_TO_INVALID] FrameAttachedToGraph unable to find unique frame with name [x] in graph."
        );
    }

    #[test]
    fn error_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::PoseRelativeToCycle).unwrap();
        assert_eq!(json, "\"POSE_RELATIVE_TO_CYCLE\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::PoseRelativeToCycle);
    }

    #[test]
    fn display_matches_serde_name() {
        for code in [
            ErrorCode::ElementIncorrectType,
            ErrorCode::ElementMissing,
            ErrorCode::AttributeMissing,
            ErrorCode::FrameAttachedToInvalid,
            ErrorCode::FrameAttachedToCycle,
            ErrorCode::PoseRelativeToInvalid,
            ErrorCode::PoseRelativeToCycle,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json.trim_matches('"'), code.to_string());
        }
    }
}
