use std::fmt;

use serde::Serialize;

use crate::instance::{Attribute, AttributeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comment {
    #[serde(rename = "drift detected")]
    DriftDetected,
    #[serde(rename = "no drift detected")]
    NoDriftDetected,
    #[serde(rename = "missing state")]
    MissingState,
}

impl Comment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comment::DriftDetected => "drift detected",
            Comment::NoDriftDetected => "no drift detected",
            Comment::MissingState => "missing state",
        }
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute whose declared and live values differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDrift {
    pub name: Attribute,
    pub expected: AttributeValue,
    pub found: AttributeValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub instance_id: String,
    pub drifts: Vec<AttributeDrift>,
    pub comment: Comment,
}

impl Report {
    /// Builds a report for an instance present on both sides.
    pub fn compared(instance_id: impl Into<String>, drifts: Vec<AttributeDrift>) -> Self {
        let comment = if drifts.is_empty() {
            Comment::NoDriftDetected
        } else {
            Comment::DriftDetected
        };
        Self {
            instance_id: instance_id.into(),
            drifts,
            comment,
        }
    }

    pub fn missing(instance_id: impl Into<String>, drifts: Vec<AttributeDrift>) -> Self {
        Self {
            instance_id: instance_id.into(),
            drifts,
            comment: Comment::MissingState,
        }
    }

    pub fn has_drift(&self) -> bool {
        self.comment != Comment::NoDriftDetected
    }

    pub fn drifted_attributes(&self) -> Vec<Attribute> {
        self.drifts.iter().map(|d| d.name).collect()
    }
}
