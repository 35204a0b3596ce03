//! ec2diff - EC2 drift detection
//!
//! Compares EC2 instances declared in Terraform state or HCL against the
//! live instances reported by AWS, and reports per-attribute drift.

pub mod app;
pub mod drift;
pub mod error;
pub mod instance;
pub mod output;
pub mod providers;
pub mod report;
pub mod terraform;

pub use app::{RunConfig, execute, load_declared};
pub use drift::DriftChecker;
pub use error::Ec2DiffError;
pub use instance::{Attribute, AttributeValue, Instance, InstanceMap};
pub use report::{AttributeDrift, Comment, Report};
