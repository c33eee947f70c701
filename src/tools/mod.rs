//! Mediated file tools.
//!
//! Tools never reach the filesystem directly. Every call goes through the
//! [`MediatedExecutor`], which canonicalizes the path, applies the
//! [`AccessPolicy`](crate::policy::AccessPolicy) and records an audit entry.

pub mod builtin;
pub mod executor;
pub mod fs;
mod registry;
pub mod tool;

pub use executor::{AUDIT_FAILURE, EMPTY_DIRECTORY, MediatedExecutor};
pub use fs::{FsAccess, FsOutcome, LocalFs};
pub use registry::{DescriptionReport, ToolRegistry};
pub use tool::{DEFAULT_CALLER, InvocationContext, Tool, ToolDescriptor, require_str};
