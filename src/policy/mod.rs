//! Path canonicalization and the access policy engine.
//!
//! Every mediated operation runs the raw path through [`canonicalize`] and
//! asks the [`AccessPolicy`] about the result. Neither step touches the
//! filesystem, and nothing is cached between calls.

pub mod canonical;
pub mod engine;

pub use canonical::{TRAVERSAL_TOKEN, canonicalize};
pub use engine::{
    AccessPolicy, DANGER_PATTERNS, DangerClass, DenialDisclosure, PathKind, PolicyDecision,
    PolicyMode,
};
