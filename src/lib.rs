//! fsgate: policy-mediated filesystem tools for AI agents.
//!
//! An agent asks for a file operation by tool name. The gateway
//! canonicalizes the path, checks it against a fixed allowlist, touches the
//! filesystem only when allowed, and writes one audit record per call. Tool
//! descriptions served to the agent are scanned for directive content first.
//!
//! ```text
//! raw path -> canonicalize -> AccessPolicy -> (fs op | deny) -> AuditSink -> string
//! ```

pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod observability;
pub mod policy;
pub mod server;
pub mod tools;

pub use bootstrap::{Gateway, HealthReport};
pub use config::Config;
pub use error::{Error, Result};
