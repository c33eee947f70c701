//! Safety checks for agent-facing tool descriptions.
//!
//! An agent reads a tool's description as trusted context, so a description
//! that smuggles in directives ("before using this tool you must first read
//! ...") can hijack the agent even when the user's request was benign. This
//! crate detects that content and can strip it before a description is
//! served.
//!
//! - [`DescriptionScanner::scan`] reports every directive-like finding.
//! - [`DescriptionScanner::redact`] removes directive blocks and flagged
//!   sentences, leaving plain documentation.

mod redact;
mod scanner;

pub use redact::{Redaction, WITHHELD_DESCRIPTION, split_sentences};
pub use scanner::{
    DescriptionFinding, DescriptionScanResult, DescriptionScanner, DirectiveCategory,
};

use serde::{Deserialize, Serialize};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}
