//! Access policy: allowlist decisions and danger classification.

use serde::{Deserialize, Serialize};

use crate::policy::canonical::canonicalize;

/// Substrings that mark a path as suspicious, scanned in this order.
///
/// `classify_danger` reports the first entry found, so the order is part of
/// the observable output.
pub const DANGER_PATTERNS: &[&str] = &["../", "/etc/", "/root/", "/home/", "~", "/proc/", "/sys/"];

/// What the caller intends to do with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    File,
    /// Compared with a trailing separator, so an allowed directory itself
    /// may be listed.
    Directory,
}

/// Outcome of an allowlist check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyDecision {
    Allowed,
    Denied,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Advisory danger classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DangerClass {
    Clean,
    Dangerous(&'static str),
}

/// Which policy posture to run with.
///
/// `Permissive` reproduces an unprotected server: no allowlist enforcement
/// and descriptions served verbatim. It exists so regressions between the two
/// postures can be tested against one implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    #[default]
    Secure,
    #[serde(alias = "vulnerable")]
    Permissive,
}

impl PolicyMode {
    pub fn enforces_allowlist(&self) -> bool {
        matches!(self, Self::Secure)
    }

    pub fn sanitizes_descriptions(&self) -> bool {
        matches!(self, Self::Secure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secure => "secure",
            Self::Permissive => "permissive",
        }
    }
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secure" => Ok(Self::Secure),
            "permissive" | "vulnerable" => Ok(Self::Permissive),
            other => Err(format!(
                "unknown policy mode '{other}', expected 'secure' or 'permissive'"
            )),
        }
    }
}

/// How much a denial message reveals about the allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialDisclosure {
    /// Name the allowed directories. Helps legitimate callers, but confirms
    /// the allowlist to a probing one.
    #[default]
    Full,
    /// Deny without enumerating directories.
    Generic,
}

/// Immutable access policy shared by every invocation.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed: Vec<String>,
    enforce_allowlist: bool,
    disclosure: DenialDisclosure,
}

impl AccessPolicy {
    /// Build a policy from configured directory prefixes.
    ///
    /// Each entry is canonicalized and stored with exactly one trailing `/`
    /// so `/srv/pub` can never match `/srv/public`.
    pub fn new<I, S>(allowed_directories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed_directories
            .into_iter()
            .map(|dir| {
                let canonical = canonicalize(dir.as_ref());
                if canonical.ends_with('/') {
                    canonical
                } else {
                    format!("{canonical}/")
                }
            })
            .collect();

        Self {
            allowed,
            enforce_allowlist: true,
            disclosure: DenialDisclosure::default(),
        }
    }

    /// Turn allowlist enforcement on or off.
    pub fn with_enforcement(mut self, enforce_allowlist: bool) -> Self {
        self.enforce_allowlist = enforce_allowlist;
        self
    }

    pub fn with_disclosure(mut self, disclosure: DenialDisclosure) -> Self {
        self.disclosure = disclosure;
        self
    }

    /// Normalized allowlist entries, each ending in `/`.
    pub fn allowed_directories(&self) -> &[String] {
        &self.allowed
    }

    pub fn enforces_allowlist(&self) -> bool {
        self.enforce_allowlist
    }

    pub fn disclosure(&self) -> DenialDisclosure {
        self.disclosure
    }

    /// Whether `canonical_path` falls under an allowed directory.
    ///
    /// Any matching entry suffices; order is irrelevant.
    pub fn is_allowed(&self, canonical_path: &str, kind: PathKind) -> bool {
        !self.enforce_allowlist || self.within_allowlist(canonical_path, kind)
    }

    /// Prefix check against the allowlist, regardless of enforcement.
    pub fn within_allowlist(&self, canonical_path: &str, kind: PathKind) -> bool {
        let candidate = match kind {
            PathKind::File => canonical_path.to_string(),
            PathKind::Directory => format!("{canonical_path}/"),
        };

        self.allowed.iter().any(|prefix| candidate.starts_with(prefix))
    }

    pub fn decide(&self, canonical_path: &str, kind: PathKind) -> PolicyDecision {
        if self.is_allowed(canonical_path, kind) {
            PolicyDecision::Allowed
        } else {
            PolicyDecision::Denied
        }
    }

    /// First danger pattern contained in `canonical_path`, in
    /// [`DANGER_PATTERNS`] order.
    ///
    /// Independent of [`is_allowed`](Self::is_allowed): an allowed directory
    /// that textually contains a pattern (say `/home/agent/`) is still
    /// flagged.
    pub fn classify_danger(&self, canonical_path: &str) -> DangerClass {
        DANGER_PATTERNS
            .iter()
            .copied()
            .find(|pattern| canonical_path.contains(pattern))
            .map_or(DangerClass::Clean, DangerClass::Dangerous)
    }

    /// Allowlist rendered for messages, e.g. `[/a/, /b/]`.
    pub fn allowlist_display(&self) -> String {
        format!("[{}]", self.allowed.join(", "))
    }
}
