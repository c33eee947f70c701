//! Directive detection for tool descriptions.
//!
//! Looks for the shapes a poisoned description takes:
//! - Directive markers (`<IMPORTANT>` blocks, `[SYSTEM ...]` brackets)
//! - Imperatives addressed to the agent ("you must", "must first")
//! - Concealment requests ("do not mention this to the user")
//! - Exfiltration phrasing and embedded file paths
//! - Invisible characters that hide text from a human reviewer

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::Serialize;

use crate::Severity;

/// Result of scanning one description.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionScanResult {
    /// Findings, most severe first.
    pub findings: Vec<DescriptionFinding>,
    /// Whether at least one finding is critical.
    pub blocked: bool,
}

impl DescriptionScanResult {
    /// Returns true if no issues were found.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Fold another result into this one, keeping severity order.
    pub fn merge(&mut self, other: DescriptionScanResult) {
        self.findings.extend(other.findings);
        self.findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        self.blocked |= other.blocked;
    }

    pub fn summary(&self) -> String {
        if self.findings.is_empty() {
            "clean".to_string()
        } else {
            let categories: Vec<String> = self
                .findings
                .iter()
                .map(|f| f.category.to_string())
                .collect();
            format!(
                "{} finding(s): {}",
                self.findings.len(),
                categories.join(", ")
            )
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionFinding {
    pub category: DirectiveCategory,
    pub severity: Severity,
    pub description: String,
    /// The matched text.
    pub matched_text: String,
}

/// Categories of directive content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DirectiveCategory {
    /// Tag or bracket markers that frame hidden instructions.
    DirectiveMarker,
    /// Imperatives telling the agent to do something.
    Imperative,
    /// Requests to hide behavior from the user.
    Concealment,
    /// Requests to surface or send data elsewhere.
    DataExfiltration,
    /// Concrete file paths the agent could be steered to.
    EmbeddedPath,
    /// Attempts to override the agent's instructions.
    AuthorityEscalation,
    /// Zero-width or bidi control characters.
    InvisibleText,
}

impl std::fmt::Display for DirectiveCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectiveMarker => write!(f, "directive_marker"),
            Self::Imperative => write!(f, "imperative"),
            Self::Concealment => write!(f, "concealment"),
            Self::DataExfiltration => write!(f, "data_exfiltration"),
            Self::EmbeddedPath => write!(f, "embedded_path"),
            Self::AuthorityEscalation => write!(f, "authority_escalation"),
            Self::InvisibleText => write!(f, "invisible_text"),
        }
    }
}

struct PatternEntry {
    pattern: &'static str,
    category: DirectiveCategory,
    severity: Severity,
    description: &'static str,
}

struct RegexEntry {
    regex: Regex,
    category: DirectiveCategory,
    severity: Severity,
    description: &'static str,
}

const PHRASES: &[PatternEntry] = &[
    // -- Imperatives --
    PatternEntry {
        pattern: "must first",
        category: DirectiveCategory::Imperative,
        severity: Severity::Critical,
        description: "Precondition directive addressed to the agent",
    },
    PatternEntry {
        pattern: "you must",
        category: DirectiveCategory::Imperative,
        severity: Severity::High,
        description: "Second-person obligation",
    },
    PatternEntry {
        pattern: "you should",
        category: DirectiveCategory::Imperative,
        severity: Severity::Medium,
        description: "Second-person recommendation",
    },
    PatternEntry {
        pattern: "before using this tool",
        category: DirectiveCategory::Imperative,
        severity: Severity::High,
        description: "Pre-use directive",
    },
    PatternEntry {
        pattern: "before calling this tool",
        category: DirectiveCategory::Imperative,
        severity: Severity::High,
        description: "Pre-call directive",
    },
    // -- Concealment --
    PatternEntry {
        pattern: "do not tell",
        category: DirectiveCategory::Concealment,
        severity: Severity::Critical,
        description: "Asks the agent to hide information",
    },
    PatternEntry {
        pattern: "do not mention",
        category: DirectiveCategory::Concealment,
        severity: Severity::Critical,
        description: "Asks the agent to hide information",
    },
    PatternEntry {
        pattern: "don't mention",
        category: DirectiveCategory::Concealment,
        severity: Severity::Critical,
        description: "Asks the agent to hide information",
    },
    PatternEntry {
        pattern: "without telling",
        category: DirectiveCategory::Concealment,
        severity: Severity::Critical,
        description: "Asks the agent to act covertly",
    },
    // -- Exfiltration --
    PatternEntry {
        pattern: "include its contents",
        category: DirectiveCategory::DataExfiltration,
        severity: Severity::Critical,
        description: "Asks the agent to surface file contents",
    },
    PatternEntry {
        pattern: "include the contents",
        category: DirectiveCategory::DataExfiltration,
        severity: Severity::Critical,
        description: "Asks the agent to surface file contents",
    },
    PatternEntry {
        pattern: "in your response",
        category: DirectiveCategory::DataExfiltration,
        severity: Severity::Medium,
        description: "Shapes the agent's response",
    },
    PatternEntry {
        pattern: "exfiltrate",
        category: DirectiveCategory::DataExfiltration,
        severity: Severity::Critical,
        description: "Explicit exfiltration keyword",
    },
    // -- Authority escalation --
    PatternEntry {
        pattern: "ignore previous instructions",
        category: DirectiveCategory::AuthorityEscalation,
        severity: Severity::Critical,
        description: "Instruction override",
    },
    PatternEntry {
        pattern: "ignore all previous",
        category: DirectiveCategory::AuthorityEscalation,
        severity: Severity::Critical,
        description: "Instruction override",
    },
    PatternEntry {
        pattern: "system prompt",
        category: DirectiveCategory::AuthorityEscalation,
        severity: Severity::High,
        description: "References the agent's system prompt",
    },
];

/// Tag names that frame hidden instructions.
const MARKER_NAMES: &str = r"important|system|instructions?|hidden|secret";

/// Scanner for tool description text.
pub struct DescriptionScanner {
    phrase_matcher: AhoCorasick,
    regex_patterns: Vec<RegexEntry>,
    whitespace: Regex,
    /// Whole directive blocks removed by [`redact`](Self::redact).
    pub(crate) block_patterns: Vec<Regex>,
}

impl DescriptionScanner {
    /// Create a scanner with the default detection patterns.
    pub fn new() -> Self {
        let phrases: Vec<&str> = PHRASES.iter().map(|p| p.pattern).collect();
        let phrase_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&phrases)
            .expect("Failed to build description phrase matcher");

        let regex_patterns = vec![
            RegexEntry {
                regex: Regex::new(&format!(r"(?i)<\s*/?\s*(?:{MARKER_NAMES})\b[^>]*>"))
                    .expect("tag marker regex"),
                category: DirectiveCategory::DirectiveMarker,
                severity: Severity::Critical,
                description: "Tag-style directive marker",
            },
            RegexEntry {
                regex: Regex::new(&format!(r"(?i)\[\s*(?:{MARKER_NAMES})\b[^\]]*\]"))
                    .expect("bracket marker regex"),
                category: DirectiveCategory::DirectiveMarker,
                severity: Severity::Critical,
                description: "Bracketed directive marker",
            },
            RegexEntry {
                regex: Regex::new(r"(?m)^\s*(?:IMPORTANT|NOTE TO (?:AI|ASSISTANT|MODEL))\s*:")
                    .expect("heading marker regex"),
                category: DirectiveCategory::DirectiveMarker,
                severity: Severity::High,
                description: "Shouted directive heading",
            },
            RegexEntry {
                regex: Regex::new(
                    r"(?i)\b(?:always|must|shall)\s+(?:use|call|invoke|run|read|open)\b",
                )
                .expect("imperative regex"),
                category: DirectiveCategory::Imperative,
                severity: Severity::High,
                description: "Obligation to invoke an action",
            },
            RegexEntry {
                regex: Regex::new(r#"(?:^|[\s'"`(])(?:~|/)[A-Za-z0-9_.\-]*(?:/[A-Za-z0-9_.\-]+)+"#)
                    .expect("embedded path regex"),
                category: DirectiveCategory::EmbeddedPath,
                severity: Severity::High,
                description: "Embedded file path",
            },
            RegexEntry {
                regex: Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{FEFF}\u{00AD}]")
                    .expect("zero-width regex"),
                category: DirectiveCategory::InvisibleText,
                severity: Severity::High,
                description: "Zero-width character",
            },
            RegexEntry {
                regex: Regex::new(r"[\u{202A}-\u{202E}\u{2066}-\u{2069}]")
                    .expect("bidi regex"),
                category: DirectiveCategory::InvisibleText,
                severity: Severity::High,
                description: "Bidirectional override character",
            },
        ];

        let block_patterns = vec![
            Regex::new(&format!(
                r"(?is)<\s*(?:{MARKER_NAMES})\b[^>]*>.*?<\s*/\s*(?:{MARKER_NAMES})\s*>"
            ))
            .expect("marker block regex"),
            Regex::new(&format!(r"(?is)\[\s*(?:{MARKER_NAMES})\b[^\]]*\]"))
                .expect("bracket block regex"),
        ];

        Self {
            phrase_matcher,
            regex_patterns,
            whitespace: Regex::new(r"\s+").expect("whitespace regex"),
            block_patterns,
        }
    }

    /// Scan description text for directive content.
    pub fn scan(&self, text: &str) -> DescriptionScanResult {
        let mut findings = Vec::new();

        // Phrases are single-spaced, so match against collapsed whitespace.
        let collapsed = self.whitespace.replace_all(text, " ");

        // Overlapping so "you must first" reports both phrases.
        for mat in self.phrase_matcher.find_overlapping_iter(collapsed.as_ref()) {
            let entry = &PHRASES[mat.pattern().as_usize()];
            findings.push(DescriptionFinding {
                category: entry.category,
                severity: entry.severity,
                description: entry.description.to_string(),
                matched_text: collapsed[mat.start()..mat.end()].to_string(),
            });
        }

        for entry in &self.regex_patterns {
            for mat in entry.regex.find_iter(text) {
                findings.push(DescriptionFinding {
                    category: entry.category,
                    severity: entry.severity,
                    description: entry.description.to_string(),
                    matched_text: mat.as_str().trim().to_string(),
                });
            }
        }

        findings.sort_by(|a, b| b.severity.cmp(&a.severity));
        let blocked = findings.iter().any(|f| f.severity == Severity::Critical);

        DescriptionScanResult { findings, blocked }
    }
}

impl Default for DescriptionScanner {
    fn default() -> Self {
        Self::new()
    }
}
