//! Mediated execution of file operations.
//!
//! Every operation follows the same path: canonicalize the raw path, ask the
//! [`AccessPolicy`], touch the filesystem only when allowed, emit exactly one
//! [`AuditRecord`], and return a plain string. Nothing escapes as an error:
//! the calling agent pattern-matches on the `ERROR:` / `WARNING:` / `OK:`
//! prefix instead.

use std::path::Path;
use std::sync::Arc;

use crate::audit::{AuditAction, AuditOutcome, AuditRecord, AuditSink};
use crate::error::AccessFault;
use crate::policy::{AccessPolicy, DangerClass, DenialDisclosure, PathKind, canonicalize};
use crate::tools::fs::{FsAccess, LocalFs};
use crate::tools::tool::InvocationContext;

/// Returned when a listing succeeds with no entries.
pub const EMPTY_DIRECTORY: &str = "Directory is empty";

/// Returned instead of the operation's result when the audit write fails.
pub const AUDIT_FAILURE: &str = "ERROR: Audit log unavailable; operation aborted";

/// Executes read / list / safety-check operations under an access policy.
pub struct MediatedExecutor {
    policy: Arc<AccessPolicy>,
    audit: Arc<dyn AuditSink>,
    fs: Arc<dyn FsAccess>,
}

impl MediatedExecutor {
    /// Create an executor over the local filesystem.
    pub fn new(policy: Arc<AccessPolicy>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            policy,
            audit,
            fs: Arc::new(LocalFs),
        }
    }

    /// Replace the filesystem backend.
    pub fn with_fs(mut self, fs: Arc<dyn FsAccess>) -> Self {
        self.fs = fs;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Read a whole file from an allowed directory.
    pub async fn read_file(&self, raw_path: &str, ctx: &InvocationContext) -> String {
        let canonical = canonicalize(raw_path);

        let result = if self.policy.decide(&canonical, PathKind::File).is_allowed() {
            self.fs
                .read_to_string(Path::new(&canonical))
                .await
                .into_result()
        } else {
            Err(AccessFault::PolicyDenied)
        };

        let (outcome, response) = match result {
            Ok(content) => (AuditOutcome::Success, content),
            Err(fault) => self.render_fault(
                AuditAction::Read,
                &canonical,
                &fault,
                "File",
                "Files can only be read from",
            ),
        };

        let record = AuditRecord::new(
            AuditAction::Read,
            raw_path,
            &canonical,
            outcome,
            &ctx.caller,
        );
        self.finish(record, response)
    }

    /// List the entries of an allowed directory.
    pub async fn list_files(&self, raw_directory: &str, ctx: &InvocationContext) -> String {
        let canonical = canonicalize(raw_directory);

        let result = if self.policy.decide(&canonical, PathKind::Directory).is_allowed() {
            self.fs.list_dir(Path::new(&canonical)).await.into_result()
        } else {
            Err(AccessFault::PolicyDenied)
        };

        let (outcome, response, entry_count) = match result {
            Ok(entries) if entries.is_empty() => {
                (AuditOutcome::Success, EMPTY_DIRECTORY.to_string(), Some(0))
            }
            Ok(entries) => (AuditOutcome::Success, entries.join("\n"), Some(entries.len())),
            Err(fault) => {
                let (outcome, response) = self.render_fault(
                    AuditAction::List,
                    &canonical,
                    &fault,
                    "Directory",
                    "Can only list",
                );
                (outcome, response, None)
            }
        };

        let mut record = AuditRecord::new(
            AuditAction::List,
            raw_directory,
            &canonical,
            outcome,
            &ctx.caller,
        );
        if let Some(count) = entry_count {
            record = record.with_entry_count(count);
        }
        self.finish(record, response)
    }

    /// Classify a path without touching the filesystem.
    ///
    /// A danger pattern wins over the allowlist: a path that is both allowed
    /// and dangerous is reported as a warning. Allowlist membership is
    /// reported as configured, even when the policy does not enforce it.
    pub fn check_file_safety(&self, raw_path: &str, ctx: &InvocationContext) -> String {
        let canonical = canonicalize(raw_path);

        let (outcome, response) = match self.policy.classify_danger(&canonical) {
            DangerClass::Dangerous(pattern) => self.render_fault(
                AuditAction::CheckSafety,
                &canonical,
                &AccessFault::DangerPatternMatched(pattern.to_string()),
                "File",
                "",
            ),
            DangerClass::Clean if self.policy.within_allowlist(&canonical, PathKind::File) => (
                AuditOutcome::Safe,
                format!("OK: {canonical} is in an allowed directory and appears safe to access"),
            ),
            DangerClass::Clean => {
                let response = match self.policy.disclosure() {
                    DenialDisclosure::Full => format!(
                        "WARNING: {canonical} is outside allowed directories ({})",
                        self.policy.allowlist_display()
                    ),
                    DenialDisclosure::Generic => {
                        format!("WARNING: {canonical} is outside allowed directories")
                    }
                };
                (AuditOutcome::OutsideAllowed, response)
            }
        };

        let record = AuditRecord::new(
            AuditAction::CheckSafety,
            raw_path,
            &canonical,
            outcome,
            &ctx.caller,
        );
        self.finish(record, response)
    }

    /// Map a fault to its audit outcome and agent-facing message.
    fn render_fault(
        &self,
        action: AuditAction,
        canonical: &str,
        fault: &AccessFault,
        subject: &str,
        denial_lead: &str,
    ) -> (AuditOutcome, String) {
        match fault {
            AccessFault::PolicyDenied => {
                tracing::warn!(
                    action = action.as_str(),
                    path = %canonical,
                    "access denied: outside allowed directories"
                );
                let response = match self.policy.disclosure() {
                    DenialDisclosure::Full => format!(
                        "ERROR: Access denied. {denial_lead}: {}",
                        self.policy.allowlist_display()
                    ),
                    DenialDisclosure::Generic => "ERROR: Access denied.".to_string(),
                };
                (AuditOutcome::Blocked, response)
            }
            AccessFault::NotFound => (
                AuditOutcome::NotFound,
                format!("ERROR: {subject} not found: {canonical}"),
            ),
            AccessFault::PermissionDenied => {
                tracing::warn!(
                    action = action.as_str(),
                    path = %canonical,
                    "permission denied by OS"
                );
                (
                    AuditOutcome::PermissionDenied,
                    format!("ERROR: Permission denied: {canonical}"),
                )
            }
            AccessFault::Io(detail) => {
                tracing::warn!(
                    action = action.as_str(),
                    path = %canonical,
                    error = %detail,
                    "I/O fault"
                );
                (AuditOutcome::Error(detail.clone()), format!("ERROR: {detail}"))
            }
            AccessFault::DangerPatternMatched(pattern) => {
                tracing::warn!(
                    action = action.as_str(),
                    path = %canonical,
                    %pattern,
                    "safety check flagged path"
                );
                (
                    AuditOutcome::Dangerous(pattern.clone()),
                    format!("WARNING: {canonical} contains dangerous pattern '{pattern}'"),
                )
            }
        }
    }

    /// Emit the audit record, then release the response.
    ///
    /// A failed emit withholds the response so no operation completes
    /// without its record.
    fn finish(&self, record: AuditRecord, response: String) -> String {
        match self.audit.emit(&record) {
            Ok(()) => response,
            Err(e) => {
                tracing::error!(
                    sink = self.audit.name(),
                    action = record.action.as_str(),
                    path = %record.canonical_path,
                    error = %e,
                    "audit emit failed, withholding result"
                );
                AUDIT_FAILURE.to_string()
            }
        }
    }
}

impl std::fmt::Debug for MediatedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediatedExecutor")
            .field("policy", &self.policy)
            .field("audit", &self.audit.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::error::AuditError;
    use crate::tools::fs::FsOutcome;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        audit: MemoryAuditSink,
        executor: MediatedExecutor,
    }

    /// Allowlist `<tmp>/public/` and `<tmp>/user_files/`.
    fn fixture(policy: impl FnOnce(AccessPolicy) -> AccessPolicy) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir(root.join("public")).unwrap();
        std::fs::create_dir(root.join("user_files")).unwrap();
        std::fs::create_dir(root.join("private")).unwrap();
        std::fs::write(root.join("public/readme.txt"), "welcome").unwrap();
        std::fs::write(root.join("private/secret.txt"), "sk-secret").unwrap();

        let allowed = [
            format!("{}/public/", root.display()),
            format!("{}/user_files/", root.display()),
        ];
        let audit = MemoryAuditSink::new();
        let executor = MediatedExecutor::new(
            Arc::new(policy(AccessPolicy::new(allowed))),
            Arc::new(audit.clone()),
        );
        Fixture {
            _dir: dir,
            root,
            audit,
            executor,
        }
    }

    fn path(fx: &Fixture, rel: &str) -> String {
        format!("{}/{rel}", fx.root.display())
    }

    #[tokio::test]
    async fn reads_allowed_file() {
        let fx = fixture(|p| p);
        let ctx = InvocationContext::default();

        let out = fx.executor.read_file(&path(&fx, "public/readme.txt"), &ctx).await;

        assert_eq!(out, "welcome");
        let record = fx.audit.last().unwrap();
        assert_eq!(record.action, AuditAction::Read);
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.caller, "local");
    }

    #[tokio::test]
    async fn traversal_is_stripped_and_blocked() {
        let fx = fixture(|p| p);
        let ctx = InvocationContext::default();

        let out = fx.executor.read_file("../../../etc/passwd", &ctx).await;

        assert!(out.starts_with("ERROR: Access denied."), "{out}");
        assert!(!out.contains("root:"));
        let record = fx.audit.last().unwrap();
        assert_eq!(record.outcome, AuditOutcome::Blocked);
        assert_eq!(record.raw_path, "../../../etc/passwd");
        assert_eq!(record.canonical_path, "/etc/passwd");
    }

    #[tokio::test]
    async fn traversal_out_of_allowed_dir_stays_blocked() {
        let fx = fixture(|p| p);
        let raw = path(&fx, "public/../private/secret.txt");

        let out = fx.executor.read_file(&raw, &InvocationContext::default()).await;

        // ".." is stripped, so this names public/private/secret.txt, which
        // does not exist, and never reaches the real private directory.
        assert!(out.starts_with("ERROR: File not found:"), "{out}");
        assert!(!out.contains("sk-secret"));
        assert_eq!(fx.audit.last().unwrap().outcome, AuditOutcome::NotFound);
    }

    #[tokio::test]
    async fn denial_discloses_allowlist_by_default() {
        let fx = fixture(|p| p);
        let out = fx
            .executor
            .read_file(&path(&fx, "private/secret.txt"), &InvocationContext::default())
            .await;

        assert!(out.starts_with("ERROR: Access denied. Files can only be read from: ["));
        assert!(out.contains("/public/"));
        assert!(!out.contains("sk-secret"));
    }

    #[tokio::test]
    async fn generic_disclosure_hides_allowlist() {
        let fx = fixture(|p| p.with_disclosure(DenialDisclosure::Generic));
        let ctx = InvocationContext::default();

        assert_eq!(
            fx.executor.read_file("/etc/passwd", &ctx).await,
            "ERROR: Access denied."
        );
        assert_eq!(
            fx.executor.list_files("/etc", &ctx).await,
            "ERROR: Access denied."
        );
        assert_eq!(
            fx.executor.check_file_safety("/srv/data.txt", &ctx),
            "WARNING: /srv/data.txt is outside allowed directories"
        );
    }

    #[tokio::test]
    async fn permissive_mode_reads_outside_allowlist() {
        let fx = fixture(|p| p.with_enforcement(false));
        let out = fx
            .executor
            .read_file(&path(&fx, "private/secret.txt"), &InvocationContext::default())
            .await;
        assert_eq!(out, "sk-secret");
        assert_eq!(fx.audit.last().unwrap().outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() {
        let fx = fixture(|p| p);
        let raw = path(&fx, "public/missing.txt");

        let out = fx.executor.read_file(&raw, &InvocationContext::default()).await;

        assert_eq!(out, format!("ERROR: File not found: {raw}"));
        assert_eq!(fx.audit.last().unwrap().outcome, AuditOutcome::NotFound);
    }

    #[tokio::test]
    async fn reading_a_directory_reports_generic_error() {
        let fx = fixture(|p| p);
        std::fs::create_dir(fx.root.join("public/sub")).unwrap();

        let out = fx
            .executor
            .read_file(&path(&fx, "public/sub"), &InvocationContext::default())
            .await;

        assert!(out.starts_with("ERROR: "), "{out}");
        assert!(matches!(
            fx.audit.last().unwrap().outcome,
            AuditOutcome::Error(_)
        ));
    }

    #[tokio::test]
    async fn empty_allowed_directory_uses_sentinel() {
        let fx = fixture(|p| p);
        let out = fx
            .executor
            .list_files(&path(&fx, "user_files"), &InvocationContext::default())
            .await;

        assert_eq!(out, EMPTY_DIRECTORY);
        let record = fx.audit.last().unwrap();
        assert_eq!(record.outcome, AuditOutcome::Success);
        assert_eq!(record.entry_count, Some(0));
    }

    #[tokio::test]
    async fn lists_entries_newline_joined() {
        let fx = fixture(|p| p);
        std::fs::write(fx.root.join("public/another.txt"), "").unwrap();

        let out = fx
            .executor
            .list_files(&format!("{}/public/", fx.root.display()), &InvocationContext::default())
            .await;

        assert_eq!(out, "another.txt\nreadme.txt");
        assert_eq!(fx.audit.last().unwrap().entry_count, Some(2));
    }

    #[tokio::test]
    async fn list_outside_allowlist_is_blocked() {
        let fx = fixture(|p| p);
        let out = fx
            .executor
            .list_files(&path(&fx, "private"), &InvocationContext::default())
            .await;

        assert!(out.starts_with("ERROR: Access denied. Can only list: ["), "{out}");
        assert!(!out.contains("secret.txt"));
        assert_eq!(fx.audit.last().unwrap().outcome, AuditOutcome::Blocked);
    }

    #[tokio::test]
    async fn missing_directory_reports_not_found() {
        let fx = fixture(|p| p);
        let raw = path(&fx, "public/nowhere");
        let out = fx.executor.list_files(&raw, &InvocationContext::default()).await;
        assert_eq!(out, format!("ERROR: Directory not found: {raw}"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn safety_check_flags_danger_before_allowlist() {
        let fx = fixture(|p| p);
        let ctx = InvocationContext::default();

        let out = fx.executor.check_file_safety("/etc/passwd", &ctx);

        assert_eq!(out, "WARNING: /etc/passwd contains dangerous pattern '/etc/'");
        assert_eq!(
            fx.audit.last().unwrap().outcome,
            AuditOutcome::Dangerous("/etc/".into())
        );
        assert!(logs_contain("safety check flagged path"));
    }

    #[test]
    fn safety_check_danger_wins_over_allowed_prefix() {
        let audit = MemoryAuditSink::new();
        let executor = MediatedExecutor::new(
            Arc::new(AccessPolicy::new(["/home/agent/"])),
            Arc::new(audit.clone()),
        );

        let out =
            executor.check_file_safety("/home/agent/notes.txt", &InvocationContext::default());

        assert!(out.starts_with("WARNING:"), "{out}");
        assert!(out.contains("'/home/'"));
    }

    #[test]
    fn safety_check_ok_and_outside() {
        let audit = MemoryAuditSink::new();
        let executor = MediatedExecutor::new(
            Arc::new(AccessPolicy::new(["/srv/app/public/", "/srv/app/user_files/"])),
            Arc::new(audit.clone()),
        );
        let ctx = InvocationContext::default();

        // Never touches the filesystem, so the file need not exist.
        assert_eq!(
            executor.check_file_safety("/srv/app/public/readme.txt", &ctx),
            "OK: /srv/app/public/readme.txt is in an allowed directory and appears safe to access"
        );
        assert_eq!(audit.last().unwrap().outcome, AuditOutcome::Safe);

        assert_eq!(
            executor.check_file_safety("/srv/data.txt", &ctx),
            "WARNING: /srv/data.txt is outside allowed directories \
             ([/srv/app/public/, /srv/app/user_files/])"
        );
        assert_eq!(audit.last().unwrap().outcome, AuditOutcome::OutsideAllowed);
    }

    #[test]
    fn permissive_safety_check_reports_configured_allowlist() {
        let audit = MemoryAuditSink::new();
        let executor = MediatedExecutor::new(
            Arc::new(AccessPolicy::new(["/srv/app/public/"]).with_enforcement(false)),
            Arc::new(audit.clone()),
        );
        let ctx = InvocationContext::default();

        assert_eq!(
            executor.check_file_safety("/srv/data.txt", &ctx),
            "WARNING: /srv/data.txt is outside allowed directories ([/srv/app/public/])"
        );
        assert_eq!(audit.last().unwrap().outcome, AuditOutcome::OutsideAllowed);

        assert!(
            executor
                .check_file_safety("/srv/app/public/a.txt", &ctx)
                .starts_with("OK:")
        );
    }

    #[tokio::test]
    async fn every_invocation_emits_exactly_one_record() {
        let fx = fixture(|p| p);
        let ctx = InvocationContext::new("10.0.0.7");

        fx.executor.read_file(&path(&fx, "public/readme.txt"), &ctx).await;
        fx.executor.read_file("/etc/shadow", &ctx).await;
        fx.executor.read_file(&path(&fx, "public/none"), &ctx).await;
        fx.executor.list_files(&path(&fx, "public"), &ctx).await;
        fx.executor.list_files("/", &ctx).await;
        fx.executor.check_file_safety("~/.ssh/id_rsa", &ctx);
        fx.executor.check_file_safety("/srv/data.txt", &ctx);

        let records = fx.audit.records();
        assert_eq!(records.len(), 7);
        assert!(records.iter().all(|r| r.caller == "10.0.0.7"));
    }

    struct DeniedFs;

    #[async_trait]
    impl FsAccess for DeniedFs {
        async fn read_to_string(&self, _path: &Path) -> FsOutcome<String> {
            FsOutcome::PermissionDenied
        }

        async fn list_dir(&self, _path: &Path) -> FsOutcome<Vec<String>> {
            FsOutcome::PermissionDenied
        }
    }

    #[tokio::test]
    async fn os_permission_error_is_reported() {
        let audit = MemoryAuditSink::new();
        let executor = MediatedExecutor::new(
            Arc::new(AccessPolicy::new(["/srv/"])),
            Arc::new(audit.clone()),
        )
        .with_fs(Arc::new(DeniedFs));
        let ctx = InvocationContext::default();

        assert_eq!(
            executor.read_file("/srv/locked.txt", &ctx).await,
            "ERROR: Permission denied: /srv/locked.txt"
        );
        assert_eq!(
            executor.list_files("/srv/locked", &ctx).await,
            "ERROR: Permission denied: /srv/locked"
        );
        assert!(
            audit
                .records()
                .iter()
                .all(|r| r.outcome == AuditOutcome::PermissionDenied)
        );
    }

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn emit(&self, _record: &AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::Io(std::io::Error::other("read-only filesystem")))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn audit_failure_withholds_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "confidential").unwrap();
        let executor = MediatedExecutor::new(
            Arc::new(AccessPolicy::new([dir.path().display().to_string()])),
            Arc::new(FailingSink),
        );

        let out = executor
            .read_file(
                &format!("{}/notes.txt", dir.path().display()),
                &InvocationContext::default(),
            )
            .await;

        assert_eq!(out, AUDIT_FAILURE);
    }
}
