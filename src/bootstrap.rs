//! Startup wiring: configuration to a ready tool registry.
//!
//! The policy and audit sink are built once here and passed down as values,
//! so every component sees the same immutable allowlist and the same sink.

use std::sync::Arc;

use serde::Serialize;

use crate::audit::{AuditSink, create_sink};
use crate::config::Config;
use crate::error::Error;
use crate::policy::PolicyMode;
use crate::server::StdioServer;
use crate::tools::{InvocationContext, MediatedExecutor, ToolRegistry};

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub mode: PolicyMode,
}

/// Fully wired gateway.
pub struct Gateway {
    config: Config,
    executor: Arc<MediatedExecutor>,
    registry: Arc<ToolRegistry>,
}

impl Gateway {
    /// Build the gateway with the sink described by `config.audit`.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let sink: Arc<dyn AuditSink> = Arc::from(create_sink(&config.audit)?);
        Ok(Self::with_sink(config, sink))
    }

    /// Build the gateway around an existing audit sink.
    pub fn with_sink(config: Config, sink: Arc<dyn AuditSink>) -> Self {
        let policy = Arc::new(config.policy.build());
        tracing::info!(
            mode = %config.policy.mode,
            enforce_allowlist = policy.enforces_allowlist(),
            sanitize_descriptions = config.policy.sanitizes_descriptions(),
            allowed = %policy.allowlist_display(),
            audit = sink.name(),
            "gateway configured"
        );
        if !policy.enforces_allowlist() {
            tracing::warn!("allowlist enforcement is disabled, every path is readable");
        }

        let executor = Arc::new(MediatedExecutor::new(policy, sink));
        let registry = Arc::new(ToolRegistry::with_builtin(
            Arc::clone(&executor),
            config.policy.sanitizes_descriptions(),
        ));

        Self {
            config,
            executor,
            registry,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &Arc<MediatedExecutor> {
        &self.executor
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Context for calls made without a transport-supplied identity.
    pub fn default_context(&self) -> InvocationContext {
        InvocationContext::new(self.config.audit.caller.clone())
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy",
            mode: self.config.policy.mode,
        }
    }

    pub fn stdio_server(&self) -> StdioServer {
        StdioServer::new(
            Arc::clone(&self.registry),
            self.config.policy.mode,
            self.config.audit.caller.clone(),
        )
    }
}
