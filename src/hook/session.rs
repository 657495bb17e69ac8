//! Session start hook
//!
//! Builds the short context block Claude Code injects at session start:
//! when the session began, where it runs, and the project's context file.

use eyre::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::{HookEvent, HookHandler, HookPayload, HookResult};

/// Current local time at minute precision
fn get_local_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Session context hook handler
pub struct SessionContextBuilder {
    enabled: bool,
    context_file: PathBuf,
}

impl SessionContextBuilder {
    pub fn new(enabled: bool, context_file: PathBuf) -> Self {
        Self { enabled, context_file }
    }

    /// Context fragments for a working directory, in output order
    pub fn build(&self, cwd: &str, timestamp: &str) -> Result<Vec<String>> {
        let mut parts = vec![
            format!("Session started: {}", timestamp),
            format!("Working directory: {}", cwd),
        ];

        let project_context = PathBuf::from(cwd).join(&self.context_file);
        if project_context.exists() {
            let content = fs::read_to_string(&project_context)
                .with_context(|| format!("Failed to read {}", project_context.display()))?;
            parts.push(format!("Project context:\n{}", content));
        }

        Ok(parts)
    }
}

impl HookHandler for SessionContextBuilder {
    fn name(&self) -> &'static str {
        "session-context"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn handles(&self, event: HookEvent) -> bool {
        event == HookEvent::SessionStart
    }

    fn handle(&self, _event: HookEvent, payload: &HookPayload) -> Result<HookResult> {
        let cwd = match &payload.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir()
                .context("Failed to determine working directory")?
                .display()
                .to_string(),
        };

        let session_id: String = payload.session_id.as_deref().unwrap_or("unknown").chars().take(8).collect();
        log::info!(
            "Session {} started ({:?}) in {}",
            session_id,
            payload.source,
            cwd
        );

        let parts = self.build(&cwd, &get_local_timestamp())?;

        Ok(HookResult::Inform {
            message: parts.join("\n"),
        })
    }
}
