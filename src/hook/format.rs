//! Post-edit formatter hook
//!
//! After an `Edit` or `Write` succeeds, formats the file by extension.
//! Formatting is best effort: a missing, failing or slow formatter is logged
//! and otherwise ignored.

use eyre::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use super::{HookEvent, HookHandler, HookPayload, HookResult};
use crate::config::{BuiltinFormatter, FormatterConfig, FormatterDirective};

/// Collapse runs of three or more newlines into one blank line
pub fn collapse_blank_lines(content: &str) -> Cow<'_, str> {
    lazy_regex::regex!(r"\n{3,}").replace_all(content, "\n\n")
}

/// Post-edit formatter hook handler
pub struct EditFormatter {
    enabled: bool,
    config: FormatterConfig,
}

impl EditFormatter {
    pub fn new(enabled: bool, config: FormatterConfig) -> Self {
        Self { enabled, config }
    }

    /// Directive for a path, matched on its extension ignoring case
    pub fn directive_for(&self, path: &Path) -> Option<&FormatterDirective> {
        let ext = path.extension()?.to_str()?;

        self.config
            .extensions
            .iter()
            .find(|(key, _)| key.trim_start_matches('.').eq_ignore_ascii_case(ext))
            .map(|(_, directive)| directive)
    }

    /// Format a file in place; true when the file was formatted
    pub fn format_file(&self, path: &Path) -> Result<bool> {
        match self.directive_for(path) {
            None => {
                log::debug!("No formatter for {}", path.display());
                Ok(false)
            }
            Some(FormatterDirective::Builtin(BuiltinFormatter::CollapseBlankLines)) => {
                Ok(rewrite_collapsed(path))
            }
            Some(FormatterDirective::Command(argv)) => self.run_external(argv, path),
        }
    }

    fn run_external(&self, argv: &[String], path: &Path) -> Result<bool> {
        let Some((program, args)) = argv.split_first() else {
            log::warn!("Empty formatter command for {}", path.display());
            return Ok(false);
        };

        if let Err(e) = which::which(program) {
            log::info!("Formatter '{}' not available: {}", program, e);
            return Ok(false);
        }

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let outcome = rt.block_on(async { tokio::time::timeout(timeout, cmd.output()).await });

        match outcome {
            Ok(Ok(output)) if output.status.success() => Ok(true),
            Ok(Ok(output)) => {
                log::info!(
                    "Formatter '{}' exited with {} for {}: {}",
                    program,
                    output.status,
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                Ok(false)
            }
            Ok(Err(e)) => {
                log::info!("Failed to run formatter '{}': {}", program, e);
                Ok(false)
            }
            Err(_) => {
                log::warn!(
                    "Formatter '{}' timed out after {}s on {}",
                    program,
                    timeout.as_secs(),
                    path.display()
                );
                Ok(false)
            }
        }
    }
}

/// Apply `collapse_blank_lines` to a file, writing only when it changes
fn rewrite_collapsed(path: &Path) -> bool {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::info!("Skipping markdown cleanup of {}: {}", path.display(), e);
            return false;
        }
    };

    let Cow::Owned(formatted) = collapse_blank_lines(&content) else {
        return false;
    };
    if formatted == content {
        return false;
    }

    match fs::write(path, formatted) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to rewrite {}: {}", path.display(), e);
            false
        }
    }
}

impl HookHandler for EditFormatter {
    fn name(&self) -> &'static str {
        "edit-formatter"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn handles(&self, event: HookEvent) -> bool {
        event == HookEvent::PostToolUse
    }

    fn handle(&self, _event: HookEvent, payload: &HookPayload) -> Result<HookResult> {
        if !matches!(payload.tool_name.as_str(), "Edit" | "Write") {
            return Ok(HookResult::Allow);
        }

        if payload.tool_response.get("success").and_then(|v| v.as_bool()) == Some(false) {
            log::debug!("{} did not succeed, nothing to format", payload.tool_name);
            return Ok(HookResult::Allow);
        }

        let file_path = payload.input_str("file_path");
        if file_path.is_empty() {
            return Ok(HookResult::Allow);
        }

        let path = Path::new(file_path);
        if !path.exists() {
            log::debug!("Edited file no longer exists: {}", path.display());
            return Ok(HookResult::Allow);
        }

        if !self.format_file(path)? {
            return Ok(HookResult::Allow);
        }

        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        log::info!("Formatted {}", path.display());
        Ok(HookResult::Inform {
            message: format!("Formatted {}", name),
        })
    }
}
