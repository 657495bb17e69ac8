//! Hook event handling
//!
//! Hooks are events fired by Claude Code at fixed points of the tool
//! lifecycle. Each invocation carries one JSON payload on stdin and answers
//! with an exit code plus stdout/stderr text.

use eyre::Result;
use serde::de::Error as _;
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};

use crate::config::Config;

pub mod dispatch;
pub mod format;
pub mod guard;
pub mod session;

/// Exit codes understood by Claude Code
pub const EXIT_ALLOW: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_BLOCK: i32 = 2;

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    SessionStart,
}

impl HookEvent {
    pub const ALL: [HookEvent; 3] = [Self::PreToolUse, Self::PostToolUse, Self::SessionStart];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "pretooluse" => Some(Self::PreToolUse),
            "posttooluse" => Some(Self::PostToolUse),
            "sessionstart" => Some(Self::SessionStart),
            _ => None,
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::SessionStart => "SessionStart",
        };
        f.write_str(name)
    }
}

/// Why a session started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionSource {
    #[default]
    Startup,
    Resume,
    Clear,
    Compact,
    Unknown,
}

impl SessionSource {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "startup" => Self::Startup,
            "resume" => Self::Resume,
            "clear" => Self::Clear,
            "compact" => Self::Compact,
            _ => Self::Unknown,
        }
    }
}

/// The JSON object Claude Code writes to a hook's stdin.
///
/// Every field is optional and read leniently: a missing, `null` or
/// mistyped field takes its default, so one odd field never hides the rest.
#[derive(Debug, Clone, Default)]
pub struct HookPayload {
    pub tool_name: String,
    pub tool_input: Map<String, Value>,
    pub tool_response: Map<String, Value>,
    pub session_id: Option<String>,
    pub source: SessionSource,
    pub cwd: Option<String>,
}

impl HookPayload {
    /// Parse stdin; only invalid JSON or a non-object document is an error
    pub fn parse(raw: impl AsRef<[u8]>) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(raw.as_ref())?;
        let Value::Object(fields) = value else {
            return Err(serde_json::Error::custom("hook payload is not a JSON object"));
        };
        Ok(Self::from_fields(&fields))
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let string = |key: &str| fields.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let object = |key: &str| fields.get(key).and_then(|v| v.as_object()).cloned().unwrap_or_default();

        Self {
            tool_name: string("tool_name").unwrap_or_default(),
            tool_input: object("tool_input"),
            tool_response: object("tool_response"),
            session_id: string("session_id"),
            source: string("source").map(|s| SessionSource::from_str(&s)).unwrap_or_default(),
            cwd: string("cwd"),
        }
    }

    /// String field of `tool_input`, empty when absent or not a string
    pub fn input_str(&self, key: &str) -> &str {
        self.tool_input.get(key).and_then(|v| v.as_str()).unwrap_or("")
    }
}

/// Result of a hook handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookResult {
    /// Allow the action to proceed, say nothing
    Allow,
    /// Allow the action and hand text back to Claude on stdout
    Inform { message: String },
    /// Block the action (exit code 2, message on stderr)
    Block { message: String },
}

impl HookResult {
    pub fn exit_code(&self) -> i32 {
        match self {
            HookResult::Allow | HookResult::Inform { .. } => EXIT_ALLOW,
            HookResult::Block { .. } => EXIT_BLOCK,
        }
    }

    /// Write the result to the channel Claude Code reads for it
    pub fn emit(&self) {
        let result = self.emit_to(&mut io::stdout().lock(), &mut io::stderr().lock());
        if let Err(e) = result {
            log::warn!("Failed to write hook output: {}", e);
        }
    }

    /// A reader that hung up is not an error; the exit code still stands
    pub fn emit_to(&self, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
        let written = match self {
            HookResult::Allow => Ok(()),
            HookResult::Inform { message } => writeln!(out, "{}", message).and_then(|_| out.flush()),
            HookResult::Block { message } => writeln!(err, "{}", message).and_then(|_| err.flush()),
        };
        match written {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }
}

/// A hook handler
pub trait HookHandler {
    fn name(&self) -> &'static str;
    fn enabled(&self) -> bool;
    fn handles(&self, event: HookEvent) -> bool;
    fn handle(&self, event: HookEvent, payload: &HookPayload) -> Result<HookResult>;
}

/// Build every handler from config, enabled or not
pub fn registry(config: &Config) -> Result<Vec<Box<dyn HookHandler>>> {
    let handlers: Vec<Box<dyn HookHandler>> = vec![
        Box::new(guard::CommandGuard::from_config(config.hooks.guard_enabled, &config.guard)?),
        Box::new(format::EditFormatter::new(
            config.hooks.formatter_enabled,
            config.formatter.clone(),
        )),
        Box::new(session::SessionContextBuilder::new(
            config.hooks.session_enabled,
            Config::expand_path(&config.session.context_file),
        )),
    ];
    Ok(handlers)
}
