//! Command guard hook
//!
//! Blocks dangerous Bash commands before they execute and nudges toward
//! faster tools. Blocking stops at the first matching rule; suggestions
//! collect every matching rule.

use eyre::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use super::{HookEvent, HookHandler, HookPayload, HookResult};
use crate::config::{GuardConfig, RuleSpec};

/// A pattern and the message reported when it matches
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    /// Tested against the rest of the line after each match; a hit discards that match
    unless: Option<Regex>,
    message: String,
}

impl Rule {
    fn new(pattern: &Regex, message: &str) -> Self {
        Self {
            pattern: pattern.clone(),
            unless: None,
            message: message.to_string(),
        }
    }

    fn unless(mut self, pattern: &Regex) -> Self {
        self.unless = Some(pattern.clone());
        self
    }

    fn from_spec(spec: &RuleSpec, case_insensitive: bool) -> Result<Self> {
        let pattern = RegexBuilder::new(&spec.pattern)
            .case_insensitive(case_insensitive)
            .build()
            .with_context(|| format!("Invalid guard pattern: {}", spec.pattern))?;

        Ok(Self {
            pattern,
            unless: None,
            message: spec.message.clone(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_match(&self, command: &str) -> bool {
        let Some(unless) = &self.unless else {
            return self.pattern.is_match(command);
        };

        self.pattern
            .find_iter(command)
            .any(|m| !unless.is_match(&command[m.end()..]))
    }
}

static BLOCKED_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            lazy_regex::regex!(r"(?i)\brm\s+-rf\s+[/~]"),
            "Blocking recursive delete on root or home directory",
        ),
        Rule::new(
            // `-f` only counts inside the push itself, not in a chained command
            lazy_regex::regex!(r"(?i)\bgit\s+push\s+.*--force|\bgit\s+push\b[^;&|\n]*\s-f\b"),
            "Blocking force push - use --force-with-lease instead",
        ),
        Rule::new(
            lazy_regex::regex!(r"(?i)\bchmod\s+(?:-[a-z]+\s+)*0?777\b"),
            "Blocking chmod 777 - too permissive",
        ),
        Rule::new(
            lazy_regex::regex!(r"(?i)\b(?:curl|wget)\s+.*\|\s*(?:ba|z)?sh\b"),
            "Blocking piped curl to bash - security risk",
        ),
    ]
});

static SUGGESTION_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(
            lazy_regex::regex!(r"\bgrep\b"),
            "Consider using 'rg' (ripgrep) for better performance",
        )
        .unless(lazy_regex::regex!(r"^.*\|.*rg")),
        Rule::new(
            lazy_regex::regex!(r"\bfind\s+\S+\s+-name\b"),
            "Consider using 'fd' or 'rg --files' for better performance",
        ),
    ]
});

/// What the guard thinks of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub blocked: Option<String>,
    pub suggestions: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HookSpecificOutput {
    hook_event_name: String,
    additional_context: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionOutput {
    hook_specific_output: HookSpecificOutput,
}

/// Command guard hook handler
pub struct CommandGuard {
    enabled: bool,
    blocked: Vec<Rule>,
    suggestions: Vec<Rule>,
}

impl CommandGuard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            blocked: BLOCKED_RULES.to_vec(),
            suggestions: SUGGESTION_RULES.to_vec(),
        }
    }

    /// Built-in rules followed by the extra rules from config
    pub fn from_config(enabled: bool, config: &GuardConfig) -> Result<Self> {
        let mut guard = Self::new(enabled);

        for spec in &config.extra_blocked {
            guard.blocked.push(Rule::from_spec(spec, true)?);
        }
        for spec in &config.extra_suggestions {
            guard.suggestions.push(Rule::from_spec(spec, false)?);
        }

        Ok(guard)
    }

    pub fn blocked_rules(&self) -> &[Rule] {
        &self.blocked
    }

    pub fn suggestion_rules(&self) -> &[Rule] {
        &self.suggestions
    }

    /// First blocking rule that matches, if any
    pub fn block_reason(&self, command: &str) -> Option<&str> {
        self.blocked
            .iter()
            .find(|rule| rule.is_match(command))
            .map(|rule| rule.message())
    }

    /// Every suggestion rule that matches, in declaration order
    pub fn suggestions_for(&self, command: &str) -> Vec<&str> {
        self.suggestions
            .iter()
            .filter(|rule| rule.is_match(command))
            .map(|rule| rule.message())
            .collect()
    }

    pub fn evaluate(&self, command: &str) -> Verdict {
        if let Some(reason) = self.block_reason(command) {
            return Verdict {
                blocked: Some(reason.to_string()),
                suggestions: Vec::new(),
            };
        }

        Verdict {
            blocked: None,
            suggestions: self.suggestions_for(command).into_iter().map(String::from).collect(),
        }
    }

    fn validate_command(&self, event: HookEvent, command: &str) -> Result<HookResult> {
        let verdict = self.evaluate(command);

        if let Some(message) = verdict.blocked {
            log::warn!("Blocked command: {}", command);
            return Ok(HookResult::Block { message });
        }

        if verdict.suggestions.is_empty() {
            return Ok(HookResult::Allow);
        }

        let output = SuggestionOutput {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: event.to_string(),
                additional_context: format!("Suggestions: {}", verdict.suggestions.join("; ")),
            },
        };
        let message = serde_json::to_string(&output).context("Failed to serialize suggestions")?;

        Ok(HookResult::Inform { message })
    }
}

impl HookHandler for CommandGuard {
    fn name(&self) -> &'static str {
        "command-guard"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn handles(&self, event: HookEvent) -> bool {
        event == HookEvent::PreToolUse
    }

    fn handle(&self, event: HookEvent, payload: &HookPayload) -> Result<HookResult> {
        // Only check Bash commands
        if payload.tool_name != "Bash" {
            return Ok(HookResult::Allow);
        }

        let command = payload.input_str("command");
        if command.is_empty() {
            return Ok(HookResult::Allow);
        }

        self.validate_command(event, command)
    }
}
