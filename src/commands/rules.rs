//! Rule table listing

use colored::*;
use eyre::Result;
use serde::Serialize;
use terminal_size::{Width, terminal_size};

use crate::cli::OutputFormat;
use crate::config::{BuiltinFormatter, Config, FormatterDirective};
use crate::hook::guard::{CommandGuard, Rule};

#[derive(Debug, Serialize)]
struct RuleInfo {
    pattern: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct FormatterInfo {
    extension: String,
    formatter: String,
    available: bool,
}

#[derive(Debug, Serialize)]
struct RulesReport {
    blocked: Vec<RuleInfo>,
    suggestions: Vec<RuleInfo>,
    formatters: Vec<FormatterInfo>,
}

pub fn run(format: OutputFormat, config: &Config) -> Result<()> {
    let guard = CommandGuard::from_config(config.hooks.guard_enabled, &config.guard)?;
    let report = build_report(&guard, config);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&report)?),
        OutputFormat::Text => print_text(&report),
    }

    Ok(())
}

fn rule_infos(rules: &[Rule]) -> Vec<RuleInfo> {
    rules
        .iter()
        .map(|r| RuleInfo {
            pattern: r.pattern().to_string(),
            message: r.message().to_string(),
        })
        .collect()
}

fn build_report(guard: &CommandGuard, config: &Config) -> RulesReport {
    let formatters = config
        .formatter
        .extensions
        .iter()
        .map(|(ext, directive)| match directive {
            FormatterDirective::Command(argv) => FormatterInfo {
                extension: ext.clone(),
                formatter: argv.join(" "),
                available: argv.first().is_some_and(|program| which::which(program).is_ok()),
            },
            FormatterDirective::Builtin(BuiltinFormatter::CollapseBlankLines) => FormatterInfo {
                extension: ext.clone(),
                formatter: "(built-in) collapse blank lines".to_string(),
                available: true,
            },
        })
        .collect();

    RulesReport {
        blocked: rule_infos(guard.blocked_rules()),
        suggestions: rule_infos(guard.suggestion_rules()),
        formatters,
    }
}

/// Get terminal width, defaulting to 80 if not available
fn get_terminal_width() -> usize {
    terminal_size().map(|(Width(w), _)| w as usize).unwrap_or(80)
}

/// Greedy word wrap; a word wider than `width` sits on its own line
fn wrap_words(s: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for word in s.split_whitespace() {
        match lines.last_mut() {
            Some(line) if line.chars().count() + 1 + word.chars().count() <= width => {
                line.push(' ');
                line.push_str(word);
            }
            _ => lines.push(word.to_string()),
        }
    }
    lines
}

fn print_rule_section(title: &str, rules: &[RuleInfo], term_width: usize) {
    println!("{}", title.bold());

    if rules.is_empty() {
        println!("  {}", "(none)".dimmed());
        println!();
        return;
    }

    let num_width = rules.len().to_string().len();
    let indent = " ".repeat(2 + num_width + 2);
    let width = term_width.saturating_sub(indent.len()).max(20);

    for (i, rule) in rules.iter().enumerate() {
        let lines = wrap_words(&rule.message, width);
        println!(
            "  {:>num_width$}  {}",
            (i + 1).to_string().cyan(),
            lines.first().map(String::as_str).unwrap_or(""),
            num_width = num_width,
        );
        for line in lines.iter().skip(1) {
            println!("{}{}", indent, line);
        }
        println!("{}{}", indent, rule.pattern.dimmed());
    }
    println!();
}

fn print_text(report: &RulesReport) {
    let term_width = get_terminal_width();

    print_rule_section("Blocking rules (first match blocks)", &report.blocked, term_width);
    print_rule_section("Suggestion rules (all matches reported)", &report.suggestions, term_width);

    println!("{}", "Formatters".bold());
    let ext_width = report.formatters.iter().map(|f| f.extension.len()).max().unwrap_or(3);
    for f in &report.formatters {
        let status = if f.available { "✓".green() } else { "✗".red() };
        println!(
            "  {:<ext_width$}  {} {}",
            f.extension.cyan(),
            status,
            f.formatter,
            ext_width = ext_width,
        );
    }
}
