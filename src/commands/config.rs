use colored::*;
use eyre::Result;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, FormatterDirective};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "cc-hooks Configuration".bold());
            println!();

            println!("log_level: {}", config.log_level.as_filter());
            println!();

            println!("{}:", "hooks".cyan());
            println!("  guard_enabled: {}", config.hooks.guard_enabled);
            println!("  formatter_enabled: {}", config.hooks.formatter_enabled);
            println!("  session_enabled: {}", config.hooks.session_enabled);
            println!();

            println!("{}:", "guard".cyan());
            println!("  extra_blocked: {}", config.guard.extra_blocked.len());
            println!("  extra_suggestions: {}", config.guard.extra_suggestions.len());
            println!();

            println!("{}:", "formatter".cyan());
            println!("  timeout_secs: {}", config.formatter.timeout_secs);
            for (ext, directive) in &config.formatter.extensions {
                let shown = match directive {
                    FormatterDirective::Command(argv) => argv.join(" "),
                    FormatterDirective::Builtin(_) => "(built-in)".to_string(),
                };
                println!("  {}: {}", ext, shown);
            }
            println!();

            println!("{}:", "session".cyan());
            println!("  context_file: {}", config.session.context_file.display());
        }
    }

    Ok(())
}
