//! Check a command line against the guard without going through a hook

use colored::*;
use eyre::Result;

use crate::config::Config;
use crate::hook::guard::CommandGuard;
use crate::hook::{EXIT_ALLOW, EXIT_BLOCK};

pub fn run(command: &[String], config: &Config) -> Result<i32> {
    let command = command.join(" ");
    let guard = CommandGuard::from_config(true, &config.guard)?;
    let verdict = guard.evaluate(&command);

    if let Some(reason) = verdict.blocked {
        println!("{} {}", "✗".red(), reason.red().bold());
        println!();
        println!("Command: {}", command.dimmed());
        return Ok(EXIT_BLOCK);
    }

    println!("{} Command allowed", "✓".green());
    for suggestion in &verdict.suggestions {
        println!("  {} {}", "→".yellow(), suggestion);
    }
    println!();
    println!("Command: {}", command.dimmed());

    Ok(EXIT_ALLOW)
}
