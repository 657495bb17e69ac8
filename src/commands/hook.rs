use colored::*;
use eyre::{Context, Result, eyre};
use std::io::{self, Read, Write};

use crate::cli::HookAction;
use crate::config::Config;
use crate::hook::{self, EXIT_ALLOW, EXIT_ERROR, HookEvent, HookPayload};

/// Run a hook subcommand, returning the process exit code
pub fn run(action: HookAction, config: &Config) -> Result<i32> {
    match action {
        HookAction::Dispatch { event, payload } => dispatch(&event, payload.as_deref(), config),
        HookAction::List { event } => list(event.as_deref(), config).map(|_| EXIT_ALLOW),
    }
}

fn dispatch(event: &str, payload: Option<&str>, config: &Config) -> Result<i32> {
    let event = HookEvent::from_str(event).ok_or_else(|| eyre!("Unknown hook event: {}", event))?;

    match dispatch_event(event, payload, config) {
        Ok(code) => Ok(code),
        Err(e) => {
            log::error!("{} hook error: {:#}", event, e);
            let _ = writeln!(io::stderr(), "{} hook error: {:#}", event, e);
            Ok(EXIT_ERROR)
        }
    }
}

fn dispatch_event(event: HookEvent, payload: Option<&str>, config: &Config) -> Result<i32> {
    let raw = match payload {
        Some(p) => p.as_bytes().to_vec(),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    // Missing or malformed input is not an error: nothing to act on
    let payload = match HookPayload::parse(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            log::debug!("Ignoring {} payload that is not a hook event: {}", event, e);
            return Ok(EXIT_ALLOW);
        }
    };

    log::info!("Dispatching hook event: {}", event);
    log::debug!("Payload: {:?}", payload);

    let handlers = hook::registry(config)?;
    let result = hook::dispatch::dispatch(event, &payload, &handlers)?;
    result.emit();

    Ok(result.exit_code())
}

fn list(event_filter: Option<&str>, config: &Config) -> Result<()> {
    let filter = match event_filter {
        Some(name) => Some(HookEvent::from_str(name).ok_or_else(|| eyre!("Unknown hook event: {}", name))?),
        None => None,
    };

    println!("{}", "Registered hook handlers:".bold());
    println!();

    let handlers = hook::registry(config)?;
    for event in HookEvent::ALL {
        if filter.is_some_and(|f| f != event) {
            continue;
        }

        for handler in handlers.iter().filter(|h| h.handles(event)) {
            let status = if handler.enabled() {
                "enabled".green()
            } else {
                "disabled".dimmed()
            };
            println!("  {:<14} {:<18} {}", event.to_string().cyan(), handler.name(), status);
        }
    }

    Ok(())
}
