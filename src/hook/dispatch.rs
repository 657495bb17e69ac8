//! Hook event dispatching

use eyre::Result;

use super::{HookEvent, HookHandler, HookPayload, HookResult};

/// Dispatch a hook event to every enabled handler for it.
///
/// The first `Block` wins. `Inform` messages from several handlers are joined
/// line by line. A handler error stops dispatch and is returned to the caller.
pub fn dispatch(event: HookEvent, payload: &HookPayload, handlers: &[Box<dyn HookHandler>]) -> Result<HookResult> {
    let mut messages = Vec::new();

    for handler in handlers {
        if !handler.enabled() || !handler.handles(event) {
            continue;
        }

        log::debug!("Running {} for {}", handler.name(), event);
        match handler.handle(event, payload)? {
            HookResult::Block { message } => {
                log::info!("Hook blocked by {}: {}", handler.name(), message);
                return Ok(HookResult::Block { message });
            }
            HookResult::Inform { message } => {
                log::info!("{} informed: {}", handler.name(), message);
                messages.push(message);
            }
            HookResult::Allow => {}
        }
    }

    if messages.is_empty() {
        Ok(HookResult::Allow)
    } else {
        Ok(HookResult::Inform {
            message: messages.join("\n"),
        })
    }
}
