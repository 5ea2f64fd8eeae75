//! Interrupt handling
//!
//! Ctrl-C reaches the whole foreground process group, so the running child
//! sees it too. Dockyard itself only records the interrupt: the child is
//! left to shut down on its own terms, its exit status is still collected,
//! and no further stage is started.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

static HANDLER: Mutex<Option<Arc<AtomicBool>>> = Mutex::new(None);

/// Install the process-wide SIGINT handler
///
/// Returns the flag the handler sets. Calling this again returns the same
/// flag without installing a second handler.
pub fn install() -> Result<Arc<AtomicBool>> {
    let mut installed = HANDLER.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(ref flag) = *installed {
        return Ok(flag.clone());
    }

    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        if !handler_flag.swap(true, Ordering::SeqCst) {
            tracing::warn!("Interrupt received, waiting for the running command to exit");
        }
    })?;

    *installed = Some(flag.clone());
    Ok(flag)
}
