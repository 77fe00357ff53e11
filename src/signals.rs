use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{self, SigHandler, Signal};

static CANCEL: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Install SIGINT/SIGTERM handlers that set `cancel` instead of killing the
/// process, so an in-flight scan or clean can stop between operations.
///
/// Only the first flag ever installed is used.
pub fn install_interrupt_handler(cancel: Arc<AtomicBool>) -> nix::Result<()> {
    let _ = CANCEL.set(cancel);

    // SAFETY: the handler only performs an atomic store.
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_interrupt))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_interrupt))?;
    }

    Ok(())
}

extern "C" fn handle_interrupt(_: i32) {
    if let Some(cancel) = CANCEL.get() {
        cancel.store(true, Ordering::SeqCst);
    }
}

/// Put SIGINT/SIGTERM back to their default action.
///
/// Blocking reads restart after a handled signal, so while waiting on the
/// user the default action is the only way Ctrl-C takes effect.
pub fn restore_default_handlers() -> nix::Result<()> {
    // SAFETY: SIG_DFL installs no Rust code.
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigDfl)?;
        signal::signal(Signal::SIGTERM, SigHandler::SigDfl)?;
    }

    Ok(())
}

/// True once an interrupt has been received.
pub fn is_interrupted(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Signal dispositions are process-wide.
    static SIGNAL_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_install_interrupt_handler() {
        let _guard = SIGNAL_LOCK.lock().unwrap();
        let cancel = Arc::new(AtomicBool::new(false));

        let result = install_interrupt_handler(Arc::clone(&cancel));
        assert!(result.is_ok());
        assert!(!is_interrupted(&cancel));
    }

    #[test]
    fn test_restore_then_reinstall() {
        let _guard = SIGNAL_LOCK.lock().unwrap();
        let cancel = Arc::new(AtomicBool::new(false));
        install_interrupt_handler(Arc::clone(&cancel)).unwrap();

        restore_default_handlers().unwrap();
        // SAFETY: swaps SIG_DFL for SIG_DFL to read the current disposition.
        let previous = unsafe { signal::signal(Signal::SIGTERM, SigHandler::SigDfl) }.unwrap();
        assert_eq!(previous, SigHandler::SigDfl);

        assert!(install_interrupt_handler(cancel).is_ok());
    }

    #[test]
    fn test_is_interrupted() {
        let cancel = AtomicBool::new(true);
        assert!(is_interrupted(&cancel));
    }
}
