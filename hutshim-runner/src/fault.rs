//! Process-wide panic watch
//!
//! The dispatcher's `catch_unwind` only sees panics raised while polling the
//! method's own future. A panic in a task or thread spawned by service code
//! is swallowed by whoever owns that task. The panic hook installed here sees
//! every panic in the process and hands it to each running loop, which turns
//! it into a `-32000` fault.
//!
//! The hook is installed once per process and chains to the hook that was
//! active before it, so panic messages are still printed.

use std::any::Any;
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError, Weak};

type Slot = Mutex<Option<String>>;

static HOOK: Once = Once::new();
static WATCHERS: Mutex<Vec<Weak<Slot>>> = Mutex::new(Vec::new());

/// Receives panics raised anywhere in the process while it is alive
pub(crate) struct FaultWatch {
    slot: Arc<Slot>,
}

impl FaultWatch {
    pub(crate) fn install() -> Self {
        HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                let location = info.location().map(|l| l.to_string());
                report(describe(info.payload(), location));
                previous(info);
            }));
        });

        let slot = Arc::new(Mutex::new(None));
        lock(&WATCHERS).push(Arc::downgrade(&slot));
        Self { slot }
    }

    /// First panic seen since the previous call, if any
    pub(crate) fn take(&self) -> Option<String> {
        lock(&self.slot).take()
    }
}

fn report(msg: String) {
    let mut watchers = lock(&WATCHERS);
    watchers.retain(|w| w.strong_count() > 0);
    for slot in watchers.iter().filter_map(Weak::upgrade) {
        lock(&slot).get_or_insert_with(|| msg.clone());
    }
}

fn describe(payload: &(dyn Any + Send), location: Option<String>) -> String {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };

    match location {
        Some(location) => format!("panic at {}: {}", location, msg),
        None => format!("panic: {}", msg),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_payloads() {
        assert_eq!(describe(&"boom", None), "panic: boom");
        assert_eq!(
            describe(&String::from("boom"), Some("a.rs:1:2".into())),
            "panic at a.rs:1:2: boom"
        );
        assert_eq!(describe(&42u8, None), "panic: unknown panic");
    }
}
