//! Cooperative cancellation, polled by the parser between tokenizer events.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Cancellation for Never {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A flag that can be raised from any thread holding a clone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Cancellation for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancels once a monotonic instant has passed.
///
/// Relies on `std::time::Instant`, which is unavailable on `wasm32-unknown-unknown`;
/// the wasm bindings use a clock from `js_sys` instead.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }
}

impl Cancellation for Deadline {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_across_threads() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_deadline_in_past_is_cancelled() {
        let past = Deadline::at(Instant::now());
        assert!(past.is_cancelled());
        assert!(!Deadline::after(Duration::from_secs(3600)).is_cancelled());
    }
}
