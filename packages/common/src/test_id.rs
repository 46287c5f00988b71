use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Hands out timestamp-based test ids that never repeat within a process.
///
/// Ids are epoch milliseconds; two calls in the same millisecond get
/// consecutive values.
#[derive(Debug, Default)]
pub struct TestIdGenerator {
    last: AtomicI64,
}

impl TestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, now_ms: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}
