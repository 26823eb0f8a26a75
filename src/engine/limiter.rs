use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window limiter for the agent's own sends.
///
/// Send timestamps are appended at the back and pruned from the front once
/// strictly older than `now - window`, so the deque stays sorted ascending.
/// Owned by the single control task; no locking.
#[derive(Debug)]
pub struct RateLimiter {
    max_messages: usize,
    window: Duration,
    sent: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(max_messages: usize, window: Duration) -> Self {
        Self {
            max_messages,
            window,
            sent: VecDeque::new(),
        }
    }

    /// Whether another send is allowed right now.
    pub fn can_send(&mut self) -> bool {
        self.can_send_at(Instant::now())
    }

    /// Record a completed send.
    pub fn record_send(&mut self) {
        self.record_send_at(Instant::now());
    }

    /// Sends still inside the window, for log lines.
    pub fn in_window(&mut self) -> usize {
        self.prune(Instant::now());
        self.sent.len()
    }

    pub(crate) fn can_send_at(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.sent.len() < self.max_messages
    }

    pub(crate) fn record_send_at(&mut self, now: Instant) {
        self.sent.push_back(now);
    }

    fn prune(&mut self, now: Instant) {
        // checked_sub: the window can exceed process uptime
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };
        while self.sent.front().is_some_and(|&t| t < cutoff) {
            self.sent.pop_front();
        }
    }
}
