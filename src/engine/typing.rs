use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::channels::GroupChannel;

const CHARS_PER_SECOND: f64 = 4.0;
const CHARS_PER_PAUSE: usize = 20;
const MAX_PAUSES: usize = 5;
const PAUSE_RANGE: (f64, f64) = (1.0, 3.0);
const CONFUSION_RANGE: (f64, f64) = (2.0, 5.0);
const PUNCTUATION_RANGE: (f64, f64) = (0.5, 1.5);
const MISTAKE_PROBABILITY: f64 = 0.1;
const MISTAKE_RANGE: (f64, f64) = (3.0, 8.0);
const MIN_SECS: f64 = 2.0;
const MAX_SECS: f64 = 180.0;

/// Slow-typing vocabulary. Narrower than the classifier's keyword list.
const SLOW_WORDS: &[&str] = &[
    "app", "wifi", "internet", "computer", "telefono", "whatsapp", "telegram", "password", "email",
    "foto", "video", "link",
];

const PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Estimates how long the character would plausibly take to type a reply.
///
/// Deterministic base (length / typing speed) plus randomized surcharges:
/// thinking pauses scaled by length, a penalty per slow-vocabulary word, a
/// penalty per punctuation mark, and a rare one-off correction. The result is
/// clamped to `[2, 180]` seconds for any input.
#[derive(Debug)]
pub struct TypingSimulator {
    rng: fastrand::Rng,
}

impl TypingSimulator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn estimate(&mut self, text: &str) -> Duration {
        let char_count = text.chars().count();
        let base = char_count as f64 / CHARS_PER_SECOND;

        let pauses = (char_count / CHARS_PER_PAUSE).min(MAX_PAUSES);
        let pause_time = pauses as f64 * self.uniform(PAUSE_RANGE);

        let lowered = text.to_lowercase();
        let slow_mentions = SLOW_WORDS.iter().filter(|w| lowered.contains(*w)).count();
        let confusion_time = slow_mentions as f64 * self.uniform(CONFUSION_RANGE);

        let punctuation_count = text.chars().filter(|c| PUNCTUATION.contains(c)).count();
        let punctuation_time = punctuation_count as f64 * self.uniform(PUNCTUATION_RANGE);

        let mistake_time = if self.rng.f64() < MISTAKE_PROBABILITY {
            self.uniform(MISTAKE_RANGE)
        } else {
            0.0
        };

        let total = base + pause_time + confusion_time + punctuation_time + mistake_time;
        Duration::from_secs_f64(total.clamp(MIN_SECS, MAX_SECS))
    }

    fn uniform(&mut self, (lo, hi): (f64, f64)) -> f64 {
        lo + (hi - lo) * self.rng.f64()
    }
}

impl Default for TypingSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the "typing…" presence for as long as it lives.
///
/// A background task re-signals `set_typing` every `interval` (the platform
/// indicator expires on its own after a few seconds). Dropping the pulse
/// aborts the task and issues a best-effort `clear_typing`, which covers
/// success, failure and cancellation of the surrounding future alike.
pub struct TypingPulse {
    channel: Arc<dyn GroupChannel>,
    task: tokio::task::JoinHandle<()>,
}

impl TypingPulse {
    pub fn start(channel: Arc<dyn GroupChannel>, interval: Duration) -> Self {
        let task = tokio::spawn({
            let channel = Arc::clone(&channel);
            async move {
                let mut ticker = tokio::time::interval(interval);
                loop {
                    ticker.tick().await;
                    if let Err(err) = channel.set_typing().await {
                        warn!("Typing indicator error: {err:#}");
                        break;
                    }
                }
            }
        });
        Self { channel, task }
    }
}

impl Drop for TypingPulse {
    fn drop(&mut self) {
        self.task.abort();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let channel = Arc::clone(&self.channel);
            handle.spawn(async move {
                if let Err(err) = channel.clear_typing().await {
                    debug!("Failed to stop typing indicator: {err:#}");
                }
            });
        }
    }
}

/// Awaits `fut` while keeping the typing indicator alive.
pub async fn with_typing<T, F>(channel: &Arc<dyn GroupChannel>, interval: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let _pulse = TypingPulse::start(Arc::clone(channel), interval);
    fut.await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ContextEntry;
    use anyhow::Result;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn duration_clamped_for_short_text() {
        let mut sim = TypingSimulator::with_seed(1);
        let d = sim.estimate("ok");
        assert!(d >= Duration::from_secs_f64(MIN_SECS));
    }

    #[test]
    fn duration_clamped_for_huge_text() {
        let mut sim = TypingSimulator::with_seed(1);
        let d = sim.estimate(&"a".repeat(100_000));
        assert_eq!(d, Duration::from_secs_f64(MAX_SECS));
    }

    #[test]
    fn empty_text_still_within_bounds() {
        for seed in 0..50 {
            let mut sim = TypingSimulator::with_seed(seed);
            let d = sim.estimate("");
            assert!(d >= Duration::from_secs_f64(MIN_SECS));
            assert!(d <= Duration::from_secs_f64(MAX_SECS));
        }
    }

    #[test]
    fn seeded_estimate_is_reproducible() {
        let text = "ciao, il wifi non funziona!";
        let a = TypingSimulator::with_seed(99).estimate(text);
        let b = TypingSimulator::with_seed(99).estimate(text);
        assert_eq!(a, b);
    }

    #[test]
    fn longer_text_never_types_faster_under_same_seed() {
        // plain filler avoids accidentally completing slow-vocabulary words
        let mut last = Duration::ZERO;
        for len in [0usize, 10, 40, 80, 200, 600] {
            let d = TypingSimulator::with_seed(7).estimate(&"a".repeat(len));
            assert!(d >= last, "len {len} typed faster than a shorter text");
            last = d;
        }
    }

    #[test]
    fn slow_vocabulary_adds_time() {
        let with = TypingSimulator::with_seed(3).estimate(&format!("{} whatsapp", "a".repeat(120)));
        let without = TypingSimulator::with_seed(3).estimate(&format!("{} aaaaaaaa", "a".repeat(120)));
        assert!(with > without);
    }

    proptest! {
        #[test]
        fn estimate_always_in_bounds(text in "\\PC{0,500}", seed in 0u64..1000) {
            let d = TypingSimulator::with_seed(seed).estimate(&text);
            prop_assert!(d >= Duration::from_secs_f64(MIN_SECS));
            prop_assert!(d <= Duration::from_secs_f64(MAX_SECS));
        }
    }

    #[derive(Default)]
    struct CountingChannel {
        typing: AtomicUsize,
        cleared: AtomicUsize,
    }

    #[async_trait]
    impl GroupChannel for CountingChannel {
        fn name(&self) -> &str {
            "counting"
        }

        fn agent_handle(&self) -> Option<String> {
            None
        }

        async fn history(&self, _limit: usize) -> Result<Vec<ContextEntry>> {
            Ok(Vec::new())
        }

        async fn send(&self, _text: &str, _reply_to: Option<i32>) -> Result<()> {
            Ok(())
        }

        async fn set_typing(&self) -> Result<()> {
            self.typing.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn clear_typing(&self) -> Result<()> {
            self.cleared.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn wait_for(check: impl Fn() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn pulse_signals_and_clears_on_drop() {
        let channel: Arc<CountingChannel> = Arc::new(CountingChannel::default());
        let dyn_channel: Arc<dyn GroupChannel> = channel.clone();

        let pulse = TypingPulse::start(Arc::clone(&dyn_channel), Duration::from_millis(10));
        wait_for(|| channel.typing.load(Ordering::SeqCst) >= 2).await;
        drop(pulse);

        wait_for(|| channel.cleared.load(Ordering::SeqCst) == 1).await;
    }

    #[tokio::test]
    async fn with_typing_returns_inner_value() {
        let channel: Arc<CountingChannel> = Arc::new(CountingChannel::default());
        let dyn_channel: Arc<dyn GroupChannel> = channel.clone();

        let out = with_typing(&dyn_channel, Duration::from_millis(10), async { 42 }).await;
        assert_eq!(out, 42);

        wait_for(|| channel.cleared.load(Ordering::SeqCst) == 1).await;
    }

    #[tokio::test]
    async fn with_typing_clears_even_when_inner_fails() {
        let channel: Arc<CountingChannel> = Arc::new(CountingChannel::default());
        let dyn_channel: Arc<dyn GroupChannel> = channel.clone();

        let out: Result<()> = with_typing(&dyn_channel, Duration::from_millis(10), async {
            anyhow::bail!("generation failed")
        })
        .await;
        assert!(out.is_err());

        wait_for(|| channel.cleared.load(Ordering::SeqCst) == 1).await;
    }
}
