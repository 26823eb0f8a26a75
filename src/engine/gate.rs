use crate::engine::limiter::RateLimiter;

pub const HIGH_SCORE_THRESHOLD: f64 = 0.4;
pub const WEIGHTED_THRESHOLD: f64 = 0.2;
pub const FALLBACK_PROBABILITY: f64 = 0.05;

/// Why the gate answered the way it did. Logged with every decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    DirectTrigger,
    Image,
    RateLimited,
    HighScore,
    WeightedChance,
    Fallback,
    Silent,
}

#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub respond: bool,
    pub score: f64,
    pub reason: DecisionReason,
}

impl Decision {
    fn yes(score: f64, reason: DecisionReason) -> Self {
        Self {
            respond: true,
            score,
            reason,
        }
    }

    fn no(score: f64, reason: DecisionReason) -> Self {
        Self {
            respond: false,
            score,
            reason,
        }
    }
}

/// Decides whether an incoming message gets a reply.
///
/// Rules are evaluated in order, first match wins:
/// 1. direct trigger (reply to the agent, or mention): bypasses rate limiting
/// 2. image attachment: bypasses rate limiting
/// 3. rate window exhausted: silent
/// 4. score above the high threshold: reply
/// 5. score in the weighted band: one coin flip weighted by the score decides
/// 6. below the band: flat fallback chance
pub struct ResponseGate {
    mention_words: Vec<String>,
    fallback_probability: f64,
    rng: fastrand::Rng,
}

impl ResponseGate {
    pub fn new(mention_words: Vec<String>) -> Self {
        Self::with_rng(mention_words, fastrand::Rng::new())
    }

    pub fn with_seed(mention_words: Vec<String>, seed: u64) -> Self {
        Self::with_rng(mention_words, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(mention_words: Vec<String>, rng: fastrand::Rng) -> Self {
        Self {
            mention_words: mention_words.iter().map(|w| w.to_lowercase()).collect(),
            fallback_probability: FALLBACK_PROBABILITY,
            rng,
        }
    }

    /// Registers another mention word (the channel's own @handle, resolved at
    /// startup).
    pub fn add_mention_word(&mut self, word: &str) {
        let word = word.to_lowercase();
        if !word.is_empty() && !self.mention_words.contains(&word) {
            self.mention_words.push(word);
        }
    }

    /// Case-insensitive containment against the mention vocabulary.
    pub fn mentioned(&self, text: &str) -> bool {
        if self.mention_words.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        self.mention_words.iter().any(|w| text.contains(w))
    }

    pub fn decide(
        &mut self,
        score: f64,
        direct_trigger: bool,
        has_image: bool,
        limiter: &mut RateLimiter,
    ) -> Decision {
        if direct_trigger {
            return Decision::yes(score, DecisionReason::DirectTrigger);
        }
        if has_image {
            return Decision::yes(score, DecisionReason::Image);
        }
        if !limiter.can_send() {
            return Decision::no(score, DecisionReason::RateLimited);
        }
        if score > HIGH_SCORE_THRESHOLD {
            return Decision::yes(score, DecisionReason::HighScore);
        }
        if score > WEIGHTED_THRESHOLD {
            // the band is decided by this one draw; a lost flip stays silent
            return if self.rng.f64() < score {
                Decision::yes(score, DecisionReason::WeightedChance)
            } else {
                Decision::no(score, DecisionReason::Silent)
            };
        }
        if self.rng.f64() < self.fallback_probability {
            return Decision::yes(score, DecisionReason::Fallback);
        }
        Decision::no(score, DecisionReason::Silent)
    }
}
