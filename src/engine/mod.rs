pub mod classifier;
pub mod gate;
pub mod limiter;
pub mod typing;

pub use classifier::AddressingClassifier;
pub use gate::{Decision, DecisionReason, ResponseGate};
pub use limiter::RateLimiter;
pub use typing::{with_typing, TypingPulse, TypingSimulator};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::channels::GroupChannel;
use crate::chat::IncomingMessage;
use crate::config::Config;
use crate::persona::PersonaResponder;
use crate::providers::CompletionProvider;

/// Drives the whole conversation: scores each incoming message, decides
/// whether to reply, paces the reply like a slow human typist and sends it.
///
/// Owns all mutable state (rate window, RNGs), so it runs as a single task
/// consuming the channel's message stream.
pub struct Orchestrator {
    channel: Arc<dyn GroupChannel>,
    responder: PersonaResponder,
    classifier: AddressingClassifier,
    gate: ResponseGate,
    limiter: RateLimiter,
    typing: TypingSimulator,
    context_messages: usize,
    delay_min: f64,
    delay_max: f64,
    typing_interval: Duration,
    ignore_bots: bool,
    rng: fastrand::Rng,
}

impl Orchestrator {
    pub fn new(
        channel: Arc<dyn GroupChannel>,
        provider: Arc<dyn CompletionProvider>,
        config: &Config,
    ) -> Self {
        let responder = PersonaResponder::new(provider, channel.name(), &config.persona);
        let mut gate = ResponseGate::new(config.response.trigger_words.clone());
        if let Some(handle) = channel.agent_handle() {
            gate.add_mention_word(&handle);
        }

        Self {
            channel,
            responder,
            classifier: AddressingClassifier::new(),
            gate,
            limiter: RateLimiter::new(
                config.safety.rate_limit_messages,
                config.safety.rate_limit_window(),
            ),
            typing: TypingSimulator::new(),
            context_messages: config.response.context_messages,
            delay_min: config.response.delay_min,
            delay_max: config.response.delay_max,
            typing_interval: config.response.typing_interval(),
            ignore_bots: config.safety.ignore_bots,
            rng: fastrand::Rng::new(),
        }
    }

    /// Consumes the message stream until the channel closes it.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<IncomingMessage>) -> Result<()> {
        info!("Listening for group messages");
        while let Some(message) = rx.recv().await {
            if let Err(err) = self.handle_message(message).await {
                error!("Error handling message: {err:#}");
            }
        }
        info!("Message stream closed, shutting down");
        Ok(())
    }

    /// Runs one message through the gate and, when it passes, produces and
    /// sends the paced reply.
    pub async fn handle_message(&mut self, message: IncomingMessage) -> Result<()> {
        if self.ignore_bots && message.sender.is_bot {
            debug!("Ignoring message from bot {}", message.sender.name);
            return Ok(());
        }

        let text = message.text_or_empty();
        let score = self.classifier.score(text);
        let direct = message.is_reply_to_agent || self.gate.mentioned(text);
        let decision = self
            .gate
            .decide(score, direct, message.has_image(), &mut self.limiter);
        debug!(
            "Message {} from {} scored {:.2}: {:?}",
            message.id, message.sender.name, decision.score, decision.reason
        );
        if !decision.respond {
            return Ok(());
        }
        info!(
            "Responding to message {} ({:?})",
            message.id, decision.reason
        );

        // Read the message for a moment before starting to type.
        let thinking = Duration::from_secs_f64(self.uniform(self.delay_min, self.delay_max));
        info!("Thinking for {:.1}s", thinking.as_secs_f64());
        tokio::time::sleep(thinking).await;

        let mut history = self.channel.history(self.context_messages).await?;
        history.reverse();

        let reply = with_typing(
            &self.channel,
            self.typing_interval,
            self.responder.respond(&message, &history),
        )
        .await;
        let Some(reply) = reply else {
            warn!("No response generated, staying quiet");
            return Ok(());
        };

        let typing_time = self.typing.estimate(&reply);
        info!("Will type for {:.1}s", typing_time.as_secs_f64());
        with_typing(
            &self.channel,
            self.typing_interval,
            tokio::time::sleep(typing_time),
        )
        .await;

        self.channel.send(&reply, Some(message.id)).await?;
        self.limiter.record_send();
        info!(
            "Response sent successfully ({} sends in the current window)",
            self.limiter.in_window()
        );
        Ok(())
    }

    /// One-off greeting on startup. Skipped when the channel has no recent
    /// history to react to. Greetings are not counted against the rate window.
    pub async fn announce(&mut self) -> Result<()> {
        let mut history = self.channel.history(self.context_messages).await?;
        if history.is_empty() {
            info!("No recent history, skipping the startup greeting");
            return Ok(());
        }
        history.reverse();

        let greeting = with_typing(
            &self.channel,
            self.typing_interval,
            self.responder.greet(&history),
        )
        .await;
        let Some(greeting) = greeting else {
            warn!("No greeting generated, staying quiet");
            return Ok(());
        };

        let typing_time = self.typing.estimate(&greeting);
        info!("Will type for {:.1}s", typing_time.as_secs_f64());
        with_typing(
            &self.channel,
            self.typing_interval,
            tokio::time::sleep(typing_time),
        )
        .await;

        self.channel.send(&greeting, None).await?;
        info!("Greeting sent");
        Ok(())
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.rng.f64()
    }
}
