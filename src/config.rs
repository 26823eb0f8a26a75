use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::errors::NonnoError;

/// Generates a `Debug` impl that redacts secret fields.
///
/// Field specifiers:
/// - `field_name`: printed normally via `&self.field_name`
/// - `redact(field_name)`: `String` field, shows `[empty]` or `[REDACTED]`
/// - `redact_option(field_name)`: `Option<String>` field, shows `None` or `Some("[REDACTED]")`
macro_rules! redact_debug {
    // Internal: emit a single .field() call
    (@field $builder:ident, $self:ident, redact($field:ident)) => {
        $builder.field(
            stringify!($field),
            &if $self.$field.is_empty() {
                "[empty]"
            } else {
                "[REDACTED]"
            },
        );
    };
    (@field $builder:ident, $self:ident, redact_option($field:ident)) => {
        $builder.field(
            stringify!($field),
            &$self.$field.as_ref().map(|_| "[REDACTED]"),
        );
    };
    (@field $builder:ident, $self:ident, $field:ident) => {
        $builder.field(stringify!($field), &$self.$field);
    };

    // Internal: recursive TT muncher
    (@fields $builder:ident, $self:ident,) => {};
    (@fields $builder:ident, $self:ident, redact($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, redact_option($field:ident), $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, redact_option($field));
        redact_debug!(@fields $builder, $self, $($rest)*);
    };
    (@fields $builder:ident, $self:ident, $field:ident, $($rest:tt)*) => {
        redact_debug!(@field $builder, $self, $field);
        redact_debug!(@fields $builder, $self, $($rest)*);
    };

    // Entry point
    ($struct_name:ident, $($fields:tt)*) => {
        impl std::fmt::Debug for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut builder = f.debug_struct(stringify!($struct_name));
                redact_debug!(@fields builder, self, $($fields)*);
                builder.finish()
            }
        }
    };
}

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp";
const DEFAULT_CONTEXT_MESSAGES: usize = 20;
const DEFAULT_DELAY_MIN_SECS: f64 = 1.0;
const DEFAULT_DELAY_MAX_SECS: f64 = 3.0;
const DEFAULT_RATE_LIMIT_MESSAGES: usize = 10;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_TYPING_INTERVAL_SECS: f64 = 4.0;

/// Telegram connection settings.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat id of the single group the agent monitors. Group chats have negative ids.
    pub group_id: i64,
}

redact_debug!(TelegramConfig, redact(bot_token), group_id,);

/// Completion API settings (OpenRouter by default).
#[derive(Clone)]
pub struct LlmConfig {
    /// Absent keys are tolerated at startup; each completion call fails softly instead.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

redact_debug!(LlmConfig, redact_option(api_key), base_url, model,);

/// Persona overrides. `None` falls back to the built-in character.
#[derive(Debug, Clone, Default)]
pub struct PersonaConfig {
    pub personality: Option<String>,
    pub style: Option<String>,
}

/// Reply behavior tuning.
#[derive(Debug, Clone)]
pub struct ResponseConfig {
    /// How many recent group messages feed the prompt context.
    pub context_messages: usize,
    /// Pre-reply "thinking" delay bounds, seconds.
    pub delay_min: f64,
    pub delay_max: f64,
    /// Mention vocabulary, lowercased. The channel's own @handle is added at runtime.
    pub trigger_words: Vec<String>,
    /// Seconds between typing-indicator refreshes while composing.
    pub typing_interval_secs: f64,
}

impl ResponseConfig {
    pub fn typing_interval(&self) -> Duration {
        Duration::from_secs_f64(self.typing_interval_secs)
    }
}

/// Rate limiting and sender filtering.
#[derive(Debug, Clone)]
pub struct SafetyConfig {
    pub rate_limit_messages: usize,
    pub rate_limit_window_secs: u64,
    pub ignore_bots: bool,
}

impl SafetyConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub persona: PersonaConfig,
    pub response: ResponseConfig,
    pub safety: SafetyConfig,
}

/// Environment lookup wrapper. Blank values count as unset.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &str) -> Result<String, NonnoError> {
        self.get(key).ok_or_else(|| {
            NonnoError::Config(format!("{key} is required (set it in the environment or .env)"))
        })
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, NonnoError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|err| NonnoError::Config(format!("{key}: invalid value {raw:?}: {err}"))),
            None => Ok(default),
        }
    }

    fn require_parsed<T>(&self, key: &str) -> Result<T, NonnoError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.require(key)?;
        raw.parse()
            .map_err(|err| NonnoError::Config(format!("{key}: invalid value {raw:?}: {err}")))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, NonnoError> {
        match self.get(key).map(|v| v.to_lowercase()) {
            None => Ok(default),
            Some(v) if v == "true" || v == "1" => Ok(true),
            Some(v) if v == "false" || v == "0" => Ok(false),
            Some(v) => Err(NonnoError::Config(format!(
                "{key}: expected true/false, got {v:?}"
            ))),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, NonnoError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Seam for tests that must not touch
    /// process-wide environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NonnoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let telegram = TelegramConfig {
            bot_token: vars.require("TELEGRAM_BOT_TOKEN")?,
            group_id: vars.require_parsed("TELEGRAM_GROUP_ID")?,
        };

        let llm = LlmConfig {
            api_key: vars.get("OPENROUTER_API_KEY"),
            base_url: vars
                .get("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: vars
                .get("AI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        let persona = PersonaConfig {
            personality: vars.get("BOT_PERSONALITY"),
            style: vars.get("RESPONSE_STYLE"),
        };

        let trigger_words = vars
            .get("TRIGGER_WORDS")
            .map(|raw| {
                raw.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let response = ResponseConfig {
            context_messages: vars.parsed("CONTEXT_MESSAGES", DEFAULT_CONTEXT_MESSAGES)?,
            delay_min: vars.parsed("RESPONSE_DELAY_MIN", DEFAULT_DELAY_MIN_SECS)?,
            delay_max: vars.parsed("RESPONSE_DELAY_MAX", DEFAULT_DELAY_MAX_SECS)?,
            trigger_words,
            typing_interval_secs: vars.parsed("TYPING_INTERVAL", DEFAULT_TYPING_INTERVAL_SECS)?,
        };

        let safety = SafetyConfig {
            rate_limit_messages: vars.parsed("RATE_LIMIT_MESSAGES", DEFAULT_RATE_LIMIT_MESSAGES)?,
            rate_limit_window_secs: vars
                .parsed("RATE_LIMIT_WINDOW", DEFAULT_RATE_LIMIT_WINDOW_SECS)?,
            ignore_bots: vars.flag("IGNORE_BOTS", true)?,
        };

        let config = Self {
            telegram,
            llm,
            persona,
            response,
            safety,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), NonnoError> {
        if self.response.context_messages == 0 {
            return Err(NonnoError::Config(
                "CONTEXT_MESSAGES must be at least 1".into(),
            ));
        }
        if !self.response.delay_min.is_finite()
            || !self.response.delay_max.is_finite()
            || self.response.delay_min < 0.0
            || self.response.delay_max < self.response.delay_min
        {
            return Err(NonnoError::Config(
                "RESPONSE_DELAY_MIN/RESPONSE_DELAY_MAX must satisfy 0 <= min <= max".into(),
            ));
        }
        if !self.response.typing_interval_secs.is_finite()
            || self.response.typing_interval_secs <= 0.0
        {
            return Err(NonnoError::Config("TYPING_INTERVAL must be positive".into()));
        }
        if self.safety.rate_limit_messages == 0 {
            return Err(NonnoError::Config(
                "RATE_LIMIT_MESSAGES must be at least 1".into(),
            ));
        }
        if self.safety.rate_limit_window_secs == 0 {
            return Err(NonnoError::Config(
                "RATE_LIMIT_WINDOW must be at least 1 second".into(),
            ));
        }
        if self.telegram.group_id > 0 {
            warn!("TELEGRAM_GROUP_ID is positive; Telegram group chats normally have negative ids");
        }
        if self.llm.api_key.is_none() {
            warn!("OPENROUTER_API_KEY is not set; replies will be skipped until it is provided");
        }
        Ok(())
    }
}
