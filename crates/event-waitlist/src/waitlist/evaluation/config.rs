use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::tokens::{TokenContext, TokenResolver};

pub const DEFAULT_WAITLIST_NOTICE: &str =
    "This event is full. Your submission has been placed on the waitlist.";
pub const DEFAULT_CONFIRMATION: &str = "Your submission has been received.";

/// How the post-insert count-and-classify step is coordinated between concurrent submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Counts are read and acted on without coordination.
    #[default]
    Racy,
    /// Limit check, insert and classification run under a per-resource lock.
    Serialized,
}

/// Waitlist configuration as authored; token fields are resolved per evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistSettings {
    pub capacity_limit: u64,
    pub waitlist_enabled: String,
    pub waitlist_threshold: String,
    pub waitlist_notice: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub classification_mode: ClassificationMode,
}

impl WaitlistSettings {
    pub fn new(capacity_limit: u64, threshold: u64) -> Self {
        Self {
            capacity_limit,
            waitlist_enabled: "On".to_string(),
            waitlist_threshold: threshold.to_string(),
            waitlist_notice: DEFAULT_WAITLIST_NOTICE.to_string(),
            debug: false,
            classification_mode: ClassificationMode::Racy,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.waitlist_enabled = "Off".to_string();
        self
    }

    pub fn with_mode(mut self, mode: ClassificationMode) -> Self {
        self.classification_mode = mode;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Resolve every token once for the evaluation at hand.
    ///
    /// Resolution failures never fail the submission: an unresolved enable flag disables the
    /// waitlist and an unresolved or unusable threshold counts as zero.
    pub fn resolve(
        &self,
        tokens: &dyn TokenResolver,
        context: &TokenContext<'_>,
    ) -> ResolvedSettings {
        let enabled = match tokens.replace(&self.waitlist_enabled, context) {
            Ok(value) => parse_enabled(&value),
            Err(error) => {
                warn!(%error, "waitlist enable flag unresolved; treating as disabled");
                false
            }
        };

        let threshold = match tokens.replace(&self.waitlist_threshold, context) {
            Ok(value) => parse_threshold(&value),
            Err(error) => {
                warn!(%error, "waitlist threshold unresolved; treating as zero");
                0
            }
        };

        let notice = tokens
            .replace(&self.waitlist_notice, context)
            .unwrap_or_else(|error| {
                warn!(%error, "waitlist notice unresolved; using raw text");
                self.waitlist_notice.clone()
            });

        ResolvedSettings {
            capacity_limit: self.capacity_limit,
            threshold,
            enabled,
            notice,
            debug: self.debug,
        }
    }
}

/// Configuration with all placeholders substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSettings {
    pub capacity_limit: u64,
    pub threshold: u64,
    pub enabled: bool,
    pub notice: String,
    pub debug: bool,
}

pub(crate) fn parse_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "yes" | "1"
    )
}

pub(crate) fn parse_threshold(value: &str) -> u64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0;
    }

    match trimmed.parse::<i64>() {
        Ok(parsed) if parsed >= 0 => parsed.unsigned_abs(),
        Ok(parsed) => {
            warn!(threshold = parsed, "negative waitlist threshold; treating as zero");
            0
        }
        Err(_) => {
            warn!(threshold = trimmed, "waitlist threshold is not an integer; treating as zero");
            0
        }
    }
}
