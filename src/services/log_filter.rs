// Scoped replacement for the old console-patching approach: instead of
// monkey-patching global diagnostic channels, a substring filter is
// attached to the fmt layer at startup and suppresses nothing outside the
// subscriber it is installed on.

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};

/// Known-benign wallet-extension noise that would otherwise spam the logs.
pub const DEFAULT_NOISE_SUBSTRINGS: &[&str] = &[
    "MetaMask extension not found",
    "Failed to connect to MetaMask",
    "ChromeTransport: connectChrome error",
    "Cannot redefine property: ethereum",
];

pub struct NoiseFilter {
    substrings: Vec<String>,
}

impl NoiseFilter {
    pub fn new(substrings: Vec<String>) -> Self {
        Self { substrings }
    }

    /// True when a message matches the suppression list.
    pub fn matches(&self, message: &str) -> bool {
        self.substrings
            .iter()
            .any(|needle| message.contains(needle.as_str()))
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Filter<S> for NoiseFilter {
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        // Per-callsite decisions stay open; suppression is per-event.
        true
    }

    fn event_enabled(&self, event: &Event<'_>, _cx: &Context<'_, S>) -> bool {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        !self.matches(&visitor.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_list_matches_extension_noise() {
        let filter = NoiseFilter::new(
            DEFAULT_NOISE_SUBSTRINGS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        assert!(filter.matches("provider error: MetaMask extension not found in page"));
        assert!(!filter.matches("token balances fetch failed"));
    }

    #[test]
    fn empty_list_suppresses_nothing() {
        let filter = NoiseFilter::new(Vec::new());
        assert!(!filter.matches("MetaMask extension not found"));
    }
}
