//! Client settings and change notification.
//!
//! Settings arrive as the JSON object of a `workspace/didChangeConfiguration`
//! notification. Recognised keys are applied one by one; anything else,
//! including values of the wrong JSON type, is ignored.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Verbosity requested by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum LogLevel {
    Verbose,
    Debug,
    #[default]
    Information,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    /// Case-insensitive; unknown names fall back to `Information`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn to_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Verbose => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Information => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Error | LogLevel::Fatal => tracing::Level::ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "Verbose",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            LogLevel::Verbose,
            LogLevel::Debug,
            LogLevel::Information,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Fatal,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or(())
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that affect the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub log_level: LogLevel,
    pub disable_hover: bool,
    pub include_prerelease: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Information,
            disable_hover: false,
            include_prerelease: true,
        }
    }
}

impl Configuration {
    /// Full settings object (e.g. initialization options). Missing keys keep
    /// their defaults.
    pub fn from_settings(settings: &Value) -> Result<Self, serde_json::Error> {
        Configuration::deserialize(settings)
    }

    /// Apply the recognised keys of a change notification. Returns whether
    /// anything changed.
    pub fn apply(&mut self, settings: &Value) -> bool {
        let before = self.clone();
        if let Some(Value::String(level)) = settings.get("logLevel") {
            self.log_level = LogLevel::parse_lenient(level);
        }
        if let Some(Value::Bool(disable)) = settings.get("disableHover") {
            self.disable_hover = *disable;
        }
        if let Some(Value::Bool(include)) = settings.get("includePrerelease") {
            self.include_prerelease = *include;
        }
        *self != before
    }
}

/// Owns the current [`Configuration`] and tells subscribers when it changes.
#[derive(Debug)]
pub struct ConfigurationHandler {
    sender: watch::Sender<Configuration>,
}

impl Default for ConfigurationHandler {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl ConfigurationHandler {
    pub fn new(initial: Configuration) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Snapshot of the current settings.
    pub fn current(&self) -> Configuration {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Configuration> {
        self.sender.subscribe()
    }

    /// Handle a change notification. Subscribers are always notified, even
    /// when no recognised key was present.
    pub fn did_change_configuration(&self, settings: &Value) {
        if !settings.is_object() {
            warn!(?settings, "ignoring configuration change that is not an object");
            return;
        }
        self.sender.send_modify(|configuration| {
            if configuration.apply(settings) {
                debug!(
                    log_level = %configuration.log_level,
                    disable_hover = configuration.disable_hover,
                    include_prerelease = configuration.include_prerelease,
                    "configuration changed"
                );
            }
        });
    }
}
