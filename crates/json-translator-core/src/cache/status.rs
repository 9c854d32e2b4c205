use serde::{Deserialize, Serialize};
use std::fmt;

/// Where to get an API key, shown while the service is not configured
pub const API_KEY_URL: &str = "https://beta.openai.com/account/api-keys";

/// Service readiness, a function of whether an API key is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotConfigured,
    Ready,
}

impl Status {
    pub const fn from_key_present(present: bool) -> Self {
        if present { Self::Ready } else { Self::NotConfigured }
    }

    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Markdown for host rendering; `:configure` is the configure action link.
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(
                f,
                "Please [get an OpenAI API key]({API_KEY_URL}) and [configure](:configure)"
            ),
            Self::Ready => f.write_str("Ready"),
        }
    }
}

/// Per-translator progress through construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// No global API key
    NoKey,
    /// Key set, no model handle
    NoModel,
    /// Model built, no translator handle
    NoTranslator,
    Ready,
}

const MODULE_TIP: &str = "\ntip: Consider exporting the target type in the schema";
const OBJECT_TIP: &str = "\ntip: Consider using an object as the target type";

/// Append hints for translation failures we know how to explain.
pub fn with_tips(message: &str) -> String {
    let mut message = message.to_string();
    if message.contains("is not a module") {
        message.push_str(MODULE_TIP);
    }
    if message.contains("is not JSON") {
        message.push_str(OBJECT_TIP);
    }
    message
}
