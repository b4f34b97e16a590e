use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual kind of a feedback message. Maps onto the `success` / `error` CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Success,
    Error,
}

impl FeedbackKind {
    pub fn css_class(self) -> &'static str {
        match self {
            FeedbackKind::Success => "success",
            FeedbackKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub text: String,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.css_class(), self.text)
    }
}

/// The two write operations a user can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Signup,
    Unregister,
}

impl MutationKind {
    /// Shown when the request never produced a readable response.
    pub fn transport_failure_text(self) -> &'static str {
        match self {
            MutationKind::Signup => "Failed to sign up. Please try again.",
            MutationKind::Unregister => "Failed to unregister. Please try again.",
        }
    }

    /// Shown when the server accepted the request but sent no `message`.
    pub fn success_fallback_text(self) -> &'static str {
        match self {
            MutationKind::Signup => "Signed up successfully.",
            MutationKind::Unregister => "Unregistered successfully.",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Signup => f.write_str("signup"),
            MutationKind::Unregister => f.write_str("unregister"),
        }
    }
}

/// Shown when the server rejected the request without a `detail`.
pub const GENERIC_FAILURE_TEXT: &str = "An error occurred";

/// Body of a signup/unregister response: `{message}` on success, `{detail}` on failure.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct ApiMessage {
    pub message: Option<String>,
    pub detail: Option<String>,
}

/// Normalized result of a mutation, whatever went wrong on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub ok: bool,
    pub message: String,
}

impl MutationOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        MutationOutcome {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        MutationOutcome {
            ok: false,
            message: message.into(),
        }
    }

    pub fn feedback(&self) -> Feedback {
        Feedback {
            kind: if self.ok {
                FeedbackKind::Success
            } else {
                FeedbackKind::Error
            },
            text: self.message.clone(),
        }
    }
}
