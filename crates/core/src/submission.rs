use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::lead::{FieldName, LeadReference};
use crate::wizard::states::WizardState;

pub const NETWORK_FAILURE_MESSAGE: &str =
    "We couldn't reach our servers. Please check your connection and try again, or call us directly.";
pub const GENERIC_SERVER_FAILURE_MESSAGE: &str =
    "Something went wrong sending your request. Please try again or call us directly.";

/// Wire body for the lead endpoint. Every wizard field is a top-level string;
/// attachments travel as names only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeadPayload {
    #[serde(flatten)]
    pub fields: BTreeMap<FieldName, String>,
    pub attachments: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}

impl LeadPayload {
    pub fn from_state(state: &WizardState, submitted_at: DateTime<Utc>) -> Self {
        let fields = FieldName::ALL
            .into_iter()
            .map(|field| (field, state.field(field).trim().to_owned()))
            .collect();
        let attachments =
            state.attachments.iter().map(|attachment| attachment.name.clone()).collect();

        Self { fields, attachments, submitted_at }
    }

    pub fn field(&self, name: FieldName) -> &str {
        self.fields.get(&name).map(String::as_str).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub reference: LeadReference,
    pub server_assigned: bool,
}

impl SubmissionReceipt {
    /// Uses the server's reference when it sent a non-blank one, otherwise a
    /// local timestamp-based reference.
    pub fn resolve(server_reference: Option<String>, at: DateTime<Utc>) -> Self {
        let server_reference = server_reference
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        match server_reference {
            Some(reference) => Self { reference: LeadReference(reference), server_assigned: true },
            None => Self { reference: LeadReference::fallback(at), server_assigned: false },
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("lead endpoint unreachable: {0}")]
    Network(String),
    #[error("lead endpoint returned status {status}")]
    Server { status: u16, message: Option<String> },
}

impl SubmissionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => NETWORK_FAILURE_MESSAGE.to_owned(),
            Self::Server { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|message| !message.is_empty())
                .unwrap_or(GENERIC_SERVER_FAILURE_MESSAGE)
                .to_owned(),
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Server { .. } => "server",
        }
    }
}

/// Sends one finished lead. Implementations perform exactly one request per
/// call and never retry on their own.
#[async_trait]
pub trait SubmissionAdapter: Send + Sync {
    async fn submit(&self, payload: &LeadPayload) -> Result<SubmissionReceipt, SubmissionError>;
}
