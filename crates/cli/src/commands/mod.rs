pub mod config;
pub mod doctor;
pub mod submit;
pub mod validate;

use clap::Args;
use plumbline_core::events::{WizardEvent, WizardEventSink};
use plumbline_core::wizard::{QuoteWizard, WizardStep};
use plumbline_core::{Attachment, FieldName, WizardError};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_SETUP: u8 = 3;
pub const EXIT_VALIDATION: u8 = 4;
pub const EXIT_SUBMISSION: u8 = 5;

/// Answers for every wizard step, as given on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct LeadInput {
    #[arg(long, help = "Service category, e.g. drain-cleaning")]
    pub service: Option<String>,
    #[arg(long, help = "emergency | urgent | routine | flexible")]
    pub urgency: Option<String>,
    #[arg(long, help = "Where the problem is, e.g. Kitchen")]
    pub location: Option<String>,
    #[arg(long, help = "Free-text description of the problem")]
    pub description: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long, help = "Service address")]
    pub address: Option<String>,
    #[arg(long = "attachment", value_name = "NAME[:BYTES]", value_parser = parse_attachment)]
    pub attachments: Vec<Attachment>,
}

impl LeadInput {
    pub fn value(&self, field: FieldName) -> Option<&str> {
        let value = match field {
            FieldName::Service => &self.service,
            FieldName::Urgency => &self.urgency,
            FieldName::Location => &self.location,
            FieldName::Description => &self.description,
            FieldName::Name => &self.name,
            FieldName::Email => &self.email,
            FieldName::Phone => &self.phone,
            FieldName::Address => &self.address,
        };
        value.as_deref()
    }
}

pub fn parse_attachment(raw: &str) -> Result<Attachment, String> {
    let raw = raw.trim();
    match raw.rsplit_once(':') {
        Some((name, bytes)) if !name.is_empty() => bytes
            .parse::<u64>()
            .map(|size| Attachment::new(name, size))
            .map_err(|_| format!("attachment size `{bytes}` is not a byte count")),
        Some(_) => Err("attachment name must not be empty".to_string()),
        None if raw.is_empty() => Err("attachment name must not be empty".to_string()),
        None => Ok(Attachment::new(raw, 0)),
    }
}

/// Enters each step's answers and advances until the final step. The final
/// step is left for the caller to validate or submit.
pub fn fill_wizard(wizard: &QuoteWizard, input: &LeadInput) -> Result<(), WizardError> {
    let mut step = WizardStep::FIRST;
    loop {
        for field in step.fields() {
            if let Some(value) = input.value(*field) {
                wizard.set_field(*field, value)?;
            }
        }
        if step == WizardStep::Photos && !input.attachments.is_empty() {
            let outcome = wizard.add_attachments(input.attachments.clone())?;
            if outcome.is_truncated() {
                debug!(
                    dropped_over_cap = ?outcome.dropped_over_cap,
                    rejected_oversize = ?outcome.rejected_oversize,
                    "some attachments were not staged"
                );
            }
        }
        if step == WizardStep::LAST {
            return Ok(());
        }
        step = wizard.advance()?;
    }
}

/// Forwards wizard lifecycle events to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEventSink;

impl WizardEventSink for LogEventSink {
    fn emit(&self, event: WizardEvent) {
        debug!(
            event_name = %event.event_type,
            wizard_id = %event.wizard_id,
            outcome = ?event.outcome,
            metadata = ?event.metadata,
            "wizard event"
        );
    }
}
