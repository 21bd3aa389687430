use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::attachment::Attachment;
use crate::domain::lead::{FieldName, LeadReference};

pub const TOTAL_STEPS: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    ServiceDetails,
    ProblemDetails,
    Photos,
    Contact,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::ServiceDetails;
    pub const LAST: WizardStep = WizardStep::Contact;

    /// 1-indexed position shown to the customer ("Step 2 of 4").
    pub fn number(&self) -> u8 {
        match self {
            Self::ServiceDetails => 1,
            Self::ProblemDetails => 2,
            Self::Photos => 3,
            Self::Contact => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::ServiceDetails),
            2 => Some(Self::ProblemDetails),
            3 => Some(Self::Photos),
            4 => Some(Self::Contact),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ServiceDetails => "What do you need?",
            Self::ProblemDetails => "Tell us about the problem",
            Self::Photos => "Add photos (optional)",
            Self::Contact => "How do we reach you?",
        }
    }

    /// Fields owned by this step. Validation of a step never looks past this list.
    pub fn fields(&self) -> &'static [FieldName] {
        match self {
            Self::ServiceDetails => &[FieldName::Service, FieldName::Urgency],
            Self::ProblemDetails => &[FieldName::Location, FieldName::Description],
            Self::Photos => &[],
            Self::Contact => {
                &[FieldName::Name, FieldName::Email, FieldName::Phone, FieldName::Address]
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Completed,
    Cancelled,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub fields: BTreeMap<FieldName, String>,
    pub field_errors: BTreeMap<FieldName, String>,
    pub attachments: Vec<Attachment>,
    pub submission_status: SubmissionStatus,
    pub status_history: Vec<SubmissionStatus>,
    pub reference: Option<LeadReference>,
    pub failure_message: Option<String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: WizardStep::FIRST,
            fields: BTreeMap::new(),
            field_errors: BTreeMap::new(),
            attachments: Vec::new(),
            submission_status: SubmissionStatus::Idle,
            status_history: vec![SubmissionStatus::Idle],
            reference: None,
            failure_message: None,
        }
    }
}

impl WizardState {
    pub fn step_number(&self) -> u8 {
        self.current_step.number()
    }

    pub fn field(&self, name: FieldName) -> &str {
        self.fields.get(&name).map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn enter_status(&mut self, status: SubmissionStatus) {
        self.submission_status = status;
        self.status_history.push(status);
    }
}
