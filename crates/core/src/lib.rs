pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod submission;
pub mod wizard;

pub use domain::attachment::{Attachment, AttachmentLimits, AttachmentOutcome};
pub use domain::lead::{FieldName, LeadReference, ServiceCategory, Urgency};
pub use errors::WizardError;
pub use events::{EventOutcome, InMemoryEventSink, NoopEventSink, WizardEvent, WizardEventSink};
pub use submission::{LeadPayload, SubmissionAdapter, SubmissionError, SubmissionReceipt};
pub use wizard::{
    CloseReason, QuoteWizard, SubmissionStatus, WizardSettings, WizardState, WizardStep,
    TOTAL_STEPS,
};
