use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::lead::FieldName;
use crate::submission::SubmissionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("step {step} is blocked by invalid fields: {}", field_list(.errors))]
    ValidationBlocked { step: u8, errors: BTreeMap<FieldName, String> },
    #[error("submission requires the final step, wizard is on step {step}")]
    NotOnFinalStep { step: u8 },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("lead was already submitted")]
    AlreadySubmitted,
    #[error("attachment index {index} out of range for {len} attachments")]
    AttachmentIndexOutOfRange { index: usize, len: usize },
    #[error("wizard is closed")]
    WizardClosed,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl WizardError {
    /// Text safe to show the customer.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationBlocked { .. } | Self::NotOnFinalStep { .. } => {
                "Please fix the highlighted fields to continue.".to_owned()
            }
            Self::SubmissionInFlight => "Sending your request...".to_owned(),
            Self::AlreadySubmitted => "Your request has already been sent.".to_owned(),
            Self::AttachmentIndexOutOfRange { .. } => {
                "That photo is no longer attached.".to_owned()
            }
            Self::WizardClosed => {
                "This form has been closed. Please start a new request.".to_owned()
            }
            Self::Submission(error) => error.user_message(),
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::ValidationBlocked { .. } => "validation_blocked",
            Self::NotOnFinalStep { .. } => "navigation",
            Self::SubmissionInFlight => "submission_in_flight",
            Self::AlreadySubmitted => "already_submitted",
            Self::AttachmentIndexOutOfRange { .. } => "attachment_index",
            Self::WizardClosed => "wizard_closed",
            Self::Submission(error) => error.class(),
        }
    }
}

fn field_list(errors: &BTreeMap<FieldName, String>) -> String {
    errors.keys().map(FieldName::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::domain::lead::FieldName;
    use crate::errors::WizardError;
    use crate::submission::{SubmissionError, NETWORK_FAILURE_MESSAGE};

    #[test]
    fn validation_blocked_names_the_offending_fields() {
        let error = WizardError::ValidationBlocked {
            step: 1,
            errors: BTreeMap::from([
                (FieldName::Service, "Please choose the service you need.".to_owned()),
                (FieldName::Urgency, "Please tell us how soon you need help.".to_owned()),
            ]),
        };

        assert_eq!(error.to_string(), "step 1 is blocked by invalid fields: service, urgency");
        assert_eq!(error.class(), "validation_blocked");
    }

    #[test]
    fn submission_errors_keep_their_user_message() {
        let network = WizardError::from(SubmissionError::Network("timed out".to_owned()));
        assert_eq!(network.user_message(), NETWORK_FAILURE_MESSAGE);
        assert_eq!(network.class(), "network");

        let server = WizardError::from(SubmissionError::Server {
            status: 422,
            message: Some("Service area not recognized".to_owned()),
        });
        assert_eq!(server.user_message(), "Service area not recognized");
        assert_eq!(server.to_string(), "lead endpoint returned status 422");
    }
}
