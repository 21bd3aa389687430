use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WizardConfig;
use crate::domain::attachment::{stage_batch, Attachment, AttachmentLimits, AttachmentOutcome};
use crate::domain::lead::FieldName;
use crate::errors::WizardError;
use crate::events::{EventOutcome, NoopEventSink, WizardEvent, WizardEventSink};
use crate::submission::{
    LeadPayload, SubmissionAdapter, SubmissionError, SubmissionReceipt, NETWORK_FAILURE_MESSAGE,
};
use crate::wizard::states::{CloseReason, SubmissionStatus, WizardState, WizardStep};
use crate::wizard::validation::{field_error, validate_step, ValidationRules};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WizardSettings {
    pub rules: ValidationRules,
    pub attachment_limits: AttachmentLimits,
}

impl From<&WizardConfig> for WizardSettings {
    fn from(config: &WizardConfig) -> Self {
        Self {
            rules: ValidationRules { min_description_chars: config.min_description_chars },
            attachment_limits: AttachmentLimits {
                max_count: config.max_attachments,
                max_bytes: config.max_attachment_bytes,
            },
        }
    }
}

/// Drives one customer through the quote steps and owns the single outbound
/// submission for that customer.
///
/// Every operation takes `&self` so a host can keep the wizard behind an `Arc`
/// while `submit` is awaiting the endpoint. The state lock is never held across
/// that await; instead the `Submitting` status rejects edits, navigation and a
/// second submit until the first one resolves.
pub struct QuoteWizard {
    id: String,
    settings: WizardSettings,
    state: Mutex<Option<WizardState>>,
    sink: Arc<dyn WizardEventSink>,
}

impl QuoteWizard {
    pub fn open(settings: WizardSettings, sink: Arc<dyn WizardEventSink>) -> Self {
        let wizard = Self {
            id: Uuid::new_v4().to_string(),
            settings,
            state: Mutex::new(Some(WizardState::default())),
            sink,
        };
        info!(event_name = "wizard.opened", wizard_id = %wizard.id, "quote wizard opened");
        wizard.emit(WizardEvent::new(&wizard.id, "wizard.opened", EventOutcome::Success));
        wizard
    }

    pub fn open_detached(settings: WizardSettings) -> Self {
        Self::open(settings, Arc::new(NoopEventSink))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> Result<WizardState, WizardError> {
        self.with_state(|state| Ok(state.clone()))
    }

    pub fn current_step(&self) -> Result<WizardStep, WizardError> {
        self.with_state(|state| Ok(state.current_step))
    }

    pub fn submission_status(&self) -> Result<SubmissionStatus, WizardError> {
        self.with_state(|state| Ok(state.submission_status))
    }

    pub fn status_history(&self) -> Result<Vec<SubmissionStatus>, WizardError> {
        self.with_state(|state| Ok(state.status_history.clone()))
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Stores `value` and returns the field's live validation message, if any.
    /// A previously recorded error for the field is cleared either way.
    pub fn set_field(
        &self,
        name: FieldName,
        value: impl Into<String>,
    ) -> Result<Option<String>, WizardError> {
        let value = value.into();
        self.with_editable_state(|state| {
            state.fields.insert(name, value);
            state.field_errors.remove(&name);
            Ok(field_error(name, &state.fields, &self.settings.rules))
        })
    }

    pub fn advance(&self) -> Result<WizardStep, WizardError> {
        let result = self.with_editable_state(|state| {
            let step = state.current_step;
            let validation = validate_step(step, &state.fields, &self.settings.rules);
            if !validation.passed() {
                state.field_errors = validation.errors.clone();
                return Err(WizardError::ValidationBlocked {
                    step: step.number(),
                    errors: validation.errors,
                });
            }

            state.field_errors.clear();
            let next = step.next().unwrap_or(step);
            state.current_step = next;
            Ok((step, next))
        });

        match result {
            Ok((from, to)) if from == to => {
                self.emit(
                    WizardEvent::new(&self.id, "wizard.ready_to_submit", EventOutcome::Success)
                        .with_metadata("step", to.number().to_string()),
                );
                Ok(to)
            }
            Ok((from, to)) => {
                self.emit(
                    WizardEvent::new(&self.id, "wizard.step_advanced", EventOutcome::Success)
                        .with_metadata("from", from.number().to_string())
                        .with_metadata("to", to.number().to_string()),
                );
                Ok(to)
            }
            Err(error) => {
                self.emit_blocked(&error);
                Err(error)
            }
        }
    }

    /// Steps back without validating. Staying on the first step is not an error.
    pub fn retreat(&self) -> Result<WizardStep, WizardError> {
        let moved = self.with_editable_state(|state| {
            let from = state.current_step;
            if let Some(previous) = from.previous() {
                state.current_step = previous;
                state.field_errors.clear();
                return Ok(Some((from, previous)));
            }
            Ok(None)
        })?;

        match moved {
            Some((from, to)) => {
                self.emit(
                    WizardEvent::new(&self.id, "wizard.step_retreated", EventOutcome::Success)
                        .with_metadata("from", from.number().to_string())
                        .with_metadata("to", to.number().to_string()),
                );
                Ok(to)
            }
            None => Ok(WizardStep::FIRST),
        }
    }

    pub fn add_attachment(&self, attachment: Attachment) -> Result<AttachmentOutcome, WizardError> {
        self.add_attachments(vec![attachment])
    }

    pub fn add_attachments(
        &self,
        batch: Vec<Attachment>,
    ) -> Result<AttachmentOutcome, WizardError> {
        let limits = &self.settings.attachment_limits;
        let outcome = self.with_editable_state(|state| {
            Ok(stage_batch(&mut state.attachments, batch, limits))
        })?;

        if outcome.is_truncated() {
            warn!(
                event_name = "wizard.attachments_truncated",
                wizard_id = %self.id,
                dropped_over_cap = outcome.dropped_over_cap.len(),
                rejected_oversize = outcome.rejected_oversize.len(),
                "attachment batch truncated"
            );
            self.emit(
                WizardEvent::new(&self.id, "wizard.attachments_truncated", EventOutcome::Rejected)
                    .with_metadata("dropped_over_cap", outcome.dropped_over_cap.join(","))
                    .with_metadata("rejected_oversize", outcome.rejected_oversize.join(",")),
            );
        }

        Ok(outcome)
    }

    pub fn remove_attachment(&self, index: usize) -> Result<Attachment, WizardError> {
        self.with_editable_state(|state| {
            let len = state.attachments.len();
            if index >= len {
                return Err(WizardError::AttachmentIndexOutOfRange { index, len });
            }
            Ok(state.attachments.remove(index))
        })
    }

    /// Sends the lead through `adapter`. Only valid on the final step with a
    /// passing final validator; a failed submission may be retried by calling
    /// this again.
    pub async fn submit<A>(&self, adapter: &A) -> Result<SubmissionReceipt, WizardError>
    where
        A: SubmissionAdapter + ?Sized,
    {
        let payload = self.begin_submission()?;
        let mut in_flight = InFlight { wizard: self, armed: true };

        info!(
            event_name = "wizard.submission.started",
            wizard_id = %self.id,
            attachment_count = payload.attachments.len(),
            "submitting lead"
        );
        self.emit(WizardEvent::new(&self.id, "wizard.submission_started", EventOutcome::Success));

        let result = adapter.submit(&payload).await;
        in_flight.armed = false;
        self.finish_submission(&result);

        match &result {
            Ok(receipt) => {
                info!(
                    event_name = "wizard.submission.succeeded",
                    wizard_id = %self.id,
                    reference = %receipt.reference,
                    server_assigned = receipt.server_assigned,
                    "lead submitted"
                );
                self.emit(
                    WizardEvent::new(&self.id, "wizard.submission_succeeded", EventOutcome::Success)
                        .with_metadata("reference", receipt.reference.to_string()),
                );
            }
            Err(error) => {
                warn!(
                    event_name = "wizard.submission.failed",
                    wizard_id = %self.id,
                    error_class = error.class(),
                    error = %error,
                    "lead submission failed"
                );
                self.emit(
                    WizardEvent::new(&self.id, "wizard.submission_failed", EventOutcome::Failed)
                        .with_metadata("error_class", error.class())
                        .with_metadata("message", error.user_message()),
                );
            }
        }

        result.map_err(WizardError::from)
    }

    /// Discards all entered data. An in-flight submission is not cancelled; its
    /// result is logged and dropped when it resolves.
    pub fn close(&self, reason: CloseReason) -> Result<(), WizardError> {
        let previous = self.lock().take().ok_or(WizardError::WizardClosed)?;

        if previous.submission_status == SubmissionStatus::Submitting {
            warn!(
                event_name = "wizard.closed_in_flight",
                wizard_id = %self.id,
                "wizard closed while a submission is in flight"
            );
        }
        info!(
            event_name = "wizard.closed",
            wizard_id = %self.id,
            reason = reason.as_str(),
            "quote wizard closed"
        );
        self.emit(
            WizardEvent::new(&self.id, "wizard.closed", EventOutcome::Success)
                .with_metadata("reason", reason.as_str())
                .with_metadata("step", previous.step_number().to_string()),
        );
        Ok(())
    }

    fn begin_submission(&self) -> Result<LeadPayload, WizardError> {
        let result = self.with_state(|state| {
            match state.submission_status {
                SubmissionStatus::Submitting => return Err(WizardError::SubmissionInFlight),
                SubmissionStatus::Succeeded => return Err(WizardError::AlreadySubmitted),
                SubmissionStatus::Idle | SubmissionStatus::Failed => {}
            }

            let step = state.current_step;
            if step != WizardStep::LAST {
                return Err(WizardError::NotOnFinalStep { step: step.number() });
            }

            let validation = validate_step(step, &state.fields, &self.settings.rules);
            if !validation.passed() {
                state.field_errors = validation.errors.clone();
                return Err(WizardError::ValidationBlocked {
                    step: step.number(),
                    errors: validation.errors,
                });
            }

            state.field_errors.clear();
            state.failure_message = None;
            state.enter_status(SubmissionStatus::Submitting);
            Ok(LeadPayload::from_state(state, Utc::now()))
        });

        if let Err(error) = &result {
            self.emit_blocked(error);
        }
        result
    }

    /// Runs when a `submit` future is dropped before the adapter answered.
    /// The request may or may not have reached the endpoint; the wizard is
    /// put back into a retryable state either way.
    fn abandon_submission(&self) {
        let mut guard = self.lock();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.submission_status != SubmissionStatus::Submitting {
            return;
        }
        state.failure_message = Some(NETWORK_FAILURE_MESSAGE.to_owned());
        state.enter_status(SubmissionStatus::Failed);
        drop(guard);

        warn!(
            event_name = "wizard.submission.abandoned",
            wizard_id = %self.id,
            "submission was dropped before the endpoint answered"
        );
        self.emit(
            WizardEvent::new(&self.id, "wizard.submission_failed", EventOutcome::Failed)
                .with_metadata("error_class", "abandoned")
                .with_metadata("message", NETWORK_FAILURE_MESSAGE),
        );
    }

    fn emit_blocked(&self, error: &WizardError) {
        if let WizardError::ValidationBlocked { step, .. } = error {
            self.emit(
                WizardEvent::new(&self.id, "wizard.step_blocked", EventOutcome::Rejected)
                    .with_metadata("step", step.to_string())
                    .with_metadata("error", error.to_string()),
            );
        }
    }

    fn finish_submission(&self, result: &Result<SubmissionReceipt, SubmissionError>) {
        let mut guard = self.lock();
        let Some(state) = guard.as_mut() else {
            info!(
                event_name = "wizard.submission.resolved_after_close",
                wizard_id = %self.id,
                succeeded = result.is_ok(),
                "submission resolved after the wizard was closed"
            );
            return;
        };

        match result {
            Ok(receipt) => {
                state.reference = Some(receipt.reference.clone());
                state.enter_status(SubmissionStatus::Succeeded);
            }
            Err(error) => {
                state.failure_message = Some(error.user_message());
                state.enter_status(SubmissionStatus::Failed);
            }
        }
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut WizardState) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let mut guard = self.lock();
        let state = guard.as_mut().ok_or(WizardError::WizardClosed)?;
        f(state)
    }

    fn with_editable_state<T>(
        &self,
        f: impl FnOnce(&mut WizardState) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        self.with_state(|state| match state.submission_status {
            SubmissionStatus::Submitting => Err(WizardError::SubmissionInFlight),
            SubmissionStatus::Succeeded => Err(WizardError::AlreadySubmitted),
            SubmissionStatus::Idle | SubmissionStatus::Failed => f(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<WizardState>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: WizardEvent) {
        self.sink.emit(event);
    }
}

/// Marks a submission as abandoned if the `submit` future is dropped while
/// the adapter call is still pending.
struct InFlight<'a> {
    wizard: &'a QuoteWizard,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.wizard.abandon_submission();
        }
    }
}
