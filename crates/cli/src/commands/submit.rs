use std::sync::Arc;

use plumbline_core::config::{AppConfig, LoadOptions};
use plumbline_core::submission::SubmissionAdapter;
use plumbline_core::wizard::{CloseReason, QuoteWizard, WizardSettings};
use plumbline_core::WizardError;
use plumbline_http::HttpSubmissionAdapter;
use tracing::info;

use crate::commands::{
    fill_wizard, CommandResult, LeadInput, LogEventSink, EXIT_CONFIG, EXIT_SETUP,
    EXIT_SUBMISSION, EXIT_VALIDATION,
};

const COMMAND: &str = "submit";

pub fn run(input: &LeadInput) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let adapter = match HttpSubmissionAdapter::new(&config.endpoint) {
        Ok(adapter) => adapter,
        Err(error) => {
            return CommandResult::failure(COMMAND, "client_setup", error.to_string(), EXIT_SETUP)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_SETUP,
            )
        }
    };

    runtime.block_on(submit_with(&config, input, &adapter))
}

/// Runs one wizard to completion against `adapter`. Split out so tests can
/// supply their own adapter and runtime.
pub async fn submit_with<A>(config: &AppConfig, input: &LeadInput, adapter: &A) -> CommandResult
where
    A: SubmissionAdapter + ?Sized,
{
    let wizard = QuoteWizard::open(WizardSettings::from(&config.wizard), Arc::new(LogEventSink));

    if let Err(error) = fill_wizard(&wizard, input) {
        let _ = wizard.close(CloseReason::Cancelled);
        return CommandResult::failure(COMMAND, error.class(), error.to_string(), EXIT_VALIDATION);
    }

    match wizard.submit(adapter).await {
        Ok(receipt) => {
            let _ = wizard.close(CloseReason::Completed);
            info!(
                event_name = "cli.submit.completed",
                reference = %receipt.reference,
                "lead submitted"
            );
            CommandResult::success(
                COMMAND,
                format!("lead submitted; confirmation reference {}", receipt.reference),
            )
        }
        Err(error) => {
            let exit_code = if matches!(error, WizardError::Submission(_)) {
                EXIT_SUBMISSION
            } else {
                EXIT_VALIDATION
            };
            let _ = wizard.close(CloseReason::Cancelled);
            CommandResult::failure(COMMAND, error.class(), error.user_message(), exit_code)
        }
    }
}
