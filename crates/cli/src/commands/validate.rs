use std::sync::Arc;

use plumbline_core::config::{AppConfig, LoadOptions};
use plumbline_core::wizard::{CloseReason, QuoteWizard, WizardSettings, TOTAL_STEPS};

use crate::commands::{
    fill_wizard, CommandResult, LeadInput, LogEventSink, EXIT_CONFIG, EXIT_VALIDATION,
};

const COMMAND: &str = "validate";

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

    validate_with(&config, input)
}

pub fn validate_with(config: &AppConfig, input: &LeadInput) -> CommandResult {
    let wizard = QuoteWizard::open(WizardSettings::from(&config.wizard), Arc::new(LogEventSink));

    // Advancing from the final step only validates it.
    let result = fill_wizard(&wizard, input).and_then(|()| wizard.advance().map(|_| ()));
    let _ = wizard.close(CloseReason::Cancelled);

    match result {
        Ok(()) => CommandResult::success(
            COMMAND,
            format!("all {TOTAL_STEPS} steps are valid; nothing was sent"),
        ),
        Err(error) => {
            CommandResult::failure(COMMAND, error.class(), error.to_string(), EXIT_VALIDATION)
        }
    }
}
