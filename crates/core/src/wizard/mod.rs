pub mod controller;
pub mod states;
pub mod validation;

pub use controller::{QuoteWizard, WizardSettings};
pub use states::{CloseReason, SubmissionStatus, WizardState, WizardStep, TOTAL_STEPS};
pub use validation::{validate_step, StepValidation, ValidationRules};
