use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::lead::{FieldName, ServiceCategory, Urgency};
use crate::wizard::states::WizardStep;

pub const DEFAULT_MIN_DESCRIPTION_CHARS: usize = 10;
pub const MIN_PHONE_DIGITS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// The trimmed description must be strictly longer than this.
    pub min_description_chars: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self { min_description_chars: DEFAULT_MIN_DESCRIPTION_CHARS }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidation {
    pub step: WizardStep,
    pub errors: BTreeMap<FieldName, String>,
}

impl StepValidation {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_step(
    step: WizardStep,
    fields: &BTreeMap<FieldName, String>,
    rules: &ValidationRules,
) -> StepValidation {
    let errors = step
        .fields()
        .iter()
        .filter_map(|field| field_error(*field, fields, rules).map(|message| (*field, message)))
        .collect();

    StepValidation { step, errors }
}

/// Checks one field on its own. Missing and whitespace-only values count as empty.
pub fn field_error(
    field: FieldName,
    fields: &BTreeMap<FieldName, String>,
    rules: &ValidationRules,
) -> Option<String> {
    let value = fields.get(&field).map(|value| value.trim()).unwrap_or_default();

    match field {
        FieldName::Service => {
            if value.is_empty() {
                Some("Please choose the service you need.".to_owned())
            } else if value.parse::<ServiceCategory>().is_err() {
                Some("Please choose one of the listed services.".to_owned())
            } else {
                None
            }
        }
        FieldName::Urgency => {
            if value.is_empty() {
                Some("Please tell us how soon you need help.".to_owned())
            } else if value.parse::<Urgency>().is_err() {
                Some("Please choose one of the listed urgency levels.".to_owned())
            } else {
                None
            }
        }
        FieldName::Location => {
            value.is_empty().then(|| "Please tell us where the problem is.".to_owned())
        }
        FieldName::Description => {
            if value.is_empty() {
                Some("Please describe the problem.".to_owned())
            } else if value.chars().count() <= rules.min_description_chars {
                Some(format!(
                    "Please add a little more detail (more than {} characters).",
                    rules.min_description_chars
                ))
            } else {
                None
            }
        }
        FieldName::Name => value.is_empty().then(|| "Please enter your name.".to_owned()),
        FieldName::Email => {
            (!is_valid_email(value)).then(|| "Please enter a valid email address.".to_owned())
        }
        FieldName::Phone => (phone_digit_count(value) < MIN_PHONE_DIGITS)
            .then(|| format!("Please enter a phone number with at least {MIN_PHONE_DIGITS} digits.")),
        FieldName::Address => {
            value.is_empty().then(|| "Please enter the service address.".to_owned())
        }
    }
}

/// `local@domain.tld` shape: one `@`, no whitespace, and a dot in the domain
/// with text on both sides of the last one.
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn phone_digit_count(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::domain::lead::FieldName;
    use crate::wizard::states::WizardStep;

    use super::{field_error, is_valid_email, phone_digit_count, validate_step, ValidationRules};

    fn fields(entries: &[(FieldName, &str)]) -> BTreeMap<FieldName, String> {
        entries.iter().map(|(field, value)| (*field, (*value).to_owned())).collect()
    }

    #[test]
    fn service_step_requires_known_service_and_urgency() {
        let rules = ValidationRules::default();

        let empty = validate_step(WizardStep::ServiceDetails, &BTreeMap::new(), &rules);
        assert!(!empty.passed());
        assert!(empty.errors.contains_key(&FieldName::Service));
        assert!(empty.errors.contains_key(&FieldName::Urgency));

        let unknown = validate_step(
            WizardStep::ServiceDetails,
            &fields(&[(FieldName::Service, "roofing"), (FieldName::Urgency, "urgent")]),
            &rules,
        );
        assert_eq!(unknown.errors.keys().collect::<Vec<_>>(), vec![&FieldName::Service]);

        let valid = validate_step(
            WizardStep::ServiceDetails,
            &fields(&[(FieldName::Service, "drain-cleaning"), (FieldName::Urgency, "urgent")]),
            &rules,
        );
        assert!(valid.passed());
    }

    #[test]
    fn description_must_exceed_minimum_after_trimming() {
        let rules = ValidationRules::default();
        let short =
            fields(&[(FieldName::Location, "Kitchen"), (FieldName::Description, "  leaky!   ")]);
        assert!(field_error(FieldName::Description, &short, &rules).is_some());

        let exactly_ten = fields(&[(FieldName::Description, "0123456789")]);
        assert!(field_error(FieldName::Description, &exactly_ten, &rules).is_some());

        let eleven =
            fields(&[(FieldName::Location, "Kitchen"), (FieldName::Description, "01234567890")]);
        assert!(validate_step(WizardStep::ProblemDetails, &eleven, &rules).passed());
    }

    #[test]
    fn whitespace_only_values_are_treated_as_empty() {
        let rules = ValidationRules::default();
        let blank = fields(&[
            (FieldName::Name, "   "),
            (FieldName::Email, "jane@example.com"),
            (FieldName::Phone, "360-555-0100"),
            (FieldName::Address, "\t"),
        ]);

        let result = validate_step(WizardStep::Contact, &blank, &rules);
        assert_eq!(
            result.errors.keys().copied().collect::<Vec<_>>(),
            vec![FieldName::Name, FieldName::Address]
        );
    }

    #[test]
    fn photo_step_always_passes() {
        let result =
            validate_step(WizardStep::Photos, &BTreeMap::new(), &ValidationRules::default());
        assert!(result.passed());
    }

    #[test]
    fn step_validation_ignores_other_steps_fields() {
        let rules = ValidationRules::default();
        let only_contact = fields(&[
            (FieldName::Name, "Jane Doe"),
            (FieldName::Email, "jane@example.com"),
            (FieldName::Phone, "(360) 555-0100"),
            (FieldName::Address, "123 Main St"),
            (FieldName::Service, "not-a-service"),
        ]);

        assert!(validate_step(WizardStep::Contact, &only_contact, &rules).passed());
        let service = validate_step(WizardStep::ServiceDetails, &only_contact, &rules);
        let step_fields = WizardStep::ServiceDetails.fields();
        assert!(service.errors.keys().all(|field| step_fields.contains(field)));
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("  jane.doe+quotes@mail.example.co  "));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jane@@example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("jane@example."));
        assert!(!is_valid_email("jane@.com"));
    }

    #[test]
    fn phone_digits_are_counted_after_stripping_formatting() {
        assert_eq!(phone_digit_count("(360) 555-0100"), 10);
        assert_eq!(phone_digit_count("+1 360.555.0100"), 11);
        let rules = ValidationRules::default();
        let short = fields(&[(FieldName::Phone, "555-0100")]);
        assert!(field_error(FieldName::Phone, &short, &rules).is_some());
    }
}
