use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Service,
    Urgency,
    Description,
    Location,
    Name,
    Email,
    Phone,
    Address,
}

impl FieldName {
    pub const ALL: [FieldName; 8] = [
        FieldName::Service,
        FieldName::Urgency,
        FieldName::Description,
        FieldName::Location,
        FieldName::Name,
        FieldName::Email,
        FieldName::Phone,
        FieldName::Address,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Urgency => "urgency",
            Self::Description => "description",
            Self::Location => "location",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.as_str() == value.trim())
            .ok_or_else(|| UnknownChoice { kind: "field", value: value.to_owned() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownChoice {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceCategory {
    DrainCleaning,
    WaterHeater,
    LeakRepair,
    SewerLine,
    FixtureInstall,
    Repiping,
    GasLine,
    Other,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 8] = [
        ServiceCategory::DrainCleaning,
        ServiceCategory::WaterHeater,
        ServiceCategory::LeakRepair,
        ServiceCategory::SewerLine,
        ServiceCategory::FixtureInstall,
        ServiceCategory::Repiping,
        ServiceCategory::GasLine,
        ServiceCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrainCleaning => "drain-cleaning",
            Self::WaterHeater => "water-heater",
            Self::LeakRepair => "leak-repair",
            Self::SewerLine => "sewer-line",
            Self::FixtureInstall => "fixture-install",
            Self::Repiping => "repiping",
            Self::GasLine => "gas-line",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DrainCleaning => "Drain Cleaning",
            Self::WaterHeater => "Water Heater Repair & Install",
            Self::LeakRepair => "Leak Detection & Repair",
            Self::SewerLine => "Sewer Line Service",
            Self::FixtureInstall => "Fixture Installation",
            Self::Repiping => "Repiping",
            Self::GasLine => "Gas Line Service",
            Self::Other => "Something Else",
        }
    }
}

impl FromStr for ServiceCategory {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ServiceCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| UnknownChoice { kind: "service category", value: value.to_owned() })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Emergency,
    Urgent,
    Routine,
    Flexible,
}

impl Urgency {
    pub const ALL: [Urgency; 4] =
        [Urgency::Emergency, Urgency::Urgent, Urgency::Routine, Urgency::Flexible];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Urgent => "urgent",
            Self::Routine => "routine",
            Self::Flexible => "flexible",
        }
    }
}

impl FromStr for Urgency {
    type Err = UnknownChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Urgency::ALL
            .into_iter()
            .find(|urgency| urgency.as_str() == normalized)
            .ok_or_else(|| UnknownChoice { kind: "urgency", value: value.to_owned() })
    }
}

/// Confirmation reference shown to the customer once a lead is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadReference(pub String);

impl LeadReference {
    /// Local reference used when the endpoint accepts a lead without assigning one.
    pub fn fallback(at: DateTime<Utc>) -> Self {
        Self(format!("PL-{}", at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{FieldName, LeadReference, ServiceCategory, Urgency};

    #[test]
    fn service_category_parses_wire_names_case_insensitively() {
        assert_eq!("drain-cleaning".parse(), Ok(ServiceCategory::DrainCleaning));
        assert_eq!(" Water-Heater ".parse(), Ok(ServiceCategory::WaterHeater));
        assert!("".parse::<ServiceCategory>().is_err());
        assert!("roofing".parse::<ServiceCategory>().is_err());
    }

    #[test]
    fn urgency_rejects_unknown_levels() {
        assert_eq!("urgent".parse(), Ok(Urgency::Urgent));
        let error = "whenever".parse::<Urgency>().expect_err("unknown urgency");
        assert_eq!(error.to_string(), "unknown urgency `whenever`");
    }

    #[test]
    fn field_names_round_trip_through_display() {
        for field in FieldName::ALL {
            assert_eq!(field.to_string().parse::<FieldName>(), Ok(field));
        }
    }

    #[test]
    fn fallback_reference_is_timestamp_based() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");
        assert_eq!(LeadReference::fallback(at).as_str(), "PL-1772366400000");
    }
}
