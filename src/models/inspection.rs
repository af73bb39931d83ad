use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::validation::{FieldErrors, trimmed, upper_trimmed};
use crate::models::{RecordId, string_enum};

string_enum! {
    FuelLevel {
        Empty => "empty",
        Quarter => "1/4",
        Half => "1/2",
        ThreeQuarters => "3/4",
        Full => "full",
    }
}

string_enum! {
    #[derive(Default)]
    UrgencyLevel {
        #[default]
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    #[derive(Default)]
    InspectionStatus {
        #[default]
        Pending => "pending",
        Reviewed => "reviewed",
        ActionRequired => "action-required",
        Completed => "completed",
    }
}

/// A vehicle condition report filed at check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub driver: String,
    pub check_in_time: DateTime<Utc>,
    pub tractor_number: String,
    pub trailer_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moffett_number: Option<String>,
    pub odometer_reading: f64,
    pub fuel_level: FuelLevel,
    pub safety_checks: Vec<String>,
    pub equipment_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_found: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repairs_needed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_comments: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub submitted_at: DateTime<Utc>,
    pub status: InspectionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionPayload {
    pub driver: Option<String>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub tractor_number: Option<String>,
    pub trailer_number: Option<String>,
    pub moffett_number: Option<String>,
    pub odometer_reading: Option<Value>,
    pub fuel_level: Option<String>,
    pub safety_checks: Option<Vec<String>>,
    pub equipment_checks: Option<Vec<String>>,
    pub damage_found: Option<String>,
    pub repairs_needed: Option<String>,
    pub delivery_notes: Option<String>,
    pub additional_comments: Option<String>,
    pub urgency_level: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInspection {
    pub driver: String,
    pub check_in_time: Option<DateTime<Utc>>,
    pub tractor_number: String,
    pub trailer_number: String,
    pub moffett_number: Option<String>,
    pub odometer_reading: f64,
    pub fuel_level: FuelLevel,
    pub safety_checks: Vec<String>,
    pub equipment_checks: Vec<String>,
    pub damage_found: Option<String>,
    pub repairs_needed: Option<String>,
    pub delivery_notes: Option<String>,
    pub additional_comments: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: InspectionStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdatePayload {
    pub status: Option<String>,
}

impl InspectionPayload {
    pub fn validate(self) -> Result<NewInspection, Vec<String>> {
        let mut errors = FieldErrors::new();

        let driver = errors.required("driver", self.driver);
        let tractor_number = errors.required("tractorNumber", upper_trimmed(self.tractor_number));
        let trailer_number = errors.required("trailerNumber", upper_trimmed(self.trailer_number));
        let odometer_reading = odometer(&mut errors, self.odometer_reading);
        let fuel_level = errors.required_enumeration("fuelLevel", self.fuel_level);
        let explicit_urgency = errors.enumeration("urgencyLevel", self.urgency_level);
        let status = errors.enumeration("status", self.status);

        let repairs_needed = trimmed(self.repairs_needed);
        let urgency_level = resolve_urgency(explicit_urgency, repairs_needed.as_deref());

        errors.into_result(|| NewInspection {
            driver: driver.unwrap_or_default(),
            check_in_time: self.check_in_time.map(|ts| ts.trunc_subsecs(3)),
            tractor_number: tractor_number.unwrap_or_default(),
            trailer_number: trailer_number.unwrap_or_default(),
            moffett_number: upper_trimmed(self.moffett_number),
            odometer_reading: odometer_reading.unwrap_or_default(),
            fuel_level: fuel_level.unwrap_or(FuelLevel::Empty),
            safety_checks: self.safety_checks.unwrap_or_default(),
            equipment_checks: self.equipment_checks.unwrap_or_default(),
            damage_found: trimmed(self.damage_found),
            repairs_needed,
            delivery_notes: trimmed(self.delivery_notes),
            additional_comments: trimmed(self.additional_comments),
            urgency_level,
            submitted_at: self.submitted_at.map(|ts| ts.trunc_subsecs(3)),
            status: status.unwrap_or_default(),
        })
    }
}

impl StatusUpdatePayload {
    pub fn validate(self) -> Result<InspectionStatus, Vec<String>> {
        let mut errors = FieldErrors::new();
        let status = errors.required_enumeration("status", self.status);
        errors.into_result(|| status.unwrap_or_default())
    }
}

impl NewInspection {
    pub fn into_record(self, id: RecordId, now: DateTime<Utc>) -> Inspection {
        Inspection {
            id,
            driver: self.driver,
            check_in_time: self.check_in_time.unwrap_or(now),
            tractor_number: self.tractor_number,
            trailer_number: self.trailer_number,
            moffett_number: self.moffett_number,
            odometer_reading: self.odometer_reading,
            fuel_level: self.fuel_level,
            safety_checks: self.safety_checks,
            equipment_checks: self.equipment_checks,
            damage_found: self.damage_found,
            repairs_needed: self.repairs_needed,
            delivery_notes: self.delivery_notes,
            additional_comments: self.additional_comments,
            urgency_level: self.urgency_level,
            submitted_at: self.submitted_at.unwrap_or(now),
            status: self.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An explicit urgency always wins. Otherwise repair notes mentioning
/// "urgent" or "critical" escalate the report to high.
pub fn resolve_urgency(explicit: Option<UrgencyLevel>, repairs_needed: Option<&str>) -> UrgencyLevel {
    if let Some(level) = explicit {
        return level;
    }

    let escalate = repairs_needed.is_some_and(|text| {
        let text = text.to_lowercase();
        text.contains("urgent") || text.contains("critical")
    });

    if escalate {
        UrgencyLevel::High
    } else {
        UrgencyLevel::default()
    }
}

fn odometer(errors: &mut FieldErrors, value: Option<Value>) -> Option<f64> {
    const PATH: &str = "odometerReading";

    let reading = match value {
        None | Some(Value::Null) => {
            errors.push(format!("Path `{PATH}` is required."));
            return None;
        }
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) if !raw.trim().is_empty() => raw.trim().parse::<f64>().ok(),
        Some(Value::String(_)) => {
            errors.push(format!("Path `{PATH}` is required."));
            return None;
        }
        Some(_) => None,
    };

    match reading.filter(|value| value.is_finite()) {
        Some(value) if value < 0.0 => {
            errors.push(format!(
                "Path `{PATH}` ({value}) is less than minimum allowed value (0)."
            ));
            None
        }
        Some(value) => Some(value),
        None => {
            errors.push(format!("Cast to Number failed for path `{PATH}`."));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        FuelLevel, InspectionPayload, InspectionStatus, StatusUpdatePayload, UrgencyLevel,
        resolve_urgency,
    };

    fn payload() -> InspectionPayload {
        InspectionPayload {
            driver: Some("John Smith".to_string()),
            tractor_number: Some(" tr-12 ".to_string()),
            trailer_number: Some("tl-7".to_string()),
            odometer_reading: Some(json!(120345)),
            fuel_level: Some("3/4".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn identifiers_are_upper_cased_and_defaults_applied() {
        let inspection = payload().validate().unwrap();

        assert_eq!(inspection.tractor_number, "TR-12");
        assert_eq!(inspection.trailer_number, "TL-7");
        assert_eq!(inspection.fuel_level, FuelLevel::ThreeQuarters);
        assert_eq!(inspection.urgency_level, UrgencyLevel::Low);
        assert_eq!(inspection.status, InspectionStatus::Pending);
        assert!(inspection.safety_checks.is_empty());
    }

    #[test]
    fn repair_notes_escalate_missing_urgency() {
        assert_eq!(
            resolve_urgency(None, Some("URGENT: brake line leaking")),
            UrgencyLevel::High
        );
        assert_eq!(
            resolve_urgency(None, Some("critical tire wear")),
            UrgencyLevel::High
        );
        assert_eq!(resolve_urgency(None, Some("wiper blade")), UrgencyLevel::Low);
        assert_eq!(resolve_urgency(None, None), UrgencyLevel::Low);
    }

    #[test]
    fn explicit_urgency_is_never_overwritten() {
        assert_eq!(
            resolve_urgency(Some(UrgencyLevel::Medium), Some("urgent repair")),
            UrgencyLevel::Medium
        );

        let inspection = InspectionPayload {
            urgency_level: Some("critical".to_string()),
            repairs_needed: Some("nothing urgent".to_string()),
            ..payload()
        }
        .validate()
        .unwrap();
        assert_eq!(inspection.urgency_level, UrgencyLevel::Critical);
    }

    #[test]
    fn blank_urgency_counts_as_missing() {
        let inspection = InspectionPayload {
            urgency_level: Some(String::new()),
            repairs_needed: Some("Urgent coupling repair".to_string()),
            ..payload()
        }
        .validate()
        .unwrap();
        assert_eq!(inspection.urgency_level, UrgencyLevel::High);
    }

    #[test]
    fn free_text_fields_are_trimmed_alike() {
        let inspection = InspectionPayload {
            damage_found: Some("  dent on door ".to_string()),
            repairs_needed: Some("  replace mirror  ".to_string()),
            delivery_notes: Some("   ".to_string()),
            ..payload()
        }
        .validate()
        .unwrap();

        assert_eq!(inspection.damage_found.as_deref(), Some("dent on door"));
        assert_eq!(inspection.repairs_needed.as_deref(), Some("replace mirror"));
        assert_eq!(inspection.delivery_notes, None);
    }

    #[test]
    fn negative_odometer_is_rejected() {
        let errors = InspectionPayload {
            odometer_reading: Some(json!(-1)),
            ..payload()
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("minimum allowed value"));
    }

    #[test]
    fn numeric_string_odometer_is_cast() {
        let inspection = InspectionPayload {
            odometer_reading: Some(json!(" 4500.5 ")),
            ..payload()
        }
        .validate()
        .unwrap();
        assert_eq!(inspection.odometer_reading, 4500.5);

        let errors = InspectionPayload {
            odometer_reading: Some(json!("lots")),
            ..payload()
        }
        .validate()
        .unwrap_err();
        assert!(errors[0].contains("Cast to Number"));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = InspectionPayload::default().validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|msg| msg.contains("`fuelLevel`")));
        assert!(errors.iter().any(|msg| msg.contains("`odometerReading`")));
    }

    #[test]
    fn status_update_requires_known_status() {
        assert_eq!(
            StatusUpdatePayload {
                status: Some("action-required".to_string())
            }
            .validate()
            .unwrap(),
            InspectionStatus::ActionRequired
        );
        assert!(
            StatusUpdatePayload {
                status: Some("bogus".to_string())
            }
            .validate()
            .is_err()
        );
        assert!(StatusUpdatePayload::default().validate().is_err());
    }
}
