use chrono::{DateTime, NaiveDate, Utc};

use crate::schedule::HabitSchedule;
use crate::units::UnitCategory;

/// Default card color when the user picks none (first palette entry).
pub const DEFAULT_COLOR: &str = "#D13E78";

/// Unit of measure embedded in a habit: either a catalog key or a
/// user-defined custom label.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitUnit {
    pub unit_key: String,
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_decimal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<UnitCategory>,
}

impl HabitUnit {
    pub fn from_catalog_key(key: &str) -> Self {
        let def = crate::units::find_unit(key);
        HabitUnit {
            unit_key: key.to_string(),
            is_custom: false,
            custom_label: None,
            allows_decimal: def.map(|d| d.allows_decimal),
            category: def.map(|d| d.category),
        }
    }

    pub fn custom(label: &str) -> Self {
        HabitUnit {
            unit_key: label.to_string(),
            is_custom: true,
            custom_label: Some(label.to_string()),
            allows_decimal: None,
            category: Some(UnitCategory::Custom),
        }
    }
}

/// Aggregate root as held in memory after mapping in from the storage
/// collaborator. `id` and `creation_date` are server-assigned.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub creation_date: DateTime<Utc>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub is_archived: bool,
    pub unit: HabitUnit,
    pub target_value: f64,
    pub schedule: HabitSchedule,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Full habit shape minus the server-assigned fields. Built only from
/// validated form state; see `validate::build_habit_create`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCreate {
    pub user_id: String,
    pub name: String,
    pub unit: HabitUnit,
    pub target_value: f64,
    pub schedule: HabitSchedule,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub is_archived: bool,
    pub end_date: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

/// Sparse PATCH body: a field serializes only when explicitly set, so the
/// storage collaborator leaves everything else untouched. `end_date` is
/// tri-state (absent, explicit null to clear, or a date).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<HabitUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<HabitSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl HabitUpdate {
    pub fn is_empty(&self) -> bool {
        self == &HabitUpdate::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_with_only_notes_serializes_one_field() {
        let update = HabitUpdate {
            notes: Some("x".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "notes": "x" }));
    }

    #[test]
    fn clearing_end_date_serializes_explicit_null() {
        let update = HabitUpdate {
            end_date: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "endDate": null }));
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let update = HabitUpdate::default();
        assert!(update.is_empty());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({}));
    }

    #[test]
    fn habit_unit_wire_names_are_camel_case() {
        let unit = HabitUnit::from_catalog_key("miles");
        let v = serde_json::to_value(&unit).unwrap();
        assert_eq!(v["unitKey"], "miles");
        assert_eq!(v["isCustom"], false);
        assert_eq!(v["allowsDecimal"], true);
        assert_eq!(v["category"], "distance");
    }
}
