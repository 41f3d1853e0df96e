use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::model::{HabitCreate, HabitUnit, DEFAULT_COLOR};
use crate::schedule::HabitSchedule;
use crate::units::{find_unit, unit_allows_decimal};

/// Form state as submitted: everything the user typed, with the target value
/// still a string. Validation is all-or-nothing; every failing field is
/// reported in one `ValidationError`.
#[derive(Debug, Clone)]
pub struct HabitDraft {
    pub name: String,
    pub unit: HabitUnit,
    pub target_value: String,
    pub schedule: HabitSchedule,
    pub notes: Option<String>,
    pub color: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub tags: Option<Vec<String>>,
}

pub fn validate_schedule(schedule: &HabitSchedule, errors: &mut ValidationError) {
    match schedule {
        HabitSchedule::SpecificDays { days_of_week } => {
            if days_of_week.is_empty() {
                errors.push("schedule.daysOfWeek", "Select at least one day");
            } else if days_of_week.iter().any(|d| *d > 6) {
                errors.push("schedule.daysOfWeek", "Day index must be between 0 and 6");
            }
        }
        HabitSchedule::Rolling {
            interval_quantity, ..
        } => {
            if *interval_quantity < 1 {
                errors.push(
                    "schedule.intervalQuantity",
                    "Interval quantity must be at least 1",
                );
            }
        }
        HabitSchedule::FlexibleWindow { window_length, .. } => {
            if *window_length < 1 {
                errors.push("schedule.windowLength", "Window length must be at least 1");
            }
        }
    }
}

fn validate_unit(unit: &HabitUnit, errors: &mut ValidationError) {
    if unit.unit_key.trim().is_empty() {
        errors.push("unit.unitKey", "Please select a unit of measure");
        return;
    }
    if unit.is_custom {
        if unit.custom_label.as_deref().map_or(true, |l| l.trim().is_empty()) {
            errors.push("unit.customLabel", "Custom unit needs a label");
        }
    } else if find_unit(&unit.unit_key).is_none() {
        errors.push(
            "unit.unitKey",
            format!("Unknown unit: {}", unit.unit_key),
        );
    }
}

fn validate_target(raw: &str, unit: &HabitUnit, errors: &mut ValidationError) -> Option<f64> {
    let value: f64 = match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            errors.push("targetValue", "Enter a number");
            return None;
        }
    };
    if !value.is_finite() || value < 1.0 {
        errors.push("targetValue", "Target value must be at least 1");
        return None;
    }
    if value.fract() != 0.0 && !unit_allows_decimal(unit) {
        errors.push("targetValue", "This unit takes whole numbers");
        return None;
    }
    Some(value)
}

/// Validates a draft and, on success, assembles the `HabitCreate` for the
/// authenticated user with creation defaults applied (active, not archived,
/// no end date unless given, palette default color).
pub fn build_habit_create(user_id: &str, draft: &HabitDraft) -> Result<HabitCreate, ValidationError> {
    let mut errors = ValidationError::new();

    let name = draft.name.trim().to_string();
    if name.is_empty() {
        errors.push("name", "Name is required");
    }

    validate_unit(&draft.unit, &mut errors);
    let target_value = validate_target(&draft.target_value, &draft.unit, &mut errors);
    validate_schedule(&draft.schedule, &mut errors);

    errors.into_result()?;

    Ok(HabitCreate {
        user_id: user_id.to_string(),
        name,
        unit: draft.unit.clone(),
        target_value: target_value.unwrap_or(1.0),
        schedule: draft.schedule.clone(),
        notes: draft.notes.clone().filter(|n| !n.trim().is_empty()),
        color: Some(
            draft
                .color
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        ),
        is_active: true,
        is_archived: false,
        end_date: draft.end_date,
        tags: draft.tags.clone().filter(|t| !t.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::IntervalType;

    fn draft(schedule: HabitSchedule) -> HabitDraft {
        HabitDraft {
            name: "Drink water".to_string(),
            unit: HabitUnit::from_catalog_key("cups"),
            target_value: "8".to_string(),
            schedule,
            notes: None,
            color: None,
            end_date: None,
            tags: None,
        }
    }

    fn everyday() -> HabitSchedule {
        HabitSchedule::SpecificDays {
            days_of_week: vec![0, 1, 2, 3, 4, 5, 6],
        }
    }

    #[test]
    fn valid_draft_gets_creation_defaults() {
        let create = build_habit_create("u1", &draft(everyday())).unwrap();
        assert_eq!(create.user_id, "u1");
        assert!(create.is_active);
        assert!(!create.is_archived);
        assert_eq!(create.end_date, None);
        assert_eq!(create.color.as_deref(), Some(DEFAULT_COLOR));
        assert_eq!(create.target_value, 8.0);
    }

    #[test]
    fn empty_days_names_the_field() {
        let d = draft(HabitSchedule::SpecificDays { days_of_week: vec![] });
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("schedule.daysOfWeek"));
    }

    #[test]
    fn out_of_range_day_is_rejected() {
        let d = draft(HabitSchedule::SpecificDays { days_of_week: vec![1, 7] });
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("schedule.daysOfWeek"));
    }

    #[test]
    fn zero_interval_quantity_is_rejected() {
        let d = draft(HabitSchedule::Rolling {
            interval_type: IntervalType::Day,
            interval_quantity: 0,
            reset_on_miss: false,
        });
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("schedule.intervalQuantity"));
    }

    #[test]
    fn zero_window_length_is_rejected() {
        let d = draft(HabitSchedule::FlexibleWindow {
            window_length: 0,
            interval_type: IntervalType::Week,
            reset_on_miss: false,
        });
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("schedule.windowLength"));
    }

    #[test]
    fn all_failing_fields_are_reported_together() {
        let mut d = draft(HabitSchedule::SpecificDays { days_of_week: vec![] });
        d.name = "  ".to_string();
        d.target_value = "zero".to_string();
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("name"));
        assert!(err.names_field("targetValue"));
        assert!(err.names_field("schedule.daysOfWeek"));
        assert_eq!(err.errors.len(), 3);
    }

    #[test]
    fn fractional_target_requires_decimal_unit() {
        let mut d = draft(everyday());
        d.target_value = "2.5".to_string();
        // cups do not allow decimals
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("targetValue"));

        d.unit = HabitUnit::from_catalog_key("miles");
        let create = build_habit_create("u1", &d).unwrap();
        assert_eq!(create.target_value, 2.5);
    }

    #[test]
    fn target_below_one_is_rejected() {
        let mut d = draft(everyday());
        d.target_value = "0".to_string();
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("targetValue"));
    }

    #[test]
    fn unknown_catalog_unit_is_rejected() {
        let mut d = draft(everyday());
        d.unit = HabitUnit {
            unit_key: "furlongs".to_string(),
            is_custom: false,
            custom_label: None,
            allows_decimal: None,
            category: None,
        };
        let err = build_habit_create("u1", &d).unwrap_err();
        assert!(err.names_field("unit.unitKey"));
    }

    #[test]
    fn custom_unit_is_accepted() {
        let mut d = draft(everyday());
        d.unit = HabitUnit::custom("pushups");
        let create = build_habit_create("u1", &d).unwrap();
        assert_eq!(create.unit.custom_label.as_deref(), Some("pushups"));
    }
}
