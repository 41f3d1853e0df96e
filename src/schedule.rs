use crate::error::AppError;

/// Day names accepted in `--days`, mapped to indices with 0 = Sunday.
const DAY_NAME_TO_INDEX: [(&str, u8); 7] = [
    ("sun", 0),
    ("mon", 1),
    ("tue", 2),
    ("wed", 3),
    ("thu", 4),
    ("fri", 5),
    ("sat", 6),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalType {
    Day,
    Week,
    Month,
}

impl IntervalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalType::Day => "day",
            IntervalType::Week => "week",
            IntervalType::Month => "month",
        }
    }
}

/// Recurrence rule for a habit. Exactly one variant is active; the `type`
/// field on the wire is the discriminant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum HabitSchedule {
    #[serde(rename = "specific-days", rename_all = "camelCase")]
    SpecificDays { days_of_week: Vec<u8> },

    #[serde(rename = "rolling", rename_all = "camelCase")]
    Rolling {
        interval_type: IntervalType,
        interval_quantity: u32,
        reset_on_miss: bool,
    },

    #[serde(rename = "flexible-window", rename_all = "camelCase")]
    FlexibleWindow {
        window_length: u32,
        interval_type: IntervalType,
        reset_on_miss: bool,
    },
}

/// Parses the `--days` pattern into a sorted, deduplicated day-index list.
/// Accepts `everyday`, `weekdays`, `weekends`, or comma-separated day names.
pub fn parse_days_pattern(pattern_raw: &str) -> Result<Vec<u8>, AppError> {
    let pattern = pattern_raw.trim().to_lowercase();
    if pattern.is_empty() {
        return Err(AppError::usage("Invalid days pattern"));
    }

    let mut days: Vec<u8> = if pattern == "everyday" {
        vec![0, 1, 2, 3, 4, 5, 6]
    } else if pattern == "weekdays" {
        vec![1, 2, 3, 4, 5]
    } else if pattern == "weekends" {
        vec![0, 6]
    } else {
        let parts: Vec<&str> = pattern
            .split(',')
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(AppError::usage(format!(
                "Invalid days pattern: {}",
                pattern_raw
            )));
        }
        let mut out: Vec<u8> = Vec::new();
        for p in parts {
            let idx = DAY_NAME_TO_INDEX
                .iter()
                .find(|(name, _)| *name == p)
                .map(|(_, d)| *d)
                .ok_or_else(|| {
                    AppError::usage(format!("Invalid days pattern: {}", pattern_raw))
                })?;
            if !out.contains(&idx) {
                out.push(idx);
            }
        }
        out
    };

    days.sort_unstable();
    Ok(days)
}

/// Maps a wire-format schedule value into the closed union. Current payloads
/// deserialize directly; older shapes (`intervalDays` for the window length,
/// `occurrencesPerWindow`, absent `resetOnMiss`) are migrated here so nothing
/// past this boundary ever sees them.
pub fn schedule_from_wire(value: &serde_json::Value) -> Result<HabitSchedule, AppError> {
    if let Ok(schedule) = serde_json::from_value::<HabitSchedule>(value.clone()) {
        return Ok(schedule);
    }

    let kind = value
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::io("Habit payload has no schedule type"))?;

    let get_u32 = |field: &str| value.get(field).and_then(|v| v.as_u64()).map(|n| n as u32);
    let interval_type = value
        .get("intervalType")
        .and_then(|v| serde_json::from_value::<IntervalType>(v.clone()).ok());
    let reset_on_miss = value
        .get("resetOnMiss")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    match kind {
        "specific-days" => Ok(HabitSchedule::SpecificDays {
            days_of_week: value
                .get("daysOfWeek")
                .and_then(|v| serde_json::from_value::<Vec<u8>>(v.clone()).ok())
                .unwrap_or_default(),
        }),
        "rolling" => Ok(HabitSchedule::Rolling {
            interval_type: interval_type.unwrap_or(IntervalType::Day),
            interval_quantity: get_u32("intervalQuantity").unwrap_or(1),
            reset_on_miss,
        }),
        "flexible-window" => Ok(HabitSchedule::FlexibleWindow {
            // Oldest payloads stored the window as intervalDays.
            window_length: get_u32("windowLength")
                .or_else(|| get_u32("intervalDays"))
                .or_else(|| get_u32("occurrencesPerWindow"))
                .unwrap_or(2),
            interval_type: interval_type.unwrap_or(IntervalType::Week),
            reset_on_miss,
        }),
        other => Err(AppError::io(format!("Unknown schedule type: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn days_patterns() {
        assert_eq!(parse_days_pattern("everyday").unwrap(), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(parse_days_pattern("weekdays").unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(parse_days_pattern("weekends").unwrap(), vec![0, 6]);
        assert_eq!(parse_days_pattern("fri,mon,wed,mon").unwrap(), vec![1, 3, 5]);
        assert!(parse_days_pattern("mon,funday").is_err());
        assert!(parse_days_pattern("  ").is_err());
    }

    #[test]
    fn tagged_union_wire_shape() {
        let schedule = HabitSchedule::Rolling {
            interval_type: IntervalType::Week,
            interval_quantity: 2,
            reset_on_miss: true,
        };
        let v = serde_json::to_value(&schedule).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "rolling",
                "intervalType": "week",
                "intervalQuantity": 2,
                "resetOnMiss": true
            })
        );
        assert_eq!(schedule_from_wire(&v).unwrap(), schedule);
    }

    #[test]
    fn legacy_flexible_window_shape_is_migrated() {
        let v = json!({ "type": "flexible-window", "intervalDays": 3 });
        assert_eq!(
            schedule_from_wire(&v).unwrap(),
            HabitSchedule::FlexibleWindow {
                window_length: 3,
                interval_type: IntervalType::Week,
                reset_on_miss: false,
            }
        );
    }

    #[test]
    fn legacy_flexible_window_defaults() {
        let v = json!({ "type": "flexible-window" });
        assert_eq!(
            schedule_from_wire(&v).unwrap(),
            HabitSchedule::FlexibleWindow {
                window_length: 2,
                interval_type: IntervalType::Week,
                reset_on_miss: false,
            }
        );
    }

    #[test]
    fn legacy_rolling_without_reset_flag() {
        let v = json!({ "type": "rolling", "intervalType": "day", "intervalQuantity": 3 });
        assert_eq!(
            schedule_from_wire(&v).unwrap(),
            HabitSchedule::Rolling {
                interval_type: IntervalType::Day,
                interval_quantity: 3,
                reset_on_miss: false,
            }
        );
    }

    #[test]
    fn unknown_schedule_type_is_rejected() {
        let v = json!({ "type": "lunar", "phase": "full" });
        assert!(schedule_from_wire(&v).is_err());
    }
}
