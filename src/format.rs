use chrono::NaiveDate;

use crate::schedule::{HabitSchedule, IntervalType};

const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, ... 11th-13th always "th".
pub fn ordinal_suffix(n: u32) -> &'static str {
    match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}

/// Joins items with an Oxford comma: "A", "A and B", "A, B, and C".
pub fn oxford_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{} and {}", a, b),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

pub fn rolling_sentence(quantity: Option<u32>, interval_type: Option<IntervalType>) -> String {
    let n = quantity.filter(|q| *q > 0).unwrap_or(1);
    let unit = interval_type.unwrap_or(IntervalType::Day).as_str();
    if n == 1 {
        format!("Complete habit every {}", unit)
    } else {
        format!("Complete habit every {}{} {}", n, ordinal_suffix(n), unit)
    }
}

pub fn flexible_sentence(
    window_length: Option<u32>,
    interval_type: Option<IntervalType>,
) -> String {
    let len = window_length.unwrap_or(1).max(1);
    let unit = interval_type.unwrap_or(IntervalType::Day).as_str();
    let plural = if len > 1 { "s" } else { "" };
    format!("Complete habit within {} {}{}", len, unit, plural)
}

pub fn specific_days_sentence(days_of_week: &[u8]) -> String {
    let mut days: Vec<u8> = days_of_week.to_vec();
    days.sort_unstable();
    let labels: Vec<String> = days
        .iter()
        .filter_map(|d| DAY_LABELS.get(*d as usize))
        .map(|s| s.to_string())
        .collect();
    if labels.is_empty() {
        "Complete habit on selected days".to_string()
    } else {
        format!("Complete habit every {}", oxford_list(&labels))
    }
}

/// Display sentences for a schedule. `reset` is present only for the
/// variants that carry a reset-on-miss flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSentence {
    pub line: String,
    pub reset: Option<String>,
}

fn reset_line(reset_on_miss: bool) -> String {
    format!(
        "Resets on miss: {}",
        if reset_on_miss { "Yes" } else { "No" }
    )
}

/// The one schedule-to-text code path. Both the `add` preview and the
/// dashboard card go through here so the two can never drift.
pub fn schedule_to_sentence(schedule: &HabitSchedule) -> ScheduleSentence {
    match schedule {
        HabitSchedule::Rolling {
            interval_type,
            interval_quantity,
            reset_on_miss,
        } => ScheduleSentence {
            line: rolling_sentence(Some(*interval_quantity), Some(*interval_type)),
            reset: Some(reset_line(*reset_on_miss)),
        },
        HabitSchedule::FlexibleWindow {
            window_length,
            interval_type,
            reset_on_miss,
        } => ScheduleSentence {
            line: flexible_sentence(Some(*window_length), Some(*interval_type)),
            reset: Some(reset_line(*reset_on_miss)),
        },
        HabitSchedule::SpecificDays { days_of_week } => ScheduleSentence {
            line: specific_days_sentence(days_of_week),
            reset: None,
        },
    }
}

/// "Jan 5, 2026" style date, em dash when absent.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => "\u{2014}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_suffix_rules_hold_up_to_130() {
        for n in 1..=130u32 {
            let expected = if (11..=13).contains(&(n % 100)) {
                "th"
            } else {
                match n % 10 {
                    1 => "st",
                    2 => "nd",
                    3 => "rd",
                    _ => "th",
                }
            };
            assert_eq!(ordinal_suffix(n), expected, "n = {}", n);
        }
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(111), "th");
    }

    #[test]
    fn rolling_sentences() {
        assert_eq!(
            rolling_sentence(Some(1), Some(IntervalType::Day)),
            "Complete habit every day"
        );
        assert_eq!(
            rolling_sentence(Some(3), Some(IntervalType::Day)),
            "Complete habit every 3rd day"
        );
        assert_eq!(rolling_sentence(None, None), "Complete habit every day");
        assert_eq!(
            rolling_sentence(Some(0), Some(IntervalType::Week)),
            "Complete habit every week"
        );
        assert_eq!(
            rolling_sentence(Some(22), Some(IntervalType::Month)),
            "Complete habit every 22nd month"
        );
    }

    #[test]
    fn flexible_sentences() {
        assert_eq!(
            flexible_sentence(Some(1), Some(IntervalType::Week)),
            "Complete habit within 1 week"
        );
        assert_eq!(
            flexible_sentence(Some(3), Some(IntervalType::Week)),
            "Complete habit within 3 weeks"
        );
        assert_eq!(
            flexible_sentence(Some(0), Some(IntervalType::Day)),
            "Complete habit within 1 day"
        );
        assert_eq!(flexible_sentence(None, None), "Complete habit within 1 day");
    }

    #[test]
    fn specific_days_sentences_use_oxford_comma() {
        assert_eq!(
            specific_days_sentence(&[1, 3, 5]),
            "Complete habit every Mon, Wed, and Fri"
        );
        assert_eq!(
            specific_days_sentence(&[0, 6]),
            "Complete habit every Sun and Sat"
        );
        assert_eq!(specific_days_sentence(&[3]), "Complete habit every Wed");
        assert_eq!(specific_days_sentence(&[]), "Complete habit on selected days");
        // Unsorted input is sorted before rendering.
        assert_eq!(
            specific_days_sentence(&[5, 1, 3]),
            "Complete habit every Mon, Wed, and Fri"
        );
    }

    #[test]
    fn schedule_to_sentence_dispatch() {
        let rolling = HabitSchedule::Rolling {
            interval_type: IntervalType::Day,
            interval_quantity: 3,
            reset_on_miss: false,
        };
        let s = schedule_to_sentence(&rolling);
        assert_eq!(s.line, "Complete habit every 3rd day");
        assert_eq!(s.reset.as_deref(), Some("Resets on miss: No"));

        let window = HabitSchedule::FlexibleWindow {
            window_length: 2,
            interval_type: IntervalType::Week,
            reset_on_miss: true,
        };
        let s = schedule_to_sentence(&window);
        assert_eq!(s.line, "Complete habit within 2 weeks");
        assert_eq!(s.reset.as_deref(), Some("Resets on miss: Yes"));

        let days = HabitSchedule::SpecificDays {
            days_of_week: vec![1, 3, 5],
        };
        let s = schedule_to_sentence(&days);
        assert_eq!(s.line, "Complete habit every Mon, Wed, and Fri");
        assert!(s.reset.is_none());
    }

    #[test]
    fn date_formatting() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date(Some(d)), "Jan 5, 2026");
        assert_eq!(format_date(None), "\u{2014}");
    }
}
