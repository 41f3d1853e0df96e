use crate::format::{format_date, schedule_to_sentence};
use crate::model::Habit;
use crate::units::resolve_unit_label;

pub struct Styler {
    color_enabled: bool,
}

impl Styler {
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    fn wrap(&self, code: &str, s: &str) -> String {
        if !self.color_enabled {
            return s.to_string();
        }
        format!("{}{}\u{001b}[0m", code, s)
    }

    pub fn bold(&self, s: &str) -> String {
        self.wrap("\u{001b}[1m", s)
    }

    pub fn gray(&self, s: &str) -> String {
        self.wrap("\u{001b}[90m", s)
    }
}

fn pad_right(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        let mut out = String::with_capacity(s.len() + (width - len));
        out.push_str(s);
        out.push_str(&" ".repeat(width - len));
        out
    }
}

pub fn render_simple_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

    for row in rows.iter() {
        for (i, cell) in row.iter().enumerate() {
            let cell_width = cell.chars().count();
            if i >= widths.len() {
                widths.push(cell_width);
            } else {
                widths[i] = widths[i].max(cell_width);
            }
        }
    }

    let header_line = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad_right(h, widths[i]))
        .collect::<Vec<String>>()
        .join("  ");

    let mut body_lines: Vec<String> = Vec::new();
    for row in rows.iter() {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad_right(cell, widths[i]))
            .collect::<Vec<String>>()
            .join("  ");
        body_lines.push(line);
    }

    if body_lines.is_empty() {
        header_line
    } else {
        format!("{}\n{}", header_line, body_lines.join("\n"))
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// One dashboard table row: id, name, schedule sentence, target with unit,
/// archived flag.
pub fn habit_row(habit: &Habit) -> Vec<String> {
    let sentence = schedule_to_sentence(&habit.schedule);
    vec![
        habit.id.clone(),
        habit.name.clone(),
        sentence.line,
        format!("{} {}", trim_float(habit.target_value), resolve_unit_label(&habit.unit)),
        if habit.is_archived { "yes" } else { "no" }.to_string(),
    ]
}

/// Full card for `show`: everything the dashboard card displays, one field
/// per line. Uses the same formatter as the table so the two cannot drift.
pub fn render_habit_card(habit: &Habit, styler: &Styler) -> String {
    let sentence = schedule_to_sentence(&habit.schedule);
    let mut lines: Vec<String> = Vec::new();

    lines.push(styler.bold(&habit.name));
    lines.push(sentence.line);
    if let Some(reset) = sentence.reset {
        lines.push(reset);
    }
    lines.push(format!(
        "Target: {} {}",
        trim_float(habit.target_value),
        resolve_unit_label(&habit.unit)
    ));
    if let Some(notes) = habit.notes.as_deref() {
        lines.push(format!("Notes: {}", notes));
    }
    if let Some(tags) = habit.tags.as_deref() {
        if !tags.is_empty() {
            lines.push(format!("Tags: {}", tags.join(", ")));
        }
    }
    lines.push(styler.gray(&format!(
        "Created: {}",
        format_date(Some(habit.creation_date.date_naive()))
    )));
    lines.push(styler.gray(&format!("Ends: {}", format_date(habit.end_date))));
    if habit.is_archived {
        lines.push(styler.gray("Archived"));
    }
    if !habit.is_active {
        lines.push(styler.gray("Inactive"));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HabitUnit;
    use crate::schedule::{HabitSchedule, IntervalType};
    use chrono::TimeZone;

    fn habit() -> Habit {
        Habit {
            id: "h1".to_string(),
            user_id: "u1".to_string(),
            name: "Run".to_string(),
            creation_date: chrono::Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
            end_date: None,
            is_active: true,
            is_archived: false,
            unit: HabitUnit::from_catalog_key("miles"),
            target_value: 3.0,
            schedule: HabitSchedule::Rolling {
                interval_type: IntervalType::Day,
                interval_quantity: 2,
                reset_on_miss: true,
            },
            notes: Some("before breakfast".to_string()),
            color: None,
            tags: Some(vec!["health".to_string()]),
        }
    }

    #[test]
    fn table_alignment() {
        let table = render_simple_table(
            &["id", "name"],
            &[
                vec!["h1".to_string(), "Run".to_string()],
                vec!["h2".to_string(), "Meditate".to_string()],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].chars().count(), lines[2].chars().count());
    }

    #[test]
    fn habit_row_uses_shared_formatter() {
        let row = habit_row(&habit());
        assert_eq!(row[2], "Complete habit every 2nd day");
        assert_eq!(row[3], "3 Miles");
    }

    #[test]
    fn card_shows_reset_line_and_notes() {
        let card = render_habit_card(&habit(), &Styler::new(false));
        assert!(card.contains("Complete habit every 2nd day"));
        assert!(card.contains("Resets on miss: Yes"));
        assert!(card.contains("Notes: before breakfast"));
        assert!(card.contains("Tags: health"));
        assert!(card.contains("Created: Jan 5, 2026"));
        assert!(card.contains("Ends: \u{2014}"));
    }
}
