use crate::api::ApiClient;
use crate::error::AppError;
use crate::model::Habit;

/// Habit list for one user, fetched once per command and passed explicitly
/// to whatever reads it. A session change invalidates it; a reload is a
/// refetch, never a local mutation.
pub struct HabitCache {
    user_id: String,
    habits: Option<Vec<Habit>>,
}

pub fn stable_habit_sort(a: &Habit, b: &Habit) -> std::cmp::Ordering {
    let an = a.name.to_lowercase();
    let bn = b.name.to_lowercase();
    match an.cmp(&bn) {
        std::cmp::Ordering::Equal => a.id.cmp(&b.id),
        o => o,
    }
}

impl HabitCache {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            habits: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn invalidate(&mut self) {
        self.habits = None;
    }

    pub fn refresh(&mut self, api: &ApiClient) -> Result<(), AppError> {
        let mut habits = api.list_habits(&self.user_id)?;
        habits.sort_by(stable_habit_sort);
        self.habits = Some(habits);
        Ok(())
    }

    fn habits(&self) -> &[Habit] {
        self.habits.as_deref().unwrap_or(&[])
    }

    /// Dashboard view: archived habits are excluded unless asked for.
    pub fn list(&self, include_archived: bool) -> Vec<&Habit> {
        self.habits()
            .iter()
            .filter(|h| include_archived || !h.is_archived)
            .collect()
    }

    /// Resolves a selector: exact habit id, or a unique case-insensitive
    /// name prefix. Ambiguity lists the candidates.
    pub fn select(&self, selector: &str, include_archived: bool) -> Result<&Habit, AppError> {
        let s = selector.trim();
        if s.is_empty() {
            return Err(AppError::usage("Habit selector is required"));
        }

        if let Some(h) = self.habits().iter().find(|h| h.id == s) {
            if !include_archived && h.is_archived {
                return Err(AppError::not_found(format!("Habit not found: {}", selector)));
            }
            return Ok(h);
        }

        let prefix = s.to_lowercase();
        let mut matches: Vec<&Habit> = self
            .habits()
            .iter()
            .filter(|h| include_archived || !h.is_archived)
            .filter(|h| h.name.to_lowercase().starts_with(&prefix))
            .collect();
        matches.sort_by(|a, b| stable_habit_sort(a, b));

        match matches.len() {
            0 => Err(AppError::not_found(format!("Habit not found: {}", selector))),
            1 => Ok(matches[0]),
            _ => {
                let candidates = matches
                    .iter()
                    .map(|h| format!("{} {}", h.id, h.name))
                    .collect::<Vec<String>>()
                    .join(", ");
                Err(AppError::ambiguous(format!(
                    "Ambiguous selector '{}'. Candidates: {}",
                    selector, candidates
                )))
            }
        }
    }

    /// Applies a server-confirmed mutation to the cached copy. Only called
    /// after the API call succeeded, so a failed mutation never touches
    /// local state.
    pub fn apply_saved(&mut self, habit: Habit) {
        if let Some(habits) = self.habits.as_mut() {
            match habits.iter_mut().find(|h| h.id == habit.id) {
                Some(existing) => *existing = habit,
                None => habits.push(habit),
            }
            habits.sort_by(stable_habit_sort);
        }
    }

    pub fn apply_deleted(&mut self, id: &str) {
        if let Some(habits) = self.habits.as_mut() {
            habits.retain(|h| h.id != id);
        }
    }
}
