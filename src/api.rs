use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::model::{Habit, HabitCreate, HabitUnit, HabitUpdate};
use crate::schedule::schedule_from_wire;

/// Habit record as the storage collaborator returns it. Dates are strings
/// and the schedule is left raw so legacy shapes can be migrated.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct HabitPayload {
    id: String,
    user_id: String,
    name: String,
    unit: HabitUnit,
    target_value: f64,
    schedule: serde_json::Value,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    color: Option<String>,
    is_active: bool,
    is_archived: bool,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    creation_date: String,
}

#[derive(Debug, serde::Deserialize)]
struct HabitListResponse {
    items: Vec<HabitPayload>,
}

fn parse_creation_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Some backends emit a bare date here.
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(ts) = d.and_hms_opt(0, 0, 0) {
            return Ok(ts.and_utc());
        }
    }
    Err(AppError::io(format!("Bad creationDate in payload: {}", raw)))
}

fn map_habit_from_api(payload: HabitPayload) -> Result<Habit, AppError> {
    let schedule = schedule_from_wire(&payload.schedule)?;
    let end_date = match payload.end_date.as_deref() {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::io(format!("Bad endDate in payload: {}", raw)))?,
        ),
        None => None,
    };

    Ok(Habit {
        id: payload.id,
        user_id: payload.user_id,
        name: payload.name,
        creation_date: parse_creation_date(&payload.creation_date)?,
        end_date,
        is_active: payload.is_active,
        is_archived: payload.is_archived,
        unit: payload.unit,
        target_value: payload.target_value,
        schedule,
        notes: payload.notes,
        color: payload.color,
        tags: payload.tags,
    })
}

/// Non-2xx bodies carry a `detail` field: a string, or a list of objects
/// with `msg`. Everything is concatenated into one message.
pub fn error_detail(response: reqwest::blocking::Response) -> String {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();

    let body: serde_json::Value = match response.json() {
        Ok(v) => v,
        Err(_) => return fallback,
    };

    match body.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => {
            let msgs: Vec<String> = items
                .iter()
                .map(|d| match d.get("msg").and_then(|m| m.as_str()) {
                    Some(m) => m.to_string(),
                    None => d.to_string(),
                })
                .collect();
            msgs.join("; ")
        }
        _ => fallback,
    }
}

/// Typed client for the storage collaborator. One outbound call per
/// operation; a failed call changes nothing locally.
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    access_token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, AppError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn check(&self, response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = error_detail(response);
        warn!(status = status.as_u16(), message = %message, "storage request failed");
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// GET /habits?userId=<id>
    pub fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>, AppError> {
        let url = format!("{}/habits", self.base_url);
        debug!(url = %url, user_id = %user_id, "listing habits");

        let response = self
            .http
            .get(&url)
            .query(&[("userId", user_id)])
            .bearer_auth(&self.access_token)
            .send()
            .map_err(transport_error)?;
        let response = self.check(response)?;

        let list: HabitListResponse = response
            .json()
            .map_err(|e| AppError::io(format!("Malformed habit list: {}", e)))?;
        list.items.into_iter().map(map_habit_from_api).collect()
    }

    /// POST /habits/
    pub fn create_habit(&self, create: &HabitCreate) -> Result<Habit, AppError> {
        let url = format!("{}/habits/", self.base_url);
        debug!(url = %url, name = %create.name, "creating habit");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(create)
            .send()
            .map_err(transport_error)?;
        let response = self.check(response)?;

        let payload: HabitPayload = response
            .json()
            .map_err(|e| AppError::io(format!("Malformed habit payload: {}", e)))?;
        map_habit_from_api(payload)
    }

    /// PATCH /habits/{id} with only the changed fields.
    pub fn update_habit(&self, id: &str, update: &HabitUpdate) -> Result<Habit, AppError> {
        let url = format!("{}/habits/{}", self.base_url, id);
        debug!(url = %url, "updating habit");

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.access_token)
            .json(update)
            .send()
            .map_err(transport_error)?;
        let response = self.check(response)?;

        let payload: HabitPayload = response
            .json()
            .map_err(|e| AppError::io(format!("Malformed habit payload: {}", e)))?;
        map_habit_from_api(payload)
    }

    /// DELETE /habits/{id}; a 204 carries no body.
    pub fn delete_habit(&self, id: &str) -> Result<(), AppError> {
        let url = format!("{}/habits/{}", self.base_url, id);
        debug!(url = %url, "deleting habit");

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(transport_error)?;
        self.check(response)?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Network(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_value() -> serde_json::Value {
        json!({
            "id": "h1",
            "userId": "u1",
            "name": "Run",
            "unit": { "unitKey": "miles", "isCustom": false },
            "targetValue": 3.5,
            "schedule": { "type": "rolling", "intervalType": "day", "intervalQuantity": 2, "resetOnMiss": false },
            "isActive": true,
            "isArchived": false,
            "endDate": "2026-12-31",
            "creationDate": "2026-01-05T10:00:00Z",
            "updatedAt": "2026-01-05T10:00:00Z"
        })
    }

    #[test]
    fn payload_maps_to_habit() {
        let payload: HabitPayload = serde_json::from_value(payload_value()).unwrap();
        let habit = map_habit_from_api(payload).unwrap();
        assert_eq!(habit.id, "h1");
        assert_eq!(habit.target_value, 3.5);
        assert_eq!(
            habit.end_date,
            Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())
        );
        assert_eq!(habit.creation_date.to_rfc3339(), "2026-01-05T10:00:00+00:00");
    }

    #[test]
    fn bare_date_creation_date_is_accepted() {
        let mut v = payload_value();
        v["creationDate"] = json!("2026-01-05");
        let payload: HabitPayload = serde_json::from_value(v).unwrap();
        let habit = map_habit_from_api(payload).unwrap();
        assert_eq!(habit.creation_date.to_rfc3339(), "2026-01-05T00:00:00+00:00");
    }

    #[test]
    fn bad_end_date_is_an_error_not_a_panic() {
        let mut v = payload_value();
        v["endDate"] = json!("soon");
        let payload: HabitPayload = serde_json::from_value(v).unwrap();
        assert!(map_habit_from_api(payload).is_err());
    }
}
