use crate::domain;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize, Debug))]
pub struct NewTask {
    #[validate(length(min = 1))]
    #[schema(example = "Pay rent")]
    pub title: String,
    #[schema(example = "Transfer before the 1st")]
    pub description: Option<String>,
    /// RFC 3339 timestamp. A timestamp without an offset is read as UTC.
    #[serde(deserialize_with = "deserialize_due_date")]
    #[schema(example = "2025-03-01T00:00:00Z")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            is_completed: value.is_completed,
        }
    }
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct Task {
    pub id: Uuid,
    #[schema(example = "Pay rent")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2025-03-01T00:00:00Z")]
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    /// Year of the due date. Can be null for tasks created before years were tracked.
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

impl From<domain::task::Task> for Task {
    fn from(value: domain::task::Task) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            is_completed: value.is_completed,
            year: value.year,
        }
    }
}

/// DTO for partially updating a task. Fields left out of the body are not touched.
/// Sending `"description": null` clears the description.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct TaskPatch {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// RFC 3339 timestamp. A timestamp without an offset is read as UTC.
    #[serde(default, deserialize_with = "deserialize_optional_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
}

impl From<TaskPatch> for domain::task::TaskPatch {
    fn from(value: TaskPatch) -> Self {
        domain::task::TaskPatch {
            title: value.title,
            description: value.description,
            due_date: value.due_date,
            is_completed: value.is_completed,
        }
    }
}

/// Marks a field as present whenever its key shows up in the body, even with a null value
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Formats accepted for due dates that carry no offset, such as the values produced by an
/// HTML `datetime-local` input
const NAIVE_DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }

    NAIVE_DUE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn parse_due_date_or_fail<E: serde::de::Error>(raw: &str) -> Result<DateTime<Utc>, E> {
    parse_due_date(raw).ok_or_else(|| {
        E::custom(format!("invalid due_date \"{raw}\", expected an ISO 8601 timestamp"))
    })
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date_or_fail(&raw)
}

/// Same as [deserialize_due_date], with `null` read as absent
fn deserialize_optional_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_due_date_or_fail(&raw))
        .transpose()
}
