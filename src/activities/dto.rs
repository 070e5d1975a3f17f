use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

use crate::error::ApiError;

use super::repo::Activity;

const DATE_FMT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), DATE_FMT).ok()
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FMT).unwrap_or_else(|_| date.to_string())
}

/// Normalizes the optional category filter: absent, empty, and the "All"
/// sentinel all mean "no filter".
pub fn category_filter(raw: Option<String>) -> Option<String> {
    raw.filter(|c| !c.is_empty() && c != "All")
}

/// Request body for logging an activity. `minutes` stays a raw JSON value so
/// that a numeric string from a form-driven client still parses and anything
/// else reports `InvalidInput("minutes")` instead of a body rejection.
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub minutes: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Validated insert payload. Owner is supplied separately from the verified
/// token, never from the request body.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub title: String,
    pub category: String,
    pub minutes: i64,
    pub date: Date,
}

impl CreateActivityRequest {
    pub fn validate(self) -> Result<NewActivity, ApiError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::InvalidInput("title"))?;
        let category = self
            .category
            .filter(|c| !c.is_empty())
            .ok_or(ApiError::InvalidInput("category"))?;
        let minutes = self
            .minutes
            .as_ref()
            .and_then(parse_minutes)
            .filter(|m| *m > 0)
            .ok_or(ApiError::InvalidInput("minutes"))?;
        let date = self
            .date
            .as_deref()
            .and_then(parse_date)
            .ok_or(ApiError::InvalidInput("date"))?;
        Ok(NewActivity {
            title,
            category,
            minutes,
            date,
        })
    }
}

fn parse_minutes(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Query parameters for `GET /logs`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ActivityFilter {
    pub category: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

impl ListQuery {
    pub fn validate(self) -> Result<ActivityFilter, ApiError> {
        let start_date = match self.start_date.as_deref() {
            None | Some("") => None,
            Some(s) => Some(parse_date(s).ok_or(ApiError::InvalidInput("startDate"))?),
        };
        let end_date = match self.end_date.as_deref() {
            None | Some("") => None,
            Some(s) => Some(parse_date(s).ok_or(ApiError::InvalidInput("endDate"))?),
        };
        Ok(ActivityFilter {
            category: category_filter(self.category),
            start_date,
            end_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub minutes: i64,
    pub date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Activity> for ActivityResponse {
    fn from(a: Activity) -> Self {
        Self {
            id: a.id,
            title: a.title,
            category: a.category,
            minutes: a.minutes,
            date: format_date(a.date),
            created_at: a.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    fn req(title: &str, category: &str, minutes: Value, date: &str) -> CreateActivityRequest {
        CreateActivityRequest {
            title: Some(title.to_string()),
            category: Some(category.to_string()),
            minutes: Some(minutes),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn accepts_valid_payload_and_trims_title() {
        let new = req("  Deep work  ", "Code", json!(90), "2026-08-24")
            .validate()
            .unwrap();
        assert_eq!(new.title, "Deep work");
        assert_eq!(new.category, "Code");
        assert_eq!(new.minutes, 90);
        assert_eq!(new.date, date!(2026 - 08 - 24));
    }

    #[test]
    fn accepts_minutes_as_numeric_string() {
        let new = req("Read", "Books", json!("45"), "2026-08-24")
            .validate()
            .unwrap();
        assert_eq!(new.minutes, 45);
    }

    #[test]
    fn rejects_blank_title() {
        for t in ["", "   "] {
            let r = CreateActivityRequest {
                title: Some(t.to_string()),
                category: Some("Code".into()),
                minutes: Some(json!(30)),
                date: Some("2026-08-24".into()),
            };
            assert!(matches!(
                r.validate().unwrap_err(),
                ApiError::InvalidInput("title")
            ));
        }
    }

    #[test]
    fn rejects_missing_category() {
        let r = CreateActivityRequest {
            title: Some("Read".into()),
            category: None,
            minutes: Some(json!(30)),
            date: Some("2026-08-24".into()),
        };
        assert!(matches!(
            r.validate().unwrap_err(),
            ApiError::InvalidInput("category")
        ));
    }

    #[test]
    fn rejects_non_positive_or_unparseable_minutes() {
        for m in [json!(0), json!(-5), json!("abc"), json!(2.5), json!(null)] {
            let err = req("Read", "Books", m, "2026-08-24").validate().unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput("minutes")));
        }
    }

    #[test]
    fn rejects_bad_date() {
        for d in ["", "24-08-2026", "2026-13-01", "yesterday"] {
            let err = req("Read", "Books", json!(30), d).validate().unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput("date")));
        }
    }

    #[test]
    fn list_query_parses_bounds_and_normalizes_category() {
        let filter = ListQuery {
            category: Some("All".into()),
            start_date: Some("2026-08-24".into()),
            end_date: Some("2026-08-30".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.start_date, Some(date!(2026 - 08 - 24)));
        assert_eq!(filter.end_date, Some(date!(2026 - 08 - 30)));

        let filter = ListQuery {
            category: Some("Code".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(filter.category.as_deref(), Some("Code"));
    }

    #[test]
    fn list_query_rejects_bad_bounds() {
        let err = ListQuery {
            start_date: Some("08/24/2026".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput("startDate")));

        let err = ListQuery {
            end_date: Some("not-a-date".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput("endDate")));
    }

    #[test]
    fn date_roundtrip_is_iso() {
        let d = date!(2026 - 01 - 05);
        assert_eq!(format_date(d), "2026-01-05");
        assert_eq!(parse_date("2026-01-05"), Some(d));
    }
}
