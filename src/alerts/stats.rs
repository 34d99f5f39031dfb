use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{queries, DbPool};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Day,
    Week,
    Month,
}

impl GroupBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// Postgres `to_char` format for the bucket key. Weeks use ISO numbering.
    pub fn bucket_format(&self) -> &'static str {
        match self {
            Self::Day => "YYYY-MM-DD",
            Self::Week => "IYYY-IW",
            Self::Month => "YYYY-MM",
        }
    }
}

/// Raw query parameters as they arrive on `GET /api/alerts/stats`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub group_by: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatsParams {
    pub group_by: Option<GroupBy>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl StatsParams {
    pub fn from_query(query: StatsQuery) -> AppResult<Self> {
        let group_by = match query.group_by.as_deref() {
            None | Some("") => None,
            Some(s) => Some(
                GroupBy::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("Invalid groupBy: {}", s)))?,
            ),
        };
        let start = query
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_date_param(s, false))
            .transpose()?;
        let end = query
            .end_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_date_param(s, true))
            .transpose()?;
        Ok(Self {
            group_by,
            start,
            end,
        })
    }
}

/// Accepts RFC 3339 timestamps or bare dates. Bare end dates are widened to
/// the end of that day so the range stays inclusive on both ends.
fn parse_date_param(s: &str, end_of_day: bool) -> AppResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(naive) = time {
            return Ok(naive.and_utc());
        }
    }
    Err(AppError::Validation(format!("Invalid date: {}", s)))
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatsBucket {
    pub bucket: String,
    pub count: i64,
}

/// Time-bucketed alert counts. Without `groupBy` the filtered total comes
/// back as a single `total` bucket.
pub async fn compute_stats(pool: &DbPool, params: StatsParams) -> AppResult<Vec<StatsBucket>> {
    let buckets = match params.group_by {
        Some(group_by) => {
            sqlx::query_as(queries::COUNT_ALERTS_BY_BUCKET)
                .bind(params.start)
                .bind(params.end)
                .bind(group_by.bucket_format())
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as(queries::COUNT_ALERTS_IN_RANGE)
                .bind(params.start)
                .bind(params.end)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(buckets)
}
