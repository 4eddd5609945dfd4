use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Saved-job identifier. The backend hands out numeric ids today but the
/// client treats them as opaque, so string ids round-trip as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Int(i64),
    Text(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobId::Int(id) => write!(f, "{id}"),
            JobId::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for JobId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(JobId::Int)
            .unwrap_or_else(|_| JobId::Text(s.to_string())))
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        JobId::Int(id)
    }
}

/// Where an application stands. Closed set; anything else on the wire reads
/// as `NotApplied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    NotApplied,
    Applied,
    Rejected,
    Interview,
    Offer,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::NotApplied,
        ApplicationStatus::Applied,
        ApplicationStatus::Rejected,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::NotApplied => "not_applied",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::NotApplied => "Not Applied",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Offer => "Offer",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Invalid status '{0}'. Must be one of: not_applied, applied, rejected, interview, offer")]
pub struct ParseStatusError(String);

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

fn lenient_status<'de, D>(deserializer: D) -> Result<ApplicationStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

/// A posting returned by a scrape. Lives only in the search panel's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedJob {
    #[serde(default)]
    pub name: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub location_type: Option<String>,
    pub posting_date: Option<String>,
    pub description: Option<String>,
    pub application_link: Option<String>,
}

/// A job persisted server-side for the signed-in user.
///
/// Fields the client does not model are kept in `extra` and serialize back
/// unchanged. Modelled optional columns that are null or absent are both
/// omitted on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: JobId,
    #[serde(default)]
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub application_status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedJob {
    /// Calendar date of `created_at`, accepting RFC 3339 and the naive
    /// timestamps some database drivers emit.
    pub fn created_date(&self) -> Option<NaiveDate> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// Position within the user's saved jobs, as reported by the last page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    pub fn empty_at(page: u32) -> Self {
        Pagination {
            page,
            ..Pagination::default()
        }
        .clamped()
    }

    /// Highest page a caller may navigate to.
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    /// Restores `1 <= page <= max(total_pages, 1)`.
    pub fn clamped(self) -> Self {
        Pagination {
            page: self.page.clamp(1, self.last_page()),
            ..self
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.last_page()).contains(&page)
    }
}

#[derive(Clone, PartialEq, Serialize)]
pub struct ScrapeRequest {
    pub linkedin_username: String,
    pub linkedin_password: String,
    pub num_jobs: u32,
    #[serde(rename = "searchTitle", skip_serializing_if = "Option::is_none")]
    pub search_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl fmt::Debug for ScrapeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeRequest")
            .field("linkedin_username", &self.linkedin_username)
            .field("linkedin_password", &"<redacted>")
            .field("num_jobs", &self.num_jobs)
            .field("search_title", &self.search_title)
            .field("location", &self.location)
            .field("user_id", &self.user_id)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    #[serde(default)]
    pub saved: u32,
    #[serde(default)]
    pub duplicates: u32,
    #[serde(default)]
    pub errors: u32,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub jobs: Vec<ScrapedJob>,
    pub total_jobs: Option<u32>,
    pub database: Option<DatabaseSummary>,
    pub message: Option<String>,
}

impl ScrapeResponse {
    pub fn total(&self) -> u32 {
        self.total_jobs.unwrap_or(self.jobs.len() as u32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserJobsPage {
    #[serde(default)]
    pub jobs: Vec<SavedJob>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateRequest<'a> {
    pub job_id: &'a JobId,
    pub status: ApplicationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parses_labels_and_snake_case() {
        assert_eq!(
            "not_applied".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::NotApplied
        );
        assert_eq!(
            "Not Applied".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::NotApplied
        );
        assert_eq!(
            "INTERVIEW".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Interview
        );
        assert!("hired".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_missing_or_unknown_status_defaults_to_not_applied() {
        let missing: SavedJob = serde_json::from_value(json!({"id": 1, "job_name": "A"})).unwrap();
        let null: SavedJob =
            serde_json::from_value(json!({"id": 2, "application_status": null})).unwrap();
        let unknown: SavedJob =
            serde_json::from_value(json!({"id": 3, "application_status": "ghosted"})).unwrap();
        assert_eq!(missing.application_status, ApplicationStatus::NotApplied);
        assert_eq!(null.application_status, ApplicationStatus::NotApplied);
        assert_eq!(unknown.application_status, ApplicationStatus::NotApplied);
    }

    #[test]
    fn test_saved_job_keeps_unmodelled_fields() {
        let raw = json!({
            "id": 42,
            "job_name": "Backend Intern",
            "company": "Acme",
            "application_status": "applied",
            "user_id": "u1",
            "status_updated_at": "2024-05-01T10:00:00+00:00"
        });
        let job: SavedJob = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(job.id, JobId::Int(42));
        assert_eq!(job.extra.get("user_id"), Some(&json!("u1")));
        assert_eq!(serde_json::to_value(&job).unwrap(), raw);
    }

    #[test]
    fn test_null_columns_are_omitted_on_reserialize() {
        let raw = json!({
            "id": 7,
            "job_name": "Data Intern",
            "company": null,
            "application_status": "offer",
            "notes": null
        });
        let job: SavedJob = serde_json::from_value(raw).unwrap();
        assert_eq!(
            serde_json::to_value(&job).unwrap(),
            json!({
                "id": 7,
                "job_name": "Data Intern",
                "application_status": "offer",
                "notes": null
            })
        );
    }

    #[test]
    fn test_job_id_accepts_numbers_and_strings() {
        assert_eq!("42".parse::<JobId>().unwrap(), JobId::Int(42));
        assert_eq!(
            "a1b2".parse::<JobId>().unwrap(),
            JobId::Text("a1b2".to_string())
        );
        let text: JobId = serde_json::from_value(json!("9f0c")).unwrap();
        assert_eq!(text.to_string(), "9f0c");
    }

    #[test]
    fn test_created_date_handles_supabase_and_naive_timestamps() {
        let mut job: SavedJob = serde_json::from_value(json!({"id": 1})).unwrap();
        job.created_at = Some("2024-03-05T22:10:01.123456+00:00".to_string());
        assert_eq!(job.created_date(), NaiveDate::from_ymd_opt(2024, 3, 5));
        job.created_at = Some("2024-03-06T08:00:00".to_string());
        assert_eq!(job.created_date(), NaiveDate::from_ymd_opt(2024, 3, 6));
        job.created_at = Some("yesterday".to_string());
        assert_eq!(job.created_date(), None);
    }

    #[test]
    fn test_pagination_clamps_into_valid_range() {
        let p = Pagination {
            page: 9,
            total: 120,
            total_pages: 3,
        };
        assert_eq!(p.clamped().page, 3);
        assert_eq!(Pagination::empty_at(0).page, 1);
        assert_eq!(Pagination::empty_at(4).page, 1);
        assert!(p.contains(1) && p.contains(3));
        assert!(!p.contains(0) && !p.contains(4));
    }

    #[test]
    fn test_scrape_request_wire_names_and_redaction() {
        let req = ScrapeRequest {
            linkedin_username: "me@example.com".to_string(),
            linkedin_password: "hunter2".to_string(),
            num_jobs: 56,
            search_title: Some("intern".to_string()),
            location: None,
            user_id: Some("u1".to_string()),
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["searchTitle"], "intern");
        assert!(body.get("location").is_none());
        assert!(!format!("{req:?}").contains("hunter2"));
    }
}
