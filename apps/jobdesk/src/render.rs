//! Plain-text rendering of panel state for the terminal.

use crate::models::job::{Pagination, SavedJob, ScrapedJob};
use crate::models::profile::{entry_title, UserProfile};
use crate::panels::job_search::{JobSearchState, ScrapeSummary};
use crate::panels::resume_tuner::TuneOutcome;
use crate::panels::saved_jobs::SavedJobsState;
use crate::panels::{PanelState, SAVED_JOBS_PAGE_SIZE};

pub const DESCRIPTION_PREVIEW_CHARS: usize = 260;

pub const SIGNED_OUT_PLACEHOLDER: &str = "Please log in to view your saved jobs.";
pub const NO_SAVED_JOBS_PLACEHOLDER: &str = "No saved jobs yet. Search to populate your list.";
pub const NO_SCRAPED_JOBS_PLACEHOLDER: &str =
    "No jobs scraped yet. Configure a search and run `jobdesk search`.";

/// Cuts `text` to `max` characters plus `…`. Shorter text is returned as is.
pub fn truncate_description(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", text[..idx].trim_end()),
        None => text.to_string(),
    }
}

fn description_lines(description: Option<&str>, expanded: bool, lines: &mut Vec<String>) {
    let desc = description.map(str::trim).unwrap_or_default();
    if desc.is_empty() {
        return;
    }
    if expanded {
        lines.push(format!("    {desc}"));
    } else {
        lines.push(format!(
            "    {}",
            truncate_description(desc, DESCRIPTION_PREVIEW_CHARS)
        ));
    }
}

fn meta_line(parts: &[Option<&str>]) -> Option<String> {
    let parts: Vec<&str> = parts
        .iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| format!("    {}", parts.join(" • ")))
}

fn scraped_job_lines(index: usize, job: &ScrapedJob, expanded: bool, lines: &mut Vec<String>) {
    lines.push(format!("{:>3}. {}", index + 1, job.name));
    lines.push(format!("    {}", job.company.as_deref().unwrap_or("—")));
    if let Some(meta) = meta_line(&[
        job.location.as_deref(),
        job.job_type.as_deref(),
        job.location_type.as_deref(),
        job.posting_date.as_deref(),
    ]) {
        lines.push(meta);
    }
    description_lines(job.description.as_deref(), expanded, lines);
    if let Some(link) = &job.application_link {
        lines.push(format!("    Apply: {link}"));
    }
}

pub fn render_scraped_jobs(state: &JobSearchState) -> String {
    if state.jobs.is_empty() {
        return NO_SCRAPED_JOBS_PLACEHOLDER.to_string();
    }
    let mut lines = vec![format!("Recently Scraped Jobs ({} found)", state.jobs.len())];
    for (index, job) in state.jobs.iter().enumerate() {
        lines.push(String::new());
        scraped_job_lines(index, job, state.expanded.contains(&index), &mut lines);
    }
    lines.join("\n")
}

pub fn render_scrape_summary(summary: &ScrapeSummary) -> String {
    let mut lines = vec![
        "Scraping completed!".to_string(),
        format!("Found: {} new jobs", summary.total_jobs),
    ];
    if let (Some(saved), Some(duplicates)) = (summary.saved, summary.duplicates) {
        lines.push(format!("Saved to DB: {saved}"));
        lines.push(format!("Duplicates skipped: {duplicates}"));
    }
    lines.join("\n")
}

fn saved_job_lines(job: &SavedJob, expanded: bool, lines: &mut Vec<String>) {
    lines.push(format!(
        "[{}] {}  ({})",
        job.id,
        job.job_name,
        job.application_status.label()
    ));
    lines.push(format!("    {}", job.company.as_deref().unwrap_or("—")));
    let created = job.created_date().map(|date| date.format("%Y-%m-%d").to_string());
    if let Some(meta) = meta_line(&[
        job.location.as_deref(),
        job.job_type.as_deref(),
        job.location_type.as_deref(),
        job.source.as_deref(),
        created.as_deref(),
    ]) {
        lines.push(meta);
    }
    description_lines(job.description.as_deref(), expanded, lines);
    if let Some(link) = &job.application_link {
        lines.push(format!("    Apply: {link}"));
    }
}

pub fn saved_jobs_header(pagination: &Pagination) -> String {
    if pagination.total_pages > 1 {
        format!(
            "{} jobs saved (Page {}/{})",
            pagination.total, pagination.page, pagination.total_pages
        )
    } else {
        format!("{} jobs saved", pagination.total)
    }
}

/// Range line and page indicator, shown only when there is more than one page.
pub fn pagination_footer(pagination: &Pagination) -> Option<String> {
    if pagination.total_pages <= 1 {
        return None;
    }
    // u64 so backend-supplied page numbers cannot overflow
    let page_size = u64::from(SAVED_JOBS_PAGE_SIZE);
    let page = u64::from(pagination.page);
    let first = page.saturating_sub(1) * page_size + 1;
    let last = (page * page_size).min(u64::from(pagination.total));
    Some(format!(
        "Showing {first} to {last} of {} jobs\nPage {} of {}",
        pagination.total, pagination.page, pagination.total_pages
    ))
}

pub fn render_saved_jobs(state: &SavedJobsState, signed_in: bool) -> String {
    if !signed_in {
        return SIGNED_OUT_PLACEHOLDER.to_string();
    }
    if state.jobs.is_empty() {
        return match &state.status {
            PanelState::Error(message) => format!("❌ {message}"),
            _ => NO_SAVED_JOBS_PLACEHOLDER.to_string(),
        };
    }

    let mut lines = vec![saved_jobs_header(&state.pagination)];
    for job in &state.jobs {
        lines.push(String::new());
        saved_job_lines(job, state.expanded.contains(&job.id), &mut lines);
    }
    if let Some(footer) = pagination_footer(&state.pagination) {
        lines.push(String::new());
        lines.push(footer);
    }
    lines.join("\n")
}

pub fn render_tune_outcome(outcome: &TuneOutcome) -> String {
    let mut lines = vec![format!("Changed bullets ({})", outcome.changed.len())];
    if outcome.changed.is_empty() {
        lines.push("  No textual changes.".to_string());
    }
    for bullet in &outcome.changed {
        let relevance = bullet
            .relevance
            .map(|r| r.to_string())
            .unwrap_or_else(|| "?".to_string());
        lines.push(format!("  relevance: {relevance}"));
        lines.push(format!("  - {}", bullet.before));
        lines.push(format!("  + {}", bullet.after));
    }
    lines.push(String::new());
    if outcome.removed_count > 0 {
        lines.push(format!(
            "Removed {} low-relevance bullets.",
            outcome.removed_count
        ));
    } else {
        lines.push("No bullets removed.".to_string());
    }
    if let Some(backend) = &outcome.scoring_backend {
        lines.push(format!("Scoring: {backend}"));
    }
    lines.push(format!("Download tailored .docx: {}", outcome.download_link));
    lines.join("\n")
}

pub fn render_profile(profile: &UserProfile) -> String {
    if profile.is_empty() {
        return "Profile is empty.".to_string();
    }
    let sections = [
        ("Projects", &profile.projects),
        ("Experiences", &profile.experiences),
        ("Skills", &profile.skills),
    ];
    let mut lines = Vec::new();
    for (title, entries) in sections {
        lines.push(format!("{title} ({})", entries.len()));
        lines.extend(entries.iter().map(|entry| format!("  - {}", entry_title(entry))));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{ApplicationStatus, JobId};
    use crate::panels::test_support::saved_job;
    use serde_json::json;

    #[test]
    fn test_truncate_description_at_260_chars() {
        let long = "a".repeat(300);
        let cut = truncate_description(&long, DESCRIPTION_PREVIEW_CHARS);
        assert_eq!(cut.chars().count(), 261);
        assert!(cut.ends_with('…'));

        let exact = "b".repeat(260);
        assert_eq!(truncate_description(&exact, DESCRIPTION_PREVIEW_CHARS), exact);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        assert_eq!(truncate_description(&text, 4), "éééé…");
    }

    #[test]
    fn test_placeholders_distinguish_signed_out_from_empty() {
        let state = SavedJobsState::default();
        assert_eq!(render_saved_jobs(&state, false), SIGNED_OUT_PLACEHOLDER);
        assert_eq!(render_saved_jobs(&state, true), NO_SAVED_JOBS_PLACEHOLDER);
    }

    #[test]
    fn test_second_page_of_three() {
        let state = SavedJobsState {
            jobs: (51..101).map(saved_job).collect(),
            pagination: Pagination {
                page: 2,
                total: 120,
                total_pages: 3,
            },
            ..SavedJobsState::default()
        };
        let out = render_saved_jobs(&state, true);
        assert!(out.starts_with("120 jobs saved (Page 2/3)"));
        assert!(out.contains("Showing 51 to 100 of 120 jobs\nPage 2 of 3"));
        assert_eq!(out.matches("Not Applied").count(), 50);
    }

    #[test]
    fn test_footer_handles_huge_page_numbers() {
        let p = Pagination {
            page: 100_000_000,
            total: 4_000_000_000,
            total_pages: 100_000_000,
        };
        assert_eq!(
            pagination_footer(&p).unwrap(),
            "Showing 4999999951 to 4000000000 of 4000000000 jobs\nPage 100000000 of 100000000"
        );
    }

    #[test]
    fn test_last_page_range_stops_at_total() {
        let p = Pagination {
            page: 3,
            total: 120,
            total_pages: 3,
        };
        assert_eq!(
            pagination_footer(&p).unwrap(),
            "Showing 101 to 120 of 120 jobs\nPage 3 of 3"
        );
        assert_eq!(pagination_footer(&Pagination::default()), None);
        assert_eq!(
            saved_jobs_header(&Pagination {
                page: 1,
                total: 7,
                total_pages: 1
            }),
            "7 jobs saved"
        );
    }

    #[test]
    fn test_expanded_job_shows_full_description() {
        let mut job = saved_job(42);
        job.description = Some("x".repeat(400));
        job.application_status = ApplicationStatus::Interview;
        let mut state = SavedJobsState {
            jobs: vec![job],
            pagination: Pagination {
                page: 1,
                total: 1,
                total_pages: 1,
            },
            ..SavedJobsState::default()
        };

        let collapsed = render_saved_jobs(&state, true);
        assert!(collapsed.contains("(Interview)"));
        assert!(collapsed.contains('…'));
        assert!(collapsed.contains("Toronto, ON • 2024-05-01"));

        state.expanded.insert(JobId::Int(42));
        let expanded = render_saved_jobs(&state, true);
        assert!(expanded.contains(&"x".repeat(400)));
    }

    #[test]
    fn test_scrape_summary_mentions_database_counters() {
        let summary = ScrapeSummary {
            total_jobs: 12,
            saved: Some(9),
            duplicates: Some(3),
        };
        assert_eq!(
            render_scrape_summary(&summary),
            "Scraping completed!\nFound: 12 new jobs\nSaved to DB: 9\nDuplicates skipped: 3"
        );
    }

    #[test]
    fn test_profile_lists_entry_titles() {
        let profile = UserProfile {
            projects: vec![json!({"name": "jobdesk"})],
            experiences: vec![],
            skills: vec![json!("Rust"), json!("SQL")],
        };
        let out = render_profile(&profile);
        assert!(out.contains("Projects (1)\n  - jobdesk"));
        assert!(out.contains("Experiences (0)"));
        assert!(out.contains("Skills (2)\n  - Rust\n  - SQL"));
    }
}
