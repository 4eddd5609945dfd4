//! `/jobs keywords linkedin_username linkedin_password [num_jobs]` — runs a
//! scrape and lists the first few results. Deferred, ephemeral.

use anyhow::Result;
use tracing::warn;

use super::{error_reply, fit_to_budget, CommandContext};
use crate::backend_client::JobsBackend;
use crate::models::job::{ScrapeRequest, ScrapeResponse};

pub const DEFAULT_NUM_JOBS: u32 = 56;
/// Jobs listed in the reply; the rest are summarized in one line.
const JOBS_SHOWN: usize = 5;
const NO_JOBS_MESSAGE: &str = "No jobs found for your search.";

pub struct JobsArgs {
    pub keywords: String,
    pub linkedin_username: String,
    pub linkedin_password: String,
    pub num_jobs: u32,
}

pub async fn handle(
    backend: &dyn JobsBackend,
    args: JobsArgs,
    bot_user_id: Option<&str>,
    ctx: &mut dyn CommandContext,
) -> Result<()> {
    ctx.defer(true).await?;

    let request = ScrapeRequest {
        linkedin_username: args.linkedin_username,
        linkedin_password: args.linkedin_password,
        num_jobs: args.num_jobs,
        search_title: Some(args.keywords.clone()),
        location: None,
        user_id: bot_user_id.map(str::to_string),
    };

    let reply = match backend.scrape_jobs(&request).await {
        Ok(response) if !response.jobs.is_empty() => format_jobs(&args.keywords, &response),
        Ok(_) => format!("❌ {NO_JOBS_MESSAGE}"),
        Err(e) => {
            warn!("/jobs failed: {e}");
            error_reply(&e)
        }
    };
    ctx.edit_reply(&fit_to_budget(reply)).await
}

fn format_jobs(keywords: &str, response: &ScrapeResponse) -> String {
    let total = response.total();
    let mut reply = format!("🎯 **Found {total} jobs for \"{keywords}\":**\n\n");

    for (idx, job) in response.jobs.iter().take(JOBS_SHOWN).enumerate() {
        reply.push_str(&format!("**{}.** {}\n", idx + 1, job.name));
        reply.push_str(&format!(
            "🏢 **Company:** {}\n",
            job.company.as_deref().unwrap_or("N/A")
        ));
        reply.push_str(&format!(
            "📍 **Location:** {}\n",
            job.location.as_deref().unwrap_or("N/A")
        ));
        reply.push_str(&format!(
            "💼 **Type:** {}\n",
            job.job_type.as_deref().unwrap_or("N/A")
        ));
        if let Some(link) = &job.application_link {
            reply.push_str(&format!("🔗 **Apply:** {link}\n"));
        }
        reply.push('\n');
    }

    if total as usize > JOBS_SHOWN {
        reply.push_str(&format!(
            "\n_... and {} more jobs!_",
            total as usize - JOBS_SHOWN
        ));
    }
    reply
}
