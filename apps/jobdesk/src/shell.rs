//! Interactive mode. Panels live for the whole session, so pagination,
//! expand toggles and sign-in changes carry over from one line to the next.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::task::JoinHandle;

use crate::cli::SearchArgs;
use crate::models::job::{ApplicationStatus, JobId};
use crate::models::resume::ResumeFile;
use crate::panels::job_search::{JobSearchPanel, SearchConfig};
use crate::panels::profile::ProfilePanel;
use crate::panels::resume_tuner::ResumeTuner;
use crate::panels::saved_jobs::SavedJobsList;
use crate::render;
use crate::session::{AuthEvent, Session};
use crate::state::AppState;

const PROMPT: &str = "jobdesk> ";

#[derive(Debug, Parser)]
#[command(name = "jobdesk>", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Sign in as a user id
    Login { user_id: String, email: Option<String> },
    Logout,
    /// Show the current saved jobs page (refetches it)
    Saved,
    /// Jump to a saved jobs page
    Page { n: u32 },
    Next,
    Prev,
    /// Toggle the full description of a saved job
    Expand { job_id: JobId },
    Status {
        job_id: JobId,
        status: ApplicationStatus,
    },
    Search(SearchArgs),
    /// Show the last scrape's results
    Results,
    /// Toggle the full description of a scraped job (1-based)
    ExpandResult { n: usize },
    /// Pick the master resume
    Resume { file: PathBuf },
    /// Saved jobs offered for tuning
    Picker,
    /// Target a saved job for tuning
    Target { job_id: JobId },
    /// Target a pasted description for tuning
    Jd {
        text: String,
        #[arg(long)]
        url: Option<String>,
    },
    Llm {
        #[arg(value_parser = ["on", "off"])]
        mode: String,
    },
    Tune,
    Profile,
}

pub struct Shell {
    state: AppState,
    saved: Arc<SavedJobsList>,
    search: JobSearchPanel,
    tuner: ResumeTuner,
    profile: ProfilePanel,
    watcher: JoinHandle<()>,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        let saved = state.saved_jobs();
        let watcher = saved.watch_session(state.session.subscribe());
        Self {
            search: state.job_search(saved.clone()),
            tuner: state.resume_tuner(),
            profile: state.profile(),
            saved,
            watcher,
            state,
        }
    }

    pub async fn run(self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        if let Some(session) = self.state.session.current() {
            println!("Signed in as {} (ID {}…)", session.email, session.short_id());
            if let Err(e) = self.saved.refresh(1).await {
                eprintln!("❌ {}", e.user_message());
            }
        }

        loop {
            stdout.write_all(PROMPT.as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                break;
            }

            let words = match shell_words::split(trimmed) {
                Ok(words) => words,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };
            match ShellLine::try_parse_from(words) {
                Ok(parsed) => {
                    if let Err(e) = self.execute(parsed.command).await {
                        eprintln!("❌ {e}");
                    }
                    self.acknowledge();
                }
                Err(e) => eprintln!("{e}"),
            }
        }

        self.watcher.abort();
        Ok(())
    }

    fn acknowledge(&self) {
        self.saved.acknowledge();
        self.search.acknowledge();
        self.tuner.acknowledge();
        self.profile.acknowledge();
    }

    fn print_saved(&self) {
        println!(
            "{}",
            render::render_saved_jobs(&self.saved.snapshot(), self.saved.is_signed_in())
        );
    }

    async fn execute(&self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Login { user_id, email } => {
                let session = Session {
                    user_id,
                    email: email.unwrap_or_default(),
                };
                self.state.session.handle_event(AuthEvent::SignedIn(session));
            }
            ShellCommand::Logout => {
                self.state.session.sign_out().await?;
                println!("Signed out.");
            }
            ShellCommand::Saved => {
                if self.saved.is_signed_in() {
                    let page = self.saved.snapshot().pagination.page;
                    self.saved.refresh(page).await?;
                }
                self.print_saved();
            }
            ShellCommand::Page { n } => {
                if !self.saved.go_to_page(n).await? {
                    println!("No page {n}.");
                }
                self.print_saved();
            }
            ShellCommand::Next => {
                self.saved.next_page().await?;
                self.print_saved();
            }
            ShellCommand::Prev => {
                self.saved.previous_page().await?;
                self.print_saved();
            }
            ShellCommand::Expand { job_id } => {
                self.saved.toggle_expanded(&job_id);
                self.print_saved();
            }
            ShellCommand::Status { job_id, status } => {
                self.saved.change_status(&job_id, status).await?;
                println!("Job {job_id} marked as {}", status.label());
            }
            ShellCommand::Search(args) => {
                let config = SearchConfig {
                    username: args.username,
                    password: args.password,
                    num_jobs: args.num_jobs,
                    search_title: args.title,
                    location: args.location,
                };
                println!("🔄 Scraping LinkedIn…");
                let summary = self.search.search(&config).await?;
                if args.full {
                    self.search.expand_all();
                }
                println!("{}\n", render::render_scrape_summary(&summary));
                println!("{}", render::render_scraped_jobs(&self.search.snapshot()));
            }
            ShellCommand::Results => {
                println!("{}", render::render_scraped_jobs(&self.search.snapshot()));
            }
            ShellCommand::ExpandResult { n } => {
                self.search.toggle_expanded(n.saturating_sub(1));
                println!("{}", render::render_scraped_jobs(&self.search.snapshot()));
            }
            ShellCommand::Resume { file } => {
                self.tuner.select_file(ResumeFile::load(&file).await?)?;
                println!("Resume: {}", file.display());
            }
            ShellCommand::Picker => {
                let count = self.tuner.load_jobs().await?;
                println!("{count} jobs");
                for job in self.tuner.snapshot().jobs {
                    println!(
                        "  [{}] {} — {}",
                        job.id,
                        job.job_name,
                        job.company.as_deref().unwrap_or("—")
                    );
                }
            }
            ShellCommand::Target { job_id } => self.tuner.select_job(job_id),
            ShellCommand::Jd { text, url } => self.tuner.enter_description(&text, url),
            ShellCommand::Llm { mode } => self.tuner.set_use_llm(mode == "on"),
            ShellCommand::Tune => {
                println!("Tuning…");
                let outcome = self.tuner.submit().await?;
                println!("{}", render::render_tune_outcome(&outcome));
            }
            ShellCommand::Profile => {
                let profile = self.profile.load().await?;
                println!("{}", render::render_profile(&profile));
            }
        }
        Ok(())
    }
}
