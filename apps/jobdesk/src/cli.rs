use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};

use crate::bot::{command_definitions, CommandHandlers, ConsoleContext, SlashCommand};
use crate::models::job::{ApplicationStatus, JobId};
use crate::models::profile::UserProfile;
use crate::models::resume::ResumeFile;
use crate::panels::job_search::{SearchConfig, DEFAULT_NUM_JOBS, DEFAULT_SEARCH_TITLE};
use crate::render;
use crate::shell::Shell;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "jobdesk", version, about = "Job tracking, resume tuning and bot commands")]
pub struct Cli {
    /// Backend base URL (overrides JOBDESK_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Signed-in user id (overrides JOBDESK_USER_ID)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Email shown for the session (overrides JOBDESK_USER_EMAIL)
    #[arg(long, global = true)]
    pub email: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the backend is up
    Health,
    /// Scrape LinkedIn and refresh the saved jobs list
    Search(SearchArgs),
    /// List saved jobs, 50 per page
    Saved(SavedArgs),
    /// Change the application status of a saved job
    Status {
        job_id: JobId,
        /// not_applied, applied, rejected, interview or offer
        status: ApplicationStatus,
    },
    /// Tailor the master resume to a saved job or a pasted description
    Tune(TuneArgs),
    /// Show or update projects, experiences and skills
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Run a slash command from the terminal
    #[command(subcommand)]
    Bot(BotCommand),
    /// Interactive session that keeps panel state between commands
    Shell,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long, env = "LINKEDIN_USERNAME")]
    pub username: String,
    #[arg(long, env = "LINKEDIN_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// One of 14, 28, 56, 84, 140; the backend caps anything above 140
    #[arg(long, default_value_t = DEFAULT_NUM_JOBS)]
    pub num_jobs: u32,
    #[arg(long, default_value = DEFAULT_SEARCH_TITLE)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub location: String,
    /// Show full descriptions
    #[arg(long)]
    pub full: bool,
}

#[derive(Debug, Args)]
pub struct SavedArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Show full descriptions
    #[arg(long)]
    pub full: bool,
}

#[derive(Debug, Args)]
pub struct TuneArgs {
    /// Master resume (.docx)
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long, conflicts_with = "description", required_unless_present = "description")]
    pub job_id: Option<JobId>,
    /// Job description text, or @path to read it from a file
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, requires = "description")]
    pub job_url: Option<String>,
    /// Let the backend rewrite bullets with its local LLM
    #[arg(long)]
    pub use_llm: bool,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    /// Replace the profile with a JSON file of {projects, experiences, skills}
    Update {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum BotCommand {
    Echo {
        text: String,
    },
    Jobs {
        keywords: String,
        #[arg(long, env = "LINKEDIN_USERNAME")]
        username: String,
        #[arg(long, env = "LINKEDIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        num_jobs: Option<u32>,
    },
    Rag {
        question: String,
    },
    /// Handle a raw interaction: command name plus its options array as JSON
    Interaction {
        name: String,
        options: String,
    },
    /// Print the command registration payload
    Definitions,
}

pub async fn run(command: Commands, state: &AppState) -> Result<()> {
    match command {
        Commands::Health => {
            let health = state.backend.health().await?;
            println!("{} ({})", health.status, state.config.api_url);
        }
        Commands::Search(args) => search(args, state).await?,
        Commands::Saved(args) => saved(args, state).await?,
        Commands::Status { job_id, status } => {
            let list = state.saved_jobs();
            list.change_status(&job_id, status).await?;
            println!("Job {job_id} marked as {}", status.label());
        }
        Commands::Tune(args) => tune(args, state).await?,
        Commands::Profile(cmd) => profile(cmd, state).await?,
        Commands::Bot(cmd) => bot(cmd, state).await?,
        Commands::Shell => Shell::new(state.clone()).run().await?,
    }
    Ok(())
}

async fn search(args: SearchArgs, state: &AppState) -> Result<()> {
    let saved = state.saved_jobs();
    let panel = state.job_search(saved.clone());
    let config = SearchConfig {
        username: args.username,
        password: args.password,
        num_jobs: args.num_jobs,
        search_title: args.title,
        location: args.location,
    };
    let summary = panel.search(&config).await?;
    if args.full {
        panel.expand_all();
    }

    println!("{}\n", render::render_scrape_summary(&summary));
    println!("{}\n", render::render_scraped_jobs(&panel.snapshot()));
    println!("{}", render::render_saved_jobs(&saved.snapshot(), saved.is_signed_in()));
    Ok(())
}

async fn saved(args: SavedArgs, state: &AppState) -> Result<()> {
    let list = state.saved_jobs();
    if list.is_signed_in() {
        list.refresh(args.page).await?;
        if args.full {
            list.expand_all();
        }
    }
    println!("{}", render::render_saved_jobs(&list.snapshot(), list.is_signed_in()));
    Ok(())
}

async fn tune(args: TuneArgs, state: &AppState) -> Result<()> {
    let tuner = state.resume_tuner();
    tuner.select_file(ResumeFile::load(&args.file).await?)?;
    tuner.set_use_llm(args.use_llm);

    match (args.job_id, args.description) {
        (Some(job_id), _) => {
            if let Err(e) = tuner.load_jobs().await {
                warn!("Could not load saved jobs for the picker: {e}");
            }
            tuner.select_job(job_id);
        }
        (None, Some(description)) => {
            let text = match description.strip_prefix('@') {
                Some(path) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Could not read job description from {path}"))?,
                None => description,
            };
            tuner.enter_description(&text, args.job_url);
        }
        (None, None) => {}
    }

    let outcome = tuner.submit().await?;
    println!("{}", render::render_tune_outcome(&outcome));
    Ok(())
}

async fn profile(cmd: ProfileCommand, state: &AppState) -> Result<()> {
    let panel = state.profile();
    match cmd {
        ProfileCommand::Show => {
            let profile = panel.load().await?;
            println!("{}", render::render_profile(&profile));
        }
        ProfileCommand::Update { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Could not read {}", file.display()))?;
            let profile: UserProfile = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid profile JSON file", file.display()))?;
            panel.edit(profile);
            let message = panel.save().await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn bot(cmd: BotCommand, state: &AppState) -> Result<()> {
    let handlers = CommandHandlers::new(state.backend.clone(), state.config.user_id.clone());
    let mut ctx = ConsoleContext::default();
    let command = match cmd {
        BotCommand::Definitions => {
            println!("{}", serde_json::to_string_pretty(&command_definitions())?);
            return Ok(());
        }
        BotCommand::Interaction { name, options } => {
            let options: Value =
                serde_json::from_str(&options).context("Interaction options must be JSON")?;
            return handlers.handle_interaction(&name, &options, &mut ctx).await;
        }
        BotCommand::Echo { text } => SlashCommand::Echo { text },
        BotCommand::Jobs {
            keywords,
            username,
            password,
            num_jobs,
        } => SlashCommand::Jobs {
            keywords,
            linkedin_username: username,
            linkedin_password: password,
            num_jobs,
        },
        BotCommand::Rag { question } => SlashCommand::Rag { question },
    };
    info!("Running /{} from the terminal", command.name());
    handlers.dispatch(command, &mut ctx).await
}
