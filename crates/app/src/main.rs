//! Command-line glue: wires SQLite storage, the services and a clock, and
//! prints results as JSON on stdout.

use std::path::Path;

use clap::{ArgGroup, Args, Parser, Subcommand};
use progress_core::analytics::{AnalyticsSettings, Attempt};
use progress_core::model::{AttemptSource, Difficulty, ExamType, LearnerId, ProgressKey};
use serde::Serialize;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "progress", version, about = "Learner progress analytics")]
struct Cli {
    /// SQLite database URL or file path
    #[arg(
        long,
        global = true,
        env = "PROGRESS_DB_URL",
        default_value = "sqlite://progress.sqlite3"
    )]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record one answered question
    Record(RecordArgs),

    /// Overall statistics for a learner
    Report {
        #[arg(long)]
        learner: LearnerId,

        /// Restrict to one exam type
        #[arg(long)]
        exam: Option<ExamType>,
    },

    /// Topics to study next
    Recommend {
        #[arg(long)]
        learner: LearnerId,

        /// Maximum number of topics
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Weak and strong subtopics of one topic
    WeakAreas {
        #[arg(long)]
        learner: LearnerId,

        #[arg(long)]
        topic: String,

        #[arg(long)]
        exam: ExamType,

        #[arg(long, default_value = "60")]
        weak_threshold: f64,

        #[arg(long, default_value = "80")]
        strong_threshold: f64,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("outcome").required(true).args(["correct", "incorrect"])))]
struct RecordArgs {
    #[arg(long)]
    learner: LearnerId,

    #[arg(long)]
    topic: String,

    #[arg(long)]
    exam: ExamType,

    /// The answer was correct
    #[arg(long)]
    correct: bool,

    /// The answer was wrong
    #[arg(long)]
    incorrect: bool,

    /// Seconds spent on the question
    #[arg(long)]
    time: u64,

    #[arg(long)]
    subtopic: Option<String>,

    #[arg(long)]
    difficulty: Option<Difficulty>,

    #[arg(long)]
    source: Option<AttemptSource>,
}

impl RecordArgs {
    fn into_parts(self) -> (ProgressKey, Attempt) {
        let key = ProgressKey::new(self.learner, self.topic, self.exam);
        let mut attempt = Attempt::new(self.correct, self.time);
        attempt.subtopic = self.subtopic;
        attempt.difficulty = self.difficulty;
        attempt.source = self.source;
        (key, attempt)
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file exists; sqlx will not create it.
fn prepare_sqlite_file(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = Path::new(path.split('?').next().unwrap_or(path));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &cli.command {
        Command::WeakAreas {
            weak_threshold,
            strong_threshold,
            ..
        } => AnalyticsSettings::default()
            .with_thresholds(*weak_threshold, *strong_threshold)?,
        _ => AnalyticsSettings::default(),
    };

    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default_clock(), settings).await?;

    match cli.command {
        Command::Record(args) => {
            let (key, attempt) = args.into_parts();
            let recorded = app.progress().record_attempt(key, &attempt).await?;
            print_json(&recorded.progress)
        }
        Command::Report { learner, exam } => {
            print_json(&app.insights().summary(learner, exam).await?)
        }
        Command::Recommend { learner, limit } => {
            print_json(&app.insights().recommendations(learner, limit).await?)
        }
        Command::WeakAreas {
            learner,
            topic,
            exam,
            ..
        } => {
            let key = ProgressKey::new(learner, topic, exam);
            print_json(&app.insights().topic_insights(&key).await?)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("{err}");
        std::process::exit(2);
    }
}
