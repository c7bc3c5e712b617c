//! Lexis CLI
//!
//! Command-line interface for the flashcard scheduler: add cards, submit
//! reviews, list due cards, and inspect memory models.

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use lexis_core::{
    CardStore, Flashcard, MemoryModel, Rating, ReviewOutcome, ReviewScheduler, SchedulerConfig,
};

/// Lexis - spaced-repetition flashcard scheduler
#[derive(Parser)]
#[command(name = "lexis")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Lexis flashcard scheduler")]
#[command(long_about = "Lexis schedules vocabulary flashcards with a Bayesian half-life model.\n\nEach review updates a Beta/exponential memory model and sets the next review at its half-life.")]
struct Cli {
    /// Custom data directory (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new flashcard
    Add {
        /// Owning user
        #[arg(long)]
        user: String,
        /// Word the card drills
        #[arg(long)]
        word: String,
        /// Optional topic
        #[arg(long)]
        topic: Option<String>,
    },

    /// Submit a review for a card
    Review {
        /// Card ID
        id: String,
        /// forgot, hard, or easy (1-3 also accepted)
        #[arg(long)]
        rating: Rating,
        /// Time the learner took to answer, in milliseconds
        #[arg(long, default_value = "0")]
        response_ms: u64,
    },

    /// Show what each rating would do, without saving
    Preview {
        /// Card ID
        id: String,
    },

    /// Show a card and its current recall probability
    Show {
        /// Card ID
        id: String,
    },

    /// List cards due for review
    Due {
        /// Owning user
        #[arg(long)]
        user: String,
        /// Maximum cards to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show the review log of a card
    History {
        /// Card ID
        id: String,
    },

    /// Delete a card and its review log
    Delete {
        /// Card ID
        id: String,
    },

    /// Evaluate a raw [alpha, beta, t] memory model
    Predict {
        #[arg(long)]
        alpha: f64,
        #[arg(long)]
        beta: f64,
        /// Reference time in days
        #[arg(long)]
        t: f64,
        /// Elapsed days to predict recall for
        #[arg(long)]
        elapsed: Option<f64>,
        /// Recall level for the reported interval
        #[arg(long, default_value = "0.5")]
        percentile: f64,
        /// Use the exact expectation instead of the log-mean approximation
        #[arg(long)]
        exact: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    run(Cli::parse())
}

/// Dispatch a parsed command. Only commands that touch cards open the store.
fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = cli.data_dir;
    let store = || open_store(data_dir.clone());

    match cli.command {
        Commands::Add { user, word, topic } => run_add(&store()?, &user, &word, topic.as_deref()),
        Commands::Review {
            id,
            rating,
            response_ms,
        } => run_review(&store()?, &id, rating, response_ms),
        Commands::Preview { id } => run_preview(&store()?, &id),
        Commands::Show { id } => run_show(&store()?, &id),
        Commands::Due { user, limit } => run_due(&store()?, &user, limit),
        Commands::History { id } => run_history(&store()?, &id),
        Commands::Delete { id } => run_delete(&store()?, &id),
        Commands::Predict {
            alpha,
            beta,
            t,
            elapsed,
            percentile,
            exact,
        } => run_predict(alpha, beta, t, elapsed, percentile, exact),
    }
}

/// Open the card store with environment-configured scheduling
fn open_store(data_dir: Option<PathBuf>) -> anyhow::Result<CardStore> {
    let scheduler = ReviewScheduler::new(SchedulerConfig::from_env())?;
    let db_path = match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            Some(dir.join("lexis.db"))
        }
        None => None,
    };
    tracing::debug!(?db_path, "Opening card store");
    Ok(CardStore::with_scheduler(db_path, scheduler)?)
}

fn validate_id(id: &str) -> anyhow::Result<()> {
    uuid::Uuid::parse_str(id).map_err(|_| anyhow::anyhow!("Invalid card ID format: {}", id))?;
    Ok(())
}

fn load_card(store: &CardStore, id: &str) -> anyhow::Result<Flashcard> {
    validate_id(id)?;
    store
        .get_card(id)?
        .ok_or_else(|| anyhow::anyhow!("Card not found: {}", id))
}

fn run_add(store: &CardStore, user: &str, word: &str, topic: Option<&str>) -> anyhow::Result<()> {
    if user.trim().is_empty() || word.trim().is_empty() {
        anyhow::bail!("User and word cannot be empty");
    }

    let card = store.add_card(user.trim(), word.trim(), topic, Utc::now())?;

    println!("{}", "=== Card Added ===".cyan().bold());
    println!();
    println!("{}: {}", "Card ID".white().bold(), card.id);
    println!("{}: {}", "Word".white().bold(), card.word_id);
    if let Some(topic) = &card.topic_id {
        println!("{}: {}", "Topic".white().bold(), topic);
    }
    Ok(())
}

fn run_review(store: &CardStore, id: &str, rating: Rating, response_ms: u64) -> anyhow::Result<()> {
    let before = load_card(store, id)?;
    let now = Utc::now();
    let card = store.review_card(id, &ReviewOutcome::new(rating, response_ms, now), now)?;

    println!("{}", "=== Review Recorded ===".cyan().bold());
    println!();
    println!("{}: {}", "Rating".white().bold(), rating_label(rating));
    println!(
        "{}: {} -> {}",
        "Status".white().bold(),
        before.status,
        card.status.to_string().green()
    );
    println!(
        "{}: {} -> {}",
        "Repetitions".white().bold(),
        before.repetitions,
        card.repetitions
    );
    println!("{}: {}", "Interval".white().bold(), format_days(card.interval_days));
    println!(
        "{}: {}",
        "Next Review".white().bold(),
        card.next_review_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

fn run_preview(store: &CardStore, id: &str) -> anyhow::Result<()> {
    let card = load_card(store, id)?;
    let preview = store.scheduler().preview(&card, Utc::now())?;

    println!("{}", "=== Review Preview ===".cyan().bold());
    println!();
    for (rating, result) in [
        (Rating::Forgot, &preview.forgot),
        (Rating::Hard, &preview.hard),
        (Rating::Easy, &preview.easy),
    ] {
        println!(
            "  {:<8} {:>12}  {}",
            rating_label(rating),
            format_days(result.interval_days),
            result.status
        );
    }
    Ok(())
}

fn run_show(store: &CardStore, id: &str) -> anyhow::Result<()> {
    let card = load_card(store, id)?;
    let now = Utc::now();
    let recall = store.scheduler().current_recall(&card, now)?;

    println!("{}", "=== Flashcard ===".cyan().bold());
    println!();
    println!("{}: {}", "Card ID".white().bold(), card.id);
    println!("{}: {}", "User".white().bold(), card.user_id);
    println!("{}: {}", "Word".white().bold(), card.word_id);
    if let Some(topic) = &card.topic_id {
        println!("{}: {}", "Topic".white().bold(), topic);
    }
    println!("{}: {}", "Status".white().bold(), card.status);
    println!("{}: {}", "Repetitions".white().bold(), card.repetitions);
    println!("{}: {}", "Interval".white().bold(), format_days(card.interval_days));
    println!(
        "{}: {}{}",
        "Next Review".white().bold(),
        card.next_review_at.format("%Y-%m-%d %H:%M:%S"),
        if card.is_due(now) { " (due)".yellow().to_string() } else { String::new() }
    );
    match card.memory_model {
        Some(model) => println!(
            "{}: [{:.4}, {:.4}, {:.4}]",
            "Memory Model".white().bold(),
            model.alpha(),
            model.beta(),
            model.t()
        ),
        None => println!("{}: {}", "Memory Model".white().bold(), "none yet".dimmed()),
    }
    println!("{}: {:.1}%", "Current Recall".white().bold(), recall * 100.0);
    Ok(())
}

fn run_due(store: &CardStore, user: &str, limit: usize) -> anyhow::Result<()> {
    let cards = store.due_cards(user, Utc::now(), limit)?;

    println!("{}", "=== Due Cards ===".cyan().bold());
    println!();
    if cards.is_empty() {
        println!("{}", "Nothing due.".dimmed());
        return Ok(());
    }
    for card in &cards {
        println!(
            "  {}  {:<24} {:<9} {}",
            card.id,
            card.word_id,
            card.status.to_string(),
            card.next_review_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    println!("{}: {}", "Total".white().bold(), cards.len());
    Ok(())
}

fn run_history(store: &CardStore, id: &str) -> anyhow::Result<()> {
    validate_id(id)?;
    let records = store.review_history(id)?;

    println!("{}", "=== Review History ===".cyan().bold());
    println!();
    if records.is_empty() {
        println!("{}", "No reviews yet.".dimmed());
        return Ok(());
    }
    for record in &records {
        println!(
            "  {}  {:<8} {:>7} ms  elapsed {:>12}  next {:>12}  {}",
            record.reviewed_at.format("%Y-%m-%d %H:%M"),
            rating_label(record.rating),
            record.response_time_ms,
            format_days(record.elapsed_days),
            format_days(record.interval_days),
            record.status_after
        );
    }
    Ok(())
}

fn run_delete(store: &CardStore, id: &str) -> anyhow::Result<()> {
    validate_id(id)?;
    if store.delete_card(id)? {
        println!("{} {}", "Deleted".green(), id);
    } else {
        println!("{} {}", "Not found:".yellow(), id);
    }
    Ok(())
}

fn run_predict(
    alpha: f64,
    beta: f64,
    t: f64,
    elapsed: Option<f64>,
    percentile: f64,
    exact: bool,
) -> anyhow::Result<()> {
    let model = MemoryModel::new(alpha, beta, t)?;
    let interval = model.half_life(percentile)?;

    println!("{}", "=== Memory Model ===".cyan().bold());
    println!();
    println!("{}: [{}, {}, {}]", "Model".white().bold(), alpha, beta, t);
    println!(
        "{}: {}",
        format!("Time to {:.0}% recall", percentile * 100.0).white().bold(),
        format_days(interval)
    );
    if let Some(elapsed) = elapsed {
        let recall = model.predict_recall(elapsed, exact)?;
        println!(
            "{}: {:.2}%{}",
            format!("Recall after {}", format_days(elapsed)).white().bold(),
            recall * 100.0,
            if exact { "" } else { " (approx)" }
        );
    }
    Ok(())
}

fn rating_label(rating: Rating) -> colored::ColoredString {
    match rating {
        Rating::Forgot => "forgot".red(),
        Rating::Hard => "hard".yellow(),
        Rating::Easy => "easy".green(),
    }
}

/// Human-friendly interval: minutes, hours, or days
fn format_days(days: f64) -> String {
    if days < 1.0 / 24.0 {
        format!("{:.1} min", days * 24.0 * 60.0)
    } else if days < 1.0 {
        format!("{:.1} h", days * 24.0)
    } else {
        format!("{:.1} d", days)
    }
}
