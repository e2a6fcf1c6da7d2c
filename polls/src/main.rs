//! Command-line administration for classroom polls.
//!
//! Operates directly on the snapshot file named in `polls.toml`. Do not run
//! mutating commands while `polls-server` is serving the same file: the
//! server does not re-read the snapshot.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use polls::app::{load_resolved_config, open_service};
use polls::core::ids::share_url;
use polls::error::{ErrorKind, PollError};
use polls::exit_codes;
use polls::io::config::{PollsConfig, write_config};
use polls::io::export::write_responses_csv;
use polls::io::seed::load_seed_file;
use polls::model::{PollDraft, PollResults, SubmitOutcome};
use polls::service::PollService;

#[derive(Parser)]
#[command(name = "polls", version, about = "Classroom live polls")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, default_value = "polls.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// List polls with their response counts.
    List,
    /// Create a poll, replacing (and clearing) any poll with the same id.
    Create {
        id: String,
        #[arg(short, long)]
        question: String,
        /// Option text; repeat for each option, in display order.
        #[arg(short = 'o', long = "option", required = true)]
        options: Vec<String>,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Delete a poll and its responses.
    Delete { id: String },
    /// Remove all responses from a poll.
    Clear { id: String },
    /// Submit a response.
    Vote { id: String, response: String },
    /// Show tallies and percentages.
    Results {
        id: String,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Create polls from a seed file without overwriting existing ones.
    Import { path: PathBuf },
    /// Export responses as CSV.
    Export {
        id: String,
        /// Output file (defaults to stdout).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the voting link for a poll.
    Share { id: String },
}

fn main() {
    polls::logging::init("warn");
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code(err: &anyhow::Error) -> i32 {
    let not_found = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<PollError>())
        .any(|poll_err| poll_err.kind() == ErrorKind::NotFound);
    if not_found {
        exit_codes::NOT_FOUND
    } else {
        exit_codes::INVALID
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config.as_path();
    match cli.command {
        Command::Init { force } => cmd_init(config, force),
        Command::List => cmd_list(config),
        Command::Create {
            id,
            question,
            options,
            title,
        } => cmd_create(
            config,
            PollDraft {
                id,
                title,
                question,
                options,
            },
        ),
        Command::Delete { id } => cmd_delete(config, &id),
        Command::Clear { id } => cmd_clear(config, &id),
        Command::Vote { id, response } => cmd_vote(config, &id, &response),
        Command::Results { id, json } => cmd_results(config, &id, json),
        Command::Import { path } => cmd_import(config, &path),
        Command::Export { id, out } => cmd_export(config, &id, out.as_deref()),
        Command::Share { id } => cmd_share(config, &id),
    }
}

fn open(config: &Path) -> Result<(PollsConfig, PollService)> {
    let cfg = load_resolved_config(config)?;
    let service = open_service(&cfg)?;
    Ok((cfg, service))
}

fn cmd_list(config: &Path) -> Result<()> {
    let (_, service) = open(config)?;
    let mut stdout = io::stdout().lock();
    for summary in service.list_polls() {
        writeln!(
            stdout,
            "{}\t{}\t{} responses",
            summary.poll.id, summary.poll.title, summary.responses
        )?;
    }
    Ok(())
}

fn cmd_create(config: &Path, draft: PollDraft) -> Result<()> {
    let (_, service) = open(config)?;
    let poll = service.create_poll(&draft)?;
    println!("created {}", poll.id);
    Ok(())
}

fn cmd_delete(config: &Path, id: &str) -> Result<()> {
    let (_, service) = open(config)?;
    service.delete_poll(id)?;
    println!("deleted {}", id);
    Ok(())
}

fn cmd_clear(config: &Path, id: &str) -> Result<()> {
    let (_, service) = open(config)?;
    service.clear_responses(id)?;
    println!("cleared {}", id);
    Ok(())
}

fn cmd_vote(config: &Path, id: &str, response: &str) -> Result<()> {
    let (_, service) = open(config)?;
    match service.submit_response(id, response)? {
        SubmitOutcome::Matched => println!("recorded"),
        SubmitOutcome::Unmatched => println!("recorded (matches no option; not tallied)"),
    }
    Ok(())
}

fn cmd_results(config: &Path, id: &str, json: bool) -> Result<()> {
    let (_, service) = open(config)?;
    let results = service.get_results(id)?;
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &results)?;
        writeln!(stdout)?;
    } else {
        write_results_text(&mut stdout, &results)?;
    }
    Ok(())
}

fn cmd_import(config: &Path, path: &Path) -> Result<()> {
    let (_, service) = open(config)?;
    let definitions = load_seed_file(path)?;
    let report = service.seed_from_config(&definitions)?;
    for id in &report.created {
        println!("created {}", id);
    }
    for id in &report.skipped {
        println!("skipped {} (exists)", id);
    }
    for (id, reason) in &report.rejected {
        println!("rejected {}: {}", id, reason);
    }
    Ok(())
}

fn cmd_export(config: &Path, id: &str, out: Option<&Path>) -> Result<()> {
    let (_, service) = open(config)?;
    let responses = service.responses(id)?;
    match out {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_responses_csv(BufWriter::new(file), &responses)?;
        }
        None => write_responses_csv(io::stdout().lock(), &responses)?,
    }
    Ok(())
}

fn cmd_share(config: &Path, id: &str) -> Result<()> {
    let (cfg, service) = open(config)?;
    let poll = service.get_poll(id)?;
    println!("{}", share_url(&cfg.base_url, &poll.id));
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("{} exists; use --force to overwrite", path.display());
        return Ok(());
    }
    write_config(path, &PollsConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn write_results_text(out: &mut impl Write, results: &PollResults) -> Result<()> {
    writeln!(out, "{} ({})", results.poll.title, results.poll.id)?;
    writeln!(out, "{}", results.poll.question)?;
    for entry in &results.tally {
        writeln!(
            out,
            "  {}: {} ({:.1}%)",
            entry.option, entry.count, entry.percentage
        )?;
    }
    writeln!(
        out,
        "responses: {} ({} matched)",
        results.total, results.matched
    )?;
    Ok(())
}
