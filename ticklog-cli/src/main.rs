use anyhow::{Context, Result};
use chrono::{Local, Offset};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use ticklog_core::{parse_todo, render, EntryStatus, ProcessedEntry, Thresholds, TicketRecord, TodoEntry};
use ticklog_ingest::{drafts_from_lines, parse_timesheet};
use ticklog_match::{fetch_universe, Matcher, MatchingOracleClient, TicketSource};

mod config;
mod gemini;
mod jira;
mod logging;
mod state;

use config::Config;
use gemini::GeminiOracle;
use jira::{FileTicketSource, JiraClient};

#[derive(Parser, Debug)]
#[command(
    name = "ticklog",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TICKLOG_BUILD_SHA"), ")"),
    about = "Match todo lines to tracker tickets and log the time"
)]
struct Cli {
    /// Debug-level logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match every line of a todo file and print timesheet lines
    Match {
        #[arg(long)]
        todo: PathBuf,

        /// Ticket JSON file (search response or record array) instead of Jira
        #[arg(long)]
        tickets: Option<PathBuf>,

        /// Keyword matching only
        #[arg(long)]
        no_ai: bool,

        /// Print processed entries as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Suggest tickets for a single task
    Suggest {
        #[arg(long)]
        task: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        tickets: Option<PathBuf>,

        #[arg(long)]
        no_ai: bool,
    },

    /// Show one ticket
    Ticket {
        key: String,

        #[arg(long)]
        tickets: Option<PathBuf>,
    },

    /// Turn a rendered timesheet into worklogs
    Worklogs {
        #[arg(long)]
        timesheet: PathBuf,

        /// Post each worklog to Jira (default: print only)
        #[arg(long)]
        submit: bool,
    },

    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config with secrets masked
    Show,
}

#[derive(clap::Args, Debug)]
struct ThresholdArgs {
    #[arg(long)]
    minimum: Option<f64>,
    #[arg(long)]
    choice: Option<f64>,
    #[arg(long)]
    high_confidence: Option<f64>,
}

impl ThresholdArgs {
    fn apply(&self, mut t: Thresholds) -> Thresholds {
        if let Some(v) = self.minimum {
            t.minimum = v;
        }
        if let Some(v) = self.choice {
            t.choice = v;
        }
        if let Some(v) = self.high_confidence {
            t.high_confidence = v;
        }
        t
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    match cli.command {
        Command::Match {
            todo,
            tickets,
            no_ai,
            json,
            thresholds,
        } => {
            let cfg = config::load_config()?;
            let text = state::read_text(&todo)?;
            let entries = parse_todo(&text);
            if entries.is_empty() {
                warn!(file = %todo.display(), "no todo lines recognized");
                return Ok(());
            }

            let universe = load_universe(&cfg, tickets.as_deref()).await?;
            let matcher = build_matcher(&cfg)?;
            let thresholds = thresholds.apply(cfg.matching.thresholds());
            let use_ai = cfg.matching.use_ai && !no_ai;

            let processed = matcher.match_all(&entries, &universe, &thresholds, use_ai).await;
            log_summary(&processed);

            if json {
                println!("{}", serde_json::to_string_pretty(&processed).context("serialize entries")?);
            } else {
                for line in render(&processed) {
                    println!("{line}");
                }
            }
        }

        Command::Suggest {
            task,
            project,
            tickets,
            no_ai,
        } => {
            let cfg = config::load_config()?;
            let universe = load_universe(&cfg, tickets.as_deref()).await?;
            let matcher = build_matcher(&cfg)?;
            let use_ai = cfg.matching.use_ai && !no_ai;

            let entry = TodoEntry::from_task(task, project);
            let p = matcher
                .match_one(&entry, &universe, &cfg.matching.thresholds(), use_ai)
                .await;
            print_suggestion(&p);
        }

        Command::Ticket { key, tickets } => {
            let cfg = config::load_config()?;
            let source = ticket_source(&cfg, tickets.as_deref())?;
            let t = source.get_ticket_by_key(&key).await?;
            println!("{}", serde_json::to_string_pretty(&t).context("serialize ticket")?);
        }

        Command::Worklogs { timesheet, submit } => {
            let text = state::read_text(&timesheet)?;
            let lines = parse_timesheet(&text);
            let offset = Local::now().offset().fix();
            let drafts = drafts_from_lines(&lines, offset);
            info!(lines = lines.len(), drafts = drafts.len(), "built worklog drafts");

            if !submit {
                for d in &drafts {
                    println!("{} | {} | {}s | {}", d.issue_key, d.started, d.duration_seconds, d.comment);
                }
                return Ok(());
            }

            let cfg = config::load_config()?;
            let client = JiraClient::from_config(&cfg.jira)?;
            for d in &drafts {
                client
                    .submit_worklog(&d.issue_key, d)
                    .await
                    .with_context(|| format!("submit worklog for {}", d.issue_key))?;
                println!("logged {}s on {}", d.duration_seconds, d.issue_key);
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", config::render_masked(&cfg)?);
            }
        },
    }

    Ok(())
}

fn ticket_source(cfg: &Config, tickets: Option<&Path>) -> Result<Box<dyn TicketSource>> {
    match tickets {
        Some(path) => {
            let text = state::read_text(path)?;
            let src = FileTicketSource::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(Box::new(src))
        }
        None => Ok(Box::new(JiraClient::from_config(&cfg.jira)?)),
    }
}

async fn load_universe(cfg: &Config, tickets: Option<&Path>) -> Result<Vec<Arc<TicketRecord>>> {
    let source = ticket_source(cfg, tickets)?;
    let universe = fetch_universe(&*source, &cfg.jira.jql, cfg.jira.page_size, cfg.jira.max_pages).await?;
    if universe.is_empty() {
        warn!("ticket search returned no tickets; every entry will be unmapped");
    }
    info!(tickets = universe.len(), "loaded ticket universe");
    Ok(universe)
}

fn build_matcher(cfg: &Config) -> Result<Matcher> {
    let matcher = Matcher::new(cfg.matching.ranker());
    match GeminiOracle::from_config(&cfg.gemini)? {
        Some(oracle) => {
            let client = MatchingOracleClient::new(Arc::new(oracle), cfg.gemini.oracle_config());
            Ok(matcher.with_oracle(client))
        }
        None => {
            if cfg.matching.use_ai {
                warn!("no Gemini API key; using keyword matching only");
            }
            Ok(matcher)
        }
    }
}

fn log_summary(entries: &[ProcessedEntry]) {
    let count = |s: EntryStatus| entries.iter().filter(|e| e.status == s).count();
    info!(
        entries = entries.len(),
        auto_assigned = count(EntryStatus::AutoAssigned),
        needs_selection = count(EntryStatus::NeedsSelection),
        unmapped = count(EntryStatus::Unmapped),
        "matching done"
    );
}

fn print_suggestion(p: &ProcessedEntry) {
    println!("{} [{}]", p.task, p.status.as_str());
    if p.matches.is_empty() {
        println!("  (no candidates)");
    }
    for m in &p.matches {
        let mark = if p.selected_key() == Some(m.key()) { "*" } else { " " };
        println!(
            "{mark} {} {:.2} {} | {}",
            m.key(),
            m.score,
            m.method.as_str(),
            m.ticket.summary
        );
    }
}
