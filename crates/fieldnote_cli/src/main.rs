//! `fieldnote` command-line client.
//!
//! # Responsibility
//! - Drive `fieldnote_core` services the way a controller would.
//! - Print JSON envelopes so output is deterministic and scriptable.
//!
//! Exit codes:
//! - 0: success
//! - 1: rejected action or runtime error

mod cli;

use clap::Parser;
use cli::{Cli, Commands, IssueCommand, NodeCommand, NoteCommand, TextInput};
use fieldnote_core::{
    decode, default_log_level, init_logging, open_db, ActionResponse, CoreConfig, IssueService,
    IssueView, NewIssue, NewNote, NodeKind, NodeService, NoteService, NoteView, SearchResponse,
    ServiceResult, SqliteStore,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the core rejected the action.
fn run(cli: Cli) -> CliResult<bool> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, absolute(log_dir)?)?;
    }

    let config = match cli.config.as_deref() {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };

    if let Commands::Fields { file } = &cli.command {
        let raw = read_input(file.as_deref())?;
        print_json(&decode(&raw))?;
        return Ok(true);
    }

    let conn = open_db(&cli.db)?;
    let store = SqliteStore::try_new(&conn)?;
    let user = cli.user.as_deref();
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Commands::Node { action } => {
            let nodes = NodeService::new(&store, config);
            match action {
                NodeCommand::Add {
                    label,
                    parent,
                    host,
                } => {
                    let parent = parent.as_deref().map(parse_id).transpose()?;
                    let kind = if host {
                        NodeKind::Host
                    } else {
                        NodeKind::Default
                    };
                    report(nodes.create_node(parent, label, kind), |node| node.id)
                }
                NodeCommand::List { parent } => {
                    let parent = parent.as_deref().map(parse_id).transpose()?;
                    print_json(&nodes.list_children(parent)?)?;
                    Ok(true)
                }
            }
        }
        Commands::Note { action } => {
            let notes = NoteService::new(&store, config.clone());
            match action {
                NoteCommand::Add {
                    node,
                    category,
                    input,
                } => {
                    let mut new_note = NewNote::new(parse_id(&node)?, read_text(input)?);
                    new_note.category_id = category;
                    new_note.author = cli.user.clone();
                    report(notes.create_note(new_note), |note| note.id)
                }
                NoteCommand::Show { id } => {
                    let note = notes.get_note(parse_id(&id)?)?;
                    print_json(&NoteView::from_note(&note, &config))?;
                    Ok(true)
                }
                NoteCommand::SetField { id, name, value } => report(
                    notes.set_field(parse_id(&id)?, &name, &value, user),
                    |note| note.id,
                ),
                NoteCommand::Search { term } => {
                    let views: Vec<NoteView> = notes
                        .search(&term)?
                        .iter()
                        .map(|note| NoteView::from_note(note, &config))
                        .collect();
                    print_json(&SearchResponse::new(views))?;
                    Ok(true)
                }
                NoteCommand::List { node } => {
                    let views: Vec<NoteView> = notes
                        .list_for_node(parse_id(&node)?)?
                        .iter()
                        .map(|note| NoteView::from_note(note, &config))
                        .collect();
                    print_json(&views)?;
                    Ok(true)
                }
            }
        }
        Commands::Issue { action } => {
            let issues = IssueService::new(&store, config.clone());
            match action {
                IssueCommand::Add { input } => {
                    let mut new_issue = NewIssue::new(read_text(input)?);
                    new_issue.author = cli.user.clone();
                    report(issues.create_issue(new_issue), |issue| issue.id())
                }
                IssueCommand::Show { id } => {
                    let issue = issues.get_issue(parse_id(&id)?)?;
                    print_json(&IssueView::from_issue(&issue, &config))?;
                    Ok(true)
                }
                IssueCommand::List => {
                    let views: Vec<IssueView> = issues
                        .list_issues()?
                        .iter()
                        .map(|issue| IssueView::from_issue(issue, &config))
                        .collect();
                    print_json(&views)?;
                    Ok(true)
                }
                IssueCommand::Search { term } => {
                    let views: Vec<IssueView> = issues
                        .search(&term)?
                        .iter()
                        .map(|issue| IssueView::from_issue(issue, &config))
                        .collect();
                    print_json(&SearchResponse::new(views))?;
                    Ok(true)
                }
                IssueCommand::SetField { id, name, value } => report(
                    issues.set_field(parse_id(&id)?, &name, &value, user),
                    |issue| issue.id(),
                ),
            }
        }
        Commands::Fields { .. } => Ok(true),
    }
}

/// Prints the action envelope; returns whether the action succeeded.
fn report<T>(result: ServiceResult<T>, id_of: impl FnOnce(&T) -> Uuid) -> CliResult<bool> {
    let response = ActionResponse::from_result(&result, id_of);
    print_json(&response)?;
    Ok(response.ok)
}

fn print_json(value: &impl Serialize) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(value: &str) -> CliResult<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|err| format!("invalid id `{value}`: {err}").into())
}

fn read_text(input: TextInput) -> CliResult<String> {
    match (input.text, input.file) {
        (Some(text), _) => Ok(text),
        (None, file) => read_input(file.as_deref()),
    }
}

fn read_input(file: Option<&Path>) -> CliResult<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}

fn absolute(path: &Path) -> CliResult<std::path::PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
