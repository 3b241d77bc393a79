//! Command-line definition for `fieldnote`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Structured notes and issues for assessment projects.
#[derive(Parser, Debug)]
#[command(name = "fieldnote")]
#[command(version)]
#[command(about = "Structured notes and issues with #[Field]# markup")]
pub struct Cli {
    /// SQLite database file; created and migrated on first use
    #[arg(long, global = true, default_value = "fieldnote.sqlite3")]
    pub db: PathBuf,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// JSON configuration file overriding defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name recorded as author and in the activity feed
    #[arg(long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the node tree
    Node {
        #[command(subcommand)]
        action: NodeCommand,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteCommand,
    },
    /// Manage issues
    Issue {
        #[command(subcommand)]
        action: IssueCommand,
    },
    /// Decode field markup from a file or stdin and print it as JSON
    Fields {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NodeCommand {
    /// Create a node
    Add {
        label: String,
        /// Parent node id
        #[arg(long)]
        parent: Option<String>,
        /// Mark the node as an assessed host
        #[arg(long)]
        host: bool,
    },
    /// List child nodes (root nodes when no parent is given)
    List {
        #[arg(long)]
        parent: Option<String>,
    },
}

/// Text given inline or read from a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct TextInput {
    /// Inline text
    #[arg(long)]
    pub text: Option<String>,
    /// Read text from this file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Create a note on a node
    Add {
        #[arg(long)]
        node: String,
        /// Category id; the configured default category when omitted
        #[arg(long)]
        category: Option<i64>,
        #[command(flatten)]
        input: TextInput,
    },
    /// Print one note with its decoded fields
    Show { id: String },
    /// Set one field, leaving the rest of the text untouched
    SetField {
        id: String,
        name: String,
        value: String,
    },
    /// Case-insensitive substring search over notes
    Search { term: String },
    /// List notes of one node
    List {
        #[arg(long)]
        node: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum IssueCommand {
    /// Create an issue in the issue library
    Add {
        #[command(flatten)]
        input: TextInput,
    },
    /// Print one issue with its title and fields
    Show { id: String },
    /// List issues sorted by title
    List,
    /// Case-insensitive substring search over issues
    Search { term: String },
    /// Set one field, leaving the rest of the text untouched
    SetField {
        id: String,
        name: String,
        value: String,
    },
}
