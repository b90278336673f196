use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::model::task::Filter;

#[derive(Parser)]
#[command(name = "tl", about = concat!("[x] tasklist v", env!("CARGO_PKG_VERSION"), " - a short list, kept in order"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output on stderr (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and a commented config.toml
    Init(InitArgs),
    /// Add a task to the top of the list
    Add(AddArgs),
    /// List tasks (the default when no command is given)
    #[command(alias = "ls")]
    List(ListArgs),
    /// Flip a task between pending and completed
    #[command(alias = "done")]
    Toggle(IdArg),
    /// Change a task's text
    Edit(EditArgs),
    /// Delete a task
    #[command(alias = "delete")]
    Rm(IdArg),
    /// Move one task among the tasks visible under a filter
    Mv(MvArgs),
    /// Put the given tasks first, in the given order
    Reorder(ReorderArgs),
    /// Show or change the theme
    Theme(ThemeArgs),
    /// Show task counts by category
    Stats,
    /// List categories, or add one
    Category(CategoryCmd),
    /// View or clear the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Category (default: tasks.default_category from config.toml)
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args, Default)]
pub struct ListArgs {
    /// Which tasks to show (default: all)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub filter: Option<Filter>,
}

#[derive(Args)]
pub struct IdArg {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
#[command(group(ArgGroup::new("position").required(true).args(["top", "bottom", "before", "after"])))]
pub struct MvArgs {
    /// Task ID
    pub id: String,
    /// Move to the top
    #[arg(long)]
    pub top: bool,
    /// Move to the bottom
    #[arg(long)]
    pub bottom: bool,
    /// Move directly above this task ID
    #[arg(long, value_name = "ID")]
    pub before: Option<String>,
    /// Move directly below this task ID
    #[arg(long, value_name = "ID")]
    pub after: Option<String>,
    /// Only count tasks visible under this filter (default: all)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub filter: Option<Filter>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Task IDs in their new order; unlisted tasks keep their order after these
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// Theme to switch to (omit to show the current theme)
    #[arg(value_enum, ignore_case = true)]
    pub theme: Option<ThemeArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    /// Switch to the other theme
    Toggle,
}

#[derive(Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    pub action: Option<CategoryAction>,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Add a category to config.toml
    Add(CategoryNameArg),
    /// Make a category the default for new tasks
    Default(CategoryNameArg),
}

#[derive(Args)]
pub struct CategoryNameArg {
    /// Category name
    pub name: String,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Delete the recovery log
    Clear,
}
