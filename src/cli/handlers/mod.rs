mod init;

use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::storage::FileStore;
use crate::model::task::Filter;
use crate::model::theme::Theme;
use crate::ops::stats::list_stats;
use crate::ops::task_ops::InsertPosition;
use crate::store::Store;
use crate::view::{Gesture, Notice, Outcome, Session};

type CmdResult = Result<(), Box<dyn Error>>;

/// Per-invocation settings shared by all commands
pub struct Ctx {
    pub data_dir: PathBuf,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Ctx {
        data_dir: resolve_data_dir(cli.data_dir.as_deref()),
        json: cli.json,
    };
    info!(data_dir = %ctx.data_dir.display(), "using data directory");

    match cli.command {
        None => cmd_list(&ctx, ListArgs::default()),
        Some(cmd) => match cmd {
            Commands::Init(args) => init::cmd_init(&ctx, args),

            // Read commands
            Commands::List(args) => cmd_list(&ctx, args),
            Commands::Stats => cmd_stats(&ctx),
            Commands::Recovery(args) => cmd_recovery(&ctx, args),

            // Write commands
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Toggle(args) => cmd_toggle(&ctx, args),
            Commands::Edit(args) => cmd_edit(&ctx, args),
            Commands::Rm(args) => cmd_rm(&ctx, args),
            Commands::Mv(args) => cmd_mv(&ctx, args),
            Commands::Reorder(args) => cmd_reorder(&ctx, args),
            Commands::Theme(args) => cmd_theme(&ctx, args),
            Commands::Category(args) => cmd_category(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `-C` flag, else `$TASKLIST_DIR`, else `$XDG_DATA_HOME/tasklist`,
/// else `~/.local/share/tasklist`.
pub fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = flag {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os("TASKLIST_DIR").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".local").join("share"));
    data_home.join("tasklist")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

fn open_store(ctx: &Ctx) -> Store<FileStore> {
    Store::open(FileStore::new(ctx.data_dir.clone()))
}

/// Open the store for a command that may save the task list. A stored
/// value that could not be loaded as is goes to the recovery log right
/// before the first save replaces it, and not at all if nothing is saved.
fn open_store_for_write(ctx: &Ctx) -> Store<FileStore> {
    let data_dir = ctx.data_dir.clone();
    open_store(ctx).before_replacing_discarded(move |raw| {
        recovery::log_recovery(
            &data_dir,
            RecoveryEntry::new(
                RecoveryCategory::Corrupt,
                "stored task list was damaged and has been replaced",
                raw,
            ),
        );
        eprintln!(
            "warning: stored task list was damaged and has been replaced (old data in {})",
            recovery::recovery_log_path(&data_dir).display()
        );
    })
}

/// Run one gesture against the store under the data-directory lock.
///
/// Blank text becomes an error. A failed write is reported as a warning
/// and the unsaved list goes to the recovery log; the command still
/// succeeds.
fn run_gesture(
    ctx: &Ctx,
    gesture: Gesture,
    filter: Filter,
    show_list: bool,
) -> Result<(Outcome, Store<FileStore>), Box<dyn Error>> {
    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let store = open_store_for_write(ctx);

    let mut presenter = TextPresenter::new(io::stdout(), ctx.json);
    if !show_list {
        presenter = presenter.silent();
    }
    let mut session = Session::new(store, presenter).with_filter(filter);
    let outcome = session.handle(gesture);
    let (store, presenter) = session.into_parts();

    for notice in presenter.notices() {
        match notice {
            Notice::EmptyText => return Err(notice.message().into()),
            Notice::Unsaved(reason) => report_unsaved(ctx, &store, reason),
        }
    }
    Ok((outcome, store))
}

fn report_unsaved(ctx: &Ctx, store: &Store<FileStore>, reason: &str) {
    eprintln!("warning: {}", Notice::Unsaved(reason.to_string()).message());
    let payload = store.serialized().unwrap_or_default();
    recovery::log_recovery(
        &ctx.data_dir,
        RecoveryEntry::new(RecoveryCategory::Write, "task list not saved", payload)
            .field("Reason", reason)
            .field("Tasks", store.tasks().len().to_string()),
    );
}

fn report_unchanged(id: &str) {
    eprintln!("nothing changed: no task {}", id);
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Ctx, args: ListArgs) -> CmdResult {
    let filter = args.filter.unwrap_or_default();
    let store = open_store(ctx);
    let presenter = TextPresenter::new(io::stdout(), ctx.json);
    Session::new(store, presenter).with_filter(filter).render();
    Ok(())
}

fn cmd_stats(ctx: &Ctx) -> CmdResult {
    let store = open_store(ctx);
    let stats = list_stats(store.tasks());
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats(&stats) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_recovery(ctx: &Ctx, args: RecoveryCmd) -> CmdResult {
    if let Some(RecoveryAction::Clear) = args.action {
        let removed = recovery::clear_recovery(&ctx.data_dir)?;
        println!("cleared {} recovery entries", removed);
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&ctx.data_dir, Some(args.limit.unwrap_or(10)));
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("recovery log is empty");
    } else {
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                println!();
            }
            for line in format_recovery_entry(entry) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Ctx, args: AddArgs) -> CmdResult {
    let category = match args.category {
        Some(c) => c,
        None => config_io::read_config(&ctx.data_dir)?.tasks.default_category,
    };
    let gesture = Gesture::Add {
        text: args.text,
        category,
    };
    let (outcome, store) = run_gesture(ctx, gesture, Filter::All, false)?;

    // an unsaved add still returns the task at the head of the list
    let task = match outcome {
        Outcome::Added(task) => Some(task),
        _ => store.tasks().first().cloned(),
    };
    if let Some(task) = task {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&task)?);
        } else {
            println!("{}", task.id);
        }
    }
    Ok(())
}

fn cmd_toggle(ctx: &Ctx, args: IdArg) -> CmdResult {
    let (outcome, store) = run_gesture(ctx, Gesture::Toggle(args.id.clone()), Filter::All, false)?;
    if outcome == Outcome::Unchanged {
        report_unchanged(&args.id);
        return Ok(());
    }
    if let Some(task) = store.get(&args.id) {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(task)?);
        } else {
            let state = if task.completed { "completed" } else { "pending" };
            println!("{} {}", task.id, state);
        }
    }
    Ok(())
}

fn cmd_edit(ctx: &Ctx, args: EditArgs) -> CmdResult {
    let gesture = Gesture::Edit {
        id: args.id.clone(),
        text: args.text,
    };
    let (outcome, store) = run_gesture(ctx, gesture, Filter::All, false)?;
    match store.get(&args.id) {
        Some(task) if ctx.json => println!("{}", serde_json::to_string_pretty(task)?),
        Some(task) if outcome == Outcome::Changed => println!("{} {}", task.id, task.text),
        Some(task) => eprintln!("nothing changed: {} already reads '{}'", task.id, task.text),
        None => report_unchanged(&args.id),
    }
    Ok(())
}

fn cmd_rm(ctx: &Ctx, args: IdArg) -> CmdResult {
    let (outcome, _) = run_gesture(ctx, Gesture::Delete(args.id.clone()), Filter::All, false)?;
    if outcome == Outcome::Unchanged {
        report_unchanged(&args.id);
    } else if !ctx.json {
        println!("deleted {}", args.id);
    }
    Ok(())
}

fn cmd_mv(ctx: &Ctx, args: MvArgs) -> CmdResult {
    let filter = args.filter.unwrap_or_default();
    let position = if args.top {
        InsertPosition::Top
    } else if args.bottom {
        InsertPosition::Bottom
    } else if let Some(before) = args.before {
        InsertPosition::Before(before)
    } else if let Some(after) = args.after {
        InsertPosition::After(after)
    } else {
        return Err("one of --top, --bottom, --before, --after is required".into());
    };

    let gesture = Gesture::Drag {
        id: args.id.clone(),
        position,
    };
    let (outcome, _) = run_gesture(ctx, gesture, filter, true)?;
    if outcome == Outcome::Unchanged {
        eprintln!(
            "nothing changed: {} or its anchor is not visible under filter '{}'",
            args.id, filter
        );
    }
    Ok(())
}

fn cmd_reorder(ctx: &Ctx, args: ReorderArgs) -> CmdResult {
    run_gesture(ctx, Gesture::Drop(args.ids), Filter::All, true)?;
    Ok(())
}

fn cmd_theme(ctx: &Ctx, args: ThemeArgs) -> CmdResult {
    let theme = match args.theme {
        None => open_store(ctx).theme(),
        Some(ThemeArg::Toggle) => run_gesture(ctx, Gesture::ToggleTheme, Filter::All, false)?
            .1
            .theme(),
        Some(choice) => {
            let theme = if choice == ThemeArg::Dark { Theme::Dark } else { Theme::Light };
            let _lock = FileLock::acquire_default(&ctx.data_dir)?;
            let mut store = open_store(ctx);
            if let Err(e) = store.set_theme(theme) {
                eprintln!("warning: {}", Notice::Unsaved(e.to_string()).message());
            }
            theme
        }
    };

    if ctx.json {
        println!("{}", serde_json::to_string(&ThemeJson { theme })?);
    } else {
        println!("{}", theme);
    }
    Ok(())
}

fn cmd_category(ctx: &Ctx, args: CategoryCmd) -> CmdResult {
    let Some(action) = args.action else {
        let config = config_io::read_config(&ctx.data_dir)?;
        if ctx.json {
            let doc = CategoriesJson {
                default: &config.tasks.default_category,
                categories: &config.tasks.categories,
            };
            println!("{}", serde_json::to_string_pretty(&doc)?);
        } else {
            for name in &config.tasks.categories {
                let marker = if *name == config.tasks.default_category { "*" } else { " " };
                println!("{} {}", marker, name);
            }
        }
        return Ok(());
    };

    let _lock = FileLock::acquire_default(&ctx.data_dir)?;
    let mut doc = config_io::read_config_doc(&ctx.data_dir)?;
    match action {
        CategoryAction::Add(arg) => {
            let name = arg.name.trim();
            if name.is_empty() {
                return Err("category name cannot be empty".into());
            }
            if !config_io::add_category(&mut doc, name) {
                eprintln!("nothing changed: {} is already a category", name);
                return Ok(());
            }
            config_io::write_config(&ctx.data_dir, &doc)?;
            println!("added {}", name);
        }
        CategoryAction::Default(arg) => {
            let name = arg.name.trim();
            if name.is_empty() {
                return Err("category name cannot be empty".into());
            }
            config_io::add_category(&mut doc, name);
            config_io::set_default_category(&mut doc, name);
            config_io::write_config(&ctx.data_dir, &doc)?;
            println!("default category is now {}", name);
        }
    }
    Ok(())
}
