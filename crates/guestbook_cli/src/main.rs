//! Command-line front end for the guestbook ledger.
//!
//! # Responsibility
//! - Run one load -> edit -> save cycle per invocation on an explicit session.
//! - Keep printing totals when the store cannot be read or written.
//! - Never write over a store whose contents could not be used.
//!
//! **Usage:**
//! ```bash
//! guestbook --store party.csv show
//! guestbook --store party.db add --name "Aiko" --adult 2 --child 1
//! guestbook --store party.db pay 1
//! ```

mod render;

use clap::{Parser, Subcommand};
use guestbook_core::{
    core_version, default_log_level, init_logging, open_store, EditError, Field, GuestRecord,
    LedgerSession, LoadSource, LogConfig, PersistenceGateway, RawValue,
};
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when edits were applied in memory but could not be saved.
const EXIT_SAVE_FAILED: u8 = 2;
/// Exit code when the store could not be used and was left untouched.
const EXIT_STORE_UNUSABLE: u8 = 3;

/// Guest list with headcounts, payment flags and fee totals
#[derive(Parser, Debug)]
#[command(name = "guestbook", version)]
struct Args {
    /// Guest list store (.csv, .db, .sqlite or .sqlite3)
    #[arg(long, env = "GUESTBOOK_STORE", default_value = "guests.csv")]
    store: PathBuf,

    /// Table name inside a SQLite store
    #[arg(long, env = "GUESTBOOK_TABLE")]
    table: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "GUESTBOOK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "GUESTBOOK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every guest with subtotals and the ledger totals
    Show {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Append a guest
    Add {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value_t = 0)]
        adult: u32,
        #[arg(long, default_value_t = 0)]
        child: u32,
        #[arg(long, default_value_t = 0)]
        teacher: u32,
        #[arg(long)]
        paid: bool,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Set one field of a row, as typed into a grid cell
    Set {
        /// Row number as shown by `show` (1-based)
        row: usize,
        /// Field name or header alias, e.g. `count_adult`, `paid`, `大人`
        field: String,
        value: String,
    },
    /// Mark a row as paid
    Pay { row: usize },
    /// Mark a row as unpaid
    Unpay { row: usize },
    /// Remove a row
    Delete { row: usize },
    /// Print the core version
    Version,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = LogConfig::new(level, dir).and_then(|config| init_logging(&config)) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    if let Command::Version = args.command {
        println!("guestbook_core version={}", core_version());
        return Ok(ExitCode::SUCCESS);
    }

    let json = matches!(args.command, Command::Show { json: true });
    let mut gateway = open_store(&args.store, args.table.as_deref())?;
    let mut session = LedgerSession::new();
    let outcome = run_cycle(&mut session, &mut *gateway, args.command);

    match &outcome {
        Outcome::Rejected(message) => {
            eprintln!("error: {message}");
            return Ok(ExitCode::from(outcome.exit_code()));
        }
        Outcome::SaveFailed(message) => {
            eprintln!("warning: {message}");
            eprintln!("warning: changes were not saved; totals below reflect them anyway");
        }
        Outcome::SaveRefused => {
            eprintln!(
                "warning: the stored guest list could not be used, so it was left untouched; \
                 fix or move {} and retry",
                args.store.display()
            );
        }
        Outcome::Unchanged | Outcome::Saved => {}
    }

    if json {
        render::print_json(&session)?;
    } else {
        render::print_table(&session);
    }
    Ok(ExitCode::from(outcome.exit_code()))
}

/// How one invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// Read-only command.
    Unchanged,
    Saved,
    /// Edits were applied in memory but the write failed.
    SaveFailed(String),
    /// Edits were applied to the built-in sample standing in for a store
    /// that could not be used; nothing was written.
    SaveRefused,
    /// The edit itself was invalid.
    Rejected(String),
}

impl Outcome {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Unchanged | Self::Saved => 0,
            Self::Rejected(_) => 1,
            Self::SaveFailed(_) => EXIT_SAVE_FAILED,
            Self::SaveRefused => EXIT_STORE_UNUSABLE,
        }
    }
}

/// One load -> edit -> save cycle against `gateway`.
fn run_cycle(
    session: &mut LedgerSession,
    gateway: &mut dyn PersistenceGateway,
    command: Command,
) -> Outcome {
    let report = session.load(&*gateway);

    if let Some(failure) = &report.failure {
        let fallback = match report.source {
            LoadSource::Retained => "keeping the current list",
            _ => "showing the built-in sample",
        };
        eprintln!("note: {failure}; {fallback}");
    }
    if !report.dropped_columns.is_empty() {
        eprintln!(
            "note: ignoring unknown columns: {}",
            report.dropped_columns.join(", ")
        );
    }
    info!(
        "event=cli_command module=cli status=start store={} rows={}",
        gateway.describe(),
        report.rows
    );

    match apply(session, command) {
        Ok(false) => Outcome::Unchanged,
        Ok(true) if !report.safe_to_overwrite() => {
            warn!(
                "event=cli_command module=cli status=save_refused store={}",
                gateway.describe()
            );
            Outcome::SaveRefused
        }
        Ok(true) => match session.save(gateway) {
            Ok(()) => Outcome::Saved,
            Err(err) => Outcome::SaveFailed(err.to_string()),
        },
        Err(err) => Outcome::Rejected(err.to_string()),
    }
}

/// Applies `command` to the session; returns whether the ledger changed.
fn apply(session: &mut LedgerSession, command: Command) -> Result<bool, Box<dyn Error>> {
    match command {
        Command::Show { .. } | Command::Version => Ok(false),
        Command::Add {
            name,
            adult,
            child,
            teacher,
            paid,
            note,
        } => {
            let mut record = GuestRecord::with_counts(name, adult, child, teacher);
            record.paid = paid;
            record.note = note;
            session.insert_row(record)?;
            Ok(true)
        }
        Command::Set { row, field, value } => {
            let index = row_index(session, row)?;
            let field = Field::from_header(&field)
                .ok_or_else(|| format!("unknown field `{field}`"))?;
            session.set_field_raw(index, field, &RawValue::from_cell(&value))?;
            Ok(true)
        }
        Command::Pay { row } => {
            let index = row_index(session, row)?;
            session.update_row(index, |record| record.paid = true)?;
            Ok(true)
        }
        Command::Unpay { row } => {
            let index = row_index(session, row)?;
            session.update_row(index, |record| record.paid = false)?;
            Ok(true)
        }
        Command::Delete { row } => {
            let index = row_index(session, row)?;
            session.delete_row(index)?;
            Ok(true)
        }
    }
}

/// Converts a 1-based row number as printed by `show` into an index.
fn row_index(session: &LedgerSession, row: usize) -> Result<usize, EditError> {
    let len = session.ledger().len();
    if row == 0 || row > len {
        return Err(EditError::RowOutOfRange { index: row, len });
    }
    Ok(row - 1)
}
