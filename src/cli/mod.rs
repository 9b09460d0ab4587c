pub mod edit;
pub mod moment;
pub mod output;
pub mod session;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use edit::{edit_ledger, editor_from_env};
use moment::MomentArgs;
use output::{print_header, print_okay, print_report};
use session::{report_project, start_tracking, stop_tracking};
use tracing::level_filters::LevelFilter;

use crate::{
    ledger::{
        entities::{LedgerMonth, ProjectName, TIME_FORMAT},
        ledger_storage::{LedgerStorage, LedgerStorageImpl},
    },
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir, TIMESHEETS_DIR},
        logging::{enable_logging, CLI_PREFIX},
        runtime::single_thread_runtime,
        time::hours,
    },
};

#[derive(Parser, Debug)]
#[command(name = "claz", version, long_about = None)]
#[command(about = "Simple time management", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default $XDG_STATE_HOME/claz or $HOME/.local/state/claz"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Print logs to the console")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Level of logs to keep")]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start a session for a project")]
    Start {
        project: ProjectName,
        #[command(flatten)]
        moment: MomentArgs,
    },
    #[command(about = "Stop the running session of a project and show a report")]
    Stop {
        project: ProjectName,
        #[command(flatten)]
        moment: MomentArgs,
    },
    #[command(about = "Show totals of a project")]
    Report { project: ProjectName },
    #[command(about = "Open the timesheet of the current month in an editor")]
    Edit {
        project: ProjectName,
        #[arg(long, help = "Editor to use instead of $VISUAL or $EDITOR")]
        editor: Option<String>,
    },
}

pub fn run_cli() -> Result<ExitCode> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => {
            ensure_dir(&dir)?;
            dir
        }
        None => create_application_default_path()?,
    };

    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let storage = LedgerStorageImpl::new(app_dir.join(TIMESHEETS_DIR))?;
    single_thread_runtime()?.block_on(process_command(args.commands, &storage, &DefaultClock))
}

/// Runs a single command against `storage`. The clock is read once, every part of the command
/// works with that moment.
async fn process_command(
    command: Commands,
    storage: &LedgerStorageImpl,
    clock: &impl Clock,
) -> Result<ExitCode> {
    let now = clock.time();

    match command {
        Commands::Start { project, moment } => {
            let start = moment.resolve(now)?;
            print_header(header(&project, start));
            let started = start_tracking(storage, &project, start).await?;
            print_okay(format!(
                "Session started at {}.",
                started.start.format(TIME_FORMAT)
            ));
        }
        Commands::Stop { project, moment } => {
            let stop = moment.resolve(now)?;
            print_header(header(&project, stop));
            let duration = stop_tracking(storage, &project, stop).await?;
            print_okay(format!("Session duration: {:.2} hours.", hours(duration)));
            print_report(&report_project(storage, &project, now.naive_local()).await?);
        }
        Commands::Report { project } => {
            print_header(header(&project, now.naive_local()));
            print_report(&report_project(storage, &project, now.naive_local()).await?);
        }
        Commands::Edit { project, editor } => {
            let editor = editor.unwrap_or_else(editor_from_env);
            storage.ensure_project_dir(&project).await?;
            let path = storage.ledger_path(&project, LedgerMonth::of(now.date_naive()));
            return edit_ledger(&editor, &path).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn header(project: &ProjectName, moment: NaiveDateTime) -> String {
    format!("{project}: {}", moment.format("%B %Y"))
}
