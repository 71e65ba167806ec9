//! photopipe - media processing pipeline
//!
//! Usage:
//!   photopipe worker [--workers N]          Run stage jobs until Ctrl-C
//!   photopipe import --uploader U FILE      Accept a file as a new upload
//!   photopipe reprocess [IDS]... [--state N] [--all] [--failed]

mod app;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use photopipe::processing::states::INITIAL;
use photopipe::upload::file_digest;
use photopipe::worker::JobResult;
use photopipe::{
    Intake, JobQueue, JobScheduler, ManualScheduler, ReplayRequest, UploadForm, UploadOutcome,
    WorkerPool,
};

use app::{App, CliResult};

#[derive(Parser)]
#[command(name = "photopipe", version, about = "Resumable media processing pipeline")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "PHOTOPIPE_CONFIG", default_value = "photopipe.json")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run stage jobs with a worker pool until interrupted
    Worker {
        /// Number of worker threads (defaults to the configured worker_count)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Accept a local file as an upload
    Import {
        #[arg(long)]
        uploader: i64,

        file: PathBuf,

        /// Declared SHA-1; computed from the file when omitted
        #[arg(long)]
        sha1: Option<String>,

        /// Declared size in bytes; taken from the file when omitted
        #[arg(long)]
        size: Option<u64>,

        /// Original filename; defaults to the file's own name
        #[arg(long)]
        name: Option<String>,

        /// Process the new record in this process instead of leaving the
        /// jobs to a worker
        #[arg(long)]
        foreground: bool,
    },

    /// Schedule records to run again from a stage
    Reprocess {
        ids: Vec<i64>,

        /// State code to restart from
        #[arg(long, default_value_t = INITIAL)]
        state: i32,

        /// Select every record
        #[arg(long)]
        all: bool,

        /// Select every record whose last stage failed
        #[arg(long)]
        failed: bool,

        /// Run the scheduled stages in this process
        #[arg(long)]
        foreground: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    photopipe::telemetry::init_logging(cli.json_logs)?;

    let app = App::load(&cli.config)?;

    match cli.command {
        Command::Worker { workers } => run_worker(&app, workers),
        Command::Import {
            uploader,
            file,
            sha1,
            size,
            name,
            foreground,
        } => run_import(&app, uploader, file, sha1, size, name, foreground),
        Command::Reprocess {
            ids,
            state,
            all,
            failed,
            foreground,
        } => {
            let request = ReplayRequest {
                ids,
                all,
                failed,
                state_code: state,
            };
            run_reprocess(&app, &request, foreground)
        }
    }
}

fn run_worker(app: &App, workers: Option<usize>) -> CliResult<()> {
    let worker_count = workers.unwrap_or(app.config.worker_count);
    if worker_count == 0 {
        return Err("--workers must be at least 1".into());
    }

    let queue = Arc::new(JobQueue::persistent(app.db.clone()));
    let machine = Arc::new(app.state_machine(queue.clone())?);

    let restored = queue.requeue_pending()?;
    if restored > 0 {
        info!("Re-delivered {} pending jobs", restored);
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))?;

    spawn_event_logger(app);

    let pool = WorkerPool::new(machine, queue, worker_count);
    while running.load(Ordering::SeqCst) {
        if let Some(result) = pool.recv_result_timeout(Duration::from_millis(500)) {
            report(&result);
        }
    }

    info!("Shutting down workers");
    pool.shutdown();
    pool.wait();
    Ok(())
}

/// Mirrors media events into the log as JSON at debug level.
fn spawn_event_logger(app: &App) {
    let mut events = app.events.subscribe();
    thread::spawn(move || loop {
        match events.blocking_recv() {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => tracing::debug!(event = %line, "media event"),
                Err(e) => warn!("Unserializable media event: {}", e),
            },
            Err(RecvError::Lagged(missed)) => warn!("Event logger skipped {} events", missed),
            Err(RecvError::Closed) => break,
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn run_import(
    app: &App,
    uploader: i64,
    file: PathBuf,
    sha1: Option<String>,
    size: Option<u64>,
    name: Option<String>,
    foreground: bool,
) -> CliResult<()> {
    let (computed_sha1, actual_size) = file_digest(&file)?;
    let name = name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let last_modified_ms = std::fs::metadata(&file)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_millis()).ok());

    // intake moves the file it accepts; stage a copy so the original stays
    let staged = tempfile::NamedTempFile::new_in(&app.config.media_root)?;
    std::fs::copy(&file, staged.path())?;

    let form = UploadForm {
        uploader_id: uploader,
        session_id: Uuid::new_v4(),
        sha1: sha1.unwrap_or(computed_sha1),
        size: size.unwrap_or(actual_size),
        last_modified_ms,
        name,
        mimetype: mime_guess::from_path(&file).first().map(|m| m.to_string()),
        file: staged.path().to_path_buf(),
    };

    let manual = Arc::new(ManualScheduler::new());
    let scheduler: Arc<dyn JobScheduler> = if foreground {
        manual.clone()
    } else {
        Arc::new(JobQueue::persistent(app.db.clone()))
    };

    let intake = Intake::new(app.records.clone(), app.content.clone(), scheduler.clone());
    match intake.accept(&form)? {
        UploadOutcome::Created(id) => println!("created {}", id),
        UploadOutcome::Duplicate(id) => println!("duplicate of {}", id),
    }

    if foreground {
        let machine = app.state_machine(scheduler)?;
        manual.run_until_idle(&machine).iter().for_each(report);
    }
    Ok(())
}

fn run_reprocess(app: &App, request: &ReplayRequest, foreground: bool) -> CliResult<()> {
    let manual = Arc::new(ManualScheduler::new());
    let scheduler: Arc<dyn JobScheduler> = if foreground {
        manual.clone()
    } else {
        Arc::new(JobQueue::persistent(app.db.clone()))
    };

    let machine = app.state_machine(scheduler)?;
    let scheduled = machine.reprocess(request)?;
    println!("scheduled {} records", scheduled);

    if foreground {
        manual.run_until_idle(&machine).iter().for_each(report);
    }
    Ok(())
}

fn report(result: &JobResult) {
    if result.success {
        info!("{} finished for record {}", result.name, result.record_id);
    } else {
        error!(
            "{} failed for record {}: {}",
            result.name,
            result.record_id,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
