//! MamaSafe: GDM risk assessment with care-worker escalation
//!
//! Command-line entry point. Results are printed to stdout as JSON; logs go
//! to stderr or a file so they never mix with command output.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mamasafe::adapters::model::ModelClassifier;
use mamasafe::adapters::sanitize::SanitizingMakeWriter;
use mamasafe::adapters::sqlite::SqliteStorage;
use mamasafe::application::{
    AssessmentService, CareTeamService, EscalationDispatcher, DEFAULT_PAGE_SIZE,
};
use mamasafe::config::{Config, LogMode};
use mamasafe::domain::GENERAL_NOTIFICATION;
use mamasafe::{MamaSafeError, PredictionInput};

#[derive(Debug, Parser)]
#[command(
    name = "mamasafe",
    version,
    about = "Gestational diabetes risk assessment with care-worker escalation",
    long_about = "Assesses GDM risk from maternal vitals and alerts the assigned care worker\n\
        when the risk is High. Results are printed to stdout as JSON.\n\n\
        Configuration comes from MAMASAFE_* environment variables."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Assess vitals from a JSON request
    Assess {
        /// Request file, or '-' for stdin
        source: String,
    },

    /// Past assessments for a patient, newest first
    History {
        patient_id: String,
        /// Maximum records (defaults to MAMASAFE_HISTORY_LIMIT)
        limit: Option<usize>,
    },

    /// Most recent assessment for a patient
    Latest { patient_id: String },

    /// Assign a patient to a care worker, replacing any earlier assignment
    Assign { patient_id: String, worker_id: String },

    /// Patients assigned to a care worker
    Patients { worker_id: String },

    /// Send a notification to a care worker's inbox
    Notify {
        worker_id: String,
        patient_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        #[arg(long = "type", default_value = GENERAL_NOTIFICATION)]
        notification_type: String,
    },

    /// A page of a care worker's notifications, newest first
    Notifications {
        worker_id: String,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
    },

    /// Mark a notification as read
    MarkRead { notification_id: String },

    /// Active classifier and storage summary
    Status,
}

/// Malformed request body.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct RequestError(String);

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(source: &str) -> Result<PredictionInput> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))?
    };

    serde_json::from_str(&raw)
        .map_err(|e| RequestError(format!("invalid assessment request: {e}")).into())
}

type SqliteAssessmentService =
    AssessmentService<ModelClassifier, SqliteStorage, SqliteStorage, SqliteStorage>;

fn assessment_service(
    config: &Config,
    storage: &Arc<SqliteStorage>,
    model: Option<ModelClassifier>,
) -> SqliteAssessmentService {
    let escalation = EscalationDispatcher::new(Arc::clone(storage), Arc::clone(storage));
    AssessmentService::new(model.map(Arc::new), Arc::clone(storage), escalation)
        .with_bounds(config.vital_bounds())
}

fn load_model(config: &Config) -> Option<ModelClassifier> {
    ModelClassifier::load_optional(&config.model_path, config.model_sha256.as_deref())
}

fn run(config: &Config, command: Command) -> Result<()> {
    let storage = Arc::new(
        SqliteStorage::new(&config.db_path)
            .with_context(|| format!("Failed to open database {:?}", config.db_path))?,
    );
    let care_team = CareTeamService::new(Arc::clone(&storage), Arc::clone(&storage));

    match command {
        Command::Assess { source } => {
            let input = read_input(&source)?;
            let service = assessment_service(config, &storage, load_model(config));
            print_json(&service.assess(&input)?)
        }
        Command::History { patient_id, limit } => {
            let service = assessment_service(config, &storage, None);
            let limit = limit.unwrap_or(config.history_limit);
            print_json(&service.history(&patient_id, limit)?)
        }
        Command::Latest { patient_id } => {
            let service = assessment_service(config, &storage, None);
            print_json(&service.latest(&patient_id)?)
        }
        Command::Assign {
            patient_id,
            worker_id,
        } => {
            care_team.assign_patient(&patient_id, &worker_id)?;
            print_json(&serde_json::json!({
                "patient_id": patient_id.trim(),
                "worker_id": worker_id.trim(),
            }))
        }
        Command::Patients { worker_id } => {
            let patients = care_team.patients_for_worker(&worker_id)?;
            print_json(&serde_json::json!({
                "worker_id": worker_id.trim(),
                "patients": patients,
            }))
        }
        Command::Notify {
            worker_id,
            patient_id,
            title,
            message,
            notification_type,
        } => print_json(&care_team.send_notification(
            &worker_id,
            &patient_id,
            &title,
            &message,
            &notification_type,
        )?),
        Command::Notifications {
            worker_id,
            unread,
            offset,
            limit,
        } => {
            let page = care_team.notifications(&worker_id, unread, offset, limit)?;
            print_json(&serde_json::json!({
                "total_count": page.total_count,
                "offset": page.offset,
                "limit": page.limit,
                "has_more": page.has_more,
                "next_offset": page.next_offset(),
                "prev_offset": page.prev_offset(),
                "notifications": page.items,
            }))
        }
        Command::MarkRead { notification_id } => {
            let updated = care_team.mark_read(&notification_id)?;
            print_json(&serde_json::json!({
                "notification_id": notification_id,
                "updated": updated,
            }))
        }
        Command::Status => {
            let model = load_model(config);
            let model_sha256 = model.as_ref().map(|m| m.sha256().to_string());
            let service = assessment_service(config, &storage, model);
            print_json(&serde_json::json!({
                "classifier": service.classifier_status(),
                "model_sha256": model_sha256,
                "stored_predictions": storage.count_predictions()?,
            }))
        }
    }
}

/// 2 for caller mistakes, 1 for everything else. Clap exits with 2 on its own
/// for malformed command lines.
fn exit_code(err: &anyhow::Error) -> u8 {
    let client = err.downcast_ref::<RequestError>().is_some()
        || err
            .downcast_ref::<MamaSafeError>()
            .is_some_and(MamaSafeError::is_client_error);
    if client {
        2
    } else {
        1
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging. Stdout is reserved for command output.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
            {
                Ok(file) => tracing_appender::non_blocking(file),
                Err(e) => {
                    eprintln!("error: cannot open log file {:?}: {e}", config.log_file);
                    return ExitCode::FAILURE;
                }
            }
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    match run(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(MamaSafeError::Validation(v)) = e.downcast_ref::<MamaSafeError>() {
                // Violations are part of the command's answer, not just a log line.
                if let Ok(json) = serde_json::to_string_pretty(v) {
                    println!("{json}");
                }
            }
            tracing::error!("Command failed: {:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
