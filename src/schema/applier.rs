use super::persist::{append_error_log, write_report};
use super::{
    ApplyError, SplitMode, StatementErrorKind, StatementExecutor, classify, split_statements,
};
use crate::models::SchemaApplyReport;
use std::future::Future;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

const MESSAGE_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ApplyPaths {
    pub schema: PathBuf,
    pub report: PathBuf,
    pub error_log: PathBuf,
}

/// Runs every statement in order on one connection. A failing statement is
/// recorded and the loop moves on; nothing is retried.
pub async fn apply_statements<E: StatementExecutor>(
    executor: &mut E,
    statements: &[String],
) -> SchemaApplyReport {
    let total = statements.len();
    let mut executed = 0;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for (offset, statement) in statements.iter().enumerate() {
        let index = offset + 1;
        match executor.execute(statement).await {
            Ok(()) => {
                executed += 1;
                tracing::info!("[{}/{}] executed", index, total);
            }
            Err(failure) => {
                let message = format!(
                    "Statement {}: {}",
                    index,
                    truncate(failure.message.trim(), MESSAGE_LIMIT)
                );
                match classify(&failure) {
                    StatementErrorKind::AlreadyExists => {
                        tracing::warn!("[{}/{}] already exists: {}", index, total, message);
                        warnings.push(message);
                    }
                    StatementErrorKind::Other => {
                        tracing::error!("[{}/{}] failed: {}", index, total, message);
                        errors.push(message);
                    }
                }
            }
        }
    }

    SchemaApplyReport::completed(executed, total, warnings, errors)
}

/// Reads the schema file, connects, applies it and persists the report.
///
/// Setup failures produce a `failed` report, then an error-log entry. The
/// returned error is reserved for failing to persist the report itself,
/// which is recorded in the error log as well.
pub async fn apply_schema_file<E, F, Fut>(
    paths: &ApplyPaths,
    mode: SplitMode,
    connect: F,
) -> Result<SchemaApplyReport, ApplyError>
where
    E: StatementExecutor,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<E, ApplyError>>,
{
    let (report, fatal) = match run(paths, mode, connect).await {
        Ok(report) => (report, None),
        Err(err) => {
            tracing::error!("Fatal error: {}", err);
            (SchemaApplyReport::failed(err.to_string()), Some(err))
        }
    };

    if let Err(err) = write_report(&paths.report, &report) {
        tracing::error!("Could not save report: {}", err);
        if let Some(fatal) = &fatal {
            record_fatal(&paths.error_log, fatal, report.timestamp);
        }
        record_fatal(&paths.error_log, &err, Local::now());
        return Err(err);
    }
    tracing::info!("Report saved to: {}", paths.report.display());

    if let Some(fatal) = &fatal {
        record_fatal(&paths.error_log, fatal, report.timestamp);
    }
    Ok(report)
}

fn record_fatal(error_log: &Path, err: &ApplyError, timestamp: DateTime<Local>) {
    if let Err(log_err) = append_error_log(error_log, &err.to_string(), timestamp) {
        tracing::error!("Could not record fatal error: {}", log_err);
    }
}

async fn run<E, F, Fut>(
    paths: &ApplyPaths,
    mode: SplitMode,
    connect: F,
) -> Result<SchemaApplyReport, ApplyError>
where
    E: StatementExecutor,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<E, ApplyError>>,
{
    let sql = std::fs::read_to_string(&paths.schema).map_err(|source| ApplyError::ReadSchema {
        path: paths.schema.clone(),
        source,
    })?;
    tracing::info!(
        "Schema file {} loaded ({} characters)",
        paths.schema.display(),
        sql.chars().count()
    );

    let statements = split_statements(&sql, mode);
    tracing::info!("Parsed {} statement(s) with {:?} splitter", statements.len(), mode);

    let mut executor = connect().await?;
    let report = apply_statements(&mut executor, &statements).await;
    executor.close().await;

    Ok(report)
}

fn truncate(message: &str, limit: usize) -> String {
    message.chars().take(limit).collect()
}
