use super::ApplyError;
use crate::models::SchemaApplyReport;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub fn write_report(path: &Path, report: &SchemaApplyReport) -> Result<(), ApplyError> {
    let payload = serde_json::to_string_pretty(report)?;
    ensure_parent(path)?;
    fs::write(path, payload).map_err(|source| ApplyError::Persist {
        path: path.to_path_buf(),
        source,
    })
}

pub fn append_error_log(
    path: &Path,
    message: &str,
    timestamp: DateTime<Local>,
) -> Result<(), ApplyError> {
    ensure_parent(path)?;
    let persist_err = |source| ApplyError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(persist_err)?;
    writeln!(file, "Error applying schema: {}", message).map_err(persist_err)?;
    writeln!(file, "Timestamp: {}", timestamp.to_rfc3339()).map_err(persist_err)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), ApplyError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ApplyError::Persist {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
