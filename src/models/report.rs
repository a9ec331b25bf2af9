use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Done,
    Partial,
    Failed,
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyStatus::Done => "done",
            ApplyStatus::Partial => "partial",
            ApplyStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one schema-application run, persisted as JSON.
///
/// `total_statements` and `warnings` are only known once the file has been
/// parsed, so a run that aborts during setup leaves them out entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaApplyReport {
    pub status: ApplyStatus,
    pub timestamp: DateTime<Local>,
    pub statements_executed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_statements: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    pub errors: Vec<String>,
}

impl SchemaApplyReport {
    /// Report for a run that reached the end of the statement list.
    pub fn completed(
        statements_executed: usize,
        total_statements: usize,
        warnings: Vec<String>,
        errors: Vec<String>,
    ) -> Self {
        let status = if errors.is_empty() {
            ApplyStatus::Done
        } else {
            ApplyStatus::Partial
        };

        Self {
            status,
            timestamp: Local::now(),
            statements_executed,
            total_statements: Some(total_statements),
            warnings: Some(warnings),
            errors,
        }
    }

    /// Report for a run aborted before or outside the statement loop.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ApplyStatus::Failed,
            timestamp: Local::now(),
            statements_executed: 0,
            total_statements: None,
            warnings: None,
            errors: vec![message.into()],
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ApplyStatus::Done
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_without_errors_is_done() {
        let report = SchemaApplyReport::completed(3, 3, Vec::new(), Vec::new());
        assert_eq!(report.status, ApplyStatus::Done);
        assert!(report.is_done());
    }

    #[test]
    fn warnings_alone_keep_status_done() {
        let report = SchemaApplyReport::completed(
            2,
            3,
            vec!["Statement 2: relation \"a\" already exists".to_string()],
            Vec::new(),
        );
        assert_eq!(report.status, ApplyStatus::Done);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn any_error_makes_status_partial() {
        let report = SchemaApplyReport::completed(
            2,
            3,
            Vec::new(),
            vec!["Statement 3: syntax error".to_string()],
        );
        assert_eq!(report.status, ApplyStatus::Partial);
    }

    #[test]
    fn failed_report_omits_unknown_fields() {
        let report = SchemaApplyReport::failed("No such file or directory");
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["statements_executed"], 0);
        assert_eq!(value["errors"][0], "No such file or directory");
        assert!(value.get("total_statements").is_none());
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn status_displays_like_the_report() {
        for status in [ApplyStatus::Done, ApplyStatus::Partial, ApplyStatus::Failed] {
            let serialized = serde_json::to_value(status).unwrap();
            assert_eq!(serialized, status.to_string());
        }
    }
}
