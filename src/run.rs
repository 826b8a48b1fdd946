//! Per-invocation export record.

use crate::geometry::Canvas;
use crate::request::{ExportRequest, OutputKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// One export attempt, from request to outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRun {
    pub run_id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: OutputKind,
    pub scale: f64,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canvas: Option<Canvas>,
    pub bytes_written: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Rendering,
    Complete,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Rendering => write!(f, "rendering"),
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl ExportRun {
    pub fn new(request: &ExportRequest) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            input: request.input.clone(),
            output: request.output.clone(),
            kind: request.kind,
            scale: request.scale,
            status: RunStatus::Pending,
            started_at: now,
            updated_at: now,
            canvas: None,
            bytes_written: None,
            error: None,
        }
    }

    pub fn start_rendering(&mut self) {
        self.status = RunStatus::Rendering;
        self.updated_at = Utc::now();
    }

    pub fn mark_complete(&mut self, canvas: Canvas, bytes_written: usize) {
        self.status = RunStatus::Complete;
        self.updated_at = Utc::now();
        self.canvas = Some(canvas);
        self.bytes_written = Some(bytes_written);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = RunStatus::Failed;
        self.updated_at = Utc::now();
        self.error = Some(error);
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, RunStatus::Complete | RunStatus::Failed)
    }

    pub fn duration_ms(&self) -> Option<i64> {
        if self.is_finished() {
            Some(self.updated_at.signed_duration_since(self.started_at).num_milliseconds())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> ExportRequest {
        ExportRequest {
            input: PathBuf::from("/tmp/map.html"),
            output: PathBuf::from("/tmp/map.png"),
            kind: OutputKind::Png,
            scale: 2.0,
        }
    }

    #[test]
    fn test_new_run_is_pending() {
        let run = ExportRun::new(&request());
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.kind, OutputKind::Png);
        assert!(run.duration_ms().is_none());
        assert_eq!(run.run_id.get_version_num(), 4);
    }

    #[test]
    fn test_state_transitions() {
        let mut run = ExportRun::new(&request());

        run.start_rendering();
        assert_eq!(run.status, RunStatus::Rendering);
        assert!(!run.is_finished());

        run.mark_failed("boom".to_string());
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("boom"));
        assert!(run.duration_ms().unwrap() >= 0);

        let canvas = Canvas {
            x: -20.0,
            y: -20.0,
            width: 140.0,
            height: 90.0,
        };
        run.mark_complete(canvas, 1024);
        assert_eq!(run.status, RunStatus::Complete);
        assert_eq!(run.canvas, Some(canvas));
        assert_eq!(run.bytes_written, Some(1024));
        assert!(run.error.is_none());
    }

    #[test]
    fn test_serializes_lowercase_enums() {
        let mut run = ExportRun::new(&request());
        run.mark_failed("selector timed out".to_string());

        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "png");
        assert_eq!(json["error"], "selector timed out");
        assert_eq!(json["run_id"], run.run_id.to_string());

        let back: ExportRun = serde_json::from_value(json).unwrap();
        assert_eq!(back.run_id, run.run_id);
    }
}
