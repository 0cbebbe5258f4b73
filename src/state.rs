use std::sync::Arc;

use crate::data::model::Dataset;
use crate::query::pipeline::{QueryOutcome, UploadOutcome};
use crate::worker::JobResult;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the background worker is doing, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Busy {
    Uploading(String),
    Querying,
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Latest successful upload (None until the user loads a file).
    pub upload: Option<UploadOutcome>,

    /// Text currently in the query box.
    pub query: String,

    /// Result of the last submitted query.
    pub answer: Option<QueryOutcome>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Set while a job is running; new jobs are refused until it clears.
    pub busy: Option<Busy>,
}

impl AppState {
    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.upload.as_ref().map(|u| &u.dataset)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_some()
    }

    /// A query can go out once a dataset is loaded, the box is non-empty
    /// and nothing else is running.
    pub fn can_submit_query(&self) -> bool {
        !self.is_busy() && self.dataset().is_some() && !self.query.trim().is_empty()
    }

    pub fn begin_upload(&mut self, file_name: &str) {
        self.busy = Some(Busy::Uploading(file_name.to_string()));
        self.status_message = None;
    }

    /// The previous answer is dropped so a failed query never shows a stale chart.
    pub fn begin_query(&mut self) {
        self.busy = Some(Busy::Querying);
        self.status_message = None;
        self.answer = None;
    }

    /// Fold a finished job into the state.
    pub fn apply(&mut self, result: JobResult) {
        self.busy = None;
        match result {
            JobResult::Uploaded(Ok(outcome)) => {
                self.upload = Some(outcome);
                self.answer = None;
            }
            JobResult::Answered(Ok(outcome)) => {
                self.answer = Some(outcome);
            }
            JobResult::Uploaded(Err(msg)) | JobResult::Answered(Err(msg)) => {
                self.status_message = Some(format!("Error: {msg}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Value};
    use crate::query::QueryError;

    fn upload() -> UploadOutcome {
        UploadOutcome {
            file_name: "data.csv".to_string(),
            dataset: Arc::new(
                Dataset::from_columns(vec![Column::new("a", vec![Value::Integer(1)])]).unwrap(),
            ),
            statistics: Vec::new(),
            summary: "one number".to_string(),
        }
    }

    #[test]
    fn queries_need_a_dataset_and_text() {
        let mut state = AppState::default();
        state.query = "bar chart of a and b".to_string();
        assert!(!state.can_submit_query());

        state.apply(JobResult::Uploaded(Ok(upload())));
        assert!(state.can_submit_query());

        state.begin_query();
        assert!(!state.can_submit_query());

        state.query = "   ".to_string();
        state.busy = None;
        assert!(!state.can_submit_query());
    }

    #[test]
    fn new_upload_clears_previous_answer() {
        let mut state = AppState::default();
        state.apply(JobResult::Answered(Ok(QueryOutcome {
            attributes: vec![],
            determined_chart_type: None,
            figure: Err(QueryError::NotEnoughAttributes),
        })));
        assert!(state.answer.is_some());

        state.begin_upload("data.csv");
        assert_eq!(state.busy, Some(Busy::Uploading("data.csv".to_string())));
        state.apply(JobResult::Uploaded(Ok(upload())));
        assert!(state.answer.is_none());
        assert!(state.busy.is_none());
    }

    #[test]
    fn failures_keep_the_loaded_dataset() {
        let mut state = AppState::default();
        state.apply(JobResult::Uploaded(Ok(upload())));
        state.begin_upload("notes.txt");
        state.apply(JobResult::Uploaded(Err("Unsupported file type: .txt".to_string())));
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error: Unsupported file type: .txt")
        );
        assert!(state.dataset().is_some());
    }

    #[test]
    fn failed_query_does_not_show_previous_answer() {
        let mut state = AppState::default();
        state.apply(JobResult::Uploaded(Ok(upload())));
        state.apply(JobResult::Answered(Ok(QueryOutcome {
            attributes: vec!["a".to_string(), "a".to_string()],
            determined_chart_type: Some("line".to_string()),
            figure: Err(QueryError::NotEnoughAttributes),
        })));
        assert!(state.answer.is_some());

        state.begin_query();
        state.apply(JobResult::Answered(Err(
            "text generation returned HTTP 429: slow down".to_string(),
        )));
        assert!(state.answer.is_none());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Error: text generation returned HTTP 429: slow down")
        );
    }
}
