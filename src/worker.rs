use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use eframe::egui;

use crate::data::model::Dataset;
use crate::query::pipeline::{interpret_query, process_upload, QueryOutcome, UploadOutcome};
use crate::services::Services;

// ---------------------------------------------------------------------------
// Background jobs
// ---------------------------------------------------------------------------

pub enum Job {
    Upload { file_name: String, bytes: Vec<u8> },
    Query { dataset: Arc<Dataset>, query: String },
}

pub enum JobResult {
    Uploaded(Result<UploadOutcome, String>),
    Answered(Result<QueryOutcome, String>),
}

/// Runs pipeline jobs off the UI thread. The UI keeps at most one in flight.
pub struct Worker {
    services: Services,
    tx: Sender<JobResult>,
    rx: Receiver<JobResult>,
}

impl Worker {
    pub fn new(services: Services) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { services, tx, rx }
    }

    /// Run `job` on a fresh thread and wake the UI when it finishes.
    pub fn submit(&self, job: Job, ctx: &egui::Context) {
        let services = self.services.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        thread::spawn(move || {
            let result = run(&services, job);
            // The receiver only disappears when the app is closing.
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    /// Next finished job, if any.
    pub fn poll(&self) -> Option<JobResult> {
        self.rx.try_recv().ok()
    }
}

fn run(services: &Services, job: Job) -> JobResult {
    match job {
        Job::Upload { file_name, bytes } => JobResult::Uploaded(
            process_upload(services, &file_name, &bytes).map_err(|e| {
                log::error!("Upload of {file_name} failed: {e:#}");
                format!("{e:#}")
            }),
        ),
        Job::Query { dataset, query } => JobResult::Answered(
            interpret_query(services, &dataset, &query).map_err(|e| {
                log::error!("Query failed: {e:#}");
                format!("{e:#}")
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::services::fakes::{FixedEntities, MemoryStore, ScriptedText};

    fn services() -> Services {
        Services {
            storage: Arc::new(MemoryStore::default()),
            entities: Arc::new(FixedEntities(Vec::new())),
            text: Arc::new(ScriptedText::new("A small table.")),
        }
    }

    #[test]
    fn submitted_upload_comes_back_through_poll() {
        let worker = Worker::new(services());
        let ctx = egui::Context::default();
        worker.submit(
            Job::Upload {
                file_name: "data.csv".to_string(),
                bytes: b"A,B\n1,2\n".to_vec(),
            },
            &ctx,
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(r) = worker.poll() {
                break r;
            }
            assert!(Instant::now() < deadline, "worker did not answer");
            thread::sleep(Duration::from_millis(10));
        };
        let JobResult::Uploaded(Ok(outcome)) = result else {
            panic!("expected a successful upload");
        };
        assert_eq!(outcome.summary, "A small table.");
    }

    #[test]
    fn failures_are_rendered_as_messages() {
        let result = run(
            &services(),
            Job::Upload {
                file_name: "notes.txt".to_string(),
                bytes: Vec::new(),
            },
        );
        let JobResult::Uploaded(Err(msg)) = result else {
            panic!("expected a failed upload");
        };
        assert!(msg.contains("Unsupported file type"));
    }
}
