//! In-memory channel and output directory for driving `MediaJobClient`
//! without a ComfyUI server.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adgen_comfyui::client::ComfyUIClientError;
use adgen_comfyui::messages::{parse_message, ComfyUIMessage};
use adgen_comfyui::{
    EventStream, JobChannel, JobStage, JobSubmission, ListedFile, MediaClientConfig, MediaJobError,
    OutputLister,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::time::Instant;

pub const OUTPUT_ROOT: &str = "/out";

pub fn config() -> MediaClientConfig {
    MediaClientConfig {
        base_output_dir: PathBuf::from(OUTPUT_ROOT),
        ..MediaClientConfig::default()
    }
}

pub fn listed(name: &str, created_secs: i64) -> ListedFile {
    ListedFile {
        name: name.to_string(),
        created: Utc.timestamp_opt(created_secs, 0).unwrap(),
    }
}

pub fn executed(node: &str) -> ComfyUIMessage {
    parse_message(&format!(r#"{{"type":"executed","data":{{"node":"{node}","output":{{}}}}}}"#))
        .unwrap()
}

pub fn progress(value: i32, max: i32) -> ComfyUIMessage {
    parse_message(&format!(
        r#"{{"type":"progress","data":{{"value":{value},"max":{max}}}}}"#
    ))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Output directory
// ---------------------------------------------------------------------------

struct Entry {
    visible_at: Instant,
    file: ListedFile,
}

/// Output directory whose files can be scheduled to appear later.
#[derive(Clone, Default)]
pub struct FakeLister {
    dirs: Arc<Mutex<HashMap<PathBuf, Vec<Entry>>>>,
    ensured: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeLister {
    pub fn add(&self, dir: &Path, file: ListedFile) {
        self.add_after(dir, Duration::ZERO, file);
    }

    pub fn add_after(&self, dir: &Path, delay: Duration, file: ListedFile) {
        self.dirs
            .lock()
            .unwrap()
            .entry(dir.to_path_buf())
            .or_default()
            .push(Entry {
                visible_at: Instant::now() + delay,
                file,
            });
    }

    pub fn ensured(&self) -> Vec<PathBuf> {
        self.ensured.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputLister for FakeLister {
    async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()> {
        self.ensured.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    async fn list(&self, dir: &Path, extension: &str) -> std::io::Result<Vec<ListedFile>> {
        let now = Instant::now();
        let dirs = self.dirs.lock().unwrap();
        Ok(dirs
            .get(dir)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.visible_at <= now)
                    .filter(|e| {
                        Path::new(&e.file.name)
                            .extension()
                            .and_then(|x| x.to_str())
                            .is_some_and(|x| x.eq_ignore_ascii_case(extension))
                    })
                    .map(|e| e.file.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Files the fake server writes once a job is submitted.
pub struct Delivery {
    pub dir: PathBuf,
    pub delay: Duration,
    pub file: ListedFile,
}

/// Job channel that records submissions and replays scripted events.
#[derive(Clone)]
pub struct FakeChannel {
    lister: FakeLister,
    script: Vec<ComfyUIMessage>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    reject: Option<(u16, String)>,
    refuse_events: bool,
    submissions: Arc<Mutex<Vec<JobSubmission>>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl FakeChannel {
    pub fn new(lister: FakeLister, script: Vec<ComfyUIMessage>) -> Self {
        Self {
            lister,
            script,
            deliveries: Arc::default(),
            reject: None,
            refuse_events: false,
            submissions: Arc::default(),
            opened: Arc::default(),
            closed: Arc::default(),
        }
    }

    pub fn deliver(self, dir: &Path, delay: Duration, file: ListedFile) -> Self {
        self.deliveries.lock().unwrap().push(Delivery {
            dir: dir.to_path_buf(),
            delay,
            file,
        });
        self
    }

    pub fn rejecting(mut self, status: u16, body: &str) -> Self {
        self.reject = Some((status, body.to_string()));
        self
    }

    pub fn refusing_events(mut self) -> Self {
        self.refuse_events = true;
        self
    }

    pub fn submitted(&self) -> Vec<JobSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobChannel for FakeChannel {
    type Events = FakeEvents;

    async fn open_events(&self, _session_id: &str) -> Result<FakeEvents, MediaJobError> {
        if self.refuse_events {
            return Err(MediaJobError::Connection {
                stage: JobStage::OpeningEvents,
                message: "connection refused".to_string(),
            });
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeEvents {
            queue: self.script.iter().cloned().collect(),
            closed: Arc::clone(&self.closed),
        })
    }

    async fn submit(&self, submission: &JobSubmission) -> Result<(), MediaJobError> {
        if let Some((status, body)) = &self.reject {
            return Err(MediaJobError::Submission {
                status: *status,
                body: body.clone(),
            });
        }
        self.submissions.lock().unwrap().push(submission.clone());
        for d in self.deliveries.lock().unwrap().drain(..) {
            self.lister.add_after(&d.dir, d.delay, d.file);
        }
        Ok(())
    }
}

pub struct FakeEvents {
    queue: VecDeque<ComfyUIMessage>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl EventStream for FakeEvents {
    async fn next_message(&mut self) -> Result<Option<ComfyUIMessage>, ComfyUIClientError> {
        Ok(self.queue.pop_front())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
