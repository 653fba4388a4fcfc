/*!
 * Background translation job runner.
 *
 * A job takes a presentation file through extract, mask, translate, unmask,
 * reinsert and save. It runs on its own tokio task and reports progress
 * through an mpsc channel, so a frontend (the CLI progress bar here) can
 * follow along without touching the document. Cancellation is cooperative:
 * the flag is checked between units, and a cancelled job never writes an
 * output file.
 */

use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::core::TranslationService;
use crate::document::{
    PptxDocument, TranslatedUnit, UnitKind, UnitLocation, extract_units, reinsert_units,
};
use crate::errors::ProviderError;
use crate::masking::{mask_unit, unmask_unit};

// @const: Event channel capacity; the runner awaits sends so nothing is lost
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle state of a translation job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Job has been created but not started processing
    Pending,
    /// Job is translating units
    Running,
    /// Job finished and the output file was written
    Completed,
    /// Job aborted on a fatal error, no output file
    Failed,
    /// Job was cancelled, no output file
    Cancelled,
}

/// Everything a job needs to run
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Path of the presentation to translate
    pub input_path: PathBuf,
    /// Path the translated copy is written to
    pub output_path: PathBuf,
    /// Source language code, or "auto"
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

/// Final accounting of a completed job
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Where the translated file was written
    pub output_path: PathBuf,
    /// Number of translatable units found
    pub total_units: usize,
    /// Units successfully translated
    pub translated_units: usize,
    /// Units left with their original text after exhausted retries
    pub failed_units: usize,
    /// Units skipped without a request (nothing translatable after masking)
    pub skipped_units: usize,
    /// Placeholder warnings emitted during unmasking
    pub warnings: usize,
    /// Wall-clock duration of the job
    pub elapsed: Duration,
}

/// Progress notifications emitted by a running job
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Extraction finished, translation is starting
    Started {
        /// Translatable units found in the presentation
        total_units: usize,
        /// Slides in the presentation
        slide_count: usize,
    },
    /// Translation moved on to a new slide
    SlideStarted {
        /// 1-based slide number
        slide: usize,
    },
    /// One unit was translated
    UnitTranslated {
        /// 1-based position within the job
        index: usize,
        /// Total unit count
        total: usize,
        /// Where the unit lives
        location: UnitLocation,
    },
    /// One unit kept its original text after exhausted retries
    UnitFailed {
        /// 1-based position within the job
        index: usize,
        /// Total unit count
        total: usize,
        /// Where the unit lives
        location: UnitLocation,
        /// What went wrong
        message: String,
    },
    /// A non-fatal placeholder problem was repaired
    Warning {
        /// Where the unit lives
        location: UnitLocation,
        /// Description of the repair
        message: String,
    },
    /// The job finished and the output file exists
    Completed {
        /// Final accounting
        summary: JobSummary,
    },
    /// The job aborted; no output file was written
    Failed {
        /// Fatal error description
        message: String,
    },
    /// The job was cancelled; no output file was written
    Cancelled {
        /// Units translated before cancellation
        translated_units: usize,
    },
}

/// Cancellation handle that can be cloned and moved across tasks
#[derive(Debug, Clone)]
pub struct JobCanceller {
    flag: Arc<AtomicBool>,
}

impl JobCanceller {
    /// Request cooperative cancellation of the job
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Handle to a spawned translation job
pub struct JobHandle {
    /// Progress event stream
    pub events: mpsc::Receiver<ProgressEvent>,
    canceller: JobCanceller,
    state: Arc<parking_lot::RwLock<JobState>>,
    join: JoinHandle<()>,
}

impl JobHandle {
    /// A cancellation handle for this job
    pub fn canceller(&self) -> JobCanceller {
        self.canceller.clone()
    }

    /// Current lifecycle state of the job
    pub fn state(&self) -> JobState {
        *self.state.read()
    }

    /// Wait for the job task to finish and return its terminal state
    pub async fn join(self) -> JobState {
        let _ = self.join.await;
        let state = *self.state.read();
        state
    }
}

/// Spawns and runs translation jobs
pub struct JobRunner;

impl JobRunner {
    /// Spawn a job on a background task and return its handle
    pub fn spawn(service: TranslationService, request: JobRequest) -> JobHandle {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let flag = Arc::new(AtomicBool::new(false));
        let state = Arc::new(parking_lot::RwLock::new(JobState::Pending));

        let canceller = JobCanceller { flag: Arc::clone(&flag) };
        let task_canceller = canceller.clone();
        let task_state = Arc::clone(&state);

        let join = tokio::spawn(async move {
            let final_state = run_job(service, request, tx, task_canceller, &task_state).await;
            *task_state.write() = final_state;
        });

        JobHandle {
            events: rx,
            canceller,
            state,
            join,
        }
    }
}

/// Pause between units: the configured delay, or longer when the active
/// provider carries a requests-per-minute limit
fn unit_delay(config: &crate::app_config::TranslationConfig) -> Duration {
    let base = config.common.rate_limit_delay_ms;
    let from_rate = config
        .get_rate_limit()
        .filter(|rpm| *rpm > 0)
        .map(|rpm| 60_000 / rpm as u64)
        .unwrap_or(0);

    Duration::from_millis(base.max(from_rate))
}

/// Execute one job end to end; returns the terminal state
async fn run_job(
    service: TranslationService,
    request: JobRequest,
    tx: mpsc::Sender<ProgressEvent>,
    canceller: JobCanceller,
    state: &parking_lot::RwLock<JobState>,
) -> JobState {
    let started_at = Instant::now();

    let mut document = match PptxDocument::open(&request.input_path) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = tx.send(ProgressEvent::Failed { message: e.to_string() }).await;
            return JobState::Failed;
        }
    };

    let units = match extract_units(&document) {
        Ok(units) => units,
        Err(e) => {
            let _ = tx.send(ProgressEvent::Failed { message: e.to_string() }).await;
            return JobState::Failed;
        }
    };

    *state.write() = JobState::Running;

    let total = units.len();
    let _ = tx
        .send(ProgressEvent::Started {
            total_units: total,
            slide_count: document.slide_count(),
        })
        .await;

    info!(
        "Translating {} units across {} slides: {:?}",
        total,
        document.slide_count(),
        request.input_path
    );

    let delay = unit_delay(service.config());

    let mut translated: Vec<TranslatedUnit> = Vec::with_capacity(total);
    let mut failed_units = 0usize;
    let mut skipped_units = 0usize;
    let mut warning_count = 0usize;
    let mut current_slide = 0usize;

    for (position, unit) in units.iter().enumerate() {
        if canceller.is_cancelled() {
            info!("Job cancelled after {} of {} units", translated.len(), total);
            let _ = tx
                .send(ProgressEvent::Cancelled { translated_units: translated.len() })
                .await;
            return JobState::Cancelled;
        }

        // Notes units reuse slide numbers; only body units advance the slide
        if unit.kind == UnitKind::Body && unit.location.slide != current_slide {
            current_slide = unit.location.slide;
            let _ = tx.send(ProgressEvent::SlideStarted { slide: current_slide }).await;
        }

        let index = position + 1;
        let (masked, mask) = mask_unit(unit);

        if !mask.has_content() {
            skipped_units += 1;
            continue;
        }

        match service
            .translate_text(&masked, &request.source_language, &request.target_language)
            .await
        {
            Ok(response) => {
                let (runs, warnings) = unmask_unit(&response, &mask);

                for warning in &warnings {
                    warn!("{}: {}", unit.location, warning);
                    warning_count += 1;
                    let _ = tx
                        .send(ProgressEvent::Warning {
                            location: unit.location.clone(),
                            message: warning.to_string(),
                        })
                        .await;
                }

                translated.push(TranslatedUnit {
                    location: unit.location.clone(),
                    runs,
                });

                let _ = tx
                    .send(ProgressEvent::UnitTranslated {
                        index,
                        total,
                        location: unit.location.clone(),
                    })
                    .await;
            }
            Err(e @ ProviderError::AuthenticationError(_)) => {
                // No point continuing with credentials the API rejects
                let _ = tx.send(ProgressEvent::Failed { message: e.to_string() }).await;
                return JobState::Failed;
            }
            Err(e) => {
                warn!("{}: translation failed, keeping original text: {}", unit.location, e);
                failed_units += 1;
                let _ = tx
                    .send(ProgressEvent::UnitFailed {
                        index,
                        total,
                        location: unit.location.clone(),
                        message: e.to_string(),
                    })
                    .await;
            }
        }

        if position + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    // Last chance to honor cancellation before the file is written
    if canceller.is_cancelled() {
        let _ = tx
            .send(ProgressEvent::Cancelled { translated_units: translated.len() })
            .await;
        return JobState::Cancelled;
    }

    if let Err(e) = reinsert_units(&mut document, &translated) {
        let _ = tx.send(ProgressEvent::Failed { message: e.to_string() }).await;
        return JobState::Failed;
    }

    if let Err(e) = document.save(&request.output_path) {
        let _ = tx.send(ProgressEvent::Failed { message: e.to_string() }).await;
        return JobState::Failed;
    }

    let summary = JobSummary {
        output_path: request.output_path.clone(),
        total_units: total,
        translated_units: translated.len(),
        failed_units,
        skipped_units,
        warnings: warning_count,
        elapsed: started_at.elapsed(),
    };

    info!(
        "Job finished: {}/{} units translated, {} failed, {} skipped, {} warnings, {:?}",
        summary.translated_units, summary.total_units, summary.failed_units,
        summary.skipped_units, summary.warnings, summary.elapsed
    );

    let _ = tx.send(ProgressEvent::Completed { summary }).await;
    JobState::Completed
}
