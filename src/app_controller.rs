use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::{JobRequest, JobRunner, ProgressEvent, TranslationService};

// @module: Application controller for presentation translation

// @const: Issues log file name, written next to the translated output
const ISSUES_LOG_FILENAME: &str = "decktrans.issues.log";

/// Main application controller for presentation translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.target_language.is_empty()
    }

    /// Directory translated files are written to for a given input file.
    ///
    /// Configured directory wins; otherwise an "outputs" directory next to
    /// the input file, matching what users of the original tool expect.
    pub fn resolve_output_dir(&self, input_file: &Path) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => input_file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("outputs"),
        }
    }

    /// Run the main workflow for a single presentation file
    pub async fn run(&self, input_file: PathBuf, force_overwrite: bool) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, &multi_progress, force_overwrite)
            .await
    }

    /// Run the translation of one file with progress reporting
    async fn run_with_progress(
        &self,
        input_file: PathBuf,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<()> {
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        if !FileManager::is_pptx_file(&input_file) {
            return Err(anyhow!("Input file is not a PPTX presentation: {:?}", input_file));
        }

        let output_dir = self.resolve_output_dir(&input_file);
        FileManager::ensure_dir(&output_dir)?;

        let output_path = FileManager::generate_output_path(
            &input_file,
            &output_dir,
            &self.config.target_language,
        );

        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(());
        }

        info!(
            "decktrans: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let service = TranslationService::new(self.config.translation.clone())?;

        let request = JobRequest {
            input_path: input_file.clone(),
            output_path: output_path.clone(),
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
        };

        let mut handle = JobRunner::spawn(service, request);

        // Ctrl-C requests cooperative cancellation instead of killing the run
        let canceller = handle.canceller();
        let ctrl_c_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancellation requested, finishing current unit");
                canceller.cancel();
            }
        });

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let mut issues: Vec<String> = Vec::new();
        let mut outcome: Option<Result<()>> = None;

        while let Some(event) = handle.events.recv().await {
            match event {
                ProgressEvent::Started { total_units, slide_count } => {
                    info!("Found {} text units across {} slides", total_units, slide_count);
                    progress_bar.set_length(total_units as u64);
                }
                ProgressEvent::SlideStarted { slide } => {
                    progress_bar.set_message(format!("Slide {}", slide));
                }
                ProgressEvent::UnitTranslated { index, .. } => {
                    progress_bar.set_position(index as u64);
                }
                ProgressEvent::UnitFailed { index, location, message, .. } => {
                    progress_bar.set_position(index as u64);
                    issues.push(format!("ERROR {}: {}", location, message));
                }
                ProgressEvent::Warning { location, message } => {
                    issues.push(format!("WARN {}: {}", location, message));
                }
                ProgressEvent::Completed { summary } => {
                    progress_bar.finish_and_clear();
                    info!(
                        "Translation complete: {}/{} units, {} kept original text, {} warnings, took {:.1}s",
                        summary.translated_units,
                        summary.total_units,
                        summary.failed_units,
                        summary.warnings,
                        summary.elapsed.as_secs_f64()
                    );
                    info!("Saved translated copy to {:?}", summary.output_path);
                    outcome = Some(Ok(()));
                }
                ProgressEvent::Failed { message } => {
                    progress_bar.finish_and_clear();
                    outcome = Some(Err(anyhow!("Translation failed: {}", message)));
                }
                ProgressEvent::Cancelled { translated_units } => {
                    progress_bar.finish_and_clear();
                    warn!(
                        "Translation cancelled after {} units, no output file written",
                        translated_units
                    );
                    outcome = Some(Ok(()));
                }
            }
        }

        ctrl_c_task.abort();
        handle.join().await;

        if !issues.is_empty() {
            let log_path = output_dir.join(ISSUES_LOG_FILENAME);
            if let Err(e) = self.write_issues_to_file(&issues, &log_path, &input_file) {
                warn!("Failed to write issues log: {}", e);
            } else {
                info!("Issues written to {:?}", log_path);
            }
        }

        outcome.unwrap_or_else(|| Err(anyhow!("Translation job ended without a result")))
    }

    /// Run the main workflow for every presentation in a directory
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(&input_dir, "pptx")?;
        if files.is_empty() {
            warn!("No PPTX files found in {:?}", input_dir);
            return Ok(());
        }

        info!("Found {} presentation(s) in {:?}", files.len(), input_dir);

        let multi_progress = MultiProgress::new();
        let folder_bar = multi_progress.add(ProgressBar::new(files.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.green/white}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_bar.set_style(style.progress_chars("█▓▒░"));

        let mut failures = 0usize;
        for file in &files {
            folder_bar.set_message(
                file.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );

            if let Err(e) = self
                .run_with_progress(file.clone(), &multi_progress, force_overwrite)
                .await
            {
                warn!("Failed to translate {:?}: {}", file, e);
                failures += 1;
            }

            folder_bar.inc(1);
        }

        folder_bar.finish_and_clear();

        if failures > 0 {
            return Err(anyhow!(
                "{} of {} presentations failed to translate",
                failures,
                files.len()
            ));
        }

        info!("All {} presentations translated", files.len());
        Ok(())
    }

    /// Append collected issues to the run log with a context header
    fn write_issues_to_file(&self, issues: &[String], path: &Path, input_file: &Path) -> Result<()> {
        let context = format!(
            "{} - {} ({:?})",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model(),
            input_file
        );

        FileManager::append_to_log_file(path, &context)?;
        for issue in issues {
            FileManager::append_to_log_file(path, issue)?;
        }

        Ok(())
    }
}
