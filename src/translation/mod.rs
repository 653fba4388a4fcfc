/*!
 * Translation functionality for presentation text.
 *
 * This module provides everything between the extracted text units and the
 * provider APIs:
 *
 * - `core`: the TranslationService (prompting, retry, backoff)
 * - `cache`: per-run translation cache
 * - `pipeline`: the background job runner with progress events
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::core::TranslationService;
pub use self::pipeline::{
    JobCanceller, JobHandle, JobRequest, JobRunner, JobState, JobSummary, ProgressEvent,
};

// Submodules
pub mod cache;
pub mod core;
pub mod pipeline;
