/*!
 * # decktrans - AI-powered PowerPoint translation
 *
 * A Rust library for translating PPTX presentations with LLM providers
 * while keeping the original layout, formatting and theme untouched.
 *
 * ## Features
 *
 * - Extract text units from slides and speaker notes
 * - Protect run boundaries and line breaks with placeholder tokens
 * - Translate via OpenAI-compatible chat completions APIs:
 *   - OpenAI API
 *   - LM Studio (local server)
 * - Retry with exponential backoff on transient failures
 * - Background jobs with progress events and cooperative cancellation
 * - Save a translated copy, never modifying the input file
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: PPTX package handling:
 *   - `document::pptx`: ZIP-backed document model
 *   - `document::extract`: text extraction and reinsertion
 * - `masking`: placeholder token protection
 * - `translation`: AI-powered translation services:
 *   - `translation::core`: Core translation functionality
 *   - `translation::cache`: Caching mechanisms for translations
 *   - `translation::pipeline`: Background job runner
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::mock`: Mock provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod masking;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use document::{PptxDocument, TextUnit, TranslatedUnit, extract_units, reinsert_units};
pub use errors::{DocumentError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{JobRunner, TranslationService};
