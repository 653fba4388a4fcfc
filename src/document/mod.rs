/*!
 * Presentation document handling.
 *
 * This module owns everything that touches the PPTX container:
 *
 * - `pptx`: the ZIP-backed document model (open, part access, save)
 * - `extract`: streaming extraction of text units from slide XML and
 *   reinsertion of translated text at the exact original locations
 */

// Re-export main types for easier usage
pub use self::extract::{Segment, TextUnit, TranslatedUnit, UnitKind, UnitLocation, extract_units, reinsert_units};
pub use self::pptx::PptxDocument;

// Submodules
pub mod extract;
pub mod pptx;
