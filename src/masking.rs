use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

use crate::document::{Segment, TextUnit};

/// Placeholder masking for text that must survive translation untouched.
///
/// Before a paragraph goes to the model, each run boundary and explicit line
/// break is replaced by a numbered `[PLACEHOLDER_N]` token. The model is
/// instructed to keep these tokens verbatim; after translation they are
/// resolved back into run splits and line breaks. A model that drops or
/// mangles a token degrades that run to its original text instead of
/// failing the job.

// @const: Token pattern, the N is the key into the token map
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[PLACEHOLDER_(\d+)\]").unwrap());

/// Render the placeholder token for an index
fn token(index: usize) -> String {
    format!("[PLACEHOLDER_{}]", index)
}

/// Map from token index to the protected content it stands for
pub type TokenMap = BTreeMap<usize, String>;

/// A non-fatal problem discovered while unmasking a translated paragraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskWarning {
    /// The model dropped a token; the affected run keeps its original text
    MissingToken { index: usize },
    /// The model invented a token that was never issued; it is stripped
    UnknownToken { index: usize },
    /// The model repeated a token; only the first occurrence is honored
    DuplicateToken { index: usize },
}

impl fmt::Display for MaskWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskWarning::MissingToken { index } => {
                write!(f, "placeholder {} missing from translation, keeping original text", token(*index))
            }
            MaskWarning::UnknownToken { index } => {
                write!(f, "translation contains unissued placeholder {}, removing it", token(*index))
            }
            MaskWarning::DuplicateToken { index } => {
                write!(f, "placeholder {} repeated in translation, using first occurrence", token(*index))
            }
        }
    }
}

/// Replace protected substrings in `text` with numbered tokens.
///
/// Returns the masked text and the map needed to reverse the operation.
/// Protected content is currently newlines and vertical tabs, which
/// PowerPoint uses for soft line breaks inside a run.
pub fn mask(text: &str) -> (String, TokenMap) {
    let mut masked = String::with_capacity(text.len());
    let mut map = TokenMap::new();
    let mut next_index = 1;

    for ch in text.chars() {
        if ch == '\n' || ch == '\x0b' {
            map.insert(next_index, ch.to_string());
            masked.push_str(&token(next_index));
            next_index += 1;
        } else {
            masked.push(ch);
        }
    }

    (masked, map)
}

/// Resolve tokens in translated text back to their protected content.
///
/// Never fails: problems are reported as warnings and the text is repaired
/// as well as possible (dropped tokens reinsert their content at the end,
/// so no protected content is ever lost).
pub fn unmask(translated: &str, map: &TokenMap) -> (String, Vec<MaskWarning>) {
    let mut warnings = Vec::new();
    let mut seen: Vec<usize> = Vec::new();
    let mut out = String::with_capacity(translated.len());
    let mut last_end = 0;

    for caps in TOKEN_REGEX.captures_iter(translated) {
        let whole = caps.get(0).unwrap();
        let index: usize = match caps[1].parse() {
            Ok(i) => i,
            Err(_) => continue,
        };

        out.push_str(&translated[last_end..whole.start()]);
        last_end = whole.end();

        match map.get(&index) {
            Some(content) => {
                if seen.contains(&index) {
                    warnings.push(MaskWarning::DuplicateToken { index });
                } else {
                    seen.push(index);
                    out.push_str(content);
                }
            }
            None => {
                warnings.push(MaskWarning::UnknownToken { index });
            }
        }
    }
    out.push_str(&translated[last_end..]);

    // Dropped tokens still owe their protected content
    for (index, content) in map {
        if !seen.contains(index) {
            warnings.push(MaskWarning::MissingToken { index: *index });
            out.push_str(content);
        }
    }

    (out, warnings)
}

/// Where a token points inside a text unit
#[derive(Debug, Clone)]
enum MaskEntry {
    /// Token marks the end of run `run`, whose original text is kept for repair
    RunBoundary { index: usize, run: usize, original: String },
    /// Token stands for literal content (an explicit line break)
    Content { index: usize },
}

/// The reversible masking of one text unit.
///
/// Produced by [`mask_unit`], consumed by [`unmask_unit`]. Holds the
/// original run texts so any failure mode can fall back to them.
#[derive(Debug, Clone)]
pub struct UnitMask {
    /// Original text of every run, in order
    originals: Vec<String>,
    /// One entry per issued token, in issue order
    entries: Vec<MaskEntry>,
    /// Whether the unit had anything to send at all
    has_content: bool,
}

impl UnitMask {
    /// Original run texts, used verbatim when translation fails outright
    pub fn original_runs(&self) -> Vec<String> {
        self.originals.clone()
    }

    /// Whether masking produced any text worth sending to the model
    pub fn has_content(&self) -> bool {
        self.has_content
    }
}

/// Flatten a text unit into one maskable string.
///
/// Each non-empty run is followed by a boundary token; explicit line breaks
/// become content tokens. Empty runs get no token and are restored verbatim
/// on unmask. The resulting string is what goes into the prompt.
pub fn mask_unit(unit: &TextUnit) -> (String, UnitMask) {
    let mut masked = String::new();
    let mut entries = Vec::new();
    let mut originals = Vec::new();
    let mut next_index = 1;
    let mut run_ordinal = 0;
    let mut has_content = false;

    for segment in &unit.segments {
        match segment {
            Segment::Run(text) => {
                originals.push(text.clone());
                if !text.trim().is_empty() {
                    masked.push_str(text);
                    masked.push_str(&token(next_index));
                    entries.push(MaskEntry::RunBoundary {
                        index: next_index,
                        run: run_ordinal,
                        original: text.clone(),
                    });
                    next_index += 1;
                    has_content = true;
                }
                run_ordinal += 1;
            }
            Segment::LineBreak => {
                masked.push_str(&token(next_index));
                entries.push(MaskEntry::Content { index: next_index });
                next_index += 1;
            }
        }
    }

    (masked, UnitMask { originals, entries, has_content })
}

/// Split translated text back into per-run texts using the boundary tokens.
///
/// Returns one string per original run. Runs whose boundary token survived
/// get the translated text preceding it; runs whose token was dropped keep
/// their original text and a warning is emitted. Content tokens (line
/// breaks) are simply removed, the reinsertion step keeps the `<a:br/>`
/// elements that produced them.
pub fn unmask_unit(translated: &str, mask: &UnitMask) -> (Vec<String>, Vec<MaskWarning>) {
    let mut warnings = Vec::new();

    // Locate every token occurrence in the translated text
    let mut positions: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for caps in TOKEN_REGEX.captures_iter(translated) {
        let whole = caps.get(0).unwrap();
        let index: usize = match caps[1].parse() {
            Ok(i) => i,
            Err(_) => continue,
        };

        if positions.contains_key(&index) {
            warnings.push(MaskWarning::DuplicateToken { index });
        } else {
            positions.insert(index, (whole.start(), whole.end()));
        }
    }

    let issued: Vec<usize> = mask
        .entries
        .iter()
        .map(|entry| match entry {
            MaskEntry::RunBoundary { index, .. } => *index,
            MaskEntry::Content { index } => *index,
        })
        .collect();

    for index in positions.keys() {
        if !issued.contains(index) {
            warnings.push(MaskWarning::UnknownToken { index: *index });
        }
    }

    // Walk issued tokens in order, slicing the text between boundary tokens
    let mut runs = mask.originals.clone();
    let mut cursor = 0;
    for entry in &mask.entries {
        match entry {
            MaskEntry::RunBoundary { index, run, original } => {
                match positions.get(index) {
                    Some(&(start, end)) if start >= cursor => {
                        let piece = strip_tokens(&translated[cursor..start]);
                        runs[*run] = piece;
                        cursor = end;
                    }
                    _ => {
                        // Token dropped or out of order, keep the original run
                        warnings.push(MaskWarning::MissingToken { index: *index });
                        runs[*run] = original.clone();
                    }
                }
            }
            MaskEntry::Content { index } => {
                if let Some(&(_, end)) = positions.get(index) {
                    if end > cursor {
                        cursor = end;
                    }
                } else {
                    warnings.push(MaskWarning::MissingToken { index: *index });
                }
            }
        }
    }

    (runs, warnings)
}

/// Remove any token occurrences from a slice of translated text
fn strip_tokens(text: &str) -> String {
    TOKEN_REGEX.replace_all(text, "").trim().to_string()
}
