/*!
 * Text extraction and reinsertion for slide XML.
 *
 * Extraction walks each slide (and notes-slide) part with a streaming XML
 * reader and collects one `TextUnit` per non-empty paragraph. Reinsertion
 * replays the same walk with a writer attached, substituting translated run
 * text into the addressed `<a:t>` elements and echoing every other event
 * untouched, so formatting, positions and theme references survive.
 *
 * Both passes count paragraphs and runs the same way, which is what makes
 * a `UnitLocation` stable between them.
 */

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};
use regex::Regex;
use std::collections::HashMap;
use std::io::Cursor;

use crate::errors::DocumentError;

use super::pptx::PptxDocument;

// @const: Paragraphs that are pure numbers are not worth a round trip
static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+\.?\d*$").unwrap());

/// Placeholder shape types that must never be translated
/// (footer, slide number, date — matching the original tool's skip list)
const SKIPPED_PLACEHOLDER_TYPES: &[&[u8]] = &[b"ftr", b"sldNum", b"dt"];

/// One piece of a paragraph, in document order
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text content of one `<a:t>` run (may be empty)
    Run(String),
    /// An explicit `<a:br/>` line break between runs
    LineBreak,
}

/// Kind of text unit, by where it lives in the presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Slide body text (shapes and table cells)
    Body,
    /// Speaker notes text
    Notes,
}

/// Stable address of a paragraph inside the package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitLocation {
    /// Archive part the paragraph lives in
    pub part: String,
    /// 1-based slide number the part belongs to
    pub slide: usize,
    /// 0-based paragraph ordinal within the part
    pub paragraph: usize,
}

impl std::fmt::Display for UnitLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#p{}", self.part, self.paragraph)
    }
}

/// One extractable, independently translatable paragraph
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// Where the paragraph came from and where it goes back
    pub location: UnitLocation,
    /// Body or notes text
    pub kind: UnitKind,
    /// Runs and line breaks in document order
    pub segments: Vec<Segment>,
}

impl TextUnit {
    /// Texts of all runs, in order (line breaks excluded)
    pub fn run_texts(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Run(text) => Some(text.clone()),
                Segment::LineBreak => None,
            })
            .collect()
    }

    /// The visible text of the paragraph, with line breaks as '\n'
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Run(text) => out.push_str(text),
                Segment::LineBreak => out.push('\n'),
            }
        }
        out
    }

    /// Whether the unit contains anything a translator could work on
    pub fn is_translatable(&self) -> bool {
        let text = self.plain_text();
        let trimmed = text.trim();
        !trimmed.is_empty() && !NUMERIC_REGEX.is_match(trimmed)
    }
}

/// A text unit after translation, ready for reinsertion.
///
/// `runs` has exactly one entry per original run; untranslated runs carry
/// their original text so a partially failed job still reinserts cleanly.
#[derive(Debug, Clone)]
pub struct TranslatedUnit {
    /// Address of the paragraph being rewritten
    pub location: UnitLocation,
    /// New text for each run, same count and order as extraction
    pub runs: Vec<String>,
}

/// Extract the local name from a potentially namespaced XML element name
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Per-shape state used to honor the placeholder skip list
#[derive(Default)]
struct ShapeFrame {
    skip: bool,
}

/// Extract all text units from the document, slides first, then notes
pub fn extract_units(doc: &PptxDocument) -> Result<Vec<TextUnit>, DocumentError> {
    let mut units = Vec::new();

    for (part, slide) in doc.slide_parts() {
        let xml = doc.part_xml(part)?;
        extract_from_part(&xml, part, *slide, UnitKind::Body, &mut units)?;
    }

    for (part, slide) in doc.notes_parts() {
        let xml = doc.part_xml(part)?;
        extract_from_part(&xml, part, *slide, UnitKind::Notes, &mut units)?;
    }

    Ok(units)
}

/// Walk one slide part and append its translatable paragraphs
fn extract_from_part(
    xml: &str,
    part: &str,
    slide: usize,
    kind: UnitKind,
    units: &mut Vec<TextUnit>,
) -> Result<(), DocumentError> {
    let mut reader = Reader::from_str(xml);

    let mut shape_stack: Vec<ShapeFrame> = Vec::new();
    let mut paragraph_index: usize = 0;
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut segments: Vec<Segment> = Vec::new();
    let mut run_text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| DocumentError::Xml {
            part: part.to_string(),
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"sp" => shape_stack.push(ShapeFrame::default()),
                b"ph" => mark_skipped_placeholder(&e, &mut shape_stack),
                b"p" => {
                    in_paragraph = true;
                    segments.clear();
                }
                b"t" if in_paragraph => {
                    in_text = true;
                    run_text.clear();
                }
                b"br" if in_paragraph => segments.push(Segment::LineBreak),
                _ => {}
            },
            Event::Empty(e) => match local_name(e.name().as_ref()) {
                b"ph" => mark_skipped_placeholder(&e, &mut shape_stack),
                b"t" if in_paragraph => segments.push(Segment::Run(String::new())),
                b"br" if in_paragraph => segments.push(Segment::LineBreak),
                _ => {}
            },
            Event::Text(e) => {
                if in_text {
                    let text = e.unescape().map_err(|err| DocumentError::Xml {
                        part: part.to_string(),
                        message: err.to_string(),
                    })?;
                    run_text.push_str(&text);
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    shape_stack.pop();
                }
                b"t" => {
                    if in_text {
                        segments.push(Segment::Run(std::mem::take(&mut run_text)));
                        in_text = false;
                    }
                }
                b"p" => {
                    if in_paragraph {
                        let skipped = shape_stack.iter().any(|frame| frame.skip);
                        let unit = TextUnit {
                            location: UnitLocation {
                                part: part.to_string(),
                                slide,
                                paragraph: paragraph_index,
                            },
                            kind,
                            segments: std::mem::take(&mut segments),
                        };
                        if !skipped && unit.is_translatable() {
                            units.push(unit);
                        }
                        paragraph_index += 1;
                        in_paragraph = false;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

/// Flag the enclosing shape when it is a footer/slide-number/date placeholder
fn mark_skipped_placeholder(e: &quick_xml::events::BytesStart<'_>, shape_stack: &mut [ShapeFrame]) {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"type"
            && SKIPPED_PLACEHOLDER_TYPES.contains(&attr.value.as_ref())
        {
            if let Some(frame) = shape_stack.last_mut() {
                frame.skip = true;
            }
        }
    }
}

/// Write translated units back into the document at their original locations.
///
/// Every unit must still resolve to a paragraph in its part; a unit that
/// does not is a logic error, not a recoverable condition.
pub fn reinsert_units(doc: &mut PptxDocument, units: &[TranslatedUnit]) -> Result<(), DocumentError> {
    // Group units by part so each part is rewritten in a single pass
    let mut by_part: HashMap<&str, HashMap<usize, &TranslatedUnit>> = HashMap::new();
    for unit in units {
        by_part
            .entry(unit.location.part.as_str())
            .or_default()
            .insert(unit.location.paragraph, unit);
    }

    let part_names: Vec<String> = by_part.keys().map(|name| name.to_string()).collect();
    for part in part_names {
        let xml = doc.part_xml(&part)?;
        let targets = &by_part[part.as_str()];
        let rewritten = rewrite_part(&xml, &part, targets)?;
        doc.replace_part(&part, rewritten)?;
    }

    Ok(())
}

/// Rewrite one part, substituting run text for the targeted paragraphs
fn rewrite_part(
    xml: &str,
    part: &str,
    targets: &HashMap<usize, &TranslatedUnit>,
) -> Result<Vec<u8>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let xml_error = |message: String| DocumentError::Xml {
        part: part.to_string(),
        message,
    };

    let mut paragraph_index: usize = 0;
    let mut in_paragraph = false;
    let mut run_index: usize = 0;
    let mut replacing_text = false;
    let mut matched_paragraphs: usize = 0;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(e.to_string()))?;

        match event {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                match name.as_slice() {
                    b"p" => {
                        in_paragraph = true;
                        run_index = 0;
                        if targets.contains_key(&paragraph_index) {
                            matched_paragraphs += 1;
                        }
                        writer.write_event(Event::Start(e)).map_err(|err| xml_error(err.to_string()))?;
                    }
                    b"t" if in_paragraph => {
                        let replacement = targets
                            .get(&paragraph_index)
                            .and_then(|unit| unit.runs.get(run_index))
                            .cloned();
                        run_index += 1;

                        writer.write_event(Event::Start(e)).map_err(|err| xml_error(err.to_string()))?;
                        if let Some(new_text) = replacement {
                            writer
                                .write_event(Event::Text(BytesText::new(&new_text)))
                                .map_err(|err| xml_error(err.to_string()))?;
                            replacing_text = true;
                        }
                    }
                    _ => {
                        writer.write_event(Event::Start(e)).map_err(|err| xml_error(err.to_string()))?;
                    }
                }
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                if name.as_slice() == b"t" && in_paragraph {
                    let replacement = targets
                        .get(&paragraph_index)
                        .and_then(|unit| unit.runs.get(run_index))
                        .cloned();
                    run_index += 1;

                    match replacement {
                        Some(new_text) if !new_text.is_empty() => {
                            // An empty <a:t/> gaining content must become a full element
                            let end = e.to_end().into_owned();
                            writer
                                .write_event(Event::Start(e.clone()))
                                .map_err(|err| xml_error(err.to_string()))?;
                            writer
                                .write_event(Event::Text(BytesText::new(&new_text)))
                                .map_err(|err| xml_error(err.to_string()))?;
                            writer.write_event(Event::End(end)).map_err(|err| xml_error(err.to_string()))?;
                        }
                        _ => {
                            writer.write_event(Event::Empty(e)).map_err(|err| xml_error(err.to_string()))?;
                        }
                    }
                } else {
                    writer.write_event(Event::Empty(e)).map_err(|err| xml_error(err.to_string()))?;
                }
            }
            Event::Text(e) => {
                if replacing_text {
                    // Original run text superseded by the translation
                } else {
                    writer.write_event(Event::Text(e)).map_err(|err| xml_error(err.to_string()))?;
                }
            }
            Event::End(e) => {
                let name = local_name(e.name().as_ref()).to_vec();
                match name.as_slice() {
                    b"t" => replacing_text = false,
                    b"p" => {
                        if in_paragraph {
                            paragraph_index += 1;
                            in_paragraph = false;
                        }
                    }
                    _ => {}
                }
                writer.write_event(Event::End(e)).map_err(|err| xml_error(err.to_string()))?;
            }
            Event::Eof => break,
            other => {
                writer.write_event(other).map_err(|err| xml_error(err.to_string()))?;
            }
        }
    }

    if matched_paragraphs != targets.len() {
        return Err(DocumentError::UnitLocationMissing(format!(
            "{}: expected {} paragraphs, found {}",
            part,
            targets.len(),
            matched_paragraphs
        )));
    }

    Ok(writer.into_inner().into_inner())
}
