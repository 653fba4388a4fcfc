use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::ZipArchive;
use zip::write::FileOptions;

use crate::errors::DocumentError;

// @module: ZIP-backed PPTX document model

// @const: Slide part name pattern, e.g. "ppt/slides/slide3.xml"
static SLIDE_PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

// @const: Notes part name pattern, e.g. "ppt/notesSlides/notesSlide3.xml"
static NOTES_PART_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/notesSlides/notesSlide(\d+)\.xml$").unwrap());

/// A single file inside the PPTX package
struct DocumentPart {
    /// Archive path of the part
    name: String,
    /// Raw part bytes
    data: Vec<u8>,
}

/// An opened PPTX presentation.
///
/// The package is read fully into memory; only slide and notes-slide parts
/// are ever rewritten, every other part is copied through untouched so the
/// layout, media and theme of the presentation survive byte-for-byte.
pub struct PptxDocument {
    /// All package parts in original archive order
    parts: Vec<DocumentPart>,
    /// Slide part names paired with their slide number, ascending
    slides: Vec<(String, usize)>,
    /// Notes part names paired with the slide number they belong to, ascending
    notes: Vec<(String, usize)>,
}

impl PptxDocument {
    /// Open a presentation from a file on disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let bytes = fs::read(path.as_ref())
            .map_err(|e| DocumentError::Open(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_bytes(&bytes)
    }

    /// Open a presentation from an in-memory buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocumentError::Open(format!("not a valid PPTX archive: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| DocumentError::Open(format!("failed to read archive entry: {}", e)))?;

            // Directory entries carry no content
            if file.name().ends_with('/') {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| DocumentError::Open(format!("failed to read part '{}': {}", name, e)))?;

            parts.push(DocumentPart { name, data });
        }

        if !parts.iter().any(|p| p.name == "ppt/presentation.xml") {
            return Err(DocumentError::Open(
                "archive does not contain a PowerPoint presentation".to_string(),
            ));
        }

        let mut slides = Vec::new();
        let mut notes = Vec::new();
        for part in &parts {
            if let Some(caps) = SLIDE_PART_REGEX.captures(&part.name) {
                if let Ok(number) = caps[1].parse::<usize>() {
                    slides.push((part.name.clone(), number));
                }
            } else if let Some(caps) = NOTES_PART_REGEX.captures(&part.name) {
                if let Ok(number) = caps[1].parse::<usize>() {
                    notes.push((part.name.clone(), number));
                }
            }
        }
        slides.sort_by_key(|(_, number)| *number);
        notes.sort_by_key(|(_, number)| *number);

        Ok(Self { parts, slides, notes })
    }

    /// Slide part names with their slide numbers, in presentation order
    pub fn slide_parts(&self) -> &[(String, usize)] {
        &self.slides
    }

    /// Notes part names with the slide numbers they belong to
    pub fn notes_parts(&self) -> &[(String, usize)] {
        &self.notes
    }

    /// Number of slides in the presentation
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Get the raw bytes of a part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|p| p.name == name).map(|p| p.data.as_slice())
    }

    /// Get a part decoded as UTF-8 XML
    pub fn part_xml(&self, name: &str) -> Result<String, DocumentError> {
        let data = self
            .part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))?;

        String::from_utf8(data.to_vec()).map_err(|e| DocumentError::Xml {
            part: name.to_string(),
            message: format!("part is not valid UTF-8: {}", e),
        })
    }

    /// Replace the content of an existing part
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) -> Result<(), DocumentError> {
        let part = self
            .parts
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))?;

        part.data = data;
        Ok(())
    }

    /// Serialize the document back into a PPTX archive
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| DocumentError::Save(format!("failed to add '{}': {}", part.name, e)))?;
            writer
                .write_all(&part.data)
                .map_err(|e| DocumentError::Save(format!("failed to write '{}': {}", part.name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocumentError::Save(format!("failed to finalize archive: {}", e)))?;

        Ok(cursor.into_inner())
    }

    /// Save the document to a new file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)
            .map_err(|e| DocumentError::Save(format!("{}: {}", path.as_ref().display(), e)))
    }
}
