//! Container extraction
//!
//! CBZ files are plain ZIP archives; entries are read fully into memory.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::error::{ArchiveError, ArchiveResult};

/// Named blob read out of a container
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Turns container bytes into named entries
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, data: &[u8]) -> ArchiveResult<Vec<ArchiveEntry>>;
}

/// ZIP (CBZ) extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, data: &[u8]) -> ArchiveResult<Vec<ArchiveEntry>> {
        if !data.starts_with(b"PK") {
            return Err(ArchiveError::Extract(
                "Unsupported container (expected a ZIP based comic archive)".to_string(),
            ));
        }

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            // Declared sizes are untrusted, let the buffer grow as bytes arrive
            let mut content = Vec::new();
            file.read_to_end(&mut content).map_err(|e| {
                ArchiveError::Extract(format!("Failed to read '{}': {}", name, e))
            })?;

            entries.push(ArchiveEntry {
                name,
                data: content,
            });
        }

        Ok(entries)
    }
}
