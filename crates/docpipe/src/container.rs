//! Recursive container stage: archive entries re-enter the pipeline.
//!
//! [`DecompressArchives`] receives `data_source` messages. Anything that is
//! not an archive passes through untouched. For archives, every regular-file
//! entry is emitted as a fresh `data_source` over an unseekable forward
//! stream, carrying the entry's filename extension, so downstream detection
//! and parsing treat it exactly like a top-level input. Nested archives are
//! expanded through the same logic.
//!
//! Per-entry failures become exception-carrier messages and the walk
//! continues; a failure to open the archive itself aborts the stage with a
//! nested error.

use crate::chain::{ChainElement, Continuation, Emit, impl_stage_bitor};
use crate::data_source::DataSource;
use crate::error::{PipelineError, Result};
use crate::message::Message;
use crate::mime::{Confidence, FileExtension, GZIP_MIME_TYPE, MimeType, TAR_MIME_TYPE, ZIP_MIME_TYPE};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use std::path::Path;

const SNIFF_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveKind {
    Zip,
    Tar,
    Gzip,
}

fn kind_from_mime(mime: &MimeType) -> Option<ArchiveKind> {
    match mime.as_str() {
        ZIP_MIME_TYPE | "application/x-zip-compressed" => Some(ArchiveKind::Zip),
        TAR_MIME_TYPE | "application/x-gtar" => Some(ArchiveKind::Tar),
        GZIP_MIME_TYPE | "application/x-gzip" => Some(ArchiveKind::Gzip),
        _ => None,
    }
}

fn kind_from_extension(extension: &FileExtension) -> Option<ArchiveKind> {
    match extension.as_str() {
        "zip" => Some(ArchiveKind::Zip),
        "tar" => Some(ArchiveKind::Tar),
        "gz" | "tgz" => Some(ArchiveKind::Gzip),
        _ => None,
    }
}

/// Chain element expanding archives into their member files.
#[derive(Default)]
pub struct DecompressArchives;

impl DecompressArchives {
    pub fn new() -> Self {
        Self
    }

    /// Archive trigger: MIME evidence first, extension when no usable
    /// evidence exists, then a byte-signature sniff as the last resort (byte
    /// buffers arrive with neither evidence nor extension).
    fn archive_kind(&self, data: &DataSource) -> Result<Option<ArchiveKind>> {
        if data.highest_confidence() >= Confidence::Medium {
            let kind = data.highest_confidence_mime_type().and_then(kind_from_mime);
            return Ok(kind);
        }
        if let Some(extension) = data.file_extension() {
            return Ok(kind_from_extension(&extension));
        }
        let prefix = data.span(Some(SNIFF_LIMIT))?;
        Ok(infer::get(&prefix)
            .map(|kind| MimeType::new(kind.mime_type()))
            .as_ref()
            .and_then(kind_from_mime))
    }

    fn expand(&self, kind: ArchiveKind, data: &DataSource, emit: &mut Emit<'_>) -> Result<Continuation> {
        tracing::debug!(?kind, "decompressing archive");
        match kind {
            ArchiveKind::Zip => self.walk_zip(data, emit),
            ArchiveKind::Tar => {
                let reader = data.istream()?;
                self.walk_tar(reader, emit)
            }
            ArchiveKind::Gzip => self.walk_gzip(data, emit),
        }
    }

    fn walk_zip(&self, data: &DataSource, emit: &mut Emit<'_>) -> Result<Continuation> {
        let reader = data.istream()?;
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| PipelineError::uninterpretable_data_with_source("error opening archive", e))?;
        for index in 0..archive.len() {
            let (name, bytes) = match archive.by_index(index) {
                Ok(mut entry) => {
                    if entry.is_dir() {
                        tracing::debug!(entry = entry.name(), "skipping directory entry");
                        continue;
                    }
                    let name = entry.name().to_string();
                    let mut bytes = Vec::new();
                    if let Err(e) = entry.read_to_end(&mut bytes) {
                        let error = PipelineError::uninterpretable_data_with_source(
                            format!("error reading archive entry {name}"),
                            e,
                        );
                        if emit.send(Message::carrier(error))? == Continuation::Stop {
                            return Ok(Continuation::Proceed);
                        }
                        continue;
                    }
                    (name, bytes)
                }
                Err(e) => {
                    let error = PipelineError::uninterpretable_data_with_source(
                        format!("error reading archive entry {index}"),
                        e,
                    );
                    if emit.send(Message::carrier(error))? == Continuation::Stop {
                        return Ok(Continuation::Proceed);
                    }
                    continue;
                }
            };
            if self.emit_entry(&name, bytes, emit)? == Continuation::Stop {
                break;
            }
        }
        Ok(Continuation::Proceed)
    }

    fn walk_tar<R: Read>(&self, reader: R, emit: &mut Emit<'_>) -> Result<Continuation> {
        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| PipelineError::uninterpretable_data_with_source("error opening archive", e))?;
        for entry in entries {
            let mut entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let error =
                        PipelineError::uninterpretable_data_with_source("error reading archive entry", e);
                    if emit.send(Message::carrier(error))? == Continuation::Stop {
                        return Ok(Continuation::Proceed);
                    }
                    continue;
                }
            };
            if entry.header().entry_type().is_dir() {
                tracing::debug!("skipping directory entry");
                continue;
            }
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry
                .path()
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| "entry".to_string());
            let mut bytes = Vec::new();
            if let Err(e) = entry.read_to_end(&mut bytes) {
                let error = PipelineError::uninterpretable_data_with_source(
                    format!("error reading archive entry {name}"),
                    e,
                );
                if emit.send(Message::carrier(error))? == Continuation::Stop {
                    return Ok(Continuation::Proceed);
                }
                continue;
            }
            if self.emit_entry(&name, bytes, emit)? == Continuation::Stop {
                break;
            }
        }
        Ok(Continuation::Proceed)
    }

    fn walk_gzip(&self, data: &DataSource, emit: &mut Emit<'_>) -> Result<Continuation> {
        let mut decoder = GzDecoder::new(data.istream()?);
        let mut bytes = Vec::new();
        decoder
            .read_to_end(&mut bytes)
            .map_err(|e| PipelineError::uninterpretable_data_with_source("error opening archive", e))?;

        let outer_name = data
            .path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let is_tgz = data
            .file_extension()
            .is_some_and(|e| e.as_str() == "tgz")
            || outer_name.as_deref().is_some_and(|n| n.ends_with(".tar.gz"));
        if is_tgz || (bytes.len() >= 262 && bytes[257..262] == *b"ustar") {
            return self.walk_tar(Cursor::new(bytes), emit);
        }

        // A plain .gz member: the entry name is the source name minus the
        // compression suffix.
        let name = outer_name
            .as_deref()
            .and_then(|n| n.strip_suffix(".gz"))
            .unwrap_or("data")
            .to_string();
        self.emit_entry(&name, bytes, emit)?;
        Ok(Continuation::Proceed)
    }

    /// Wrap entry bytes into a fresh data source and hand it on. Entries that
    /// are themselves archives re-enter the expansion instead.
    fn emit_entry(&self, name: &str, bytes: Vec<u8>, emit: &mut Emit<'_>) -> Result<Continuation> {
        tracing::debug!(entry = name, size = bytes.len(), "processing archive entry");
        let extension = FileExtension::from_path(Path::new(name));
        let mut entry = DataSource::from_unseekable(Cursor::new(bytes));
        if let Some(extension) = extension.clone() {
            entry = entry.with_file_extension(extension);
        }
        if let Some(kind) = extension.as_ref().and_then(kind_from_extension) {
            return self.expand(kind, &entry, emit);
        }
        emit.send(Message::DataSource(entry))
    }
}

impl ChainElement for DecompressArchives {
    fn name(&self) -> &'static str {
        "decompress-archives"
    }

    fn process(&mut self, message: Message, emit: &mut Emit<'_>) -> Result<Continuation> {
        let Message::DataSource(data) = message else {
            return emit.send(message);
        };
        let Some(kind) = self.archive_kind(&data)? else {
            tracing::debug!("not a supported archive, passing through");
            return emit.send(Message::DataSource(data));
        };
        self.expand(kind, &data, emit)
            .map_err(|e| e.wrap("error processing archive"))
    }
}

impl_stage_bitor!(DecompressArchives);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Pipeline;
    use crate::input::Input;
    use crate::output::CollectorOutput;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn sample_zip() -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::<'_, ()>::default();
            zip.start_file("readme.txt", options).unwrap();
            zip.write_all(b"hello from the archive").unwrap();
            zip.add_directory("docs/", options).unwrap();
            zip.start_file("docs/notes.md", options).unwrap();
            zip.write_all(b"# notes").unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn data_sources(messages: &[Message]) -> Vec<DataSource> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::DataSource(ds) => Some(ds.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_zip_entries_emitted_with_extensions() {
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = DecompressArchives::new() | collector;
        pipeline
            .process(Input::data_source(
                DataSource::from_vec(sample_zip()).with_file_extension("zip".into()),
            ))
            .unwrap();
        let sources = data_sources(&messages.lock());
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].file_extension().unwrap().as_str(), "txt");
        assert_eq!(sources[0].string(None).unwrap(), "hello from the archive");
        assert_eq!(sources[1].file_extension().unwrap().as_str(), "md");
    }

    #[test]
    fn test_extension_fallback_without_evidence() {
        // Same as above but the trigger is only the signature sniff: no
        // evidence, no extension.
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = DecompressArchives::new() | collector;
        pipeline.process(Input::bytes(sample_zip())).unwrap();
        let sources = data_sources(&messages.lock());
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_nested_archive_recursed() {
        let inner = sample_zip();
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options = FileOptions::<'_, ()>::default();
            zip.start_file("inner.zip", options).unwrap();
            zip.write_all(&inner).unwrap();
            zip.start_file("top.txt", options).unwrap();
            zip.write_all(b"top level").unwrap();
            zip.finish().unwrap();
        }
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = DecompressArchives::new() | collector;
        pipeline
            .process(Input::data_source(
                DataSource::from_vec(cursor.into_inner()).with_file_extension("zip".into()),
            ))
            .unwrap();
        let sources = data_sources(&messages.lock());
        // inner.zip expanded into its two members, plus top.txt.
        assert_eq!(sources.len(), 3);
    }

    #[test]
    fn test_tar_and_gzip_paths() {
        let mut tar_bytes = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut tar_bytes);
            let data = b"tar entry body";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append_data(&mut header, "body.txt", &data[..]).unwrap();
            builder.finish().unwrap();
        }
        let gz = {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&tar_bytes).unwrap();
            encoder.finish().unwrap()
        };
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = DecompressArchives::new() | collector;
        pipeline
            .process(Input::data_source(
                DataSource::from_vec(gz).with_file_extension("tgz".into()),
            ))
            .unwrap();
        let sources = data_sources(&messages.lock());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].string(None).unwrap(), "tar entry body");
        assert_eq!(sources[0].file_extension().unwrap().as_str(), "txt");
    }

    #[test]
    fn test_non_archive_passes_through() {
        let (collector, messages) = CollectorOutput::new();
        let mut pipeline = DecompressArchives::new() | collector;
        pipeline.process(Input::text("just text")).unwrap();
        let sources = data_sources(&messages.lock());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].string(None).unwrap(), "just text");
    }

    #[test]
    fn test_broken_archive_is_fatal_for_the_stage() {
        let garbage = b"PK\x03\x04 but truncated".to_vec();
        let failing = DataSource::from_vec(garbage).with_file_extension("zip".into());
        let (collector, _messages) = CollectorOutput::new();
        let mut pipeline = Pipeline::from_element(DecompressArchives::new());
        pipeline |= collector;
        // The carrier reaches the collector, the run itself succeeds.
        pipeline.process(Input::data_source(failing)).unwrap();
    }
}
