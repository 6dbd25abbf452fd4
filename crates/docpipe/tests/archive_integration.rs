//! Archive handling end to end: detection, decompression, parsing and
//! plain-text export of container contents.

use docpipe::container::DecompressArchives;
use docpipe::content_type;
use docpipe::exporters::PlainTextExporter;
use docpipe::input::Input;
use docpipe::message::Message;
use docpipe::output::CollectorOutput;
use docpipe::parsers::ParseBySignature;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

fn zip_of_texts(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::<'_, ()>::default();
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

fn exported_texts(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::DataSource(ds) => Some(ds.string(None).unwrap()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_zip_file_through_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.zip");
    std::fs::write(&path, zip_of_texts(&[("link.txt", "hyperlink test\n")])).unwrap();

    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = content_type::detector()
        | DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline.process(Input::path(&path)).unwrap();

    let texts = exported_texts(&messages.lock());
    assert_eq!(texts, vec!["hyperlink test\n\n".to_string()]);
}

#[test]
fn test_zip_bytes_without_prior_detection() {
    // Byte-buffer input straight into the archive stage: the stage falls back
    // to its own sniffing.
    let bytes = zip_of_texts(&[("link.txt", "hyperlink test\n")]);
    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline.process(Input::bytes(bytes)).unwrap();

    let texts = exported_texts(&messages.lock());
    assert_eq!(texts, vec!["hyperlink test\n\n".to_string()]);
}

#[test]
fn test_multiple_entries_produce_multiple_documents() {
    let bytes = zip_of_texts(&[("a.txt", "first\n"), ("b.txt", "second\n")]);
    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline
        .process(Input::data_source(
            docpipe::DataSource::from_vec(bytes).with_file_extension("zip".into()),
        ))
        .unwrap();

    let texts = exported_texts(&messages.lock());
    assert_eq!(texts, vec!["first\n\n".to_string(), "second\n\n".to_string()]);
}

#[test]
fn test_nested_zip_expanded_through_same_stage() {
    let inner = zip_of_texts(&[("deep.txt", "nested content\n")]);
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::<'_, ()>::default();
        zip.start_file("inner.zip", options).unwrap();
        zip.write_all(&inner).unwrap();
        zip.finish().unwrap();
    }

    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline
        .process(Input::data_source(
            docpipe::DataSource::from_vec(cursor.into_inner()).with_file_extension("zip".into()),
        ))
        .unwrap();

    let texts = exported_texts(&messages.lock());
    assert_eq!(texts, vec!["nested content\n\n".to_string()]);
}

#[test]
fn test_tar_gz_through_pipeline() {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        let body = b"from a tarball\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_cksum();
        builder.append_data(&mut header, "doc.txt", &body[..]).unwrap();
        builder.finish().unwrap();
    }
    let gz = {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap()
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bundle.tar.gz");
    std::fs::write(&path, gz).unwrap();

    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = content_type::detector()
        | DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline.process(Input::path(&path)).unwrap();

    let texts = exported_texts(&messages.lock());
    assert_eq!(texts, vec!["from a tarball\n\n".to_string()]);
}

#[test]
fn test_unparseable_entry_surfaces_as_carrier() {
    // A PNG inside the archive has no parser; the pipeline keeps flowing and
    // still exports the text entry.
    let png_header: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::<'_, ()>::default();
        zip.start_file("image.png", options).unwrap();
        zip.write_all(png_header).unwrap();
        zip.start_file("note.txt", options).unwrap();
        zip.write_all(b"still readable\n").unwrap();
        zip.finish().unwrap();
    }

    let (collector, messages) = CollectorOutput::new();
    let mut pipeline = DecompressArchives::new()
        | ParseBySignature::new()
        | PlainTextExporter::new()
        | collector;
    pipeline
        .process(Input::data_source(
            docpipe::DataSource::from_vec(cursor.into_inner()).with_file_extension("zip".into()),
        ))
        .unwrap();

    let messages = messages.lock();
    assert!(
        messages
            .iter()
            .any(|m| matches!(m, Message::ExceptionCarrier(_)))
    );
    let texts = exported_texts(&messages);
    assert_eq!(texts, vec!["still readable\n\n".to_string()]);
}
