//! The byte-source abstraction flowing through the pipeline.
//!
//! A [`DataSource`] unifies owned buffers, static spans, filesystem paths and
//! byte streams behind one read interface, and carries the MIME evidence the
//! content-type detectors accumulate.
//!
//! Stream and path origins are cached lazily: the first read pulls bytes into
//! an in-memory cache, and later reads with larger limits extend that cache in
//! place. The cache is reference-counted so derived readers created by
//! [`DataSource::istream`] can share it without copying, and so a
//! `DataSource` stays cheap to clone as it moves between pipeline stages.

use crate::error::{PipelineError, Result};
use crate::mime::{Confidence, ENCRYPTED_MIME_TYPE, FileExtension, MimeType};
use indexmap::IndexMap;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const STREAM_CHUNK_SIZE: usize = 4096;

/// Combined `Read + Seek` bound for seekable stream origins.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

#[derive(Debug, Clone)]
enum Origin {
    Memory(Arc<[u8]>),
    Static(&'static [u8]),
    Path(PathBuf),
    SeekableStream,
    UnseekableStream,
}

enum Feed {
    /// In-memory origins never feed the cache.
    None,
    /// File not opened yet; opened on first cache fill.
    PathPending(PathBuf),
    File(PathBuf, std::fs::File),
    Seekable(Box<dyn ReadSeek>),
    Unseekable(Box<dyn Read + Send>),
}

struct ByteCache {
    bytes: Vec<u8>,
    /// Unseekable feed reached EOF; the cache is complete.
    exhausted: bool,
    /// Memoised total size of a seekable feed.
    total_size: Option<u64>,
    feed: Feed,
}

impl ByteCache {
    fn new(feed: Feed) -> Self {
        Self {
            bytes: Vec::new(),
            exhausted: false,
            total_size: None,
            feed,
        }
    }

    /// Extend the cache so that at least `limit` bytes are present (or the
    /// whole source when `limit` is `None`), reusing already-cached bytes.
    fn ensure_filled(&mut self, limit: Option<usize>) -> Result<()> {
        if let Feed::PathPending(path) = &self.feed {
            let path = path.clone();
            let file = std::fs::File::open(&path).map_err(|e| {
                PipelineError::with_source(format!("failed to open {}", path.display()), e)
            })?;
            self.feed = Feed::File(path, file);
        }
        match &mut self.feed {
            Feed::None | Feed::PathPending(_) => Ok(()),
            Feed::File(path, file) => {
                let context = format!("failed to read {}", path.display());
                fill_from_seekable(&mut self.bytes, &mut self.total_size, file, limit, &context)
            }
            Feed::Seekable(reader) => fill_from_seekable(
                &mut self.bytes,
                &mut self.total_size,
                reader,
                limit,
                "stream-read-failed",
            ),
            Feed::Unseekable(reader) => {
                fill_from_unseekable(&mut self.bytes, &mut self.exhausted, reader, limit)
            }
        }
    }
}

fn fill_from_seekable<R: Read + Seek + ?Sized>(
    bytes: &mut Vec<u8>,
    total_size: &mut Option<u64>,
    reader: &mut R,
    limit: Option<usize>,
    context: &str,
) -> Result<()> {
    if total_size.is_none() {
        let end = reader
            .seek(SeekFrom::End(0))
            .map_err(|e| PipelineError::with_source(context.to_string(), e))?;
        *total_size = Some(end);
        reader
            .seek(SeekFrom::Start(bytes.len() as u64))
            .map_err(|e| PipelineError::with_source(context.to_string(), e))?;
    }
    let total = total_size.unwrap_or(0) as usize;
    let target = limit.map_or(total, |l| l.min(total));
    if bytes.len() >= target {
        return Ok(());
    }
    let start = bytes.len();
    bytes.resize(target, 0);
    if let Err(e) = reader.read_exact(&mut bytes[start..]) {
        bytes.truncate(start);
        return Err(PipelineError::with_source(context.to_string(), e));
    }
    Ok(())
}

fn fill_from_unseekable<R: Read + ?Sized>(
    bytes: &mut Vec<u8>,
    exhausted: &mut bool,
    reader: &mut R,
    limit: Option<usize>,
) -> Result<()> {
    loop {
        if *exhausted {
            return Ok(());
        }
        if let Some(l) = limit
            && bytes.len() >= l
        {
            return Ok(());
        }
        let to_read = limit.map_or(STREAM_CHUNK_SIZE, |l| STREAM_CHUNK_SIZE.min(l - bytes.len()));
        let start = bytes.len();
        bytes.resize(start + to_read, 0);
        let read = match reader.read(&mut bytes[start..]) {
            Ok(n) => n,
            Err(e) => {
                bytes.truncate(start);
                return Err(PipelineError::with_source("stream-read-failed", e));
            }
        };
        bytes.truncate(start + read);
        if read == 0 {
            *exhausted = true;
            return Ok(());
        }
    }
}

/// A contiguous read-only view of data-source bytes.
///
/// Either a direct borrow of an in-memory origin or a guard over the shared
/// byte cache of a stream or path origin.
pub struct ByteSpan<'a> {
    inner: SpanInner<'a>,
}

enum SpanInner<'a> {
    Direct(&'a [u8]),
    Cached(MappedMutexGuard<'a, [u8]>),
}

impl Deref for ByteSpan<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.inner {
            SpanInner::Direct(s) => s,
            SpanInner::Cached(g) => &**g,
        }
    }
}

impl AsRef<[u8]> for ByteSpan<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl std::fmt::Debug for ByteSpan<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ByteSpan").field(&self.deref()).finish()
    }
}

/// An opaque byte source plus its MIME evidence and optional file extension.
#[derive(Clone)]
pub struct DataSource {
    origin: Origin,
    cache: Arc<Mutex<ByteCache>>,
    evidence: IndexMap<MimeType, Confidence>,
    extension: Option<FileExtension>,
}

impl DataSource {
    fn with_origin(origin: Origin, feed: Feed) -> Self {
        Self {
            origin,
            cache: Arc::new(Mutex::new(ByteCache::new(feed))),
            evidence: IndexMap::new(),
            extension: None,
        }
    }

    /// Data source over an owned byte buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::with_origin(Origin::Memory(Arc::from(bytes)), Feed::None)
    }

    /// Data source over a string's bytes.
    pub fn from_string(text: impl Into<String>) -> Self {
        Self::from_vec(text.into().into_bytes())
    }

    /// Data source over a static byte span.
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::with_origin(Origin::Static(bytes), Feed::None)
    }

    /// Data source over a filesystem path. The file is opened lazily on first
    /// read.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::with_origin(Origin::Path(path.clone()), Feed::PathPending(path))
    }

    /// Data source over a seekable stream (random access).
    pub fn from_seekable<R: Read + Seek + Send + 'static>(reader: R) -> Self {
        Self::with_origin(Origin::SeekableStream, Feed::Seekable(Box::new(reader)))
    }

    /// Data source over an unseekable, forward-only stream.
    pub fn from_unseekable<R: Read + Send + 'static>(reader: R) -> Self {
        Self::with_origin(Origin::UnseekableStream, Feed::Unseekable(Box::new(reader)))
    }

    /// Attach a filename extension (overrides one derived from a path origin).
    pub fn with_file_extension(mut self, extension: FileExtension) -> Self {
        self.extension = Some(extension);
        self
    }

    /// The filesystem path, for path origins.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::Path(p) => Some(p),
            _ => None,
        }
    }

    /// The attached extension, or one derived from the path origin.
    pub fn file_extension(&self) -> Option<FileExtension> {
        if self.extension.is_some() {
            return self.extension.clone();
        }
        match &self.origin {
            Origin::Path(p) => FileExtension::from_path(p),
            _ => None,
        }
    }

    /// A read-only view of up to `limit` bytes.
    ///
    /// In-memory origins borrow the original bytes directly. Stream and path
    /// origins fill the shared cache up to `limit` (the whole source when
    /// `None`) and borrow the cache. A limit larger than the source is not an
    /// error; the view is simply shorter.
    pub fn span(&self, limit: Option<usize>) -> Result<ByteSpan<'_>> {
        match &self.origin {
            Origin::Memory(bytes) => Ok(ByteSpan {
                inner: SpanInner::Direct(clip(bytes, limit)),
            }),
            Origin::Static(bytes) => Ok(ByteSpan {
                inner: SpanInner::Direct(clip(bytes, limit)),
            }),
            _ => {
                let mut cache = self.cache.lock();
                cache.ensure_filled(limit)?;
                let len = limit.map_or(cache.bytes.len(), |l| l.min(cache.bytes.len()));
                Ok(ByteSpan {
                    inner: SpanInner::Cached(MutexGuard::map(cache, |c| &mut c.bytes[..len])),
                })
            }
        }
    }

    /// Up to `limit` bytes as an owned string (lossy for non-UTF-8 input).
    pub fn string(&self, limit: Option<usize>) -> Result<String> {
        let span = self.span(limit)?;
        Ok(String::from_utf8_lossy(&span).into_owned())
    }

    /// A seekable, independent cursor over the source bytes.
    ///
    /// Stream and path origins are cached fully first; the reader is frozen at
    /// the cache length observed now and will not see later extensions.
    pub fn istream(&self) -> Result<DataReader> {
        let (inner, len) = match &self.origin {
            Origin::Memory(bytes) => (ReaderInner::Memory(bytes.clone()), bytes.len()),
            Origin::Static(bytes) => (ReaderInner::Static(bytes), bytes.len()),
            _ => {
                let mut cache = self.cache.lock();
                cache.ensure_filled(None)?;
                (ReaderInner::Shared(self.cache.clone()), cache.bytes.len())
            }
        };
        Ok(DataReader {
            inner,
            len: len as u64,
            pos: 0,
        })
    }

    /// Record MIME evidence. Existing evidence for the same type is only ever
    /// upgraded, and the original insertion position is kept.
    pub fn add_mime_type(&mut self, mime: MimeType, confidence: Confidence) {
        let entry = self.evidence.entry(mime).or_insert(Confidence::None);
        if confidence > *entry {
            *entry = confidence;
        }
    }

    /// Evidence recorded for a MIME type (`Confidence::None` when absent).
    pub fn mime_type_confidence(&self, mime: &MimeType) -> Confidence {
        self.evidence.get(mime).copied().unwrap_or(Confidence::None)
    }

    /// The MIME type with the highest confidence. Ties keep the earliest
    /// recorded candidate.
    pub fn highest_confidence_mime_type(&self) -> Option<&MimeType> {
        let mut best: Option<(&MimeType, Confidence)> = None;
        for (mime, &confidence) in &self.evidence {
            if best.is_none_or(|(_, c)| confidence > c) {
                best = Some((mime, confidence));
            }
        }
        best.map(|(mime, _)| mime)
    }

    /// The highest confidence present in the evidence store.
    pub fn highest_confidence(&self) -> Confidence {
        self.evidence
            .values()
            .copied()
            .max()
            .unwrap_or(Confidence::None)
    }

    /// All recorded evidence in insertion order.
    pub fn mime_evidence(&self) -> impl Iterator<Item = (&MimeType, Confidence)> {
        self.evidence.iter().map(|(m, &c)| (m, c))
    }

    /// Fail fast when the evidence implies an encrypted input.
    pub fn assert_not_encrypted(&self) -> Result<()> {
        let confidence = self.mime_type_confidence(&MimeType::new(ENCRYPTED_MIME_TYPE));
        if confidence >= Confidence::High {
            return Err(PipelineError::file_encrypted(
                "data source is encrypted and cannot be processed without credentials",
            ));
        }
        Ok(())
    }
}

fn clip(bytes: &[u8], limit: Option<usize>) -> &[u8] {
    match limit {
        Some(l) => &bytes[..l.min(bytes.len())],
        None => bytes,
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match &self.origin {
            Origin::Memory(b) => format!("memory({} bytes)", b.len()),
            Origin::Static(b) => format!("static({} bytes)", b.len()),
            Origin::Path(p) => format!("path({})", p.display()),
            Origin::SeekableStream => "seekable-stream".to_string(),
            Origin::UnseekableStream => "unseekable-stream".to_string(),
        };
        f.debug_struct("DataSource")
            .field("origin", &origin)
            .field("extension", &self.extension)
            .field("evidence", &self.evidence)
            .finish()
    }
}

enum ReaderInner {
    Memory(Arc<[u8]>),
    Static(&'static [u8]),
    Shared(Arc<Mutex<ByteCache>>),
}

/// Independent seekable cursor over a [`DataSource`]'s bytes.
///
/// The visible length is fixed at creation; concurrent cache growth is not
/// observed.
pub struct DataReader {
    inner: ReaderInner,
    len: u64,
    pos: u64,
}

impl Read for DataReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos >= self.len {
            return Ok(0);
        }
        let available = (self.len - self.pos) as usize;
        let n = buf.len().min(available);
        let start = self.pos as usize;
        match &self.inner {
            ReaderInner::Memory(bytes) => buf[..n].copy_from_slice(&bytes[start..start + n]),
            ReaderInner::Static(bytes) => buf[..n].copy_from_slice(&bytes[start..start + n]),
            ReaderInner::Shared(cache) => {
                let cache = cache.lock();
                buf[..n].copy_from_slice(&cache.bytes[start..start + n]);
            }
        }
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for DataReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::End(n) => self.len as i128 + n as i128,
            SeekFrom::Current(n) => self.pos as i128 + n as i128,
        };
        if target < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of data source",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::{PLAIN_TEXT_MIME_TYPE, ZIP_MIME_TYPE};
    use std::io::Cursor;

    #[test]
    fn test_span_memory_limit() {
        let ds = DataSource::from_vec(b"hello world".to_vec());
        assert_eq!(&*ds.span(Some(5)).unwrap(), b"hello");
        assert_eq!(&*ds.span(None).unwrap(), b"hello world");
        assert_eq!(&*ds.span(Some(100)).unwrap(), b"hello world");
    }

    #[test]
    fn test_unseekable_cache_grows_in_place() {
        let ds = DataSource::from_unseekable(Cursor::new(b"abcdefghij".to_vec()));
        assert_eq!(ds.string(Some(3)).unwrap(), "abc");
        assert_eq!(ds.string(Some(7)).unwrap(), "abcdefg");
        // Prefix stability: string(n) is a prefix of string(m) for m >= n.
        assert_eq!(ds.string(None).unwrap(), "abcdefghij");
        assert_eq!(ds.string(Some(3)).unwrap(), "abc");
    }

    #[test]
    fn test_seekable_size_memoised() {
        let ds = DataSource::from_seekable(Cursor::new(b"0123456789".to_vec()));
        assert_eq!(ds.string(Some(4)).unwrap(), "0123");
        assert_eq!(ds.string(None).unwrap(), "0123456789");
    }

    #[test]
    fn test_istream_does_not_observe_growth() {
        let ds = DataSource::from_unseekable(Cursor::new(b"0123456789".to_vec()));
        ds.span(Some(4)).unwrap();
        let mut reader = ds.istream().unwrap();
        // istream fills the cache completely before freezing.
        let mut all = String::new();
        reader.read_to_string(&mut all).unwrap();
        assert_eq!(all, "0123456789");

        let mut reader = ds.istream().unwrap();
        reader.seek(SeekFrom::Start(5)).unwrap();
        let mut tail = String::new();
        reader.read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "56789");
    }

    #[test]
    fn test_path_origin_reads_and_tags_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"file contents here").unwrap();

        let ds = DataSource::from_path(&path);
        assert_eq!(ds.file_extension().unwrap().as_str(), "txt");
        assert_eq!(ds.string(Some(4)).unwrap(), "file");
        assert_eq!(ds.string(None).unwrap(), "file contents here");

        let missing = DataSource::from_path(dir.path().join("absent.txt"));
        let err = missing.span(None).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }

    #[test]
    fn test_evidence_upgrade_only() {
        let mut ds = DataSource::from_vec(Vec::new());
        let mime = MimeType::new(ZIP_MIME_TYPE);
        ds.add_mime_type(mime.clone(), Confidence::High);
        ds.add_mime_type(mime.clone(), Confidence::Low);
        assert_eq!(ds.mime_type_confidence(&mime), Confidence::High);
        ds.add_mime_type(mime.clone(), Confidence::Highest);
        assert_eq!(ds.mime_type_confidence(&mime), Confidence::Highest);
    }

    #[test]
    fn test_highest_confidence_tie_keeps_first() {
        let mut ds = DataSource::from_vec(Vec::new());
        ds.add_mime_type(MimeType::new(PLAIN_TEXT_MIME_TYPE), Confidence::VeryHigh);
        ds.add_mime_type(MimeType::new(ZIP_MIME_TYPE), Confidence::VeryHigh);
        assert_eq!(
            ds.highest_confidence_mime_type().unwrap().as_str(),
            PLAIN_TEXT_MIME_TYPE
        );
    }

    #[test]
    fn test_assert_not_encrypted() {
        let mut ds = DataSource::from_vec(Vec::new());
        ds.assert_not_encrypted().unwrap();
        ds.add_mime_type(MimeType::new(ENCRYPTED_MIME_TYPE), Confidence::High);
        let err = ds.assert_not_encrypted().unwrap_err();
        assert!(err.contains_tag(crate::error::ErrorTag::FileEncrypted));
    }

    #[test]
    fn test_clone_shares_cache() {
        let ds = DataSource::from_unseekable(Cursor::new(b"shared bytes".to_vec()));
        let clone = ds.clone();
        assert_eq!(ds.string(Some(6)).unwrap(), "shared");
        // The clone sees the same cache and can keep extending it.
        assert_eq!(clone.string(None).unwrap(), "shared bytes");
    }
}
