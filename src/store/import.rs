//! Asynchronous text import.
//!
//! Reading an import source happens on a worker thread; the caller holds a
//! [`PendingImport`] and decides whether to poll it, block on it, or drop it.
//! Dropping the handle abandons the import and nothing is committed.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::error::StoreError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A byte source that can be read once, possibly slowly.
pub trait TextSource: Send + 'static {
    /// Read the full contents.
    ///
    /// # Errors
    /// Returns an error if the bytes cannot be produced.
    fn read_bytes(&mut self) -> std::io::Result<Vec<u8>>;
}

impl TextSource for Vec<u8> {
    fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
        Ok(std::mem::take(self))
    }
}

/// A file on the host filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileSource {
    fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// Decoded import, ready to become a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedText {
    pub name: String,
    pub content: String,
}

/// Observed state of a [`PendingImport`].
#[derive(Debug)]
pub enum ImportState {
    Pending,
    Text(ImportedText),
    Failed(StoreError),
}

/// Handle to an in-flight import.
#[derive(Debug)]
pub struct PendingImport {
    name: String,
    rx: Receiver<Result<String, StoreError>>,
    settled: bool,
}

impl PendingImport {
    /// Start reading `source` in the background.
    pub fn spawn(name: impl Into<String>, mut source: impl TextSource) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::channel();
        let label = name.clone();
        thread::spawn(move || {
            let result = source
                .read_bytes()
                .map_err(|err| StoreError::ReadError(err.to_string()))
                .and_then(decode_text);
            if tx.send(result).is_err() {
                tracing::debug!(name = %label, "import abandoned before the read finished");
            }
        });
        Self {
            name,
            rx,
            settled: false,
        }
    }

    /// Name the document will receive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-blocking check. A handle settles exactly once; polling a settled
    /// handle reports a read error.
    pub fn poll(&mut self) -> ImportState {
        if self.settled {
            return ImportState::Failed(StoreError::ReadError("import already consumed".into()));
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.settled = true;
                self.finish(result)
            }
            Err(TryRecvError::Empty) => ImportState::Pending,
            Err(TryRecvError::Disconnected) => {
                self.settled = true;
                ImportState::Failed(StoreError::ReadError("reader stopped unexpectedly".into()))
            }
        }
    }

    /// Block until the read completes.
    ///
    /// # Errors
    /// Returns [`StoreError::ReadError`] if the source could not be read or
    /// decoded.
    pub fn wait(self) -> Result<ImportedText, StoreError> {
        if self.settled {
            return Err(StoreError::ReadError("import already consumed".into()));
        }
        let content = self
            .rx
            .recv()
            .unwrap_or_else(|_| Err(StoreError::ReadError("reader stopped unexpectedly".into())))?;
        Ok(ImportedText {
            name: self.name,
            content,
        })
    }

    fn finish(&self, result: Result<String, StoreError>) -> ImportState {
        match result {
            Ok(content) => ImportState::Text(ImportedText {
                name: self.name.clone(),
                content,
            }),
            Err(err) => ImportState::Failed(err),
        }
    }
}

/// Decode imported bytes as UTF-8 text, dropping a leading byte-order mark.
///
/// # Errors
/// Returns [`StoreError::ReadError`] when the bytes are not valid UTF-8.
pub fn decode_text(bytes: Vec<u8>) -> Result<String, StoreError> {
    let bytes = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_vec(),
        None => bytes,
    };
    String::from_utf8(bytes).map_err(|err| StoreError::ReadError(format!("not valid UTF-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Broken;

    impl TextSource for Broken {
        fn read_bytes(&mut self) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn test_decode_strips_bom() {
        let text = decode_text(b"\xEF\xBB\xBF# Title".to_vec()).unwrap();
        assert_eq!(text, "# Title");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let err = decode_text(vec![0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, StoreError::ReadError(_)));
    }

    #[test]
    fn test_wait_yields_named_text() {
        let pending = PendingImport::spawn("notes.md", b"hello".to_vec());
        let imported = pending.wait().unwrap();
        assert_eq!(imported.name, "notes.md");
        assert_eq!(imported.content, "hello");
    }

    #[test]
    fn test_poll_eventually_settles_once() {
        let mut pending = PendingImport::spawn("a.md", b"body".to_vec());
        let deadline = Instant::now() + Duration::from_secs(5);
        let state = loop {
            match pending.poll() {
                ImportState::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(5));
                }
                other => break other,
            }
        };
        assert!(matches!(state, ImportState::Text(ref t) if t.content == "body"));
        assert!(matches!(pending.poll(), ImportState::Failed(_)));
    }

    #[test]
    fn test_read_failure_is_read_error() {
        let err = PendingImport::spawn("x.md", Broken).wait().unwrap_err();
        assert!(matches!(err, StoreError::ReadError(ref msg) if msg.contains("device gone")));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.md"));
        let err = PendingImport::spawn("absent.md", source).wait().unwrap_err();
        assert!(matches!(err, StoreError::ReadError(_)));
    }
}
