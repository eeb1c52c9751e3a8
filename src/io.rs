//! Host platform seams: filesystem/fetch access and diagnostics.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

/// Filesystem and network access consumed by the codec.
///
/// The codec never touches `std::fs` directly; hosts inject an
/// implementation, which keeps the core usable from sandboxes, archives,
/// and tests.
pub trait IoPlatform {
    /// Reads a file into memory.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Writes a file, replacing any previous content.
    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Resolves a relative URI against a base path.
    fn resolve(&self, base: &Path, relative: &str) -> PathBuf {
        base.join(relative)
    }

    /// Fetches a remote resource.
    fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        Err(Error::UnresolvedResource(format!(
            "no fetch support for {uri:?}"
        )))
    }

    /// A monotonic instant, for diagnostics only.
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// `std::fs`-backed platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeIo;

impl IoPlatform for NativeIo {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                Error::UnresolvedResource(format!("{}: not found", path.display()))
            }
            _ => Error::Io(e),
        })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// In-memory platform for tests and virtual assets.
#[derive(Debug, Default)]
pub struct MemoryIo {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryIo {
    /// Creates an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file.
    pub fn insert(&self, path: impl Into<PathBuf>, data: Vec<u8>) {
        self.files.lock().unwrap().insert(path.into(), data);
    }

    /// Returns a copy of a file's bytes, if present.
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl IoPlatform for MemoryIo {
    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.get(path)
            .ok_or_else(|| Error::UnresolvedResource(format!("{}: not found", path.display())))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.insert(path, data.to_vec());
        Ok(())
    }
}

/// Diagnostic sink injected into the document.
///
/// The core reports non-fatal anomalies here and never decides formatting
/// or destination.
pub trait Logger {
    /// Verbose diagnostics.
    fn debug(&self, message: &str);
    /// Informational messages.
    fn info(&self, message: &str);
    /// Recoverable anomalies.
    fn warn(&self, message: &str);
    /// Failures already surfaced as errors, with extra context.
    fn error(&self, message: &str);
}

/// Default sink forwarding to the `tracing` macros; filtering and
/// formatting stay with the host's subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
