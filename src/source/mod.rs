//! Opening event log files.
//!
//! A source is a plain JSON-lines file, a gzip-compressed one, or a zip
//! archive whose first entry is the log. The kind is chosen by extension.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Container format of an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Plain,
    Gzip,
    Zip,
}

impl ContainerKind {
    /// Pick the container kind from the file extension (`.gz`, `.zip`).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Self::Gzip,
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Self::Zip,
            _ => Self::Plain,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gzip => "gzip",
            Self::Zip => "zip",
        }
    }
}

/// Errors opening or reading an input source. All of them abort the run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("opening {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("opening zip archive {}: {source}", path.display())]
    Archive { path: PathBuf, source: ZipError },

    #[error("zip archive {} has no entries", path.display())]
    EmptyArchive { path: PathBuf },
}

/// Open `path` and hand a line reader over its decompressed contents to `f`.
///
/// Errors returned by `f` are reported as read errors on `path`.
pub fn with_reader<T, F>(path: &Path, f: F) -> Result<T, SourceError>
where
    F: FnOnce(&mut dyn BufRead) -> io::Result<T>,
{
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let read_err = |source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    };

    match ContainerKind::from_path(path) {
        ContainerKind::Plain => {
            let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
            f(&mut reader).map_err(read_err)
        }
        ContainerKind::Gzip => {
            let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, MultiGzDecoder::new(file));
            f(&mut reader).map_err(read_err)
        }
        ContainerKind::Zip => {
            let archive_err = |source| SourceError::Archive {
                path: path.to_path_buf(),
                source,
            };
            let mut archive = ZipArchive::new(file).map_err(archive_err)?;
            if archive.is_empty() {
                return Err(SourceError::EmptyArchive {
                    path: path.to_path_buf(),
                });
            }
            let entry = archive.by_index(0).map_err(archive_err)?;
            tracing::debug!(path = %path.display(), entry = entry.name(), "reading first zip entry");
            let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, entry);
            f(&mut reader).map_err(read_err)
        }
    }
}
