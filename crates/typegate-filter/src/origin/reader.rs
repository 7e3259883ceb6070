//! Package descriptor access.
//!
//! The classifier only needs raw descriptor bytes; where they come from is
//! behind [`DescriptorReader`] so tests can count or fake archive I/O.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use typegate_core::error::{Result, TypeGateError};
use zip::result::ZipError;
use zip::ZipArchive;

pub trait DescriptorReader: Send + Sync {
    /// Descriptor entry embedded in an archive. `Ok(None)` if the archive
    /// has no such entry.
    fn read_archive(&self, archive: &Path, entry: &str) -> Result<Option<Bytes>>;

    /// Loose descriptor file on disk. `Ok(None)` if it does not exist.
    fn read_file(&self, path: &Path) -> Result<Option<Bytes>>;
}

/// Largest descriptor the classifier will read. Anything bigger is treated
/// as a corrupt package.
pub const MAX_DESCRIPTOR_BYTES: u64 = 64 * 1024;

/// Reads descriptors from zip archives and the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveReader;

impl DescriptorReader for ArchiveReader {
    fn read_archive(&self, archive: &Path, entry: &str) -> Result<Option<Bytes>> {
        let file = File::open(archive).map_err(|e| {
            TypeGateError::Descriptor(format!("open {}: {e}", archive.display()))
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| {
            TypeGateError::Descriptor(format!("read archive {}: {e}", archive.display()))
        })?;

        let f = match zip.by_name(entry) {
            Ok(f) => f,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(TypeGateError::Descriptor(format!(
                    "{entry} in {}: {e}",
                    archive.display()
                )))
            }
        };
        // Declared size comes from the archive header; never trust it for allocation.
        if f.size() > MAX_DESCRIPTOR_BYTES {
            return Err(TypeGateError::Descriptor(format!(
                "{entry} in {} declares {} bytes (limit {MAX_DESCRIPTOR_BYTES})",
                archive.display(),
                f.size()
            )));
        }
        read_bounded(f)
            .map(Some)
            .map_err(|e| TypeGateError::Descriptor(format!("{entry} in {}: {e}", archive.display())))
    }

    fn read_file(&self, path: &Path) -> Result<Option<Bytes>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TypeGateError::Descriptor(format!("read {}: {e}", path.display())))
            }
        };
        read_bounded(file)
            .map(Some)
            .map_err(|e| TypeGateError::Descriptor(format!("read {}: {e}", path.display())))
    }
}

/// Read at most `MAX_DESCRIPTOR_BYTES`; a longer stream is an error.
fn read_bounded<R: Read>(r: R) -> io::Result<Bytes> {
    let mut buf = Vec::new();
    r.take(MAX_DESCRIPTOR_BYTES + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_DESCRIPTOR_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("descriptor exceeds {MAX_DESCRIPTOR_BYTES} bytes"),
        ));
    }
    Ok(Bytes::from(buf))
}

pub(crate) fn url_path(loc: &str) -> Option<PathBuf> {
    let url = url::Url::parse(loc).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}
