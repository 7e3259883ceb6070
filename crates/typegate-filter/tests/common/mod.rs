//! Shared fixtures for filter integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use typegate_core::error::Result;
use typegate_filter::config;
use typegate_filter::origin::{ArchiveReader, DescriptorReader};
use typegate_filter::AdmissionGate;

pub const CORE: &str = "file:///opt/app/lib/app-core.jar";
pub const TRANSPORT: &str = "file:///opt/app/lib/remoting.jar";

pub const PLUGIN_MF: &str =
    "Manifest-Version: 1.0\r\nShort-Name: acme-widgets\r\nPlugin-Version: 1.4\r\n\r\n";
pub const LIBRARY_MF: &str = "Manifest-Version: 1.0\r\nImplementation-Title: acme-lib\r\n\r\n";

pub fn base_yaml(test_mode: bool) -> String {
    format!(
        r#"
version: 1
filter:
  test_mode: {test_mode}
origins:
  core: "{CORE}"
  transport: "{TRANSPORT}"
"#
    )
}

/// Archive reader that counts every descriptor read.
#[derive(Default)]
pub struct CountingReader {
    pub reads: AtomicUsize,
}

impl CountingReader {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DescriptorReader for CountingReader {
    fn read_archive(&self, archive: &Path, entry: &str) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        ArchiveReader.read_archive(archive, entry)
    }
    fn read_file(&self, path: &Path) -> Result<Option<Bytes>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        ArchiveReader.read_file(path)
    }
}

/// Gate built from yaml, activated, reading through `reader`.
pub fn gate_with_reader(yaml: &str, reader: Arc<dyn DescriptorReader>) -> AdmissionGate {
    let cfg = config::load_from_str(yaml).expect("config must parse");
    let gate = AdmissionGate::from_config_with_reader(&cfg, reader).expect("gate must build");
    gate.activate();
    gate
}

pub fn gate(yaml: &str) -> AdmissionGate {
    gate_with_reader(yaml, Arc::new(ArchiveReader))
}

/// Write a zip archive with an optional descriptor and one class entry.
pub fn write_archive(path: &Path, manifest: Option<&str>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut z = zip::ZipWriter::new(File::create(path).unwrap());
    let opts = zip::write::FileOptions::default();
    if let Some(mf) = manifest {
        z.start_file("META-INF/MANIFEST.MF", opts).unwrap();
        z.write_all(mf.as_bytes()).unwrap();
    }
    z.start_file("org/acme/Widget.class", opts).unwrap();
    z.write_all(&[0xca, 0xfe, 0xba, 0xbe]).unwrap();
    z.finish().unwrap();
}

pub fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}
