//! Blob files kept outside the object records.
//!
//! Blobs use the "bushy" layout: one directory per OID byte, each named
//! `0xNN`, with the blob files of that object inside the innermost one:
//!
//! ```text
//! <base>/0x00/0x00/0x00/0x00/0x00/0x00/0x12/0x3f/0x03d2.blob
//! ```

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use oidtrace_types::{Oid, Tid, ID_LEN, REPR_PREFIX};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// File extension of blob payloads.
pub const BLOB_EXTENSION: &str = "blob";

/// Number of leading bytes that go into a blob fingerprint.
pub const FINGERPRINT_PREFIX_LEN: u64 = 1024;

/// A blob directory on disk.
#[derive(Clone, Debug)]
pub struct BlobDirectory {
    base: PathBuf,
}

impl BlobDirectory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Every `*.blob` file below the base directory, sorted.
    pub fn blob_paths(&self) -> StoreResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.base) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == BLOB_EXTENSION)
            {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Directory holding the blobs of `oid`.
    pub fn oid_dir(&self, oid: &Oid) -> PathBuf {
        oid.as_bytes()
            .iter()
            .fold(self.base.clone(), |dir, byte| dir.join(format!("{REPR_PREFIX}{byte:02x}")))
    }

    /// Path of the blob written for `oid` by transaction `tid`.
    pub fn blob_path(&self, oid: &Oid, tid: &Tid) -> PathBuf {
        self.oid_dir(oid)
            .join(format!("{}.{BLOB_EXTENSION}", tid.repr()))
    }

    /// Recover the OID owning a blob file from its location.
    pub fn oid_for_path(&self, path: &Path) -> StoreResult<Oid> {
        let invalid = || StoreError::InvalidBlobPath(path.to_path_buf());
        let dir = path.parent().ok_or_else(invalid)?;
        let relative = dir.strip_prefix(&self.base).map_err(|_| invalid())?;

        let mut bytes = Vec::with_capacity(ID_LEN);
        for component in relative.components() {
            let Component::Normal(name) = component else {
                return Err(invalid());
            };
            let byte = name
                .to_str()
                .and_then(|s| s.strip_prefix(REPR_PREFIX))
                .filter(|digits| digits.len() == 2)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(invalid)?;
            bytes.push(byte);
        }
        Oid::from_slice(&bytes).map_err(|_| invalid())
    }
}

/// Cheap identity of a blob file: digest of its first kilobyte plus its size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobFingerprint {
    pub digest: String,
    pub size: u64,
}

impl fmt::Display for BlobFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.digest, self.size)
    }
}

/// Fingerprint a blob file.
pub fn fingerprint(path: &Path) -> StoreResult<BlobFingerprint> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut head = Vec::new();
    file.take(FINGERPRINT_PREFIX_LEN).read_to_end(&mut head)?;
    Ok(BlobFingerprint {
        digest: blake3::hash(&head).to_hex().to_string(),
        size,
    })
}
