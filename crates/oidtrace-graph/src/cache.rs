//! On-disk cache of the forward reference map.
//!
//! On-disk format (UTF-8 text):
//! ```text
//! <source repr> <target repr>\n
//! ```
//! One line per edge, sorted by source then target. The backward map is never
//! written; it is rebuilt by transposition on load.
//!
//! A cache file is named after the store's latest transaction id, so any later
//! commit makes the old file unreachable rather than invalid.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use oidtrace_types::{Oid, Tid};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::maps::{ReferenceMap, ReferenceMaps};

/// File name prefix of reference cache files.
const FILE_PREFIX: &str = "references_";

/// Identifies one store state in the cache directory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for the store state whose latest transaction is `tid`.
    pub fn from_tid(tid: &Tid) -> Self {
        Self(format!("{FILE_PREFIX}{}", tid.repr()))
    }

    pub fn file_name(&self) -> &str {
        &self.0
    }
}

/// Directory of reference cache files.
#[derive(Clone, Debug)]
pub struct ReferenceCache {
    dir: PathBuf,
}

impl ReferenceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the cache file for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Load the maps stored under `key`.
    ///
    /// Returns `Ok(None)` when no cache file exists. A file that exists but
    /// cannot be parsed completely is an error; nothing from it is returned.
    pub fn load(&self, key: &CacheKey) -> GraphResult<Option<ReferenceMaps>> {
        let path = self.path_for(key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "reference cache miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let maps = read_edges(BufReader::new(file))?;
        debug!(path = %path.display(), edges = maps.edge_count(), "reference cache hit");
        Ok(Some(maps))
    }

    /// Write `maps` under `key`, replacing any previous file atomically.
    pub fn store(&self, key: &CacheKey, maps: &ReferenceMaps) -> GraphResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            write_edges(&mut writer, maps)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| GraphError::CacheIo(e.error))?;

        debug!(path = %path.display(), edges = maps.edge_count(), "stored reference cache");
        Ok(path)
    }
}

/// Serialize every edge of `maps`, one per line, sorted.
pub fn write_edges<W: Write>(writer: &mut W, maps: &ReferenceMaps) -> io::Result<()> {
    for (source, targets) in maps.forward() {
        let source_repr = source.repr();
        for target in targets {
            writeln!(writer, "{source_repr} {}", target.repr())?;
        }
    }
    Ok(())
}

/// Parse edge lines into maps. Blank lines are ignored; a line that is not
/// UTF-8 makes the whole input corrupt.
///
/// The OID set is the union of all sources and targets.
pub fn read_edges<R: BufRead>(reader: R) -> GraphResult<ReferenceMaps> {
    let mut forward = ReferenceMap::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => GraphError::CacheCorrupt {
                line: index + 1,
                reason: e.to_string(),
            },
            _ => GraphError::CacheIo(e),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (source, target) = parse_edge(line).map_err(|reason| GraphError::CacheCorrupt {
            line: index + 1,
            reason,
        })?;
        forward.entry(source).or_default().insert(target);
    }
    Ok(ReferenceMaps::from_forward(forward, []))
}

fn parse_edge(line: &str) -> Result<(Oid, Oid), String> {
    let mut fields = line.split_whitespace();
    let (Some(source), Some(target), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(format!("expected two OIDs, got {line:?}"));
    };
    let parse = |repr: &str| Oid::from_repr(repr).map_err(|e| format!("{repr:?}: {e}"));
    Ok((parse(source)?, parse(target)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn oid(n: u64) -> Oid {
        Oid::from_u64(n)
    }

    fn sample_maps() -> ReferenceMaps {
        let mut forward = ReferenceMap::new();
        forward.entry(oid(0x10)).or_default().extend([oid(0x02), oid(0x01)]);
        forward.entry(oid(0x00)).or_default().insert(oid(0x10));
        ReferenceMaps::from_forward(forward, [])
    }

    #[test]
    fn key_is_named_after_tid() {
        let key = CacheKey::from_tid(&Tid::from_u64(0x03d2));
        assert_eq!(key.file_name(), "references_0x03d2");
        let cache = ReferenceCache::new("/tmp/c");
        assert_eq!(cache.path_for(&key), PathBuf::from("/tmp/c/references_0x03d2"));
    }

    #[test]
    fn written_lines_are_sorted() {
        let mut out = Vec::new();
        write_edges(&mut out, &sample_maps()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0x00 0x10\n0x10 0x01\n0x10 0x02\n"
        );
    }

    #[test]
    fn single_line_loads_both_directions() {
        let maps = read_edges(Cursor::new("0xAA 0xBB\n")).unwrap();
        assert_eq!(
            maps.references(&oid(0xaa)).iter().copied().collect::<Vec<_>>(),
            vec![oid(0xbb)]
        );
        assert_eq!(
            maps.back_references(&oid(0xbb)).iter().copied().collect::<Vec<_>>(),
            vec![oid(0xaa)]
        );
        assert_eq!(
            maps.oids().iter().copied().collect::<Vec<_>>(),
            vec![oid(0xaa), oid(0xbb)]
        );
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let maps = read_edges(Cursor::new("\n  0x01   0x02  \n\n")).unwrap();
        assert_eq!(maps.edge_count(), 1);
    }

    #[test]
    fn malformed_lines_are_corrupt() {
        for (text, bad_line) in [
            ("0x01 0x02\n0x03\n", 2),
            ("0x01 0x02 0x03\n", 1),
            ("0x01 0xzz\n", 1),
        ] {
            match read_edges(Cursor::new(text)) {
                Err(GraphError::CacheCorrupt { line, .. }) => assert_eq!(line, bad_line),
                other => panic!("expected corrupt cache for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let bytes: &[u8] = b"0x01 0x02\n0x03 \xff\xfe\n";
        match read_edges(Cursor::new(bytes)) {
            Err(GraphError::CacheCorrupt { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected corrupt cache, got {other:?}"),
        }
    }

    #[test]
    fn store_then_load_restores_maps() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReferenceCache::new(dir.path().join("nested"));
        let key = CacheKey::from_tid(&Tid::from_u64(7));
        assert_eq!(cache.path_for(&key), cache.dir().join("references_0x07"));

        assert!(cache.load(&key).unwrap().is_none());

        let maps = sample_maps();
        let path = cache.store(&key, &maps).unwrap();
        assert!(path.exists());
        assert_eq!(cache.load(&key).unwrap(), Some(maps));
    }

    #[test]
    fn other_keys_do_not_see_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ReferenceCache::new(dir.path());
        cache
            .store(&CacheKey::from_tid(&Tid::from_u64(1)), &sample_maps())
            .unwrap();
        assert!(cache
            .load(&CacheKey::from_tid(&Tid::from_u64(2)))
            .unwrap()
            .is_none());
    }
}
