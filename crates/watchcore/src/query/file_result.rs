//! File metadata as seen by query predicates.
//!
//! Predicates read metadata through [`FileResult`], where both the directory
//! entry type and the full stat are optional. Directory listings usually
//! hand out the entry type for free, while stat is a blocking syscall, so
//! [`DirEntryFile`] only runs it the first time a predicate asks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::UNIX_EPOCH;

/// Entry type reported by a directory listing (`d_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// The listing did not say; consult stat.
    Unknown,
    Fifo,
    Char,
    Dir,
    Block,
    Regular,
    Symlink,
    Socket,
}

impl DType {
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            return Self::Dir;
        }
        if file_type.is_file() {
            return Self::Regular;
        }
        if file_type.is_symlink() {
            return Self::Symlink;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_block_device() {
                return Self::Block;
            }
            if file_type.is_char_device() {
                return Self::Char;
            }
            if file_type.is_fifo() {
                return Self::Fifo;
            }
            if file_type.is_socket() {
                return Self::Socket;
            }
        }
        Self::Unknown
    }
}

/// File kind as reported by stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Regular,
    Dir,
    Symlink,
    Block,
    Char,
    Fifo,
    Socket,
    /// Solaris/illumos door.
    Door,
    Other,
}

/// The parts of a stat result predicates care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInformation {
    pub kind: FileKind,
    pub size: u64,
    /// Modification time as Unix seconds, when the platform reports it.
    pub modified_at: Option<u64>,
}

impl FileInformation {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            kind: file_kind_of(metadata),
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|duration| duration.as_secs()),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::Regular
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

fn file_kind_of(metadata: &fs::Metadata) -> FileKind {
    #[cfg(any(target_os = "solaris", target_os = "illumos"))]
    {
        use std::os::unix::fs::MetadataExt;
        const S_IFMT: u32 = 0o170000;
        const S_IFDOOR: u32 = 0o150000;
        if metadata.mode() & S_IFMT == S_IFDOOR {
            return FileKind::Door;
        }
    }
    match DType::from_file_type(metadata.file_type()) {
        DType::Regular => FileKind::Regular,
        DType::Dir => FileKind::Dir,
        DType::Symlink => FileKind::Symlink,
        DType::Block => FileKind::Block,
        DType::Char => FileKind::Char,
        DType::Fifo => FileKind::Fifo,
        DType::Socket => FileKind::Socket,
        DType::Unknown => FileKind::Other,
    }
}

/// Metadata access for one candidate file.
pub trait FileResult {
    /// Base name of the file.
    fn name(&self) -> &str;

    /// Parent directory relative to the watched root; empty at the top level.
    fn dir_name(&self) -> &str;

    /// Entry type from the directory listing, if one was obtained.
    fn dtype(&self) -> Option<DType>;

    /// Full stat information, if it can be obtained.
    fn stat(&self) -> Option<FileInformation>;

    /// Path relative to the watched root.
    fn whole_name(&self) -> String {
        if self.dir_name().is_empty() {
            self.name().to_string()
        } else {
            format!("{}/{}", self.dir_name(), self.name())
        }
    }
}

/// A file result backed by a live directory entry, with lazy stat.
#[derive(Debug)]
pub struct DirEntryFile {
    path: PathBuf,
    name: String,
    dir_name: String,
    dtype: Option<DType>,
    stat: OnceLock<Option<FileInformation>>,
}

impl DirEntryFile {
    pub fn new(path: PathBuf, name: String, dir_name: String, dtype: Option<DType>) -> Self {
        Self {
            path,
            name,
            dir_name,
            dtype,
            stat: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once stat has been attempted.
    pub fn stat_attempted(&self) -> bool {
        self.stat.get().is_some()
    }
}

impl FileResult for DirEntryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn dir_name(&self) -> &str {
        &self.dir_name
    }

    fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    fn stat(&self) -> Option<FileInformation> {
        *self.stat.get_or_init(|| match fs::symlink_metadata(&self.path) {
            Ok(metadata) => Some(FileInformation::from_metadata(&metadata)),
            Err(error) => {
                log::debug!("stat failed for {}: {}", self.path.display(), error);
                None
            }
        })
    }
}

/// A file result with fixed metadata, for callers that already hold it.
#[derive(Debug, Clone, Default)]
pub struct FileSnapshot {
    pub name: String,
    pub dir_name: String,
    pub dtype: Option<DType>,
    pub stat: Option<FileInformation>,
}

impl FileSnapshot {
    /// Splits a root-relative path into directory and base name.
    pub fn at(path: &str) -> Self {
        let (dir_name, name) = match path.rfind('/') {
            Some(index) => (&path[..index], &path[index + 1..]),
            None => ("", path),
        };
        Self {
            name: name.to_string(),
            dir_name: dir_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_stat(mut self, stat: FileInformation) -> Self {
        self.stat = Some(stat);
        self
    }
}

impl FileResult for FileSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn dir_name(&self) -> &str {
        &self.dir_name
    }

    fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    fn stat(&self) -> Option<FileInformation> {
        self.stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn snapshot_splits_paths() {
        let file = FileSnapshot::at("a/b/c.txt");
        assert_eq!(file.name(), "c.txt");
        assert_eq!(file.dir_name(), "a/b");
        assert_eq!(file.whole_name(), "a/b/c.txt");

        let top = FileSnapshot::at("top");
        assert_eq!(top.dir_name(), "");
        assert_eq!(top.whole_name(), "top");
    }

    #[test]
    fn dir_entry_stat_is_lazy() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("file.txt");
        fs::write(&path, b"hello").expect("write");

        let file = DirEntryFile::new(path, "file.txt".into(), String::new(), None);
        assert!(!file.stat_attempted());
        let stat = file.stat().expect("stat");
        assert!(file.stat_attempted());
        assert!(stat.is_file());
        assert_eq!(stat.size, 5);
    }

    #[test]
    fn missing_file_has_no_stat() {
        let temp = TempDir::new().expect("tempdir");
        let file = DirEntryFile::new(temp.path().join("gone"), "gone".into(), String::new(), None);
        assert!(file.stat().is_none());
    }

    #[test]
    fn dtype_of_real_entries() {
        let temp = TempDir::new().expect("tempdir");
        fs::create_dir(temp.path().join("dir")).expect("mkdir");
        fs::write(temp.path().join("file"), b"").expect("write");

        let mut kinds: Vec<(String, DType)> = fs::read_dir(temp.path())
            .expect("read_dir")
            .map(|entry| {
                let entry = entry.expect("entry");
                let dtype = DType::from_file_type(entry.file_type().expect("file type"));
                (entry.file_name().to_string_lossy().into_owned(), dtype)
            })
            .collect();
        kinds.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            kinds,
            vec![("dir".to_string(), DType::Dir), ("file".to_string(), DType::Regular)]
        );
    }
}
