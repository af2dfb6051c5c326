//! File and mmap plumbing underneath one generation of the database.
//!
//! Equivalent to the `dfd`/`fname`-based open path and the `mcdb_mmap_t`
//! fields of `mcdb_mmap_init`/`mcdb_mmap_create` in the mcdb source: a
//! [`Source`] remembers how to (re)open the backing file — optionally
//! relative to an already-open directory descriptor, the way mcdb supports
//! opening `dname/fname` without repeatedly resolving `dname` — and a
//! [`GenerationData`] is the immutable result of one such open: a mapping,
//! its size, and the mtime recorded at mapping time for staleness checks.

use std::fs::File;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use memmap2::{Advice, Mmap, MmapOptions};
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;

use crate::config::{MAX_FILE_SIZE, RANDOM_ADVISE_THRESHOLD};
use crate::error::{Error, Result};

/// How to (re)open one database file across generations.
///
/// Holding the directory descriptor open for the lifetime of the [`crate::Db`]
/// means every `reopen_threadsafe` resolves `filename` relative to the same
/// directory inode even if the path component itself is later renamed
/// elsewhere in the tree — mirroring the `dfd` parameter taken by
/// `mcdb_mmap_init` in the C original instead of re-resolving a full path.
pub(crate) struct Source {
    dir_fd: Option<OwnedFd>,
    filename: PathBuf,
    display_path: PathBuf,
}

impl Source {
    /// Opens `dirname` (if given) once and remembers `filename` relative to
    /// it. When `dirname` is `None`, `filename` is opened directly and may
    /// be absolute or relative to the process's current directory.
    pub(crate) fn open(dirname: Option<&Path>, filename: &Path) -> Result<Self> {
        let dir_fd = match dirname {
            Some(dir) => {
                let fd = fcntl::open(dir, OFlag::O_RDONLY | OFlag::O_DIRECTORY, Mode::empty())
                    .map_err(|errno| Error::OpenError {
                        path: dir.to_path_buf(),
                        source: std::io::Error::from(errno),
                    })?;
                Some(unsafe { OwnedFd::from_raw_fd(fd) })
            }
            None => None,
        };
        let display_path = match dirname {
            Some(dir) => dir.join(filename),
            None => filename.to_path_buf(),
        };
        log::debug!("source opened: {display_path:?}");
        Ok(Source {
            dir_fd,
            filename: filename.to_path_buf(),
            display_path,
        })
    }

    /// The path used in error messages and logging; not necessarily
    /// resolvable on its own when a directory descriptor is in play.
    pub(crate) fn display_path(&self) -> &Path {
        &self.display_path
    }

    /// Opens a fresh handle to the current on-disk contents of this source.
    /// `O_NONBLOCK` mirrors the original's open flags so that opening a FIFO
    /// or similarly exotic path never blocks the maintenance thread;
    /// `O_CLOEXEC` keeps the descriptor out of child processes spawned by
    /// the caller between generations.
    fn open_file(&self) -> Result<File> {
        let flags = OFlag::O_RDONLY | OFlag::O_CLOEXEC | OFlag::O_NONBLOCK;
        let fd = match &self.dir_fd {
            Some(dir_fd) => fcntl::openat(dir_fd.as_raw_fd(), &self.filename, flags, Mode::empty()),
            None => fcntl::open(&self.filename, flags, Mode::empty()),
        }
        .map_err(|errno| Error::OpenError {
            path: self.display_path.clone(),
            source: std::io::Error::from(errno),
        })?;
        Ok(unsafe { File::from_raw_fd(fd) })
    }

    /// Current mtime of the file, in whole seconds, without mapping it.
    /// Used by [`GenerationData::is_stale`] to decide whether a
    /// `refresh_check` needs to actually reopen.
    pub(crate) fn stat_mtime(&self) -> Result<i64> {
        let file = self.open_file()?;
        let meta = file.metadata().map_err(|source| Error::StatError {
            path: self.display_path.clone(),
            source,
        })?;
        Ok(meta.mtime())
    }
}

/// One immutable, fully-mapped generation of the database.
///
/// Everything a [`crate::Handle`] reads during a probe comes out of `mmap`;
/// nothing here ever changes after construction. Equivalent to the
/// snapshot of fields (`map`, `size`, `mtime`) captured by a single
/// successful `mcdb_mmap_init` call.
pub(crate) struct GenerationData {
    mmap: Mmap,
    size: u64,
    mtime: i64,
}

impl GenerationData {
    /// Opens and maps the current contents of `source`.
    pub(crate) fn open(source: &Source) -> Result<Self> {
        let result = Self::open_inner(source);
        match &result {
            Ok(data) => log::debug!(
                "mapped {:?}: {} bytes, mtime {}",
                source.display_path(),
                data.size,
                data.mtime
            ),
            Err(e) => log::warn!("failed to map {:?}: {e}", source.display_path()),
        }
        result
    }

    fn open_inner(source: &Source) -> Result<Self> {
        let file = source.open_file()?;
        let meta = file.metadata().map_err(|source_err| Error::StatError {
            path: source.display_path().to_path_buf(),
            source: source_err,
        })?;
        let size = meta.len();
        let mtime = meta.mtime();

        if size > MAX_FILE_SIZE {
            return Err(Error::MapError {
                path: source.display_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("file is {size} bytes, exceeds the {MAX_FILE_SIZE}-byte limit (u32 offsets would wrap)"),
                ),
            });
        }

        // mmap(2) of a zero-length file fails on most platforms; an empty
        // database is a valid (if useless) constant database, so fall back
        // to an empty in-memory mapping rather than erroring.
        let mmap = if size == 0 {
            MmapOptions::new()
                .len(0)
                .map_anon()
                .map_err(|source_err| Error::MapError {
                    path: source.display_path().to_path_buf(),
                    source: source_err,
                })?
                .make_read_only()
                .map_err(|source_err| Error::MapError {
                    path: source.display_path().to_path_buf(),
                    source: source_err,
                })?
        } else {
            let map = unsafe { MmapOptions::new().map(&file) }.map_err(|source_err| {
                Error::MapError {
                    path: source.display_path().to_path_buf(),
                    source: source_err,
                }
            })?;
            if size > RANDOM_ADVISE_THRESHOLD {
                // Best-effort: a probe touches a handful of widely scattered
                // offsets, never a run of consecutive pages, so tell the
                // kernel not to bother with sequential readahead. Failure
                // here (e.g. on platforms without MADV_RANDOM) is harmless.
                let _ = map.advise(Advice::Random);
            }
            map
        };

        Ok(GenerationData { mmap, size, mtime })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn mtime(&self) -> i64 {
        self.mtime
    }
}
