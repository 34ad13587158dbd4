//! Filesystem probes used by the traversal.
//!
//! Probes never follow the entry itself when it is a symlink, and return a
//! missing entry as `Ok(None)` instead of an error.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cmptree_core::{EntryKind, ProbeError};

/// One level of a directory, split the way the traversal consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Names that are directories, following symlinks.
    pub subdirs: BTreeSet<OsString>,
    /// Every other name: files, broken symlinks, special files.
    pub files: BTreeSet<OsString>,
}

impl Listing {
    /// Names listed under the given kind.
    pub fn names(&self, kind: EntryKind) -> &BTreeSet<OsString> {
        match kind {
            EntryKind::Directory => &self.subdirs,
            _ => &self.files,
        }
    }

    fn names_mut(&mut self, kind: EntryKind) -> &mut BTreeSet<OsString> {
        match kind {
            EntryKind::Directory => &mut self.subdirs,
            _ => &mut self.files,
        }
    }

    /// Remove `name` from the names listed under `kind`.
    pub fn take(&mut self, kind: EntryKind, name: &OsStr) -> bool {
        self.names_mut(kind).remove(name)
    }

    /// Whether `name` is listed, but not under `kind`.
    pub fn holds_crossed(&self, kind: EntryKind, name: &OsStr) -> bool {
        self.names(crossed(kind)).contains(name)
    }

    /// Remove `name` from the names not listed under `kind`.
    pub fn take_crossed(&mut self, kind: EntryKind, name: &OsStr) -> bool {
        self.names_mut(crossed(kind)).remove(name)
    }

    pub fn len(&self) -> usize {
        self.subdirs.len() + self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subdirs.is_empty() && self.files.is_empty()
    }
}

/// The other half of a listing.
fn crossed(kind: EntryKind) -> EntryKind {
    match kind {
        EntryKind::Directory => EntryKind::File,
        _ => EntryKind::Directory,
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Kind of the entry at `path`, without following a final symlink.
///
/// Anything that is neither a directory nor a symlink counts as a file.
pub fn entry_kind(path: &Path) -> Result<Option<EntryKind>, ProbeError> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let file_type = meta.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            Ok(Some(kind))
        }
        Err(err) if is_missing(&err) => Ok(None),
        Err(err) => Err(ProbeError::io(path, err)),
    }
}

/// Whether `path` is a directory once symlinks are followed.
pub fn is_dir_following(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Target of the symlink at `path`.
pub fn read_link(path: &Path) -> Result<PathBuf, ProbeError> {
    fs::read_link(path).map_err(|err| ProbeError::io(path, err))
}

/// List one level of the directory at `path`.
pub fn list_dir(path: &Path) -> Result<Listing, ProbeError> {
    let mut listing = Listing::default();
    let entries = fs::read_dir(path).map_err(|err| ProbeError::io(path, err))?;

    for entry in entries {
        let entry = entry.map_err(|err| ProbeError::io(path, err))?;
        let is_dir = match entry.file_type() {
            Ok(ft) if ft.is_symlink() => is_dir_following(&entry.path()),
            Ok(ft) => ft.is_dir(),
            Err(_) => false,
        };
        if is_dir {
            listing.subdirs.insert(entry.file_name());
        } else {
            listing.files.insert(entry.file_name());
        }
    }

    Ok(listing)
}
