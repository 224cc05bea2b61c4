//! Capability-based helpers for locating and opening input files.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io;

/// Open a UTF-8 path for reading using ambient authority.
pub fn open_input(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Open the directory containing `path` and return it with the file name.
///
/// A bare file name resolves against the current directory.
pub fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Whether `path` is a regular file.
///
/// Missing paths surface as [`io::ErrorKind::NotFound`] so callers can tell
/// them apart from directories.
pub fn is_regular_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_dir_and_name(path)?;
    Ok(dir.metadata(name.as_str())?.is_file())
}
