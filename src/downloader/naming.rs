// Output naming - sanitizing titles and avoiding collisions on repeated downloads

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Characters Windows refuses in file names
pub const FORBIDDEN_CHARACTERS: &[char] = &['"', '\\', '/', ':', '*', '?', '<', '>', '|'];

/// Drop every forbidden character; everything else is kept as-is, in order.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_CHARACTERS.contains(c)).collect()
}

fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

fn numbered(name: &str, i: u32) -> String {
    format!("{} ({})", name, i)
}

fn with_extension(name: &str, ext: &str) -> String {
    format!("{}.{}", name, ext)
}

/// `name`, or `"{name} (i)"` with the smallest free `i >= 1`, for a directory under `root`.
///
/// Counts up from 1, so gaps left by deleted entries are reused.
pub fn unique_dir_name(root: &Path, name: &str) -> String {
    if !entry_exists(&root.join(name)) {
        return name.to_string();
    }

    let mut i = 1;
    while entry_exists(&root.join(numbered(name, i))) {
        i += 1;
    }
    numbered(name, i)
}

/// Same as [`unique_dir_name`] but checks `"{name}.{ext}"`. The result has no extension.
pub fn unique_file_name(root: &Path, name: &str, ext: &str) -> String {
    if !entry_exists(&root.join(with_extension(name, ext))) {
        return name.to_string();
    }

    let mut i = 1;
    while entry_exists(&root.join(with_extension(&numbered(name, i), ext))) {
        i += 1;
    }
    numbered(name, i)
}

/// Create the first free `name` / `"{name} (i)"` directory under `root`.
///
/// Creation itself is the existence check, so two concurrent callers never
/// end up with the same directory.
pub fn create_unique_dir(root: &Path, name: &str) -> io::Result<PathBuf> {
    loop {
        let path = root.join(unique_dir_name(root, name));
        match fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            // lost the race for this name, try the next one
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Create an empty placeholder for the first free `"{name}[ (i)].{ext}"` under `root`.
///
/// Returns the claimed name (without extension) and the open placeholder.
pub fn create_unique_file(root: &Path, name: &str, ext: &str) -> io::Result<(String, File)> {
    loop {
        let candidate = unique_file_name(root, name, ext);
        let path = root.join(with_extension(&candidate, ext));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}
