//! Mapping between object keys and local paths
//!
//! Downloads land at `<dest_dir>/<key>`; uploads are keyed by the final
//! segment of the local path.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix of the temporary file a download streams into
pub const PARTIAL_SUFFIX: &str = ".bkt-partial";

/// Longest file name most filesystems accept, in bytes
const NAME_MAX: usize = 255;

/// Derive the object key for an upload from a local path
///
/// Directory components are stripped: `./dir/b.txt` becomes `b.txt`.
pub fn upload_key(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("no file name in '{}'", path.display())))?;
    name.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("file name is not UTF-8: '{}'", path.display())))
}

/// Resolve where a downloaded object is written
///
/// Keys may contain `/` separators, which become subdirectories of
/// `dest_dir`. Keys that would escape `dest_dir` are rejected.
pub fn download_target(dest_dir: &Path, key: &str) -> Result<PathBuf> {
    if key.is_empty() {
        return Err(Error::InvalidInput("object key cannot be empty".into()));
    }
    if key.ends_with('/') {
        return Err(Error::InvalidInput(format!(
            "'{key}' names a folder marker, not an object"
        )));
    }

    let relative = Path::new(key);
    let mut target = dest_dir.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidInput(format!(
                    "key '{key}' would be written outside the download directory"
                )));
            }
        }
    }

    if target == dest_dir {
        return Err(Error::InvalidInput(format!("key '{key}' has no file name")));
    }
    Ok(target)
}

/// Sibling path a download is streamed into before being renamed in place
///
/// Names too long to take the dot and suffix are cut short and tagged with a
/// hash of the full name, so the partial name stays within `NAME_MAX`.
pub fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = format!(".{name}{PARTIAL_SUFFIX}");
    if partial.len() <= NAME_MAX {
        return target.with_file_name(partial);
    }

    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    let tag = format!("~{:016x}", hasher.finish());

    let mut keep = NAME_MAX - 1 - tag.len() - PARTIAL_SUFFIX.len();
    while !name.is_char_boundary(keep) {
        keep -= 1;
    }
    target.with_file_name(format!(".{}{tag}{PARTIAL_SUFFIX}", &name[..keep]))
}
