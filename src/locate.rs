//! Discovery of the single kernel descriptor under a kernel root.
//!
//! The search is equivalent to the glob `<root>/<prefix>*/<file_name>`:
//! every directory entry of `root` whose name starts with `prefix` (compared
//! on raw bytes, so non-UTF-8 names count) and that holds an entry called
//! `file_name` is a candidate. The entry need not be a regular file; a
//! directory or dangling symlink still matches and fails later on read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DescriptorLayout;
use crate::error::{PatchError, Result};

/// Return the one descriptor matching `layout`.
///
/// Zero candidates yield [`PatchError::NotFound`], more than one yield
/// [`PatchError::Ambiguous`] with the candidates sorted by path.
pub fn locate_descriptor(layout: &DescriptorLayout) -> Result<PathBuf> {
    let mut candidates = candidate_descriptors(layout)?;

    match candidates.len() {
        0 => Err(PatchError::NotFound {
            pattern: layout.pattern(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(PatchError::Ambiguous {
            pattern: layout.pattern(),
            candidates,
        }),
    }
}

/// All descriptors matching `layout`, sorted. A missing root has no candidates.
pub fn candidate_descriptors(layout: &DescriptorLayout) -> Result<Vec<PathBuf>> {
    let root = &layout.root;
    if !root.is_dir() {
        debug!(root = %root.display(), "kernel root does not exist");
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(root).map_err(|source| read_error(root, source))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| read_error(root, source))?;
        let name = entry.file_name();
        let name = name.as_encoded_bytes();
        if !name.starts_with(layout.dir_prefix.as_bytes()) || name.starts_with(b".") {
            continue;
        }

        let kernel_dir = entry.path();
        if !kernel_dir.is_dir() {
            continue;
        }
        let descriptor = kernel_dir.join(&layout.file_name);
        if fs::symlink_metadata(&descriptor).is_err() {
            continue;
        }
        debug!(path = %descriptor.display(), "kernel descriptor candidate");
        candidates.push(descriptor);
    }

    candidates.sort();
    Ok(candidates)
}

fn read_error(root: &Path, source: io::Error) -> PatchError {
    PatchError::Read {
        path: root.to_path_buf(),
        source,
    }
}
