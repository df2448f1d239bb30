//! Locate, load, mutate and persist in one pass.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{InsertPolicy, PatchSettings};
use crate::descriptor::KernelDescriptor;
use crate::error::{PatchError, Result};
use crate::locate::locate_descriptor;

/// Position of the sysimage flag: right after the executable.
pub const FLAG_POSITION: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The flag was inserted and the descriptor rewritten.
    Patched { descriptor: PathBuf, argument: String },
    /// The descriptor already carried the flag; nothing was written.
    AlreadyPatched { descriptor: PathBuf },
}

impl PatchOutcome {
    pub fn descriptor(&self) -> &Path {
        match self {
            Self::Patched { descriptor, .. } | Self::AlreadyPatched { descriptor } => descriptor,
        }
    }
}

/// The argument to insert: marker immediately followed by the absolute sysimage path.
///
/// `base_dir` stands in for the working directory and must be absolute.
pub fn sysimage_argument(base_dir: &Path, settings: &PatchSettings) -> Result<String> {
    if !base_dir.is_absolute() {
        return Err(PatchError::RelativeBase {
            base_dir: base_dir.to_path_buf(),
        });
    }
    let image = base_dir.join(&settings.sysimage_path);
    Ok(format!("{}{}", settings.flag_marker, image.display()))
}

/// Apply the sysimage flag to `descriptor` in memory.
///
/// Returns `false` when `policy` skips an already patched descriptor.
pub fn apply_flag(
    descriptor: &mut KernelDescriptor,
    argument: &str,
    marker: &str,
    policy: InsertPolicy,
) -> Result<bool> {
    if descriptor.contains_flag(marker)? {
        match policy {
            InsertPolicy::SkipIfPresent => return Ok(false),
            InsertPolicy::Always => warn!(
                path = %descriptor.path().display(),
                marker,
                "descriptor already carries a sysimage flag; inserting another"
            ),
        }
    }
    descriptor.insert_argument(FLAG_POSITION, argument)?;
    Ok(true)
}

/// Patch the single descriptor selected by `settings`.
///
/// Errors are returned before any write, except for the final write itself.
pub fn patch_kernel(settings: &PatchSettings, base_dir: &Path) -> Result<PatchOutcome> {
    let argument = sysimage_argument(base_dir, settings)?;
    let mut descriptor = inspect_kernel(settings)?;
    debug!(argv = ?descriptor.argv()?, "argv before patch");

    if !apply_flag(
        &mut descriptor,
        &argument,
        &settings.flag_marker,
        settings.policy,
    )? {
        info!(
            path = %descriptor.path().display(),
            "sysimage flag already present; leaving descriptor unchanged"
        );
        return Ok(PatchOutcome::AlreadyPatched {
            descriptor: descriptor.path().to_path_buf(),
        });
    }

    debug!(argv = ?descriptor.argv()?, "argv after patch");
    descriptor.persist()?;
    info!(path = %descriptor.path().display(), %argument, "kernel descriptor patched");

    Ok(PatchOutcome::Patched {
        descriptor: descriptor.path().to_path_buf(),
        argument,
    })
}

/// Locate and load the descriptor without modifying it.
pub fn inspect_kernel(settings: &PatchSettings) -> Result<KernelDescriptor> {
    let path = locate_descriptor(&settings.layout)?;
    info!(path = %path.display(), "located kernel descriptor");
    KernelDescriptor::load(&path)
}
