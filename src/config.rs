use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

pub const DEFAULT_KERNEL_ROOT: &str = "/srv/conda/envs/notebook/share/jupyter/kernels";
pub const DEFAULT_KERNEL_DIR_PREFIX: &str = "julia-";
pub const DEFAULT_DESCRIPTOR_FILE: &str = "kernel.json";
pub const DEFAULT_SYSIMAGE_PATH: &str = ".scripts/full_sysimage.so";
pub const DEFAULT_FLAG_MARKER: &str = "-J";

/// Whether a second run inserts the sysimage flag again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPolicy {
    /// Insert unconditionally. Repeated runs stack the flag at position 1.
    #[default]
    Always,
    /// Leave the descriptor untouched when an argument already carries the marker.
    SkipIfPresent,
}

/// Where to look for the kernel descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorLayout {
    pub root: PathBuf,
    pub dir_prefix: String,
    pub file_name: String,
}

impl DescriptorLayout {
    /// Glob-style rendering of the search, used in error messages.
    pub fn pattern(&self) -> String {
        format!(
            "{}/{}*/{}",
            self.root.display(),
            self.dir_prefix,
            self.file_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSettings {
    pub layout: DescriptorLayout,
    /// Sysimage location relative to the base directory.
    pub sysimage_path: PathBuf,
    pub flag_marker: String,
    pub policy: InsertPolicy,
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            layout: DescriptorLayout {
                root: PathBuf::from(DEFAULT_KERNEL_ROOT),
                dir_prefix: DEFAULT_KERNEL_DIR_PREFIX.to_string(),
                file_name: DEFAULT_DESCRIPTOR_FILE.to_string(),
            },
            sysimage_path: PathBuf::from(DEFAULT_SYSIMAGE_PATH),
            flag_marker: DEFAULT_FLAG_MARKER.to_string(),
            policy: InsertPolicy::Always,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct PatchSettingsToml {
    kernel_root: Option<PathBuf>,
    kernel_dir_prefix: Option<String>,
    descriptor_file: Option<String>,
    sysimage_path: Option<PathBuf>,
    flag_marker: Option<String>,
    skip_if_present: Option<bool>,
}

impl PatchSettings {
    /// Load settings from a TOML file. Absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self> {
        let parsed: PatchSettingsToml = toml::from_str(raw).map_err(|err| PatchError::Config {
            path: origin.to_path_buf(),
            reason: err.message().to_string(),
        })?;

        let mut settings = Self::default();
        if let Some(root) = parsed.kernel_root {
            settings.layout.root = root;
        }
        if let Some(prefix) = parsed.kernel_dir_prefix {
            settings.layout.dir_prefix = prefix;
        }
        if let Some(file_name) = parsed.descriptor_file {
            settings.layout.file_name = file_name;
        }
        if let Some(sysimage_path) = parsed.sysimage_path {
            settings.sysimage_path = sysimage_path;
        }
        if let Some(marker) = parsed.flag_marker {
            settings.flag_marker = marker;
        }
        if parsed.skip_if_present.unwrap_or(false) {
            settings.policy = InsertPolicy::SkipIfPresent;
        }

        settings.validate().map_err(|reason| PatchError::Config {
            path: origin.to_path_buf(),
            reason,
        })?;
        Ok(settings)
    }

    /// Reject settings that cannot describe a single descriptor or an absolute flag.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let file_name = self.layout.file_name.trim();
        if file_name.is_empty() {
            return Err("descriptor_file must not be empty".to_string());
        }
        if file_name.contains('/') || self.layout.dir_prefix.contains('/') {
            return Err(
                "descriptor_file and kernel_dir_prefix must be single path components".to_string(),
            );
        }
        if self.flag_marker.is_empty() {
            return Err("flag_marker must not be empty".to_string());
        }
        if self.sysimage_path.as_os_str().is_empty() {
            return Err("sysimage_path must not be empty".to_string());
        }
        if self.sysimage_path.is_absolute() {
            return Err(format!(
                "sysimage_path must be relative to the working directory, got '{}'",
                self.sysimage_path.display()
            ));
        }
        Ok(())
    }
}
