//! Error taxonomy for kernel descriptor patching.
//!
//! Every variant is fatal to the caller. [`PatchError::kind`] folds the
//! variants into the three failure classes the CLI reports on.

use std::io;
use std::path::PathBuf;

/// Coarse failure class of a [`PatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong number of descriptors, or unusable settings.
    Configuration,
    /// Descriptor content is not a usable JSON document.
    Parse,
    /// Reading or writing a file failed.
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// No descriptor matched the search pattern.
    #[error("ambiguous or missing kernel descriptor: 0 candidates matching '{pattern}'")]
    NotFound { pattern: String },

    /// More than one descriptor matched the search pattern.
    #[error(
        "ambiguous or missing kernel descriptor: {} candidates matching '{pattern}': {}",
        .candidates.len(),
        display_paths(.candidates)
    )]
    Ambiguous {
        pattern: String,
        candidates: Vec<PathBuf>,
    },

    /// The base directory for the sysimage path must be absolute.
    #[error("sysimage base directory '{}' is not absolute", .base_dir.display())]
    RelativeBase { base_dir: PathBuf },

    /// Settings rejected while loading or validating.
    #[error("invalid patch settings in '{}': {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// Descriptor is not valid JSON.
    #[error("parsing kernel descriptor '{}'", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Descriptor is valid JSON but not a usable kernel descriptor.
    #[error("invalid kernel descriptor '{}': {reason}", .path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("reading '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("writing '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. }
            | Self::Ambiguous { .. }
            | Self::RelativeBase { .. }
            | Self::Config { .. } => ErrorKind::Configuration,
            Self::Parse { .. } | Self::InvalidDescriptor { .. } => ErrorKind::Parse,
            Self::Read { .. } | Self::Write { .. } => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = PatchError::Ambiguous {
            pattern: "/k/julia-*/kernel.json".to_string(),
            candidates: vec![
                PathBuf::from("/k/julia-1.9/kernel.json"),
                PathBuf::from("/k/julia-1.10/kernel.json"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 candidates"));
        assert!(msg.contains("/k/julia-1.9/kernel.json, /k/julia-1.10/kernel.json"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_kind_mapping() {
        let io_err = PatchError::Write {
            path: PathBuf::from("/k/kernel.json"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(io_err.kind(), ErrorKind::Io);

        let parse_err = PatchError::InvalidDescriptor {
            path: PathBuf::from("/k/kernel.json"),
            reason: "missing 'argv'".to_string(),
        };
        assert_eq!(parse_err.kind(), ErrorKind::Parse);
    }
}
