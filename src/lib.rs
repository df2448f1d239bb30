//! Patch a Jupyter Julia kernel descriptor so the kernel starts from a
//! precompiled sysimage.
//!
//! The crate finds the one `kernel.json` under a kernel root, inserts
//! `-J<base>/.scripts/full_sysimage.so` right after the executable in its
//! `argv`, and writes the file back with every other key unchanged.
//!
//! # Pipeline
//!
//! ```text
//! locate_descriptor ──► KernelDescriptor::load ──► apply_flag ──► persist
//!  (exactly one match)    (JSON object + argv)     (argv[1])     (overwrite)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use kernelspec_sysimage::{patch_kernel, PatchOutcome, PatchSettings};
//! use std::path::Path;
//!
//! let settings = PatchSettings::default();
//! match patch_kernel(&settings, Path::new("/home/jovyan"))? {
//!     PatchOutcome::Patched { descriptor, argument } => {
//!         println!("{} <- {}", descriptor.display(), argument);
//!     }
//!     PatchOutcome::AlreadyPatched { descriptor } => {
//!         println!("{} unchanged", descriptor.display());
//!     }
//! }
//! # Ok::<(), kernelspec_sysimage::PatchError>(())
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod locate;
pub mod logging;
pub mod patch;

pub use config::{DescriptorLayout, InsertPolicy, PatchSettings};
pub use descriptor::KernelDescriptor;
pub use error::{ErrorKind, PatchError};
pub use locate::locate_descriptor;
pub use patch::{inspect_kernel, patch_kernel, sysimage_argument, PatchOutcome};
