//! Resolution of the structure model the simulator uses for absorption.
//!
//! A user may name a local `.pdb` file (relative to the binary directory), a
//! four-character Protein Data Bank code, or anything else; the latter falls
//! back to the bundled model so that a run is never blocked on it.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const STRUCTURE_EXTENSION: &str = "pdb";

/// Answers whether a registry code exists in the public structure registry.
///
/// Implementations must bound their own waiting time; a failed or timed-out
/// lookup is reported as `false`.
pub trait RegistryProbe {
    fn code_exists(&self, code: &str) -> bool;
}

/// A probe for offline use that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistry;

impl RegistryProbe for NoRegistry {
    fn code_exists(&self, _code: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureReference {
    LocalFile(PathBuf),
    RegistryCode(String),
    Fallback(PathBuf),
}

impl StructureReference {
    /// The argument written after `PDB` in the simulator input.
    pub fn argument(&self) -> String {
        match self {
            Self::LocalFile(path) | Self::Fallback(path) => path.display().to_string(),
            Self::RegistryCode(code) => code.clone(),
        }
    }

    pub fn directive_line(&self) -> String {
        format!("PDB {}", self.argument())
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl fmt::Display for StructureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalFile(path) => write!(f, "local pdb file {}", path.display()),
            Self::RegistryCode(code) => write!(f, "PDB model {}", code),
            Self::Fallback(path) => write!(f, "default model {}", path.display()),
        }
    }
}

fn has_structure_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == STRUCTURE_EXTENSION)
}

fn is_readable_structure_file(path: &Path) -> bool {
    has_structure_extension(path) && path.is_file() && File::open(path).is_ok()
}

/// A registry code is exactly four ASCII alphanumerics with no path or
/// extension around it.
pub fn is_registry_code(reference: &str) -> bool {
    reference.len() == 4 && reference.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Decides which structure reference goes into the simulator input.
///
/// # Arguments
///
/// * `reference` - The user's string: a file name under `bin_dir`, or a code.
/// * `bin_dir` - Directory holding bundled binaries and structure files.
/// * `fallback_name` - File name of the bundled default model in `bin_dir`.
/// * `probe` - Registry lookup, only consulted for registry-code references.
///
/// # Return
///
/// Always returns a reference; an unresolvable input yields
/// [`StructureReference::Fallback`] with a warning.
pub fn resolve(
    reference: &str,
    bin_dir: &Path,
    fallback_name: &str,
    probe: &dyn RegistryProbe,
) -> StructureReference {
    let reference = reference.trim();
    let local = bin_dir.join(reference);

    if !reference.is_empty() && is_readable_structure_file(&local) {
        info!("Using local pdb file {:?}", local);
        return StructureReference::LocalFile(local);
    }

    if Path::new(reference).extension().is_some() {
        debug!(
            "Reference '{}' is a file name but not a readable structure file; skipping registry lookup.",
            reference
        );
    } else if is_registry_code(reference) {
        if probe.code_exists(reference) {
            info!("Using PDB model {}", reference);
            return StructureReference::RegistryCode(reference.to_string());
        }
        debug!("Registry lookup for '{}' found nothing.", reference);
    }

    let fallback = bin_dir.join(fallback_name);
    warn!(
        "Cannot verify PDB model '{}'. Using default model {:?}.",
        reference, fallback
    );
    StructureReference::Fallback(fallback)
}
