//! Safety checks run before any network traffic.
//!
//! The project is only written after the whole catalog has been fetched, so
//! an unusable output path should be caught up front rather than after a
//! long sync.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path can receive the project file.
///
/// Checks:
/// - Output must not be an existing directory
/// - Output's parent directory must exist
/// - Output cannot be the same as any of the protected paths (e.g. the config)
pub fn validate_output_path(output: &Path, protected: &[&Path]) -> Result<()> {
    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is a directory",
            output.display()
        );
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            bail!(
                "Safety check failed: directory '{}' for output does not exist",
                parent.display()
            );
        }
    }

    for path in protected {
        if same_file(output, path) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as '{}'",
                output.display(),
                path.display()
            );
        }
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
