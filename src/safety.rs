//! Output path checks that keep a run from clobbering its own inputs.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Absolute form of a path when it exists, the path as given otherwise.
fn resolved(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Refuse an output path that names one of the inputs.
pub fn ensure_distinct_output(output: &Path, inputs: &[&Path]) -> Result<()> {
    let out = resolved(output);
    for input in inputs {
        if out == resolved(input) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}

/// Validates that an output path is safe to replace.
///
/// Checks:
/// - Output filename must contain the required pattern (e.g. "lexicon")
/// - Output cannot be the same as any of the provided source paths
pub fn validate_output_path(
    output: &Path,
    required_pattern: &str,
    source_paths: &[&Path],
) -> Result<()> {
    let output_name = output.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !output_name.contains(required_pattern) {
        bail!(
            "Safety check failed: output file '{}' must contain '{}' in the name",
            output.display(),
            required_pattern
        );
    }

    ensure_distinct_output(output, source_paths)
}
