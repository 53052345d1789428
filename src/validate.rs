use std::path::Path;

use crate::catalog::DocumentSpec;
use crate::error::BuildError;

/// Checks that an export landed where expected: `<root>/<output_dir>/index.html`.
pub fn validate_output_dir(root: &Path, doc: &DocumentSpec) -> Result<(), BuildError> {
    let dir = doc.output_path(root);
    if !dir.is_dir() {
        return Err(BuildError::MissingOutputDir { dir });
    }

    let index = dir.join("index.html");
    if !index.is_file() {
        return Err(BuildError::MissingIndex { path: index });
    }

    tracing::info!(path = %index.display(), "validated export output");
    Ok(())
}
