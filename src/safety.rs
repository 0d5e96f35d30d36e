//! Output path guard for the CLI.
//!
//! Results are written as one JSON document, so the output must be a `.json`
//! file and must never be one of the release files being read.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same as any input, compared after canonicalization
///   when both paths exist
pub fn validate_output_path<P: AsRef<Path>>(output: &Path, inputs: &[P]) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
        );
    }

    let output_canonical = output.canonicalize().ok();
    for input in inputs {
        let input = input.as_ref();
        let same_file = output == input
            || matches!(
                (&output_canonical, input.canonicalize().ok()),
                (Some(out), Some(inp)) if *out == inp
            );
        if same_file {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                input.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/releases.json");
        let input = PathBuf::from("/data/release-1.json");
        assert!(validate_output_path(&output, &[&input]).is_ok());
    }

    #[test]
    fn test_output_must_be_json() {
        let output = PathBuf::from("/tmp/releases.txt");
        let result = validate_output_path(&output, &[PathBuf::from("/data/release.json")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must have a .json extension"));

        let output = PathBuf::from("/tmp/releases");
        assert!(validate_output_path::<PathBuf>(&output, &[]).is_err());
    }

    #[test]
    fn test_output_equals_input() {
        let path = PathBuf::from("/data/release.json");
        let result = validate_output_path(&path, &[&path]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot be the same as input"));
    }

    #[test]
    fn test_output_equals_input_via_relative_path() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("release.json");
        std::fs::write(&input, "{}")?;

        let aliased = dir.path().join(".").join("release.json");
        assert!(validate_output_path(&aliased, &[&input]).is_err());

        let other = dir.path().join("out.json");
        assert!(validate_output_path(&other, &[&input]).is_ok());
        Ok(())
    }
}
