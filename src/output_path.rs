//! Output path resolution.
//!
//! Turns a user-supplied (or absent) output name into an absolute path that
//! no existing file will be mixed into. Two policies exist:
//!
//! - [`UniquenessPolicy::OverwriteAfterDelete`]: the literal path is used and
//!   any file already there is deleted when the sink opens.
//! - [`UniquenessPolicy::AutoSuffix`]: `-1`, `-2`, ... is inserted before the
//!   extension until a free path is found.
//!
//! Which policy applies depends on whether the caller named the file; see
//! [`RecorderConfig`](crate::RecorderConfig).

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::{RecorderConfig, RecorderError};

/// Maximum number of `-N` suffixes tried before giving up.
pub const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

/// Base name used when the application name has no alphanumeric characters.
pub const DEFAULT_BASE_NAME: &str = "output";

/// Timestamp appended to generated names (`yyyyMMdd_HHmmss`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension of generated names.
pub const OUTPUT_EXTENSION: &str = "wav";

/// How an output path avoids clobbering existing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniquenessPolicy {
    /// Use the literal path; delete a pre-existing file before recording.
    OverwriteAfterDelete,
    /// Append `-1`, `-2`, ... before the extension until the path is free.
    AutoSuffix,
}

/// An absolute output path and the policy it was resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    /// Absolute file path.
    pub path: PathBuf,
    /// Policy the path was resolved with.
    pub policy: UniquenessPolicy,
    /// `true` if the name was synthesized rather than supplied.
    pub generated: bool,
}

/// Resolves the output path for a recording.
///
/// A missing or blank `requested` name is replaced by a name synthesized from
/// `fallback_base_name` and `started_at`. Relative paths are anchored at
/// `config.working_directory`, or the process's current directory.
///
/// # Errors
///
/// Returns [`RecorderError::Io`] if the current directory cannot be read.
pub fn resolve_output_path(
    requested: Option<&str>,
    fallback_base_name: &str,
    started_at: NaiveDateTime,
    config: &RecorderConfig,
) -> Result<ResolvedOutput, RecorderError> {
    let requested = requested.map(str::trim).filter(|name| !name.is_empty());

    let (name, policy, generated) = match requested {
        Some(name) => (
            PathBuf::from(name),
            config.explicit_output_policy,
            false,
        ),
        None => (
            PathBuf::from(synthesize_file_name(fallback_base_name, started_at)),
            config.generated_output_policy,
            true,
        ),
    };

    let absolute = if name.is_absolute() {
        name
    } else {
        let base = match &config.working_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| RecorderError::io(&name, e))?,
        };
        base.join(name)
    };

    let path = match policy {
        UniquenessPolicy::OverwriteAfterDelete => absolute,
        UniquenessPolicy::AutoSuffix => unique_path(&absolute),
    };

    tracing::debug!(path = %path.display(), ?policy, generated, "resolved output path");
    Ok(ResolvedOutput {
        path,
        policy,
        generated,
    })
}

/// Builds `<Base_Name>_<yyyyMMdd_HHmmss>.wav` from an application name.
///
/// Runs of alphanumeric characters are kept and joined with `_`; everything
/// else is dropped.
///
/// # Example
///
/// ```
/// use app_audio_recorder::output_path::synthesize_file_name;
/// use chrono::NaiveDate;
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .unwrap()
///     .and_hms_opt(12, 0, 0)
///     .unwrap();
/// assert_eq!(synthesize_file_name("Apple Music", at), "Apple_Music_20240101_120000.wav");
/// ```
pub fn synthesize_file_name(fallback_base_name: &str, started_at: NaiveDateTime) -> String {
    let base = fallback_base_name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let base = if base.is_empty() {
        DEFAULT_BASE_NAME
    } else {
        base.as_str()
    };
    format!(
        "{}_{}.{}",
        base,
        started_at.format(TIMESTAMP_FORMAT),
        OUTPUT_EXTENSION
    )
}

/// Returns `path` if nothing exists there, otherwise the first free
/// `stem-N.ext` sibling.
///
/// After [`MAX_SUFFIX_ATTEMPTS`] occupied candidates the original path is
/// returned unchanged.
pub fn unique_path(path: &Path) -> PathBuf {
    unique_path_within(path, MAX_SUFFIX_ATTEMPTS)
}

fn unique_path_within(path: &Path, max_attempts: u32) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 1..=max_attempts {
        let file_name = match &extension {
            Some(ext) => format!("{stem}-{n}.{ext}"),
            None => format!("{stem}-{n}"),
        };
        let candidate = path.with_file_name(file_name);
        if !candidate.exists() {
            return candidate;
        }
    }

    tracing::warn!(
        path = %path.display(),
        attempts = max_attempts,
        "no free suffixed path; using the original path"
    );
    path.to_path_buf()
}

/// Deletes a regular file at exactly `path`, if there is one.
///
/// Returns `true` if a file was removed.
///
/// # Errors
///
/// Returns [`RecorderError::Io`] if the file exists but cannot be removed.
pub fn remove_existing_file(path: &Path) -> Result<bool, RecorderError> {
    if !path.is_file() {
        return Ok(false);
    }
    std::fs::remove_file(path).map_err(|e| RecorderError::io(path, e))?;
    tracing::debug!(path = %path.display(), "removed pre-existing output file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn noon_new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn config_in(dir: &Path) -> RecorderConfig {
        RecorderConfig {
            working_directory: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_synthesize_apple_music() {
        assert_eq!(
            synthesize_file_name("Apple Music", noon_new_year()),
            "Apple_Music_20240101_120000.wav"
        );
    }

    #[test]
    fn test_synthesize_strips_punctuation_runs() {
        assert_eq!(
            synthesize_file_name("  Zoom.us -- (Beta) 2 ", noon_new_year()),
            "Zoom_us_Beta_2_20240101_120000.wav"
        );
    }

    #[test]
    fn test_synthesize_defaults_to_output() {
        assert_eq!(
            synthesize_file_name("!!! ---", noon_new_year()),
            "output_20240101_120000.wav"
        );
        assert_eq!(
            synthesize_file_name("", noon_new_year()),
            "output_20240101_120000.wav"
        );
    }

    #[test]
    fn test_unique_path_free() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        assert_eq!(unique_path(&path), path);
    }

    #[test]
    fn test_unique_path_increments_suffix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("take-1.wav"));

        std::fs::write(dir.path().join("take-1.wav"), b"x").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("take-2.wav"));
    }

    #[test]
    fn test_unique_path_without_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("take-1"));
    }

    #[test]
    fn test_unique_path_exhaustion_returns_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.wav");
        for name in ["take.wav", "take-1.wav", "take-2.wav"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(unique_path_within(&path, 2), path);
        assert_eq!(unique_path_within(&path, 3), dir.path().join("take-3.wav"));
    }

    #[test]
    fn test_resolve_generated_name_is_relative_to_working_directory() {
        let dir = tempdir().unwrap();
        let resolved =
            resolve_output_path(None, "Apple Music", noon_new_year(), &config_in(dir.path()))
                .unwrap();
        assert_eq!(
            resolved.path,
            dir.path().join("Apple_Music_20240101_120000.wav")
        );
        assert!(resolved.generated);
        assert_eq!(resolved.policy, UniquenessPolicy::AutoSuffix);
    }

    #[test]
    fn test_resolve_generated_name_never_collides() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Safari_20240101_120000.wav"), b"x").unwrap();
        let resolved =
            resolve_output_path(None, "Safari", noon_new_year(), &config_in(dir.path())).unwrap();
        assert_eq!(
            resolved.path,
            dir.path().join("Safari_20240101_120000-1.wav")
        );
    }

    #[test]
    fn test_resolve_explicit_name_keeps_literal_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("mine.wav"), b"x").unwrap();
        let resolved = resolve_output_path(
            Some("mine.wav"),
            "Safari",
            noon_new_year(),
            &config_in(dir.path()),
        )
        .unwrap();
        assert_eq!(resolved.path, dir.path().join("mine.wav"));
        assert_eq!(resolved.policy, UniquenessPolicy::OverwriteAfterDelete);
        assert!(!resolved.generated);
    }

    #[test]
    fn test_resolve_absolute_name_ignores_working_directory() {
        let dir = tempdir().unwrap();
        let other = tempdir().unwrap();
        let absolute = other.path().join("abs.wav");
        let resolved = resolve_output_path(
            Some(absolute.to_str().unwrap()),
            "Safari",
            noon_new_year(),
            &config_in(dir.path()),
        )
        .unwrap();
        assert_eq!(resolved.path, absolute);
    }

    #[test]
    fn test_resolve_blank_name_is_treated_as_absent() {
        let dir = tempdir().unwrap();
        let resolved =
            resolve_output_path(Some("   "), "Safari", noon_new_year(), &config_in(dir.path()))
                .unwrap();
        assert!(resolved.generated);
    }

    #[test]
    fn test_resolve_explicit_name_with_auto_suffix_override() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("mine.wav"), b"x").unwrap();
        let config = RecorderConfig {
            explicit_output_policy: UniquenessPolicy::AutoSuffix,
            ..config_in(dir.path())
        };
        let resolved =
            resolve_output_path(Some("mine.wav"), "Safari", noon_new_year(), &config).unwrap();
        assert_eq!(resolved.path, dir.path().join("mine-1.wav"));
    }

    #[test]
    fn test_remove_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.wav");
        assert!(!remove_existing_file(&path).unwrap());

        std::fs::write(&path, b"stale").unwrap();
        assert!(remove_existing_file(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_existing_file_ignores_directories() {
        let dir = tempdir().unwrap();
        assert!(!remove_existing_file(dir.path()).unwrap());
        assert!(dir.path().exists());
    }
}
