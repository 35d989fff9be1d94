//! Project slug convention.
//!
//! A slug is the on-disk directory name of a project, derived from its
//! display name.

use crate::error::CoreError;

/// Name of the shared upload-staging directory under the project root.
///
/// Never treated as a project.
pub const INPUT_FILES_DIR: &str = "input_files";

/// Derive a project slug from a display name.
///
/// Convention: lowercase, each space replaced by an underscore. Other
/// characters pass through untouched and runs of spaces are not collapsed.
///
/// # Examples
///
/// ```
/// use blendfarm_core::naming::slugify;
///
/// assert_eq!(slugify("My Cool Scene"), "my_cool_scene");
/// assert_eq!(slugify("my_cool_scene"), "my_cool_scene");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Check that `slug` is safe to join onto the project root.
///
/// Rejects empty slugs, path separators, hidden/relative names, and the
/// reserved staging directory.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.trim().is_empty() {
        return Err(CoreError::Validation(
            "Project name must not be empty".to_string(),
        ));
    }
    if slug.contains('/') || slug.contains('\\') || slug.contains('\0') {
        return Err(CoreError::Validation(format!(
            "Project slug '{slug}' must not contain path separators"
        )));
    }
    if slug.starts_with('.') {
        return Err(CoreError::Validation(format!(
            "Project slug '{slug}' must not start with '.'"
        )));
    }
    if slug == INPUT_FILES_DIR {
        return Err(CoreError::Validation(format!(
            "'{INPUT_FILES_DIR}' is reserved for uploads"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn spaces_become_underscores() {
        assert_eq!(slugify("My Cool Scene"), "my_cool_scene");
    }

    #[test]
    fn rename_target_slug() {
        assert_eq!(slugify("My Cool Scene 2"), "my_cool_scene_2");
    }

    #[test]
    fn slugify_is_idempotent() {
        for name in ["My Cool Scene", "  Padded  ", "ALLCAPS", "mixed_Case Name", ""] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {name:?}");
        }
    }

    #[test]
    fn double_space_is_not_collapsed() {
        assert_eq!(slugify("Slow  Walk"), "slow__walk");
    }

    #[test]
    fn valid_slug_passes() {
        assert!(validate_slug("my_cool_scene").is_ok());
    }

    #[test]
    fn empty_slug_rejected() {
        assert_matches!(validate_slug(""), Err(CoreError::Validation(_)));
        assert_matches!(validate_slug("   "), Err(CoreError::Validation(_)));
    }

    #[test]
    fn traversal_rejected() {
        assert_matches!(validate_slug("../etc"), Err(CoreError::Validation(_)));
        assert_matches!(validate_slug("a/b"), Err(CoreError::Validation(_)));
        assert_matches!(validate_slug(".hidden"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn staging_dir_is_reserved() {
        assert_matches!(
            validate_slug(INPUT_FILES_DIR),
            Err(CoreError::Validation(_))
        );
    }
}
