use crate::error::ModFileError;

/// Accept `v` followed by a semantic version, including pseudo-versions
/// (`v0.0.0-20191109021931-daa7c04131f5`) and `+incompatible` builds.
pub fn check_version(version: &str) -> Result<(), ModFileError> {
    let invalid = |reason: String| ModFileError::InvalidVersion {
        version: version.to_string(),
        reason,
    };
    let bare = version
        .strip_prefix('v')
        .ok_or_else(|| invalid("missing v prefix".to_string()))?;
    semver::Version::parse(bare).map_err(|e| invalid(e.to_string()))?;
    Ok(())
}
