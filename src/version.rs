//! Build metadata embedded by `build.rs`.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git branch at build time, or "unknown" outside a checkout.
pub const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

/// Git commit SHA at build time, or "unknown" outside a checkout.
pub const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Build metadata as one value, for `--version` output and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub branch: &'static str,
    pub sha: &'static str,
    pub dirty: bool,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: PKG_VERSION,
            branch: GIT_BRANCH,
            sha: GIT_SHA,
            dirty: option_env!("VERGEN_GIT_DIRTY") == Some("true"),
        }
    }

    fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }
}

impl std::fmt::Display for BuildInfo {
    /// `{version}+{branch}.{sha}`, with `.dirty` appended for modified
    /// trees. Without git metadata, just the package version.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sha == "unknown" {
            return f.write_str(self.version);
        }
        write!(f, "{}+{}.{}", self.version, self.branch, self.short_sha())?;
        if self.dirty {
            f.write_str(".dirty")?;
        }
        Ok(())
    }
}

/// Full version string, e.g. `0.1.0+main.abc1234`.
pub fn version_string() -> String {
    BuildInfo::current().to_string()
}
