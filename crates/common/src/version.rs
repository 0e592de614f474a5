use std::fmt;

use serde::Serialize;

/// Build metadata reported at startup and on the version endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub repo_version: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, profile: {}, features: {})",
            self.version, self.repo_version, self.build_profile, self.build_features
        )
    }
}

/// Build info for the crate invoking the macro
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            build_profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
            build_features: match option_env!("BUILD_FEATURES") {
                Some(features) => features,
                None => "default",
            },
            repo_version: match option_env!("REPO_VERSION") {
                Some(version) => version,
                None => "unknown",
            },
        }
    };
}

/// Build info for this library
pub fn build_info() -> BuildInfo {
    build_info!()
}
