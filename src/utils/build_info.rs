//! Build metadata captured by `build.rs`.

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_status: &'static str,
    pub timestamp: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

pub fn current() -> BuildInfo {
    BuildInfo {
        version: CLI_VERSION,
        git_hash: env!("FORMDESK_BUILD_HASH"),
        git_status: env!("FORMDESK_BUILD_STATUS"),
        timestamp: env!("FORMDESK_BUILD_TIMESTAMP"),
        target: env!("FORMDESK_BUILD_TARGET"),
        profile: env!("FORMDESK_BUILD_PROFILE"),
        rustc: env!("FORMDESK_BUILD_RUSTC"),
    }
}

impl BuildInfo {
    /// `label : value` rows in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Version", self.version.to_string()),
            ("Build hash", format!("{} ({})", self.git_hash, self.git_status)),
            ("Built at", self.timestamp.to_string()),
            ("Target", self.target.to_string()),
            ("Profile", self.profile.to_string()),
            ("Rustc", self.rustc.to_string()),
        ]
    }
}
