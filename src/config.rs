use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Suite-level configuration injected at bootstrap.
///
/// The defaults are the fixed literals the component tests run against;
/// each field can be overridden through an `EKS_TEST_*` environment
/// variable so the same suite can target another stack checkout.
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    /// Stack the components deploy into.
    pub stack: String,
    /// AWS region the stack lives in.
    pub region: String,
    /// Directory the deploy engine runs from (the stacks checkout root).
    pub base_dir: PathBuf,
    /// Destination directory of the component under test, relative to
    /// `base_dir`.
    pub component_dir: PathBuf,
    /// Deploy engine binary.
    pub atmos_bin: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            stack: "default-test".to_string(),
            region: "us-east-2".to_string(),
            base_dir: PathBuf::from("."),
            component_dir: PathBuf::from("components/terraform/eks/cluster"),
            atmos_bin: PathBuf::from("atmos"),
        }
    }
}

impl SuiteConfig {
    /// Defaults with any `EKS_TEST_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(stack) = env::var("EKS_TEST_STACK") {
            config.stack = stack;
        }
        if let Ok(region) = env::var("EKS_TEST_REGION") {
            config.region = region;
        }
        if let Ok(dir) = env::var("EKS_TEST_BASE_DIR") {
            config.base_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("EKS_TEST_COMPONENT_DIR") {
            config.component_dir = PathBuf::from(dir);
        }
        if let Ok(bin) = env::var("EKS_TEST_ATMOS_BIN") {
            config.atmos_bin = PathBuf::from(bin);
        }
        config
    }

    /// Reject configurations the suite cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.stack.is_empty() {
            return Err(Error::config("stack name must not be empty"));
        }
        if self.region.is_empty() {
            return Err(Error::config("region must not be empty"));
        }
        if self.component_dir.as_os_str().is_empty() {
            return Err(Error::config("component directory must be set"));
        }
        Ok(())
    }
}
