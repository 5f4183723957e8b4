use std::path::{Path, PathBuf};

use crate::config::resolve::{apply_env_overrides, load_fixture_config, resolve_fixture};
use crate::config::FixtureConfig;
use crate::core::package::FlagDefaults;
use crate::core::scenario::Scenario;
use crate::error::Result;
use crate::graph::oracle::ResolutionPolicy;

/// A loaded fixture: the root directory, its parsed config, and the scenario
/// replayed from it. All on-disk artifacts (descriptors, conan cache) live
/// under `output_dir`.
#[derive(Debug)]
pub struct Fixture {
    pub root: PathBuf,
    pub config: FixtureConfig,
    pub scenario: Scenario,
}

impl Fixture {
    pub fn discover(start: impl AsRef<Path>) -> Result<Self> {
        let resolved = resolve_fixture(start)?;
        Self::load_from(resolved.root, resolved.config_path)
    }

    pub fn load_from(root: PathBuf, config_path: PathBuf) -> Result<Self> {
        let mut config = load_fixture_config(&config_path)?;
        apply_env_overrides(&mut config);
        let scenario = Scenario::from_config(&config)?;

        Ok(Self {
            root,
            config,
            scenario,
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.fixture.output_dir)
    }

    pub fn conan_home(&self) -> PathBuf {
        self.output_dir().join("conan2")
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    pub fn flag_defaults(&self) -> FlagDefaults {
        FlagDefaults {
            transitive_headers: self.config.defaults.transitive_headers,
            transitive_libs: self.config.defaults.transitive_libs,
        }
    }

    pub fn default_policy(&self) -> Result<ResolutionPolicy> {
        ResolutionPolicy::parse(&self.config.defaults.policy).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown resolution policy '{}' in config",
                self.config.defaults.policy
            )
            .into()
        })
    }
}
