use std::env;
use std::path::{Path, PathBuf};

use crate::config::fixture::CONFIG_FILE;
use crate::config::{ConfigError, FixtureConfig};

#[derive(Debug, Clone)]
pub struct ResolvedFixture {
    pub root: PathBuf,
    pub config_path: PathBuf,
}

pub fn resolve_fixture(start: impl AsRef<Path>) -> Result<ResolvedFixture, ConfigError> {
    resolve_fixture_with_overrides(start, None, None)
}

pub fn resolve_fixture_with_overrides(
    start: impl AsRef<Path>,
    root: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<ResolvedFixture, ConfigError> {
    if let Some(root) = root {
        return resolve_with_root(root);
    }

    if let Some(config) = config_path {
        return resolve_with_config(config);
    }

    if let Ok(path) = env::var("ARACHNE_ROOT") {
        return resolve_with_root(PathBuf::from(path));
    }

    if let Ok(path) = env::var("ARACHNE_CONFIG") {
        return resolve_with_config(PathBuf::from(path));
    }

    find_fixture_from(start.as_ref())
}

pub fn load_fixture_config(path: &Path) -> Result<FixtureConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

pub fn apply_env_overrides(config: &mut FixtureConfig) {
    if let Ok(output_dir) = env::var("ARACHNE_OUTPUT_DIR") {
        config.fixture.output_dir = output_dir;
    }
    if let Ok(bin) = env::var("ARACHNE_CONAN_BIN") {
        config.conan.bin = bin;
    }
}

fn resolve_with_root(root: PathBuf) -> Result<ResolvedFixture, ConfigError> {
    if !root.is_dir() {
        return Err(ConfigError::InvalidRoot(root));
    }

    let config_path = root.join(CONFIG_FILE);
    Ok(ResolvedFixture { root, config_path })
}

fn resolve_with_config(config_path: PathBuf) -> Result<ResolvedFixture, ConfigError> {
    let root = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::InvalidRoot(config_path.clone()))?;

    Ok(ResolvedFixture { root, config_path })
}

fn find_fixture_from(start: &Path) -> Result<ResolvedFixture, ConfigError> {
    for ancestor in start.ancestors() {
        let config_path = ancestor.join(CONFIG_FILE);
        if config_path.is_file() {
            return Ok(ResolvedFixture {
                root: ancestor.to_path_buf(),
                config_path,
            });
        }
    }

    Err(ConfigError::FixtureNotFound)
}
