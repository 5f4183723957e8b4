use serde::Deserialize;

pub const CONFIG_FILE: &str = "arachne.toml";

/// The on-disk fixture definition. Packages are an array of tables so their
/// declaration order (and the order of their edges) survives loading; that
/// order drives emitted artifact layout and the build sequence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub fixture: FixtureSettings,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub conan: ConanConfig,
    #[serde(default)]
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub transitive_headers: bool,
    #[serde(default)]
    pub transitive_libs: bool,
    #[serde(default = "default_policy")]
    pub policy: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            transitive_headers: false,
            transitive_libs: false,
            policy: default_policy(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConanConfig {
    #[serde(default = "default_conan_bin")]
    pub bin: String,
}

impl Default for ConanConfig {
    fn default() -> Self {
        Self {
            bin: default_conan_bin(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub requires: Vec<RequireEntry>,
    #[serde(default)]
    pub test_requires: Vec<TestRequireEntry>,
}

/// Transitivity flags stay `Option<bool>` at the config boundary; absence is
/// the "unset" third state and is converted to an explicit `FlagValue`, not
/// to a default bool.
#[derive(Debug, Clone, Deserialize)]
pub struct RequireEntry {
    pub package: String,
    pub constraint: String,
    #[serde(default)]
    pub transitive_headers: Option<bool>,
    #[serde(default)]
    pub transitive_libs: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestRequireEntry {
    pub package: String,
    pub constraint: String,
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_policy() -> String {
    "ranged".to_string()
}

fn default_conan_bin() -> String {
    "conan".to_string()
}
