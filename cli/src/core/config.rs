//! # Xnat4tests Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system for xnat4tests: loading a
//! named profile, merging it over built-in defaults, validating cross-field
//! constraints and deriving computed fields. A profile describes one logical
//! test-XNAT instance (image, container and network names, port, mount
//! directories, build arguments, connection-retry budget).
//!
//! ## Architecture
//!
//! The configuration system follows these principles:
//! - A profile is a YAML file; unspecified fields keep built-in defaults and
//!   the nested `build_args` table merges key-by-key rather than wholesale.
//! - The loader input is a small tagged union (`ConfigSource`): a profile
//!   name, an explicit file path, or an already-resolved `Config` (returned
//!   unchanged, making `Config::load` idempotent).
//! - The resolved `Config` is an immutable value constructed once per
//!   invocation and passed by reference to every other component. There is
//!   no process-wide configuration state.
//!
//! Profile resolution for a bare name looks in `<home>/configs/<name>.yaml`,
//! where `<home>` is `$XNAT4TESTS_HOME` or `~/.xnat4tests`. Resolving the
//! `"default"` profile with no backing file writes out a commented template
//! and proceeds with the built-in defaults; any other missing profile is an
//! error.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use xnat4tests::core::config::{Config, ConfigSource};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config::load(ConfigSource::Name("default".into()))?;
//! println!("XNAT will be reachable at {}", cfg.xnat_uri());
//! # Ok(())
//! # }
//! ```
//!
use crate::core::error::{Result, Xnat4testsError};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// The container-internal port Tomcat listens on. The container service
/// plugin wiring inside the image assumes the published port matches it.
pub const REQUIRED_XNAT_PORT: &str = "8080";
/// Registry port expected by the XNAT container service configuration UI.
pub const REQUIRED_REGISTRY_PORT: &str = "80";
/// Mount-path prefix used inside the XNAT container.
pub const XNAT_INTERNAL_ROOT: &str = "/data/xnat";

/// Commented template written to `<home>/configs/default.yaml` the first
/// time the `default` profile is resolved without a backing file.
const DEFAULT_PROFILE_TEMPLATE: &str = "\
# Configuration profile for the xnat4tests test instance.
# All fields are optional; uncomment and edit to override the built-in
# defaults. See the README for the full field reference.
#
# xnat_root_dir: /path/to/xnat_root
# xnat_mnt_dirs:
#   - home/logs
#   - home/work
#   - build
#   - archive
#   - prearchive
# docker_build_dir: /path/to/build
# docker_image: xnat4tests
# docker_container: xnat4tests
# docker_host: localhost
# xnat_port: \"8080\"   # must match the internal port for the container service to work
# docker_registry_image: registry
# docker_registry_container: xnat4tests-docker-registry
# docker_network_name: xnat4tests
# registry_port: \"80\"  # must be 80 to avoid a bug in the XNAT CS config
# xnat_user: admin
# xnat_password: admin
# connection_attempts: 20
# connection_attempt_sleep: 5
# build_args:
#   xnat_ver: \"1.8.4\"
#   xnat_cs_plugin_ver: \"3.1.1\"
#   xnat_batch_launch_plugin_ver: \"0.6.0\"
#   java_ms: \"256m\"
#   java_mx: \"2g\"
";

/// Returns the xnat4tests home directory: `$XNAT4TESTS_HOME` if set,
/// otherwise `~/.xnat4tests`.
pub fn home_dir() -> PathBuf {
    match std::env::var_os("XNAT4TESTS_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".xnat4tests"),
    }
}

/// Identifies the configuration to load: a profile name resolved under the
/// xnat4tests home, an explicit file path, or an already-resolved `Config`.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A profile name, resolved to `<home>/configs/<name>.yaml`.
    Name(String),
    /// An explicit path to a profile file; must exist.
    Path(PathBuf),
    /// A configuration that has already been resolved; returned unchanged.
    Resolved(Config),
}

impl ConfigSource {
    /// Interprets a CLI `--config` value. Anything that looks like a path
    /// (contains a separator or carries a YAML suffix) is an explicit file
    /// path; everything else is a profile name.
    pub fn from_name_or_path(value: &str) -> ConfigSource {
        let looks_like_path = value.contains(std::path::MAIN_SEPARATOR)
            || value.ends_with(".yaml")
            || value.ends_with(".yml");
        if looks_like_path {
            ConfigSource::Path(PathBuf::from(value))
        } else {
            ConfigSource::Name(value.to_string())
        }
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource::Name("default".to_string())
    }
}

impl From<&str> for ConfigSource {
    fn from(name: &str) -> Self {
        ConfigSource::Name(name.to_string())
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Path(path)
    }
}

impl From<Config> for ConfigSource {
    fn from(cfg: Config) -> Self {
        ConfigSource::Resolved(cfg)
    }
}

/// A host-directory-to-container-path binding. `src` may be relative, in
/// which case it is joined under `xnat_root_dir` at launch time; `dest` is
/// always relative to the container's `/data/xnat` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub src: PathBuf,
    pub dest: String,
}

impl MountSpec {
    /// The host-side directory backing this mount.
    pub fn host_path(&self, root_dir: &Path) -> PathBuf {
        if self.src.is_absolute() {
            self.src.clone()
        } else {
            root_dir.join(&self.src)
        }
    }

    /// The container-side mount point (`/data/xnat/<dest>`).
    pub fn container_path(&self) -> String {
        format!("{}/{}", XNAT_INTERNAL_ROOT, self.dest)
    }
}

/// Wire form of a mount entry: either a bare relative path or a
/// `{src, dest}` map. Normalized into `MountSpec` at resolution time.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawMount {
    Bare(String),
    Map { src: PathBuf, dest: Option<String> },
}

impl RawMount {
    /// Normalizes to `{src, dest}` form. Bare entries default `dest` to the
    /// same relative path and keep `src` relative (joined under the root dir
    /// at launch). Map entries with a relative `src` are resolved against
    /// `base_dir` (the profile file's directory, or the working directory
    /// when there is no file).
    fn normalize(self, base_dir: &Path) -> MountSpec {
        match self {
            RawMount::Bare(path) => MountSpec {
                src: PathBuf::from(&path),
                dest: path,
            },
            RawMount::Map { src, dest } => {
                let dest = dest.unwrap_or_else(|| src.to_string_lossy().into_owned());
                let src = if src.is_absolute() {
                    src
                } else {
                    base_dir.join(src)
                };
                MountSpec { src, dest }
            }
        }
    }
}

/// Build arguments passed through to the Docker image build. Keys are
/// uppercased to match the ARG names in the Dockerfile template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    pub xnat_ver: String,
    pub xnat_cs_plugin_ver: String,
    pub xnat_batch_launch_plugin_ver: String,
    pub java_ms: String,
    pub java_mx: String,
}

impl Default for BuildArgs {
    fn default() -> Self {
        BuildArgs {
            xnat_ver: "1.8.4".into(),
            xnat_cs_plugin_ver: "3.1.1".into(),
            xnat_batch_launch_plugin_ver: "0.6.0".into(),
            java_ms: "256m".into(),
            java_mx: "2g".into(),
        }
    }
}

impl BuildArgs {
    /// Uppercased key/value map in the form the Dockerfile template expects.
    pub fn as_docker_args(&self) -> HashMap<String, String> {
        HashMap::from([
            ("XNAT_VER".to_string(), self.xnat_ver.clone()),
            (
                "XNAT_CS_PLUGIN_VER".to_string(),
                self.xnat_cs_plugin_ver.clone(),
            ),
            (
                "XNAT_BATCH_LAUNCH_PLUGIN_VER".to_string(),
                self.xnat_batch_launch_plugin_ver.clone(),
            ),
            ("JAVA_MS".to_string(), self.java_ms.clone()),
            ("JAVA_MX".to_string(), self.java_mx.clone()),
        ])
    }

    /// Merges file-level overrides key-by-key over `self`.
    fn merged(mut self, overlay: BuildArgsFile) -> Self {
        if let Some(v) = overlay.xnat_ver {
            self.xnat_ver = v;
        }
        if let Some(v) = overlay.xnat_cs_plugin_ver {
            self.xnat_cs_plugin_ver = v;
        }
        if let Some(v) = overlay.xnat_batch_launch_plugin_ver {
            self.xnat_batch_launch_plugin_ver = v;
        }
        if let Some(v) = overlay.java_ms {
            self.java_ms = v;
        }
        if let Some(v) = overlay.java_mx {
            self.java_mx = v;
        }
        self
    }
}

/// File form of `build_args`: every field optional so the merge is key-wise.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildArgsFile {
    xnat_ver: Option<String>,
    xnat_cs_plugin_ver: Option<String>,
    xnat_batch_launch_plugin_ver: Option<String>,
    java_ms: Option<String>,
    java_mx: Option<String>,
}

/// File form of a profile. Every field is optional; anything left
/// unspecified keeps its built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    xnat_root_dir: Option<PathBuf>,
    xnat_mnt_dirs: Option<Vec<RawMount>>,
    docker_build_dir: Option<PathBuf>,
    docker_image: Option<String>,
    docker_container: Option<String>,
    docker_host: Option<String>,
    xnat_port: Option<String>,
    docker_registry_image: Option<String>,
    docker_registry_container: Option<String>,
    docker_network_name: Option<String>,
    registry_port: Option<String>,
    xnat_user: Option<String>,
    xnat_password: Option<String>,
    connection_attempts: Option<u32>,
    connection_attempt_sleep: Option<u64>,
    build_args: Option<BuildArgsFile>,
}

/// The resolved, validated launch configuration for one test-XNAT instance.
/// Constructed once per invocation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host directory under which the mount directories are created.
    pub xnat_root_dir: PathBuf,
    /// Directories exposed from the container, normalized to `{src, dest}`.
    pub xnat_mnt_dirs: Vec<MountSpec>,
    /// Directory the image build context is staged into.
    pub docker_build_dir: PathBuf,
    pub docker_image: String,
    pub docker_container: String,
    pub docker_host: String,
    /// Published XNAT port, as a string to match the Docker API's port maps.
    pub xnat_port: String,
    pub docker_registry_image: String,
    pub docker_registry_container: String,
    pub docker_network_name: String,
    pub registry_port: String,
    pub xnat_user: String,
    pub xnat_password: String,
    /// Readiness-probe attempt budget.
    pub connection_attempts: u32,
    /// Seconds slept between failed readiness attempts.
    pub connection_attempt_sleep: u64,
    pub build_args: BuildArgs,
    /// Path of the profile file this configuration was loaded from, if any.
    /// Used in error messages that tell the user which profile to pass.
    pub loaded_from: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config::defaults_in(&home_dir())
    }
}

impl Config {
    /// Built-in defaults rooted at `home` (the xnat4tests home directory).
    fn defaults_in(home: &Path) -> Self {
        let mnt_dirs = ["home/logs", "home/work", "build", "archive", "prearchive"];
        Config {
            xnat_root_dir: home.join("xnat_root"),
            xnat_mnt_dirs: mnt_dirs
                .iter()
                .map(|d| MountSpec {
                    src: PathBuf::from(d),
                    dest: d.to_string(),
                })
                .collect(),
            docker_build_dir: home.join("build"),
            docker_image: "xnat4tests".into(),
            docker_container: "xnat4tests".into(),
            docker_host: "localhost".into(),
            xnat_port: REQUIRED_XNAT_PORT.into(),
            docker_registry_image: "registry".into(),
            docker_registry_container: "xnat4tests-docker-registry".into(),
            docker_network_name: "xnat4tests".into(),
            registry_port: REQUIRED_REGISTRY_PORT.into(),
            xnat_user: "admin".into(),
            xnat_password: "admin".into(),
            connection_attempts: 20,
            connection_attempt_sleep: 5,
            build_args: BuildArgs::default(),
            loaded_from: None,
        }
    }

    /// Derived base URI of the XNAT instance.
    pub fn xnat_uri(&self) -> String {
        format!("http://{}:{}", self.docker_host, self.xnat_port)
    }

    /// Derived registry host (the registry is addressed by hostname only;
    /// port 80 is implied by the XNAT CS configuration).
    pub fn registry_uri(&self) -> String {
        self.docker_host.clone()
    }

    /// Resolves `source` into a fully populated, validated configuration.
    ///
    /// * `Resolved` configurations are returned unchanged.
    /// * `Path` sources must point at an existing file.
    /// * `Name` sources resolve to `<home>/configs/<name>.yaml`. A missing
    ///   `default` profile writes out a commented template and proceeds with
    ///   built-in defaults; any other missing name fails with
    ///   `ConfigNotFound` (and creates no file).
    pub fn load(source: ConfigSource) -> Result<Config> {
        Config::load_with_home(&home_dir(), source)
    }

    /// As `load`, with an explicit home directory. Exposed so test suites
    /// can resolve profiles against a throwaway home without touching the
    /// process environment.
    pub fn load_with_home(home: &Path, source: ConfigSource) -> Result<Config> {
        match source {
            ConfigSource::Resolved(cfg) => Ok(cfg),
            ConfigSource::Path(path) => {
                if !path.is_file() {
                    return Err(anyhow!(Xnat4testsError::ConfigNotFound { path }));
                }
                Config::from_file(home, &path)
            }
            ConfigSource::Name(name) => {
                let path = home.join("configs").join(format!("{name}.yaml"));
                if path.is_file() {
                    Config::from_file(home, &path)
                } else if name == "default" {
                    // First run: persist a commented template so the user
                    // has something to edit, then carry on with defaults.
                    info!(
                        "No default profile found, writing template to {}",
                        path.display()
                    );
                    fs::create_dir_all(home.join("configs")).with_context(|| {
                        format!("Failed to create profile directory for {}", path.display())
                    })?;
                    fs::write(&path, DEFAULT_PROFILE_TEMPLATE).with_context(|| {
                        format!("Failed to write default profile template {}", path.display())
                    })?;
                    let cfg = Config::defaults_in(home);
                    cfg.validate()?;
                    Ok(cfg)
                } else {
                    Err(anyhow!(Xnat4testsError::ConfigNotFound { path }))
                }
            }
        }
    }

    /// Loads a profile file and merges it over the built-in defaults.
    fn from_file(home: &Path, path: &Path) -> Result<Config> {
        info!("Loading configuration profile from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from file: {}", path.display()))?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut cfg = Config::defaults_in(home);
        if let Some(v) = file.xnat_root_dir {
            cfg.xnat_root_dir = v;
        }
        if let Some(v) = file.xnat_mnt_dirs {
            cfg.xnat_mnt_dirs = v.into_iter().map(|m| m.normalize(&base_dir)).collect();
        }
        if let Some(v) = file.docker_build_dir {
            cfg.docker_build_dir = v;
        }
        if let Some(v) = file.docker_image {
            cfg.docker_image = v;
        }
        if let Some(v) = file.docker_container {
            cfg.docker_container = v;
        }
        if let Some(v) = file.docker_host {
            cfg.docker_host = v;
        }
        if let Some(v) = file.xnat_port {
            cfg.xnat_port = v;
        }
        if let Some(v) = file.docker_registry_image {
            cfg.docker_registry_image = v;
        }
        if let Some(v) = file.docker_registry_container {
            cfg.docker_registry_container = v;
        }
        if let Some(v) = file.docker_network_name {
            cfg.docker_network_name = v;
        }
        if let Some(v) = file.registry_port {
            cfg.registry_port = v;
        }
        if let Some(v) = file.xnat_user {
            cfg.xnat_user = v;
        }
        if let Some(v) = file.xnat_password {
            cfg.xnat_password = v;
        }
        if let Some(v) = file.connection_attempts {
            cfg.connection_attempts = v;
        }
        if let Some(v) = file.connection_attempt_sleep {
            cfg.connection_attempt_sleep = v;
        }
        if let Some(overlay) = file.build_args {
            cfg.build_args = cfg.build_args.merged(overlay);
        }
        cfg.loaded_from = Some(path.to_path_buf());

        cfg.validate()?;
        debug!("Resolved configuration: {:?}", cfg);
        Ok(cfg)
    }

    /// Cross-field validation. Port mismatches only warn; a configured
    /// directory whose parent does not exist is fatal.
    fn validate(&self) -> Result<()> {
        if self.xnat_port != REQUIRED_XNAT_PORT {
            warn!(
                "xnat_port is '{}' but the container service plugin expects '{}'; \
                 sibling-container launches may not work",
                self.xnat_port, REQUIRED_XNAT_PORT
            );
        }
        if self.registry_port != REQUIRED_REGISTRY_PORT {
            warn!(
                "registry_port is '{}' but the XNAT CS configuration expects '{}'",
                self.registry_port, REQUIRED_REGISTRY_PORT
            );
        }
        for (label, dir) in [
            ("xnat_root_dir", &self.xnat_root_dir),
            ("docker_build_dir", &self.docker_build_dir),
        ] {
            // A single-component relative path has an empty parent, whose
            // effective location is the working directory.
            let parent = dir
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            if !parent.exists() {
                return Err(anyhow!(Xnat4testsError::ConfigValidation(format!(
                    "Parent of {} ('{}') does not exist",
                    label,
                    parent.display()
                ))));
            }
        }
        Ok(())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_profile(home: &Path, name: &str, content: &str) -> PathBuf {
        let dir = home.join("configs");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.yaml"));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_builtin_defaults() {
        let home = tempdir().unwrap();
        let cfg = Config::defaults_in(home.path());
        assert_eq!(cfg.docker_image, "xnat4tests");
        assert_eq!(cfg.xnat_port, "8080");
        assert_eq!(cfg.registry_port, "80");
        assert_eq!(cfg.connection_attempts, 20);
        assert_eq!(cfg.connection_attempt_sleep, 5);
        assert_eq!(cfg.xnat_root_dir, home.path().join("xnat_root"));
        assert_eq!(cfg.xnat_mnt_dirs.len(), 5);
        assert_eq!(cfg.xnat_uri(), "http://localhost:8080");
        assert_eq!(cfg.registry_uri(), "localhost");
        assert_eq!(cfg.build_args.java_mx, "2g");
    }

    #[test]
    fn test_resolved_source_is_idempotent() {
        let home = tempdir().unwrap();
        let cfg = Config::defaults_in(home.path());
        let reloaded =
            Config::load_with_home(home.path(), ConfigSource::Resolved(cfg.clone())).unwrap();
        assert_eq!(reloaded.docker_container, cfg.docker_container);
        assert_eq!(reloaded.xnat_root_dir, cfg.xnat_root_dir);
    }

    #[test]
    fn test_build_args_merge_keeps_unset_fields() {
        let home = tempdir().unwrap();
        write_profile(
            home.path(),
            "heap",
            "build_args:\n  java_mx: \"1g\"\n",
        );
        let cfg = Config::load_with_home(home.path(), ConfigSource::Name("heap".into())).unwrap();
        assert_eq!(cfg.build_args.java_mx, "1g");
        // Everything else keeps its built-in default.
        assert_eq!(cfg.build_args.java_ms, "256m");
        assert_eq!(cfg.build_args.xnat_ver, "1.8.4");
        assert_eq!(cfg.build_args.xnat_cs_plugin_ver, "3.1.1");
        assert_eq!(cfg.build_args.xnat_batch_launch_plugin_ver, "0.6.0");
    }

    #[test]
    fn test_mount_normalization_bare_string() {
        let home = tempdir().unwrap();
        write_profile(home.path(), "plugins", "xnat_mnt_dirs:\n  - home/plugins\n");
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("plugins".into())).unwrap();
        assert_eq!(
            cfg.xnat_mnt_dirs,
            vec![MountSpec {
                src: PathBuf::from("home/plugins"),
                dest: "home/plugins".into(),
            }]
        );
        // Relative src is joined under the root dir at launch time.
        assert_eq!(
            cfg.xnat_mnt_dirs[0].host_path(&cfg.xnat_root_dir),
            cfg.xnat_root_dir.join("home/plugins")
        );
        assert_eq!(cfg.xnat_mnt_dirs[0].container_path(), "/data/xnat/home/plugins");
    }

    #[test]
    fn test_mount_normalization_map_entry() {
        let home = tempdir().unwrap();
        write_profile(
            home.path(),
            "mapped",
            "xnat_mnt_dirs:\n  - src: plugins\n    dest: home/plugins\n  - src: /abs/archive\n    dest: archive\n",
        );
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("mapped".into())).unwrap();
        // Relative map src resolves against the profile file's directory.
        assert_eq!(
            cfg.xnat_mnt_dirs[0].src,
            home.path().join("configs").join("plugins")
        );
        assert_eq!(cfg.xnat_mnt_dirs[0].dest, "home/plugins");
        // Absolute src passes through untouched.
        assert_eq!(cfg.xnat_mnt_dirs[1].src, PathBuf::from("/abs/archive"));
    }

    #[test]
    fn test_port_mismatch_warns_but_succeeds() {
        let home = tempdir().unwrap();
        write_profile(home.path(), "oddport", "xnat_port: \"9999\"\n");
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("oddport".into())).unwrap();
        assert_eq!(cfg.xnat_port, "9999");
        assert_eq!(cfg.xnat_uri(), "http://localhost:9999");
    }

    #[test]
    fn test_missing_named_profile_fails_and_creates_nothing() {
        let home = tempdir().unwrap();
        let result = Config::load_with_home(home.path(), ConfigSource::Name("nosuch".into()));
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Xnat4testsError>(),
            Some(Xnat4testsError::ConfigNotFound { .. })
        ));
        assert!(!home.path().join("configs").join("nosuch.yaml").exists());
    }

    #[test]
    fn test_missing_default_profile_writes_template() {
        let home = tempdir().unwrap();
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("default".into())).unwrap();
        assert_eq!(cfg.docker_container, "xnat4tests");
        let template = home.path().join("configs").join("default.yaml");
        assert!(template.is_file());
        let content = fs::read_to_string(template).unwrap();
        assert!(content.contains("# xnat_port"));
    }

    #[test]
    fn test_missing_path_source_fails() {
        let home = tempdir().unwrap();
        let result = Config::load_with_home(
            home.path(),
            ConfigSource::Path(home.path().join("does-not-exist.yaml")),
        );
        assert!(matches!(
            result.unwrap_err().downcast_ref::<Xnat4testsError>(),
            Some(Xnat4testsError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_directory_parent_is_fatal() {
        let home = tempdir().unwrap();
        write_profile(
            home.path(),
            "badroot",
            &format!(
                "xnat_root_dir: {}\n",
                home.path().join("no/such/parent/root").display()
            ),
        );
        let result = Config::load_with_home(home.path(), ConfigSource::Name("badroot".into()));
        assert!(matches!(
            result.unwrap_err().downcast_ref::<Xnat4testsError>(),
            Some(Xnat4testsError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_relative_single_component_dirs_validate() {
        // The effective parent of a bare relative directory is the working
        // directory, which always exists.
        let home = tempdir().unwrap();
        write_profile(
            home.path(),
            "relroot",
            "xnat_root_dir: relative_root\ndocker_build_dir: relative_build\n",
        );
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("relroot".into())).unwrap();
        assert_eq!(cfg.xnat_root_dir, PathBuf::from("relative_root"));
        assert_eq!(cfg.docker_build_dir, PathBuf::from("relative_build"));
    }

    #[test]
    fn test_docker_build_args_are_uppercased() {
        let args = BuildArgs::default().as_docker_args();
        assert_eq!(args.get("XNAT_VER").map(String::as_str), Some("1.8.4"));
        assert_eq!(args.get("JAVA_MX").map(String::as_str), Some("2g"));
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn test_profile_overrides_merge_over_defaults() {
        let home = tempdir().unwrap();
        let root = home.path().join("xnat_root").join("unittest");
        fs::create_dir_all(&root).unwrap();
        write_profile(
            home.path(),
            "unittest",
            &format!(
                "docker_image: xnat4tests_unittest\n\
                 docker_container: xnat4tests_unittest\n\
                 xnat_port: \"8090\"\n\
                 registry_port: \"5555\"\n\
                 xnat_root_dir: {}\n\
                 build_args:\n  java_mx: \"1g\"\n",
                root.display()
            ),
        );
        let cfg =
            Config::load_with_home(home.path(), ConfigSource::Name("unittest".into())).unwrap();
        assert_eq!(cfg.docker_image, "xnat4tests_unittest");
        assert_eq!(cfg.docker_container, "xnat4tests_unittest");
        assert_eq!(cfg.xnat_port, "8090");
        assert_eq!(cfg.registry_port, "5555");
        assert_eq!(cfg.xnat_root_dir, root);
        assert_eq!(cfg.build_args.java_mx, "1g");
        assert_eq!(cfg.build_args.java_ms, "256m");
        // The network name keeps its default.
        assert_eq!(cfg.docker_network_name, "xnat4tests");
        assert_eq!(
            cfg.loaded_from.as_deref(),
            Some(home.path().join("configs").join("unittest.yaml").as_path())
        );
    }
}
