use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use opsdoctor_core::{DockerOptions, FilterOptions, TerraformOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_CANDIDATES: [&str; 2] = [".opsdoctor.yaml", ".opsdoctor.yml"];
const ENV_PREFIX: &str = "OPSDOCTOR";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreOptions {
    /// Exact check names dropped from every report.
    pub checks: Vec<String>,
}

/// Effective configuration: defaults, then the YAML file, then environment.
///
/// Environment keys use `OPSDOCTOR__<SECTION>__<KEY>`, e.g.
/// `OPSDOCTOR__DOCKERFILE__PATH=build/Dockerfile` or `OPSDOCTOR__QUIET=true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dockerfile: DockerOptions,
    pub terraform: TerraformOptions,
    pub ignore: IgnoreOptions,
    pub quiet: bool,
}

impl Settings {
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(explicit, Path::new("."))
    }

    fn load_from(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut builder = Config::builder();
        match config_file(explicit, cwd) {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml));
            }
            None => debug!("no configuration file, using defaults"),
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config = builder.build().context("failed to load configuration")?;
        config
            .try_deserialize()
            .context("configuration has an unexpected shape")
    }

    /// Filters for this run; the `--quiet` flag can only switch quiet mode on.
    pub fn filters(&self, quiet_flag: bool) -> FilterOptions {
        FilterOptions {
            ignore: self.ignore.checks.clone(),
            quiet: self.quiet || quiet_flag,
        }
    }
}

/// An explicit path that does not exist falls back to defaults.
fn config_file(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) if path.is_file() => Some(path.to_path_buf()),
        Some(path) => {
            debug!(path = %path.display(), "configuration file not found");
            None
        }
        None => CONFIG_CANDIDATES
            .iter()
            .map(|name| cwd.join(name))
            .find(|candidate| candidate.is_file()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::env;
    use std::fs;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn with_env_lock<F: FnOnce()>(func: F) {
        let _guard = ENV_LOCK.lock().unwrap();
        func();
    }

    #[test]
    fn defaults_without_file() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            let settings = Settings::load_from(None, dir.path()).unwrap();
            assert_eq!(settings, Settings::default());
            assert_eq!(settings.dockerfile.path, PathBuf::from("Dockerfile"));
            assert_eq!(settings.terraform.dir, PathBuf::from("."));
            assert!(!settings.quiet);
        });
    }

    #[test]
    fn missing_explicit_file_uses_defaults() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            let missing = dir.path().join("nope.yaml");
            let settings = Settings::load_from(Some(&missing), dir.path()).unwrap();
            assert_eq!(settings, Settings::default());
        });
    }

    #[test]
    fn discovers_dotfile_in_working_dir() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join(".opsdoctor.yml"),
                "quiet: true\nignore:\n  checks:\n    - dockerfile-no-healthcheck\n",
            )
            .unwrap();
            let settings = Settings::load_from(None, dir.path()).unwrap();
            assert!(settings.quiet);
            assert_eq!(settings.ignore.checks, vec!["dockerfile-no-healthcheck"]);
            assert!(settings.dockerfile.enabled);
        });
    }

    #[test]
    fn partial_sections_keep_defaults() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("custom.yaml");
            fs::write(&path, "terraform:\n  enabled: false\n").unwrap();
            let settings = Settings::load_from(Some(&path), dir.path()).unwrap();
            assert!(!settings.terraform.enabled);
            assert_eq!(settings.terraform.dir, PathBuf::from("."));
            assert_eq!(settings.dockerfile, DockerOptions::default());
        });
    }

    #[test]
    fn malformed_file_is_an_error() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("broken.yaml");
            fs::write(&path, "dockerfile: [unterminated\n").unwrap();
            assert!(Settings::load_from(Some(&path), dir.path()).is_err());
        });
    }

    #[test]
    fn environment_overrides_file() {
        with_env_lock(|| {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("custom.yaml");
            fs::write(&path, "dockerfile:\n  path: docker/Dockerfile\n").unwrap();
            env::set_var("OPSDOCTOR__DOCKERFILE__PATH", "build/Dockerfile.prod");
            env::set_var("OPSDOCTOR__QUIET", "true");
            let settings = Settings::load_from(Some(&path), dir.path());
            env::remove_var("OPSDOCTOR__DOCKERFILE__PATH");
            env::remove_var("OPSDOCTOR__QUIET");

            let settings = settings.unwrap();
            assert_eq!(
                settings.dockerfile.path,
                PathBuf::from("build/Dockerfile.prod")
            );
            assert!(settings.quiet);
        });
    }

    #[test]
    fn quiet_flag_only_enables() {
        let mut settings = Settings::default();
        assert!(settings.filters(true).quiet);
        settings.quiet = true;
        assert!(settings.filters(false).quiet);
        settings.ignore.checks = vec!["provider-version".into()];
        assert_eq!(settings.filters(false).ignore, vec!["provider-version"]);
    }

    #[test]
    fn yaml_dump_round_trips() {
        let yaml = serde_yaml::to_string(&Settings::default()).unwrap();
        assert!(yaml.contains("path: Dockerfile"));
        let back: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, Settings::default());
    }
}
