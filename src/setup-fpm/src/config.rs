use crate::types::SetupFpmCli;
use ::config::{Config as RConfig, Environment, Map};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_FPM_VERSION: &str = "v0.10.1";
pub const DEFAULT_FPM_REPOSITORY: &str = "https://github.com/fortran-lang/fpm";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_PREFIX: &str = "SETUP_FPM";
const RUNNER_TEMP_ENV_VAR: &str = "RUNNER_TEMP";
const INSTALL_SUBDIR: &str = "setup-fpm";

/// GitHub Actions passes `with:` inputs as `INPUT_<NAME>` with the name upper-cased as-is.
const ACTION_INPUTS: [(&str, &str); 3] = [
    ("INPUT_FPM-VERSION", "fpm_version"),
    ("INPUT_FPM-REPOSITORY", "fpm_repository"),
    ("INPUT_GITHUB-TOKEN", "github_token"),
];

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub fpm_version: String,
    pub fpm_repository: String,
    pub github_token: Option<String>,
    pub install_dir: PathBuf,
    pub http_timeout_secs: Option<u64>,
    pub log_level: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(cli: &SetupFpmCli) -> Result<Config> {
        Self::load_from(cli, std::env::vars().collect())
    }

    /// Builds the configuration from `vars` instead of the process environment.
    pub fn load_from(cli: &SetupFpmCli, vars: Map<String, String>) -> Result<Config> {
        let mut builder = RConfig::builder();

        // set defaults
        builder = builder
            .set_default("fpm_version", DEFAULT_FPM_VERSION)?
            .set_default("fpm_repository", DEFAULT_FPM_REPOSITORY)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .set_default(
                "install_dir",
                default_install_dir(&vars).to_string_lossy().to_string(),
            )?;

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        // action inputs override plain environment
        for (input, key) in ACTION_INPUTS {
            let value = vars
                .get(input)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            builder = builder.set_override_option(key, value)?;
        }

        // set overrides
        builder = builder
            .set_override_option("fpm_version", cli.fpm_version.clone())?
            .set_override_option("fpm_repository", cli.fpm_repository.clone())?
            .set_override_option("github_token", cli.github_token.clone())?
            .set_override_option(
                "install_dir",
                cli.install_dir
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
            )?
            .set_override_option(
                "http_timeout_secs",
                cli.http_timeout_secs.map(|s| s.to_string()),
            )?
            .set_override_option("log_level", cli.log_level.clone())?;

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("failed to parse configuration")?;

        Ok(config)
    }
}

fn default_install_dir(vars: &Map<String, String>) -> PathBuf {
    vars.get(RUNNER_TEMP_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(INSTALL_SUBDIR)
}
