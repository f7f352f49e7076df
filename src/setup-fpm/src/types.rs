use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which fpm release to install.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FpmVersion {
    Latest,
    Tag(String),
}

impl FromStr for FpmVersion {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            anyhow::bail!("fpm version must not be empty");
        }
        if input.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        // release tags are always v-prefixed
        if input.starts_with('v') {
            Ok(Self::Tag(input.to_string()))
        } else {
            Ok(Self::Tag(format!("v{input}")))
        }
    }
}

impl fmt::Display for FpmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FpmVersion::Latest => write!(f, "latest"),
            FpmVersion::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(
    name = "setup-fpm",
    version,
    about = "Installs the Fortran Package Manager (fpm) for the current platform"
)]
pub struct SetupFpmCli {
    /// Release tag to install (e.g. v0.10.1), or "latest".
    #[arg(long)]
    pub fpm_version: Option<String>,

    /// Repository that hosts fpm releases and sources.
    #[arg(long)]
    pub fpm_repository: Option<String>,

    /// GitHub token, only needed to resolve "latest".
    #[arg(long)]
    pub github_token: Option<String>,

    /// Directory the fpm binary is installed into.
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Target platform (linux, macos, windows); defaults to the host.
    #[arg(long)]
    pub platform: Option<String>,

    /// Target architecture (x86_64, arm64); defaults to the host.
    #[arg(long)]
    pub arch: Option<String>,

    /// Timeout in seconds for each HTTP request.
    #[arg(long)]
    pub http_timeout_secs: Option<u64>,

    /// Log filter, e.g. "info" or "setup_fpm=debug".
    #[arg(long)]
    pub log_level: Option<String>,
}
