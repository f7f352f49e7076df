use super::artifact::candidates;
use super::cascade::acquire;
use super::fetch::Fetcher;
use super::finalize::{finalize, PathRegistrar};
use super::platform::PlatformInfo;
use super::release::ReleaseIndex;
use super::source_build::{CommandRunner, SourceBuild};
use super::url_builder::TrustedUrl;
use super::version_gate::supports_source_build;
use crate::config::Config;
use crate::error::{InstallError, InstallResult};
use crate::fs::{TrustedDir, TrustedFile};
use crate::types::FpmVersion;
use crate::utils::{print_status, print_title, TagColor};
use crate::{success_message, warning_message, Colorize};
use tracing::info;

/// The external systems an installation talks to.
pub struct Collaborators<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub runner: &'a dyn CommandRunner,
    pub registrar: &'a dyn PathRegistrar,
    /// Only needed when the requested version is "latest".
    pub release_index: Option<&'a dyn ReleaseIndex>,
    pub compiler_probe: &'a (dyn Fn(&str) -> bool + Sync),
}

pub struct Installer {
    pub platform: PlatformInfo,
    pub version: FpmVersion,
    pub repository: String,
    pub install_dir: TrustedDir,
}

impl Installer {
    pub fn new(config: &Config, platform: PlatformInfo) -> InstallResult<Self> {
        let version = config
            .fpm_version
            .parse::<FpmVersion>()
            .map_err(|e| InstallError::configuration(e.to_string()))?;

        let install_dir = if config.install_dir.is_absolute() {
            config.install_dir.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| InstallError::io("cannot determine working directory", e))?
                .join(&config.install_dir)
        };
        let install_dir = TrustedDir::new(&install_dir).map_err(|e| {
            InstallError::io(
                format!("cannot use install directory {}", install_dir.display()),
                e,
            )
        })?;

        Ok(Self {
            platform,
            version,
            repository: config.fpm_repository.clone(),
            install_dir,
        })
    }

    /// Installs fpm and returns the path of the installed binary:
    /// - Resolves the release tag ("latest" goes through the release index)
    /// - Downloads the first prebuilt binary that exists for this platform
    /// - Falls back to building from source where no prebuilt binary exists
    /// - Marks the binary executable, renames it to `fpm`, and adds its directory to PATH
    pub async fn run(&self, collaborators: &Collaborators<'_>) -> InstallResult<TrustedFile> {
        let tag = self.resolve_tag(collaborators.release_index).await?;

        print_title("Installing fpm");
        print_status("INFO", "Version", &tag, TagColor::Cyan);
        print_status(
            "INFO",
            "Platform",
            self.platform.platform.os_name(),
            TagColor::Cyan,
        );
        print_status(
            "INFO",
            "Architecture",
            self.platform.arch.arch_name(),
            TagColor::Cyan,
        );
        print_status(
            "INFO",
            "Install directory",
            &self.install_dir.to_string(),
            TagColor::Cyan,
        );

        let names = candidates(&tag, self.platform.platform, self.platform.arch)?;
        let base_url = TrustedUrl::release_base(&self.repository, &tag)?;

        let binary = match acquire(&names, &base_url, &self.install_dir, collaborators.fetcher)
            .await
        {
            Ok(acquired) => {
                info!(candidate = %acquired.candidate, "using prebuilt binary");
                acquired.file
            }
            Err(InstallError::AllCandidatesFailed { tried }) => {
                self.build_from_source(&tag, tried, collaborators).await?
            }
            Err(e) => return Err(e),
        };

        let installed = finalize(&binary, self.platform.platform, collaborators.registrar)?;
        success_message!("fpm {} installed to: {}", tag, installed);
        Ok(installed)
    }

    async fn resolve_tag(&self, release_index: Option<&dyn ReleaseIndex>) -> InstallResult<String> {
        match &self.version {
            FpmVersion::Tag(tag) => Ok(tag.clone()),
            FpmVersion::Latest => {
                let index = release_index.ok_or_else(|| {
                    InstallError::configuration(
                        "a GitHub token is required to resolve the latest fpm release",
                    )
                })?;
                let tag = index
                    .latest_tag()
                    .await
                    .map_err(|e| InstallError::ReleaseIndexError {
                        message: format!("{e:#}"),
                        source: Some(e.into()),
                    })?;
                info!(tag, "resolved latest fpm release");
                Ok(tag)
            }
        }
    }

    /// Only macOS on arm64 may build from source, and only for releases with `install.sh`.
    async fn build_from_source(
        &self,
        tag: &str,
        tried: Vec<String>,
        collaborators: &Collaborators<'_>,
    ) -> InstallResult<TrustedFile> {
        if !self.platform.has_source_build_fallback() {
            return Err(InstallError::SourceBuildIneligible {
                reason: format!(
                    "none of {} prebuilt binaries exist for {} {} ({}), and source builds are only supported on macOS arm64",
                    tried.len(),
                    self.platform.platform,
                    self.platform.arch,
                    tried.join(", "),
                ),
            });
        }
        if !supports_source_build(tag) {
            return Err(InstallError::SourceBuildIneligible {
                reason: format!("fpm {tag} has no install script; use v0.9.0 or newer"),
            });
        }

        info!(tag, "no prebuilt binary available, building from source");
        warning_message!(
            "No prebuilt fpm binary for {} {}, building from source",
            self.platform.platform,
            self.platform.arch
        );

        SourceBuild {
            repository: &self.repository,
            tag,
            install_dir: &self.install_dir,
        }
        .run(
            collaborators.fetcher,
            collaborators.runner,
            collaborators.compiler_probe,
        )
        .await
    }
}
