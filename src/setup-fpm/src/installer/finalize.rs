use super::artifact::TOOL_NAME;
use super::platform::Platform;
use crate::error::{InstallError, InstallResult};
use crate::fs::TrustedFile;
use crate::utils::{print_message, TagColor};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const GITHUB_PATH_ENV_VAR: &str = "GITHUB_PATH";

/// Makes a directory's executables visible to later steps of the calling environment.
#[cfg_attr(test, mockall::automock)]
pub trait PathRegistrar {
    fn register(&self, dir: &Path) -> Result<()>;
}

/// Appends the directory to the file GitHub Actions reads between steps.
pub struct GitHubPathRegistrar {
    path_file: PathBuf,
}

impl GitHubPathRegistrar {
    pub fn new(path_file: PathBuf) -> Self {
        Self { path_file }
    }
}

impl PathRegistrar for GitHubPathRegistrar {
    fn register(&self, dir: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path_file)
            .with_context(|| format!("failed to open {}", self.path_file.display()))?;
        writeln!(file, "{}", dir.display())
            .with_context(|| format!("failed to write {}", self.path_file.display()))?;
        Ok(())
    }
}

/// Outside of GitHub Actions there is no way to change the caller's PATH, so print how to.
pub struct ShellPathRegistrar;

impl PathRegistrar for ShellPathRegistrar {
    fn register(&self, dir: &Path) -> Result<()> {
        print_message(
            "PATH",
            &format!("export PATH=\"{}:$PATH\"", dir.display()),
            TagColor::Cyan,
        );
        Ok(())
    }
}

pub fn path_registrar_from_env() -> Box<dyn PathRegistrar> {
    match std::env::var_os(GITHUB_PATH_ENV_VAR) {
        Some(path) if !path.is_empty() => Box::new(GitHubPathRegistrar::new(PathBuf::from(path))),
        _ => Box::new(ShellPathRegistrar),
    }
}

pub fn binary_name(platform: Platform) -> String {
    format!("{TOOL_NAME}{}", platform.exe_suffix())
}

/// Marks the binary executable, gives it its canonical name, and registers its directory.
///
/// Runs the same way whether the binary was downloaded or built from source.
pub fn finalize(
    binary: &TrustedFile,
    platform: Platform,
    registrar: &dyn PathRegistrar,
) -> InstallResult<TrustedFile> {
    #[cfg(unix)]
    {
        if platform != Platform::Windows {
            binary
                .set_mode(0o755)
                .map_err(|e| InstallError::io(format!("failed to make {binary} executable"), e))?;
        }
    }

    let name = binary_name(platform);
    let installed = binary
        .rename_in_place(&name)
        .map_err(|e| InstallError::io(format!("failed to rename {binary} to {name}"), e))?;

    let dir = installed
        .parent()
        .map_err(|e| InstallError::io("installed binary has no directory", e))?;
    registrar
        .register(&dir)
        .map_err(|e| InstallError::io(format!("failed to add {} to PATH", dir.display()), e))?;

    info!(path = %installed, "fpm installed");
    Ok(installed)
}
