//! Building fpm from its source tarball when no prebuilt binary exists for the host.
//!
//! The pipeline runs in fixed stages and stops at the first failure:
//! compiler discovery, source download, extraction, `install.sh`, then cleanup of the
//! temporary build workspace. Cleanup is best-effort and never turns a successful build
//! into a failure.
use super::artifact::{normalize_version, TOOL_NAME};
use super::fetch::Fetcher;
use super::url_builder::TrustedUrl;
use crate::error::{InstallError, InstallResult};
use crate::fs::{TrustedDir, TrustedFile};
use crate::utils::{print_message, TagColor};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::path::Path;
use tar::Archive;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const UNVERSIONED_COMPILER: &str = "gfortran";

/// Newest first. Capped at 13 because newer GCC majors fail to build older fpm sources.
pub const VERSIONED_COMPILERS: [&str; 4] =
    ["gfortran-13", "gfortran-12", "gfortran-11", "gfortran-10"];

const COMPILER_REMEDIATION: &str =
    "Install GFortran first, e.g. `brew install gcc@13` on macOS or `apt-get install gfortran-13` on Linux.";

/// Returns the first name in `candidates` for which `probe` succeeds.
pub fn find_first_available<'a, P>(candidates: &[&'a str], probe: P) -> Option<&'a str>
where
    P: Fn(&str) -> bool,
{
    candidates.iter().copied().find(|name| probe(name))
}

/// Probes the PATH for an executable.
pub fn which_probe(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Picks the Fortran compiler to build with.
///
/// A versioned compiler always wins over the bare `gfortran`, even when both exist, since
/// the bare name may point at a GCC too new for the source being built.
pub fn discover_compiler<P>(probe: P) -> InstallResult<String>
where
    P: Fn(&str) -> bool,
{
    let unversioned = probe(UNVERSIONED_COMPILER);
    let versioned = find_first_available(&VERSIONED_COMPILERS, &probe);
    debug!(unversioned, ?versioned, "compiler probe results");

    match (versioned, unversioned) {
        (Some(name), _) => Ok(name.to_string()),
        (None, true) => Ok(UNVERSIONED_COMPILER.to_string()),
        (None, false) => Err(InstallError::CompilerNotFound {
            searched: VERSIONED_COMPILERS
                .iter()
                .chain(std::iter::once(&UNVERSIONED_COMPILER))
                .map(|s| s.to_string())
                .collect(),
            remediation: COMPILER_REMEDIATION.to_string(),
        }),
    }
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner {
    /// Runs `program` with `args` in `cwd`, adding `env` to the inherited environment.
    /// A non-zero exit status is an error.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<()>;
}

pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<()> {
        debug!(program, ?args, cwd = %cwd.display(), "running");

        let status = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .await
            .with_context(|| format!("failed to start {program}"))?;

        if !status.success() {
            bail!("{program} exited with {status}");
        }
        Ok(())
    }
}

/// Expands a gzipped tarball into `dest`.
pub fn extract_tarball(archive: &TrustedFile, dest: &TrustedDir) -> Result<()> {
    let file = archive.open()?;
    let decompressed = GzDecoder::new(file);
    let mut archive = Archive::new(decompressed);
    archive
        .unpack(dest.as_path()?)
        .context("failed to unpack archive")?;
    Ok(())
}

/// Name of the directory a source tarball for `tag` expands into.
pub fn source_root_name(tag: &str) -> String {
    format!("{TOOL_NAME}-{}", normalize_version(tag))
}

pub struct SourceBuild<'a> {
    pub repository: &'a str,
    pub tag: &'a str,
    /// Passed to `install.sh` as `--prefix`; the binary lands in its `bin/`.
    pub install_dir: &'a TrustedDir,
}

impl SourceBuild<'_> {
    /// Builds and installs fpm, returning the path of the installed binary.
    pub async fn run(
        &self,
        fetcher: &dyn Fetcher,
        runner: &dyn CommandRunner,
        probe: &(dyn Fn(&str) -> bool + Sync),
    ) -> InstallResult<TrustedFile> {
        let compiler = discover_compiler(probe)?;
        print_message("COMPILER", &compiler, TagColor::Cyan);

        let workspace = TrustedDir::tempdir()
            .map_err(|e| InstallError::io("failed to create build workspace", e))?;

        let result = self.build_in(&workspace, &compiler, fetcher, runner).await;

        let workspace_path = workspace.to_string();
        if let Err(e) = workspace.close() {
            warn!(path = %workspace_path, "failed to clean up build workspace: {e:#}");
        }

        result
    }

    async fn build_in(
        &self,
        workspace: &TrustedDir,
        compiler: &str,
        fetcher: &dyn Fetcher,
        runner: &dyn CommandRunner,
    ) -> InstallResult<TrustedFile> {
        let url = TrustedUrl::source_archive(self.repository, self.tag)?;
        let archive = workspace
            .join_file("fpm-source.tar.gz")
            .map_err(|e| InstallError::io("failed to prepare build workspace", e))?;

        print_message("DOWNLOADING", &url.to_string(), TagColor::Blue);
        fetcher
            .fetch(&url, &archive)
            .await
            .map_err(|e| InstallError::SourceDownloadFailed {
                url: url.to_string(),
                source: Some(e.into()),
            })?;

        let source_root = self.extract(&archive, workspace)?;
        print_message(
            "EXTRACTING",
            &format!("Output: {}", source_root),
            TagColor::Blue,
        );

        let source_path = source_root
            .as_path()
            .map_err(|e| InstallError::io("extracted sources disappeared", e))?;
        let prefix = self
            .install_dir
            .as_path()
            .map_err(|e| InstallError::io("install directory is not usable", e))?;

        info!(compiler, prefix = %prefix.display(), "running fpm install script");
        print_message(
            "BUILDING",
            &format!("fpm {} with {compiler}", self.tag),
            TagColor::Blue,
        );

        let args = vec![
            "install.sh".to_string(),
            format!("--prefix={}", prefix.display()),
        ];
        let env = vec![("FC".to_string(), compiler.to_string())];
        runner
            .run("sh", &args, &source_path, &env)
            .await
            .map_err(|e| InstallError::InstallScriptFailed {
                dir: source_path.clone(),
                source: Some(e.into()),
            })?;

        let binary = self
            .install_dir
            .join_file(format!("bin/{TOOL_NAME}").as_str())
            .map_err(|e| InstallError::io("install script left no bin directory", e))?;
        if !binary.exists() {
            return Err(InstallError::InstallScriptFailed {
                dir: source_path,
                source: Some(format!("no binary was installed at {binary}").into()),
            });
        }
        Ok(binary)
    }

    /// The tarball must expand to exactly `fpm-<version>`; anything else is an error.
    fn extract(&self, archive: &TrustedFile, workspace: &TrustedDir) -> InstallResult<TrustedDir> {
        extract_tarball(archive, workspace).map_err(|e| InstallError::ExtractionFailed {
            message: format!("could not unpack {archive}"),
            source: Some(e.into()),
        })?;

        let expected = source_root_name(self.tag);
        workspace
            .get_trusted_dir(expected.as_str())
            .map_err(|e| InstallError::ExtractionFailed {
                message: format!("archive did not contain the expected directory {expected}"),
                source: Some(e.into()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::test_support::{source_tarball, RecordingRunner, StubFetcher};
    use std::sync::Mutex;

    const REPO: &str = "https://github.com/fortran-lang/fpm";
    const SOURCE_ARCHIVE: &str = "v0.9.0.tar.gz";

    #[test]
    fn test_find_first_available() {
        let names = ["a", "b", "c"];
        assert_eq!(
            find_first_available(&names, |n| n == "b" || n == "c"),
            Some("b")
        );
        assert_eq!(find_first_available(&names, |_| false), None);
        assert_eq!(find_first_available(&[], |_| true), None);
    }

    #[test]
    fn test_prefers_versioned_compiler() {
        let compiler =
            discover_compiler(|name| name == "gfortran" || name == "gfortran-11").unwrap();
        assert_eq!(compiler, "gfortran-11");
    }

    #[test]
    fn test_prefers_newest_versioned_compiler() {
        let compiler = discover_compiler(|name| name != "gfortran").unwrap();
        assert_eq!(compiler, "gfortran-13");
    }

    #[test]
    fn test_falls_back_to_unversioned_compiler() {
        let compiler = discover_compiler(|name| name == "gfortran" || name == "gfortran-14");
        assert_eq!(compiler.unwrap(), "gfortran");
    }

    #[test]
    fn test_unversioned_is_always_probed() {
        let probed = Mutex::new(Vec::new());
        let _ = discover_compiler(|name| {
            probed.lock().unwrap().push(name.to_string());
            name == "gfortran-13"
        });
        assert!(probed.lock().unwrap().contains(&"gfortran".to_string()));
    }

    #[test]
    fn test_compiler_not_found() {
        let err = discover_compiler(|_| false).unwrap_err();
        match err {
            InstallError::CompilerNotFound {
                searched,
                remediation,
            } => {
                assert_eq!(searched.len(), VERSIONED_COMPILERS.len() + 1);
                assert!(remediation.contains("brew install"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runner_nonzero_exit_is_err() {
        let cwd = TrustedDir::tempdir().unwrap();
        let args = vec!["-c".to_string(), "exit 3".to_string()];

        let err = TokioCommandRunner
            .run("sh", &args, &cwd.as_path().unwrap(), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("sh exited with"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_runner_passes_env_and_cwd() {
        let cwd = TrustedDir::tempdir().unwrap();
        let args = vec![
            "-c".to_string(),
            "echo \"$FC\" > compiler.txt".to_string(),
        ];
        let env = vec![("FC".to_string(), "gfortran-12".to_string())];

        TokioCommandRunner
            .run("sh", &args, &cwd.as_path().unwrap(), &env)
            .await
            .unwrap();

        let written =
            std::fs::read_to_string(cwd.as_path().unwrap().join("compiler.txt")).unwrap();
        assert_eq!(written.trim(), "gfortran-12");
    }

    #[tokio::test]
    async fn test_command_runner_missing_program_is_err() {
        let cwd = TrustedDir::tempdir().unwrap();
        let result = TokioCommandRunner
            .run("setup-fpm-no-such-program", &[], &cwd.as_path().unwrap(), &[])
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_source_root_name() {
        assert_eq!(source_root_name("v0.9.0"), "fpm-0.9.0");
        assert_eq!(source_root_name("0.10.1"), "fpm-0.10.1");
    }

    fn gfortran_12(name: &str) -> bool {
        name == "gfortran-12"
    }

    fn build(install_dir: &TrustedDir) -> SourceBuild<'_> {
        SourceBuild {
            repository: REPO,
            tag: "v0.9.0",
            install_dir,
        }
    }

    #[tokio::test]
    async fn test_source_build_runs_install_script() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher =
            StubFetcher::default().serving(SOURCE_ARCHIVE, &source_tarball("fpm-0.9.0"));
        let runner = RecordingRunner::default();

        let binary = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap();

        let prefix = install_dir.as_path().unwrap();
        assert_eq!(binary.as_path(), prefix.join("bin").join("fpm"));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let (program, args, cwd, env) = &calls[0];
        assert_eq!(program, "sh");
        assert_eq!(args[0], "install.sh");
        assert_eq!(args[1], format!("--prefix={}", prefix.display()));
        assert!(cwd.ends_with("fpm-0.9.0"));
        assert_eq!(env, &vec![("FC".to_string(), "gfortran-12".to_string())]);
        // build workspace is removed afterwards
        assert!(!cwd.exists());
    }

    #[tokio::test]
    async fn test_source_download_failure() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher = StubFetcher::default();
        let runner = RecordingRunner::default();

        let err = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::SourceDownloadFailed { ref url, .. }
            if url == "https://github.com/fortran-lang/fpm/archive/refs/tags/v0.9.0.tar.gz"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_archive_layout() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher =
            StubFetcher::default().serving(SOURCE_ARCHIVE, &source_tarball("fpm-main"));
        let runner = RecordingRunner::default();

        let err = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::ExtractionFailed { ref message, .. }
            if message.contains("fpm-0.9.0")));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher = StubFetcher::default().serving(SOURCE_ARCHIVE, b"not a tarball");
        let runner = RecordingRunner::default();

        let err = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::ExtractionFailed { .. }));
    }

    #[tokio::test]
    async fn test_install_script_failure() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher =
            StubFetcher::default().serving(SOURCE_ARCHIVE, &source_tarball("fpm-0.9.0"));
        let runner = RecordingRunner {
            fail: true,
            ..Default::default()
        };

        let err = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::InstallScriptFailed { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_install_script_without_binary() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher =
            StubFetcher::default().serving(SOURCE_ARCHIVE, &source_tarball("fpm-0.9.0"));
        let runner = RecordingRunner {
            skip_install: true,
            ..Default::default()
        };

        let err = build(&install_dir)
            .run(&fetcher, &runner, &gfortran_12)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::InstallScriptFailed { .. }));
    }

    #[tokio::test]
    async fn test_no_compiler_skips_download() {
        let install_dir = TrustedDir::tempdir().unwrap();
        let fetcher = StubFetcher::default();
        let runner = RecordingRunner::default();

        let err = build(&install_dir)
            .run(&fetcher, &runner, &|_: &str| false)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::CompilerNotFound { .. }));
        assert!(fetcher.requested().is_empty());
    }
}
