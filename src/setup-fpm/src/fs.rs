//! SAFETY: `TrustedDir` and `TrustedFile` instances are only created from the configured
//! install directory, temporary directories, or names produced by the artifact resolver.
//! Relative paths are checked component by component before they are joined onto a trusted
//! base, so a crafted version or archive name cannot escape the base directory.
use anyhow::{bail, Context, Result};
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tokio::fs::File as AsyncFile;

/// A directory that exists for as long as this value is alive.
#[derive(Debug)]
pub enum TrustedDir {
    /// An already sanitized directory path
    Sanitized(PathBuf),
    /// A temporary directory, removed on drop
    Temp(TempDir),
}

impl TrustedDir {
    pub fn tempdir() -> Result<Self> {
        Ok(Self::Temp(
            tempfile::tempdir().context("failed to create temporary directory")?,
        ))
    }

    /// Creates a `TrustedDir` from an absolute path, creating the directory if it doesn't exist.
    pub fn new(path: &Path) -> Result<Self> {
        check_sanitary_absolute_path(path)?;
        if path.exists() && !path.is_dir() {
            bail!(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("path is not a directory: {:?}", path),
            ));
        }
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory {}", path.display()))?;
        Ok(Self::Sanitized(path.canonicalize()?))
    }

    /// Returns the absolute path to the directory, checking that it still exists.
    pub fn as_path(&self) -> Result<PathBuf> {
        let path = match self {
            Self::Sanitized(path) => path.to_owned(),
            Self::Temp(temp_dir) => temp_dir.path().canonicalize()?,
        };
        if !path.is_dir() {
            bail!(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory does not exist: {:?}", path),
            ));
        }
        Ok(path)
    }

    /// Creates a sanitized path for a file that may not yet exist.
    pub fn join_file<R>(&self, subpath: R) -> Result<TrustedFile>
    where
        R: TryInto<RelativePath, Error = anyhow::Error>,
    {
        Ok(TrustedFile(self.as_path()?.join(subpath.try_into()?.into_path())))
    }

    /// Resolves an existing subdirectory, refusing anything that escapes this directory.
    pub fn get_trusted_dir<R>(&self, subdir: R) -> Result<Self>
    where
        R: TryInto<RelativePath, Error = anyhow::Error>,
    {
        let base = self.as_path()?;
        let path = base.join(subdir.try_into()?.into_path());
        let path = path
            .canonicalize()
            .with_context(|| format!("directory does not exist: {}", path.display()))?;
        if !path.starts_with(&base) {
            bail!(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "path escapes base",
            ));
        }
        if !path.is_dir() {
            bail!(io::Error::new(
                io::ErrorKind::NotADirectory,
                "trusted path is not a directory",
            ));
        }
        Ok(Self::Sanitized(path))
    }

    /// Removes a temporary directory now, reporting failures instead of ignoring them on drop.
    /// Sanitized directories are left in place.
    pub fn close(self) -> Result<()> {
        match self {
            Self::Temp(temp_dir) => {
                let path = temp_dir.path().to_owned();
                temp_dir
                    .close()
                    .with_context(|| format!("failed to remove {}", path.display()))
            }
            Self::Sanitized(_) => Ok(()),
        }
    }
}

impl Display for TrustedDir {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sanitized(path) => path.display().fmt(f),
            Self::Temp(temp) => temp.path().display().fmt(f),
        }
    }
}

/// A file path beneath a `TrustedDir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustedFile(PathBuf);

impl TrustedFile {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn exists(&self) -> bool {
        self.0.is_file()
    }

    /// SAFETY: we only open sanitized paths
    pub fn open(&self) -> Result<File> {
        File::open(self.as_path()).with_context(|| format!("failed to open {}", self))
    }

    pub async fn create_async(&self) -> Result<AsyncFile> {
        AsyncFile::create(self.as_path())
            .await
            .with_context(|| format!("failed to create {}", self))
    }

    /// Deletes the file if present. Returns whether anything was removed.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(&self.0) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self)),
        }
    }

    /// Renames this file to `file_name` in the same directory.
    pub fn rename_in_place(&self, file_name: &str) -> io::Result<TrustedFile> {
        let name = RelativePath::try_from(file_name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let dest = self.parent()?.join(name.into_path());
        if dest != self.0 {
            fs::rename(&self.0, &dest)?;
        }
        Ok(TrustedFile(dest))
    }

    #[cfg(unix)]
    pub fn set_mode(&self, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&self.0, fs::Permissions::from_mode(mode))
    }

    pub fn parent(&self) -> io::Result<PathBuf> {
        self.0.parent().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file has no parent directory: {:?}", self.0),
            )
        })
    }
}

impl Display for TrustedFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.display().fmt(f)
    }
}

/// A sanitized relative path that can be used to traverse into a `TrustedDir`.
#[derive(Clone, Debug)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn into_path(self) -> PathBuf {
        self.0
    }
}

impl TryFrom<&str> for RelativePath {
    type Error = anyhow::Error;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::try_from(Path::new(path))
    }
}

impl TryFrom<&Path> for RelativePath {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        check_sanitary_relative_path(path)?;
        Ok(Self(path.to_path_buf()))
    }
}

fn check_sanitary_absolute_path(path: &Path) -> io::Result<()> {
    if !path.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("relative paths not allowed: {:?}", path),
        ));
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "invalid component",
        ));
    }
    Ok(())
}

fn check_sanitary_relative_path(path: &Path) -> io::Result<()> {
    if path.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "absolute paths not allowed",
        ));
    }

    // Reject empty / sneaky components
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }

    for c in path.components() {
        match c {
            Component::Normal(_) => {}
            // reject ., .., prefix (Windows), or root components
            Component::CurDir
            | Component::ParentDir
            | Component::Prefix(_)
            | Component::RootDir => {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "invalid component",
                ))
            }
        }
    }

    Ok(())
}
