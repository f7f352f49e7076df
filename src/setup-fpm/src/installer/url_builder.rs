use crate::error::{InstallError, InstallResult};
use std::fmt::{self, Display, Formatter};
use url::Url;

/// A URL built only from the configured repository location and sanitized path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedUrl(Url);

impl TrustedUrl {
    /// Directory URL that release assets for `tag` live under.
    pub fn release_base(repository: &str, tag: &str) -> InstallResult<Self> {
        let repo = Self::repository(repository)?;
        Self::parse(&format!(
            "{}/releases/download/{tag}/",
            repo.trimmed()
        ))
    }

    /// Tarball of the repository at `tag`, as served by GitHub.
    pub fn source_archive(repository: &str, tag: &str) -> InstallResult<Self> {
        let repo = Self::repository(repository)?;
        Self::parse(&format!(
            "{}/archive/refs/tags/{tag}.tar.gz",
            repo.trimmed()
        ))
    }

    /// URL of a single file below this directory URL.
    pub fn join(&self, file_name: &str) -> InstallResult<Self> {
        if file_name.is_empty() || file_name.contains(['/', '\\', '?', '#']) {
            return Err(InstallError::configuration(format!(
                "invalid artifact name: {file_name:?}"
            )));
        }
        let url = self.0.join(file_name).map_err(|e| {
            InstallError::configuration(format!("invalid artifact name {file_name:?}: {e}"))
        })?;
        Ok(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    fn repository(repository: &str) -> InstallResult<Self> {
        let url = Self::parse(repository.trim())?;
        match url.0.scheme() {
            "http" | "https" => Ok(url),
            other => Err(InstallError::configuration(format!(
                "fpm repository must be an http(s) URL, got scheme {other:?}"
            ))),
        }
    }

    fn trimmed(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    fn parse(raw: &str) -> InstallResult<Self> {
        raw.parse()
            .map(Self)
            .map_err(|e| InstallError::configuration(format!("invalid URL {raw:?}: {e}")))
    }
}

impl Display for TrustedUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
