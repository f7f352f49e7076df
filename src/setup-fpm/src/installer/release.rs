use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use tracing::debug;

pub const REPO_OWNER: &str = "fortran-lang";
pub const REPO_NAME: &str = "fpm";

/// Answers "what is the newest release tag?".
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseIndex {
    async fn latest_tag(&self) -> Result<String>;
}

/// Queries the GitHub releases API for the fpm repository.
pub struct GitHubReleaseIndex {
    client: Octocrab,
}

impl GitHubReleaseIndex {
    pub fn new(token: &str) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .context("failed to build GitHub client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReleaseIndex for GitHubReleaseIndex {
    async fn latest_tag(&self) -> Result<String> {
        let release = self
            .client
            .repos(REPO_OWNER, REPO_NAME)
            .releases()
            .get_latest()
            .await
            .with_context(|| {
                format!("failed to fetch latest release of {REPO_OWNER}/{REPO_NAME}")
            })?;

        debug!(tag = %release.tag_name, "latest fpm release");
        Ok(release.tag_name)
    }
}
