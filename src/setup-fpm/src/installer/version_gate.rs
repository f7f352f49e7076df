use super::artifact::normalize_version;
use std::str::FromStr;
use tracing::warn;

/// The subset of a release tag needed to decide source-build eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FromStr for ReleaseVersion {
    type Err = anyhow::Error;

    /// Accepts `vMAJOR.MINOR[.PATCH...]`. Major and minor must be integers; the patch is
    /// read from its leading digits (`0-rc1` is 0) and anything after it is ignored.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = normalize_version(input.trim()).split('.');
        let mut component = |name: &str| -> anyhow::Result<u32> {
            let part = parts
                .next()
                .ok_or_else(|| anyhow::anyhow!("missing {name} version"))?;
            part.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("invalid {name} component {part:?}: {e}"))
        };

        let major = component("major")?;
        let minor = component("minor")?;
        let patch = parts.next().map(leading_number).unwrap_or(0);

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

fn leading_number(part: &str) -> u32 {
    let digits = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
    part[..digits].parse().unwrap_or(0)
}

impl ReleaseVersion {
    /// Releases before 0.9 have no `install.sh` that can build fpm on its own.
    pub fn has_install_script(&self) -> bool {
        !(self.major == 0 && self.minor < 9)
    }
}

/// Whether a source build can be attempted for `version`.
///
/// A tag that does not parse as a version is never eligible.
pub fn supports_source_build(version: &str) -> bool {
    match version.parse::<ReleaseVersion>() {
        Ok(release) => release.has_install_script(),
        Err(e) => {
            warn!(version, "cannot parse version for source build: {e}");
            false
        }
    }
}
