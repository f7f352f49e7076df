//! Release artifact naming.
//!
//! Prebuilt binaries are published as `fpm-<version>-<os>-<arch>[-gcc-<N>][.exe]`. Not every
//! release carries the compiler suffix, so installation tries the bare name first and then
//! each supported compiler tag in ascending order.
use super::platform::{Arch, Platform};
use crate::error::{InstallError, InstallResult};
use std::fmt::{self, Display, Formatter};

pub const TOOL_NAME: &str = "fpm";

/// GCC majors that release binaries have been built with, oldest first.
pub const SUPPORTED_GCC_MAJORS: [u32; 5] = [10, 11, 12, 13, 14];

/// Filename suffix naming the toolchain that produced a prebuilt binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerTag(u32);

impl CompilerTag {
    pub fn gcc(major: u32) -> Self {
        Self(major)
    }

    pub fn all() -> impl Iterator<Item = CompilerTag> {
        SUPPORTED_GCC_MAJORS.into_iter().map(CompilerTag)
    }
}

impl Display for CompilerTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "gcc-{}", self.0)
    }
}

/// Strips a single leading `v` from a release tag.
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

pub fn resolve_filename(
    version: &str,
    platform: Platform,
    arch: Arch,
    tag: Option<CompilerTag>,
) -> InstallResult<String> {
    let version = normalize_version(version.trim());
    if version.is_empty() {
        return Err(InstallError::configuration("fpm version must not be empty"));
    }
    if version.contains(['/', '\\']) {
        return Err(InstallError::configuration(format!(
            "fpm version must not contain path separators: {version}"
        )));
    }

    let mut name = format!(
        "{TOOL_NAME}-{version}-{}-{}",
        platform.os_name(),
        arch.arch_name()
    );
    if let Some(tag) = tag {
        name.push('-');
        name.push_str(&tag.to_string());
    }
    name.push_str(platform.exe_suffix());

    Ok(name)
}

/// Every artifact name worth trying for this host, in the order they should be tried.
pub fn candidates(version: &str, platform: Platform, arch: Arch) -> InstallResult<Vec<String>> {
    std::iter::once(None)
        .chain(CompilerTag::all().map(Some))
        .map(|tag| resolve_filename(version, platform, arch, tag))
        .collect()
}
