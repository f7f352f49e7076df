use crate::error::{InstallError, InstallResult};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
}

impl Platform {
    /// The OS token used in release artifact names.
    pub fn os_name(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
        }
    }

    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }
}

impl FromStr for Platform {
    type Err = InstallError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::Macos),
            "windows" | "win32" => Ok(Self::Windows),
            other => Err(InstallError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.os_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Arm64,
}

impl Arch {
    /// Maps any reported architecture to one we publish binaries for.
    ///
    /// This mapping is total: architectures without their own release artifacts are
    /// treated as x86_64, which is what the release matrix has always defaulted to.
    pub fn from_reported(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Self::X86_64,
            "aarch64" | "arm64" => Self::Arm64,
            other => {
                warn!(
                    arch = other,
                    "no release artifacts for this architecture, using x86_64"
                );
                Self::X86_64
            }
        }
    }

    /// The architecture token used in release artifact names.
    pub fn arch_name(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Arm64 => "arm64",
        }
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.arch_name())
    }
}

#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub arch: Arch,
    pub full_arch: String,
}

impl PlatformInfo {
    /// Detects the host platform, honouring explicit overrides.
    pub fn build(platform: Option<&str>, arch: Option<&str>) -> InstallResult<Self> {
        let platform = platform.unwrap_or(std::env::consts::OS).parse()?;
        let full_arch = arch.unwrap_or(std::env::consts::ARCH).to_string();
        let arch = Arch::from_reported(&full_arch);

        Ok(PlatformInfo {
            platform,
            arch,
            full_arch,
        })
    }

    /// macOS on Apple silicon has no prebuilt binaries for most releases, so it is the
    /// only pairing that may fall back to building from source.
    pub fn has_source_build_fallback(&self) -> bool {
        self.platform == Platform::Macos && self.arch == Arch::Arm64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("linux", Platform::Linux)]
    #[case("macos", Platform::Macos)]
    #[case("Darwin", Platform::Macos)]
    #[case("windows", Platform::Windows)]
    #[case("win32", Platform::Windows)]
    fn test_parse_platform(#[case] input: &str, #[case] expected: Platform) {
        assert_eq!(input.parse::<Platform>().unwrap(), expected);
    }

    #[test]
    fn test_unsupported_platform_is_error() {
        let err = "freebsd".parse::<Platform>().unwrap_err();
        assert!(matches!(err, InstallError::UnsupportedPlatform(ref p) if p == "freebsd"));
    }

    #[rstest]
    #[case("x86_64", Arch::X86_64)]
    #[case("x64", Arch::X86_64)]
    #[case("aarch64", Arch::Arm64)]
    #[case("arm64", Arch::Arm64)]
    #[case("riscv64", Arch::X86_64)]
    #[case("", Arch::X86_64)]
    fn test_arch_mapping_is_total(#[case] input: &str, #[case] expected: Arch) {
        assert_eq!(Arch::from_reported(input), expected);
    }

    #[test]
    fn test_build_with_overrides() {
        let info = PlatformInfo::build(Some("macos"), Some("aarch64")).unwrap();
        assert_eq!(info.platform, Platform::Macos);
        assert_eq!(info.arch, Arch::Arm64);
        assert_eq!(info.full_arch, "aarch64");
        assert!(info.has_source_build_fallback());
    }

    #[test]
    fn test_unknown_arch_override_still_builds() {
        let info = PlatformInfo::build(Some("linux"), Some("s390x")).unwrap();
        assert_eq!(info.arch, Arch::X86_64);
        assert_eq!(info.full_arch, "s390x");
    }

    #[rstest]
    #[case("linux", "arm64")]
    #[case("macos", "x86_64")]
    #[case("windows", "arm64")]
    fn test_no_source_build_fallback(#[case] platform: &str, #[case] arch: &str) {
        let info = PlatformInfo::build(Some(platform), Some(arch)).unwrap();
        assert!(!info.has_source_build_fallback());
    }
}
