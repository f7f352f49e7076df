mod artifact;
mod cascade;
mod fetch;
mod finalize;
mod install;
mod platform;
mod release;
mod source_build;
mod url_builder;
mod version_gate;

#[cfg(test)]
mod test_support;

pub use artifact::{candidates, resolve_filename, CompilerTag, SUPPORTED_GCC_MAJORS, TOOL_NAME};
pub use cascade::{acquire, Acquired};
pub use fetch::{Fetcher, HttpFetcher};
pub use finalize::{
    binary_name, finalize, path_registrar_from_env, GitHubPathRegistrar, PathRegistrar,
    ShellPathRegistrar,
};
pub use install::{Collaborators, Installer};
pub use platform::{Arch, Platform, PlatformInfo};
pub use release::{GitHubReleaseIndex, ReleaseIndex};
pub use source_build::{
    discover_compiler, which_probe, CommandRunner, SourceBuild, TokioCommandRunner,
};
pub use url_builder::TrustedUrl;
pub use version_gate::{supports_source_build, ReleaseVersion};
