use anyhow::{anyhow, Context, Result};
use clap::Parser;
use setup_fpm::config::ConfigLoader;
use setup_fpm::installer::{
    path_registrar_from_env, which_probe, Collaborators, GitHubReleaseIndex, HttpFetcher,
    Installer, PlatformInfo, ReleaseIndex, TokioCommandRunner,
};
use setup_fpm::logging::setup_logging;
use setup_fpm::types::SetupFpmCli;
use setup_fpm::{error_message, Colorize};
use std::io::IsTerminal;
use std::time::Duration;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error_message!("{err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let args = SetupFpmCli::parse();
    let config = ConfigLoader::load(&args)?;
    setup_logging(&config.log_level)?;

    let platform = PlatformInfo::build(args.platform.as_deref(), args.arch.as_deref())?;
    let installer = Installer::new(&config, platform)?;

    let mut fetcher = HttpFetcher::new(config.http_timeout_secs.map(Duration::from_secs))?;
    if !std::io::stderr().is_terminal() {
        fetcher = fetcher.without_progress();
    }
    let release_index = config
        .github_token
        .as_deref()
        .map(GitHubReleaseIndex::new)
        .transpose()
        .context("Failed to set up the GitHub release index")?;
    let registrar = path_registrar_from_env();

    let collaborators = Collaborators {
        fetcher: &fetcher,
        runner: &TokioCommandRunner,
        registrar: registrar.as_ref(),
        release_index: release_index.as_ref().map(|i| i as &dyn ReleaseIndex),
        compiler_probe: &which_probe,
    };

    installer.run(&collaborators).await?;
    Ok(())
}
