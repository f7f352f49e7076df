//! Stub collaborators shared by the installer tests.
use super::fetch::Fetcher;
use super::finalize::PathRegistrar;
use super::source_build::CommandRunner;
use super::url_builder::TrustedUrl;
use crate::fs::TrustedFile;
use anyhow::{bail, Result};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Builds a gzipped tarball containing `<root>/install.sh`.
pub fn source_tarball(root: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let script = b"#!/bin/sh\nexit 0\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, format!("{root}/install.sh"), &script[..])
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

/// Serves fixed bodies keyed by the last URL path segment; everything else is a 404.
#[derive(Default)]
pub struct StubFetcher {
    bodies: HashMap<String, Vec<u8>>,
    pub requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn serving(mut self, file_name: &str, body: &[u8]) -> Self {
        self.bodies.insert(file_name.to_string(), body.to_vec());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &TrustedUrl, dest: &TrustedFile) -> Result<()> {
        let name = url
            .as_url()
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_string();
        self.requested.lock().unwrap().push(name.clone());
        match self.bodies.get(&name) {
            Some(body) => Ok(std::fs::write(dest.as_path(), body)?),
            None => bail!("HTTP status client error (404 Not Found) for url ({url})"),
        }
    }
}

pub type RecordedCall = (String, Vec<String>, PathBuf, Vec<(String, String)>);

/// Records invocations and, unless told otherwise, installs a fake `bin/fpm` under `--prefix`.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<RecordedCall>>,
    pub fail: bool,
    pub skip_install: bool,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        env: &[(String, String)],
    ) -> Result<()> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.to_vec(),
            cwd.to_path_buf(),
            env.to_vec(),
        ));
        if self.fail {
            bail!("sh exited with exit status: 1");
        }
        if !self.skip_install {
            let prefix = args
                .iter()
                .find_map(|a| a.strip_prefix("--prefix="))
                .expect("install.sh called without --prefix");
            let bin = Path::new(prefix).join("bin");
            std::fs::create_dir_all(&bin)?;
            std::fs::write(bin.join("fpm"), b"built")?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingRegistrar {
    pub dirs: Mutex<Vec<PathBuf>>,
}

impl RecordingRegistrar {
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }
}

impl PathRegistrar for RecordingRegistrar {
    fn register(&self, dir: &Path) -> Result<()> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}
