use super::fetch::Fetcher;
use super::url_builder::TrustedUrl;
use crate::error::{InstallError, InstallResult};
use crate::fs::{TrustedDir, TrustedFile};
use crate::utils::{print_message, TagColor};
use tracing::{debug, warn};

/// A prebuilt binary that was downloaded successfully.
#[derive(Debug)]
pub struct Acquired {
    pub file: TrustedFile,
    pub candidate: String,
}

/// Tries each candidate in order and returns the first one that downloads.
///
/// A failing candidate is expected (most releases only publish some of the names), so its
/// error is logged, its partial download removed, and the next candidate tried. Candidates
/// after the first success are never requested.
pub async fn acquire(
    candidates: &[String],
    base_url: &TrustedUrl,
    dest_dir: &TrustedDir,
    fetcher: &dyn Fetcher,
) -> InstallResult<Acquired> {
    for candidate in candidates {
        let url = base_url.join(candidate)?;
        let dest = dest_dir
            .join_file(candidate.as_str())
            .map_err(|e| InstallError::io(format!("cannot download into {dest_dir}"), e))?;

        print_message("DOWNLOADING", &url.to_string(), TagColor::Blue);

        match fetcher.fetch(&url, &dest).await {
            Ok(()) => {
                debug!(candidate = %candidate, path = %dest, "candidate downloaded");
                return Ok(Acquired {
                    file: dest,
                    candidate: candidate.clone(),
                });
            }
            Err(e) => {
                warn!(candidate = %candidate, "candidate not available: {e:#}");
                print_message("MISSING", candidate, TagColor::Yellow);
                if let Err(e) = dest.remove() {
                    warn!(path = %dest, "failed to remove partial download: {e:#}");
                }
            }
        }
    }

    Err(InstallError::AllCandidatesFailed {
        tried: candidates.to_vec(),
    })
}
