//! Dataset download

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{LexisError, Result};

const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Last path segment of `url`.
pub fn dataset_file_name(url: &str) -> Result<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && !name.contains(':'))
        .map(str::to_string)
        .ok_or_else(|| LexisError::Validation(format!("no file name in url {url}")))
}

/// Fetch `url` into `dest_dir` unless the file is already there.
pub fn download_dataset(url: &str, dest_dir: &Path, show_progress: bool) -> Result<PathBuf> {
    let target = dest_dir.join(dataset_file_name(url)?);
    if target.is_file() {
        tracing::debug!(path = %target.display(), "dataset already present");
        return Ok(target);
    }

    std::fs::create_dir_all(dest_dir)?;
    tracing::info!(url, path = %target.display(), "downloading dataset");

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .user_agent(concat!("lexis/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let mut response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(LexisError::Corpus(format!(
            "download {url} failed: HTTP {}",
            response.status()
        )));
    }

    let pb = if show_progress {
        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .map_err(|err| LexisError::Config(format!("progress template: {err}")))?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    // Write to a sibling temp file so an interrupted download never looks complete.
    let mut tmp = tempfile::NamedTempFile::new_in(dest_dir)?;
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        tmp.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }
    tmp.flush()?;
    tmp.persist(&target).map_err(|err| LexisError::Io(err.error))?;
    pb.finish_and_clear();

    Ok(target)
}
