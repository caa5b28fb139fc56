use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Write a `.tar.gz` archive holding `(member path, contents)` pairs in order.
///
/// # Panics
///
/// Panics on any IO failure; intended for tests.
pub fn write_corpus_archive(path: &Path, members: &[(&str, &str)]) {
    let file = File::create(path).expect("Failed to create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .expect("Failed to append member");
    }
    builder
        .into_inner()
        .expect("Failed to finish tar")
        .finish()
        .expect("Failed to finish gzip");
}

/// Isolated directory holding profiles, query files and corpora for tests.
pub struct SearchFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for SearchFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchFixture {
    /// # Panics
    ///
    /// Panics if the temp directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Create a file with content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Profile pointing at `host` with no credentials.
    #[must_use]
    pub fn create_profile(&self, host: &str) -> PathBuf {
        let profile = serde_json::json!({
            "host": host,
            "auth": {},
            "indices": [
                {
                    "index": "movies",
                    "settings": {"number_of_shards": 1},
                    "scheme": {
                        "title": {"type": "text"},
                        "year": {"type": "integer"}
                    }
                }
            ]
        });
        self.create_file("profile.json", &profile.to_string())
    }
}

impl Drop for SearchFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}
