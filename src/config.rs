use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};

pub const DEFAULT_CORPUS_URL: &str =
    "http://ai.stanford.edu/~amaas/data/sentiment/aclImdb_v1.tar.gz";
pub const DEFAULT_MEMBER_PATTERN: &str = r"^aclImdb/(train|test)/(pos|neg|unsup)/\d+_\d+\.txt$";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub corpus: CorpusConfig,
    pub doc2vec: Doc2VecSettings,
}

impl Config {
    /// Load defaults, then the global and project files (or the explicit
    /// file alone), then environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(explicit_path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] reading `LEXIS_*` variables through `env` instead of
    /// the process environment.
    pub fn load_with_env<F>(explicit_path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env("LEXIS_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(Path::new("lexis.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(&env)?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("lexis/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| LexisError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| LexisError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.corpus {
            self.corpus.merge(patch);
        }
        if let Some(patch) = patch.doc2vec {
            self.doc2vec.merge(patch);
        }
    }

    fn apply_env_overrides<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("LEXIS_SEARCH_PROFILE") {
            self.search.profile_path = Some(PathBuf::from(value));
        }
        if let Some(value) = env_parse::<u64>(env, "LEXIS_SEARCH_TIMEOUT_SECS")? {
            self.search.timeout_secs = value;
        }
        if let Some(value) = env_parse::<usize>(env, "LEXIS_SEARCH_BATCH_SIZE")? {
            self.search.batch_size = value;
        }
        if let Some(value) = env_parse::<u64>(env, "LEXIS_SEARCH_PAGE_SIZE")? {
            self.search.page_size = value;
        }
        if let Some(value) = env("LEXIS_SEARCH_BULK_FORMAT") {
            self.search.bulk_format = parse_bulk_format(&value)?;
        }

        if let Some(value) = env("LEXIS_CORPUS_URL") {
            self.corpus.url = value;
        }
        if let Some(value) = env("LEXIS_CORPUS_DATA_DIR") {
            self.corpus.data_dir = PathBuf::from(value);
        }

        if let Some(value) = env_parse::<usize>(env, "LEXIS_DOC2VEC_VECTOR_SIZE")? {
            self.doc2vec.vector_size = value;
        }
        if let Some(value) = env_parse::<usize>(env, "LEXIS_DOC2VEC_EPOCHS")? {
            self.doc2vec.epochs = value;
        }
        if let Some(value) = env_parse::<usize>(env, "LEXIS_DOC2VEC_MIN_COUNT")? {
            self.doc2vec.min_count = value;
        }
        if let Some(value) = env_parse::<usize>(env, "LEXIS_DOC2VEC_WORKERS")? {
            self.doc2vec.workers = value;
        }
        if let Some(value) = env_parse::<u64>(env, "LEXIS_DOC2VEC_SEED")? {
            self.doc2vec.seed = value;
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.search.batch_size == 0 {
            return Err(LexisError::Config(
                "search.batch_size must be at least 1".to_string(),
            ));
        }
        if self.search.page_size == 0 {
            return Err(LexisError::Config(
                "search.page_size must be at least 1".to_string(),
            ));
        }
        if self.doc2vec.vector_size == 0 {
            return Err(LexisError::Config(
                "doc2vec.vector_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How bulk action lines are shaped for the target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkFormat {
    /// Detect from the server's major version.
    #[default]
    Auto,
    /// Pre-8.x engines: action metadata carries `_type`.
    Legacy,
    Modern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub profile_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub batch_size: usize,
    pub page_size: u64,
    pub bulk_format: BulkFormat,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            profile_path: None,
            timeout_secs: 60,
            batch_size: 800,
            page_size: 20,
            bulk_format: BulkFormat::Auto,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.profile_path {
            self.profile_path = Some(value);
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
        if let Some(value) = patch.batch_size {
            self.batch_size = value;
        }
        if let Some(value) = patch.page_size {
            self.page_size = value;
        }
        if let Some(value) = patch.bulk_format {
            self.bulk_format = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub url: String,
    pub data_dir: PathBuf,
    pub member_pattern: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CORPUS_URL.to_string(),
            data_dir: PathBuf::from("."),
            member_pattern: DEFAULT_MEMBER_PATTERN.to_string(),
        }
    }
}

impl CorpusConfig {
    fn merge(&mut self, patch: CorpusPatch) {
        if let Some(value) = patch.url {
            self.url = value;
        }
        if let Some(value) = patch.data_dir {
            self.data_dir = value;
        }
        if let Some(value) = patch.member_pattern {
            self.member_pattern = value;
        }
    }
}

/// Parameters shared by every model in the sentiment benchmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Doc2VecSettings {
    pub vector_size: usize,
    pub epochs: usize,
    pub min_count: usize,
    pub sample: f64,
    pub negative: usize,
    /// 0 means one worker per available core.
    pub workers: usize,
    pub seed: u64,
}

impl Default for Doc2VecSettings {
    fn default() -> Self {
        Self {
            vector_size: 100,
            epochs: 20,
            min_count: 2,
            sample: 0.0,
            negative: 5,
            workers: 0,
            seed: 1,
        }
    }
}

impl Doc2VecSettings {
    fn merge(&mut self, patch: Doc2VecPatch) {
        if let Some(value) = patch.vector_size {
            self.vector_size = value;
        }
        if let Some(value) = patch.epochs {
            self.epochs = value;
        }
        if let Some(value) = patch.min_count {
            self.min_count = value;
        }
        if let Some(value) = patch.sample {
            self.sample = value;
        }
        if let Some(value) = patch.negative {
            self.negative = value;
        }
        if let Some(value) = patch.workers {
            self.workers = value;
        }
        if let Some(value) = patch.seed {
            self.seed = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub search: Option<SearchPatch>,
    pub corpus: Option<CorpusPatch>,
    pub doc2vec: Option<Doc2VecPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub profile_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub batch_size: Option<usize>,
    pub page_size: Option<u64>,
    pub bulk_format: Option<BulkFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CorpusPatch {
    pub url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub member_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Doc2VecPatch {
    pub vector_size: Option<usize>,
    pub epochs: Option<usize>,
    pub min_count: Option<usize>,
    pub sample: Option<f64>,
    pub negative: Option<usize>,
    pub workers: Option<usize>,
    pub seed: Option<u64>,
}

fn parse_bulk_format(value: &str) -> Result<BulkFormat> {
    match value.to_lowercase().as_str() {
        "auto" => Ok(BulkFormat::Auto),
        "legacy" => Ok(BulkFormat::Legacy),
        "modern" => Ok(BulkFormat::Modern),
        _ => Err(LexisError::Config(format!(
            "invalid bulk format {value} (expected auto|legacy|modern)"
        ))),
    }
}

fn env_parse<T>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|value| {
            value.parse::<T>().map_err(|err| {
                LexisError::Config(format!("invalid {key} value {value}: {err}"))
            })
        })
        .transpose()
}
