//! Configuration for dataset loading and the explorer cycle.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::filter::builder::FieldControl;
use crate::filter::dependent::KeyDerivation;
use crate::schema::census;

/// Default columnar snapshot, preferred when present
pub const DEFAULT_PARQUET_FILE: &str = "dados_mec.parquet";

/// Default text source used when the snapshot is missing or unreadable
pub const DEFAULT_CSV_FILE: &str = "dados_reduzidos_100_mil_linhas.csv";

/// Default batch size for reading
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Default lifetime of a cached dataset
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Read and parse an environment variable, ignoring unparseable values
#[must_use]
pub fn env_var<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse::<T>().ok())
}

/// Configuration for locating and loading the dataset
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Columnar snapshot path
    pub parquet_path: PathBuf,
    /// Text source path
    pub csv_path: PathBuf,
    /// Rows per batch while reading
    pub batch_size: usize,
    /// How long a loaded dataset may be served from the cache
    pub cache_ttl: Duration,
    /// Show a spinner while loading
    pub show_progress: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            parquet_path: PathBuf::from(DEFAULT_PARQUET_FILE),
            csv_path: PathBuf::from(DEFAULT_CSV_FILE),
            batch_size: DEFAULT_BATCH_SIZE,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            show_progress: false,
        }
    }
}

impl DatasetConfig {
    /// Build a configuration for an explicit pair of sources
    pub fn new(parquet_path: impl Into<PathBuf>, csv_path: impl Into<PathBuf>) -> Self {
        Self {
            parquet_path: parquet_path.into(),
            csv_path: csv_path.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `CENSO_PARQUET`, `CENSO_CSV`,
    /// `CENSO_BATCH_SIZE` and `CENSO_CACHE_TTL_SECS`
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = env_var::<PathBuf>("CENSO_PARQUET") {
            config.parquet_path = path;
        }
        if let Some(path) = env_var::<PathBuf>("CENSO_CSV") {
            config.csv_path = path;
        }
        if let Some(size) = env_var::<usize>("CENSO_BATCH_SIZE").filter(|s| *s > 0) {
            config.batch_size = size;
        }
        if let Some(secs) = env_var::<u64>("CENSO_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(secs);
        }
        config
    }

    /// Enable or disable the loading spinner
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Set the cache lifetime
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Configuration of the institution/course explorer
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Controls that filter institutions
    pub institution_controls: Vec<FieldControl>,
    /// Controls that filter courses
    pub course_controls: Vec<FieldControl>,
    /// Column identifying an institution
    pub key_field: String,
    /// Where the institution key set is taken from
    pub key_derivation: KeyDerivation,
}

impl ExplorerConfig {
    /// The sidebar of the census explorer
    #[must_use]
    pub fn census() -> Self {
        Self {
            institution_controls: vec![
                FieldControl::multi_select(census::SG_UF_IES),
                FieldControl::multi_select(census::NO_IES),
                FieldControl::multi_select(census::TP_REDE),
                FieldControl::minimum(census::IGC, 1.0, 5.0),
            ],
            course_controls: vec![
                FieldControl::multi_select(census::NO_MUNICIPIO),
                FieldControl::multi_select(census::NO_CINE_AREA_ESPECIFICA),
                FieldControl::multi_select(census::TP_GRAU_ACADEMICO),
                FieldControl::multi_select(census::NO_CURSO),
                FieldControl::multi_select(census::TP_MODALIDADE_ENSINO),
                FieldControl::minimum(census::CPC, 1.0, 5.0),
            ],
            key_field: census::CO_IES.to_string(),
            key_derivation: KeyDerivation::default(),
        }
    }

    /// Use a different key derivation
    #[must_use]
    pub fn with_key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.key_derivation = key_derivation;
        self
    }
}
