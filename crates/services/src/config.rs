use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "PAPER_DATA_DIR";
pub const DB_URL_VAR: &str = "PAPER_DB_URL";
pub const BANKS_FILE_VAR: &str = "PAPER_BANKS_FILE";

const DB_FILE_NAME: &str = "paper.sqlite3";

/// Runtime settings: where banks live and where review state is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Explicit database URL; defaults to a file inside `data_dir`.
    pub db_url: Option<String>,
    /// Optional JSON catalog replacing the built-in bank list.
    pub banks_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            db_url: None,
            banks_file: None,
        }
    }
}

impl AppConfig {
    /// Read `PAPER_DATA_DIR`, `PAPER_DB_URL` and `PAPER_BANKS_FILE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();
        Self {
            data_dir: get(DATA_DIR_VAR).map_or(defaults.data_dir, PathBuf::from),
            db_url: get(DB_URL_VAR).map(normalize_sqlite_url),
            banks_file: get(BANKS_FILE_VAR).map(PathBuf::from),
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    #[must_use]
    pub fn with_db_url(mut self, db_url: impl Into<String>) -> Self {
        self.db_url = Some(normalize_sqlite_url(db_url.into()));
        self
    }

    /// The effective database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.db_url.clone().unwrap_or_else(|| {
            normalize_sqlite_url(self.data_dir.join(DB_FILE_NAME).display().to_string())
        })
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
