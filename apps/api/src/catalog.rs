use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CareerRecord, CategoryFile};

/// Shared, immutable view of the loaded catalog.
pub type Catalog = Arc<Vec<CareerRecord>>;

const CATALOG_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read catalog file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Scans `dir` for `.json` category files and flattens them into one list,
/// stamping each career with its file's category. Does not cache.
///
/// Files are read in sorted path order. Any unreadable or malformed file
/// aborts the whole load.
pub fn load_catalog(dir: &Path) -> Result<Vec<CareerRecord>, CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_catalog_file = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CATALOG_EXTENSION));
        if is_catalog_file {
            files.push(path);
        }
    }
    files.sort();

    let mut careers = Vec::new();
    for path in files {
        let raw = std::fs::read_to_string(&path).map_err(|source| CatalogError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let file: CategoryFile = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.clone(),
            source,
        })?;

        debug!(
            "Loaded {} careers from {} (category '{}')",
            file.careers.len(),
            path.display(),
            file.category
        );

        let category = file.category;
        careers.extend(file.careers.into_iter().map(|mut career| {
            career.category = category.clone();
            career
        }));
    }

    Ok(careers)
}

/// Caching catalog loader. The first `get()` scans the directory; later calls
/// hand back the same `Arc` until `invalidate()` or `reload()` is called.
pub struct CatalogStore {
    dir: PathBuf,
    cached: RwLock<Option<Catalog>>,
}

impl CatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached catalog, loading it on first use.
    pub fn get(&self) -> Result<Catalog, CatalogError> {
        if let Some(catalog) = self.cached.read().as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let mut slot = self.cached.write();
        // Another caller may have filled the slot while we waited for the write lock.
        if let Some(catalog) = slot.as_ref() {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(load_catalog(&self.dir)?);
        info!(
            "Catalog loaded: {} careers from {}",
            catalog.len(),
            self.dir.display()
        );
        *slot = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Rescans the directory now and replaces the cache. On failure the
    /// previous catalog stays in place.
    #[allow(dead_code)]
    pub fn reload(&self) -> Result<Catalog, CatalogError> {
        let catalog = Arc::new(load_catalog(&self.dir)?);
        info!("Catalog reloaded: {} careers", catalog.len());
        *self.cached.write() = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Drops the cached catalog; the next `get()` rescans the directory.
    #[allow(dead_code)]
    pub fn invalidate(&self) {
        if self.cached.write().take().is_some() {
            info!("Catalog cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.read().is_some()
    }
}
