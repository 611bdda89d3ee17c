//! JSON file repository
//!
//! Layout under the data directory:
//!
//! ```text
//! pages/<page_id>.json
//! graphs/<graph key>.json
//! ```

use crate::graph::{CrawlGraph, Page};
use crate::storage::traits::{CrawlRepository, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Repository writing one pretty-printed JSON document per record
#[derive(Debug, Clone)]
pub struct JsonRepository {
    pages_dir: PathBuf,
    graphs_dir: PathBuf,
}

impl JsonRepository {
    /// Opens a repository under `base_dir`, creating its directories
    pub fn new(base_dir: &Path) -> StorageResult<Self> {
        let pages_dir = base_dir.join("pages");
        let graphs_dir = base_dir.join("graphs");
        fs::create_dir_all(&pages_dir)?;
        fs::create_dir_all(&graphs_dir)?;

        tracing::debug!("Opened JSON repository at {}", base_dir.display());
        Ok(Self {
            pages_dir,
            graphs_dir,
        })
    }

    pub fn page_path(&self, page_id: &str) -> PathBuf {
        self.pages_dir.join(format!("{}.json", page_id))
    }

    pub fn graph_path(&self, start_url: &str) -> PathBuf {
        self.graphs_dir
            .join(format!("{}.json", CrawlGraph::key_for(start_url)))
    }
}

/// Writes through a temporary file so readers never see a partial document
fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))
}

impl CrawlRepository for JsonRepository {
    fn save_page(&self, page: &Page) -> StorageResult<()> {
        write_json(&self.page_path(&page.page_id), page)
    }

    fn load_page(&self, page_id: &str) -> StorageResult<Option<Page>> {
        read_json(&self.page_path(page_id))
    }

    fn save_graph(&self, graph: &CrawlGraph) -> StorageResult<()> {
        write_json(&self.graph_path(graph.start_url()), graph)
    }

    fn load_graph(&self, start_url: &str) -> StorageResult<Option<CrawlGraph>> {
        let graph: Option<CrawlGraph> = read_json(&self.graph_path(start_url))?;
        if let Some(graph) = &graph {
            graph.validate()?;
        }
        Ok(graph)
    }
}
