//! File import for the three entity collections.
//!
//! CSV rows are trimmed, normalized into the model's list and numeric shapes
//! and deserialized leniently; anything still malformed reaches the
//! validation pass as a `Loose::Raw` value. A failed import affects only the
//! entity being imported.

mod normalizer;
mod parser;

use crate::config::CurationConfig;
use crate::curation::domain::Entity;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("import exceeds the limit of {limit} rows")]
    TooManyRows { limit: usize },
    #[error("unsupported import format `{0}` (expected csv or json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for ImportFormat {
    type Err = ImportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub struct EntityImporter {
    max_rows: usize,
}

impl EntityImporter {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn from_config(config: &CurationConfig) -> Self {
        Self::new(config.max_import_rows)
    }

    pub fn import_path<E: Entity, P: AsRef<Path>>(&self, path: P) -> Result<Vec<E>, ImportError> {
        let path = path.as_ref();
        let format = ImportFormat::from_path(path)?;
        let file = std::fs::File::open(path)?;
        self.import(file, format)
    }

    pub fn import<E: Entity, R: Read>(
        &self,
        reader: R,
        format: ImportFormat,
    ) -> Result<Vec<E>, ImportError> {
        let records = match format {
            ImportFormat::Csv => self.import_csv(reader)?,
            ImportFormat::Json => self.import_json(reader)?,
        };
        info!(
            entity = %E::KIND,
            rows = records.len(),
            ?format,
            "entity import parsed"
        );
        Ok(records)
    }

    fn import_csv<E: Entity, R: Read>(&self, reader: R) -> Result<Vec<E>, ImportError> {
        parser::parse_rows(reader, self.max_rows)?
            .into_iter()
            .map(|row| {
                let fields = normalizer::normalize_row(E::KIND, row);
                serde_json::from_value(Value::Object(fields)).map_err(ImportError::from)
            })
            .collect()
    }

    fn import_json<E: Entity, R: Read>(&self, reader: R) -> Result<Vec<E>, ImportError> {
        let records: Vec<E> = serde_json::from_reader(reader)?;
        if records.len() > self.max_rows {
            return Err(ImportError::TooManyRows {
                limit: self.max_rows,
            });
        }
        Ok(records)
    }
}

impl Default for EntityImporter {
    fn default() -> Self {
        Self::from_config(&CurationConfig::default())
    }
}
