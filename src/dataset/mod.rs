pub mod models;

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use models::{DiscographyRow, PerformanceRow, VenueRow};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// The three raw tables, loaded once per invocation and immutable
/// afterwards. No transformation happens here — see `preprocess`.
pub struct Dataset {
    pub performances: Vec<PerformanceRow>,
    pub venues: Vec<VenueRow>,
    pub discography: Vec<DiscographyRow>,
}

impl Dataset {
    /// Load all three CSVs. Any missing or malformed file is an error
    /// propagated to the caller — there is no partial load.
    pub fn load(setlist: &Path, venues: &Path, discography: &Path) -> Result<Self> {
        let performances = read_csv(setlist)?;
        let venues = read_csv(venues)?;
        let discography = read_csv(discography)?;
        log::info!(
            "Loaded {} performances, {} venue rows, {} discography rows",
            performances.len(),
            venues.len(),
            discography.len()
        );
        Ok(Self {
            performances,
            venues,
            discography,
        })
    }
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = csv::Reader::from_path(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    collect_rows(reader).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize every record of a CSV reader into typed rows.
/// Split out from `read_csv` so tests can parse from in-memory text.
pub fn collect_rows<T: DeserializeOwned, R: Read>(
    mut reader: csv::Reader<R>,
) -> std::result::Result<Vec<T>, csv::Error> {
    reader.deserialize().collect()
}
