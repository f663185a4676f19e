use serde::Deserialize;

/// One row of the setlist+audio-feature merged CSV: a single song
/// performed at a single concert. Fields the merge may leave blank are
/// `Option` — blank CSV cells deserialize to `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct PerformanceRow {
    pub id: Option<String>,
    pub song_name: Option<String>,
    pub era_name: Option<String>,
    pub song_order: u32,
    pub venue_id: String,
    pub acousticness: Option<f64>,
    pub danceability: Option<f64>,
    pub energy: Option<f64>,
    pub instrumentalness: Option<f64>,
    pub liveness: Option<f64>,
    pub loudness: Option<f64>,
    pub speechiness: Option<f64>,
    pub tempo: Option<f64>,
    pub valence: Option<f64>,
    pub popularity: Option<f64>,
}

/// One row of the venue coordinates CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueRow {
    pub venue_id: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One row of the full-discography CSV: an officially released song,
/// independent of whether it was ever performed live.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscographyRow {
    pub id: String,
    pub song_name: String,
    pub album: String,
    pub popularity: f64,
}
