pub mod aggregate;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod eras;
pub mod filters;
pub mod preprocess;

/// The nine audio features tracked per performance, in display order
/// for the 3x3 musicality grids.
pub const AUDIO_FEATURES: &[&str] = &[
    "acousticness",
    "danceability",
    "energy",
    "instrumentalness",
    "liveness",
    "loudness",
    "speechiness",
    "tempo",
    "valence",
];

/// Application name for XDG paths
pub const APP_NAME: &str = "erascope";
