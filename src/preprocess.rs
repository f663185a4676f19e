use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::dataset::models::PerformanceRow;
use crate::dataset::Dataset;

/// The nine per-song audio features, complete by construction once a
/// row survives cleaning.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
}

impl AudioFeatures {
    /// Look up a feature by its column name (see `crate::AUDIO_FEATURES`).
    pub fn value(&self, name: &str) -> f64 {
        match name {
            "acousticness" => self.acousticness,
            "danceability" => self.danceability,
            "energy" => self.energy,
            "instrumentalness" => self.instrumentalness,
            "liveness" => self.liveness,
            "loudness" => self.loudness,
            "speechiness" => self.speechiness,
            "tempo" => self.tempo,
            "valence" => self.valence,
            _ => f64::NAN,
        }
    }

    pub fn accumulate(&mut self, other: &AudioFeatures) {
        self.acousticness += other.acousticness;
        self.danceability += other.danceability;
        self.energy += other.energy;
        self.instrumentalness += other.instrumentalness;
        self.liveness += other.liveness;
        self.loudness += other.loudness;
        self.speechiness += other.speechiness;
        self.tempo += other.tempo;
        self.valence += other.valence;
    }

    pub fn scaled(&self, factor: f64) -> AudioFeatures {
        AudioFeatures {
            acousticness: self.acousticness * factor,
            danceability: self.danceability * factor,
            energy: self.energy * factor,
            instrumentalness: self.instrumentalness * factor,
            liveness: self.liveness * factor,
            loudness: self.loudness * factor,
            speechiness: self.speechiness * factor,
            tempo: self.tempo * factor,
            valence: self.valence * factor,
        }
    }
}

/// A cleaned performance: song identity and audio features guaranteed
/// present, era name normalized, city pulled in from the venue join.
#[derive(Debug, Clone, Serialize)]
pub struct Performance {
    pub id: String,
    pub song_name: String,
    pub era_name: String,
    pub song_order: u32,
    pub venue_id: String,
    pub city: String,
    pub features: AudioFeatures,
    pub popularity: f64,
}

/// One row per song_order: mean of each audio feature plus popularity
/// across all cleaned performances at that setlist position.
#[derive(Debug, Clone, Serialize)]
pub struct PositionProfile {
    pub song_order: u32,
    pub features: AudioFeatures,
    pub popularity: f64,
}

/// Output of preprocessing: immutable after construction. Filtering
/// produces derived views, never mutates these tables.
pub struct Preprocessed {
    pub cleaned: Vec<Performance>,
    pub profile: Vec<PositionProfile>,
}

/// Normalize a raw era label:
/// - absent → "Intro"
/// - contains "surprise" (case-insensitive) → "Surprise Songs"
/// - otherwise capitalize the first letter of each word
pub fn normalize_era_name(raw: Option<&str>) -> String {
    let name = match raw {
        None => return "Intro".to_string(),
        Some(n) => n,
    };
    if name.to_lowercase().contains("surprise") {
        return "Surprise Songs".to_string();
    }
    title_case(name)
}

/// Capitalize the first character of each whitespace-separated word and
/// lowercase the rest. Non-alphabetic leading characters pass through
/// ("1989" stays "1989", "(debut)" stays "(debut)").
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean the raw performance table and compute the position-aggregate
/// profile. Rows missing song identity or any audio feature are
/// dropped, as are rows whose venue has no coordinate entry.
pub fn preprocess(dataset: &Dataset) -> Preprocessed {
    // Collapse duplicate venue rows so the join is one-to-many safe:
    // first (venue_id, city) pair wins.
    let mut venue_city: HashMap<&str, &str> = HashMap::new();
    for venue in &dataset.venues {
        venue_city
            .entry(venue.venue_id.as_str())
            .or_insert(venue.city.as_str());
    }

    let total = dataset.performances.len();
    let cleaned: Vec<Performance> = dataset
        .performances
        .iter()
        .filter_map(|row| clean_row(row, &venue_city))
        .collect();

    let dropped = total - cleaned.len();
    if dropped > 0 {
        log::info!("Dropped {dropped} of {total} performance rows (incomplete or unknown venue)");
    }

    let profile = position_profile(&cleaned);
    Preprocessed { cleaned, profile }
}

/// Convert a raw row into a cleaned performance, or None if it should
/// be dropped. Missing song name or acousticness marks the row as not a
/// real performance entry; the remaining features come from the same
/// merge, so any gap there drops the row too.
fn clean_row(row: &PerformanceRow, venue_city: &HashMap<&str, &str>) -> Option<Performance> {
    let song_name = row.song_name.clone()?;
    let acousticness = row.acousticness?;
    let city = venue_city.get(row.venue_id.as_str())?;

    Some(Performance {
        id: row.id.clone()?,
        song_name,
        era_name: normalize_era_name(row.era_name.as_deref()),
        song_order: row.song_order,
        venue_id: row.venue_id.clone(),
        city: (*city).to_string(),
        features: AudioFeatures {
            acousticness,
            danceability: row.danceability?,
            energy: row.energy?,
            instrumentalness: row.instrumentalness?,
            liveness: row.liveness?,
            loudness: row.loudness?,
            speechiness: row.speechiness?,
            tempo: row.tempo?,
            valence: row.valence?,
        },
        popularity: row.popularity?,
    })
}

/// Mean-aggregate the audio features plus popularity grouped by
/// song_order. Exactly one output row per distinct song_order, sorted
/// ascending.
pub fn position_profile(rows: &[Performance]) -> Vec<PositionProfile> {
    let mut groups: BTreeMap<u32, (AudioFeatures, f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry(row.song_order)
            .or_insert((AudioFeatures::default(), 0.0, 0));
        entry.0.accumulate(&row.features);
        entry.1 += row.popularity;
        entry.2 += 1;
    }

    groups
        .into_iter()
        .map(|(song_order, (sums, pop_sum, count))| {
            let inv = 1.0 / count as f64;
            PositionProfile {
                song_order,
                features: sums.scaled(inv),
                popularity: pop_sum * inv,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::models::{DiscographyRow, PerformanceRow, VenueRow};

    fn make_row(
        id: &str,
        song: Option<&str>,
        era: Option<&str>,
        order: u32,
        venue: &str,
        acousticness: Option<f64>,
    ) -> PerformanceRow {
        PerformanceRow {
            id: Some(id.to_string()),
            song_name: song.map(str::to_string),
            era_name: era.map(str::to_string),
            song_order: order,
            venue_id: venue.to_string(),
            acousticness,
            danceability: Some(0.5),
            energy: Some(0.7),
            instrumentalness: Some(0.0),
            liveness: Some(0.2),
            loudness: Some(-6.0),
            speechiness: Some(0.05),
            tempo: Some(120.0),
            valence: Some(0.6),
            popularity: Some(80.0),
        }
    }

    fn make_venue(id: &str, city: &str) -> VenueRow {
        VenueRow {
            venue_id: id.to_string(),
            city: city.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn make_dataset(performances: Vec<PerformanceRow>, venues: Vec<VenueRow>) -> Dataset {
        Dataset {
            performances,
            venues,
            discography: Vec::<DiscographyRow>::new(),
        }
    }

    #[test]
    fn test_era_absent_becomes_intro() {
        assert_eq!(normalize_era_name(None), "Intro");
    }

    #[test]
    fn test_era_surprise_collapsed() {
        assert_eq!(normalize_era_name(Some("surprise songs")), "Surprise Songs");
        assert_eq!(normalize_era_name(Some("SURPRISE set")), "Surprise Songs");
        assert_eq!(normalize_era_name(Some("acoustic Surprise")), "Surprise Songs");
    }

    #[test]
    fn test_era_title_cased() {
        assert_eq!(normalize_era_name(Some("speak now")), "Speak Now");
        assert_eq!(normalize_era_name(Some("RED")), "Red");
        assert_eq!(normalize_era_name(Some("1989")), "1989");
        assert_eq!(
            normalize_era_name(Some("taylor swift (debut)")),
            "Taylor Swift (debut)"
        );
    }

    #[test]
    fn test_era_never_absent_never_surprise_literal() {
        let inputs = [
            None,
            Some("fearless"),
            Some("surprise songs"),
            Some("a Surprise moment"),
            Some("midnights"),
        ];
        for raw in inputs {
            let era = normalize_era_name(raw);
            assert!(!era.is_empty());
            assert!(era == "Surprise Songs" || !era.to_lowercase().contains("surprise"));
        }
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let dataset = make_dataset(
            vec![
                make_row("a", Some("Cruel Summer"), Some("lover"), 1, "V1", Some(0.2)),
                make_row("b", None, Some("lover"), 2, "V1", Some(0.3)),
                make_row("c", Some("Lavender Haze"), Some("midnights"), 3, "V1", None),
            ],
            vec![make_venue("V1", "Glendale")],
        );

        let pre = preprocess(&dataset);
        assert_eq!(pre.cleaned.len(), 1);
        assert_eq!(pre.cleaned[0].song_name, "Cruel Summer");
        assert_eq!(pre.cleaned[0].city, "Glendale");
    }

    #[test]
    fn test_join_drops_unknown_venue() {
        let dataset = make_dataset(
            vec![
                make_row("a", Some("Style"), Some("1989"), 1, "V1", Some(0.2)),
                make_row("b", Some("Style"), Some("1989"), 1, "V9", Some(0.2)),
            ],
            vec![make_venue("V1", "Tampa")],
        );

        let pre = preprocess(&dataset);
        assert_eq!(pre.cleaned.len(), 1);
        assert_eq!(pre.cleaned[0].city, "Tampa");
    }

    #[test]
    fn test_duplicate_venue_rows_collapsed() {
        // Two venue rows with the same id must not fan out the join.
        let dataset = make_dataset(
            vec![make_row("a", Some("Style"), Some("1989"), 1, "V1", Some(0.2))],
            vec![make_venue("V1", "Houston"), make_venue("V1", "Houston")],
        );

        let pre = preprocess(&dataset);
        assert_eq!(pre.cleaned.len(), 1);
    }

    #[test]
    fn test_profile_one_row_per_position() {
        let dataset = make_dataset(
            vec![
                make_row("a", Some("A"), Some("red"), 1, "V1", Some(0.2)),
                make_row("b", Some("B"), Some("red"), 1, "V1", Some(0.4)),
                make_row("c", Some("C"), Some("red"), 2, "V1", Some(0.9)),
            ],
            vec![make_venue("V1", "Denver")],
        );

        let pre = preprocess(&dataset);
        let distinct: std::collections::HashSet<u32> =
            pre.cleaned.iter().map(|p| p.song_order).collect();
        assert_eq!(pre.profile.len(), distinct.len());
    }

    #[test]
    fn test_profile_mean_acousticness() {
        let dataset = make_dataset(
            vec![
                make_row("a", Some("A"), Some("red"), 1, "V1", Some(0.2)),
                make_row("b", Some("B"), Some("red"), 1, "V1", Some(0.4)),
                make_row("c", Some("C"), Some("red"), 1, "V1", Some(0.6)),
            ],
            vec![make_venue("V1", "Denver")],
        );

        let pre = preprocess(&dataset);
        assert_eq!(pre.profile.len(), 1);
        assert_eq!(pre.profile[0].song_order, 1);
        assert!((pre.profile[0].features.acousticness - 0.4).abs() < 1e-9);
        assert!((pre.profile[0].popularity - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_profile_sorted_by_position() {
        let dataset = make_dataset(
            vec![
                make_row("a", Some("A"), Some("red"), 5, "V1", Some(0.2)),
                make_row("b", Some("B"), Some("red"), 2, "V1", Some(0.4)),
                make_row("c", Some("C"), Some("red"), 9, "V1", Some(0.6)),
            ],
            vec![make_venue("V1", "Denver")],
        );

        let pre = preprocess(&dataset);
        let orders: Vec<u32> = pre.profile.iter().map(|p| p.song_order).collect();
        assert_eq!(orders, vec![2, 5, 9]);
    }

    #[test]
    fn test_feature_lookup_by_name() {
        let features = AudioFeatures {
            tempo: 128.0,
            loudness: -4.5,
            ..Default::default()
        };
        assert!((features.value("tempo") - 128.0).abs() < 1e-9);
        assert!((features.value("loudness") + 4.5).abs() < 1e-9);
        assert!(features.value("not-a-feature").is_nan());
    }
}
