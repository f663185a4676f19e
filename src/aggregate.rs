use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::dataset::models::{DiscographyRow, VenueRow};
use crate::dataset::Dataset;
use crate::eras::city_capacity;
use crate::filters::ChartRequest;
use crate::preprocess::{AudioFeatures, Performance};

/// Count of performances at one (song_order, era_name) cell of the
/// frequency heatmap.
#[derive(Debug, Clone, Serialize)]
pub struct FrequencyCell {
    pub song_order: u32,
    pub era_name: String,
    pub count: usize,
}

/// Count per (song_order, era_name) pair, sorted by position then era.
pub fn frequency_counts(rows: &[Performance]) -> Vec<FrequencyCell> {
    let mut groups: BTreeMap<(u32, &str), usize> = BTreeMap::new();
    for row in rows {
        *groups.entry((row.song_order, row.era_name.as_str())).or_insert(0) += 1;
    }
    groups
        .into_iter()
        .map(|((song_order, era_name), count)| FrequencyCell {
            song_order,
            era_name: era_name.to_string(),
            count,
        })
        .collect()
}

/// Number of live performances attributed to one era.
#[derive(Debug, Clone, Serialize)]
pub struct EraCount {
    pub era_name: String,
    pub count: usize,
}

/// Count of rows per era, descending by count (ties broken by name so
/// output is deterministic).
pub fn era_counts(rows: &[Performance]) -> Vec<EraCount> {
    let mut groups: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *groups.entry(row.era_name.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<EraCount> = groups
        .into_iter()
        .map(|(era_name, count)| EraCount {
            era_name: era_name.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.era_name.cmp(&b.era_name)));
    counts
}

/// One raw (song_order, era_name) observation for distributional
/// display (the swarm chart draws every point).
#[derive(Debug, Clone, Serialize)]
pub struct OrderPoint {
    pub song_order: u32,
    pub era_name: String,
}

pub fn order_points(rows: &[Performance]) -> Vec<OrderPoint> {
    rows.iter()
        .map(|row| OrderPoint {
            song_order: row.song_order,
            era_name: row.era_name.clone(),
        })
        .collect()
}

/// Per-(city, song_order) mean of the audio features plus popularity.
#[derive(Debug, Clone, Serialize)]
pub struct CityProfile {
    pub city: String,
    pub song_order: u32,
    pub features: AudioFeatures,
    pub popularity: f64,
}

/// The position profile recomputed grouped by (city, song_order)
/// instead of song_order alone. Sorted by city then position.
pub fn city_profiles(rows: &[Performance]) -> Vec<CityProfile> {
    let mut groups: BTreeMap<(&str, u32), (AudioFeatures, f64, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry((row.city.as_str(), row.song_order))
            .or_insert((AudioFeatures::default(), 0.0, 0));
        entry.0.accumulate(&row.features);
        entry.1 += row.popularity;
        entry.2 += 1;
    }
    groups
        .into_iter()
        .map(|((city, song_order), (sums, pop_sum, count))| {
            let inv = 1.0 / count as f64;
            CityProfile {
                city: city.to_string(),
                song_order,
                features: sums.scaled(inv),
                popularity: pop_sum * inv,
            }
        })
        .collect()
}

/// Side-by-side musicality data for exactly two cities.
#[derive(Debug, Clone, Serialize)]
pub struct CityComparison {
    pub city_a: String,
    pub city_b: String,
    pub profiles: Vec<CityProfile>,
}

impl CityComparison {
    /// Profile rows belonging to one of the two cities, in position order.
    pub fn profiles_for(&self, city: &str) -> Vec<&CityProfile> {
        self.profiles.iter().filter(|p| p.city == city).collect()
    }
}

/// Build the city-comparison aggregate. Requires exactly two distinct,
/// non-All cities on the request; otherwise there is nothing to compare
/// and the caller should warn and skip rendering.
pub fn city_comparison(rows: &[Performance], request: &ChartRequest) -> Option<CityComparison> {
    let (city_a, city_b) = request.two_distinct_cities()?;
    Some(CityComparison {
        city_a: city_a.to_string(),
        city_b: city_b.to_string(),
        profiles: city_profiles(rows),
    })
}

/// How often one song was played, with its recorded popularity.
#[derive(Debug, Clone, Serialize)]
pub struct SongOccurrences {
    pub song_name: String,
    pub id: String,
    pub era_name: String,
    pub popularity: f64,
    pub count: usize,
}

impl SongOccurrences {
    /// Song name shortened to `max` characters for table display.
    /// Truncates on character boundaries, so curly quotes and other
    /// multibyte titles are safe.
    pub fn short_title(&self, max: usize) -> String {
        if self.song_name.chars().count() > max {
            let head: String = self.song_name.chars().take(max.saturating_sub(3)).collect();
            format!("{head}...")
        } else {
            self.song_name.clone()
        }
    }
}

/// Group by (song_name, id, era_name, popularity) counting setlist
/// entries, sorted descending by occurrence count.
pub fn song_occurrences(rows: &[Performance]) -> Vec<SongOccurrences> {
    let mut groups: BTreeMap<(&str, &str, &str, u64), usize> = BTreeMap::new();
    for row in rows {
        let key = (
            row.song_name.as_str(),
            row.id.as_str(),
            row.era_name.as_str(),
            row.popularity.to_bits(),
        );
        *groups.entry(key).or_insert(0) += 1;
    }
    let mut occurrences: Vec<SongOccurrences> = groups
        .into_iter()
        .map(|((song_name, id, era_name, pop_bits), count)| SongOccurrences {
            song_name: song_name.to_string(),
            id: id.to_string(),
            era_name: era_name.to_string(),
            popularity: f64::from_bits(pop_bits),
            count,
        })
        .collect();
    occurrences.sort_by(|a, b| b.count.cmp(&a.count).then(a.song_name.cmp(&b.song_name)));
    occurrences
}

/// A recorded song with its live-performance flag.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedSong {
    pub song_name: String,
    pub album: String,
    pub id: String,
    pub popularity: f64,
    pub performed_live: bool,
}

/// Reduce the discography to (song_name, album, id, popularity) with
/// `performed_live` true iff the id appears in the cleaned live table.
/// Always computed over the full, unfiltered tables.
pub fn recorded_popularity(
    discography: &[DiscographyRow],
    cleaned: &[Performance],
) -> Vec<RecordedSong> {
    let live_ids: HashSet<&str> = cleaned.iter().map(|p| p.id.as_str()).collect();
    discography
        .iter()
        .map(|song| RecordedSong {
            song_name: song.song_name.clone(),
            album: song.album.clone(),
            id: song.id.clone(),
            popularity: song.popularity,
            performed_live: live_ids.contains(song.id.as_str()),
        })
        .collect()
}

/// Summed ticket capacity for one map location.
#[derive(Debug, Clone, Serialize)]
pub struct CityTickets {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    /// None when the city has no entry in the capacity table.
    pub capacity: Option<u64>,
}

/// Attach capacities from the fixed city lookup and sum per
/// (city, latitude, longitude). Uses the full venue table, unfiltered.
pub fn tickets_by_city(venues: &[VenueRow]) -> Vec<CityTickets> {
    let mut groups: Vec<CityTickets> = Vec::new();
    for venue in venues {
        let capacity = city_capacity(&venue.city).map(u64::from);
        let existing = groups.iter_mut().find(|g| {
            g.city == venue.city
                && g.latitude == venue.latitude
                && g.longitude == venue.longitude
        });
        match existing {
            Some(group) => {
                if let Some(cap) = capacity {
                    *group.capacity.get_or_insert(0) += cap;
                }
            }
            None => groups.push(CityTickets {
                city: venue.city.clone(),
                latitude: venue.latitude,
                longitude: venue.longitude,
                capacity,
            }),
        }
    }
    groups
}

/// Dataset overview for the `stats` subcommand.
#[derive(Debug, Serialize)]
pub struct DatasetStats {
    pub raw_performances: usize,
    pub cleaned_performances: usize,
    pub venues: usize,
    pub discography_songs: usize,
    pub performed_live_songs: usize,
    pub eras: Vec<EraCount>,
    pub cities: Vec<(String, usize)>,
}

pub fn dataset_stats(dataset: &Dataset, cleaned: &[Performance]) -> DatasetStats {
    let live_ids: HashSet<&str> = cleaned.iter().map(|p| p.id.as_str()).collect();
    let performed_live_songs = dataset
        .discography
        .iter()
        .filter(|song| live_ids.contains(song.id.as_str()))
        .count();

    let mut city_groups: BTreeMap<&str, usize> = BTreeMap::new();
    for row in cleaned {
        *city_groups.entry(row.city.as_str()).or_insert(0) += 1;
    }
    let mut cities: Vec<(String, usize)> = city_groups
        .into_iter()
        .map(|(city, count)| (city.to_string(), count))
        .collect();
    cities.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    DatasetStats {
        raw_performances: dataset.performances.len(),
        cleaned_performances: cleaned.len(),
        venues: dataset.venues.len(),
        discography_songs: dataset.discography.len(),
        performed_live_songs,
        eras: era_counts(cleaned),
        cities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perf(id: &str, song: &str, era: &str, city: &str, order: u32, acousticness: f64) -> Performance {
        Performance {
            id: id.to_string(),
            song_name: song.to_string(),
            era_name: era.to_string(),
            song_order: order,
            venue_id: "V1".to_string(),
            city: city.to_string(),
            features: AudioFeatures {
                acousticness,
                ..Default::default()
            },
            popularity: 80.0,
        }
    }

    fn venue(id: &str, city: &str, lat: f64, lon: f64) -> VenueRow {
        VenueRow {
            venue_id: id.to_string(),
            city: city.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    fn disco(id: &str, song: &str, album: &str) -> DiscographyRow {
        DiscographyRow {
            id: id.to_string(),
            song_name: song.to_string(),
            album: album.to_string(),
            popularity: 75.0,
        }
    }

    #[test]
    fn test_frequency_counts() {
        let rows = vec![
            perf("a", "A", "Red", "Denver", 1, 0.1),
            perf("a", "A", "Red", "Seattle", 1, 0.1),
            perf("b", "B", "Lover", "Denver", 1, 0.2),
            perf("c", "C", "Red", "Denver", 2, 0.3),
        ];
        let cells = frequency_counts(&rows);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].song_order, 1);
        assert_eq!(cells[0].era_name, "Lover");
        assert_eq!(cells[0].count, 1);
        assert_eq!(cells[1].era_name, "Red");
        assert_eq!(cells[1].count, 2);
        assert_eq!(cells[2].song_order, 2);
    }

    #[test]
    fn test_era_counts_descending() {
        let rows = vec![
            perf("a", "A", "Red", "Denver", 1, 0.1),
            perf("b", "B", "Red", "Denver", 2, 0.1),
            perf("c", "C", "Lover", "Denver", 3, 0.1),
        ];
        let counts = era_counts(&rows);
        assert_eq!(counts[0].era_name, "Red");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].era_name, "Lover");
        assert_eq!(counts[1].count, 1);
    }

    #[test]
    fn test_order_points_raw_passthrough() {
        let rows = vec![
            perf("a", "A", "Red", "Denver", 1, 0.1),
            perf("a", "A", "Red", "Denver", 1, 0.1),
        ];
        // Every row becomes a point — no deduplication for the swarm.
        assert_eq!(order_points(&rows).len(), 2);
    }

    #[test]
    fn test_city_profiles_grouped_means() {
        let rows = vec![
            perf("a", "A", "Red", "Denver", 1, 0.2),
            perf("b", "B", "Red", "Denver", 1, 0.4),
            perf("c", "C", "Red", "Seattle", 1, 0.8),
        ];
        let profiles = city_profiles(&rows);
        assert_eq!(profiles.len(), 2);

        let denver = profiles.iter().find(|p| p.city == "Denver").unwrap();
        assert!((denver.features.acousticness - 0.3).abs() < 1e-9);
        let seattle = profiles.iter().find(|p| p.city == "Seattle").unwrap();
        assert!((seattle.features.acousticness - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_city_comparison_requires_two_distinct() {
        let rows = vec![
            perf("a", "A", "Red", "Denver", 1, 0.2),
            perf("b", "B", "Red", "Seattle", 1, 0.8),
        ];

        let one_city = ChartRequest {
            city_a: Some("Denver".to_string()),
            ..Default::default()
        };
        assert!(city_comparison(&rows, &one_city).is_none());

        let same_twice = ChartRequest {
            city_a: Some("Denver".to_string()),
            city_b: Some("Denver".to_string()),
            ..Default::default()
        };
        assert!(city_comparison(&rows, &same_twice).is_none());

        assert!(city_comparison(&rows, &ChartRequest::default()).is_none());

        let both = ChartRequest {
            city_a: Some("Denver".to_string()),
            city_b: Some("Seattle".to_string()),
            ..Default::default()
        };
        let comparison = city_comparison(&rows, &both).unwrap();
        assert_eq!(comparison.city_a, "Denver");
        assert_eq!(comparison.profiles_for("Denver").len(), 1);
        assert_eq!(comparison.profiles_for("Seattle").len(), 1);
    }

    #[test]
    fn test_song_occurrences_sorted_descending() {
        let rows = vec![
            perf("a", "Cruel Summer", "Lover", "Denver", 5, 0.1),
            perf("a", "Cruel Summer", "Lover", "Seattle", 4, 0.1),
            perf("a", "Cruel Summer", "Lover", "Tampa", 5, 0.1),
            perf("b", "august", "Folklore", "Denver", 9, 0.5),
        ];
        let occurrences = song_occurrences(&rows);
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].song_name, "Cruel Summer");
        assert_eq!(occurrences[0].count, 3);
        assert_eq!(occurrences[1].song_name, "august");
        assert_eq!(occurrences[1].count, 1);
    }

    #[test]
    fn test_short_title_truncates_on_char_boundary() {
        // 26 ASCII characters followed by a curly apostrophe, so the
        // multibyte character straddles a byte-index cut at 27.
        let rows = vec![perf(
            "a",
            "Taylor Swift Karma Remixes\u{2019} Anthology Edition",
            "Fearless",
            "Denver",
            1,
            0.1,
        )];
        let occurrences = song_occurrences(&rows);
        let title = occurrences[0].short_title(30);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 30);

        let rows = vec![perf("b", "Lover", "Lover", "Denver", 1, 0.1)];
        let occurrences = song_occurrences(&rows);
        assert_eq!(occurrences[0].short_title(30), "Lover");
    }

    #[test]
    fn test_performed_live_flag() {
        let cleaned = vec![
            perf("live1", "A", "Red", "Denver", 1, 0.1),
            perf("live2", "B", "Red", "Denver", 2, 0.1),
        ];
        let discography = vec![
            disco("live1", "A", "Red"),
            disco("studio1", "D", "Red"),
            disco("live2", "B", "Red"),
            disco("studio2", "E", "Midnights"),
        ];

        let recorded = recorded_popularity(&discography, &cleaned);
        assert_eq!(recorded.len(), 4);
        let by_id = |id: &str| recorded.iter().find(|r| r.id == id).unwrap();
        assert!(by_id("live1").performed_live);
        assert!(by_id("live2").performed_live);
        assert!(!by_id("studio1").performed_live);
        assert!(!by_id("studio2").performed_live);
    }

    #[test]
    fn test_tickets_sum_per_location() {
        let venues = vec![
            venue("V1", "Denver", 39.74, -104.99),
            venue("V2", "Denver", 39.74, -104.99),
            venue("V3", "Seattle", 47.59, -122.33),
        ];
        let tickets = tickets_by_city(&venues);
        assert_eq!(tickets.len(), 2);

        let denver = tickets.iter().find(|t| t.city == "Denver").unwrap();
        assert_eq!(denver.capacity, Some(2 * 84_000));
        let seattle = tickets.iter().find(|t| t.city == "Seattle").unwrap();
        assert_eq!(seattle.capacity, Some(72_000));
    }

    #[test]
    fn test_tickets_unknown_city_capacity_missing() {
        let venues = vec![venue("V1", "London", 51.55, -0.27)];
        let tickets = tickets_by_city(&venues);
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].capacity, None);
    }

    #[test]
    fn test_dataset_stats() {
        let cleaned = vec![
            perf("live1", "A", "Red", "Denver", 1, 0.1),
            perf("live1", "A", "Red", "Seattle", 1, 0.1),
        ];
        let dataset = Dataset {
            performances: Vec::new(),
            venues: vec![venue("V1", "Denver", 39.74, -104.99)],
            discography: vec![disco("live1", "A", "Red"), disco("studio1", "B", "Red")],
        };

        let stats = dataset_stats(&dataset, &cleaned);
        assert_eq!(stats.cleaned_performances, 2);
        assert_eq!(stats.discography_songs, 2);
        assert_eq!(stats.performed_live_songs, 1);
        assert_eq!(stats.eras[0].era_name, "Red");
        assert_eq!(stats.cities.len(), 2);
    }
}
