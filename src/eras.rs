/// An RGB display color.
pub type Rgb = (u8, u8, u8);

/// Fallback color for era names outside the fixed table.
pub const FALLBACK_COLOR: Rgb = (105, 105, 105);

/// Display color per era, in legend order. Keys match the output of
/// `preprocess::normalize_era_name`.
const ERA_COLORS: &[(&str, Rgb)] = &[
    ("Intro", (198, 229, 151)),
    ("Taylor Swift (debut)", (0, 128, 128)),
    ("Fearless", (255, 215, 0)),
    ("Speak Now", (75, 0, 130)),
    ("Red", (178, 34, 34)),
    ("1989", (173, 216, 230)),
    ("Reputation", (35, 43, 43)),
    ("Lover", (255, 20, 147)),
    ("Folklore", (128, 128, 128)),
    ("Evermore", (210, 180, 140)),
    ("Midnights", (0, 0, 128)),
    ("Surprise Songs", (255, 255, 255)),
    ("Music Video Premiere", (255, 165, 0)),
];

/// Stadium capacity per tour city. Cities outside this list have no
/// known capacity.
const CITY_CAPACITIES: &[(&str, u32)] = &[
    ("Glendale", 78_600),
    ("Las Vegas", 71_835),
    ("Arlington", 105_000),
    ("Tampa", 75_000),
    ("Houston", 80_000),
    ("Atlanta", 75_000),
    ("Nashville", 69_143),
    ("Philadelphia", 69_896),
    ("Foxborough", 65_878),
    ("East Rutherford", 88_491),
    ("Chicago", 61_500),
    ("Detroit", 78_000),
    ("Pittsburgh", 75_000),
    ("Minneapolis", 73_000),
    ("Cincinnati", 65_515),
    ("Kansas City", 76_416),
    ("Denver", 84_000),
    ("Seattle", 72_000),
    ("Santa Clara", 68_500),
    ("Los Angeles", 100_240),
    ("Inglewood", 70_240),
    ("Mexico City", 65_000),
];

/// Display color for an era. Unknown eras get `FALLBACK_COLOR`.
pub fn era_color(era_name: &str) -> Rgb {
    ERA_COLORS
        .iter()
        .find(|(name, _)| *name == era_name)
        .map(|(_, color)| *color)
        .unwrap_or(FALLBACK_COLOR)
}

/// All known era names in legend order.
pub fn era_names() -> impl Iterator<Item = &'static str> {
    ERA_COLORS.iter().map(|(name, _)| *name)
}

/// Stadium capacity for a city, if it is on the tour list.
pub fn city_capacity(city: &str) -> Option<u32> {
    CITY_CAPACITIES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, capacity)| *capacity)
}

/// Short display label for a capacity figure: 76416 → "76K". Takes a
/// `u64` so per-city capacity sums pass through unchanged.
pub fn capacity_label(capacity: u64) -> String {
    format!("{}K", capacity / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_color_known() {
        assert_eq!(era_color("Fearless"), (255, 215, 0));
        assert_eq!(era_color("Red"), (178, 34, 34));
        assert_eq!(era_color("Surprise Songs"), (255, 255, 255));
    }

    #[test]
    fn test_era_color_unknown_falls_back() {
        assert_eq!(era_color("Debut Deluxe"), FALLBACK_COLOR);
        assert_eq!(era_color(""), FALLBACK_COLOR);
    }

    #[test]
    fn test_era_names_ordered() {
        let names: Vec<&str> = era_names().collect();
        assert_eq!(names.len(), 13);
        assert_eq!(names[0], "Intro");
        assert_eq!(names[names.len() - 1], "Music Video Premiere");
    }

    #[test]
    fn test_city_capacity_hit_and_miss() {
        assert_eq!(city_capacity("Arlington"), Some(105_000));
        assert_eq!(city_capacity("Kansas City"), Some(76_416));
        assert_eq!(city_capacity("London"), None);
    }

    #[test]
    fn test_capacity_label() {
        assert_eq!(capacity_label(76_416), "76K");
        assert_eq!(capacity_label(105_000), "105K");
        assert_eq!(capacity_label(999), "0K");
    }

    #[test]
    fn test_capacity_label_summed_beyond_u32() {
        // Per-city sums can exceed a single stadium's range.
        assert_eq!(capacity_label(5_000_000_000), "5000000K");
    }
}
