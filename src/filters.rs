use crate::preprocess::Performance;

/// User-selected filters for one chart invocation. Immutable — built
/// once from the CLI selections and passed into each aggregator.
/// `None` means "All" for every field.
#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub era: Option<String>,
    pub city_a: Option<String>,
    pub city_b: Option<String>,
}

impl ChartRequest {
    /// Build a request from raw selections, treating a literal "All"
    /// (any casing) the same as no selection.
    pub fn from_selections(
        era: Option<String>,
        city_a: Option<String>,
        city_b: Option<String>,
    ) -> Self {
        Self {
            era: normalize_selection(era),
            city_a: normalize_selection(city_a),
            city_b: normalize_selection(city_b),
        }
    }

    /// Apply the era and city filters to the cleaned table.
    ///
    /// Era selects an exact era_name match. For cities: one selected
    /// city restricts to it; two distinct cities yield the union of
    /// both cities' rows (the comparison chart separates them again
    /// later); the second city alone is ignored.
    pub fn apply(&self, rows: &[Performance]) -> Vec<Performance> {
        rows.iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect()
    }

    fn matches(&self, row: &Performance) -> bool {
        if let Some(era) = &self.era {
            if row.era_name != *era {
                return false;
            }
        }

        match (&self.city_a, &self.city_b) {
            (Some(a), Some(b)) if a != b => row.city == *a || row.city == *b,
            (Some(a), _) => row.city == *a,
            // City filtering only engages once the first city is picked.
            (None, _) => true,
        }
    }

    /// The two distinct, non-All cities this request names, if any.
    /// Gate for the city-comparison chart.
    pub fn two_distinct_cities(&self) -> Option<(&str, &str)> {
        match (self.city_a.as_deref(), self.city_b.as_deref()) {
            (Some(a), Some(b)) if a != b => Some((a, b)),
            _ => None,
        }
    }
}

fn normalize_selection(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.eq_ignore_ascii_case("all"))
}
