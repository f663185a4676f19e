//! SVG chart rendering. Each function takes a chart aggregate and
//! writes one SVG file; terminal summaries live in main.

use std::path::Path;

use anyhow::Result;
use plotters::prelude::*;

use crate::aggregate::{
    CityComparison, CityTickets, EraCount, FrequencyCell, OrderPoint, RecordedSong,
    SongOccurrences,
};
use crate::eras::{capacity_label, era_color, era_names};
use crate::preprocess::PositionProfile;
use crate::AUDIO_FEATURES;

const CHART_SIZE: (u32, u32) = (1280, 720);

/// Gold line used for the single-series musicality grid.
const GOLD: RGBColor = RGBColor(255, 215, 0);
/// Tan/firebrick pair for the two-city comparison grid.
const TAN: RGBColor = RGBColor(210, 180, 140);
const FIREBRICK: RGBColor = RGBColor(178, 34, 34);
/// Teal/firebrick split for the performed-live album chart and the map.
const TEAL: RGBColor = RGBColor(0, 128, 128);

fn era_rgb(era_name: &str) -> RGBColor {
    let (r, g, b) = era_color(era_name);
    RGBColor(r, g, b)
}

/// Eras actually present in the data, in fixed legend order with any
/// unknown names appended.
fn present_eras<'a>(present: impl Fn(&str) -> bool, extra: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ordered: Vec<String> = era_names()
        .filter(|name| present(name))
        .map(str::to_string)
        .collect();
    for name in extra {
        if !ordered.iter().any(|n| n == name) {
            ordered.push(name.to_string());
        }
    }
    ordered
}

/// Frequency of songs played across eras: one bubble per
/// (song_order, era) cell, sized and positioned by play count.
pub fn render_frequency_heatmap(cells: &[FrequencyCell], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = cells.iter().map(|c| c.song_order).max().unwrap_or(1) + 1;
    let count_max = cells.iter().map(|c| c.count).max().unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Frequency of songs played across Eras", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0u32..x_max, 0f64..count_max + 1.0)?;

    chart
        .configure_mesh()
        .x_desc("Song Order")
        .y_desc("Song Play Count")
        .draw()?;

    let eras = present_eras(
        |name| cells.iter().any(|c| c.era_name == name),
        cells.iter().map(|c| c.era_name.as_str()),
    );
    for era in &eras {
        let color = era_rgb(era);
        chart
            .draw_series(
                cells
                    .iter()
                    .filter(|c| c.era_name == *era)
                    .map(|c| {
                        let radius = 3.0 + 12.0 * (c.count as f64 / count_max);
                        Circle::new((c.song_order, c.count as f64), radius as i32, color.filled())
                    }),
            )?
            .label(era.clone())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Number of songs performed live by era, as a bar chart.
pub fn render_era_counts(counts: &[EraCount], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let y_max = counts.iter().map(|c| c.count).max().unwrap_or(1) as f64 + 1.0;
    let labels: Vec<String> = counts.iter().map(|c| c.era_name.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Number of Songs performed live by Era", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 60)
        .build_cartesian_2d(-0.5f64..counts.len().max(1) as f64 - 0.5, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if (x - idx as f64).abs() < 0.25 {
                labels.get(idx).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Era")
        .y_desc("Count")
        .draw()?;

    // Bars straddle the integer ticks so each label sits under the
    // center of its bar.
    chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
        let color = era_rgb(&c.era_name);
        Rectangle::new(
            [(i as f64 - 0.4, 0.0), (i as f64 + 0.4, c.count as f64)],
            color.filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Song order by era: every observation drawn as a point, one row of
/// the strip per era, spread deterministically within each cell.
pub fn render_order_swarm(points: &[OrderPoint], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let eras = present_eras(
        |name| points.iter().any(|p| p.era_name == name),
        points.iter().map(|p| p.era_name.as_str()),
    );
    let x_max = points.iter().map(|p| p.song_order).max().unwrap_or(1) as f64 + 1.0;

    let mut chart = ChartBuilder::on(&root)
        .caption("Song Order by Era", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 140)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0f64..x_max, -0.5f64..eras.len().max(1) as f64 - 0.5)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(eras.len())
        .y_label_formatter(&|y| {
            let idx = y.round() as usize;
            if (y - idx as f64).abs() < 0.25 {
                eras.get(idx).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Song Order")
        .y_desc("Era")
        .draw()?;

    for (era_idx, era) in eras.iter().enumerate() {
        let color = era_rgb(era);
        // Stack repeat observations of the same position into a small
        // vertical spread so they stay visible.
        let mut seen: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();
        let series: Vec<(f64, f64)> = points
            .iter()
            .filter(|p| p.era_name == *era)
            .map(|p| {
                let k = seen.entry(p.song_order).or_insert(0);
                let offset = (*k as f64 % 7.0 - 3.0) * 0.05;
                *k += 1;
                (p.song_order as f64, era_idx as f64 + offset)
            })
            .collect();
        chart.draw_series(
            series
                .into_iter()
                .map(|(x, y)| Circle::new((x, y), 3, color.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Musicality for the eras concert: a 3x3 grid with one line per audio
/// feature across setlist position.
pub fn render_musicality_grid(profile: &[PositionProfile], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 3));

    for (panel, feature) in panels.iter().zip(AUDIO_FEATURES) {
        let series: Vec<(f64, f64)> = profile
            .iter()
            .map(|p| (p.song_order as f64, p.features.value(feature)))
            .collect();
        draw_feature_panel(panel, feature, &[(&series, GOLD, None)])?;
    }

    root.present()?;
    Ok(())
}

/// Compare musicality between two cities: the same 3x3 grid with one
/// line per city in each panel.
pub fn render_city_comparison(comparison: &CityComparison, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 3));

    for (panel, feature) in panels.iter().zip(AUDIO_FEATURES) {
        let series_a: Vec<(f64, f64)> = comparison
            .profiles_for(&comparison.city_a)
            .iter()
            .map(|p| (p.song_order as f64, p.features.value(feature)))
            .collect();
        let series_b: Vec<(f64, f64)> = comparison
            .profiles_for(&comparison.city_b)
            .iter()
            .map(|p| (p.song_order as f64, p.features.value(feature)))
            .collect();
        draw_feature_panel(
            panel,
            feature,
            &[
                (&series_a, TAN, Some(comparison.city_a.as_str())),
                (&series_b, FIREBRICK, Some(comparison.city_b.as_str())),
            ],
        )?;
    }

    root.present()?;
    Ok(())
}

/// One panel of a musicality grid: line series over setlist position.
fn draw_feature_panel(
    panel: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    feature: &str,
    series: &[(&Vec<(f64, f64)>, RGBColor, Option<&str>)],
) -> Result<()> {
    let all_points = series.iter().flat_map(|(points, _, _)| points.iter());
    let (mut x_max, mut y_min, mut y_max) = (1.0f64, f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in all_points {
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if (y_max - y_min).abs() < 1e-12 {
        y_max = y_min + 1.0;
    }
    let pad = (y_max - y_min) * 0.05;

    let mut chart = ChartBuilder::on(panel)
        .caption(feature, ("sans-serif", 16))
        .margin(8)
        .set_label_area_size(LabelAreaPosition::Left, 45)
        .set_label_area_size(LabelAreaPosition::Bottom, 25)
        .build_cartesian_2d(0f64..x_max + 1.0, (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(4)
        .label_style(("sans-serif", 10))
        .draw()?;

    for (points, color, label) in series {
        let drawn = chart.draw_series(LineSeries::new((*points).clone(), color))?;
        if let Some(label) = label {
            let color = *color;
            drawn
                .label(*label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }

    if series.iter().any(|(_, _, label)| label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 10))
            .draw()?;
    }
    Ok(())
}

/// Popularity vs. song occurrences scatter, colored by era.
pub fn render_popularity_scatter(occurrences: &[SongOccurrences], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let x_max = occurrences
        .iter()
        .map(|o| o.popularity)
        .fold(1.0f64, f64::max);
    let y_max = occurrences.iter().map(|o| o.count).max().unwrap_or(1) as f64 + 1.0;

    let mut chart = ChartBuilder::on(&root)
        .caption("Popularity vs. Song Occurrences", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0f64..x_max * 1.05, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Popularity")
        .y_desc("Song Occurrences")
        .draw()?;

    let eras = present_eras(
        |name| occurrences.iter().any(|o| o.era_name == name),
        occurrences.iter().map(|o| o.era_name.as_str()),
    );
    for era in &eras {
        let color = era_rgb(era);
        chart
            .draw_series(
                occurrences
                    .iter()
                    .filter(|o| o.era_name == *era)
                    .map(|o| Circle::new((o.popularity, o.count as f64), 4, color.filled())),
            )?
            .label(era.clone())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Popularity of recorded songs by album, split by whether the song was
/// ever performed live (teal) or not (firebrick).
pub fn render_album_popularity(recorded: &[RecordedSong], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut albums: Vec<String> = Vec::new();
    for song in recorded {
        if !albums.contains(&song.album) {
            albums.push(song.album.clone());
        }
    }
    let y_max = recorded.iter().map(|r| r.popularity).fold(1.0f64, f64::max);

    let albums_for_labels = albums.clone();
    let mut chart = ChartBuilder::on(&root)
        .caption("Popularity of Recorded Songs by Album", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 80)
        .build_cartesian_2d(-0.5f64..albums.len().max(1) as f64 - 0.5, 0f64..y_max * 1.05)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(albums.len())
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            if (x - idx as f64).abs() < 0.25 {
                albums_for_labels.get(idx).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .x_desc("Album")
        .y_desc("Popularity")
        .label_style(("sans-serif", 10))
        .draw()?;

    for (live, color, label) in [(true, TEAL, "Played Live"), (false, FIREBRICK, "Not Played Live")] {
        let mut seen: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        let series: Vec<(f64, f64)> = recorded
            .iter()
            .filter(|r| r.performed_live == live)
            .filter_map(|r| {
                let album_idx = albums.iter().position(|a| *a == r.album)?;
                let k = seen.entry(album_idx).or_insert(0);
                let offset = (*k as f64 % 9.0 - 4.0) * 0.04;
                *k += 1;
                Some((album_idx as f64 + offset, r.popularity))
            })
            .collect();
        chart
            .draw_series(
                series
                    .into_iter()
                    .map(|(x, y)| Circle::new((x, y), 3, color.filled())),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Tickets sold across cities: a longitude/latitude scatter with
/// markers scaled by summed capacity. Cities without a known capacity
/// are drawn as small hollow rings.
pub fn render_ticket_map(tickets: &[CityTickets], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (mut lon_min, mut lon_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut lat_min, mut lat_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for t in tickets {
        lon_min = lon_min.min(t.longitude);
        lon_max = lon_max.max(t.longitude);
        lat_min = lat_min.min(t.latitude);
        lat_max = lat_max.max(t.latitude);
    }
    if !lon_min.is_finite() {
        (lon_min, lon_max, lat_min, lat_max) = (-1.0, 1.0, -1.0, 1.0);
    }
    let lon_pad = ((lon_max - lon_min) * 0.1).max(1.0);
    let lat_pad = ((lat_max - lat_min) * 0.1).max(1.0);

    let cap_max = tickets
        .iter()
        .filter_map(|t| t.capacity)
        .max()
        .unwrap_or(1) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption("Tickets Sold across cities", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(
            (lon_min - lon_pad)..(lon_max + lon_pad),
            (lat_min - lat_pad)..(lat_max + lat_pad),
        )?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()?;

    for t in tickets {
        match t.capacity {
            Some(capacity) => {
                let radius = 4.0 + 18.0 * (capacity as f64 / cap_max).sqrt();
                chart.draw_series(std::iter::once(Circle::new(
                    (t.longitude, t.latitude),
                    radius as i32,
                    TEAL.mix(0.6).filled(),
                )))?;
                chart.draw_series(std::iter::once(Text::new(
                    format!("{}: {}", t.city, capacity_label(capacity)),
                    (t.longitude, t.latitude),
                    ("sans-serif", 11),
                )))?;
            }
            None => {
                chart.draw_series(std::iter::once(Circle::new(
                    (t.longitude, t.latitude),
                    4,
                    TEAL.stroke_width(1),
                )))?;
            }
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::EraCount;

    #[test]
    fn test_era_counts_svg_labels_every_bar() {
        let counts = vec![
            EraCount {
                era_name: "Red".to_string(),
                count: 5,
            },
            EraCount {
                era_name: "Lover".to_string(),
                count: 3,
            },
        ];
        let path = std::env::temp_dir().join("erascope_live_counts_labels.svg");
        render_era_counts(&counts, &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains(">Red<"));
        assert!(svg.contains(">Lover<"));
        let _ = std::fs::remove_file(&path);
    }
}
