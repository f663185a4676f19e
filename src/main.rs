use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use erascope::aggregate;
use erascope::charts;
use erascope::config::AppConfig;
use erascope::dataset::Dataset;
use erascope::filters::ChartRequest;
use erascope::preprocess::{preprocess, PositionProfile, Preprocessed};

#[derive(Parser)]
#[command(name = "erascope", version, about = "Concert setlist explorer")]
struct Cli {
    /// Directory holding the three CSV files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory to write rendered SVG charts into
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Filter to one era (exact name, e.g. "Red")
    #[arg(long, global = true)]
    era: Option<String>,

    /// Filter to one city (or the first of two)
    #[arg(long, global = true)]
    city: Option<String>,

    /// Second city; with --city this selects both cities' rows
    #[arg(long, global = true)]
    city2: Option<String>,

    /// Print the chart's aggregate as JSON instead of rendering
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Frequency of songs played across eras (bubble heatmap)
    Frequency,

    /// Number of songs performed live by era (bar chart)
    LiveCounts,

    /// Song order distribution by era (swarm)
    OrderSwarm,

    /// Musicality across the setlist (3x3 feature grid)
    Musicality,

    /// Compare musicality between two cities (requires --city and --city2)
    CompareCities,

    /// Popularity vs. how often each song was played
    Occurrences {
        /// Number of rows in the terminal summary
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Popularity of recorded songs by album, split by performed-live
    Albums,

    /// Tickets sold across cities (capacity map)
    Tickets,

    /// Show dataset statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();
    let paths = config.resolve_csv_paths(cli.data_dir.as_ref());
    let out_dir = config.resolve_out_dir(cli.out.as_ref());

    let dataset = Dataset::load(&paths.setlist, &paths.venues, &paths.discography)
        .context("Failed to load data files")?;
    let pre = preprocess(&dataset);
    log::info!(
        "Preprocessed: {} cleaned rows, {} setlist positions",
        pre.cleaned.len(),
        pre.profile.len()
    );

    let request = ChartRequest::from_selections(cli.era.clone(), cli.city.clone(), cli.city2.clone());

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    match cli.command {
        Commands::Frequency => {
            let filtered = request.apply(&pre.cleaned);
            let cells = aggregate::frequency_counts(&filtered);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&cells)?);
                return Ok(());
            }
            let path = out_dir.join("frequency.svg");
            charts::render_frequency_heatmap(&cells, &path).context("Chart rendering failed")?;
            print_frequency_table(&cells);
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::LiveCounts => {
            let filtered = request.apply(&pre.cleaned);
            let counts = aggregate::era_counts(&filtered);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
                return Ok(());
            }
            let path = out_dir.join("live_counts.svg");
            charts::render_era_counts(&counts, &path).context("Chart rendering failed")?;
            print_era_counts_table(&counts);
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::OrderSwarm => {
            let filtered = request.apply(&pre.cleaned);
            let points = aggregate::order_points(&filtered);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&points)?);
                return Ok(());
            }
            let path = out_dir.join("order_swarm.svg");
            charts::render_order_swarm(&points, &path).context("Chart rendering failed")?;
            println!("{} observations across eras", points.len());
            print_era_counts_table(&aggregate::era_counts(&filtered));
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::Musicality => {
            // The position profile is computed over the full cleaned
            // table; era/city filters do not apply to this chart.
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&pre.profile)?);
                return Ok(());
            }
            let path = out_dir.join("musicality.svg");
            charts::render_musicality_grid(&pre.profile, &path)
                .context("Chart rendering failed")?;
            print_profile_table(&pre.profile);
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::CompareCities => {
            let filtered = request.apply(&pre.cleaned);
            let comparison = match aggregate::city_comparison(&filtered, &request) {
                Some(c) => c,
                None => {
                    println!(
                        "Please select two distinct cities (--city and --city2) for comparison."
                    );
                    return Ok(());
                }
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
                return Ok(());
            }
            let path = out_dir.join("compare_cities.svg");
            charts::render_city_comparison(&comparison, &path)
                .context("Chart rendering failed")?;
            println!(
                "Compare Musicality: {} vs {} ({} profile rows)",
                comparison.city_a,
                comparison.city_b,
                comparison.profiles.len()
            );
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::Occurrences { limit } => {
            let filtered = request.apply(&pre.cleaned);
            let occurrences = aggregate::song_occurrences(&filtered);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&occurrences)?);
                return Ok(());
            }
            let path = out_dir.join("occurrences.svg");
            charts::render_popularity_scatter(&occurrences, &path)
                .context("Chart rendering failed")?;
            print_occurrences_table(&occurrences, limit);
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::Albums => {
            // Always the full discography against the full cleaned
            // table; filters do not apply to this chart.
            let recorded = aggregate::recorded_popularity(&dataset.discography, &pre.cleaned);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&recorded)?);
                return Ok(());
            }
            let path = out_dir.join("album_popularity.svg");
            charts::render_album_popularity(&recorded, &path)
                .context("Chart rendering failed")?;
            let live = recorded.iter().filter(|r| r.performed_live).count();
            println!(
                "{} recorded songs, {} performed live, {} never played",
                recorded.len(),
                live,
                recorded.len() - live
            );
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::Tickets => {
            // Full venue table; filters do not apply to this chart.
            let tickets = aggregate::tickets_by_city(&dataset.venues);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tickets)?);
                return Ok(());
            }
            let path = out_dir.join("tickets_map.svg");
            charts::render_ticket_map(&tickets, &path).context("Chart rendering failed")?;
            print_tickets_table(&tickets);
            println!();
            println!("Wrote {}", path.display());
        }

        Commands::Stats => {
            let stats = aggregate::dataset_stats(&dataset, &pre.cleaned);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            print_stats(&stats, &pre);
        }
    }

    Ok(())
}

/// Print the heatmap cells as an aligned table (top 20 by count).
fn print_frequency_table(cells: &[aggregate::FrequencyCell]) {
    let mut top: Vec<&aggregate::FrequencyCell> = cells.iter().collect();
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(20);

    println!("{:<6} {:<25} {:>6}", "Order", "Era", "Count");
    println!("{}", "-".repeat(40));
    for cell in top {
        println!(
            "{:<6} {:<25} {:>6}",
            cell.song_order, cell.era_name, cell.count
        );
    }
}

fn print_era_counts_table(counts: &[aggregate::EraCount]) {
    println!("{:<25} {:>6}", "Era", "Count");
    println!("{}", "-".repeat(33));
    for c in counts {
        println!("{:<25} {:>6}", c.era_name, c.count);
    }
}

/// Print the position profile with a subset of columns that fits a
/// terminal row.
fn print_profile_table(profile: &[PositionProfile]) {
    println!(
        "{:<6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Order", "Acous", "Dance", "Energy", "Tempo", "Valence", "Pop"
    );
    println!("{}", "-".repeat(62));
    for p in profile {
        println!(
            "{:<6} {:>8.3} {:>8.3} {:>8.3} {:>8.1} {:>8.3} {:>8.1}",
            p.song_order,
            p.features.acousticness,
            p.features.danceability,
            p.features.energy,
            p.features.tempo,
            p.features.valence,
            p.popularity,
        );
    }
}

fn print_occurrences_table(occurrences: &[aggregate::SongOccurrences], limit: usize) {
    println!(
        "{:<30} {:<22} {:>5} {:>6}",
        "Song", "Era", "Pop", "Plays"
    );
    println!("{}", "-".repeat(67));
    for o in occurrences.iter().take(limit) {
        let title = o.short_title(30);
        println!(
            "{:<30} {:<22} {:>5.0} {:>6}",
            title, o.era_name, o.popularity, o.count
        );
    }
}

fn print_tickets_table(tickets: &[aggregate::CityTickets]) {
    println!("{:<18} {:>9} {:>10} {:>10}", "City", "Capacity", "Lat", "Lon");
    println!("{}", "-".repeat(51));
    for t in tickets {
        let capacity = match t.capacity {
            Some(c) => erascope::eras::capacity_label(c),
            None => "?".to_string(),
        };
        println!(
            "{:<18} {:>9} {:>10.3} {:>10.3}",
            t.city, capacity, t.latitude, t.longitude
        );
    }
}

fn print_stats(stats: &aggregate::DatasetStats, pre: &Preprocessed) {
    println!("Dataset Statistics");
    println!("==================");
    println!("Raw performance rows:   {}", stats.raw_performances);
    println!("Cleaned performances:   {}", stats.cleaned_performances);
    println!("Setlist positions:      {}", pre.profile.len());
    println!("Venue rows:             {}", stats.venues);
    println!(
        "Discography:            {} songs ({} performed live)",
        stats.discography_songs, stats.performed_live_songs
    );
    println!();

    if !stats.eras.is_empty() {
        println!("Eras:");
        for era in &stats.eras {
            println!("  {:<25} {}", era.era_name, era.count);
        }
        println!();
    }

    if !stats.cities.is_empty() {
        println!("Cities:");
        for (city, count) in &stats.cities {
            println!("  {:<18} {}", city, count);
        }
    }
}
