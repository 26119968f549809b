//! nightglow CLI - nighttime-light change analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use nightglow_algorithms::imagery::{log_compress, mask_to_boundary, MaskParams};
use nightglow_algorithms::workflow::{aggregate, analyze_pixels, analyze_units, calendar_changes};
use nightglow_core::io::{read_boundaries, read_geotiff, read_table, write_geotiff, write_rows, write_table, BoundaryFields};
use nightglow_core::{AdminLevel, AnalysisConfig, BoundarySet, DataIssue, Period, Raster, RasterStack};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "nightglow")]
#[command(author, version, about = "Nighttime-light change analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Analysis configuration (TOML); defaults apply to missing keys
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Boundary file options shared by the commands that read one
#[derive(clap::Args)]
struct BoundaryArgs {
    /// GeoJSON feature collection of boundaries
    #[arg(short, long)]
    boundaries: PathBuf,
    /// Administrative level: adm0, adm1, adm2, adm3, location
    #[arg(short, long, default_value = "adm1")]
    level: AdminLevel,
    /// Property holding the unit code (default: ADM{n}_PCODE)
    #[arg(long)]
    code_field: Option<String>,
    /// Property holding the display name (default: ADM{n}_EN)
    #[arg(long)]
    name_field: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Clip a raster to one boundary and null no-light cells
    Mask {
        /// Input raster file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        #[command(flatten)]
        boundary: BoundaryArgs,
        /// Code of the unit to clip to
        #[arg(long)]
        unit: String,
    },
    /// Apply ln(ln(v+1)+1) for display
    LogCompress {
        /// Input raster file
        input: PathBuf,
        /// Output file
        output: PathBuf,
    },
    /// Reduce a raster stack to a unit_id,period,value table
    Aggregate {
        #[command(flatten)]
        boundary: BoundaryArgs,
        /// Raster for one period, as PERIOD=PATH (repeatable)
        #[arg(short, long = "raster", value_parser = parse_stack_entry, required = true)]
        rasters: Vec<(Period, PathBuf)>,
        /// Output CSV table
        #[arg(short, long)]
        output: PathBuf,
        /// Write data issues as JSON
        #[arg(long)]
        issues: Option<PathBuf>,
    },
    /// Baseline and change records for every unit of a table
    UnitChange {
        /// Input CSV table (unit_id,period,value)
        table: PathBuf,
        /// Output CSV of change records
        output: PathBuf,
        /// First baseline period (default: earliest period in the table)
        #[arg(long)]
        baseline_start: Option<Period>,
        /// Write per-unit baselines as CSV
        #[arg(long)]
        baselines: Option<PathBuf>,
        /// Write data issues as JSON
        #[arg(long)]
        issues: Option<PathBuf>,
    },
    /// Like-month comparison between two years
    Calendar {
        /// Input CSV table (unit_id,period,value)
        table: PathBuf,
        /// Output CSV
        output: PathBuf,
        /// Earlier year
        #[arg(long)]
        previous: i32,
        /// Later year
        #[arg(long)]
        current: i32,
    },
    /// Full and baseline-only series on a shared axis, as JSON
    Series {
        /// Input CSV table (unit_id,period,value)
        table: PathBuf,
        /// Output JSON
        output: PathBuf,
        /// First baseline period (default: earliest period in the table)
        #[arg(long)]
        baseline_start: Option<Period>,
    },
    /// Per-cell change rasters for target months
    PixelChange {
        /// Raster for one period, as PERIOD=PATH (repeatable)
        #[arg(short, long = "raster", value_parser = parse_stack_entry, required = true)]
        rasters: Vec<(Period, PathBuf)>,
        /// Target period (repeatable)
        #[arg(short, long = "target", required = true)]
        targets: Vec<Period>,
        /// Directory for the output rasters
        #[arg(short, long)]
        output_dir: PathBuf,
        /// First baseline period when the configuration selects a fixed baseline
        #[arg(long)]
        fixed_start: Option<Period>,
        /// Write data issues as JSON
        #[arg(long)]
        issues: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set default subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_stack_entry(s: &str) -> std::result::Result<(Period, PathBuf), String> {
    let (period, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PERIOD=PATH, got '{s}'"))?;
    let period: Period = period.parse().map_err(|e| format!("{e}"))?;
    Ok((period, PathBuf::from(path)))
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_stack(entries: &[(Period, PathBuf)]) -> Result<RasterStack> {
    let mut stack = RasterStack::new();
    for (period, path) in entries {
        let raster = read_raster(path)?.with_period(*period);
        if stack.insert(*period, raster).is_some() {
            anyhow::bail!("Period {} given more than once", period);
        }
    }
    Ok(stack)
}

fn read_boundary_set(args: &BoundaryArgs) -> Result<BoundarySet> {
    let mut fields = BoundaryFields::pcode(args.level);
    if let Some(code) = &args.code_field {
        fields.code = code.clone();
    }
    if args.name_field.is_some() {
        fields.name = args.name_field.clone();
    }
    let pb = spinner("Reading boundaries...");
    let set = read_boundaries(&args.boundaries, args.level, &fields)
        .with_context(|| format!("Failed to read boundaries {}", args.boundaries.display()))?;
    pb.finish_and_clear();
    info!("Boundaries: {} at {}", set.len(), args.level);
    Ok(set)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn write_csv<S: Serialize>(rows: &[S], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_rows(BufWriter::new(file), rows).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_json<S: Serialize>(value: &S, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn report_issues(issues: &[DataIssue], path: Option<&Path>) -> Result<()> {
    if !issues.is_empty() {
        warn!("{} data issues", issues.len());
    }
    if let Some(path) = path {
        write_json(&issues, path)?;
        println!("Issues saved to: {}", path.display());
    }
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(sum) = stats.sum {
                println!("  Sum: {:.4}", sum);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        // ── Map view ─────────────────────────────────────────────────
        Commands::Mask {
            input,
            output,
            boundary,
            unit,
        } => {
            let set = read_boundary_set(&boundary)?;
            let unit_boundary = set
                .find(boundary.level, &unit)
                .with_context(|| format!("No {} boundary with code {}", boundary.level, unit))?;
            let raster = read_raster(&input)?;
            let start = Instant::now();
            let result = mask_to_boundary(&raster, unit_boundary, &MaskParams::from(&config))
                .context("Failed to mask raster")?;
            let elapsed = start.elapsed();
            info!("Defined cells after masking: {}", result.statistics().valid_count);
            write_result(&result, &output)?;
            done("Masked raster", &output, elapsed);
        }

        Commands::LogCompress { input, output } => {
            let raster = read_raster(&input)?;
            let start = Instant::now();
            let result = log_compress(&raster).context("Failed to compress raster")?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done("Log-compressed raster", &output, elapsed);
        }

        // ── Tabular ──────────────────────────────────────────────────
        Commands::Aggregate {
            boundary,
            rasters,
            output,
            issues,
        } => {
            let set = read_boundary_set(&boundary)?;
            let stack = read_stack(&rasters)?;
            let start = Instant::now();
            let report = aggregate(&stack, &set, boundary.level, &config).context("Failed to aggregate")?;
            let elapsed = start.elapsed();
            write_table(&report.table, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            report_issues(&report.issues, issues.as_deref())?;
            done("Table", &output, elapsed);
        }

        Commands::UnitChange {
            table,
            output,
            baseline_start,
            baselines,
            issues,
        } => {
            let table = read_table(&table).with_context(|| format!("Failed to read table {}", table.display()))?;
            let start = Instant::now();
            let Some(analysis) = analyze_units(&table, baseline_start, &config).context("Failed to compute change")?
            else {
                anyhow::bail!("Table has no records");
            };
            let elapsed = start.elapsed();
            write_csv(&analysis.changes.records, &output)?;
            if let Some(path) = baselines {
                write_csv(&analysis.changes.baselines, &path)?;
                println!("Baselines saved to: {}", path.display());
            }
            report_issues(&analysis.changes.issues, issues.as_deref())?;
            done("Change records", &output, elapsed);
        }

        Commands::Calendar {
            table,
            output,
            previous,
            current,
        } => {
            if previous >= current {
                anyhow::bail!("--previous ({}) must be before --current ({})", previous, current);
            }
            let table = read_table(&table).with_context(|| format!("Failed to read table {}", table.display()))?;
            let start = Instant::now();
            let rows = calendar_changes(&table, previous, current, &config).context("Failed to compare years")?;
            let elapsed = start.elapsed();
            info!("{} comparable unit-months", rows.len());
            write_csv(&rows, &output)?;
            done("Calendar comparison", &output, elapsed);
        }

        Commands::Series {
            table,
            output,
            baseline_start,
        } => {
            let table = read_table(&table).with_context(|| format!("Failed to read table {}", table.display()))?;
            let start = Instant::now();
            let Some(analysis) = analyze_units(&table, baseline_start, &config).context("Failed to build series")?
            else {
                anyhow::bail!("Table has no records");
            };
            let elapsed = start.elapsed();
            write_json(&analysis.series, &output)?;
            done("Series", &output, elapsed);
        }

        // ── Change view ──────────────────────────────────────────────
        Commands::PixelChange {
            rasters,
            targets,
            output_dir,
            fixed_start,
            issues,
        } => {
            let stack = read_stack(&rasters)?;
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let start = Instant::now();
            let report =
                analyze_pixels(&stack, &targets, &config, fixed_start).context("Failed to compute pixel change")?;
            let elapsed = start.elapsed();

            for change in &report.changes {
                let outputs = [
                    ("baseline", &change.baseline),
                    ("absolute", &change.change.absolute),
                    ("percent", &change.change.percent),
                    ("percent_raw", &change.change.percent_raw),
                ];
                for (suffix, raster) in outputs {
                    let path = output_dir.join(format!("{}_{}.tif", change.period, suffix));
                    write_result(raster, &path)?;
                }
            }
            report_issues(&report.issues, issues.as_deref())?;
            println!("{} of {} targets computed", report.changes.len(), targets.len());
            done("Change rasters", &output_dir, elapsed);
        }
    }

    Ok(())
}
