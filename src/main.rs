use anyhow::{Context, Result};
use clap::Parser;
use dam_sleep::config::{AnalysisParams, Args};
use dam_sleep::data_loading::{normalize, read_monitor_file, recorded_range};
use dam_sleep::output::{write_report, MISSING};
use dam_sleep::pipeline::{run, AnalysisReport, CancelFlag};
use log::debug;

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{:.2}", v))
}

fn print_summary(report: &AnalysisReport) {
    println!("\nChannel viability:");
    println!("------------------");
    println!(
        "{} alive, {} dead of {} (threshold {} counts/day)",
        report.viability.n_alive(),
        report.viability.n_dead(),
        report.viability.n_total(),
        report.viability.dead_threshold
    );
    let dead = report.viability.dead();
    if !dead.is_empty() {
        println!("Dead channels: {:?}", dead);
    }

    println!("\nDaily activity by condition:");
    println!("----------------------------");
    for row in &report.condition_activity {
        println!(
            "{:<16} {:<5} mean {:>10}  SEM {:>8}  alive {}/{}  {}",
            row.condition,
            row.scope.to_string(),
            fmt_stat(row.summary.mean),
            fmt_stat(row.summary.sem),
            row.n_alive,
            row.n_total,
            row.status
        );
    }

    println!("\nSleep by condition (fraction of time asleep):");
    println!("---------------------------------------------");
    for row in &report.sleep_by_condition {
        println!(
            "{:<16} {:<5} mean {:>6}  SEM {:>6}  n {}",
            row.condition,
            row.phase.to_string(),
            fmt_stat(row.summary.mean),
            fmt_stat(row.summary.sem),
            row.summary.n
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || handler_flag.cancel()).context("Error setting Ctrl+C handler")?;

    println!("Loading file: {}", args.input_path.display());
    let rows = read_monitor_file(&args.input_path)
        .with_context(|| format!("Failed to read {}", args.input_path.display()))?;
    println!("Total monitor rows: {}", rows.len());

    let params = match &args.params {
        Some(path) => AnalysisParams::from_json_file(path)
            .with_context(|| format!("Failed to load parameters from {}", path.display()))?,
        None => args.analysis_params(recorded_range(&rows))?,
    };
    params.validate().context("Invalid analysis parameters")?;
    debug!("Analysis parameters: {:?}", params);

    let recording = normalize(&rows, params.date_range, params.sampling_interval_minutes)
        .context("Failed to normalize recording")?;
    println!(
        "Analysing {} samples from {} to {}",
        recording.len(),
        params.date_range.start,
        params.date_range.end
    );

    let report = run(&recording, &params, &cancel).context("Analysis failed")?;
    print_summary(&report);

    let prefix = match recording.monitor_number {
        Some(n) => format!("Monitor{}", n),
        None => args
            .input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("results")
            .to_string(),
    };
    let written = write_report(&args.output_dir, &prefix, &report)
        .with_context(|| format!("Failed to write results to {}", args.output_dir.display()))?;
    println!(
        "\nWrote {} tables to {}",
        written.len(),
        args.output_dir.display()
    );

    Ok(())
}
