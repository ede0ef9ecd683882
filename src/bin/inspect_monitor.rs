use anyhow::{Context, Result};
use dam_sleep::data_loading::{detect_interval, read_monitor_file};
use dam_sleep::CHANNELS_PER_MONITOR;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Usage: {} <monitor_file>", args[0]);
        std::process::exit(1);
    }

    let rows = read_monitor_file(Path::new(&args[1]))
        .with_context(|| format!("Failed to read {}", args[1]))?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        println!("No rows in {}", args[1]);
        return Ok(());
    };

    println!("\nMonitor:   {}", first.monitor_number);
    println!("First row: {}", first.timestamp);
    println!("Last row:  {}", last.timestamp);
    println!("Rows:      {}", rows.len());
    match detect_interval(&rows) {
        Some(interval) => println!("Interval:  {} min", interval.num_minutes()),
        None => println!("Interval:  unknown"),
    }
    let light = rows.iter().map(|r| r.light_sensor);
    if let (Some(lo), Some(hi)) = (light.clone().min(), light.max()) {
        println!("Light:     {} to {}", lo, hi);
    }

    let mut totals = [0u64; CHANNELS_PER_MONITOR];
    for row in &rows {
        for (total, count) in totals.iter_mut().zip(row.counts) {
            *total += u64::from(count);
        }
    }

    println!("\nChannel totals:");
    for (idx, total) in totals.iter().enumerate() {
        println!("  {:>2}: {}", idx + 1, total);
    }

    Ok(())
}
