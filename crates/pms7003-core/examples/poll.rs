//! PMS7003 polling tool
//!
//! Reads the sensor at a fixed interval and logs every reading.
//!
//! Usage:
//!   cargo run --example poll -- [OPTIONS] [PORT]
//!
//! Options:
//!   --config FILE     Load settings from a JSON file
//!   --baud RATE       Baud rate (default: 9600)
//!   --interval MS     Delay between readings in ms (default: 1000)
//!   --count N         Stop after N polls (default: run forever)
//!   --demo            Use the simulated sensor instead of a serial port
//!   --corrupt RATE    With --demo, fraction of frames with a broken checksum
//!   --list            List serial ports and exit
//!
//! Set RUST_LOG=pms7003_core=debug to see individual retries.

use anyhow::{Context, Result};
use pms7003_core::prelude::*;
use pms7003_core::protocol::list_ports;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = SensorConfig::default();
    let mut port_override: Option<String> = None;
    let mut baud_override: Option<u32> = None;
    let mut interval_ms = 1000u64;
    let mut count: Option<u64> = None;
    let mut demo = false;
    let mut corrupt_rate = 0.0f64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let path = args.get(i).context("--config needs a file path")?;
                config = SensorConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path))?;
            }
            "--baud" | "-b" => {
                i += 1;
                baud_override = Some(args.get(i).context("--baud needs a value")?.parse()?);
            }
            "--interval" | "-i" => {
                i += 1;
                interval_ms = args.get(i).context("--interval needs a value")?.parse()?;
            }
            "--count" | "-n" => {
                i += 1;
                count = Some(args.get(i).context("--count needs a value")?.parse()?);
            }
            "--demo" => {
                demo = true;
            }
            "--corrupt" => {
                i += 1;
                corrupt_rate = args.get(i).context("--corrupt needs a value")?.parse()?;
            }
            "--list" | "-l" => {
                for port in list_ports() {
                    println!(
                        "{}\t{}",
                        port.name,
                        port.product.as_deref().unwrap_or("-")
                    );
                }
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            arg if !arg.starts_with('-') => {
                port_override = Some(arg.to_string());
            }
            other => {
                tracing::warn!("unknown option: {}", other);
            }
        }
        i += 1;
    }

    if let Some(port) = port_override {
        config.port_name = port;
    }
    if let Some(baud) = baud_override {
        config.baud_rate = baud;
    }
    config.validate()?;

    let link: Box<dyn SerialLink> = if demo {
        tracing::info!(corrupt_rate, "using simulated sensor");
        Box::new(DemoLink::new().with_corruption(0, corrupt_rate))
    } else {
        tracing::info!(port = %config.port_name, baud = config.baud_rate, "using serial sensor");
        Box::new(SerialPortLink::from_config(&config))
    };

    let mut sensor = Pms7003::with_link(link, &config)
        .with_context(|| format!("failed to open sensor on {}", config.port_name))?;

    let mut polls = 0u64;
    while count.map_or(true, |n| polls < n) {
        match sensor.get() {
            Ok(reading) => {
                tracing::info!(pm25 = reading.pm25, pm10 = reading.pm10, "reading");
            }
            // No reading this cycle; try again on the next tick
            Err(e) => tracing::warn!(error = %e, "no reading"),
        }
        polls += 1;
        std::thread::sleep(Duration::from_millis(interval_ms));
    }

    let stats = sensor.stats();
    tracing::info!(
        accepted = stats.readings_accepted,
        attempts = stats.attempts,
        checksum_errors = stats.checksum_errors,
        framing_errors = stats.framing_errors,
        outliers = stats.outliers_rejected,
        reopens = stats.reopens,
        "done"
    );
    sensor.close();
    Ok(())
}

fn print_help() {
    println!("PMS7003 polling tool");
    println!();
    println!("Usage: poll [OPTIONS] [PORT]");
    println!();
    println!("Options:");
    println!("  -c, --config FILE   Load settings from a JSON file");
    println!("  -b, --baud RATE     Baud rate (default: 9600)");
    println!("  -i, --interval MS   Delay between readings (default: 1000)");
    println!("  -n, --count N       Stop after N polls");
    println!("      --demo          Use the simulated sensor");
    println!("      --corrupt RATE  With --demo, fraction of corrupted frames");
    println!("  -l, --list          List serial ports and exit");
    println!("  -h, --help          Show this help");
}
