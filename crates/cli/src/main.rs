//! `vinscope` - offline VIN decoding at the command line
//!
//! ```text
//! vinscope decode <VIN> [--patterns] [--raw] [--format text|json]
//!                 [--model-year N] [--catalog PATH]
//! ```

use std::env;
use std::fmt::Write as _;
use std::process;

use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vin_core_domain::{CatalogSource, Decoder};
use vin_core_models::{DecodeOptions, DecodeResult, DecoderConfig, ErrorCode, Severity};

const EXIT_OK: i32 = 0;
const EXIT_INVALID_VIN: i32 = 1;
const EXIT_CATALOG_ERROR: i32 = 2;
const EXIT_USAGE: i32 = 64;

const DEFAULT_CATALOG: &str = "./data/vpic.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, PartialEq, Eq)]
struct DecodeArgs {
    vin: String,
    patterns: bool,
    raw: bool,
    format: OutputFormat,
    model_year: Option<i32>,
    catalog: Option<String>,
}

fn print_usage() {
    eprintln!("Usage: vinscope decode <VIN> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --patterns        Include the winning pattern matches");
    eprintln!("  --raw             Include every candidate match");
    eprintln!("  --format FORMAT   Output format: text (default) or json");
    eprintln!("  --model-year N    Override the decoded model year");
    eprintln!("  --catalog PATH    Catalog file (default: $VINSCOPE_CATALOG or {DEFAULT_CATALOG})");
}

fn parse_args(args: &[String]) -> Result<DecodeArgs, String> {
    let mut iter = args.iter();

    match iter.next().map(String::as_str) {
        Some("decode") => {}
        Some(other) => return Err(format!("Unknown command: {other}")),
        None => return Err("Missing command".to_string()),
    }

    let mut vin = None;
    let mut patterns = false;
    let mut raw = false;
    let mut format = OutputFormat::Text;
    let mut model_year = None;
    let mut catalog = None;

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--patterns" => patterns = true,
            "--raw" => raw = true,
            "--format" => {
                format = match iter.next().map(String::as_str) {
                    Some("text") => OutputFormat::Text,
                    Some("json") => OutputFormat::Json,
                    Some(other) => return Err(format!("Unknown format: {other}")),
                    None => return Err("--format requires a value".to_string()),
                };
            }
            "--model-year" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--model-year requires a value".to_string())?;
                let year = value
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid model year: {value}"))?;
                model_year = Some(year);
            }
            "--catalog" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--catalog requires a value".to_string())?;
                catalog = Some(value.clone());
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {flag}")),
            positional => {
                if vin.is_some() {
                    return Err(format!("Unexpected argument: {positional}"));
                }
                vin = Some(positional.to_string());
            }
        }
    }

    let vin = vin.ok_or_else(|| "Missing VIN argument".to_string())?;
    Ok(DecodeArgs {
        vin,
        patterns,
        raw,
        format,
        model_year,
        catalog,
    })
}

/// Exit code for a finished decode
fn exit_code_for(result: &DecodeResult) -> i32 {
    if result.valid {
        EXIT_OK
    } else if result.has_error(ErrorCode::CatalogUnavailable) {
        EXIT_CATALOG_ERROR
    } else {
        EXIT_INVALID_VIN
    }
}

fn render_text(result: &DecodeResult) -> String {
    let mut out = String::new();
    let dash = "-".to_string();

    let _ = writeln!(out, "VIN:        {}", result.vin);
    let _ = writeln!(out, "Status:     {}", if result.valid { "valid" } else { "invalid" });

    let vehicle = &result.components.vehicle;
    let year = vehicle.year.map_or_else(|| dash.clone(), |y| y.to_string());
    let _ = writeln!(
        out,
        "Vehicle:    {} {} {}",
        year,
        vehicle.make.as_deref().unwrap_or("-"),
        vehicle.model.as_deref().unwrap_or("-"),
    );
    if let Some(body) = &vehicle.body_style {
        let _ = writeln!(out, "Body:       {body}");
    }
    if let Some(series) = &vehicle.series {
        let _ = writeln!(out, "Series:     {series}");
    }
    if let Some(drive) = &vehicle.drive_type {
        let _ = writeln!(out, "Drive:      {drive}");
    }

    if let Some(wmi) = &result.components.wmi {
        let _ = writeln!(
            out,
            "WMI:        {} - {} ({}, {})",
            wmi.code,
            wmi.manufacturer.as_deref().unwrap_or("-"),
            wmi.country.as_deref().unwrap_or("-"),
            wmi.region.as_deref().unwrap_or("-"),
        );
    }

    if let Some(plant) = &result.components.plant {
        let _ = writeln!(
            out,
            "Plant:      {} ({}, {})",
            plant.code,
            plant.city.as_deref().unwrap_or("-"),
            plant.country.as_deref().unwrap_or("-"),
        );
    }

    let engine = &result.components.engine;
    if engine.cylinders.is_some() || engine.displacement.is_some() || engine.fuel.is_some() {
        let _ = writeln!(
            out,
            "Engine:     {} cyl, {} L, {}",
            engine.cylinders.as_deref().unwrap_or("-"),
            engine.displacement.as_deref().unwrap_or("-"),
            engine.fuel.as_deref().unwrap_or("-"),
        );
    }

    let model_year = &result.components.model_year;
    let year = model_year.year.map_or_else(|| dash.clone(), |y| y.to_string());
    let _ = writeln!(out, "Model year: {year} ({:?})", model_year.source);

    if let Some(check) = &result.components.check_digit {
        let _ = writeln!(
            out,
            "Check digit: {}",
            if check.is_valid { "OK".to_string() } else {
                format!(
                    "MISMATCH (expected '{}', found '{}')",
                    check.expected.unwrap_or('?'),
                    check.actual.unwrap_or('?')
                )
            }
        );
    }

    if let Some(patterns) = &result.patterns {
        let _ = writeln!(out, "Patterns:");
        for m in patterns {
            let _ = writeln!(
                out,
                "  {:<28} {:<20} {} ({:.2}, {:?})",
                m.element, m.value, m.keys, m.confidence, m.source
            );
        }
    }

    for error in &result.errors {
        let label = match error.severity {
            Severity::Fatal => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(out, "{label}: [{}] {}", error.code.as_str(), error.message);
    }

    out
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            eprintln!();
            print_usage();
            process::exit(EXIT_USAGE);
        }
    };

    let catalog_path = parsed
        .catalog
        .clone()
        .or_else(|| env::var("VINSCOPE_CATALOG").ok())
        .unwrap_or_else(|| DEFAULT_CATALOG.to_string());

    let decoder =
        match Decoder::open(CatalogSource::path(&catalog_path), DecoderConfig::default()).await {
            Ok(decoder) => decoder,
            Err(error) => {
                eprintln!("{error}");
                process::exit(EXIT_CATALOG_ERROR);
            }
        };

    let options = DecodeOptions {
        model_year: parsed.model_year,
        include_pattern_details: parsed.patterns,
        include_raw_data: parsed.raw,
        ..DecodeOptions::default()
    };

    let result = decoder.decode_with(&parsed.vin, &options).await;
    decoder.close().await;

    match parsed.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("Failed to serialize result: {error}");
                process::exit(EXIT_CATALOG_ERROR);
            }
        },
        OutputFormat::Text => print!("{}", render_text(&result)),
    }

    process::exit(exit_code_for(&result));
}
