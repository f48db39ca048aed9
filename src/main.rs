mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use stomata_co2_estimator::{
    estimate, AreaUnit, Co2Unit, Estimation, EstimationInput, Language, ReferenceData, Report,
};

#[derive(Parser)]
#[command(name = "stomata-co2")]
#[command(about = "How many leaves would it take to absorb a city's daily CO₂?")]
struct CommandLine {
    /// JSON file replacing the built-in reference tables
    #[arg(long, global = true)]
    reference: Option<PathBuf>,
    /// Label language (ko, en)
    #[arg(long, global = true, default_value = "ko")]
    lang: Language,
    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the leaves needed for one city
    #[command(alias = "e")]
    Estimate(EstimateArgs),
    /// List leaf species with stomatal density and multiplier
    #[command(alias = "s")]
    Species,
    /// List cities with population
    #[command(alias = "c")]
    Cities,
    /// Print the active reference tables as JSON
    DumpReference,
}

#[derive(Args)]
struct EstimateArgs {
    /// Leaf species; first listed species when omitted
    #[arg(long)]
    species: Option<String>,
    /// Leaf width in cm
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    width: String,
    /// Leaf height in cm
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    height: String,
    /// Number of leaves
    #[arg(short = 'n', long, default_value = "1", allow_hyphen_values = true)]
    count: String,
    /// Unit for total area (cm², mm², m²)
    #[arg(long, default_value = "cm²")]
    area_unit: AreaUnit,
    /// Unit for absorbed CO₂ (µg, mg, g, kg)
    #[arg(long, default_value = "µg")]
    co2_unit: Co2Unit,
    /// City; first listed city when omitted
    #[arg(long)]
    city: Option<String>,
    /// Emit JSON instead of a labeled list
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a Report,
    estimation: &'a Estimation,
}

#[derive(Serialize)]
struct JsonError {
    error: String,
}

fn main() -> Result<ExitCode> {
    let cli = CommandLine::parse();
    logging::init_logging(cli.verbose);

    let loaded;
    let reference: &ReferenceData = match &cli.reference {
        Some(path) => {
            loaded = ReferenceData::from_path(path)
                .with_context(|| format!("loading reference tables from {}", path.display()))?;
            info!(path = %path.display(), "using custom reference tables");
            &loaded
        }
        None => ReferenceData::global(),
    };

    match cli.command {
        Commands::Estimate(args) => run_estimate(reference, args, cli.lang),
        Commands::Species => {
            for s in &reference.species {
                println!(
                    "{}\t{} /cm²\tx{}",
                    s.name,
                    s.density,
                    reference.multiplier(&s.name)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cities => {
            for c in &reference.cities {
                println!("{}\t{}", c.name, c.population);
            }
            println!("total\t{}", reference.total_population());
            Ok(ExitCode::SUCCESS)
        }
        Commands::DumpReference => {
            println!("{}", serde_json::to_string_pretty(reference)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_estimate(reference: &ReferenceData, args: EstimateArgs, lang: Language) -> Result<ExitCode> {
    let species = match args.species {
        Some(s) => s,
        None => reference.default_species().unwrap_or_default().to_string(),
    };
    let city = match args.city {
        Some(c) => c,
        None => reference.default_city().unwrap_or_default().to_string(),
    };

    let input = EstimationInput {
        species,
        width: args.width,
        height: args.height,
        count: args.count,
        area_unit: args.area_unit,
        co2_unit: args.co2_unit,
        city,
    };

    match estimate(reference, &input) {
        Ok(est) => {
            let report = Report::from_estimation(&est, lang);
            if args.json {
                let out = JsonOutput {
                    report: &report,
                    estimation: &est,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{report}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let message = lang.error_message(&err);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&JsonError { error: message })?);
            } else {
                println!("{message}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
