#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

use vitalrisk::data::{load_screening_data, save_predictions};
use vitalrisk::engine::{RiskCategory, RiskInferenceEngine};
use vitalrisk::params::{INPUT_FEATURES, NetworkParameters, OUTPUT_CLASSES};
use vitalrisk::recommend::recommendations;
use vitalrisk::vitals::{ExamplePreset, VitalsForm, vitals_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum PresetCli {
    Low,
    Moderate,
    High,
}

impl From<PresetCli> for ExamplePreset {
    fn from(preset: PresetCli) -> Self {
        match preset {
            PresetCli::Low => ExamplePreset::Low,
            PresetCli::Moderate => ExamplePreset::Moderate,
            PresetCli::High => ExamplePreset::High,
        }
    }
}

#[derive(Args)]
pub struct PredictArgs {
    /// Path to the network parameter file (.toml)
    #[arg(long)]
    pub model: PathBuf,

    /// Start from a built-in example patient; individual flags override its values
    #[arg(long, value_enum)]
    pub example: Option<PresetCli>,

    /// Age in years
    #[arg(long)]
    pub age: Option<String>,

    /// male or female
    #[arg(long)]
    pub gender: Option<String>,

    /// Body weight in kg
    #[arg(long)]
    pub weight: Option<String>,

    /// Height in cm
    #[arg(long)]
    pub height: Option<String>,

    /// Body temperature in degrees Celsius
    #[arg(long)]
    pub temperature: Option<String>,

    /// Resting heart rate in beats per minute
    #[arg(long)]
    pub heart_rate: Option<String>,

    /// Respiratory rate in breaths per minute
    #[arg(long)]
    pub respiratory_rate: Option<String>,

    /// Oxygen saturation in percent
    #[arg(long)]
    pub oxygen_saturation: Option<String>,

    /// Do not reject implausible values before running the network
    #[arg(long)]
    pub skip_range_check: bool,
}

#[derive(Args)]
pub struct InferArgs {
    /// Path to a TSV file with age, gender, weight, height, temperature,
    /// heart_rate, respiratory_rate and oxygen_saturation columns
    pub vitals_data: String,

    /// Path to the network parameter file (.toml)
    #[arg(long)]
    pub model: PathBuf,

    /// Where to write the predictions
    #[arg(long, default_value = "predictions.tsv")]
    pub output: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen one person from command-line values
    #[command(about = "Predict hypertension risk for one person")]
    Predict(PredictArgs),

    /// Screen every row of a vitals TSV file
    #[command(about = "Screen a batch of people (outputs: predictions.tsv)")]
    Infer(InferArgs),

    /// Convert W.json, b.json and Beta_output.json into a TOML parameter file
    #[command(about = "Import JSON weight files (outputs: model.toml)")]
    Import {
        /// Directory holding W.json, b.json and Beta_output.json
        #[arg(long)]
        json_dir: PathBuf,

        #[arg(long, default_value = "model.toml")]
        output: PathBuf,
    },

    /// Validate a parameter file and print its shapes
    Inspect {
        #[arg(long)]
        model: PathBuf,
    },
}

#[derive(Parser)]
#[command(
    name = "vitalrisk",
    about = "Hypertension risk screening from vital signs",
    long_about = "Runs a pretrained single-hidden-layer network over a person's vital signs \
                  and reports a risk probability, a Low/Moderate/High category and lifestyle \
                  recommendations."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

fn build_form(args: &PredictArgs) -> VitalsForm {
    let mut form = match args.example {
        Some(preset) => ExamplePreset::from(preset).form(),
        None => VitalsForm {
            gender: "male".to_string(),
            ..VitalsForm::default()
        },
    };

    let overrides = [
        (&args.age, &mut form.age),
        (&args.gender, &mut form.gender),
        (&args.weight, &mut form.weight),
        (&args.height, &mut form.height),
        (&args.temperature, &mut form.temperature),
        (&args.heart_rate, &mut form.heart_rate),
        (&args.respiratory_rate, &mut form.respiratory_rate),
        (&args.oxygen_saturation, &mut form.oxygen_saturation),
    ];
    for (value, slot) in overrides {
        if let Some(text) = value {
            *slot = text.clone();
        }
    }
    form
}

pub fn predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let form = build_form(&args);
    if args.skip_range_check {
        println!("Skipping range checks via --skip-range-check flag.");
    } else {
        form.validate()?;
    }

    println!("Loading model from: {}", args.model.display());
    let engine = RiskInferenceEngine::new(NetworkParameters::load(&args.model)?);

    let vitals = form.to_raw_vitals();
    let result = engine.infer(&vitals);

    if let Some(error) = &result.error {
        return Err(format!("Risk could not be calculated: {error}").into());
    }

    println!();
    println!(
        "Hypertension risk: {:.1}% ({})",
        result.probability, result.category
    );

    println!();
    println!("Vitals summary:");
    for reading in vitals_summary(&vitals) {
        println!(
            "  {:<18} {:>7} (reference {}) {}",
            reading.name, reading.value, reading.reference, reading.status
        );
    }

    println!();
    println!("Recommendations:");
    for item in recommendations(&vitals, result.category) {
        println!("  {} {}", item.icon, item.key);
    }

    Ok(())
}

pub fn infer(args: InferArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading model from: {}", args.model.display());
    let engine = RiskInferenceEngine::new(NetworkParameters::load(&args.model)?);
    println!(
        "Model has {} hidden units",
        engine.parameters().hidden_units()
    );

    println!("Loading vitals from: {}", args.vitals_data);
    let data = load_screening_data(&args.vitals_data)?;
    println!("Loaded {} people for screening", data.vitals.len());

    let results = engine.infer_batch(&data.vitals);

    let mut counts: HashMap<RiskCategory, usize> = HashMap::new();
    for result in &results {
        *counts.entry(result.category).or_insert(0) += 1;
    }
    for category in [
        RiskCategory::Low,
        RiskCategory::Moderate,
        RiskCategory::High,
        RiskCategory::Error,
    ] {
        println!(
            "  {:<14} {}",
            category.to_string(),
            counts.get(&category).copied().unwrap_or(0)
        );
    }

    save_predictions(&args.output, &data, &results)?;
    println!("Predictions saved to: {}", args.output);
    Ok(())
}

fn run_import(json_dir: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Reading JSON weight files from: {}", json_dir.display());
    let params = NetworkParameters::load_json_dir(&json_dir)?;
    params.save(&output)?;
    println!(
        "Parameters ({} hidden units) saved to: {}",
        params.hidden_units(),
        output.display()
    );
    Ok(())
}

fn run_inspect(model: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let params = NetworkParameters::load(&model)?;
    let hidden = params.hidden_units();
    println!("Parameter file: {}", model.display());
    println!("  W     [{INPUT_FEATURES} x {hidden}]");
    println!("  b     [{hidden}]");
    println!("  Beta  [{hidden} x {OUTPUT_CLASSES}]");
    println!("Shapes are valid.");
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Predict(args)) => predict(args),
        Some(Commands::Infer(args)) => infer(args),
        Some(Commands::Import { json_dir, output }) => run_import(json_dir, output),
        Some(Commands::Inspect { model }) => run_inspect(model),
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
