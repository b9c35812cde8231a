//! Vehicle Risk Classifier - terminal front end
//!
//! Collects driver age and vehicle category, runs one of the three trained
//! classifiers, and renders the risk label.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use vehicle_risk_classifier::{
    assets::check_logo,
    config::{AppConfig, LoggingConfig},
    metrics::SessionMetrics,
    types::input::{Age, VehicleCategory, MAX_AGE, MIN_AGE},
    types::prediction::Prediction,
    AlignedFeatureRow, AppContext, ModelKind, RawInput, RiskError, RiskLabel,
};

#[derive(Parser)]
#[command(name = "risk-classifier")]
#[command(author, version, about = "Vehicle insurance risk classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in the form interactively (default)
    Form,

    /// Predict once from command-line values
    Predict {
        /// Driver age (18-100)
        #[arg(short, long)]
        age: i64,

        /// Vehicle category: combi, family, sport or minivan
        #[arg(short, long)]
        vehicle: String,

        /// Model: Nn, Knn or Dt
        #[arg(short, long, default_value = "Nn")]
        model: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the training schema of the loaded artifact
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;
    info!("Starting risk classifier");

    let context = match AppContext::load(&config) {
        Ok(context) => context,
        Err(e) => {
            error!(error = %e, "Artifact load failed");
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!(
                "Make sure '{}' and the model files are present in '{}'.",
                config.artifact.manifest, config.artifact.dir
            );
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Form) {
        Commands::Form => run_form(&context, &config),
        Commands::Predict {
            age,
            vehicle,
            model,
            json,
        } => predict_once(&context, age, &vehicle, &model, json),
        Commands::Schema => {
            print_schema(&context);
            Ok(())
        }
    }
}

/// Initialize tracing on stderr so logs never mix with the form
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

fn predict_once(context: &AppContext, age: i64, vehicle: &str, model: &str, json: bool) -> Result<()> {
    let parsed = RawInput::parse(age, vehicle)
        .and_then(|input| model.parse::<ModelKind>().map(|model| (input, model)));
    let (input, model) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    };

    if json {
        match context.evaluate(&input, model) {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(2);
            }
        }
    }

    let result = predict_and_render(context, &input, model);
    render_inputs(&input);

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(2);
    }
    Ok(())
}

fn run_form(context: &AppContext, config: &AppConfig) -> Result<()> {
    let theme = ColorfulTheme::default();
    let metrics = SessionMetrics::new();

    println!("{}", "Predicción de Riesgo".cyan().bold());
    if let Some(notice) = check_logo(&config.assets.logo_path).notice() {
        println!("{}", notice.blue());
    }
    println!("{}", "Clasificador".yellow().bold());
    println!();

    let categories: Vec<&str> = VehicleCategory::ALL.iter().map(|c| c.as_str()).collect();
    let models: Vec<String> = ModelKind::ALL.iter().map(|m| m.menu_label()).collect();
    let default_model = ModelKind::ALL
        .iter()
        .position(|m| *m == config.form.default_model)
        .unwrap_or(0);
    let mut default_age = Age::new(config.form.default_age as i64).unwrap_or_default();

    loop {
        let age: i64 = Input::with_theme(&theme)
            .with_prompt(format!("Seleccione la edad ({}-{})", MIN_AGE, MAX_AGE))
            .default(default_age.years() as i64)
            .validate_with(|v: &i64| Age::new(*v).map(|_| ()).map_err(|e| e.to_string()))
            .interact_text()?;

        let category = Select::with_theme(&theme)
            .with_prompt("Seleccione el tipo de vehiculo")
            .items(&categories)
            .default(0)
            .interact()?;

        let model = Select::with_theme(&theme)
            .with_prompt("Modelo")
            .items(&models)
            .default(default_model)
            .interact()?;
        let model = ModelKind::ALL[model];
        println!("Modelo Seleccionado: {}", model.as_str().bold());

        let input = RawInput::new(Age::new(age)?, VehicleCategory::ALL[category]);
        default_age = input.age;

        println!();
        let started = Instant::now();
        match predict_and_render(context, &input, model) {
            Ok(prediction) => {
                metrics.record_prediction(model, prediction.label, started.elapsed());
            }
            Err(e) => {
                metrics.record_failure();
                report_error(&e);
            }
        }
        render_inputs(&input);
        println!();

        let next = Select::with_theme(&theme)
            .with_prompt("¿Qué desea hacer?")
            .items(&["Realizar otra predicción", "Salir"])
            .default(0)
            .interact()?;
        if next == 1 {
            break;
        }
        println!();
    }

    metrics.print_summary();
    Ok(())
}

/// Show the aligned row, then predict on it.
///
/// The row is rendered before the classifier runs so it stays visible when
/// inference fails.
fn predict_and_render(context: &AppContext, input: &RawInput, model: ModelKind) -> Result<Prediction, RiskError> {
    let row = context.prepare(input)?;
    render_row(&row);

    let prediction = context.predict(&row, model)?;
    render_prediction(&prediction);
    Ok(prediction)
}

fn report_error(e: &RiskError) {
    if e.is_recoverable() {
        warn!(error = %e, "Prediction aborted");
    } else {
        error!(error = %e, "Prediction aborted");
    }
    println!("{} {}", "Ocurrió un error durante la predicción:".red(), e);
    println!();
}

fn render_row(row: &AlignedFeatureRow) {
    println!("{}", "Datos preprocesados para la predicción:".yellow().bold());
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|c| format!("{:>width$}", c.name, width = c.name.len().max(6)))
        .collect();
    let values: Vec<String> = row
        .columns()
        .iter()
        .map(|c| format!("{:>width$}", c.value, width = c.name.len().max(6)))
        .collect();
    println!("  {}", names.join("  ").dimmed());
    println!("  {}", values.join("  "));
    println!();
}

fn render_prediction(prediction: &Prediction) {
    println!("{}", "La predicción es:".yellow().bold());
    let label = match prediction.label {
        RiskLabel::HighRisk => prediction.label.display_name().red().bold(),
        RiskLabel::LowRisk => prediction.label.display_name().green().bold(),
    };
    match &prediction.encoded_class {
        Some(class) => println!("  {} (model {}, class '{}')", label, prediction.model, class),
        None => println!("  {} (model {})", label, prediction.model),
    }
    println!();
}

fn render_inputs(input: &RawInput) {
    println!("{}", "Valores seleccionados:".yellow().bold());
    println!("  Edad: {}", input.age);
    println!("  Tipo de Vehículo: {}", input.vehicle_category);
}

fn print_schema(context: &AppContext) {
    println!("{}", "Training schema:".yellow().bold());
    for (idx, column) in context.schema().columns().iter().enumerate() {
        println!("  {:>2}. {}", idx + 1, column);
    }
    let classes = &context.encoder().classes;
    if !classes.is_empty() {
        println!("{} {}", "Label classes:".yellow().bold(), classes.join(", "));
    }
}
