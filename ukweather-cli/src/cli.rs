use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use ukweather_core::{
    Config, ForecastService, Granularity, MetOfficeClient, ResponseFormat, tools::tool_descriptors,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "ukweather", version, about = "UK Met Office forecasts")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the Met Office DataHub API key in the config file.
    Configure,

    /// Hourly forecast for the next 48 hours.
    Hourly(ForecastArgs),

    /// Forecast at 3-hour intervals for the next 7 days.
    ThreeHourly(ForecastArgs),

    /// Daily forecast for the next 7 days.
    Daily(ForecastArgs),

    /// Print tool descriptors (names, argument schemas, hints) as JSON.
    Tools,

    /// Invoke a forecast tool by name with JSON arguments, as a host would.
    Call {
        /// Tool name, e.g. "uk_weather_get_hourly_forecast".
        name: String,

        /// JSON object with `latitude`, `longitude` and optional `response_format`.
        arguments: String,
    },
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Latitude in decimal degrees, -90 to 90.
    #[arg(allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude in decimal degrees, -180 to 180.
    #[arg(allow_negative_numbers = true)]
    pub longitude: f64,

    /// Output format: markdown (or md) or json.
    #[arg(long, short, default_value_t = ResponseFormat::Markdown)]
    pub format: ResponseFormat,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Hourly(args) => forecast(Granularity::Hourly, args).await,
            Command::ThreeHourly(args) => forecast(Granularity::ThreeHourly, args).await,
            Command::Daily(args) => forecast(Granularity::Daily, args).await,
            Command::Tools => {
                let json = serde_json::to_string_pretty(&tool_descriptors())
                    .context("Failed to serialize tool descriptors")?;
                println!("{json}");
                Ok(())
            }
            Command::Call { name, arguments } => call(&name, &arguments).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Met Office DataHub API key:")
        .without_confirmation()
        .with_help_message("Create one at https://datahub.metoffice.gov.uk")
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(api_key.to_string());
    config.save()?;

    let path = Config::config_file_path()?;
    info!(path = %path.display(), "API key saved");
    println!("Saved API key to {}", path.display());
    Ok(())
}

fn service() -> anyhow::Result<ForecastService<MetOfficeClient>> {
    let config = Config::resolve()?;
    debug!(base_url = config.base_url(), timeout = ?config.timeout(), "configuration resolved");
    Ok(ForecastService::new(MetOfficeClient::new(&config)?))
}

async fn forecast(granularity: Granularity, args: ForecastArgs) -> anyhow::Result<()> {
    let output = service()?
        .run(granularity, args.latitude, args.longitude, args.format)
        .await;

    emit(output)
}

async fn call(name: &str, arguments: &str) -> anyhow::Result<()> {
    let arguments: serde_json::Value =
        serde_json::from_str(arguments).context("Tool arguments must be a JSON object")?;

    let output = service()?.call_tool(name, arguments).await?;
    emit(output)
}

/// Print the tool result; an `Error: ` result becomes the command's error.
fn emit(output: String) -> anyhow::Result<()> {
    if let Some(message) = output.strip_prefix("Error: ") {
        bail!("{message}");
    }

    println!("{output}");
    Ok(())
}
