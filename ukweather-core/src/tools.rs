//! Descriptors for registering the forecast operations with a tool-calling host.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::model::{Coordinate, Granularity, ResponseFormat};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
    pub destructive_hint: bool,
    pub idempotent_hint: bool,
    pub open_world_hint: bool,
}

impl ToolAnnotations {
    /// Read-only, idempotent lookups against an external service.
    pub const FORECAST: ToolAnnotations = ToolAnnotations {
        read_only_hint: true,
        destructive_hint: false,
        idempotent_hint: true,
        open_world_hint: true,
    };
}

/// Arguments of a forecast tool call.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForecastArgs {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl Granularity {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Granularity::Hourly => "uk_weather_get_hourly_forecast",
            Granularity::ThreeHourly => "uk_weather_get_three_hourly_forecast",
            Granularity::Daily => "uk_weather_get_daily_forecast",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Granularity> {
        Granularity::all()
            .iter()
            .copied()
            .find(|granularity| granularity.tool_name() == name)
    }
}

pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    Granularity::all().iter().map(|g| descriptor(*g)).collect()
}

fn descriptor(granularity: Granularity) -> ToolDescriptor {
    let (title, description) = match granularity {
        Granularity::Hourly => (
            "Get Hourly Weather Forecast",
            "Hourly Met Office forecast for up to 48 hours ahead at any global location. \
             Markdown shows the first 20 hours; JSON returns the complete GeoJSON document.",
        ),
        Granularity::ThreeHourly => (
            "Get 3-Hourly Weather Forecast",
            "Met Office forecast at 3-hour intervals for up to 7 days ahead. \
             Markdown shows the first 20 periods; JSON returns the complete GeoJSON document.",
        ),
        Granularity::Daily => (
            "Get Daily Weather Forecast",
            "Daily Met Office forecast summary for up to 7 days ahead. \
             Markdown shows every day; JSON returns the complete GeoJSON document.",
        ),
    };

    ToolDescriptor {
        name: granularity.tool_name(),
        title,
        description,
        input_schema: input_schema(),
        annotations: ToolAnnotations::FORECAST,
    }
}

fn input_schema() -> Value {
    let (lat_min, lat_max) = Coordinate::LATITUDE_RANGE;
    let (lon_min, lon_max) = Coordinate::LONGITUDE_RANGE;

    json!({
        "type": "object",
        "properties": {
            "latitude": {
                "type": "number",
                "minimum": lat_min,
                "maximum": lat_max,
                "description": "Latitude in decimal degrees (e.g., 51.5074 for London)"
            },
            "longitude": {
                "type": "number",
                "minimum": lon_min,
                "maximum": lon_max,
                "description": "Longitude in decimal degrees (e.g., -0.1278 for London)"
            },
            "response_format": {
                "type": "string",
                "enum": [ResponseFormat::Markdown.as_str(), ResponseFormat::Json.as_str()],
                "default": ResponseFormat::default().as_str(),
                "description": "'markdown' for human-readable or 'json' for machine-readable output"
            }
        },
        "required": ["latitude", "longitude"],
        "additionalProperties": false
    })
}
