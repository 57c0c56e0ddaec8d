//! Markdown and JSON rendering of forecast documents.
//!
//! Both formats are bounded by [`CHARACTER_LIMIT`]. Output is a pure function of
//! the document, granularity and format; nothing here reads the clock.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    document::{ForecastDocument, Parameter, ParameterValue, TimeStep},
    model::{Granularity, ResponseFormat},
    weather_code,
};

/// Maximum size of any rendered result, in characters.
pub const CHARACTER_LIMIT: usize = 25_000;

/// Appended to Markdown cut at [`CHARACTER_LIMIT`].
pub const MARKDOWN_TRUNCATION_NOTICE: &str = "\n\n---\n\n**Response truncated** \
(exceeded 25000 character limit). Request the daily forecast for a shorter series, \
or use JSON format for machine-readable data.";

/// Top-level `truncation` object added to JSON output that lost time steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationMarker {
    pub truncated: bool,
    pub returned_steps: usize,
    pub total_steps: usize,
    pub character_limit: usize,
}

#[derive(Serialize)]
struct TruncatedDocument<'a> {
    #[serde(flatten)]
    document: &'a ForecastDocument,
    truncation: TruncationMarker,
}

#[derive(Serialize)]
struct BareMarker {
    truncation: TruncationMarker,
}

pub fn render(
    document: &ForecastDocument,
    granularity: Granularity,
    format: ResponseFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ResponseFormat::Markdown => Ok(render_markdown(document, granularity)),
        ResponseFormat::Json => render_json(document),
    }
}

pub fn render_markdown(document: &ForecastDocument, granularity: Granularity) -> String {
    let Some(feature) = document.first_feature() else {
        return "No weather data available.".to_string();
    };

    let time_series = &feature.properties.time_series;
    if time_series.is_empty() {
        return "No forecast data available.".to_string();
    }

    let mut lines = vec![format!("# Weather Forecast ({})", granularity.label())];

    let position = match (feature.latitude(), feature.longitude()) {
        (Some(lat), Some(lon)) => Some(format_position(lat, lon)),
        _ => None,
    };
    match (feature.location_name(), position) {
        (Some(name), Some(position)) => lines.push(format!("**Location:** {name} ({position})")),
        (Some(name), None) => lines.push(format!("**Location:** {name}")),
        (None, Some(position)) => lines.push(format!("**Location:** {position}")),
        (None, None) => {}
    }
    if let Some(run) = feature.model_run_date() {
        lines.push(format!("**Model run:** {run}"));
    }
    lines.push(format!("**Forecast periods:** {}", time_series.len()));
    lines.push(String::new());

    let shown = granularity
        .markdown_step_limit()
        .map_or(time_series.len(), |limit| limit.min(time_series.len()));

    for step in &time_series[..shown] {
        render_step(&mut lines, step, granularity);
    }

    if shown < time_series.len() {
        lines.push(format!(
            "*Showing first {shown} of {} forecast periods. Use JSON format for complete data.*",
            time_series.len()
        ));
    }

    cap_markdown(lines.join("\n"))
}

fn render_step(lines: &mut Vec<String>, step: &TimeStep, granularity: Granularity) {
    lines.push(format!(
        "## {}",
        step.time.instant().to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    for (parameter, value) in step.parameters(granularity).iter() {
        let rendered = match value {
            Some(value) => format_value(parameter, value),
            None => "n/a".to_string(),
        };
        lines.push(format!("- **{}:** {rendered}", parameter.label()));
    }

    lines.push(String::new());
}

fn format_value(parameter: Parameter, value: ParameterValue) -> String {
    if parameter == Parameter::WeatherCode {
        return match value.as_code() {
            Some(code) => format!("{} (code {code})", weather_code::describe(code)),
            None => value.to_string(),
        };
    }

    match parameter.unit() {
        "" => value.to_string(),
        unit => format!("{value} {unit}"),
    }
}

fn format_position(lat: f64, lon: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lon < 0.0 { 'W' } else { 'E' };
    format!("{:.4}°{ns}, {:.4}°{ew}", lat.abs(), lon.abs())
}

/// Cut at a line boundary so that content plus notice fits the limit.
fn cap_markdown(content: String) -> String {
    if content.chars().count() <= CHARACTER_LIMIT {
        return content;
    }

    let budget = CHARACTER_LIMIT - MARKDOWN_TRUNCATION_NOTICE.chars().count();
    let cut = content
        .char_indices()
        .nth(budget)
        .map_or(content.len(), |(idx, _)| idx);

    let mut kept = &content[..cut];
    if let Some(newline) = kept.rfind('\n') {
        kept = &kept[..newline];
    }

    format!("{kept}{MARKDOWN_TRUNCATION_NOTICE}")
}

/// Full document, pretty-printed. Over the limit, keeps the longest prefix of
/// every time series that fits and adds a [`TruncationMarker`].
pub fn render_json(document: &ForecastDocument) -> Result<String, serde_json::Error> {
    let full = serde_json::to_string_pretty(document)?;
    if full.chars().count() <= CHARACTER_LIMIT {
        return Ok(full);
    }

    let longest = document
        .features
        .iter()
        .map(|feature| feature.properties.time_series.len())
        .max()
        .unwrap_or(0);

    // Size grows with the number of kept steps, so search for the largest fit.
    let mut best = None;
    let (mut lo, mut hi) = (0, longest);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = truncated_json(document, mid)?;
        if candidate.chars().count() <= CHARACTER_LIMIT {
            best = Some(candidate);
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    match best {
        Some(json) => Ok(json),
        None => serde_json::to_string_pretty(&BareMarker {
            truncation: TruncationMarker {
                truncated: true,
                returned_steps: 0,
                total_steps: document.total_steps(),
                character_limit: CHARACTER_LIMIT,
            },
        }),
    }
}

fn truncated_json(document: &ForecastDocument, steps: usize) -> Result<String, serde_json::Error> {
    let kept = document.truncated(steps);
    let wrapper = TruncatedDocument {
        document: &kept,
        truncation: TruncationMarker {
            truncated: true,
            returned_steps: kept.total_steps(),
            total_steps: document.total_steps(),
            character_limit: CHARACTER_LIMIT,
        },
    };
    serde_json::to_string_pretty(&wrapper)
}
