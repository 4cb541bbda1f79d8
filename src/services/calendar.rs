//! Economic calendar feed.
//!
//! Live data comes from the provider's `/v1/economiccalendar` endpoint
//! (keyed via `X-Api-Key`); any transport, status, or decode failure is
//! logged and recovered by serving the fixed mock schedule, flagged so
//! the client can show a non-blocking warning instead of an error page.

use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::settings::Settings;
use crate::models::{EconomicEvent, Impact};
use crate::utils::errors::ApiError;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarSource {
    Live,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct CalendarFeed {
    pub events: Vec<EconomicEvent>,
    pub source: CalendarSource,
}

/// Raw provider row, mapped into [`EconomicEvent`] before anyone else
/// sees it.
#[derive(Debug, Deserialize)]
struct ProviderEvent {
    event_id: Option<String>,
    event: String,
    country: String,
    date: NaiveDate,
    time: Option<String>,
    impact: Option<String>,
    forecast: Option<String>,
    previous: Option<String>,
    actual: Option<String>,
}

impl From<ProviderEvent> for EconomicEvent {
    fn from(raw: ProviderEvent) -> Self {
        EconomicEvent {
            id: raw
                .event_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            title: raw.event,
            country: raw.country,
            date: raw.date,
            time: raw.time.unwrap_or_else(|| "All day".to_string()),
            impact: Impact::from_provider(raw.impact.as_deref().unwrap_or("")),
            forecast: raw.forecast,
            previous: raw.previous,
            actual: raw.actual,
        }
    }
}

async fn fetch_from_provider(
    client: &Client,
    settings: &Settings,
    start: NaiveDate,
    days: u32,
) -> Result<Vec<EconomicEvent>, ApiError> {
    let end = start + Duration::days(i64::from(days));
    let url = format!("{}/v1/economiccalendar", settings.calendar_base_url);

    let resp = client
        .get(&url)
        .query(&[
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ])
        .header("X-Api-Key", &settings.calendar_api_key)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(ApiError::Status(resp.status().as_u16()));
    }

    let raw: Vec<ProviderEvent> = resp.json().await?;
    Ok(raw.into_iter().map(EconomicEvent::from).collect())
}

/// Load the calendar window starting at `start`. Never fails: provider
/// errors degrade to the local mock schedule.
pub async fn load_calendar(
    client: &Client,
    settings: &Settings,
    start: NaiveDate,
    days: u32,
) -> CalendarFeed {
    match fetch_from_provider(client, settings, start, days).await {
        Ok(events) => CalendarFeed { events, source: CalendarSource::Live },
        Err(e) => {
            log::error!("economic calendar fetch failed: {e}");
            CalendarFeed {
                events: fallback_events(start),
                source: CalendarSource::Fallback,
            }
        }
    }
}

/// The fixed mock schedule served when the provider is unreachable,
/// dated relative to `today`.
pub fn fallback_events(today: NaiveDate) -> Vec<EconomicEvent> {
    let tomorrow = today + Duration::days(1);
    let day_after = today + Duration::days(2);

    let event = |id: &str,
                 title: &str,
                 country: &str,
                 date: NaiveDate,
                 time: &str,
                 impact: Impact,
                 forecast: Option<&str>,
                 previous: Option<&str>| EconomicEvent {
        id: id.into(),
        title: title.into(),
        country: country.into(),
        date,
        time: time.into(),
        impact,
        forecast: forecast.map(str::to_string),
        previous: previous.map(str::to_string),
        actual: None,
    };

    vec![
        event("1", "USD CPI Data", "US", today, "08:30 EST", Impact::High, Some("0.4%"), Some("0.3%")),
        event("2", "EUR Industrial Production", "EU", today, "10:00 EST", Impact::Medium, Some("0.8%"), Some("0.9%")),
        event("3", "BOE Interest Rate Decision", "UK", tomorrow, "07:00 EST", Impact::High, Some("5.00%"), Some("5.00%")),
        event("4", "USD Retail Sales", "US", tomorrow, "08:30 EST", Impact::Medium, Some("0.2%"), Some("0.8%")),
        event("5", "FOMC Member Speech", "US", tomorrow, "14:00 EST", Impact::Low, None, None),
        event("6", "JPY GDP (QoQ)", "JP", day_after, "19:50 EST", Impact::High, Some("0.1%"), Some("-0.1%")),
    ]
}
