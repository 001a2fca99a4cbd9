// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Render model for the browser client.
//!
//! `public/app.js` renders the same fields the same way; these types are the
//! reference for what the client shows for a weather or news payload.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Shown when a news payload has no usable articles.
pub const NO_NEWS: &str = "No news articles found.";

/// Display errors
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Weather payload has no conditions")]
    NoConditions,

    #[error("Malformed weather payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Temperature unit selected by the toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn toggle(self) -> Self {
        match self {
            TemperatureUnit::Celsius => TemperatureUnit::Fahrenheit,
            TemperatureUnit::Fahrenheit => TemperatureUnit::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Whole degrees in this unit for a Celsius reading.
    pub fn degrees(self, celsius: f64) -> i64 {
        let value = match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => to_fahrenheit(celsius),
        };
        value.round() as i64
    }

    /// e.g. `21°C`
    pub fn format(self, celsius: f64) -> String {
        format!("{}{}", self.degrees(celsius), self.symbol())
    }
}

pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

// ─── Weather ─────────────────────────────────────────────────

/// The part of an OpenWeatherMap "current weather" response the client uses.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherPayload {
    pub name: String,
    pub sys: WeatherSys,
    pub weather: Vec<WeatherCondition>,
    pub main: WeatherMain,
    pub wind: WeatherWind,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub clouds: Option<WeatherClouds>,
    #[serde(default)]
    pub rain: Option<WeatherRain>,
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSys {
    #[serde(default)]
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherClouds {
    #[serde(default)]
    pub all: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRain {
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    pub three_hours: Option<f64>,
}

impl WeatherPayload {
    pub fn from_json(value: &Value) -> Result<Self, DisplayError> {
        Ok(Self::deserialize(value)?)
    }
}

/// Display strings for the weather card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct WeatherView {
    pub location: String,
    pub icon_url: String,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub min_max: String,
    pub wind: String,
    pub humidity: String,
    pub pressure: String,
    pub visibility: String,
    pub clouds: String,
    pub rain: String,
    /// City local time, `HH:MM`
    pub sunrise: String,
    pub sunset: String,
}

impl WeatherView {
    pub fn render(payload: &WeatherPayload, unit: TemperatureUnit) -> Result<Self, DisplayError> {
        let condition = payload.weather.first().ok_or(DisplayError::NoConditions)?;
        let main = &payload.main;

        let location = match payload.sys.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {}", payload.name, country),
            _ => payload.name.clone(),
        };

        let rain = payload.rain.as_ref();
        let rain = match (
            rain.and_then(|r| r.one_hour).filter(|v| *v > 0.0),
            rain.and_then(|r| r.three_hours).filter(|v| *v > 0.0),
        ) {
            (Some(mm), _) => format!("{} mm (1h)", mm),
            (None, Some(mm)) => format!("{} mm (3h)", mm),
            (None, None) => "No rain".to_string(),
        };

        Ok(Self {
            location,
            icon_url: format!("https://openweathermap.org/img/wn/{}@2x.png", condition.icon),
            description: condition.description.clone(),
            temperature: unit.format(main.temp),
            feels_like: unit.format(main.feels_like),
            min_max: format!(
                "{}° / {}",
                unit.degrees(main.temp_min),
                unit.format(main.temp_max)
            ),
            wind: format!("{} m/s", payload.wind.speed),
            humidity: format!("{}%", main.humidity),
            pressure: format!("{} hPa", main.pressure),
            visibility: format!("{:.1} km", payload.visibility.unwrap_or(0.0) / 1000.0),
            // f64 Display drops a trailing `.0`, matching the browser
            clouds: format!("{}%", payload.clouds.as_ref().map(|c| c.all).unwrap_or(0.0)),
            rain,
            sunrise: city_time(payload.sys.sunrise, payload.timezone),
            sunset: city_time(payload.sys.sunset, payload.timezone),
        })
    }
}

fn city_time(unix_secs: i64, offset_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs.saturating_add(offset_secs), 0)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Weather card state: last payload plus the selected unit.
///
/// Toggling the unit re-renders the stored payload; nothing is re-fetched.
#[derive(Debug, Clone, Default)]
pub struct WeatherDisplay {
    unit: TemperatureUnit,
    last: Option<WeatherPayload>,
}

impl WeatherDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Store a freshly fetched payload and render it.
    pub fn show(&mut self, payload: WeatherPayload) -> Result<WeatherView, DisplayError> {
        let view = WeatherView::render(&payload, self.unit)?;
        self.last = Some(payload);
        Ok(view)
    }

    /// Flip the unit. Returns the re-rendered card if a payload was shown.
    pub fn toggle_unit(&mut self) -> Option<Result<WeatherView, DisplayError>> {
        self.unit = self.unit.toggle();
        self.last
            .as_ref()
            .map(|payload| WeatherView::render(payload, self.unit))
    }
}

// ─── News ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

/// One rendered news card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct NewsCard {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    /// Publication date, `YYYY-MM-DD` when parseable
    pub published: String,
    pub source: String,
}

impl NewsCard {
    /// Cards for every usable article in a NewsAPI payload.
    ///
    /// Articles without a title or description are skipped, as is anything
    /// that is not an object.
    pub fn collect(payload: &Value) -> Vec<NewsCard> {
        let Some(articles) = payload.get("articles").and_then(Value::as_array) else {
            return Vec::new();
        };

        articles
            .iter()
            .filter_map(|raw| Article::deserialize(raw).ok())
            .filter_map(NewsCard::from_article)
            .collect()
    }

    fn from_article(article: Article) -> Option<NewsCard> {
        let title = article.title.filter(|t| !t.trim().is_empty())?;
        let description = article.description.filter(|d| !d.trim().is_empty())?;

        let published = article
            .published_at
            .map(|p| match DateTime::parse_from_rfc3339(&p) {
                Ok(t) => t.format("%Y-%m-%d").to_string(),
                Err(_) => p,
            })
            .unwrap_or_default();

        Some(NewsCard {
            title,
            description,
            url: article.url.unwrap_or_default(),
            image: article.url_to_image.filter(|u| !u.is_empty()),
            published,
            source: article.source.and_then(|s| s.name).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn london() -> Value {
        json!({
            "name": "London",
            "sys": { "country": "GB", "sunrise": 1_700_000_000, "sunset": 1_700_030_000 },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "main": {
                "temp": 11.6, "feels_like": 10.2, "temp_min": 9.4,
                "temp_max": 13.1, "humidity": 81, "pressure": 1012
            },
            "wind": { "speed": 4.1 },
            "visibility": 10000,
            "clouds": { "all": 75 },
            "rain": { "1h": 0.3 },
            "timezone": 3600
        })
    }

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(to_fahrenheit(0.0), 32.0);
        assert_eq!(to_fahrenheit(100.0), 212.0);
        assert_eq!(TemperatureUnit::Fahrenheit.format(-40.0), "-40°F");
        assert_eq!(TemperatureUnit::Celsius.format(11.6), "12°C");
    }

    #[test]
    fn test_render_weather() {
        let payload = WeatherPayload::from_json(&london()).unwrap();
        let view = WeatherView::render(&payload, TemperatureUnit::Celsius).unwrap();

        assert_eq!(view.location, "London, GB");
        assert_eq!(view.icon_url, "https://openweathermap.org/img/wn/10d@2x.png");
        assert_eq!(view.temperature, "12°C");
        assert_eq!(view.feels_like, "10°C");
        assert_eq!(view.min_max, "9° / 13°C");
        assert_eq!(view.wind, "4.1 m/s");
        assert_eq!(view.humidity, "81%");
        assert_eq!(view.pressure, "1012 hPa");
        assert_eq!(view.visibility, "10.0 km");
        assert_eq!(view.clouds, "75%");
        assert_eq!(view.rain, "0.3 mm (1h)");
        // 1_700_000_000 is 22:13:20 UTC; the city is UTC+1
        assert_eq!(view.sunrise, "23:13");
    }

    #[test]
    fn test_render_fahrenheit() {
        let payload = WeatherPayload::from_json(&london()).unwrap();
        let view = WeatherView::render(&payload, TemperatureUnit::Fahrenheit).unwrap();
        assert_eq!(view.temperature, "53°F");
        assert_eq!(view.min_max, "49° / 56°F");
    }

    #[test]
    fn test_unit_toggle_round_trip() {
        let mut display = WeatherDisplay::new();
        assert!(display.toggle_unit().is_none());
        assert_eq!(display.unit(), TemperatureUnit::Fahrenheit);
        display.toggle_unit();

        let payload = WeatherPayload::from_json(&london()).unwrap();
        let celsius = display.show(payload).unwrap();

        let fahrenheit = display.toggle_unit().unwrap().unwrap();
        assert_ne!(fahrenheit, celsius);
        let back = display.toggle_unit().unwrap().unwrap();
        assert_eq!(back, celsius);
    }

    #[test]
    fn test_missing_optional_weather_fields() {
        let mut raw = london();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("rain");
        obj.remove("clouds");
        obj.remove("visibility");

        let payload = WeatherPayload::from_json(&raw).unwrap();
        let view = WeatherView::render(&payload, TemperatureUnit::Celsius).unwrap();
        assert_eq!(view.rain, "No rain");
        assert_eq!(view.clouds, "0%");
        assert_eq!(view.visibility, "0.0 km");
    }

    #[test]
    fn test_weather_without_conditions_is_an_error() {
        let mut raw = london();
        raw["weather"] = json!([]);
        let payload = WeatherPayload::from_json(&raw).unwrap();
        assert!(matches!(
            WeatherView::render(&payload, TemperatureUnit::Celsius),
            Err(DisplayError::NoConditions)
        ));

        assert!(WeatherPayload::from_json(&json!({"cod": "404"})).is_err());
    }

    #[test]
    fn test_news_cards_skip_malformed_articles() {
        let payload = json!({
            "status": "ok",
            "articles": [
                {
                    "title": "Rust 2.0 announced",
                    "description": "Not really.",
                    "url": "https://example.com/a",
                    "urlToImage": "https://example.com/a.png",
                    "publishedAt": "2026-03-01T10:00:00Z",
                    "source": { "name": "Example" }
                },
                { "title": "No description", "url": "https://example.com/b" },
                { "title": null, "description": "No title" },
                { "title": "", "description": "Empty title" },
                "not an object",
                { "title": "Minimal", "description": "Only the basics" }
            ]
        });

        let cards = NewsCard::collect(&payload);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].published, "2026-03-01");
        assert_eq!(cards[0].source, "Example");
        assert_eq!(cards[1].title, "Minimal");
        assert_eq!(cards[1].image, None);
        assert_eq!(cards[1].url, "");
    }

    #[test]
    fn test_news_without_articles() {
        assert!(NewsCard::collect(&json!({"status": "ok", "articles": []})).is_empty());
        assert!(NewsCard::collect(&json!({"status": "error"})).is_empty());
    }
}
