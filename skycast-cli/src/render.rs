//! Plain-text rendering of a weather report.
//!
//! All numbers arrive pre-rounded from the core; this layer only formats.

use skycast_core::{ConditionIcon, DataSource, WeatherReport};

pub fn print_report(report: &WeatherReport) {
    let weather = &report.weather;

    if let Some(location) = &weather.location {
        println!("{location}  [{}]", weather.provider);
    } else {
        println!("[{}]", weather.provider);
    }

    let current = &weather.current;
    println!(
        "{} {}",
        icon_text(&current.condition.icon),
        current.condition.description
    );
    println!(
        "{}°C (feels like {}°C)",
        current.temp_c, current.feels_like_c
    );
    println!(
        "humidity {}%  wind {} km/h  UV {}",
        current.humidity_pct, current.wind_kph, current.uv_index
    );

    if !weather.forecast.is_empty() {
        println!();
    }
    for day in &weather.forecast {
        println!(
            "{}  {:>3}°/{:>3}°  day: {} {}  night: {} {}",
            day.date.format("%a %d %b"),
            day.max_temp_c,
            day.min_temp_c,
            icon_text(&day.day_condition.icon),
            day.day_condition.description,
            icon_text(&day.night_condition.icon),
            day.night_condition.description,
        );
    }

    if report.source == DataSource::Cache {
        println!();
        println!("(served from today's cache)");
    }
}

fn icon_text(icon: &ConditionIcon) -> &str {
    match icon {
        ConditionIcon::Glyph(glyph) => glyph,
        ConditionIcon::Image(url) => url,
    }
}
