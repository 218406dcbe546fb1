//! Render snapshot tests using RenderHarness
//!
//! FRAMEWORK PATTERN: RenderHarness
//! - Create harness with terminal dimensions
//! - Render component to test buffer
//! - Convert to string for snapshot testing

use skylook::{
    action::Action,
    components::{
        Component, SearchOverlay, SearchOverlayProps, WeatherDisplay, WeatherDisplayProps,
    },
    state::{AppState, CityOption, Place, TempUnit, WeatherReport},
};
use tui_dispatch::{DataResource, testing::*};

fn render_state(width: u16, height: u16, state: &AppState) -> String {
    let mut render = RenderHarness::new(width, height);
    let mut component = WeatherDisplay;
    render.render_to_string_plain(|frame| {
        let props = WeatherDisplayProps {
            state,
            is_focused: true,
        };
        component.render(frame, frame.area(), props);
    })
}

fn loaded(temperature: f64, weather_code: u8, status: &str) -> AppState {
    AppState {
        weather: DataResource::Loaded(WeatherReport {
            temperature,
            humidity: 48.0,
            rain_chance: 12.0,
            wind_speed: 9.7,
            weather_code,
            status: status.into(),
        }),
        ..Default::default()
    }
}

#[test]
fn test_render_loading_state() {
    let state = AppState::default();
    let output = render_state(60, 24, &state);

    assert!(output.contains("Loading"), "Should show loading text:\n{output}");
    assert!(output.contains("28.61"), "Should show coordinates:\n{output}");
}

#[test]
fn test_render_locating_state() {
    let state = AppState {
        locating: true,
        ..Default::default()
    };
    let output = render_state(60, 24, &state);

    assert!(
        output.contains("Finding your location"),
        "Should say the position is being looked up:\n{output}"
    );
}

#[test]
fn test_render_clear_weather() {
    let output = render_state(60, 24, &loaded(22.5, 0, "Clear Sky"));

    assert!(output.contains("Clear Sky"), "Should show status");
    assert!(
        output.contains("Humidity 48%   Rain 12%   Wind 9.7 kmph"),
        "Should show readings:\n{output}"
    );
}

#[test]
fn test_render_error_state() {
    let state = AppState {
        weather: DataResource::Failed("Network error".into()),
        ..Default::default()
    };
    let output = render_state(50, 20, &state);

    assert!(output.contains("Error"), "Should show error label");
    assert!(output.contains("Network error"), "Should show error message");
    assert!(output.contains("retry"), "Should show retry hint");
}

#[test]
fn test_render_not_found_state() {
    let state = AppState {
        weather: DataResource::Failed("City not found".into()),
        ..Default::default()
    };
    let output = render_state(50, 20, &state);

    assert!(output.contains("Not found"), "Should show not found label");
    assert!(output.contains("City not found"));
    assert!(output.contains("search again"), "Should point at search");
}

#[test]
fn test_render_fahrenheit() {
    let mut state = loaded(0.0, 0, "Clear Sky");
    let celsius = render_state(50, 20, &state);
    state.unit = TempUnit::Fahrenheit;
    let fahrenheit = render_state(50, 20, &state);

    // Temperature is FIGlet art, so only compare the two renders
    assert_ne!(celsius, fahrenheit);
    assert!(fahrenheit.contains("Clear Sky"));
}

#[test]
fn test_render_place_without_country_code() {
    let state = AppState::new(Place {
        name: "My Location".into(),
        country_code: String::new(),
        lat: 0.0,
        lon: 0.0,
    });
    let output = render_state(50, 20, &state);

    // No flag, just the coordinates
    assert!(output.contains("0.00°N, 0.00°E"), "output:\n{output}");
}

#[test]
fn test_render_help_bar() {
    let state = loaded(10.0, 3, "Overcast");
    let output = render_state(80, 24, &state);

    assert!(output.contains("refresh"), "Should show refresh hint");
    assert!(output.contains("search"), "Should show search hint");
    assert!(output.contains("units"), "Should show units hint");
    assert!(output.contains("quit"), "Should show quit hint");
    assert!(!output.contains("my location"), "Locate hint is hidden by default");
}

#[test]
fn test_render_help_bar_offers_locate() {
    let mut state = loaded(10.0, 3, "Overcast");
    state.locate_visible = true;
    let output = render_state(80, 24, &state);

    assert!(output.contains("my location"), "output:\n{output}");
}

#[test]
fn test_render_notice() {
    let mut state = loaded(31.0, 2, "Partly Cloudy");
    state.notice = Some("Location unavailable (timed out)".into());
    let output = render_state(80, 24, &state);

    assert!(output.contains("Location unavailable (timed out)"));
}

#[test]
fn test_render_unknown_code() {
    let output = render_state(60, 24, &loaded(5.0, 4, "Unknown"));
    assert!(output.contains("Unknown"));
}

#[test]
fn test_render_search_overlay_options() {
    let mut render = RenderHarness::new(80, 24);
    let mut overlay = SearchOverlay::new();
    overlay.set_open(true);

    let options = vec![
        CityOption {
            name: "London".into(),
            admin1: Some("England".into()),
            country_code: "GB".into(),
            lat: 51.5,
            lon: -0.12,
        },
        CityOption {
            name: "London".into(),
            admin1: Some("Ontario".into()),
            country_code: "CA".into(),
            lat: 42.98,
            lon: -81.23,
        },
    ];

    let output = render.render_to_string_plain(|frame| {
        let props = SearchOverlayProps {
            query: "Lon",
            options: &options,
            selected: 0,
            is_focused: true,
            error: None,
            on_query_change: Action::SearchQueryChange,
            on_query_submit: Action::SearchQuerySubmit,
            on_select: Action::SearchSelect,
        };
        overlay.render(frame, frame.area(), props);
    });

    assert!(output.contains("London, England"), "output:\n{output}");
    assert!(output.contains("London, Ontario"), "output:\n{output}");
    assert!(output.contains("GB"));
    assert!(output.contains("CA"));
}

#[test]
fn test_render_search_overlay_error() {
    let mut render = RenderHarness::new(80, 24);
    let mut overlay = SearchOverlay::new();
    overlay.set_open(true);

    let output = render.render_to_string_plain(|frame| {
        let props = SearchOverlayProps {
            query: "Lon",
            options: &[],
            selected: 0,
            is_focused: true,
            error: Some("connection refused"),
            on_query_change: Action::SearchQueryChange,
            on_query_submit: Action::SearchQuerySubmit,
            on_select: Action::SearchSelect,
        };
        overlay.render(frame, frame.area(), props);
    });

    assert!(output.contains("connection refused"), "output:\n{output}");
}
