//! Application state - single source of truth

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;

use crate::backdrop::BackdropImage;
use crate::condition;

/// A place weather can be loaded for
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Place {
    pub name: String,
    /// ISO 3166-1 alpha-2 code, empty when unknown
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

impl Place {
    /// Fallback used when the user's position cannot be determined.
    pub fn default_city() -> Self {
        Self {
            name: "New Delhi".into(),
            country_code: "IN".into(),
            lat: 28.61,
            lon: 77.20,
        }
    }

    /// Header text: `"Name, CC"`, or just the name without a country code.
    pub fn display_name(&self) -> String {
        if self.country_code.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country_code)
        }
    }

    pub fn flag(&self) -> Option<String> {
        condition::country_flag(&self.country_code)
    }
}

/// One entry of the autocomplete list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CityOption {
    pub name: String,
    pub admin1: Option<String>,
    pub country_code: String,
    pub lat: f64,
    pub lon: f64,
}

impl CityOption {
    /// `"Goa, Maharashtra"` style label; the country code is shown separately.
    pub fn label(&self) -> String {
        match &self.admin1 {
            Some(region) => format!("{}, {}", self.name, region),
            None => self.name.clone(),
        }
    }

    pub fn to_place(&self) -> Place {
        Place {
            name: self.name.clone(),
            country_code: self.country_code.clone(),
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Current conditions from the Open-Meteo forecast endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WeatherReport {
    /// Celsius
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// Today's maximum precipitation probability, percent
    pub rain_chance: f64,
    /// km/h
    pub wind_speed: f64,
    pub weather_code: u8,
    pub status: String,
}

/// Temperature unit preference
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TempUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TempUnit {
    pub fn toggle(&self) -> Self {
        match self {
            TempUnit::Celsius => TempUnit::Fahrenheit,
            TempUnit::Fahrenheit => TempUnit::Celsius,
        }
    }

    pub fn format(&self, celsius: f64) -> String {
        match self {
            TempUnit::Celsius => format!("{}°C", format_number(celsius)),
            TempUnit::Fahrenheit => {
                let fahrenheit = (celsius * 9.0 / 5.0 + 32.0) * 10.0;
                format!("{}°F", format_number(fahrenheit.round() / 10.0))
            }
        }
    }
}

/// Shortest decimal form: `22` for 22.0, `22.5` for 22.5.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // avoids "-0"
        return "0".into();
    }
    format!("{}", value)
}

/// A photo layer painted behind the weather panel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BackdropLayer {
    pub image: BackdropImage,
    /// Time since the layer was added
    pub age_ms: u64,
    /// Set once a newer layer arrives; the layer is dropped when it reaches zero
    pub expires_in_ms: Option<u64>,
}

impl BackdropLayer {
    pub fn new(image: BackdropImage) -> Self {
        Self {
            image,
            age_ms: 0,
            expires_in_ms: None,
        }
    }

    pub fn opacity(&self) -> f32 {
        crate::backdrop::fade_in_opacity(self.age_ms)
    }
}

/// Animation tick, shared by the header gradient and the backdrop fade.
pub const TICK_MS: u64 = 15;
pub const LOADING_ANIM_CYCLE_TICKS: u32 = 60;

/// Keystroke-triggered searches wait this long for typing to pause.
pub const SEARCH_DEBOUNCE_MS: u64 = 500;

/// Application state - everything the UI needs to render
#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    // --- Core data (visible in debug) ---
    /// Place the weather panel shows
    #[debug(section = "Location", label = "Place", debug_fmt)]
    pub place: Place,

    /// Whether `place` came from the user's own position
    #[debug(section = "Location", label = "Mine")]
    pub from_my_location: bool,

    /// Position lookup in progress
    #[debug(section = "Location", label = "Locating")]
    pub locating: bool,

    /// "My location" control is offered
    #[debug(section = "Location", label = "Locate offered")]
    pub locate_visible: bool,

    /// Loading / error / success panel
    #[debug(section = "Weather", label = "Data", debug_fmt)]
    pub weather: DataResource<WeatherReport>,

    /// Whether a refresh is in progress (keeps showing current data during fetch)
    #[debug(section = "Weather", label = "Refreshing")]
    pub is_refreshing: bool,

    #[debug(section = "Weather", label = "Unit", debug_fmt)]
    pub unit: TempUnit,

    /// Transient message, e.g. why the default city is shown
    #[debug(section = "Weather", label = "Notice", debug_fmt)]
    pub notice: Option<String>,

    // --- Animation internals (skipped) ---
    #[debug(skip)]
    pub tick_count: u32,

    /// Remaining ticks to finish the current animation cycle after loading
    #[debug(skip)]
    pub loading_anim_ticks_remaining: u32,

    // --- Background photos ---
    /// Oldest first
    #[debug(skip)]
    pub backdrops: Vec<BackdropLayer>,

    /// Place name the current backdrop was searched for
    #[debug(section = "Backdrop", label = "Query", debug_fmt)]
    pub backdrop_query: Option<String>,

    // --- Search ---
    /// Whether the search overlay has focus
    #[debug(skip)]
    pub search_mode: bool,

    /// Search bar text
    #[debug(skip)]
    pub search_query: String,

    #[debug(skip)]
    pub search_results: Vec<CityOption>,

    /// Options list shown under the search bar
    #[debug(skip)]
    pub options_visible: bool,

    #[debug(skip)]
    pub search_error: Option<String>,

    #[debug(skip)]
    pub search_selected: usize,
}

impl AppState {
    /// Create state showing `place`; the panel starts in the loading state.
    pub fn new(place: Place) -> Self {
        Self {
            place,
            from_my_location: false,
            locating: false,
            locate_visible: false,
            weather: DataResource::Loading,
            is_refreshing: false,
            unit: TempUnit::default(),
            notice: None,
            tick_count: 0,
            loading_anim_ticks_remaining: 0,
            backdrops: Vec::new(),
            backdrop_query: None,
            search_mode: false,
            search_query: String::new(),
            search_results: Vec::new(),
            options_visible: false,
            search_error: None,
            search_selected: 0,
        }
    }

    pub fn current_place(&self) -> &Place {
        &self.place
    }

    pub fn loading_anim_active(&self) -> bool {
        self.weather.is_loading() || self.is_refreshing || self.loading_anim_ticks_remaining > 0
    }

    /// Any layer still fading in or waiting to be removed
    pub fn backdrop_transition_active(&self) -> bool {
        self.backdrops
            .iter()
            .any(|layer| layer.opacity() < 1.0 || layer.expires_in_ms.is_some())
    }

    /// Options the list should currently display
    pub fn visible_options(&self) -> &[CityOption] {
        if self.options_visible {
            &self.search_results
        } else {
            &[]
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Place::default_city())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_matches_page_output() {
        assert_eq!(format_number(22.0), "22");
        assert_eq!(format_number(22.5), "22.5");
        assert_eq!(format_number(-3.2), "-3.2");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_temp_unit_format() {
        assert_eq!(TempUnit::Celsius.format(22.5), "22.5°C");
        assert_eq!(TempUnit::Fahrenheit.format(0.0), "32°F");
        assert_eq!(TempUnit::Fahrenheit.format(22.5), "72.5°F");
        assert_eq!(TempUnit::Fahrenheit.format(21.3), "70.3°F");
    }

    #[test]
    fn test_display_name_without_country() {
        let place = Place {
            name: "My Location".into(),
            country_code: String::new(),
            lat: 0.0,
            lon: 0.0,
        };
        assert_eq!(place.display_name(), "My Location");
        assert_eq!(Place::default_city().display_name(), "New Delhi, IN");
    }

    #[test]
    fn test_option_label() {
        let mut option = CityOption {
            name: "Goa".into(),
            admin1: Some("Maharashtra".into()),
            country_code: "IN".into(),
            lat: 15.0,
            lon: 74.0,
        };
        assert_eq!(option.label(), "Goa, Maharashtra");
        option.admin1 = None;
        assert_eq!(option.label(), "Goa");
    }
}
