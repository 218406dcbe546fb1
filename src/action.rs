//! Actions: user intents and async results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::backdrop::BackdropImage;
use crate::state::{CityOption, Place, WeatherReport};

/// Application actions with automatic category inference
#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== Weather category =====
    /// Intent: reload weather for the current place
    WeatherFetch,

    /// Intent: show weather for a new place
    WeatherLoad {
        place: Place,
        from_my_location: bool,
    },

    /// Result: forecast loaded
    WeatherDidLoad(WeatherReport),

    /// Result: forecast request failed
    WeatherDidError(String),

    // ===== Search category =====
    /// Focus the search bar
    SearchOpen,

    /// Leave the search bar and hide the options list
    SearchClose,

    /// Search bar text changed (debounced search)
    SearchQueryChange(String),

    /// Search right away (Enter / search icon)
    SearchQuerySubmit(String),

    /// Result: options found by the geocoding API
    SearchDidLoad(Vec<CityOption>),

    /// Result: geocoding API returned no result list
    SearchDidNotFind(String),

    /// Result: search request failed
    SearchDidError(String),

    /// Highlight an option (by index)
    SearchSelect(usize),

    /// Choose the highlighted option
    SearchConfirm,

    // ===== Locate category =====
    /// Intent: show weather for the user's own position
    LocateRequest,

    /// Result: position found and named
    LocateDidResolve(Place),

    /// Result: no position available
    LocateDidFail(String),

    // ===== Backdrop category =====
    /// Result: photo downloaded and decoded
    BackdropDidLoad(BackdropImage),

    /// Result: no photo for this place
    BackdropDidError(String),

    // ===== UI category =====
    /// Toggle between Celsius and Fahrenheit
    UiToggleUnits,

    /// Force a re-render (for cursor movement, etc.)
    Render,

    // ===== Uncategorized (global) =====
    /// Animation tick
    Tick,

    /// Exit the application
    Quit,
}
