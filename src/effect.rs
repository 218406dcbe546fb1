//! Effects - side effects declared by the reducer

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch current conditions for the given coordinates
    FetchWeather { lat: f64, lon: f64 },
    /// Debounced city search; an empty query cancels the pending one
    SearchCities { query: String },
    /// City search without waiting for typing to pause
    SearchCitiesNow { query: String },
    /// Drop any pending city search
    CancelSearch,
    /// Determine the user's position and name it
    LocateUser,
    /// Search a landmark photo for the place name
    FetchBackdrop { query: String },
}
