//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::backdrop;
use crate::effect::Effect;
use crate::state::{AppState, Place, LOADING_ANIM_CYCLE_TICKS, TICK_MS};

pub const NOT_FOUND_MESSAGE: &str = "City not found";

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== Weather actions =====
        Action::WeatherFetch => {
            if state.weather.is_loaded() {
                state.is_refreshing = true;
            } else {
                state.weather = DataResource::Loading;
            }
            reset_loading_anim(state);
            let place = state.current_place();
            DispatchResult::changed_with(Effect::FetchWeather {
                lat: place.lat,
                lon: place.lon,
            })
        }

        Action::WeatherLoad {
            place,
            from_my_location,
        } => DispatchResult::changed_with(begin_load(state, place, from_my_location)),

        Action::WeatherDidLoad(report) => {
            let was_refresh = state.is_refreshing;
            state.weather = DataResource::Loaded(report);
            finish_load(state);

            // A refresh keeps the photo it already has
            let query = state.place.name.clone();
            if was_refresh && state.backdrop_query.as_deref() == Some(query.as_str()) {
                return DispatchResult::changed();
            }
            state.backdrop_query = Some(query.clone());
            DispatchResult::changed_with(Effect::FetchBackdrop { query })
        }

        Action::WeatherDidError(msg) => {
            state.weather = DataResource::Failed(msg);
            finish_load(state);
            DispatchResult::changed()
        }

        // ===== Search actions =====
        Action::SearchOpen => {
            state.search_mode = true;
            state.options_visible = false;
            state.search_error = None;
            state.search_selected = 0;
            DispatchResult::changed()
        }

        Action::SearchClose => {
            state.search_mode = false;
            state.options_visible = false;
            state.search_error = None;
            state.search_selected = 0;
            DispatchResult::changed_with(Effect::CancelSearch)
        }

        Action::SearchQueryChange(text) => {
            let query = text.trim().to_string();
            state.search_query = text;
            state.search_selected = 0;
            state.search_error = None;
            if query.is_empty() {
                state.options_visible = false;
            }
            DispatchResult::changed_with(Effect::SearchCities { query })
        }

        Action::SearchQuerySubmit(text) => {
            let query = text.trim().to_string();
            if query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.search_query = text;
            state.search_selected = 0;
            state.search_error = None;
            DispatchResult::changed_with(Effect::SearchCitiesNow { query })
        }

        // Results that arrive after the overlay closed are stale
        Action::SearchDidLoad(_) | Action::SearchDidNotFind(_) | Action::SearchDidError(_)
            if !state.search_mode =>
        {
            DispatchResult::unchanged()
        }

        Action::SearchDidLoad(results) => {
            state.search_results = results;
            state.options_visible = true;
            state.search_error = None;
            state.search_selected = 0;
            DispatchResult::changed()
        }

        Action::SearchDidNotFind(_query) => {
            state.search_results.clear();
            state.options_visible = false;
            state.search_selected = 0;
            state.weather = DataResource::Failed(NOT_FOUND_MESSAGE.to_string());
            state.is_refreshing = false;
            DispatchResult::changed()
        }

        Action::SearchDidError(msg) => {
            state.search_error = Some(msg);
            DispatchResult::changed()
        }

        Action::SearchSelect(index) => {
            if state.options_visible
                && index < state.search_results.len()
                && index != state.search_selected
            {
                state.search_selected = index;
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::SearchConfirm => {
            if !state.options_visible {
                return DispatchResult::unchanged();
            }
            let Some(option) = state.search_results.get(state.search_selected).cloned() else {
                return DispatchResult::unchanged();
            };

            state.search_query = option.name.clone();
            state.search_mode = false;
            state.options_visible = false;
            state.search_results.clear();
            state.search_error = None;
            state.search_selected = 0;
            let load = begin_load(state, option.to_place(), false);
            DispatchResult::changed_with_many(vec![Effect::CancelSearch, load])
        }

        // ===== Locate actions =====
        Action::LocateRequest => {
            state.weather = DataResource::Loading;
            state.is_refreshing = false;
            state.locating = true;
            state.notice = None;
            reset_loading_anim(state);
            DispatchResult::changed_with(Effect::LocateUser)
        }

        // A place chosen meanwhile wins over a late position
        Action::LocateDidResolve(_) | Action::LocateDidFail(_) if !state.locating => {
            DispatchResult::unchanged()
        }

        Action::LocateDidResolve(place) => {
            DispatchResult::changed_with(begin_load(state, place, true))
        }

        Action::LocateDidFail(reason) => {
            let effect = begin_load(state, Place::default_city(), false);
            state.notice = Some(format!("Location unavailable ({reason})"));
            DispatchResult::changed_with(effect)
        }

        // ===== Backdrop actions =====
        Action::BackdropDidLoad(image) => {
            backdrop::push_layer(&mut state.backdrops, image);
            DispatchResult::changed()
        }

        // Forget the query so the next load of this place tries again
        Action::BackdropDidError(_) => {
            if state.backdrop_query.take().is_some() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== UI actions =====
        Action::UiToggleUnits => {
            state.unit = state.unit.toggle();
            DispatchResult::changed()
        }

        Action::Render => DispatchResult::changed(),

        // ===== Global actions =====
        Action::Tick => {
            let mut changed = false;
            if state.loading_anim_active() {
                state.tick_count = state.tick_count.wrapping_add(1);
                if state.loading_anim_ticks_remaining > 0 {
                    state.loading_anim_ticks_remaining -= 1;
                }
                changed = true;
            }
            if backdrop::advance_layers(&mut state.backdrops, TICK_MS) {
                changed = true;
            }
            if changed {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Switch the panel to `place` in the loading state.
fn begin_load(state: &mut AppState, place: Place, from_my_location: bool) -> Effect {
    let (lat, lon) = (place.lat, place.lon);
    state.place = place;
    state.from_my_location = from_my_location;
    state.locating = false;
    state.weather = DataResource::Loading;
    state.is_refreshing = false;
    state.notice = None;
    reset_loading_anim(state);
    Effect::FetchWeather { lat, lon }
}

/// Shared tail of a weather load, whatever its outcome.
fn finish_load(state: &mut AppState) {
    state.is_refreshing = false;
    state.locate_visible = !state.from_my_location;
    state.loading_anim_ticks_remaining = ticks_to_phase_zero(state.tick_count);
}

fn reset_loading_anim(state: &mut AppState) {
    state.tick_count = 0;
    state.loading_anim_ticks_remaining = 0;
}

fn ticks_to_phase_zero(tick_count: u32) -> u32 {
    let cycle = LOADING_ANIM_CYCLE_TICKS.max(1);
    if tick_count == 0 {
        return cycle;
    }
    let remainder = tick_count % cycle;
    if remainder == 0 { 0 } else { cycle - remainder }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backdrop::{BackdropImage, Rgb};
    use crate::state::{CityOption, TempUnit, WeatherReport};

    fn report() -> WeatherReport {
        WeatherReport {
            temperature: 22.5,
            humidity: 60.0,
            rain_chance: 10.0,
            wind_speed: 11.2,
            weather_code: 0,
            status: "Clear Sky".into(),
        }
    }

    fn option(name: &str) -> CityOption {
        CityOption {
            name: name.into(),
            admin1: None,
            country_code: "FR".into(),
            lat: 48.85,
            lon: 2.35,
        }
    }

    #[test]
    fn test_weather_fetch_sets_loading() {
        let mut state = AppState {
            weather: DataResource::Empty,
            ..Default::default()
        };
        state.tick_count = 5;
        state.loading_anim_ticks_remaining = 7;

        let result = reducer(&mut state, Action::WeatherFetch);

        assert!(result.changed);
        assert!(state.weather.is_loading());
        assert_eq!(state.tick_count, 0);
        assert_eq!(state.loading_anim_ticks_remaining, 0);
        assert_eq!(
            result.effects,
            vec![Effect::FetchWeather {
                lat: 28.61,
                lon: 77.20
            }]
        );
    }

    #[test]
    fn test_weather_fetch_when_loaded_refreshes() {
        let mut state = AppState {
            weather: DataResource::Loaded(report()),
            ..Default::default()
        };
        reducer(&mut state, Action::WeatherFetch);
        assert!(state.is_refreshing);
        assert!(state.weather.is_loaded());
    }

    #[test]
    fn test_weather_did_load_clears_loading() {
        let mut state = AppState {
            tick_count: 1,
            ..Default::default()
        };

        let result = reducer(&mut state, Action::WeatherDidLoad(report()));

        assert!(result.changed);
        assert_eq!(state.weather.data(), Some(&report()));
        assert_eq!(
            state.loading_anim_ticks_remaining,
            LOADING_ANIM_CYCLE_TICKS - 1
        );
        assert_eq!(
            result.effects,
            vec![Effect::FetchBackdrop {
                query: "New Delhi".into()
            }]
        );
    }

    #[test]
    fn test_refresh_does_not_refetch_backdrop() {
        let mut state = AppState::default();
        reducer(&mut state, Action::WeatherDidLoad(report()));
        reducer(&mut state, Action::WeatherFetch);
        let result = reducer(&mut state, Action::WeatherDidLoad(report()));
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_locate_control_hidden_after_own_location() {
        let mut state = AppState::default();
        let place = Place {
            name: "Pune".into(),
            country_code: "IN".into(),
            lat: 18.5,
            lon: 73.8,
        };

        reducer(&mut state, Action::LocateRequest);
        reducer(&mut state, Action::LocateDidResolve(place));
        assert!(state.from_my_location);
        reducer(&mut state, Action::WeatherDidError("boom".into()));
        assert!(!state.locate_visible);

        reducer(
            &mut state,
            Action::WeatherLoad {
                place: Place::default_city(),
                from_my_location: false,
            },
        );
        reducer(&mut state, Action::WeatherDidLoad(report()));
        assert!(state.locate_visible);
    }

    #[test]
    fn test_locate_failure_loads_default_city() {
        let mut state = AppState::default();
        reducer(&mut state, Action::LocateRequest);
        assert!(state.locating);

        let result = reducer(&mut state, Action::LocateDidFail("denied".into()));

        assert!(!state.locating);
        assert!(!state.from_my_location);
        assert_eq!(state.place, Place::default_city());
        assert!(state.weather.is_loading());
        assert!(state.notice.as_deref().unwrap_or_default().contains("denied"));
        assert_eq!(
            result.effects,
            vec![Effect::FetchWeather {
                lat: 28.61,
                lon: 77.20
            }]
        );
    }

    #[test]
    fn test_empty_query_hides_options() {
        let mut state = AppState {
            options_visible: true,
            search_results: vec![option("Paris")],
            ..Default::default()
        };

        let result = reducer(&mut state, Action::SearchQueryChange("   ".into()));

        assert!(!state.options_visible);
        assert_eq!(
            result.effects,
            vec![Effect::SearchCities {
                query: String::new()
            }]
        );
    }

    #[test]
    fn test_query_change_keeps_raw_text() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::SearchQueryChange(" Par".into()));
        assert_eq!(state.search_query, " Par");
        assert_eq!(
            result.effects,
            vec![Effect::SearchCities {
                query: "Par".into()
            }]
        );
    }

    #[test]
    fn test_submit_empty_query_does_nothing() {
        let mut state = AppState::default();
        let result = reducer(&mut state, Action::SearchQuerySubmit("  ".into()));
        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_not_found_shows_error_panel() {
        let mut state = AppState {
            weather: DataResource::Loaded(report()),
            search_mode: true,
            options_visible: true,
            search_results: vec![option("Paris")],
            ..Default::default()
        };

        reducer(&mut state, Action::SearchDidNotFind("zzzz".into()));

        assert!(!state.options_visible);
        assert!(state.search_results.is_empty());
        assert_eq!(state.weather.error(), Some(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_search_error_leaves_list() {
        let mut state = AppState {
            search_mode: true,
            options_visible: true,
            search_results: vec![option("Paris")],
            ..Default::default()
        };
        reducer(&mut state, Action::SearchDidError("timeout".into()));
        assert!(state.options_visible);
        assert_eq!(state.search_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_confirm_loads_selected_option() {
        let mut state = AppState {
            search_mode: true,
            ..Default::default()
        };
        reducer(
            &mut state,
            Action::SearchDidLoad(vec![option("Paris"), option("Lyon")]),
        );
        reducer(&mut state, Action::SearchSelect(1));

        let result = reducer(&mut state, Action::SearchConfirm);

        assert_eq!(state.place.name, "Lyon");
        assert_eq!(state.search_query, "Lyon");
        assert!(!state.search_mode);
        assert!(!state.options_visible);
        assert!(!state.from_my_location);
        assert!(state.weather.is_loading());
        assert!(matches!(
            result.effects[..],
            [Effect::CancelSearch, Effect::FetchWeather { .. }]
        ));
    }

    #[test]
    fn test_confirm_without_visible_options_is_noop() {
        let mut state = AppState {
            search_results: vec![option("Paris")],
            options_visible: false,
            ..Default::default()
        };
        let result = reducer(&mut state, Action::SearchConfirm);
        assert!(!result.changed);
    }

    #[test]
    fn test_select_out_of_range() {
        let mut state = AppState {
            search_mode: true,
            ..Default::default()
        };
        reducer(&mut state, Action::SearchDidLoad(vec![option("Paris")]));
        assert!(!reducer(&mut state, Action::SearchSelect(3)).changed);
    }

    #[test]
    fn test_toggle_units() {
        let mut state = AppState::default();
        assert_eq!(state.unit, TempUnit::Celsius);

        reducer(&mut state, Action::UiToggleUnits);
        assert_eq!(state.unit, TempUnit::Fahrenheit);

        reducer(&mut state, Action::UiToggleUnits);
        assert_eq!(state.unit, TempUnit::Celsius);
    }

    #[test]
    fn test_tick_rerenders_during_loading_animation() {
        let mut state = AppState {
            weather: DataResource::Loaded(report()),
            ..Default::default()
        };

        // Not loading and no remaining animation - no re-render
        let result = reducer(&mut state, Action::Tick);
        assert!(!result.changed);

        state.loading_anim_ticks_remaining = 1;
        let result = reducer(&mut state, Action::Tick);
        assert!(result.changed);
        assert_eq!(state.loading_anim_ticks_remaining, 0);

        state.weather = DataResource::Loading;
        let result = reducer(&mut state, Action::Tick);
        assert!(result.changed);
    }

    #[test]
    fn test_tick_advances_backdrop_fade() {
        let mut state = AppState {
            weather: DataResource::Loaded(report()),
            ..Default::default()
        };
        let image = BackdropImage {
            width: 1,
            height: 1,
            pixels: vec![Rgb::new(9, 9, 9)],
        };
        reducer(&mut state, Action::BackdropDidLoad(image));
        assert!(state.backdrop_transition_active());

        let result = reducer(&mut state, Action::Tick);
        assert!(result.changed);
        assert_eq!(state.backdrops[0].age_ms, TICK_MS);
    }

    #[test]
    fn test_choosing_city_while_locating() {
        let mut state = AppState::default();
        reducer(&mut state, Action::LocateRequest);
        reducer(&mut state, Action::SearchOpen);
        reducer(&mut state, Action::SearchDidLoad(vec![option("Paris")]));
        reducer(&mut state, Action::SearchConfirm);

        assert!(!state.locating);
        reducer(&mut state, Action::WeatherDidLoad(report()));
        assert_eq!(state.place.name, "Paris");

        // The position lookup finishing later changes nothing
        let result = reducer(&mut state, Action::LocateDidFail("timeout".into()));
        assert!(!result.changed);
        assert!(result.effects.is_empty());
        assert_eq!(state.place.name, "Paris");
        assert!(state.notice.is_none());

        let late = Place {
            name: "Pune".into(),
            country_code: "IN".into(),
            lat: 18.5,
            lon: 73.8,
        };
        assert!(!reducer(&mut state, Action::LocateDidResolve(late)).changed);
        assert_eq!(state.place.name, "Paris");
    }

    #[test]
    fn test_close_cancels_pending_search() {
        let mut state = AppState::default();
        reducer(&mut state, Action::SearchOpen);
        reducer(&mut state, Action::SearchQueryChange("Par".into()));

        let result = reducer(&mut state, Action::SearchClose);
        assert_eq!(result.effects, vec![Effect::CancelSearch]);
    }

    #[test]
    fn test_late_search_results_after_confirm_are_ignored() {
        let mut state = AppState::default();
        reducer(&mut state, Action::SearchOpen);
        reducer(&mut state, Action::SearchDidLoad(vec![option("Paris")]));
        reducer(&mut state, Action::SearchQueryChange("Parisxx".into()));
        reducer(&mut state, Action::SearchConfirm);
        reducer(&mut state, Action::WeatherDidLoad(report()));

        assert!(!reducer(&mut state, Action::SearchDidNotFind("Parisxx".into())).changed);
        assert!(state.weather.is_loaded());

        assert!(!reducer(&mut state, Action::SearchDidLoad(vec![option("Lyon")])).changed);
        assert!(!state.options_visible);
    }

    #[test]
    fn test_reselecting_same_city_fetches_backdrop() {
        let mut state = AppState::default();
        reducer(&mut state, Action::SearchOpen);
        reducer(&mut state, Action::SearchDidLoad(vec![option("Paris")]));
        reducer(&mut state, Action::SearchConfirm);
        let first = reducer(&mut state, Action::WeatherDidLoad(report()));
        assert_eq!(
            first.effects,
            vec![Effect::FetchBackdrop {
                query: "Paris".into()
            }]
        );

        reducer(&mut state, Action::SearchOpen);
        reducer(&mut state, Action::SearchDidLoad(vec![option("Paris")]));
        reducer(&mut state, Action::SearchConfirm);
        let again = reducer(&mut state, Action::WeatherDidLoad(report()));
        assert_eq!(again.effects, first.effects);
    }

    #[test]
    fn test_backdrop_error_allows_retry_on_refresh() {
        let mut state = AppState::default();
        reducer(&mut state, Action::WeatherDidLoad(report()));
        assert_eq!(state.backdrop_query.as_deref(), Some("New Delhi"));

        assert!(reducer(&mut state, Action::BackdropDidError("503".into())).changed);
        assert_eq!(state.backdrop_query, None);

        reducer(&mut state, Action::WeatherFetch);
        let result = reducer(&mut state, Action::WeatherDidLoad(report()));
        assert_eq!(
            result.effects,
            vec![Effect::FetchBackdrop {
                query: "New Delhi".into()
            }]
        );
    }
}
