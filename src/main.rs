//! skylook - weather lookup TUI

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Frame, Terminal, backend::CrosstermBackend, layout::Rect};
use skylook::action::Action;
use skylook::api::{self, ApiError, SearchOutcome};
use skylook::components::{
    Component, SearchOverlay, SearchOverlayProps, WeatherDisplay, WeatherDisplayProps,
};
use skylook::config::{Args, Settings};
use skylook::effect::Effect;
use skylook::logging;
use skylook::reducer::reducer;
use skylook::state::{AppState, SEARCH_DEBOUNCE_MS, TICK_MS};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventContext, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, RenderContext, TaskKey,
};
use tui_dispatch_components::centered_rect;
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{DebugRunOutput, DebugSession, DebugSessionError, ReplayItem};

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum SkylookComponentId {
    Display,
    Search,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum SkylookContext {
    Main,
    Search,
}

impl EventRoutingState<SkylookComponentId, SkylookContext> for AppState {
    fn focused(&self) -> Option<SkylookComponentId> {
        if self.search_mode {
            Some(SkylookComponentId::Search)
        } else {
            Some(SkylookComponentId::Display)
        }
    }

    fn modal(&self) -> Option<SkylookComponentId> {
        if self.search_mode {
            Some(SkylookComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: SkylookComponentId) -> SkylookContext {
        match id {
            SkylookComponentId::Display => SkylookContext::Main,
            SkylookComponentId::Search => SkylookContext::Search,
        }
    }

    fn default_context(&self) -> SkylookContext {
        SkylookContext::Main
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;
    let settings = Settings::from_args(&args);
    let Args {
        city, debug: debug_args, ..
    } = args;

    let debug = DebugSession::new(debug_args);

    // Export JSON schemas if requested
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    // A city on the command line replaces the start-up location lookup
    let start_action = if city.is_some() {
        Action::WeatherFetch
    } else {
        Action::LocateRequest
    };

    let state = debug
        .load_state_or_else_async(move || async move {
            let Some(city) = city else {
                return Ok::<AppState, io::Error>(AppState::default());
            };
            match api::geocode_city(&city).await {
                Ok(place) => Ok(AppState::new(place)),
                Err(ApiError::NotFound(city)) => {
                    eprintln!("Error: City '{}' not found. Please check the spelling.", city);
                    eprintln!("Examples: 'London', 'Tokyo', 'New York'");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: Could not connect to geocoding service.");
                    eprintln!("Details: {}", e);
                    std::process::exit(1);
                }
            }
        })
        .await
        .map_err(debug_error)?;

    let replay_actions = debug.load_replay_items().map_err(debug_error)?;

    let (middleware, action_recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &debug,
        store,
        settings,
        start_action,
        replay_actions,
    )
    .await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug
        .save_actions(action_recorder.as_ref())
        .map_err(debug_error)?;

    tracing::info!("exiting");
    Ok(())
}

struct SkylookUi {
    display: WeatherDisplay,
    search: SearchOverlay,
}

impl SkylookUi {
    fn new() -> Self {
        Self {
            display: WeatherDisplay,
            search: SearchOverlay::new(),
        }
    }

    fn search_props<'a>(state: &'a AppState, is_focused: bool) -> SearchOverlayProps<'a> {
        SearchOverlayProps {
            query: &state.search_query,
            options: state.visible_options(),
            selected: state.search_selected,
            is_focused,
            error: state.search_error.as_deref(),
            on_query_change: Action::SearchQueryChange,
            on_query_submit: Action::SearchQuerySubmit,
            on_select: Action::SearchSelect,
        }
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        render_ctx: RenderContext,
        event_ctx: &mut EventContext<SkylookComponentId>,
    ) {
        event_ctx.set_component_area(SkylookComponentId::Display, area);

        let props = WeatherDisplayProps {
            state,
            is_focused: render_ctx.is_focused() && !state.search_mode,
        };
        self.display.render(frame, area, props);

        self.search.set_open(state.search_mode);
        if state.search_mode {
            let modal_area = centered_rect(60, 14, area);
            event_ctx.set_component_area(SkylookComponentId::Search, modal_area);
            let props = Self::search_props(state, render_ctx.is_focused());
            self.search.render(frame, area, props);
        } else {
            event_ctx
                .component_areas
                .remove(&SkylookComponentId::Search);
        }
    }

    fn handle_display_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let props = WeatherDisplayProps {
            state,
            is_focused: true,
        };
        let actions: Vec<_> = self
            .display
            .handle_event(event, props)
            .into_iter()
            .collect();
        if actions.is_empty() {
            HandlerResponse::ignored()
        } else {
            HandlerResponse {
                actions,
                consumed: true,
                needs_render: false,
            }
        }
    }

    fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        self.search.set_open(state.search_mode);
        let props = Self::search_props(state, true);
        let actions: Vec<_> = self.search.handle_event(event, props).into_iter().collect();
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    settings: Settings,
    start_action: Action,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(SkylookUi::new()));
    let mut bus: EventBus<AppState, Action, SkylookComponentId, SkylookContext> =
        EventBus::new();
    let keybindings: Keybindings<SkylookContext> = Keybindings::new();

    let ui_display = Rc::clone(&ui);
    bus.register(SkylookComponentId::Display, move |event, state| {
        ui_display
            .borrow_mut()
            .handle_display_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(SkylookComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    // Re-render on terminal resize (no action needed, just redraw)
    bus.register_global(|event, _state| match event.kind {
        EventKind::Resize(_, _) => HandlerResponse::ignored().with_render(),
        _ => HandlerResponse::ignored(),
    });

    let refresh_interval = settings.refresh_interval;

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(start_action),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }

                runtime.subscriptions().interval(
                    "tick",
                    Duration::from_millis(TICK_MS),
                    || Action::Tick,
                );

                runtime.subscriptions().interval(
                    "refresh",
                    Duration::from_secs(refresh_interval),
                    || Action::WeatherFetch,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            |effect, ctx| handle_effect(effect, ctx, &settings),
        )
        .await
}

/// Handle effects by spawning tasks
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, settings: &Settings) {
    match effect {
        Effect::FetchWeather { lat, lon } => {
            ctx.tasks().spawn("weather", async move {
                match api::fetch_weather(lat, lon).await {
                    Ok(report) => Action::WeatherDidLoad(report),
                    Err(e) => {
                        tracing::warn!(error = %e, "weather fetch failed");
                        Action::WeatherDidError(e.to_string())
                    }
                }
            });
        }
        Effect::SearchCities { query } => {
            if query.is_empty() {
                ctx.tasks().cancel(&TaskKey::new("city_search"));
                return;
            }
            ctx.tasks().debounce(
                "city_search",
                Duration::from_millis(SEARCH_DEBOUNCE_MS),
                search_task(query),
            );
        }
        Effect::CancelSearch => {
            ctx.tasks().cancel(&TaskKey::new("city_search"));
        }
        Effect::SearchCitiesNow { query } => {
            ctx.tasks().cancel(&TaskKey::new("city_search"));
            ctx.tasks().spawn("city_search", search_task(query));
        }
        Effect::LocateUser => {
            let fixed_position = settings.position;
            ctx.tasks().spawn("locate", async move {
                let position = match fixed_position {
                    Some(position) => Ok(position),
                    None => api::locate_by_ip().await,
                };
                match position {
                    Ok((lat, lon)) => {
                        tracing::info!(lat, lon, "position found");
                        Action::LocateDidResolve(api::place_for_position(lat, lon).await)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "position unavailable; showing default city");
                        Action::LocateDidFail(e.to_string())
                    }
                }
            });
        }
        Effect::FetchBackdrop { query } => {
            let Some(access_key) = settings.unsplash_key.clone() else {
                tracing::debug!(%query, "no photo access key; backdrop skipped");
                return;
            };
            ctx.tasks().spawn("backdrop", async move {
                match api::fetch_backdrop(&query, &access_key).await {
                    Ok(Some(image)) => Action::BackdropDidLoad(image),
                    Ok(None) => {
                        tracing::info!(%query, "no backdrop photo found");
                        Action::BackdropDidError(format!("no photo for {query}"))
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "backdrop fetch failed");
                        Action::BackdropDidError(e.to_string())
                    }
                }
            });
        }
    }
}

async fn search_task(query: String) -> Action {
    match api::search_cities(&query).await {
        Ok(SearchOutcome::Found(options)) => Action::SearchDidLoad(options),
        Ok(SearchOutcome::NotFound) => {
            tracing::info!(%query, "city not found");
            Action::SearchDidNotFind(query)
        }
        Err(e) => {
            tracing::warn!(error = %e, "city search failed");
            Action::SearchDidError(e.to_string())
        }
    }
}
