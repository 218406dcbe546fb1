use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Layout};
use ratatui::prelude::{Frame, Rect};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use super::{BackdropView, BackdropViewProps, Component, WeatherBody, WeatherBodyProps};
use crate::action::Action;
use crate::state::AppState;

pub const ERROR_ICON: &str = "\u{26a0}\u{fe0f}";

/// Props for WeatherDisplay - read-only view of state
pub struct WeatherDisplayProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// The main screen: backdrop, weather panel and key hints
#[derive(Default)]
pub struct WeatherDisplay;

impl Component<Action> for WeatherDisplay {
    type Props<'a> = WeatherDisplayProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Char('r') | KeyCode::F(5) => Some(Action::WeatherFetch),
                KeyCode::Char('/') => Some(Action::SearchOpen),
                KeyCode::Char('l') if props.state.locate_visible => Some(Action::LocateRequest),
                KeyCode::Char('u') => Some(Action::UiToggleUnits),
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: WeatherDisplayProps<'_>) {
        let mut backdrop = BackdropView;
        backdrop.render(
            frame,
            area,
            BackdropViewProps {
                layers: &props.state.backdrops,
            },
        );

        let chunks = Layout::vertical([
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Help bar
        ])
        .split(area);

        let mut body = WeatherBody;
        body.render(frame, chunks[0], WeatherBodyProps { state: props.state });

        let mut hints = vec![
            StatusBarHint::new("r", "refresh"),
            StatusBarHint::new("/", "search"),
        ];
        if props.state.locate_visible {
            hints.push(StatusBarHint::new("l", "my location"));
        }
        hints.push(StatusBarHint::new("u", "units"));
        hints.push(StatusBarHint::new("q", "quit"));

        let mut status_bar = StatusBar::new();
        <StatusBar as Component<Action>>::render(
            &mut status_bar,
            frame,
            chunks[1],
            StatusBarProps {
                left: StatusBarSection::empty(),
                center: StatusBarSection::hints(&hints),
                right: StatusBarSection::empty(),
                style: StatusBarStyle::default(),
                is_focused: false,
            },
        );
    }
}
