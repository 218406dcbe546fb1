use artbox::{
    Alignment as ArtAlignment, Fill, LinearGradient, Renderer, fonts,
    integrations::ratatui::ArtBox,
};
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

use tui_dispatch::DataResource;

use super::location_header::{HEADER_OVERHEAD, gradient_colors};
use super::{Component, ERROR_ICON, LocationHeader, LocationHeaderProps};
use crate::action::Action;
use crate::condition;
use crate::reducer::NOT_FOUND_MESSAGE;
use crate::state::{AppState, WeatherReport, format_number};

pub struct WeatherBody;

pub struct WeatherBodyProps<'a> {
    pub state: &'a AppState,
}

/// Fixed rows: blank, emoji, blank, status, readings, notice.
const LAYOUT_FIXED: u16 = 6;

/// Text cap tiers: (header_cap, temp_cap).
/// terminus(6), miniwi(4), plain(1), with HEADER_OVERHEAD added to header.
const TEXT_TIERS: [(u16, u16); 3] = [
    (6 + HEADER_OVERHEAD, 6),
    (4 + HEADER_OVERHEAD, 4),
    (1 + HEADER_OVERHEAD, 1),
];

struct LayoutSizing {
    header_cap: u16,
    temp_cap: u16,
}

/// Largest text tier that fits; the plain tier when nothing does.
fn compute_layout(area_height: u16) -> LayoutSizing {
    let (header_cap, temp_cap) = TEXT_TIERS
        .iter()
        .copied()
        .find(|&(hcap, tcap)| hcap + tcap + LAYOUT_FIXED <= area_height)
        .unwrap_or(TEXT_TIERS[TEXT_TIERS.len() - 1]);
    LayoutSizing {
        header_cap,
        temp_cap,
    }
}

// ============================================================================
// Component
// ============================================================================

impl Component<Action> for WeatherBody {
    type Props<'a> = WeatherBodyProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let sizing = compute_layout(area.height);

        match &props.state.weather {
            DataResource::Failed(error) => render_error(frame, area, error),
            DataResource::Loaded(report) => {
                render_ready(frame, area, props.state, report, &sizing);
            }
            DataResource::Loading | DataResource::Empty => {
                let message = if props.state.locating {
                    "Finding your location..."
                } else {
                    "Loading..."
                };
                render_placeholder(frame, area, props.state, &sizing, message);
            }
        }
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut header = LocationHeader;
    header.render(
        frame,
        area,
        LocationHeaderProps {
            place: state.current_place(),
            locating: state.locating,
            temperature: state.weather.data().map(|w| w.temperature),
            is_animating: state.loading_anim_active(),
            tick_count: state.tick_count,
        },
    );
}

fn make_layout(area: Rect, sizing: &LayoutSizing) -> std::rc::Rc<[Rect]> {
    Layout::vertical([
        Constraint::Max(sizing.header_cap),
        Constraint::Length(1), // blank
        Constraint::Length(1), // emoji
        Constraint::Length(1), // blank
        Constraint::Max(sizing.temp_cap),
        Constraint::Length(1), // status
        Constraint::Length(1), // readings
        Constraint::Length(1), // notice
    ])
    .flex(Flex::Center)
    .split(area)
}

/// `Humidity 48%   Rain 12%   Wind 9.7 kmph`
pub fn readings_line(report: &WeatherReport) -> Line<'static> {
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);
    Line::from(vec![
        Span::styled("Humidity ", label),
        Span::styled(format!("{}%", format_number(report.humidity)), value),
        Span::styled("   Rain ", label),
        Span::styled(format!("{}%", format_number(report.rain_chance)), value),
        Span::styled("   Wind ", label),
        Span::styled(format!("{} kmph", format_number(report.wind_speed)), value),
    ])
    .centered()
}

fn render_notice(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(notice) = &state.notice {
        let line = Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ))
        .centered();
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn render_ready(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    report: &WeatherReport,
    sizing: &LayoutSizing,
) {
    let chunks = make_layout(area, sizing);

    render_header(frame, chunks[0], state);

    let emoji = Line::from(condition::weather_emoji(report.weather_code)).centered();
    frame.render_widget(Paragraph::new(emoji), chunks[2]);

    let temp_text = state.unit.format(report.temperature);
    let (start, end) = gradient_colors(Some(report.temperature));
    let renderer = Renderer::new(fonts::stack(&["terminus", "miniwi"]))
        .with_plain_fallback()
        .with_alignment(ArtAlignment::Center)
        .with_fill(Fill::Linear(LinearGradient::horizontal(start, end)));
    frame.render_widget(ArtBox::new(&renderer, &temp_text), chunks[4]);

    let status = Line::from(vec![Span::styled(
        report.status.clone(),
        Style::default().fg(Color::Gray).bold(),
    )])
    .centered();
    frame.render_widget(Paragraph::new(status), chunks[5]);

    frame.render_widget(Paragraph::new(readings_line(report)), chunks[6]);
    render_notice(frame, chunks[7], state);
}

fn render_placeholder(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    sizing: &LayoutSizing,
    message: &str,
) {
    let chunks = make_layout(area, sizing);
    render_header(frame, chunks[0], state);

    let msg = Line::from(vec![Span::styled(
        message.to_string(),
        Style::default().fg(Color::DarkGray),
    )])
    .centered();
    frame.render_widget(Paragraph::new(msg), chunks[5]);
    render_notice(frame, chunks[7], state);
}

fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // blank
        Constraint::Length(1), // icon
        Constraint::Length(1), // title
        Constraint::Length(1), // message
        Constraint::Length(1), // blank
        Constraint::Length(1), // hint
    ])
    .flex(Flex::Center)
    .split(area);

    let (title, hint) = if error == NOT_FOUND_MESSAGE {
        ("Not found", " to search again")
    } else {
        ("Error", " to retry")
    };
    let hint_key = if error == NOT_FOUND_MESSAGE { "/" } else { "r" };

    frame.render_widget(
        Paragraph::new(Line::from(ERROR_ICON).centered()),
        chunks[1],
    );
    frame.render_widget(
        Paragraph::new(
            Line::from(vec![Span::styled(
                title,
                Style::default().fg(Color::Red).bold(),
            )])
            .centered(),
        ),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(
            Line::from(vec![Span::styled(
                error.to_string(),
                Style::default().fg(Color::Rgb(200, 100, 100)),
            )])
            .centered(),
        ),
        chunks[3],
    );
    frame.render_widget(
        Paragraph::new(
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::DarkGray)),
                Span::styled(hint_key, Style::default().fg(Color::Cyan).bold()),
                Span::styled(hint, Style::default().fg(Color::DarkGray)),
            ])
            .centered(),
        ),
        chunks[5],
    );
}
