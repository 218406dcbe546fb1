use artbox::{
    Alignment as ArtAlignment, Color as ArtColor, Fill, LinearGradient, Renderer, fonts,
    integrations::ratatui::ArtBox,
};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::Component;
use crate::action::Action;
use crate::state::{LOADING_ANIM_CYCLE_TICKS, Place};

pub struct LocationHeader;

pub struct LocationHeaderProps<'a> {
    pub place: &'a Place,
    /// Position lookup in progress; the place name is not known yet
    pub locating: bool,
    pub temperature: Option<f64>,
    pub is_animating: bool,
    pub tick_count: u32,
}

/// Overhead inside the header area: 1 spacer + 1 coords line.
/// The FIGlet city name gets `area.height - HEADER_OVERHEAD`.
pub const HEADER_OVERHEAD: u16 = 2;

const LOCATING_TITLE: &str = "Locating";

/// Colour stops along the temperature axis, Celsius.
const TEMP_SCALE: [(f64, [u8; 3]); 5] = [
    (-10.0, [96, 150, 250]),
    (5.0, [90, 200, 235]),
    (18.0, [110, 215, 150]),
    (27.0, [250, 200, 90]),
    (38.0, [235, 85, 70]),
];

const NO_DATA: [u8; 3] = [190, 190, 200];

/// How far the shimmer lightens the title at its peak.
const SHIMMER_STRENGTH: f32 = 0.4;

fn scale_rgb(celsius: f64) -> [u8; 3] {
    let (first_t, first) = TEMP_SCALE[0];
    if celsius <= first_t {
        return first;
    }
    for pair in TEMP_SCALE.windows(2) {
        let ((lo_t, lo), (hi_t, hi)) = (pair[0], pair[1]);
        if celsius <= hi_t {
            let t = (celsius - lo_t) / (hi_t - lo_t);
            let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
            return [mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])];
        }
    }
    TEMP_SCALE[TEMP_SCALE.len() - 1].1
}

fn art_color([r, g, b]: [u8; 3]) -> ArtColor {
    ArtColor::rgb(r, g, b)
}

/// Left and right title colours: a slice of the scale around `temp`.
pub fn gradient_colors(temp: Option<f64>) -> (ArtColor, ArtColor) {
    match temp {
        Some(t) => (art_color(scale_rgb(t - 6.0)), art_color(scale_rgb(t + 6.0))),
        None => (art_color(NO_DATA), art_color([230, 230, 235])),
    }
}

/// 0 at the start of each loading cycle, 1 halfway through.
fn shimmer_pulse(tick_count: u32) -> f32 {
    let steps = LOADING_ANIM_CYCLE_TICKS.max(1);
    let phase = (tick_count % steps) as f32 / steps as f32;
    0.5 - 0.5 * (phase * std::f32::consts::TAU).cos()
}

fn title_fill((start, end): (ArtColor, ArtColor), pulse: f32) -> Fill {
    let white = ArtColor::rgb(255, 255, 255);
    let lift = pulse * SHIMMER_STRENGTH;
    Fill::Linear(LinearGradient::horizontal(
        start.interpolate(white, lift),
        end.interpolate(white, lift),
    ))
}

/// `"🇮🇳  28.61°N, 77.20°E"`; the flag is omitted when the code is unusable.
pub fn coordinates_line(place: &Place) -> String {
    let coords = format!("{:.2}°N, {:.2}°E", place.lat, place.lon);
    match place.flag() {
        Some(flag) => format!("{flag}  {coords}"),
        None => coords,
    }
}

impl Component<Action> for LocationHeader {
    type Props<'a> = LocationHeaderProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let chunks = Layout::vertical([
            Constraint::Fill(1),   // FIGlet city name, artbox picks the best font
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Flag + coordinates
        ])
        .split(area);

        let pulse = if props.is_animating {
            shimmer_pulse(props.tick_count)
        } else {
            0.0
        };
        let fill = title_fill(gradient_colors(props.temperature), pulse);

        let renderer = Renderer::new(fonts::stack(&["terminus", "miniwi"]))
            .with_plain_fallback()
            .with_alignment(ArtAlignment::Center)
            .with_fill(fill);

        let title = if props.locating {
            LOCATING_TITLE.to_string()
        } else {
            props.place.display_name()
        };
        frame.render_widget(ArtBox::new(&renderer, &title), chunks[0]);

        if props.locating {
            return;
        }
        let coords = Line::from(vec![Span::styled(
            coordinates_line(props.place),
            Style::default().fg(Color::DarkGray),
        )])
        .centered();
        frame.render_widget(Paragraph::new(coords), chunks[2]);
    }
}
