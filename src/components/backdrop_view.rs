use ratatui::{Frame, layout::Rect, style::Color};

use super::Component;
use crate::action::Action;
use crate::backdrop;
use crate::state::BackdropLayer;

/// Paints the photo layers as cell background colors.
///
/// Must render before anything else so widgets draw on top of it.
pub struct BackdropView;

pub struct BackdropViewProps<'a> {
    pub layers: &'a [BackdropLayer],
}

impl Component<Action> for BackdropView {
    type Props<'a> = BackdropViewProps<'a>;

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        if props.layers.is_empty() {
            return;
        }

        let buf = frame.buffer_mut();
        for row in 0..area.height {
            for col in 0..area.width {
                let Some(rgb) =
                    backdrop::composite(props.layers, col, row, area.width, area.height)
                else {
                    continue;
                };
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_bg(Color::Rgb(rgb.r, rgb.g, rgb.b));
                }
            }
        }
    }
}
