use eframe::egui::{self, Rect, Ui};

use super::super::ViewModel;

impl ViewModel {
    /// Feeds this frame's pointer state to the engine. Runs before the
    /// physics tick so drags use the transform that is currently on screen.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let (hover, interact, pressed, released) = ui.input(|input| {
            (
                input.pointer.hover_pos(),
                input.pointer.interact_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
            )
        });
        let inside = hover.filter(|pointer| rect.contains(*pointer));

        if pressed
            && response.hovered()
            && let Some(pointer) = inside
        {
            self.engine.pointer_down(pointer);
        }

        if self.engine.controller().is_dragging()
            && let Some(pointer) = interact
        {
            self.engine.pointer_move(pointer);
            ui.ctx().request_repaint();
        }

        if released {
            self.engine
                .pointer_up(interact.unwrap_or_else(|| rect.center()));
        }

        if inside.is_some() {
            self.engine.hover(inside);
        } else {
            self.engine.pointer_left();
        }

        if self.engine.controller().is_dragging() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        } else if self.engine.controller().hovered_node().is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
    }
}
