// src/visualizer.rs
use crate::canvas::GridCanvas;
use crate::colour::BACKGROUND_COLOUR;
use crate::grid::{LEFT_BOUND, TOP_BOUND};
use eframe::egui;
use egui::{Color32, Rect, Rounding, Stroke, Vec2};
pub fn draw_grid(ui: &mut egui::Ui, canvas: &GridCanvas) {
    let (width, height) = canvas.layout().size();
    let (response, painter) = ui.allocate_painter(
        Vec2::new(width + LEFT_BOUND, height + TOP_BOUND),
        egui::Sense::hover(),
    );
    let rect = response.rect;
    let origin = rect.min;
    painter.rect_filled(rect, Rounding::same(0.0), BACKGROUND_COLOUR);
    for (cell, colour) in canvas.cells() {
        let cell_rect = Rect::from_min_size(
            origin + Vec2::new(cell.left, cell.top),
            Vec2::new(cell.width, cell.height),
        );
        painter.rect_filled(cell_rect, Rounding::same(0.0), colour);
    }
    // hovered cell: outline + channel readout
    let Some(pos) = response.hover_pos() else {
        return;
    };
    let local = pos - origin;
    let Some(index) = canvas.layout().cell_at(local.x, local.y) else {
        return;
    };
    let Some(cell) = canvas.layout().cells().get(index) else {
        return;
    };
    let cell_rect = Rect::from_min_size(
        origin + Vec2::new(cell.left, cell.top),
        Vec2::new(cell.width, cell.height),
    );
    painter.rect_stroke(cell_rect.expand(1.0), Rounding::same(0.0), Stroke::new(1.0, Color32::WHITE));
    let text = match canvas.value_at(index) {
        Some(value) => format!("Ch {} | {:.1} uV p-p", index + 1, value),
        None => format!("Cell {} (inactive)", index + 1),
    };
    egui::show_tooltip_text(ui.ctx(), egui::Id::new("grid_cell_tooltip"), text);
}
