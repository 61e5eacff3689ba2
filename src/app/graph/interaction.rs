use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::{DRAG_ALPHA_TARGET, DragState, ViewModel};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Background pan. Secondary/middle always pans; primary pans only while
    /// no node drag claimed the gesture.
    pub(in crate::app) fn handle_graph_pan(
        &mut self,
        response: &egui::Response,
        node_drag_active: bool,
    ) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || (response.dragged_by(egui::PointerButton::Primary) && !node_drag_active)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Node dragging: pin the grabbed node to the pointer and hold the
    /// simulation energy up while the drag lasts. Returns whether a node
    /// drag is active this frame. The hit test uses the previous frame's
    /// screen positions, which is at worst one frame stale.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        rect: Rect,
        response: &egui::Response,
    ) -> bool {
        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(cache) = self.graph_cache.as_ref()
        {
            let grabbed = cache
                .view_scratch
                .screen_positions
                .iter()
                .enumerate()
                .filter_map(|(index, position)| {
                    let radius = cache.view_scratch.screen_radii.get(index).copied()?;
                    let distance = position.distance(pointer);
                    (distance <= radius).then_some((index, distance))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((index, _)) = grabbed {
                if matches!(self.drag, DragState::Idle) {
                    self.alpha_target = DRAG_ALPHA_TARGET;
                    self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
                }
                self.drag = DragState::Node { index };
            }
        }

        let DragState::Node { index } = self.drag else {
            return false;
        };

        if response.dragged_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            if let Some(node) = self
                .graph_cache
                .as_mut()
                .and_then(|cache| cache.nodes.get_mut(index))
            {
                node.pinned = Some(world);
                node.world_pos = world;
                node.velocity = Vec2::ZERO;
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            if let Some(node) = self
                .graph_cache
                .as_mut()
                .and_then(|cache| cache.nodes.get_mut(index))
            {
                node.pinned = None;
            }
            self.drag = DragState::Idle;
            self.alpha_target = 0.0;
            return false;
        }

        true
    }

    pub(in crate::app) fn collect_visible_indices(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        out: &mut Vec<usize>,
    ) {
        out.clear();
        for index in 0..screen_positions.len() {
            if circle_visible(rect, screen_positions[index], screen_radii[index]) {
                out.push(index);
            }
        }
    }

    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
