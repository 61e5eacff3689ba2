use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::format_usd;

use super::super::physics::step_layout;
use super::super::render_utils::{
    blend_color, category_color, dim_color, draw_background, edge_visible, link_width,
    world_to_screen,
};
use super::super::{ALPHA_DECAY, ALPHA_MIN, RenderGraph, SearchMatchCache, ViewModel};

const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(92, 98, 108, 170);
const MAIN_LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(186, 156, 92, 210);
const SELECTION_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const SEARCH_MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    /// Fuzzy search over node labels and ids, cached per query and render
    /// graph generation so typing does not re-run the matcher every frame.
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            self.search_match_cache = None;
            return None;
        }

        if let Some(cache) = &self.search_match_cache
            && cache.query == query
            && cache.graph_revision == self.render_graph_revision
        {
            return Some(Arc::clone(&cache.matches));
        }

        let graph = self.graph_cache.as_ref()?;
        let matcher = SkimMatcherV2::default().ignore_case();
        let matches = graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                matcher
                    .fuzzy_match(&node.label, query)
                    .or_else(|| matcher.fuzzy_match(&node.id, query))
                    .map(|_| index)
            })
            .collect::<HashSet<_>>();

        let matches = Arc::new(matches);
        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    fn update_screen_space(rect: Rect, pan: egui::Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.world_pos));
            // Radii grow sub-linearly with zoom so dense graphs stay legible
            // when zoomed out.
            scratch
                .screen_radii
                .push((node.base_radius * zoom.powf(0.40)).clamp(2.5, 40.0));
        }
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.store.revision() != self.rendered_revision {
            self.graph_dirty = true;
        }
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_graph_zoom(ui, rect, &response);
        let node_drag_active = self.handle_node_drag(rect, &response);
        self.handle_graph_pan(&response, node_drag_active);

        draw_background(&painter, rect, self.pan, self.zoom);

        let search_matches = self.cached_search_matches();
        let pan = self.pan;
        let zoom = self.zoom;
        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let config = self.layout_config(delta_seconds);

        // The simulation energy relaxes toward its target every frame; a
        // restart snaps it to 1.0 and a node drag holds it partway up.
        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;

        let Some(cache) = self.graph_cache.as_mut() else {
            self.visible_node_count = 0;
            self.visible_link_count = 0;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "Enter an address to fetch its transfer graph",
                FontId::proportional(15.0),
                Color32::from_gray(130),
            );
            return;
        };

        let mut layout_moving = false;
        if self.live_physics && self.alpha > ALPHA_MIN {
            layout_moving = step_layout(cache, &config, self.alpha);
        }

        Self::update_screen_space(rect, pan, zoom, cache);
        {
            let scratch = &mut cache.view_scratch;
            let (positions, radii) = (&scratch.screen_positions, &scratch.screen_radii);
            let mut visible = std::mem::take(&mut scratch.visible_indices);
            Self::collect_visible_indices(rect, positions, radii, &mut visible);
            scratch.visible_indices = visible;
        }
        self.visible_node_count = cache.view_scratch.visible_indices.len();

        let hovered = Self::hovered_index(
            ui,
            &cache.view_scratch.visible_indices,
            &cache.view_scratch.screen_positions,
            &cache.view_scratch.screen_radii,
        );
        let hovered_index = hovered.map(|(index, _)| index);
        if hovered_index.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        // Clicks are resolved after the cache borrow ends. The outer Option
        // marks that a click happened at all, the inner one what it hit.
        let clicked_node = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered_index.map(|index| cache.nodes[index].id.clone()));
        let focused_node = response
            .double_clicked_by(egui::PointerButton::Primary)
            .then(|| hovered_index.map(|index| cache.nodes[index].id.clone()))
            .flatten();

        let mut drawn_links = 0usize;
        for link in &cache.links {
            if link.source >= cache.nodes.len() || link.target >= cache.nodes.len() {
                continue;
            }
            let start = cache.view_scratch.screen_positions[link.source];
            let end = cache.view_scratch.screen_positions[link.target];
            if !edge_visible(rect, start, end, 3.0) {
                continue;
            }

            let main_to_main =
                cache.nodes[link.source].is_main && cache.nodes[link.target].is_main;
            let color = if main_to_main { MAIN_LINK_COLOR } else { LINK_COLOR };
            painter.line_segment(
                [start, end],
                Stroke::new(link_width(link.usdt_amount, zoom), color),
            );
            drawn_links += 1;

            if zoom > 1.2 {
                let midpoint = start + ((end - start) * 0.5);
                painter.text(
                    midpoint,
                    Align2::CENTER_BOTTOM,
                    format_usd(link.usdt_amount),
                    FontId::proportional(10.0),
                    Color32::from_gray(168),
                );
            }
        }
        self.visible_link_count = drawn_links;

        let search_active = search_matches.is_some();
        // Two passes so main nodes always paint over their neighbors.
        for main_pass in [false, true] {
            for &index in &cache.view_scratch.visible_indices {
                let node = &cache.nodes[index];
                if node.is_main != main_pass {
                    continue;
                }

                let position = cache.view_scratch.screen_positions[index];
                let radius = cache.view_scratch.screen_radii[index];
                let is_selected = self.selected.as_deref() == Some(node.id.as_str());
                let is_hovered = hovered_index == Some(index);
                let is_match = search_matches
                    .as_ref()
                    .is_some_and(|matches| matches.contains(&index));

                let mut fill = category_color(node.category);
                if is_match {
                    fill = blend_color(fill, SEARCH_MATCH_COLOR, 0.55);
                } else if search_active {
                    fill = dim_color(fill, 0.40);
                }
                if is_hovered {
                    fill = blend_color(fill, Color32::WHITE, 0.22);
                }
                if node.is_grouped {
                    fill = dim_color(fill, 0.75);
                }

                painter.circle_filled(position, radius, fill);
                painter.circle_stroke(
                    position,
                    radius,
                    Stroke::new(
                        if node.is_main { 1.8 } else { 1.0 },
                        Color32::from_rgba_premultiplied(10, 12, 15, 200),
                    ),
                );
                if node.is_grouped {
                    painter.circle_stroke(
                        position,
                        radius + 3.5,
                        Stroke::new(1.4, blend_color(fill, Color32::WHITE, 0.35)),
                    );
                }
                if is_selected {
                    painter.circle_stroke(
                        position,
                        radius + 5.0,
                        Stroke::new(1.6, SELECTION_COLOR),
                    );
                }

                let labelled =
                    node.is_main || is_hovered || is_selected || is_match || zoom > 1.35;
                if labelled {
                    painter.text(
                        position + vec2(radius + 5.0, 0.0),
                        Align2::LEFT_CENTER,
                        &node.label,
                        FontId::proportional(12.0),
                        Color32::from_gray(232),
                    );
                }
            }
        }

        if let Some(index) = hovered_index {
            let node = &cache.nodes[index];
            let incident = cache
                .links
                .iter()
                .filter(|link| link.source == index || link.target == index)
                .count();
            painter.text(
                rect.left_top() + vec2(10.0, 8.0),
                Align2::LEFT_TOP,
                format!(
                    "{} | {} | {} | {} transfer(s)",
                    node.label,
                    node.category.label(),
                    format_usd(node.usdt_balance),
                    incident
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if layout_moving || node_drag_active {
            ui.ctx().request_repaint();
        }

        if let Some(hit) = clicked_node {
            match hit {
                Some(id) => {
                    self.selected = Some(id.clone());
                    // egui reports a plain click for each press of a
                    // double-click pair, so the pair toggles grouping twice
                    // and nets out before the double-click handler runs.
                    if self.is_main(&id) {
                        self.toggle_group(&id);
                    }
                }
                None => self.selected = None,
            }
        }
        if let Some(id) = focused_node {
            self.focus_address(&id);
        }

        self.sync_positions();
    }
}
