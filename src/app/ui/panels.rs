use std::collections::{HashMap, HashSet, VecDeque};

use eframe::egui::{self, Color32, Context, RichText, Vec2};

use crate::api::ApiClient;
use crate::graph::GraphStore;

use super::super::{DragState, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(client: ApiClient) -> Self {
        Self {
            client,
            store: GraphStore::new(),
            rendered_revision: 0,
            main_addresses: Vec::new(),
            grouped: HashSet::new(),
            positions: HashMap::new(),
            pending_fetches: Vec::new(),
            last_error: None,
            address_input: String::new(),
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            drag: DragState::Idle,
            alpha: 0.0,
            alpha_target: 0.0,
            live_physics: true,
            physics_intensity: 1.0,
            physics_repulsion: 1.0,
            physics_spring: 1.0,
            physics_velocity_damping: 0.9,
            physics_x_pull: 0.04,
            physics_y_pull: 0.06,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            search_match_cache: None,
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
            visible_node_count: 0,
            visible_link_count: 0,
        }
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("txgraph");
                ui.separator();
                ui.label(format!(
                    "{} nodes, {} links, {} main",
                    self.store.node_count(),
                    self.store.link_count(),
                    self.main_addresses.len()
                ));
                ui.separator();

                if !self.pending_fetches.is_empty() {
                    ui.spinner();
                    ui.label(format!("{} fetch(es) in flight", self.pending_fetches.len()));
                    ui.separator();
                }

                if ui.button("Clear graph").clicked() {
                    self.clear_graph();
                }

                if let Some(error) = self.last_error.clone() {
                    ui.separator();
                    ui.colored_label(Color32::from_rgb(235, 110, 100), error);
                    if ui.small_button("x").clicked() {
                        self.last_error = None;
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.show_fps_bar {
                        ui.label(RichText::new(self.fps_display_text()).weak());
                        ui.separator();
                        ui.label(RichText::new(self.visible_graph_text()).weak());
                    }
                });
            });
        });

        egui::SidePanel::left("controls")
            .default_width(330.0)
            .show(ctx, |ui| {
                self.draw_controls(ui);
            });

        egui::SidePanel::right("details")
            .default_width(340.0)
            .show(ctx, |ui| {
                self.draw_details(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_graph(ui);
        });
    }
}
