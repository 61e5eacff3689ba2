use eframe::egui::{self, Key, RichText, Slider, TextEdit, Ui};

use crate::util::{normalize_address, short_address};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.add_space(6.0);
        ui.heading("Fetch");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            let input = ui.add(
                TextEdit::singleline(&mut self.address_input)
                    .hint_text("0x…")
                    .desired_width(220.0),
            );
            if input.changed() {
                self.address_input = normalize_address(&self.address_input);
            }

            let submitted =
                input.lost_focus() && ui.input(|state| state.key_pressed(Key::Enter));
            let fetchable = self.address_input.len() > 2;
            if (submitted || ui.button("Fetch").clicked()) && fetchable {
                let address = self.address_input.clone();
                self.focus_address(&address);
            }
        });

        ui.add_space(8.0);
        ui.separator();
        ui.heading("Search");
        ui.add_space(4.0);
        ui.add(
            TextEdit::singleline(&mut self.search)
                .hint_text("name or address")
                .desired_width(f32::INFINITY),
        );

        ui.add_space(8.0);
        ui.separator();
        ui.heading("Main addresses");
        ui.add_space(4.0);

        if self.main_addresses.is_empty() {
            ui.label(RichText::new("No address focused yet.").weak());
        }

        // Row actions are deferred so the list borrow ends before mutation.
        let mut toggle_grouped = None;
        let mut select = None;
        for address in &self.main_addresses {
            ui.horizontal(|ui| {
                let mut grouped = self.grouped.contains(address);
                if ui.checkbox(&mut grouped, "").on_hover_text("group").changed() {
                    toggle_grouped = Some(address.clone());
                }

                let selected = self.selected.as_deref() == Some(address.as_str());
                if ui
                    .selectable_label(selected, short_address(address))
                    .clicked()
                {
                    select = Some(address.clone());
                }
            });
        }
        if let Some(address) = toggle_grouped {
            self.toggle_group(&address);
        }
        if let Some(address) = select {
            self.selected = Some(address);
        }

        ui.add_space(8.0);
        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics");
        ui.checkbox(&mut self.show_fps_bar, "Show frame stats");

        egui::CollapsingHeader::new("Physics tuning")
            .default_open(false)
            .show(ui, |ui| {
                let mut changed = false;
                changed |= ui
                    .add(Slider::new(&mut self.physics_intensity, 0.2..=2.5).text("intensity"))
                    .changed();
                changed |= ui
                    .add(Slider::new(&mut self.physics_repulsion, 0.25..=2.6).text("repulsion"))
                    .changed();
                changed |= ui
                    .add(Slider::new(&mut self.physics_spring, 0.2..=2.2).text("spring"))
                    .changed();
                changed |= ui
                    .add(
                        Slider::new(&mut self.physics_velocity_damping, 0.78..=0.97)
                            .text("damping"),
                    )
                    .changed();
                changed |= ui
                    .add(Slider::new(&mut self.physics_x_pull, 0.0..=0.2).text("x pull"))
                    .changed();
                changed |= ui
                    .add(Slider::new(&mut self.physics_y_pull, 0.0..=0.2).text("y pull"))
                    .changed();

                if changed {
                    self.restart_layout();
                }
            });
    }
}
