use eframe::egui::Context;

use super::super::ViewModel;

/// Frames kept for the rolling average, about three seconds at 60 fps.
const FPS_SAMPLE_WINDOW: usize = 180;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let delta = ctx.input(|input| input.stable_dt).max(0.000_1);
        self.fps_current = 1.0 / delta;

        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> String {
        let average = if self.fps_samples.is_empty() {
            self.fps_current
        } else {
            self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32
        };
        let frame_ms = if self.fps_current > 0.0 {
            1000.0 / self.fps_current
        } else {
            0.0
        };

        format!("{:.0} fps (avg {average:.0}, {frame_ms:.1} ms)", self.fps_current)
    }

    pub(in crate::app) fn visible_graph_text(&self) -> String {
        format!(
            "{} nodes / {} links on screen",
            self.visible_node_count, self.visible_link_count
        )
    }
}
