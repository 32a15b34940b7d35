use eframe::egui::Context;

use super::super::ViewModel;

const FPS_SAMPLE_WINDOW: usize = 180;

impl ViewModel {
    pub(in crate::app) fn update_fps_counter(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.record_frame_time(dt);
    }

    fn record_frame_time(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.fps_current = (1.0 / dt).clamp(0.0, 1000.0);
        self.fps_samples.push_back(self.fps_current);
        while self.fps_samples.len() > FPS_SAMPLE_WINDOW {
            self.fps_samples.pop_front();
        }
    }

    pub(in crate::app) fn fps_display_text(&self) -> Option<String> {
        if !self.show_fps_bar || self.fps_samples.is_empty() {
            return None;
        }

        let avg = self.fps_samples.iter().sum::<f32>() / self.fps_samples.len() as f32;
        Some(format!(
            "FPS {:.0} | avg {:.1} | {:.1} ms",
            self.fps_current,
            avg,
            1000.0 / self.fps_current.max(f32::EPSILON)
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::app::ViewModel;
    use crate::config::ViewerConfig;
    use crate::feed::Viewport;

    #[test]
    fn fps_window_is_bounded() {
        let mut model = ViewModel::new(&ViewerConfig::default(), Viewport::new(800.0, 600.0));
        assert_eq!(model.fps_display_text(), None);

        for _ in 0..(super::FPS_SAMPLE_WINDOW + 20) {
            model.record_frame_time(1.0 / 60.0);
        }
        model.record_frame_time(0.0);

        assert_eq!(model.fps_samples.len(), super::FPS_SAMPLE_WINDOW);
        assert_eq!(model.fps_display_text().as_deref(), Some("FPS 60 | avg 60.0 | 16.7 ms"));

        model.show_fps_bar = false;
        assert_eq!(model.fps_display_text(), None);
    }
}
