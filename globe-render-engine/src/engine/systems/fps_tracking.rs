use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use constants::render_settings::FPS_REFRESH_INTERVAL;

/// Smoothed frame rate shown in the parameter panel.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct FpsReadout {
    pub fps: Option<f64>,
}

impl FpsReadout {
    pub fn label(&self) -> String {
        match self.fps {
            Some(fps) => format!("FPS: {fps:.1}"),
            None => "FPS: --".to_string(),
        }
    }
}

pub fn fps_readout_system(
    mut readout: ResMut<FpsReadout>,
    diagnostics: Res<DiagnosticsStore>,
    mut last_refresh: Local<f32>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    // Refresh twice a second so the number stays readable
    if current_time - *last_refresh >= FPS_REFRESH_INTERVAL {
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                readout.fps = Some(value);
                *last_refresh = current_time;
            }
        }
    }
}
