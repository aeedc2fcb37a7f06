use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Pending,
    Loaded,
    Failed,
}

impl TextureState {
    pub fn is_settled(self) -> bool {
        !matches!(self, TextureState::Pending)
    }
}

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub manifest_loaded: bool,
    pub textures_settled: bool,
    pub texture_states: Vec<(String, TextureState)>,
    pub textures_configured: bool,
    pub scene_built: bool,
}

impl LoadingProgress {
    pub fn failed_textures(&self) -> impl Iterator<Item = &str> {
        self.texture_states
            .iter()
            .filter(|(_, state)| *state == TextureState::Failed)
            .map(|(path, _)| path.as_str())
    }
}
