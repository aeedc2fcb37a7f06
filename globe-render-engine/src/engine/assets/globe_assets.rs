use crate::engine::assets::scene_manifest::SceneManifest;
use bevy::prelude::*;
use std::collections::HashMap;

/// Every image the scene asked for, keyed by asset path. A path is handed to the
/// loader at most once; later requests reuse the first handle.
#[derive(Resource, Default, Debug)]
pub struct TextureCatalog {
    handles: HashMap<String, Handle<Image>>,
    order: Vec<String>,
}

impl TextureCatalog {
    pub fn request(
        &mut self,
        path: &str,
        mut load: impl FnMut(&str) -> Handle<Image>,
    ) -> Handle<Image> {
        if let Some(handle) = self.handles.get(path) {
            return handle.clone();
        }
        let handle = load(path);
        self.handles.insert(path.to_string(), handle.clone());
        self.order.push(path.to_string());
        handle
    }

    pub fn get(&self, path: &str) -> Option<&Handle<Image>> {
        self.handles.get(path)
    }

    /// Requested paths in first-request order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Handle<Image>)> {
        self.order
            .iter()
            .filter_map(|path| self.handles.get(path).map(|handle| (path.as_str(), handle)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Diffuse,
    Roughness,
    Displacement,
    Alpha,
    Background,
}

impl TextureRole {
    pub const ALL: [TextureRole; 5] = [
        TextureRole::Diffuse,
        TextureRole::Roughness,
        TextureRole::Displacement,
        TextureRole::Alpha,
        TextureRole::Background,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextureRole::Diffuse => "diffuse",
            TextureRole::Roughness => "roughness",
            TextureRole::Displacement => "displacement",
            TextureRole::Alpha => "alpha",
            TextureRole::Background => "background",
        }
    }

    fn path(self, manifest: &SceneManifest) -> Option<&str> {
        let textures = &manifest.textures;
        match self {
            TextureRole::Diffuse => textures.diffuse.as_deref(),
            TextureRole::Roughness => textures.roughness.as_deref(),
            TextureRole::Displacement => textures.displacement.as_deref(),
            TextureRole::Alpha => textures.alpha.as_deref(),
            TextureRole::Background => textures.background.as_deref(),
        }
    }
}

/// Handles the scene builder reads, one per texture role, plus the images
/// derived from them once loading settles.
#[derive(Resource, Default, Debug, Clone)]
pub struct GlobeTextures {
    pub diffuse: Option<Handle<Image>>,
    pub roughness: Option<Handle<Image>>,
    pub displacement: Option<Handle<Image>>,
    pub alpha: Option<Handle<Image>>,
    pub background: Option<Handle<Image>>,
    /// Map for waypoint markers. Shares the globe's diffuse path.
    pub marker: Option<Handle<Image>>,
    /// Diffuse with the alpha map baked into its alpha channel.
    pub diffuse_with_alpha: Option<Handle<Image>>,
    /// Roughness repacked into the green channel of a linear image.
    pub metallic_roughness: Option<Handle<Image>>,
}

impl GlobeTextures {
    /// Request every path the manifest declares through the catalog.
    pub fn request_all(
        manifest: &SceneManifest,
        catalog: &mut TextureCatalog,
        mut load: impl FnMut(&str) -> Handle<Image>,
    ) -> Self {
        for path in manifest.declared_texture_paths() {
            catalog.request(path, &mut load);
        }

        let mut textures = Self::default();
        for role in TextureRole::ALL {
            let handle = role.path(manifest).and_then(|path| catalog.get(path)).cloned();
            *textures.slot_mut(role) = handle;
        }
        if !manifest.waypoints.markers.is_empty() {
            textures.marker = textures.diffuse.clone();
        }
        textures
    }

    pub fn get(&self, role: TextureRole) -> Option<&Handle<Image>> {
        match role {
            TextureRole::Diffuse => self.diffuse.as_ref(),
            TextureRole::Roughness => self.roughness.as_ref(),
            TextureRole::Displacement => self.displacement.as_ref(),
            TextureRole::Alpha => self.alpha.as_ref(),
            TextureRole::Background => self.background.as_ref(),
        }
    }

    /// Forget a texture that failed to load; the scene is built without it.
    pub fn drop_failed(&mut self, failed: &Handle<Image>) {
        for role in TextureRole::ALL {
            let slot = self.slot_mut(role);
            if slot.as_ref() == Some(failed) {
                *slot = None;
            }
        }
        if self.marker.as_ref() == Some(failed) {
            self.marker = None;
        }
    }

    fn slot_mut(&mut self, role: TextureRole) -> &mut Option<Handle<Image>> {
        match role {
            TextureRole::Diffuse => &mut self.diffuse,
            TextureRole::Roughness => &mut self.roughness,
            TextureRole::Displacement => &mut self.displacement,
            TextureRole::Alpha => &mut self.alpha,
            TextureRole::Background => &mut self.background,
        }
    }
}
