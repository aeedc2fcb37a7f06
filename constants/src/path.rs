/// Directory (relative to the asset root) holding the scene manifests.
pub const SCENE_MANIFEST_DIR: &str = "scenes";

/// Scene loaded when no valid `?scene=` query is present.
pub const DEFAULT_SCENE: &str = "earth";

/// Every scene manifest shipped under `assets/scenes`.
pub const KNOWN_SCENES: &[&str] = &["earth", "waypoints"];

/// DOM selector of the canvas the renderer draws into on wasm.
pub const CANVAS_SELECTOR: &str = "#canvas";

/// Full-screen scalable ambient occlusion shader.
pub const SAO_SHADER_PATH: &str = "shaders/sao_postprocess.wgsl";

/// Manifest path for a scene name, e.g. `scenes/earth.scene.json`.
pub fn scene_manifest_path(scene: &str) -> String {
    format!("{}/{}.scene.json", SCENE_MANIFEST_DIR, scene)
}
