use crate::scene::SceneStore;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_scene_to_file(scene: &SceneStore, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Loads a scene. The returned store has its changed latch set so the renderer rebinds.
///
/// Lights beyond the renderer capacity are kept, with the same warning `add_light` gives.
pub fn load_scene_from_file(path: &Path) -> Result<SceneStore> {
    let json = std::fs::read_to_string(path)?;
    let mut scene: SceneStore = serde_json::from_str(&json)?;
    scene.check_light_capacity();
    scene.mark_changed();
    Ok(scene)
}
