//! Editor configuration, read from an optional JSON file.

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// World units per second along the keyframe path.
    pub speed: f32,
    pub frame_rate: u32,
    /// Accumulation passes rendered before a frame is captured.
    pub frame_passes: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            frame_rate: 24,
            frame_passes: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    /// Radians per pixel of cursor travel.
    pub mouse_sensitivity: f32,
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    pub animation: AnimationConfig,
    pub output_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            screen_width: 1920,
            screen_height: 1080,
            mouse_sensitivity: 0.002,
            move_speed: 1.0,
            sprint_multiplier: 5.0,
            animation: AnimationConfig::default(),
            output_dir: PathBuf::from("render_output"),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` if given, falling back to defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                let config: Self = serde_json::from_str(&json)?;
                log::info!("loaded config from {}", path.display());
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "screen size {}x{} must be non-zero",
                self.screen_width, self.screen_height
            )));
        }
        if self.animation.frame_passes == 0 {
            return Err(ConfigError::Invalid("frame_passes must be at least 1".into()));
        }
        let tuning = [
            ("mouse_sensitivity", self.mouse_sensitivity),
            ("move_speed", self.move_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("animation.speed", self.animation.speed),
        ];
        for (name, value) in tuning {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite", name)));
            }
        }
        Ok(())
    }

    pub fn screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    pub fn animation_speed(mut self, speed: f32) -> Self {
        self.animation.speed = speed;
        self
    }

    pub fn frame_rate(mut self, rate: u32) -> Self {
        self.animation.frame_rate = rate;
        self
    }

    pub fn frame_passes(mut self, passes: u32) -> Self {
        self.animation.frame_passes = passes;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!((config.screen_width, config.screen_height), (1920, 1080));
        assert_eq!(config.animation, AnimationConfig { speed: 1.0, frame_rate: 24, frame_passes: 16 });
        assert_eq!(config.output_dir, PathBuf::from("render_output"));
        assert!(config.validate().is_ok());
        assert!(EditorConfig::load(None).is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let json = r#"{ "screen_width": 640, "animation": { "frame_passes": 4 } }"#;
        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.screen_width, 640);
        assert_eq!(config.screen_height, 1080);
        assert_eq!(config.animation.frame_passes, 4);
        assert_eq!(config.animation.frame_rate, 24);
    }

    #[test]
    fn builder_and_validation() {
        let config = EditorConfig::new().screen_size(320, 0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EditorConfig::new().frame_passes(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EditorConfig {
            move_speed: f32::INFINITY,
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EditorConfig::new()
            .screen_size(200, 100)
            .animation_speed(2.0)
            .frame_rate(30)
            .output_dir("frames");
        assert!(config.validate().is_ok());
        assert_eq!(config.animation.speed, 2.0);
        assert_eq!(config.output_dir, PathBuf::from("frames"));
    }

    #[test]
    fn load_from_file() {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("raystage_config_{}_{}.json", std::process::id(), nonce));
        std::fs::write(&path, r#"{ "output_dir": "frames", "move_speed": 3.0 }"#).unwrap();

        let config = EditorConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.output_dir, PathBuf::from("frames"));
        assert_eq!(config.move_speed, 3.0);
    }
}
