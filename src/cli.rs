use crate::render::camera::CameraPose;
use crate::scene::procedural::Preset;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by env_logger.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    Basic,
    Mirror,
    Random,
}

#[derive(Debug, Parser)]
#[command(name = "raystage")]
#[command(about = "Headless scene editor and keyframe animation exporter for a ray traced renderer")]
pub struct Args {
    /// Scene file to start from (JSON). Overrides --preset.
    #[arg(long, global = true)]
    pub scene: Option<PathBuf>,

    /// Built-in scene used when no --scene is given
    #[arg(long, value_enum, default_value = "basic", global = true)]
    pub preset: PresetArg,

    /// Seed for the random preset
    #[arg(long, default_value_t = 0, global = true)]
    pub seed: u64,

    /// Editor configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Image width in pixels, overrides the config
    #[arg(long, global = true)]
    pub width: Option<u32>,

    /// Image height in pixels, overrides the config
    #[arg(long, global = true)]
    pub height: Option<u32>,

    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn preset(&self) -> Preset {
        match self.preset {
            PresetArg::Basic => Preset::Basic,
            PresetArg::Mirror => Preset::MirrorSpheres,
            PresetArg::Random => Preset::RandomSpheres { seed: self.seed },
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render the camera path between two keyframes to numbered PNG files
    Animate {
        /// Keyframe A as x,y,z,yaw,pitch
        #[arg(long, value_parser = parse_pose, allow_hyphen_values = true)]
        from: CameraPose,

        /// Keyframe B as x,y,z,yaw,pitch
        #[arg(long, value_parser = parse_pose, allow_hyphen_values = true)]
        to: CameraPose,

        /// Camera speed in world units per second
        #[arg(long)]
        speed: Option<f32>,

        #[arg(long)]
        frame_rate: Option<u32>,

        /// Accumulation passes per frame
        #[arg(long)]
        passes: Option<u32>,

        /// Directory the frames are written to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Feed a recorded list of input events through the editor loop
    Replay {
        /// JSON file holding an array of input events
        #[arg(long)]
        script: PathBuf,

        /// Write the resulting scene to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

/// Parses `x,y,z,yaw,pitch`.
pub fn parse_pose(value: &str) -> Result<CameraPose, String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|err| format!("'{}': {}", part.trim(), err))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z, yaw, pitch] => Ok(CameraPose::new(Vec3::new(*x, *y, *z), *yaw, *pitch)),
        _ => Err(format!(
            "expected 5 comma separated numbers (x,y,z,yaw,pitch), got {}",
            parts.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pose() {
        let pose = parse_pose("1, 2.5,-3,0.25,-0.5").unwrap();
        assert_eq!(pose.position, Vec3::new(1.0, 2.5, -3.0));
        assert_eq!((pose.yaw, pose.pitch), (0.25, -0.5));
        assert!(parse_pose("1,2,3").is_err());
        assert!(parse_pose("1,2,3,x,0").is_err());
    }

    #[test]
    fn animate_arguments() {
        let args = Args::try_parse_from([
            "raystage",
            "--preset",
            "random",
            "--seed",
            "9",
            "animate",
            "--from",
            "0,1,0,0,0",
            "--to",
            "-4,1,0,1.5,-0.2",
            "--passes",
            "2",
        ])
        .unwrap();
        assert_eq!(args.preset(), Preset::RandomSpheres { seed: 9 });
        assert_eq!(args.log_level, LogLevel::Info);
        match args.command {
            Command::Animate { to, passes, speed, .. } => {
                assert_eq!(to.position, Vec3::new(-4.0, 1.0, 0.0));
                assert_eq!(passes, Some(2));
                assert_eq!(speed, None);
            }
            other => panic!("Expected animate, got {:?}", other),
        }
    }

    #[test]
    fn replay_arguments() {
        let args = Args::try_parse_from([
            "raystage",
            "replay",
            "--script",
            "session.json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.log_level.as_filter(), "debug");
        assert!(matches!(args.command, Command::Replay { save: None, .. }));
    }
}
