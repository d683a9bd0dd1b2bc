use crate::animation::KeyframeSlot;
use crate::render::{CameraMovement, CameraPose};
use crate::scene::SceneEdit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    W,
    A,
    S,
    D,
    E,
    F,
    Space,
    LeftShift,
    LeftControl,
    Escape,
}

/// Host input delivered to the editor. Cursor positions are in pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    KeyPressed { key: Key },
    KeyReleased { key: Key },
    /// Raw pointer motion, used for looking around while the mouse is captured.
    MouseMotion { dx: f32, dy: f32 },
    /// Left button press at the given cursor position.
    MouseClicked { x: f32, y: f32 },
    Resized { width: u32, height: u32 },
    /// Stores the live camera pose as keyframe A or B.
    CaptureKeyframe { slot: KeyframeSlot },
    ClearKeyframes,
    /// Path speed in units per second, output frame rate and passes per frame.
    AnimationTiming {
        speed: f32,
        frame_rate: u32,
        frame_passes: u32,
    },
    StartAnimation,
    /// Jumps the camera, e.g. to restore a saved view.
    SetCameraPose { pose: CameraPose },
    /// Settings panel edit of a primitive, light, the plane or the render settings.
    EditScene { edit: SceneEdit },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Select,
    Place,
}

/// Keys currently held down.
#[derive(Default, Debug, Clone, Copy)]
pub struct InputState {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub sprint: bool,
    pub place_modifier: bool,
    pub debug_key: bool,
}

impl InputState {
    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        match key {
            Key::W => self.move_forward = pressed,
            Key::S => self.move_backward = pressed,
            Key::A => self.move_left = pressed,
            Key::D => self.move_right = pressed,
            Key::Space => self.move_up = pressed,
            Key::LeftShift => self.move_down = pressed,
            Key::LeftControl => self.sprint = pressed,
            Key::E => self.place_modifier = pressed,
            Key::F => self.debug_key = pressed,
            Key::Escape => {}
        }
    }

    pub fn shift_held(&self) -> bool {
        self.move_down
    }

    pub fn movement(&self) -> CameraMovement {
        CameraMovement {
            move_forward: self.move_forward,
            move_backward: self.move_backward,
            move_left: self.move_left,
            move_right: self.move_right,
            move_up: self.move_up,
            move_down: self.move_down,
            sprint: self.sprint,
        }
    }

    /// A click places a primitive while E is held and selects otherwise.
    pub fn click_action(&self) -> ClickAction {
        if self.place_modifier {
            ClickAction::Place
        } else {
            ClickAction::Select
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_movement() {
        let mut input = InputState::default();
        input.handle_key(Key::W, true);
        input.handle_key(Key::LeftControl, true);
        input.handle_key(Key::LeftShift, true);
        let movement = input.movement();
        assert!(movement.move_forward && movement.sprint && movement.move_down);
        assert!(input.shift_held());

        input.handle_key(Key::W, false);
        assert!(!input.movement().move_forward);
    }

    #[test]
    fn place_modifier_switches_click_action() {
        let mut input = InputState::default();
        assert_eq!(input.click_action(), ClickAction::Select);
        input.handle_key(Key::E, true);
        assert_eq!(input.click_action(), ClickAction::Place);
    }

    #[test]
    fn events_use_tagged_json() {
        let events: Vec<InputEvent> = serde_json::from_str(
            r#"[
                { "event": "key_pressed", "key": "left_shift" },
                { "event": "mouse_clicked", "x": 10.0, "y": 20.0 },
                { "event": "capture_keyframe", "slot": "b" },
                { "event": "start_animation" },
                { "event": "edit_scene", "edit": { "set": "sphere_radius", "index": 1, "radius": 0.5 } },
                { "event": "set_camera_pose", "pose": { "position": [0.0, 2.0, 5.0], "yaw": 0.1, "pitch": 0.3 } }
            ]"#,
        )
        .unwrap();
        assert_eq!(events[0], InputEvent::KeyPressed { key: Key::LeftShift });
        assert_eq!(events[1], InputEvent::MouseClicked { x: 10.0, y: 20.0 });
        assert_eq!(events[2], InputEvent::CaptureKeyframe { slot: KeyframeSlot::B });
        assert_eq!(events[3], InputEvent::StartAnimation);
        assert_eq!(
            events[4],
            InputEvent::EditScene {
                edit: SceneEdit::SphereRadius { index: 1, radius: 0.5 },
            }
        );
        assert_eq!(
            events[5],
            InputEvent::SetCameraPose {
                pose: CameraPose::new(glam::Vec3::new(0.0, 2.0, 5.0), 0.1, 0.3),
            }
        );
    }
}
