//! Commands the host can send to the frame driver and its clock.
//!
//! The pipeline never listens for input itself. The host decides which
//! events become [`Command`]s. Clock commands go to
//! [`SimClock::handle`](crate::SimClock::handle); everything else goes to
//! [`FrameDriver::apply`](crate::FrameDriver::apply).

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Axis hints the reference keyboard layout exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NudgeDirection {
    PositiveZ,
    PositiveX,
    NegativeZ,
}

/// A request to the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Restart the simulation from the initial field.
    Reset,
    /// Acknowledged and logged; changes no state.
    Nudge(NudgeDirection),
    /// Freeze or resume the simulation clock.
    TogglePause,
    /// Halve the clock's time scale.
    SlowDown,
    /// Double the clock's time scale.
    SpeedUp,
}

/// Default key bindings: P resets, Up/Right/Down nudge, Space pauses,
/// `[` and `]` change speed.
pub fn command_for_key(key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::KeyP => Some(Command::Reset),
        KeyCode::ArrowUp => Some(Command::Nudge(NudgeDirection::PositiveZ)),
        KeyCode::ArrowRight => Some(Command::Nudge(NudgeDirection::PositiveX)),
        KeyCode::ArrowDown => Some(Command::Nudge(NudgeDirection::NegativeZ)),
        KeyCode::Space => Some(Command::TogglePause),
        KeyCode::BracketLeft => Some(Command::SlowDown),
        KeyCode::BracketRight => Some(Command::SpeedUp),
        _ => None,
    }
}

/// Command for a keyboard event, on press only. Auto-repeat is ignored.
pub fn command_for_event(event: &KeyEvent) -> Option<Command> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(key) => command_for_key(key),
        PhysicalKey::Unidentified(_) => None,
    }
}
