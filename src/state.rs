use egui::{Key, KeyboardShortcut, Modifiers};
use image::Rgba;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ToolMode {
    /// No special tool: drags draw freehand strokes.
    #[default]
    None,
    Arrow,
    Crop,
}

impl ToolMode {
    pub const ALL: [ToolMode; 3] = [ToolMode::None, ToolMode::Arrow, ToolMode::Crop];

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::None => "Pen",
            ToolMode::Arrow => "Arrow",
            ToolMode::Crop => "Crop",
        }
    }
}

pub struct EditorSettings {
    /// Fixed size of the display surface the image is letterboxed into.
    pub surface_width: f32,
    pub surface_height: f32,
    /// Brush size in display pixels.
    pub brush_size: f32,
    pub color: Rgba<u8>,
    /// How close (per axis) the pointer must be to grab a crop handle.
    pub handle_tolerance: f32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            surface_width: 800.0,
            surface_height: 600.0,
            brush_size: 4.0,
            color: Rgba([255, 0, 0, 255]),
            handle_tolerance: 6.0,
        }
    }
}

/// What a key press asks the editor to do.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Undo,
    Redo,
    Tool(ToolMode),
    ApplyCrop,
    Cancel,
}

pub struct Keybindings {
    bindings: Vec<(KeyboardShortcut, Command)>,
}

impl Keybindings {
    pub fn shortcut(&self, command: Command) -> Option<&KeyboardShortcut> {
        self.bindings
            .iter()
            .find(|(_, c)| *c == command)
            .map(|(shortcut, _)| shortcut)
    }

    /// Hover hint such as "Ctrl+Z"; empty when the command is unbound.
    pub fn hint(&self, ctx: &egui::Context, command: Command) -> String {
        self.shortcut(command)
            .map(|shortcut| ctx.format_shortcut(shortcut))
            .unwrap_or_default()
    }

    /// Consumes every bound shortcut pressed this frame, in binding order.
    pub fn take_pressed(&self, input: &mut egui::InputState) -> Vec<Command> {
        self.bindings
            .iter()
            .filter(|(shortcut, _)| input.consume_shortcut(shortcut))
            .map(|(_, command)| *command)
            .collect()
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        let plain = |key| KeyboardShortcut::new(Modifiers::NONE, key);
        Self {
            bindings: vec![
                (KeyboardShortcut::new(Modifiers::COMMAND, Key::Z), Command::Undo),
                (KeyboardShortcut::new(Modifiers::COMMAND, Key::Y), Command::Redo),
                (plain(Key::P), Command::Tool(ToolMode::None)),
                (plain(Key::A), Command::Tool(ToolMode::Arrow)),
                (plain(Key::C), Command::Tool(ToolMode::Crop)),
                (plain(Key::Enter), Command::ApplyCrop),
                (plain(Key::Escape), Command::Cancel),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, Keybindings, ToolMode};
    use egui::ModifierNames;

    #[test]
    fn default_bindings_format() {
        let keys = Keybindings::default();
        let label = |command| {
            keys.shortcut(command)
                .map(|s| s.format(&ModifierNames::NAMES, false))
        };
        assert_eq!(label(Command::Undo).as_deref(), Some("Ctrl+Z"));
        assert_eq!(label(Command::Tool(ToolMode::Arrow)).as_deref(), Some("A"));
        assert_eq!(label(Command::ApplyCrop).as_deref(), Some("Enter"));
    }

    #[test]
    fn every_tool_has_a_key() {
        let keys = Keybindings::default();
        for tool in ToolMode::ALL {
            assert!(keys.shortcut(Command::Tool(tool)).is_some(), "{tool:?} unbound");
        }
    }
}
