use anyhow::Result;
use arsedit::coords::View;
use arsedit::interpolator::InterpMethod;
use arsedit::render::{Overlay, TextureAllocator};
use arsedit::{ResourceError, Session};
use std::rc::Rc;

pub struct EditorSettings {
    pub interpolation: InterpMethod,
    pub overlay: Overlay,
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            interpolation: InterpMethod::Nearest,
            overlay: Overlay::Dark,
            window_size: [1200.0, 800.0],
            min_window_size: [800.0, 600.0],
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Shortcut {
    pub key: egui::Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Shortcut {
    pub fn new(key: egui::Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(mut self, value: bool) -> Self {
        self.ctrl = value;
        self
    }

    pub fn shift(mut self, value: bool) -> Self {
        self.shift = value;
        self
    }

    pub fn alt(mut self, value: bool) -> Self {
        self.alt = value;
        self
    }

    pub fn matches(&self, i: &egui::InputState) -> bool {
        i.key_pressed(self.key)
            && i.modifiers.ctrl == self.ctrl
            && i.modifiers.shift == self.shift
            && i.modifiers.alt == self.alt
    }

    pub fn format(&self) -> String {
        let mut s = String::new();
        if self.ctrl {
            s.push_str("Ctrl+");
        }
        if self.shift {
            s.push_str("Shift+");
        }
        if self.alt {
            s.push_str("Alt+");
        }
        s.push_str(&format!("{:?}", self.key));
        s
    }
}

pub struct Keybindings {
    pub open: Shortcut,
    pub save: Shortcut,
    pub undo: Shortcut,
    pub redo: Shortcut,
    pub copy: Shortcut,
    pub cut: Shortcut,
    pub confirm: Shortcut,
    pub cancel: Shortcut,
    pub zoom_in: Shortcut,
    pub zoom_out: Shortcut,
    pub reset_zoom: Shortcut,
    pub mirror_horizontal: Shortcut,
    pub mirror_vertical: Shortcut,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            open: Shortcut::new(egui::Key::O).ctrl(true),
            save: Shortcut::new(egui::Key::S).ctrl(true),
            undo: Shortcut::new(egui::Key::Z).ctrl(true),
            redo: Shortcut::new(egui::Key::Z).ctrl(true).shift(true),
            copy: Shortcut::new(egui::Key::C).ctrl(true),
            cut: Shortcut::new(egui::Key::X).ctrl(true),
            confirm: Shortcut::new(egui::Key::Enter),
            cancel: Shortcut::new(egui::Key::Escape),
            zoom_in: Shortcut::new(egui::Key::Plus).ctrl(true),
            zoom_out: Shortcut::new(egui::Key::Minus).ctrl(true),
            reset_zoom: Shortcut::new(egui::Key::Num0).ctrl(true),
            mirror_horizontal: Shortcut::new(egui::Key::H).alt(true),
            mirror_vertical: Shortcut::new(egui::Key::V).alt(true),
        }
    }
}

pub struct AppState {
    pub session: Session,
    pub settings: EditorSettings,
    pub keybindings: Keybindings,
    pub status: String,
}

impl AppState {
    pub fn new(allocator: Rc<dyn TextureAllocator>, settings: EditorSettings) -> Result<Self, ResourceError> {
        let [width, height] = settings.window_size;
        let session = Session::new(
            allocator,
            settings.overlay,
            settings.interpolation,
            View::new(width, height, 1.0),
        )?;
        Ok(Self {
            session,
            settings,
            keybindings: Keybindings::default(),
            status: String::new(),
        })
    }

    /// Runs an editing action and reports how it went in the status line.
    pub fn run(&mut self, action: &str, f: impl FnOnce(&mut Session) -> Result<bool>) {
        match f(&mut self.session) {
            Ok(true) => self.status = format!("{action} done"),
            Ok(false) => self.status = format!("{action}: nothing to do"),
            Err(e) => {
                log::error!("{} failed: {:#}", action, e);
                self.status = format!("{action} failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_format_their_modifiers() {
        let keys = Keybindings::default();
        assert_eq!(keys.mirror_horizontal.format(), "Alt+H");
        assert_eq!(keys.redo.format(), "Ctrl+Shift+Z");
        assert!(keys.mirror_vertical.alt && !keys.mirror_vertical.ctrl);
    }
}
