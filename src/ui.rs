use crate::state::{AppState, EditorSettings};
use arsedit::buffer::PixelBuffer;
use arsedit::color::ColorSliders;
use arsedit::display::LayerId;
use arsedit::geometry::IPoint;
use arsedit::interpolator::InterpMethod;
use arsedit::render::{Overlay, TextureAllocator, TextureId};
use arsedit::ResourceError;
use eframe::egui::{
    self, epaint::Vertex, Color32, Context, Mesh, Painter, PointerButton, Pos2, Rect, Sense, Shape,
    TextureOptions, Ui, Vec2,
};
use eframe::Frame;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const BUTTONS: [PointerButton; 3] = [PointerButton::Primary, PointerButton::Secondary, PointerButton::Middle];
const IMAGE_FILTER: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Layer textures live in the egui texture manager; dropping the handle
/// frees them.
pub struct EguiTextures {
    ctx: Context,
    next_id: Cell<u64>,
    handles: RefCell<HashMap<TextureId, egui::TextureHandle>>,
}

impl EguiTextures {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            next_id: Cell::new(0),
            handles: RefCell::new(HashMap::new()),
        }
    }

    fn egui_id(&self, id: TextureId) -> Option<egui::TextureId> {
        self.handles.borrow().get(&id).map(egui::TextureHandle::id)
    }
}

impl TextureAllocator for EguiTextures {
    fn allocate(&self, name: &str, image: &PixelBuffer) -> Result<TextureId, ResourceError> {
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            &image.to_rgba_bytes(),
        );
        let handle = self.ctx.load_texture(name, color_image, TextureOptions::NEAREST); // Pixel art friendly

        let id = TextureId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handles.borrow_mut().insert(id, handle);
        Ok(id)
    }

    fn release(&self, id: TextureId) {
        self.handles.borrow_mut().remove(&id);
    }
}

pub struct ArsEditApp {
    state: AppState,
    textures: Rc<EguiTextures>,
    cursor: Option<IPoint>,
}

impl ArsEditApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Result<Self, ResourceError> {
        // Tokyonight Theme
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = Color32::from_rgb(26, 27, 38); // #1a1b26
        visuals.panel_fill = Color32::from_rgb(26, 27, 38);
        visuals.extreme_bg_color = Color32::from_rgb(22, 22, 30);
        cc.egui_ctx.set_visuals(visuals);

        let textures = Rc::new(EguiTextures::new(cc.egui_ctx.clone()));
        let mut state = AppState::new(textures.clone(), EditorSettings::default())?;
        if let Some(path) = initial {
            open_file(&mut state, &path);
        }

        Ok(Self {
            state,
            textures,
            cursor: None,
        })
    }

    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &IMAGE_FILTER)
            .pick_file()
        {
            open_file(&mut self.state, &path);
        }
    }

    fn save_dialog(&mut self) {
        if !self.state.session.editor().store().is_loaded() {
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &IMAGE_FILTER)
            .save_file()
        {
            match self.state.session.save(&path) {
                Ok(()) => self.state.status = format!("Saved {}", path.display()),
                Err(e) => {
                    log::error!("Failed to save: {:#}", e);
                    self.state.status = format!("Failed to save: {e}");
                }
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        let keys = &self.state.keybindings;
        let (mirror_h, mirror_v) = ctx.input(|i| (keys.mirror_horizontal.matches(i), keys.mirror_vertical.matches(i)));
        let (open, save, undo, redo, copy, cut, confirm, cancel, zoom_in, zoom_out, reset_zoom) = ctx.input(|i| {
            (
                keys.open.matches(i),
                keys.save.matches(i),
                keys.undo.matches(i),
                keys.redo.matches(i),
                keys.copy.matches(i),
                keys.cut.matches(i),
                keys.confirm.matches(i),
                keys.cancel.matches(i),
                keys.zoom_in.matches(i),
                keys.zoom_out.matches(i),
                keys.reset_zoom.matches(i),
            )
        });

        if open {
            self.open_dialog();
        }
        if save {
            self.save_dialog();
        }
        if undo {
            self.state.run("Undo", |s| s.undo());
        }
        if redo {
            self.state.run("Redo", |s| s.redo());
        }
        if copy {
            self.state.run("Copy", |s| Ok(s.copy()));
        }
        if cut {
            self.state.run("Cut", |s| s.cut());
        }
        if confirm && self.state.session.has_pending_changes() {
            self.state.run("Confirm", |s| s.confirm());
        }
        if cancel {
            self.state.run("Cancel", |s| s.cancel());
        }
        if mirror_h {
            self.state.run("Mirror", |s| s.mirror(true, false));
        }
        if mirror_v {
            self.state.run("Mirror", |s| s.mirror(false, true));
        }
        if zoom_in {
            self.state.session.zoom_in();
        }
        if zoom_out {
            self.state.session.zoom_out();
        }
        if reset_zoom {
            self.state.session.reset_zoom();
        }
    }

    fn render_toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("ArsEdit");
            ui.separator();

            let keys = &self.state.keybindings;
            let (open, save) = (keys.open.format(), keys.save.format());
            if ui.button("Open").on_hover_text(open).clicked() {
                self.open_dialog();
            }
            if ui.button("Save").on_hover_text(save).clicked() {
                self.save_dialog();
            }

            ui.separator();

            let editor = self.state.session.editor();
            let (can_undo, can_redo) = (editor.can_undo(), editor.can_redo());
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                self.state.run("Undo", |s| s.undo());
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                self.state.run("Redo", |s| s.redo());
            }

            ui.separator();

            let has_image = self.state.session.has_image();
            ui.add_enabled_ui(has_image, |ui| {
                if ui.button("Copy").clicked() {
                    self.state.run("Copy", |s| Ok(s.copy()));
                }
                if ui.button("Cut").clicked() {
                    self.state.run("Cut", |s| s.cut());
                }
                let pending = self.state.session.has_pending_changes();
                if ui.add_enabled(pending, egui::Button::new("Confirm")).clicked() {
                    self.state.run("Confirm", |s| s.confirm());
                }
                if ui.button("Cancel").clicked() {
                    self.state.run("Cancel", |s| s.cancel());
                }

                ui.separator();

                if ui.button("Mirror H").clicked() {
                    self.state.run("Mirror", |s| s.mirror(true, false));
                }
                if ui.button("Mirror V").clicked() {
                    self.state.run("Mirror", |s| s.mirror(false, true));
                }
                if ui.button("Grayscale").clicked() {
                    self.state.run("Grayscale", |s| s.grayscale());
                }

                ui.separator();

                if ui.button("-").clicked() {
                    self.state.session.zoom_out();
                }
                ui.label(format!("{:.0}%", self.state.session.display().zoom() * 100.0));
                if ui.button("+").clicked() {
                    self.state.session.zoom_in();
                }
                if ui.button("Fit").clicked() {
                    self.state.session.reset_zoom();
                }
            });
        });
    }

    fn render_side_panel(&mut self, ui: &mut Ui) {
        ui.heading("Transform");
        let display = self.state.session.display();
        let selected = display.selected().unwrap_or(LayerId::Background);
        let mut angle = display.layer(selected).map_or(0.0, |l| l.rotate());
        if ui
            .add(egui::Slider::new(&mut angle, -180.0..=180.0).text("Rotation"))
            .changed()
        {
            self.state.session.rotate(angle);
        }

        ui.separator();
        ui.heading("Color");
        let mut sliders = *self.state.session.sliders();
        ui.add(egui::Slider::new(&mut sliders.red, 0.0..=1.0).text("Red"));
        ui.add(egui::Slider::new(&mut sliders.green, 0.0..=1.0).text("Green"));
        ui.add(egui::Slider::new(&mut sliders.blue, 0.0..=1.0).text("Blue"));
        ui.add(egui::Slider::new(&mut sliders.brightness, 0.0..=1.0).text("Brightness"));
        ui.add(egui::Slider::new(&mut sliders.contrast, 0.0..=1.0).text("Contrast"));
        if ui.button("Reset colors").clicked() {
            sliders = ColorSliders::default();
        }
        if let Err(e) = self.state.session.set_sliders(sliders) {
            log::error!("color preview failed: {}", e);
        }

        ui.separator();
        ui.heading("Display");
        let mut method = self.state.session.interpolation_method();
        egui::ComboBox::from_label("Interpolation")
            .selected_text(method.label())
            .show_ui(ui, |ui| {
                for m in InterpMethod::all() {
                    ui.selectable_value(&mut method, *m, m.label());
                }
            });
        if method != self.state.session.interpolation_method() {
            self.state.session.set_interpolation_method(method);
            self.state.settings.interpolation = method;
        }

        let mut overlay = self.state.settings.overlay;
        ui.horizontal(|ui| {
            ui.label("Selection:");
            for o in [Overlay::Dark, Overlay::Light] {
                ui.radio_value(&mut overlay, o, o.label());
            }
        });
        if overlay != self.state.settings.overlay {
            match self.state.session.set_overlay(overlay) {
                Ok(()) => self.state.settings.overlay = overlay,
                Err(e) => log::error!("overlay change failed: {}", e),
            }
        }
    }

    fn render_canvas(&mut self, ui: &mut Ui) {
        let canvas_size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(canvas_size, Sense::click_and_drag());
        self.state
            .session
            .display_mut()
            .resize(rect.width().floor(), rect.height().floor());

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_rgb(22, 22, 30));
        self.paint_layers(&painter, rect);

        // Zoom
        if ui.input(|i| i.modifiers.ctrl) {
            let scroll_delta = ui.input(|i| i.raw_scroll_delta.y);
            if scroll_delta > 0.0 {
                self.state.session.zoom_in();
            } else if scroll_delta < 0.0 {
                self.state.session.zoom_out();
            }
        }

        let (pos, modifiers, pressed, released, moved) = ui.input(|i| {
            (
                i.pointer.interact_pos(),
                i.modifiers,
                BUTTONS.map(|b| i.pointer.button_pressed(b)),
                BUTTONS.map(|b| i.pointer.button_released(b)),
                i.pointer.delta() != Vec2::ZERO,
            )
        });

        self.cursor = response.hover_pos().map(|p| to_window(rect, p));

        let Some(pos) = pos else {
            return;
        };
        let win = to_window(rect, pos);
        let session = &mut self.state.session;
        for (k, button) in BUTTONS.into_iter().enumerate() {
            if pressed[k] && rect.contains(pos) {
                session.press(button, win);
            }
            if moved && response.dragged_by(button) {
                session.drag(button, win, modifiers);
            }
            if released[k] {
                session.release();
            }
        }
    }

    /// Draws every layer as a textured quad through the same transform the
    /// hit tests invert.
    fn paint_layers(&self, painter: &Painter, rect: Rect) {
        let session = &self.state.session;
        let display = session.display();
        let view = *display.view();
        let camera = display.camera_translate();
        let aspect = view.aspect();

        let to_screen = |n: Vec2| {
            Pos2::new(
                rect.left() + (n.x / aspect + 1.0) / 2.0 * rect.width(),
                rect.bottom() - (n.y + 1.0) / 2.0 * rect.height(),
            )
        };

        for (id, layer) in display.layers() {
            if layer.width() <= 0 || layer.height() <= 0 {
                continue;
            }
            let Some(texture) = self.textures.egui_id(session.layer_texture(id, layer)) else {
                continue;
            };

            let (w, h) = (layer.width_f(), layer.height_f());
            let corners = [Pos2::new(0.0, 0.0), Pos2::new(w, 0.0), Pos2::new(w, h), Pos2::new(0.0, h)];

            let mut mesh = Mesh::with_texture(texture);
            for (corner, uv) in corners.into_iter().zip(layer.quad().corners) {
                mesh.vertices.push(Vertex {
                    pos: to_screen(layer.normalized_from_layer_coord(&view, corner) + camera),
                    uv,
                    color: Color32::WHITE,
                });
            }
            mesh.add_triangle(0, 1, 2);
            mesh.add_triangle(0, 2, 3);
            painter.add(Shape::mesh(mesh));
        }
    }

    fn render_status(&self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if let Some(image) = self.state.session.editor().current_image() {
                ui.label(format!("{} x {}", image.width(), image.height()));
                ui.separator();
            }
            if let Some(p) = self.cursor.and_then(|c| self.state.session.cursor_layer_coord(c)) {
                ui.label(format!("x: {}  y: {}", p.x, p.y));
                ui.separator();
            }
            ui.label(self.state.status.as_str());
        });
    }
}

/// Canvas-relative position with the origin at the top-left corner.
fn to_window(rect: Rect, pos: Pos2) -> IPoint {
    IPoint::new((pos.x - rect.left()).floor() as i32, (pos.y - rect.top()).floor() as i32)
}

fn open_file(state: &mut AppState, path: &Path) {
    match state.session.open(path) {
        Ok(()) => state.status = format!("Opened {}", path.display()),
        Err(e) => {
            log::error!("Failed to open: {:#}", e);
            state.status = format!("Failed to open: {e}");
        }
    }
}

impl eframe::App for ArsEditApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.render_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.render_status(ui);
        });

        egui::SidePanel::right("side_panel")
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                self.render_side_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_canvas(ui);
        });
    }
}
