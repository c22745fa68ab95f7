use arsedit::coords::View;
use arsedit::display::LayerId;
use arsedit::geometry::{IPoint, IRect};
use arsedit::image_store::HISTORY_CAPACITY;
use arsedit::interpolator::InterpMethod;
use arsedit::render::{HeadlessTextures, Overlay};
use arsedit::{Pixel, PixelBuffer, Session};
use egui::{Modifiers, PointerButton};
use std::rc::Rc;

/// Window position of a bottom-left origin pixel in the 600 high canvas.
fn at(x: i32, y: i32) -> IPoint {
    IPoint::new(x, 599 - y)
}

fn numbered(w: u32, h: u32) -> PixelBuffer {
    PixelBuffer::from_fn(w, h, |x, y| Pixel::from_rgba(x as u8, y as u8, 9, 255))
}

/// A session showing a 100x50 image at zoom 2 in an 800x600 canvas.
fn open_session() -> (Rc<HeadlessTextures>, Session, PixelBuffer) {
    let textures = Rc::new(HeadlessTextures::new());
    let mut session = Session::new(
        textures.clone(),
        Overlay::Dark,
        InterpMethod::Nearest,
        View::new(800.0, 600.0, 1.0),
    )
    .unwrap();
    let image = numbered(100, 50);
    session.open_image(image.clone()).unwrap();
    session.display_mut().set_zoom(2.0);
    (textures, session, image)
}

/// Selects image pixels 10..21 in both directions.
fn select(session: &mut Session) {
    assert!(session.press(PointerButton::Primary, at(321, 271)));
    assert!(session.drag(PointerButton::Primary, at(341, 291), Modifiers::SHIFT));
    session.release();
}

/// Drags the selection five image pixels to the right.
fn move_selection(session: &mut Session) {
    assert!(session.press(PointerButton::Primary, at(331, 281)));
    assert_eq!(session.display().selected(), Some(LayerId::Upper));
    assert!(session.drag(PointerButton::Primary, at(341, 281), Modifiers::NONE));
    session.release();
}

#[test]
fn copy_move_confirm_then_undo_and_redo() {
    let (_textures, mut session, image) = open_session();
    select(&mut session);
    assert!(session.copy());
    move_selection(&mut session);

    assert!(session.confirm().unwrap());
    let committed = session.editor().current_image().unwrap().clone();
    for y in 0..50 {
        for x in 0..100 {
            let expected = if (15..26).contains(&x) && (10..21).contains(&y) {
                image.pixel(x - 5, y)
            } else {
                image.pixel(x, y)
            };
            assert_eq!(committed.pixel(x, y), expected, "at ({x}, {y})");
        }
    }
    assert!(session.display().upper().is_none());
    assert_eq!(session.display().background_image(), Some(&committed));

    assert!(session.undo().unwrap());
    assert_eq!(session.display().background_image(), Some(&image));
    assert!(session.redo().unwrap());
    assert_eq!(session.display().background_image(), Some(&committed));
}

#[test]
fn moved_cut_leaves_a_black_hole() {
    let (_textures, mut session, image) = open_session();
    select(&mut session);
    assert!(session.cut().unwrap());
    move_selection(&mut session);
    assert!(session.confirm().unwrap());

    let committed = session.editor().current_image().unwrap();
    assert_eq!(committed.pixel(10, 10), Pixel::BLACK);
    assert_eq!(committed.pixel(14, 20), Pixel::BLACK);
    assert_eq!(committed.pixel(15, 10), image.pixel(10, 10));
    assert_eq!(committed.pixel(25, 20), image.pixel(20, 20));
    assert_eq!(committed.pixel(26, 20), image.pixel(26, 20));
}

#[test]
fn cancelled_cut_changes_nothing() {
    let (textures, mut session, image) = open_session();
    let live_before = textures.live_count();
    select(&mut session);
    assert!(session.cut().unwrap());
    assert_eq!(session.display().background_image().unwrap().pixel(12, 12), Pixel::BLACK);

    assert!(session.cancel().unwrap());
    assert_eq!(session.display().background_image(), Some(&image));
    assert_eq!(session.editor().store().history().unwrap().len(), 1);
    assert_eq!(textures.live_count(), live_before);
}

#[test]
fn rotated_background_confirms_onto_black() {
    let (_textures, mut session, _) = open_session();
    // odd sizes put the rotation centre on a pixel
    let image = numbered(5, 3);
    session.open_image(image.clone()).unwrap();
    session.display_mut().set_zoom(2.0);
    assert!(session.rotate(180.0));
    assert!(session.confirm().unwrap());
    assert_eq!(session.editor().current_image(), Some(&image.mirrored(true, true)));
    assert!(!session.display().has_pending_transform());
}

#[test]
fn history_keeps_the_latest_states() {
    let (_textures, mut session, image) = open_session();
    for _ in 0..12 {
        assert!(session.mirror(true, false).unwrap());
    }
    let history = session.editor().store().history().unwrap();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history.index(), HISTORY_CAPACITY - 1);

    // thirteen states were made; the oldest kept one was mirrored three times
    for _ in 0..20 {
        session.undo().unwrap();
    }
    assert!(!session.editor().can_undo());
    assert_eq!(session.display().background_image(), Some(&image.mirrored(true, false)));
}

#[test]
fn saved_edits_reopen_in_a_new_session() {
    let path = std::env::temp_dir().join(format!("arsedit-session-{}.png", std::process::id()));
    let (_textures, mut session, image) = open_session();
    assert!(session.grayscale().unwrap());
    session.save(&path).unwrap();

    let textures = Rc::new(HeadlessTextures::new());
    let mut reopened = Session::new(textures, Overlay::Light, InterpMethod::Bilinear, View::default()).unwrap();
    reopened.open(&path).unwrap();
    assert_eq!(
        reopened.editor().current_image(),
        Some(&arsedit::color::grayscale(&image))
    );
    assert_eq!(reopened.display().selected(), Some(LayerId::Background));
    std::fs::remove_file(&path).ok();
}

#[test]
fn failed_open_keeps_the_document() {
    let (_textures, mut session, image) = open_session();
    let missing = std::env::temp_dir().join("arsedit-does-not-exist.png");
    assert!(session.open(&missing).is_err());
    assert_eq!(session.editor().current_image(), Some(&image));
    assert!(session.has_image());
}
