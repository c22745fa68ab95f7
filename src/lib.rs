//! Raster image editing core: a rotation-aware compositor, the coordinate
//! spaces and layers of the editing canvas, and a bounded undo history.

pub mod buffer;
pub mod color;
pub mod compositor;
pub mod coords;
pub mod display;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod image_store;
pub mod interpolator;
pub mod layers;
pub mod pixel;
pub mod render;
pub mod session;

pub use buffer::PixelBuffer;
pub use editor::Editor;
pub use error::ResourceError;
pub use pixel::Pixel;
pub use session::Session;
