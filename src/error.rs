use thiserror::Error;

/// A texture (or other display resource) could not be created.
///
/// Layers that hit this cannot be displayed; callers decide whether the
/// current operation is abandoned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("cannot create texture `{name}` from an empty {width}x{height} image")]
    EmptyImage {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("texture allocation for `{name}` failed: {reason}")]
    Allocation { name: String, reason: String },
}
