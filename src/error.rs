// One error type for the whole crate.
// Every variant states *which stage* went wrong, so the editor can fall back
// to showing the plain raster asset instead of blocking the user.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tracing failed: {0}")]
    Tracing(String), // Contour extraction or the background trace worker (fitting cannot fail)
    #[error("compositing failed: {0}")]
    Compositing(String), // Building the SVG document
    #[error("selection failed: {0}")]
    Selection(String), // Wand / fill / history input was unusable
    #[error("config error: {0}")]
    Config(String), // Reading or parsing the editor config
    #[error("window init error: {0}")]
    WindowInit(String), // Creating the editor window failed
    #[error("window update error: {0}")]
    WindowUpdate(String), // Presenting a frame failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
