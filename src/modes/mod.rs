pub mod windowed_mode;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failure: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("unable to create the window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("unable to set up the software surface: {0}")]
    Surface(#[from] softbuffer::SoftBufferError),
}
