// PNG rendering for the game cards.

pub mod canvas;
pub mod cards;

use thiserror::Error;

pub use cards::CardRenderer;

#[derive(Debug, Error)]
pub enum VisualError {
    #[error("Could not decode image: {0}")]
    Decode(image::ImageError),

    #[error("Could not encode PNG: {0}")]
    Encode(image::ImageError),

    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
