use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("invalid link. Use a lu.ma or luma.com link (e.g. lu.ma/abc123)")]
    InvalidLink,
    #[error("could not fetch the event page: {0}")]
    FetchExhausted(String),
    #[error("error generating image: {0}")]
    RenderFailure(String),
    #[error("could not save image: {0}")]
    Delivery(#[from] std::io::Error),
}

impl From<image::ImageError> for ShareError {
    fn from(err: image::ImageError) -> Self {
        ShareError::RenderFailure(err.to_string())
    }
}
