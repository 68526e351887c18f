use lopdf::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("restore without a matching save")]
    UnbalancedRestore,
    #[error("path has {points} points but {types} point types")]
    MismatchedPathArrays { points: usize, types: usize },
    #[error("invalid path point type {value:#04x} at index {index}")]
    InvalidPathPointType { index: usize, value: u8 },
    #[error("object {0:?} is not an image or form XObject")]
    UnknownXObject(ObjectId),
    #[error("object {0:?} does not exist in the document")]
    UnknownObject(ObjectId),
    #[error("object {0:?} cannot hold content or resources")]
    NotAContainer(ObjectId),
    #[error("font error: {0}")]
    Font(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document context lock poisoned")]
    ContextPoisoned,
    #[error("document context is still shared by other builders")]
    ContextShared,
}

pub type Result<T> = std::result::Result<T, ContentError>;
