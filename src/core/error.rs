use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} extends past the end of the container")]
    Truncated { page: u32 },

    #[error("table page {index} failed its self-checksum (corrupt file or wrong key)")]
    CorruptTable { index: u32 },

    #[error("data page {index} failed checksum verification")]
    CorruptPage { index: u32 },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("not a folder: {0}")]
    NotAFolder(String),

    #[error("bad thumbnail: {0}")]
    BadThumbnail(&'static str),
}

pub type Result<T> = std::result::Result<T, SaiError>;
