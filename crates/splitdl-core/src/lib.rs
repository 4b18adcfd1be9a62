pub mod config;
pub mod logging;

pub mod downloader;
pub mod notify;
pub mod probe;
pub mod protocol;
pub mod scheduler;
pub mod segmenter;
pub mod storage;
pub mod transport;
pub mod url_model;
