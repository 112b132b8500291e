//! scan-ai: 写真1枚をAIで解析し、結果を履歴に保存するツール

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod imaging;
pub mod pipeline;
pub mod store;
pub mod transport;

pub use error::{Result, ScanAiError};
