//! 错误类型
//!
//! 检测流水线本身是全函数（不返回错误），这里只覆盖与文件系统/配置打交道的操作。
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SniffError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value `{key}`: {reason}")]
    ConfigValue { key: &'static str, reason: String },
}

impl SniffError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
