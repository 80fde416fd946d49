//! 配置文件加载（TOML）
//!
//! ```toml
//! [detection]
//! deep_inspection = true
//! content_window = 2000
//!
//! [sampling]
//! max_sample_bytes = 4096
//! max_file_size = 104857600
//!
//! [scan]
//! threads = "auto"   # 或具体数值
//! max_depth = 8
//! ```
use serde::Deserialize;
use std::path::Path;

use crate::error::SniffError;
use crate::options::{DetectOptions, ScanOptions};

/// 未显式指定时尝试读取的默认路径
pub const DEFAULT_CONFIG_PATH: &str = "./filesniff.toml";

/// 顶层配置结构
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SniffConfig {
    #[serde(default)]
    pub detection: DetectionSection,
    #[serde(default)]
    pub sampling: SamplingSection,
    #[serde(default)]
    pub scan: ScanSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionSection {
    pub deep_inspection: Option<bool>,
    pub content_window: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingSection {
    pub max_sample_bytes: Option<usize>,
    pub max_file_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    pub threads: Option<Threads>,
    pub max_depth: Option<usize>,
}

/// 线程数：`"auto"` 或具体数值
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Threads {
    Count(usize),
    Named(String),
}

impl Threads {
    /// None 表示自动
    pub fn resolve(&self) -> Result<Option<usize>, SniffError> {
        match self {
            Threads::Count(0) => Err(SniffError::ConfigValue { key: "scan.threads", reason: "must be at least 1".into() }),
            Threads::Count(n) => Ok(Some(*n)),
            Threads::Named(s) if s.eq_ignore_ascii_case("auto") => Ok(None),
            Threads::Named(s) => Err(SniffError::ConfigValue { key: "scan.threads", reason: format!("expected \"auto\" or a number, got {s:?}") }),
        }
    }
}

impl SniffConfig {
    pub fn from_toml_str(txt: &str, origin: &Path) -> Result<Self, SniffError> {
        toml::from_str(txt).map_err(|source| SniffError::ConfigParse { path: origin.to_path_buf(), source })
    }

    /// 按检测选项落地（未设置的字段取默认值）
    pub fn detect_options(&self) -> Result<DetectOptions, SniffError> {
        let mut opts = DetectOptions::default();
        if let Some(deep) = self.detection.deep_inspection { opts.deep_inspection = deep; }
        if let Some(window) = self.detection.content_window {
            if window == 0 {
                return Err(SniffError::ConfigValue { key: "detection.content_window", reason: "must be at least 1".into() });
            }
            opts.content_window = window;
        }
        Ok(opts)
    }

    /// 按扫描选项落地
    pub fn scan_options(&self) -> Result<ScanOptions, SniffError> {
        let mut opts = ScanOptions { detect: self.detect_options()?, ..ScanOptions::default() };
        if let Some(n) = self.sampling.max_sample_bytes {
            if n == 0 {
                return Err(SniffError::ConfigValue { key: "sampling.max_sample_bytes", reason: "must be at least 1".into() });
            }
            opts.max_sample_bytes = n;
        }
        opts.max_file_size = self.sampling.max_file_size;
        opts.max_depth = self.scan.max_depth;
        if let Some(t) = &self.scan.threads { opts.threads = t.resolve()?; }
        Ok(opts)
    }
}

/// 加载配置：
/// - 显式路径不存在或解析失败 → 错误；
/// - 未指定路径时尝试默认路径，不存在则使用默认配置。
pub fn load_config(path: Option<&Path>) -> Result<SniffConfig, SniffError> {
    load_config_or(path, Path::new(DEFAULT_CONFIG_PATH))
}

/// 同 `load_config`，默认路径由调用方给出
fn load_config_or(path: Option<&Path>, default_path: &Path) -> Result<SniffConfig, SniffError> {
    let path = match path {
        Some(p) => p,
        None if !default_path.exists() => return Ok(SniffConfig::default()),
        None => default_path,
    };
    let txt = std::fs::read_to_string(path).map_err(|e| SniffError::io(path, e))?;
    SniffConfig::from_toml_str(&txt, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(txt: &str) -> Result<SniffConfig, SniffError> {
        SniffConfig::from_toml_str(txt, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.detect_options().unwrap(), DetectOptions::default());
        let scan = cfg.scan_options().unwrap();
        assert_eq!(scan.max_sample_bytes, crate::options::DEFAULT_SAMPLE_BYTES);
        assert_eq!(scan.threads, None);
    }

    #[test]
    fn all_sections_apply() {
        let cfg = parse(
            r#"
            [detection]
            deep_inspection = false
            content_window = 500

            [sampling]
            max_sample_bytes = 1024
            max_file_size = 2048

            [scan]
            threads = 3
            max_depth = 2
            "#,
        )
        .unwrap();
        let scan = cfg.scan_options().unwrap();
        assert!(!scan.detect.deep_inspection);
        assert_eq!(scan.detect.content_window, 500);
        assert_eq!(scan.max_sample_bytes, 1024);
        assert_eq!(scan.max_file_size, Some(2048));
        assert_eq!(scan.threads, Some(3));
        assert_eq!(scan.max_depth, Some(2));
    }

    #[test]
    fn threads_accepts_auto_and_rejects_junk() {
        assert_eq!(parse("[scan]\nthreads = \"AUTO\"").unwrap().scan_options().unwrap().threads, None);
        assert!(matches!(
            parse("[scan]\nthreads = \"many\"").unwrap().scan_options(),
            Err(SniffError::ConfigValue { key: "scan.threads", .. })
        ));
        assert!(parse("[scan]\nthreads = 0").unwrap().scan_options().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse("[detection]\ndeep = true"), Err(SniffError::ConfigParse { .. })));
    }

    #[test]
    fn explicit_missing_path_errors() {
        assert!(load_config(Some(Path::new("/no/such/filesniff.toml"))).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[sampling]\nmax_sample_bytes = 64").unwrap();
        let cfg = load_config(Some(tmp.path())).unwrap();
        assert_eq!(cfg.scan_options().unwrap().max_sample_bytes, 64);
    }

    #[test]
    fn missing_default_path_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let default_path = dir.path().join("filesniff.toml");

        let cfg = load_config_or(None, &default_path).unwrap();
        assert_eq!(cfg.scan_options().unwrap().max_sample_bytes, crate::options::DEFAULT_SAMPLE_BYTES);

        std::fs::write(&default_path, "[sampling]\nmax_sample_bytes = 128\n").unwrap();
        let cfg = load_config_or(None, &default_path).unwrap();
        assert_eq!(cfg.scan_options().unwrap().max_sample_bytes, 128);
    }
}
