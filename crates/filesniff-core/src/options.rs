//! 检测选项、扫描选项与统计信息（模块）
use crate::patterns::DEFAULT_CONTENT_WINDOW;

/// 默认采样字节数（只读取文件头部）
pub const DEFAULT_SAMPLE_BYTES: usize = 4 * 1024; // 4 KiB

/// 单次检测的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// 是否在低置信度时执行深度检查
    pub deep_inspection: bool,
    /// 内容规则匹配的字符窗口
    pub content_window: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self { deep_inspection: true, content_window: DEFAULT_CONTENT_WINDOW }
    }
}

/// 目录扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub detect: DetectOptions,
    /// 每个文件最多读取的字节数
    pub max_sample_bytes: usize,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 递归深度；None 表示不限制
    pub max_depth: Option<usize>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            detect: DetectOptions::default(),
            max_sample_bytes: DEFAULT_SAMPLE_BYTES,
            max_file_size: None,
            max_depth: None,
            threads: None,
        }
    }
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub unknown_detected: usize,
    pub outputs_written: usize,
}
