//! 检测流水线
//!
//! 固定顺序的四个阶段，缺少输入的阶段直接跳过：
//! 1. 扩展名 → 2. 二进制签名 → 3. 文本内容 → 4. 深度检查（可选）
//!
//! 各阶段互不依赖，结果依次经 `merge_results` 折叠。整个过程是纯函数：
//! 只读注册表常量，无共享可变状态，可并发调用。
use tracing::debug;

use crate::inspect::{deep_inspect, DEEP_INSPECTION_THRESHOLD};
use crate::options::DetectOptions;
use crate::patterns::detect_by_content;
use crate::registry::{extension_of, lookup_by_extension};
use crate::result::{merge_results, DetectionResult};
use crate::signatures::detect_by_signature;
use crate::types::FileInfo;

/// 扩展名命中时的置信度
pub const EXTENSION_CONFIDENCE: f64 = 0.7;

/// 文件类型检测器（无状态，仅持有选项）
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTypeDetector {
    opts: DetectOptions,
}

impl FileTypeDetector {
    pub fn new(opts: DetectOptions) -> Self {
        Self { opts }
    }

    /// 检测单个文件；总是返回结果，无法判断时为 UNKNOWN / 0
    pub fn detect(&self, file: &FileInfo, content: Option<&str>, bytes: Option<&[u8]>) -> DetectionResult {
        let mut result = detect_by_extension(&file.name);
        debug!(name = %file.name, kind = ?result.kind(), confidence = result.confidence, "extension stage");

        if let Some(buf) = bytes.filter(|b| !b.is_empty()) {
            let by_sig = detect_by_signature(buf, &file.name);
            debug!(kind = ?by_sig.kind(), confidence = by_sig.confidence, "signature stage");
            result = merge_results(&result, &by_sig);
        }

        if let Some(text) = content {
            let by_content = detect_by_content(text, self.opts.content_window);
            debug!(kind = ?by_content.kind(), confidence = by_content.confidence, "content stage");
            result = merge_results(&result, &by_content);
        }

        if self.opts.deep_inspection && result.confidence < DEEP_INSPECTION_THRESHOLD {
            if let Some(text) = content {
                result = deep_inspect(&result, text);
            }
        }

        debug!(name = %file.name, kind = ?result.kind(), confidence = result.confidence, "detected");
        result
    }
}

/// 便捷入口：`detect(file, content, bytes, deep_inspection)`
pub fn detect_file_type(file: &FileInfo, content: Option<&str>, bytes: Option<&[u8]>, deep_inspection: bool) -> DetectionResult {
    FileTypeDetector::new(DetectOptions { deep_inspection, ..DetectOptions::default() }).detect(file, content, bytes)
}

/// 阶段 1：按扩展名查注册表
pub fn detect_by_extension(file_name: &str) -> DetectionResult {
    extension_of(file_name)
        .and_then(|ext| lookup_by_extension(&ext))
        .map(|t| DetectionResult::new(t.kind, EXTENSION_CONFIDENCE))
        .unwrap_or_default()
}
