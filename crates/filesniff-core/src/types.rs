//! 公共类型（对外暴露）
use serde::Serialize;

use crate::registry::FileCategory;
use crate::result::DetectionResult;

/// 待检测文件的基本信息（文件名 + 大小），由调用方提供
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size }
    }
}

/// 输出项结构（对应 result.json 的单个元素）
#[derive(Debug, Clone, Serialize)]
pub struct OutputItem<'a> {
    pub path: &'a str,
    pub file_type: &'static str,
    pub category: FileCategory,
    pub mime_type: &'static str,
    pub is_text_based: bool,
    pub confidence: f64,
    pub alternatives: Vec<AlternativeItem>,
}

/// 备选类型（输出用）
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeItem {
    pub file_type: &'static str,
    pub confidence: f64,
}

impl<'a> OutputItem<'a> {
    pub fn from_result(path: &'a str, r: &DetectionResult) -> Self {
        Self {
            path,
            file_type: r.detected_type.canonical_name,
            category: r.category(),
            mime_type: r.mime_type(),
            is_text_based: r.is_text_based(),
            confidence: r.confidence,
            alternatives: r
                .possible_types
                .iter()
                .map(|c| AlternativeItem { file_type: c.file_type.canonical_name, confidence: c.confidence })
                .collect(),
        }
    }
}
