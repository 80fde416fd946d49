//! 检测结果与合并规则
//!
//! 结果是值对象：每个阶段产出一个新结果，合并总是返回新结果，不原地修改。
use serde::Serialize;
use std::cmp::Ordering;

use crate::registry::{FileCategory, FileKind, FileTypeDescriptor, UNKNOWN};

/// 备选类型保留上限
pub const MAX_ALTERNATIVES: usize = 3;
/// 落选结果并入备选的置信度下限（严格大于）
pub const ALTERNATIVE_FLOOR: f64 = 0.3;

/// 候选类型及其置信度
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCandidate {
    #[serde(rename = "type")]
    pub file_type: &'static FileTypeDescriptor,
    pub confidence: f64,
}

impl TypeCandidate {
    pub fn new(kind: FileKind, confidence: f64) -> Self {
        Self { file_type: kind.descriptor(), confidence: clamp_confidence(confidence) }
    }

    pub fn kind(&self) -> FileKind {
        self.file_type.kind
    }
}

/// 单次检测（或单个阶段）的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub detected_type: &'static FileTypeDescriptor,
    pub confidence: f64,
    pub possible_types: Vec<TypeCandidate>,
}

impl Default for DetectionResult {
    fn default() -> Self {
        Self::unknown()
    }
}

impl DetectionResult {
    /// UNKNOWN / 0
    pub fn unknown() -> Self {
        Self { detected_type: &UNKNOWN, confidence: 0.0, possible_types: Vec::new() }
    }

    pub fn new(kind: FileKind, confidence: f64) -> Self {
        Self { detected_type: kind.descriptor(), confidence: clamp_confidence(confidence), possible_types: Vec::new() }
    }

    /// 附带备选项构造；备选项会按统一规则排序、去重、截断
    pub fn with_alternatives(kind: FileKind, confidence: f64, alternatives: Vec<TypeCandidate>) -> Self {
        Self {
            detected_type: kind.descriptor(),
            confidence: clamp_confidence(confidence),
            possible_types: rank_candidates(alternatives, kind),
        }
    }

    /// 由一组候选构造：最高者为主结果，其余为备选。空集合返回 UNKNOWN。
    pub fn from_candidates(candidates: Vec<TypeCandidate>) -> Self {
        let mut ranked: Vec<TypeCandidate> = candidates.into_iter().filter(|c| c.confidence > 0.0).collect();
        sort_by_confidence(&mut ranked);
        if ranked.is_empty() { return Self::unknown(); }
        let top = ranked.remove(0);
        Self::with_alternatives(top.kind(), top.confidence, ranked)
    }

    pub fn kind(&self) -> FileKind {
        self.detected_type.kind
    }

    pub fn is_unknown(&self) -> bool {
        self.kind() == FileKind::Unknown
    }

    // 以下元数据始终取自最终主结果
    pub fn is_text_based(&self) -> bool {
        self.detected_type.is_text_based
    }

    pub fn category(&self) -> FileCategory {
        self.detected_type.category
    }

    pub fn mime_type(&self) -> &'static str {
        self.detected_type.mime_type
    }
}

/// 合并两个结果：
/// - 置信度严格更高者成为主结果（相等时保留 `current`）；
/// - 落选方置信度 > 0.3 且类型不同，则并入备选；
/// - 双方备选求并集，按类型去重（保留置信度最高者），降序排序后截断为 3 个。
pub fn merge_results(current: &DetectionResult, candidate: &DetectionResult) -> DetectionResult {
    let (winner, loser) = if candidate.confidence > current.confidence { (candidate, current) } else { (current, candidate) };

    let mut pool: Vec<TypeCandidate> = Vec::with_capacity(current.possible_types.len() + candidate.possible_types.len() + 1);
    pool.extend(current.possible_types.iter().cloned());
    pool.extend(candidate.possible_types.iter().cloned());
    if loser.confidence > ALTERNATIVE_FLOOR && loser.kind() != winner.kind() {
        pool.push(TypeCandidate { file_type: loser.detected_type, confidence: loser.confidence });
    }

    DetectionResult {
        detected_type: winner.detected_type,
        confidence: winner.confidence,
        possible_types: rank_candidates(pool, winner.kind()),
    }
}

/// 备选项规范化：剔除主类型 → 稳定降序 → 按类型去重 → 截断
pub(crate) fn rank_candidates(mut pool: Vec<TypeCandidate>, primary: FileKind) -> Vec<TypeCandidate> {
    pool.retain(|c| c.kind() != primary && c.kind() != FileKind::Unknown);
    sort_by_confidence(&mut pool);
    let mut out: Vec<TypeCandidate> = Vec::with_capacity(MAX_ALTERNATIVES);
    for c in pool {
        if out.len() == MAX_ALTERNATIVES { break; }
        if out.iter().any(|o| o.kind() == c.kind()) { continue; }
        out.push(c);
    }
    out
}

/// 置信度降序；相等时保持原有顺序（sort_by 为稳定排序）
fn sort_by_confidence(v: &mut [TypeCandidate]) {
    v.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal));
}

fn clamp_confidence(c: f64) -> f64 {
    if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }
}
