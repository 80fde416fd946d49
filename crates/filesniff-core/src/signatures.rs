//! 二进制签名（magic bytes）识别
//!
//! 设计要点：
//! - 签名表有序，首个命中的规则胜出。
//! - 所有签名字节序列去重后作为"锚点"构建一个 AC 自动机，只扫描头部窗口一次；
//!   命中位置必须等于规则声明的偏移才算数。
//! - ZIP 派生格式（xlsx/docx/ods）与 OLE2 派生格式（xls/doc）共享头部，
//!   仅靠 `extra_check` 检查文件扩展名来区分；都不通过时通用 ZIP 规则生效。
use std::collections::HashMap;

use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use tracing::trace;

use crate::registry::{extension_of, FileKind};
use crate::result::DetectionResult;

/// 签名命中时的置信度
pub const SIGNATURE_CONFIDENCE: f64 = 0.9;

/// 额外校验：`(规则类型, 文件名) -> 是否接受`
pub type ExtraCheck = fn(FileKind, &str) -> bool;

/// 单条签名规则
#[derive(Clone, Copy)]
pub struct BinarySignatureRule {
    pub kind: FileKind,
    pub bytes: &'static [u8],
    pub offset: usize,
    pub extra_check: Option<ExtraCheck>,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 签名表（顺序即优先级）
pub static SIGNATURE_RULES: &[BinarySignatureRule] = &[
    BinarySignatureRule { kind: FileKind::Pdf, bytes: b"%PDF-", offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Png, bytes: &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Jpeg, bytes: &[0xFF, 0xD8, 0xFF], offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Gif, bytes: b"GIF87a", offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Gif, bytes: b"GIF89a", offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Excel, bytes: ZIP_MAGIC, offset: 0, extra_check: Some(has_registered_extension) },
    BinarySignatureRule { kind: FileKind::Word, bytes: ZIP_MAGIC, offset: 0, extra_check: Some(has_registered_extension) },
    BinarySignatureRule { kind: FileKind::Ods, bytes: ZIP_MAGIC, offset: 0, extra_check: Some(has_registered_extension) },
    BinarySignatureRule { kind: FileKind::Zip, bytes: ZIP_MAGIC, offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Xls, bytes: OLE2_MAGIC, offset: 0, extra_check: Some(has_registered_extension) },
    BinarySignatureRule { kind: FileKind::Doc, bytes: OLE2_MAGIC, offset: 0, extra_check: Some(has_registered_extension) },
    BinarySignatureRule { kind: FileKind::Gzip, bytes: &[0x1F, 0x8B], offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::SevenZip, bytes: &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C], offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Tar, bytes: b"ustar", offset: 257, extra_check: None },
    BinarySignatureRule { kind: FileKind::Sqlite, bytes: b"SQLite format 3\0", offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Parquet, bytes: b"PAR1", offset: 0, extra_check: None },
    BinarySignatureRule { kind: FileKind::Avro, bytes: &[b'O', b'b', b'j', 0x01], offset: 0, extra_check: None },
];

/// 文件扩展名属于该类型的注册扩展名
fn has_registered_extension(kind: FileKind, file_name: &str) -> bool {
    match extension_of(file_name) {
        Some(ext) => kind.descriptor().has_extension(&ext),
        None => false,
    }
}

/// 签名匹配计划（进程内只构建一次，只读共享）
pub(crate) struct SignaturePlan {
    /// 锚点自动机（按 anchors 的顺序构建）
    ac: AhoCorasick,
    /// 锚点索引 -> 规则索引列表
    anchor_to_rules: Vec<Vec<usize>>,
    /// 需要检查的头部窗口长度
    window: usize,
}

lazy_static! {
    static ref PLAN: Option<SignaturePlan> = build_signature_plan(SIGNATURE_RULES);
}

/// 从签名表构建匹配计划；自动机构建失败时返回 None（退化为逐条比较）
fn build_signature_plan(rules: &[BinarySignatureRule]) -> Option<SignaturePlan> {
    let mut anchors: Vec<&'static [u8]> = Vec::new();
    let mut anchor_index: HashMap<&'static [u8], usize> = HashMap::new();
    let mut anchor_to_rules: Vec<Vec<usize>> = Vec::new();

    for (idx, rule) in rules.iter().enumerate() {
        let id = *anchor_index.entry(rule.bytes).or_insert_with(|| {
            anchors.push(rule.bytes);
            anchor_to_rules.push(Vec::new());
            anchors.len() - 1
        });
        anchor_to_rules[id].push(idx);
    }

    let window = rules.iter().map(|r| r.offset + r.bytes.len()).max().unwrap_or(0);
    // 重叠匹配要求默认（Standard）匹配语义
    let ac = AhoCorasick::new(&anchors).ok()?;
    Some(SignaturePlan { ac, anchor_to_rules, window })
}

/// 按签名表识别字节样本
pub fn detect_by_signature(bytes: &[u8], file_name: &str) -> DetectionResult {
    if bytes.is_empty() { return DetectionResult::unknown(); }
    let hit = match PLAN.as_ref() {
        Some(plan) => first_rule_via_plan(plan, SIGNATURE_RULES, bytes, file_name),
        None => first_rule_linear(SIGNATURE_RULES, bytes, file_name),
    };
    match hit {
        Some(idx) => {
            let rule = &SIGNATURE_RULES[idx];
            trace!(kind = ?rule.kind, offset = rule.offset, "signature matched");
            DetectionResult::new(rule.kind, SIGNATURE_CONFIDENCE)
        }
        None => DetectionResult::unknown(),
    }
}

/// AC 单次扫描头部窗口，收集偏移正确的候选规则，返回通过校验的最小规则索引
fn first_rule_via_plan(plan: &SignaturePlan, rules: &[BinarySignatureRule], bytes: &[u8], file_name: &str) -> Option<usize> {
    let head = &bytes[..bytes.len().min(plan.window)];
    let mut candidates: Vec<usize> = Vec::new();
    for m in plan.ac.find_overlapping_iter(head) {
        if let Some(rule_ids) = plan.anchor_to_rules.get(m.pattern().as_usize()) {
            for &ri in rule_ids {
                if rules[ri].offset == m.start() { candidates.push(ri); }
            }
        }
    }
    candidates.sort_unstable();
    candidates.into_iter().find(|&ri| accepts(&rules[ri], file_name))
}

/// 逐条比较（与 AC 路径结果一致）
fn first_rule_linear(rules: &[BinarySignatureRule], bytes: &[u8], file_name: &str) -> Option<usize> {
    rules.iter().position(|r| matches_at_offset(r, bytes) && accepts(r, file_name))
}

fn matches_at_offset(rule: &BinarySignatureRule, bytes: &[u8]) -> bool {
    bytes.get(rule.offset..rule.offset + rule.bytes.len()).map_or(false, |w| w == rule.bytes)
}

fn accepts(rule: &BinarySignatureRule, file_name: &str) -> bool {
    match rule.extra_check {
        Some(check) => check(rule.kind, file_name),
        None => true,
    }
}
