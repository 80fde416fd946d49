//! 深度检查（低置信度时的二次确认）
//!
//! 按当前最佳类型分派到专用的细化器；细化结果通过 `merge_results`
//! 与当前结果合并，只有置信度严格更高时才会取代当前结果。
use crate::patterns::{delimiter_counts, markdown_hits, xml_root, yaml_hits};
use crate::registry::FileKind;
use crate::result::{merge_results, DetectionResult, TypeCandidate};

/// 低于该置信度才进入深度检查
pub const DEEP_INSPECTION_THRESHOLD: f64 = 0.8;

/// 分隔符一致性检查的行数
pub const DELIMITED_LINES: usize = 5;

pub const DELIMITED_CLEAN: f64 = 0.9;
pub const DELIMITED_MIXED: f64 = 0.8;
pub const DELIMITED_MIXED_ALTERNATIVE: f64 = 0.5;
pub const DELIMITED_SINGLE_LINE: f64 = 0.5;
pub const DELIMITED_INCONSISTENT: f64 = 0.4;

pub const JSON_CONTAINER: f64 = 0.95;
pub const JSON_SCALAR: f64 = 0.9;
pub const JSON_FALLBACK_TEXT: f64 = 0.7;
pub const JSON_REJECTED: f64 = 0.3;

pub const XML_DECLARED: f64 = 0.95;
pub const XML_BALANCED: f64 = 0.85;
pub const XML_UNCLOSED: f64 = 0.6;
pub const XML_FALLBACK_TEXT: f64 = 0.5;
pub const XML_REJECTED: f64 = 0.3;

pub const GENERIC_BASE: f64 = 0.5;
pub const GENERIC_BONUS: f64 = 0.1;
pub const GENERIC_CAP: f64 = 0.85;
pub const PLAIN_TEXT: f64 = 0.6;
/// 可打印字符占比达到该值才视为纯文本
pub const PLAIN_TEXT_RATIO: f64 = 0.9;

/// 细化器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refiner {
    Delimited,
    Json,
    Xml,
    Generic,
}

impl Refiner {
    /// 类型到细化器的映射（穷举，新增类型时编译器会提示）
    pub fn for_kind(kind: FileKind) -> Self {
        match kind {
            FileKind::Csv | FileKind::Tsv => Refiner::Delimited,
            FileKind::Json => Refiner::Json,
            FileKind::Xml => Refiner::Xml,
            FileKind::Yaml
            | FileKind::Parquet
            | FileKind::Avro
            | FileKind::Excel
            | FileKind::Xls
            | FileKind::Ods
            | FileKind::Pdf
            | FileKind::Word
            | FileKind::Doc
            | FileKind::Text
            | FileKind::Markdown
            | FileKind::Html
            | FileKind::Png
            | FileKind::Jpeg
            | FileKind::Gif
            | FileKind::Zip
            | FileKind::Gzip
            | FileKind::Tar
            | FileKind::SevenZip
            | FileKind::Sqlite
            | FileKind::Sql
            | FileKind::Unknown => Refiner::Generic,
        }
    }

    pub fn refine(self, current: FileKind, content: &str) -> DetectionResult {
        match self {
            Refiner::Delimited => refine_delimited(current, content),
            Refiner::Json => refine_json(content),
            Refiner::Xml => refine_xml(content),
            Refiner::Generic => refine_generic(content),
        }
    }
}

/// 对当前结果执行深度检查，返回合并后的新结果
pub fn deep_inspect(current: &DetectionResult, content: &str) -> DetectionResult {
    let refiner = Refiner::for_kind(current.kind());
    let refined = refiner.refine(current.kind(), content);
    tracing::debug!(?refiner, refined = ?refined.kind(), confidence = refined.confidence, "deep inspection");
    merge_results(current, &refined)
}

/// CSV/TSV：比较前 5 个非空行的引号外分隔符数量
fn refine_delimited(current: FileKind, content: &str) -> DetectionResult {
    let commas = delimiter_counts(content, ',', DELIMITED_LINES);
    let tabs = delimiter_counts(content, '\t', DELIMITED_LINES);
    if commas.len() < 2 {
        return DetectionResult::new(current, DELIMITED_SINGLE_LINE);
    }

    let comma_ok = is_consistent(&commas);
    let tab_ok = is_consistent(&tabs);
    let comma_total: usize = commas.iter().sum();
    let tab_total: usize = tabs.iter().sum();

    if comma_ok && tab_total == 0 {
        DetectionResult::new(FileKind::Csv, DELIMITED_CLEAN)
    } else if tab_ok && comma_total == 0 {
        DetectionResult::new(FileKind::Tsv, DELIMITED_CLEAN)
    } else if tab_ok {
        let alts = if comma_ok { vec![TypeCandidate::new(FileKind::Csv, DELIMITED_MIXED_ALTERNATIVE)] } else { Vec::new() };
        DetectionResult::with_alternatives(FileKind::Tsv, DELIMITED_MIXED, alts)
    } else if comma_ok {
        DetectionResult::new(FileKind::Csv, DELIMITED_MIXED)
    } else {
        DetectionResult::new(current, DELIMITED_INCONSISTENT)
    }
}

fn is_consistent(counts: &[usize]) -> bool {
    match counts.split_first() {
        Some((first, rest)) => *first > 0 && rest.iter().all(|c| c == first),
        None => false,
    }
}

/// JSON：完整解析；失败则降级为 TEXT，JSON 作为低置信备选保留
fn refine_json(content: &str) -> DetectionResult {
    match serde_json::from_str::<serde_json::Value>(content.trim()) {
        Ok(v) if v.is_object() || v.is_array() => DetectionResult::new(FileKind::Json, JSON_CONTAINER),
        Ok(_) => DetectionResult::new(FileKind::Json, JSON_SCALAR),
        Err(_) => DetectionResult::with_alternatives(
            FileKind::Text,
            JSON_FALLBACK_TEXT,
            vec![TypeCandidate::new(FileKind::Json, JSON_REJECTED)],
        ),
    }
}

/// XML：声明前缀，或根元素自闭合/有对应闭合标签
fn refine_xml(content: &str) -> DetectionResult {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml") {
        return DetectionResult::new(FileKind::Xml, XML_DECLARED);
    }
    match xml_root(trimmed) {
        Some((_, true)) => DetectionResult::new(FileKind::Xml, XML_BALANCED),
        Some((name, false)) if trimmed.contains(&format!("</{name}>")) => DetectionResult::new(FileKind::Xml, XML_BALANCED),
        Some(_) => DetectionResult::new(FileKind::Xml, XML_UNCLOSED),
        None => DetectionResult::with_alternatives(
            FileKind::Text,
            XML_FALLBACK_TEXT,
            vec![TypeCandidate::new(FileKind::Xml, XML_REJECTED)],
        ),
    }
}

/// 通用：Markdown / YAML 特征计数 + 纯文本兜底
fn refine_generic(content: &str) -> DetectionResult {
    let mut candidates = Vec::with_capacity(3);

    let md = markdown_hits(content);
    if md > 0 {
        candidates.push(TypeCandidate::new(FileKind::Markdown, generic_score(md)));
    }
    let yaml = yaml_hits(content);
    if yaml > 0 {
        candidates.push(TypeCandidate::new(FileKind::Yaml, generic_score(yaml)));
    }
    if printable_ratio(content) >= PLAIN_TEXT_RATIO {
        candidates.push(TypeCandidate::new(FileKind::Text, PLAIN_TEXT));
    }

    DetectionResult::from_candidates(candidates)
}

fn generic_score(hits: usize) -> f64 {
    (GENERIC_BASE + GENERIC_BONUS * hits as f64).min(GENERIC_CAP)
}

/// 非控制字符（含常见空白）占比；空串视为 0
fn printable_ratio(content: &str) -> f64 {
    let mut total = 0usize;
    let mut printable = 0usize;
    for ch in content.chars() {
        total += 1;
        if !ch.is_control() || matches!(ch, '\t' | '\n' | '\r') {
            printable += 1;
        }
    }
    if total == 0 { 0.0 } else { printable as f64 / total as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_consistent_commas_and_no_tabs() {
        let r = refine_delimited(FileKind::Csv, "a,b,c\n1,2,3\n4,5,6\n7,8,9\n10,11,12\n");
        assert_eq!(r.kind(), FileKind::Csv);
        assert_eq!(r.confidence, DELIMITED_CLEAN);
    }

    #[test]
    fn csv_named_file_holding_tabs_becomes_tsv() {
        let r = refine_delimited(FileKind::Csv, "a\tb\n1\t2\n3\t4\n");
        assert_eq!(r.kind(), FileKind::Tsv);
        assert_eq!(r.confidence, DELIMITED_CLEAN);
    }

    #[test]
    fn tabs_with_stray_commas_prefer_tsv() {
        let r = refine_delimited(FileKind::Tsv, "name\tnote, extra\nann\thi, there\nbob\tok, fine\n");
        assert_eq!(r.kind(), FileKind::Tsv);
        assert_eq!(r.confidence, DELIMITED_MIXED);
        assert_eq!(r.possible_types, vec![TypeCandidate::new(FileKind::Csv, DELIMITED_MIXED_ALTERNATIVE)]);
    }

    #[test]
    fn commas_with_stray_tabs_prefer_csv() {
        let r = refine_delimited(FileKind::Csv, "a,b,c\t\n1,2,3\n4,5,6\t\t\n");
        assert_eq!((r.kind(), r.confidence), (FileKind::Csv, DELIMITED_MIXED));
        assert!(r.possible_types.is_empty());
    }

    #[test]
    fn single_or_ragged_lines_stay_low() {
        assert_eq!(refine_delimited(FileKind::Csv, "a,b,c").confidence, DELIMITED_SINGLE_LINE);
        let r = refine_delimited(FileKind::Csv, "a,b\n1,2,3\n4\n");
        assert_eq!((r.kind(), r.confidence), (FileKind::Csv, DELIMITED_INCONSISTENT));
    }

    #[test]
    fn json_container_scalar_and_garbage() {
        assert_eq!(refine_json("[1, 2]").confidence, JSON_CONTAINER);
        assert_eq!(refine_json(" 42 ").confidence, JSON_SCALAR);
        let r = refine_json("{a:1");
        assert_eq!((r.kind(), r.confidence), (FileKind::Text, JSON_FALLBACK_TEXT));
        assert_eq!(r.possible_types, vec![TypeCandidate::new(FileKind::Json, JSON_REJECTED)]);
    }

    #[test]
    fn xml_variants() {
        assert_eq!(refine_xml("\u{feff}<?xml version=\"1.0\"?><a/>").confidence, XML_DECLARED);
        assert_eq!(refine_xml("<catalog><book/></catalog>").confidence, XML_BALANCED);
        assert_eq!(refine_xml("<empty attr=\"1\"/>").confidence, XML_BALANCED);
        assert_eq!(refine_xml("<catalog><book>").confidence, XML_UNCLOSED);
        let r = refine_xml("not markup at all");
        assert_eq!(r.kind(), FileKind::Text);
        assert_eq!(r.possible_types[0].kind(), FileKind::Xml);
    }

    #[test]
    fn generic_prefers_markdown_when_features_dominate() {
        let r = refine_generic("# Notes\n\n- first\n- second\n\nSee [docs](http://example.com).\n");
        assert_eq!(r.kind(), FileKind::Markdown);
        assert!((r.confidence - GENERIC_CAP).abs() < 1e-9);
        assert!(r.possible_types.iter().any(|c| c.kind() == FileKind::Text));
    }

    #[test]
    fn generic_yaml_document() {
        let r = refine_generic("server:\n  port: 8080\nname: demo\nenabled: true\n");
        assert_eq!(r.kind(), FileKind::Yaml);
        assert!((r.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn generic_plain_text() {
        let r = refine_generic("just a sentence without structure");
        assert_eq!((r.kind(), r.confidence), (FileKind::Text, PLAIN_TEXT));
        assert!(refine_generic("").is_unknown());
    }

    #[test]
    fn refined_result_only_supersedes_when_more_confident() {
        let strong = DetectionResult::new(FileKind::Json, 0.75);
        let r = deep_inspect(&strong, "{a:1");
        assert_eq!(r.kind(), FileKind::Json);
        let weak = DetectionResult::new(FileKind::Json, 0.3);
        let r = deep_inspect(&weak, "{a:1");
        assert_eq!((r.kind(), r.confidence), (FileKind::Text, JSON_FALLBACK_TEXT));
    }

    #[test]
    fn every_kind_has_a_refiner() {
        for t in crate::registry::all_types() {
            let _ = Refiner::for_kind(t.kind);
        }
        assert_eq!(Refiner::for_kind(FileKind::Tsv), Refiner::Delimited);
        assert_eq!(Refiner::for_kind(FileKind::Unknown), Refiner::Generic);
    }
}
