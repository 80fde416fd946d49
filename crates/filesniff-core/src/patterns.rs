//! 文本内容特征识别
//!
//! - 规则表有序；每条规则给出正则、最小样本长度、基础置信度和可选的校验函数。
//! - 样本短于最小长度的规则静默跳过（不算失败）。
//! - 所有命中规则按置信度降序，最高者为主结果，其余作为备选。
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::registry::FileKind;
use crate::result::{DetectionResult, TypeCandidate};

/// 默认内容窗口（字符数）
pub const DEFAULT_CONTENT_WINDOW: usize = 2000;

// 各规则的打分常量
pub const JSON_BASE: f64 = 0.6;
pub const JSON_VALID: f64 = 0.95;
pub const JSON_STRUCTURED: f64 = 0.5;
pub const JSON_UNSTRUCTURED: f64 = 0.3;
pub const XML_DECLARATION: f64 = 0.95;
pub const HTML_DOCTYPE: f64 = 0.9;
pub const XML_ELEMENT_BASE: f64 = 0.5;
pub const XML_ELEMENT_CLOSED: f64 = 0.75;
pub const XML_ELEMENT_OPEN: f64 = 0.4;
pub const DELIMITED_BASE: f64 = 0.5;
pub const CSV_CONSISTENT: f64 = 0.75;
pub const TSV_CONSISTENT: f64 = 0.75;
pub const DELIMITED_INCONSISTENT: f64 = 0.35;
pub const SQL_BASE: f64 = 0.7;
pub const FEATURE_BASE: f64 = 0.4;
pub const FEATURE_BONUS: f64 = 0.1;
pub const FEATURE_CAP: f64 = 0.85;

/// 内容校验：返回覆盖后的置信度
pub type Validator = fn(&str) -> f64;

/// 单条内容规则（编译后）
pub struct ContentPatternRule {
    pub kind: FileKind,
    pub regex: Regex,
    pub min_sample_len: usize,
    pub base_confidence: f64,
    pub validate: Option<Validator>,
}

// 规则源：(类型, 正则, 最小长度, 基础置信度, 校验)
type RuleSource = (FileKind, &'static str, usize, f64, Option<Validator>);

const RULE_SOURCES: &[RuleSource] = &[
    (FileKind::Json, r"^\s*[\[{]", 2, JSON_BASE, Some(validate_json)),
    (FileKind::Xml, r"^\s*<\?xml\s", 6, XML_DECLARATION, None),
    (FileKind::Html, r"(?i)^\s*(?:<!doctype\s+html|<html[\s>])", 6, HTML_DOCTYPE, None),
    (FileKind::Xml, r"^\s*<[A-Za-z_][\w:.\-]*[^>]*>", 4, XML_ELEMENT_BASE, Some(validate_xml_element)),
    (FileKind::Csv, r"(?m)^[^,\n]*,[^\n]*$", 10, DELIMITED_BASE, Some(validate_csv)),
    (FileKind::Tsv, r"(?m)^[^\t\n]*\t[^\n]*$", 10, DELIMITED_BASE, Some(validate_tsv)),
    (FileKind::Sql, r"(?i)\b(?:create\s+table|insert\s+into|select\s[^;]+?\sfrom|alter\s+table|drop\s+table)\b", 10, SQL_BASE, None),
    (FileKind::Yaml, r"(?m)^(?:---[ \t]*$|[A-Za-z_][\w\-]*:(?:[ \t]+\S|[ \t]*$))", 4, FEATURE_BASE, Some(validate_yaml)),
    (FileKind::Markdown, r"(?m)^(?:#{1,6}[ \t]+\S|[ \t]*[-*+][ \t]+\S|[ \t]*\d+\.[ \t]+\S|>[ \t]?\S|```)", 3, FEATURE_BASE, Some(validate_markdown)),
];

lazy_static! {
    /// 编译后的规则表（进程内只编译一次）
    pub static ref CONTENT_RULES: Vec<ContentPatternRule> = RULE_SOURCES
        .iter()
        .map(|&(kind, pat, min_sample_len, base_confidence, validate)| {
            let regex = Regex::new(pat).expect("invalid built-in regex");
            ContentPatternRule { kind, regex, min_sample_len, base_confidence, validate }
        })
        .collect();

    static ref JSON_KEY: Regex = Regex::new(r#""[^"\n]+"\s*:"#).expect("invalid built-in regex");
    static ref XML_ROOT: Regex = Regex::new(r"^\s*<([A-Za-z_][\w:.\-]*)[^>]*?(/?)>").expect("invalid built-in regex");
    pub(crate) static ref YAML_LINE: Regex = Regex::new(r"^(?:---\s*$|-[ \t]+\S|[A-Za-z_][\w\-]*:(?:[ \t]+\S|[ \t]*$))").expect("invalid built-in regex");
    pub(crate) static ref MD_HEADING: Regex = Regex::new(r"^#{1,6}[ \t]+\S").expect("invalid built-in regex");
    pub(crate) static ref MD_LIST: Regex = Regex::new(r"^[ \t]*(?:[-*+]|\d+\.)[ \t]+\S").expect("invalid built-in regex");
    pub(crate) static ref MD_QUOTE: Regex = Regex::new(r"^>[ \t]?\S").expect("invalid built-in regex");
    pub(crate) static ref MD_FENCE: Regex = Regex::new(r"^[ \t]*```").expect("invalid built-in regex");
    pub(crate) static ref MD_LINK: Regex = Regex::new(r"\[[^\]\n]+\]\([^)\n]+\)").expect("invalid built-in regex");
    pub(crate) static ref MD_EMPHASIS: Regex = Regex::new(r"(?:\*\*|__)[^*_\n]+(?:\*\*|__)").expect("invalid built-in regex");
}

/// 截取前 `window` 个字符（按字符而非字节，避免切断 UTF-8）
pub fn truncate_chars(text: &str, window: usize) -> &str {
    match text.char_indices().nth(window) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 按内容规则识别文本样本
pub fn detect_by_content(text: &str, window: usize) -> DetectionResult {
    let sample = truncate_chars(text, window);
    let sample_len = sample.chars().count();
    let mut hits: Vec<TypeCandidate> = Vec::new();

    for rule in CONTENT_RULES.iter() {
        if sample_len < rule.min_sample_len { continue; }
        if !rule.regex.is_match(sample) { continue; }
        let confidence = match rule.validate {
            Some(validate) => validate(sample),
            None => rule.base_confidence,
        };
        trace!(kind = ?rule.kind, confidence, "content rule matched");
        hits.push(TypeCandidate::new(rule.kind, confidence));
    }

    DetectionResult::from_candidates(hits)
}

fn validate_json(sample: &str) -> f64 {
    if serde_json::from_str::<serde_json::Value>(sample.trim()).is_ok() {
        JSON_VALID
    } else if JSON_KEY.is_match(sample) {
        // 常见于被截断的大文件
        JSON_STRUCTURED
    } else {
        JSON_UNSTRUCTURED
    }
}

fn validate_xml_element(sample: &str) -> f64 {
    match xml_root(sample) {
        Some((_, true)) => XML_ELEMENT_CLOSED,
        Some((name, false)) if sample.contains(&format!("</{name}>")) => XML_ELEMENT_CLOSED,
        Some(_) => XML_ELEMENT_OPEN,
        None => 0.0,
    }
}

/// 根元素名及是否自闭合
pub(crate) fn xml_root(sample: &str) -> Option<(&str, bool)> {
    let caps = XML_ROOT.captures(sample)?;
    let name = caps.get(1)?.as_str();
    let self_closing = caps.get(2).map_or(false, |m| !m.as_str().is_empty());
    Some((name, self_closing))
}

fn validate_csv(sample: &str) -> f64 {
    delimited_score(sample, ',', CSV_CONSISTENT)
}

fn validate_tsv(sample: &str) -> f64 {
    delimited_score(sample, '\t', TSV_CONSISTENT)
}

/// 前 5 行分隔符数量一致（且 ≥ 2 行）给高分；单行给基础分
fn delimited_score(sample: &str, delim: char, consistent: f64) -> f64 {
    let counts = delimiter_counts(sample, delim, 5);
    match counts.as_slice() {
        [] => 0.0,
        [_] => DELIMITED_BASE,
        [first, rest @ ..] if *first > 0 && rest.iter().all(|c| c == first) => consistent,
        _ => DELIMITED_INCONSISTENT,
    }
}

/// 前 `max_lines` 个非空行中，引号外分隔符的数量
pub(crate) fn delimiter_counts(sample: &str, delim: char, max_lines: usize) -> Vec<usize> {
    sample
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(max_lines)
        .map(|line| {
            let mut in_quotes = false;
            line.chars()
                .filter(|&ch| {
                    if ch == '"' { in_quotes = !in_quotes; }
                    ch == delim && !in_quotes
                })
                .count()
        })
        .collect()
}

fn validate_yaml(sample: &str) -> f64 {
    feature_score(yaml_hits(sample))
}

fn validate_markdown(sample: &str) -> f64 {
    feature_score(markdown_hits(sample))
}

/// `FEATURE_BASE + FEATURE_BONUS * hits`，封顶 `FEATURE_CAP`
fn feature_score(hits: usize) -> f64 {
    if hits == 0 { return 0.0; }
    (FEATURE_BASE + FEATURE_BONUS * hits as f64).min(FEATURE_CAP)
}

/// YAML 特征行数
pub(crate) fn yaml_hits(sample: &str) -> usize {
    sample.lines().filter(|l| YAML_LINE.is_match(l)).count()
}

/// Markdown 特征数：标题、列表、引用、代码块、链接、强调
pub(crate) fn markdown_hits(sample: &str) -> usize {
    let line_hits = sample
        .lines()
        .filter(|l| MD_HEADING.is_match(l) || MD_LIST.is_match(l) || MD_QUOTE.is_match(l) || MD_FENCE.is_match(l))
        .count();
    line_hits + MD_LINK.find_iter(sample).count() + MD_EMPHASIS.find_iter(sample).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtin_rules_compile() {
        assert_eq!(CONTENT_RULES.len(), RULE_SOURCES.len());
    }

    #[test]
    fn valid_json_scores_high() {
        let r = detect_by_content(r#"{"name": "alpha", "tags": [1, 2]}"#, DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Json);
        assert_eq!(r.confidence, JSON_VALID);
    }

    #[test]
    fn truncated_json_keeps_structure_score() {
        let r = detect_by_content("{\n  \"rows\": [\n    {\"id\": 1", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Json);
        assert_eq!(r.confidence, JSON_STRUCTURED);
    }

    #[test]
    fn xml_declaration_wins_over_element_rule() {
        let r = detect_by_content("<?xml version=\"1.0\"?>\n<root><a/></root>", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Xml);
        assert_eq!(r.confidence, XML_DECLARATION);
    }

    #[test]
    fn html_outranks_generic_element() {
        let r = detect_by_content("<!DOCTYPE html>\n<html><body></body></html>", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Html);
        let r = detect_by_content("<html lang=\"en\"><head></head></html>", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Html);
        assert_eq!(r.possible_types[0].kind(), FileKind::Xml);
    }

    #[test]
    fn consistent_csv_lines() {
        let r = detect_by_content("id,name,score\n1,ann,3\n2,bob,4\n", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Csv);
        assert_eq!(r.confidence, CSV_CONSISTENT);
    }

    #[test]
    fn tab_separated_lines() {
        let r = detect_by_content("id\tname\n1\tann\n2\tbob\n", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Tsv);
        assert_eq!(r.confidence, TSV_CONSISTENT);
    }

    #[test]
    fn short_samples_skip_length_gated_rules() {
        // 不足 10 个字符，CSV 规则不参与
        let r = detect_by_content("a,b\n1,2", DEFAULT_CONTENT_WINDOW);
        assert_ne!(r.kind(), FileKind::Csv);
    }

    #[test]
    fn markdown_features_accumulate() {
        let md = "# Title\n\nSome text with a [link](http://x.y).\n\n- one\n- two\n";
        let r = detect_by_content(md, DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Markdown);
        assert!((r.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn sql_keywords() {
        let r = detect_by_content("CREATE TABLE users (id INTEGER PRIMARY KEY);", DEFAULT_CONTENT_WINDOW);
        assert_eq!(r.kind(), FileKind::Sql);
        assert_eq!(r.confidence, SQL_BASE);
    }

    #[test]
    fn window_limits_what_rules_see() {
        let mut text = "x".repeat(50);
        text.push_str("\nCREATE TABLE t (a int);");
        assert!(detect_by_content(&text, 40).is_unknown());
        assert_eq!(detect_by_content(&text, DEFAULT_CONTENT_WINDOW).kind(), FileKind::Sql);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn quoted_delimiters_are_ignored() {
        assert_eq!(delimiter_counts("a,\"b,c\",d\n1,2,3", ',', 5), vec![2, 2]);
    }

    #[test]
    fn plain_prose_matches_nothing() {
        assert!(detect_by_content("just some words here", DEFAULT_CONTENT_WINDOW).is_unknown());
    }
}
