//! 文件类型检测核心库
//!
//! 设计要点：
//! - 多阶段启发式：扩展名 → 二进制签名 → 文本内容 → 深度检查（可选），
//!   每个阶段独立产出带置信度的结果，再由统一的合并规则折叠。
//! - 注册表、签名表、内容规则表均为进程级只读常量，检测本身无副作用，可并发调用。
//! - 检测是全函数：任何输入组合都返回结果，无法判断时为 UNKNOWN / 0。
//! - 文件 I/O 只发生在采样（固定上限）与目录扫描中，与检测逻辑分离。

mod config;
mod detector;
mod error;
mod inspect;
mod options;
mod patterns;
mod registry;
mod result;
mod sample;
mod scan;
mod signatures;
mod types;

pub use config::{load_config, SniffConfig, Threads, DEFAULT_CONFIG_PATH};
pub use detector::{detect_by_extension, detect_file_type, FileTypeDetector, EXTENSION_CONFIDENCE};
pub use error::SniffError;
pub use inspect::{deep_inspect, Refiner, DEEP_INSPECTION_THRESHOLD};
pub use options::{DetectOptions, ScanOptions, ScanStats, DEFAULT_SAMPLE_BYTES};
pub use patterns::{detect_by_content, ContentPatternRule, CONTENT_RULES, DEFAULT_CONTENT_WINDOW};
pub use registry::{
    all_types, extension_of, lookup_by_extension, lookup_by_name, FileCategory, FileKind, FileTypeDescriptor,
    FILE_TYPES, UNKNOWN,
};
pub use result::{merge_results, DetectionResult, TypeCandidate, ALTERNATIVE_FLOOR, MAX_ALTERNATIVES};
pub use sample::{is_probably_binary, read_sample, read_sample_within, FileSample};
pub use scan::sniff_and_write;
pub use signatures::{detect_by_signature, BinarySignatureRule, SIGNATURE_CONFIDENCE, SIGNATURE_RULES};
pub use types::{AlternativeItem, FileInfo, OutputItem};
