//! 文件类型注册表（进程级常量表，只读）
//!
//! - 每个已知类型对应一个 `FileKind` 变体与一条 `FileTypeDescriptor`。
//! - 表在编译期构造，运行期不做任何修改，可在任意线程并发读取。
//! - 扩展名统一为小写、带点形式（如 `.csv`），同一扩展名只归属一个条目。
use serde::Serialize;

/// 类型大类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Data,
    Spreadsheet,
    Document,
    Image,
    Archive,
    Database,
    Other,
}

/// 已知文件类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Csv,
    Tsv,
    Json,
    Xml,
    Yaml,
    Parquet,
    Avro,
    Excel,
    Xls,
    Ods,
    Pdf,
    Word,
    Doc,
    Text,
    Markdown,
    Html,
    Png,
    Jpeg,
    Gif,
    Zip,
    Gzip,
    Tar,
    #[serde(rename = "7Z")]
    SevenZip,
    Sqlite,
    Sql,
    Unknown,
}

impl FileKind {
    /// 注册表中的描述信息
    pub fn descriptor(self) -> &'static FileTypeDescriptor {
        FILE_TYPES.iter().find(|t| t.kind == self).unwrap_or(&UNKNOWN)
    }

    pub fn canonical_name(self) -> &'static str {
        self.descriptor().canonical_name
    }
}

/// 注册表条目
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct FileTypeDescriptor {
    #[serde(skip)]
    pub kind: FileKind,
    pub category: FileCategory,
    pub canonical_name: &'static str,
    pub full_name: &'static str,
    pub mime_type: &'static str,
    pub extensions: &'static [&'static str],
    pub is_text_based: bool,
    pub description: &'static str,
    pub icon_hint: &'static str,
}

impl FileTypeDescriptor {
    pub fn has_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// 未知类型哨兵条目
pub static UNKNOWN: FileTypeDescriptor = UNKNOWN_ENTRY;

/// 注册表（按此顺序进行扩展名查找）
pub static FILE_TYPES: &[FileTypeDescriptor] = &[
    FileTypeDescriptor {
        kind: FileKind::Csv,
        category: FileCategory::Data,
        canonical_name: "CSV",
        full_name: "Comma-Separated Values",
        mime_type: "text/csv",
        extensions: &[".csv"],
        is_text_based: true,
        description: "Tabular data with comma-delimited fields",
        icon_hint: "table",
    },
    FileTypeDescriptor {
        kind: FileKind::Tsv,
        category: FileCategory::Data,
        canonical_name: "TSV",
        full_name: "Tab-Separated Values",
        mime_type: "text/tab-separated-values",
        extensions: &[".tsv", ".tab"],
        is_text_based: true,
        description: "Tabular data with tab-delimited fields",
        icon_hint: "table",
    },
    FileTypeDescriptor {
        kind: FileKind::Json,
        category: FileCategory::Data,
        canonical_name: "JSON",
        full_name: "JavaScript Object Notation",
        mime_type: "application/json",
        extensions: &[".json", ".jsonl", ".ndjson", ".geojson"],
        is_text_based: true,
        description: "Structured data in JSON syntax",
        icon_hint: "code",
    },
    FileTypeDescriptor {
        kind: FileKind::Xml,
        category: FileCategory::Data,
        canonical_name: "XML",
        full_name: "Extensible Markup Language",
        mime_type: "application/xml",
        extensions: &[".xml", ".xsd", ".xsl", ".svg"],
        is_text_based: true,
        description: "Hierarchical markup data",
        icon_hint: "code",
    },
    FileTypeDescriptor {
        kind: FileKind::Yaml,
        category: FileCategory::Data,
        canonical_name: "YAML",
        full_name: "YAML Ain't Markup Language",
        mime_type: "application/yaml",
        extensions: &[".yaml", ".yml"],
        is_text_based: true,
        description: "Human-readable configuration and data",
        icon_hint: "settings",
    },
    FileTypeDescriptor {
        kind: FileKind::Parquet,
        category: FileCategory::Data,
        canonical_name: "PARQUET",
        full_name: "Apache Parquet",
        mime_type: "application/vnd.apache.parquet",
        extensions: &[".parquet"],
        is_text_based: false,
        description: "Columnar storage format",
        icon_hint: "database",
    },
    FileTypeDescriptor {
        kind: FileKind::Avro,
        category: FileCategory::Data,
        canonical_name: "AVRO",
        full_name: "Apache Avro",
        mime_type: "application/avro",
        extensions: &[".avro"],
        is_text_based: false,
        description: "Row-oriented binary serialization",
        icon_hint: "database",
    },
    FileTypeDescriptor {
        kind: FileKind::Excel,
        category: FileCategory::Spreadsheet,
        canonical_name: "EXCEL",
        full_name: "Microsoft Excel (OOXML)",
        mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        extensions: &[".xlsx", ".xlsm"],
        is_text_based: false,
        description: "Excel workbook",
        icon_hint: "grid",
    },
    FileTypeDescriptor {
        kind: FileKind::Xls,
        category: FileCategory::Spreadsheet,
        canonical_name: "XLS",
        full_name: "Microsoft Excel 97-2003",
        mime_type: "application/vnd.ms-excel",
        extensions: &[".xls"],
        is_text_based: false,
        description: "Legacy Excel workbook",
        icon_hint: "grid",
    },
    FileTypeDescriptor {
        kind: FileKind::Ods,
        category: FileCategory::Spreadsheet,
        canonical_name: "ODS",
        full_name: "OpenDocument Spreadsheet",
        mime_type: "application/vnd.oasis.opendocument.spreadsheet",
        extensions: &[".ods"],
        is_text_based: false,
        description: "OpenDocument workbook",
        icon_hint: "grid",
    },
    FileTypeDescriptor {
        kind: FileKind::Pdf,
        category: FileCategory::Document,
        canonical_name: "PDF",
        full_name: "Portable Document Format",
        mime_type: "application/pdf",
        extensions: &[".pdf"],
        is_text_based: false,
        description: "Fixed-layout document",
        icon_hint: "file-text",
    },
    FileTypeDescriptor {
        kind: FileKind::Word,
        category: FileCategory::Document,
        canonical_name: "WORD",
        full_name: "Microsoft Word (OOXML)",
        mime_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        extensions: &[".docx"],
        is_text_based: false,
        description: "Word document",
        icon_hint: "file-text",
    },
    FileTypeDescriptor {
        kind: FileKind::Doc,
        category: FileCategory::Document,
        canonical_name: "DOC",
        full_name: "Microsoft Word 97-2003",
        mime_type: "application/msword",
        extensions: &[".doc"],
        is_text_based: false,
        description: "Legacy Word document",
        icon_hint: "file-text",
    },
    FileTypeDescriptor {
        kind: FileKind::Text,
        category: FileCategory::Document,
        canonical_name: "TEXT",
        full_name: "Plain Text",
        mime_type: "text/plain",
        extensions: &[".txt", ".log", ".text"],
        is_text_based: true,
        description: "Unstructured plain text",
        icon_hint: "file-text",
    },
    FileTypeDescriptor {
        kind: FileKind::Markdown,
        category: FileCategory::Document,
        canonical_name: "MARKDOWN",
        full_name: "Markdown",
        mime_type: "text/markdown",
        extensions: &[".md", ".markdown"],
        is_text_based: true,
        description: "Lightweight markup text",
        icon_hint: "file-text",
    },
    FileTypeDescriptor {
        kind: FileKind::Html,
        category: FileCategory::Document,
        canonical_name: "HTML",
        full_name: "HyperText Markup Language",
        mime_type: "text/html",
        extensions: &[".html", ".htm"],
        is_text_based: true,
        description: "Web page markup",
        icon_hint: "globe",
    },
    FileTypeDescriptor {
        kind: FileKind::Png,
        category: FileCategory::Image,
        canonical_name: "PNG",
        full_name: "Portable Network Graphics",
        mime_type: "image/png",
        extensions: &[".png"],
        is_text_based: false,
        description: "Lossless raster image",
        icon_hint: "image",
    },
    FileTypeDescriptor {
        kind: FileKind::Jpeg,
        category: FileCategory::Image,
        canonical_name: "JPEG",
        full_name: "JPEG Image",
        mime_type: "image/jpeg",
        extensions: &[".jpg", ".jpeg"],
        is_text_based: false,
        description: "Lossy raster image",
        icon_hint: "image",
    },
    FileTypeDescriptor {
        kind: FileKind::Gif,
        category: FileCategory::Image,
        canonical_name: "GIF",
        full_name: "Graphics Interchange Format",
        mime_type: "image/gif",
        extensions: &[".gif"],
        is_text_based: false,
        description: "Palette-based raster image",
        icon_hint: "image",
    },
    FileTypeDescriptor {
        kind: FileKind::Zip,
        category: FileCategory::Archive,
        canonical_name: "ZIP",
        full_name: "ZIP Archive",
        mime_type: "application/zip",
        extensions: &[".zip"],
        is_text_based: false,
        description: "Compressed archive",
        icon_hint: "archive",
    },
    FileTypeDescriptor {
        kind: FileKind::Gzip,
        category: FileCategory::Archive,
        canonical_name: "GZIP",
        full_name: "GNU Zip",
        mime_type: "application/gzip",
        extensions: &[".gz", ".tgz"],
        is_text_based: false,
        description: "Gzip-compressed stream",
        icon_hint: "archive",
    },
    FileTypeDescriptor {
        kind: FileKind::Tar,
        category: FileCategory::Archive,
        canonical_name: "TAR",
        full_name: "Tape Archive",
        mime_type: "application/x-tar",
        extensions: &[".tar"],
        is_text_based: false,
        description: "Uncompressed archive",
        icon_hint: "archive",
    },
    FileTypeDescriptor {
        kind: FileKind::SevenZip,
        category: FileCategory::Archive,
        canonical_name: "7Z",
        full_name: "7-Zip Archive",
        mime_type: "application/x-7z-compressed",
        extensions: &[".7z"],
        is_text_based: false,
        description: "7-Zip compressed archive",
        icon_hint: "archive",
    },
    FileTypeDescriptor {
        kind: FileKind::Sqlite,
        category: FileCategory::Database,
        canonical_name: "SQLITE",
        full_name: "SQLite Database",
        mime_type: "application/vnd.sqlite3",
        extensions: &[".sqlite", ".sqlite3", ".db"],
        is_text_based: false,
        description: "Embedded relational database",
        icon_hint: "database",
    },
    FileTypeDescriptor {
        kind: FileKind::Sql,
        category: FileCategory::Database,
        canonical_name: "SQL",
        full_name: "SQL Script",
        mime_type: "application/sql",
        extensions: &[".sql"],
        is_text_based: true,
        description: "SQL statements or dump",
        icon_hint: "database",
    },
    UNKNOWN_ENTRY,
];

// 哨兵条目：同时作为 `UNKNOWN` 与注册表末项
const UNKNOWN_ENTRY: FileTypeDescriptor = FileTypeDescriptor {
    kind: FileKind::Unknown,
    category: FileCategory::Other,
    canonical_name: "UNKNOWN",
    full_name: "Unknown",
    mime_type: "application/octet-stream",
    extensions: &[],
    is_text_based: false,
    description: "Unrecognized file type",
    icon_hint: "file",
};

/// 遍历全部注册条目（注册表顺序）
pub fn all_types() -> impl Iterator<Item = &'static FileTypeDescriptor> {
    FILE_TYPES.iter()
}

/// 按规范名查找（大小写不敏感）
pub fn lookup_by_name(name: &str) -> Option<&'static FileTypeDescriptor> {
    FILE_TYPES.iter().find(|t| t.canonical_name.eq_ignore_ascii_case(name))
}

/// 按扩展名查找：接受 `csv` / `.csv` / `.CSV` 等形式
pub fn lookup_by_extension(ext: &str) -> Option<&'static FileTypeDescriptor> {
    let ext = ext.trim();
    if ext.is_empty() || ext == "." { return None; }
    let dotted = if ext.starts_with('.') { ext.to_ascii_lowercase() } else { format!(".{}", ext.to_ascii_lowercase()) };
    FILE_TYPES.iter().find(|t| t.has_extension(&dotted))
}

/// 取文件名最后一个 `.` 之后的后缀（小写、带点）；无后缀返回 None
pub fn extension_of(file_name: &str) -> Option<String> {
    let (_, suffix) = file_name.rsplit_once('.')?;
    if suffix.is_empty() { return None; }
    Some(format!(".{}", suffix.to_ascii_lowercase()))
}
