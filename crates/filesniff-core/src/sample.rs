//! 文件采样（只读头部固定字节数）
//!
//! 检测前唯一的 I/O：按上限读取文件头部，再判断是否可作为文本样本。
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::SniffError;
use crate::types::FileInfo;

/// 单个文件的采样结果
#[derive(Debug, Clone, Default)]
pub struct FileSample {
    pub file: FileInfo,
    pub bytes: Vec<u8>,
    /// 仅当样本不像二进制时才有
    pub text: Option<String>,
}

impl FileSample {
    /// 由内存中的字节构造（不做任何 I/O）
    pub fn from_bytes(file: FileInfo, bytes: Vec<u8>) -> Self {
        let text = decode_text(&bytes);
        Self { file, bytes, text }
    }
}

/// 读取文件头部至多 `max_bytes` 字节
pub fn read_sample(path: &Path, max_bytes: usize) -> Result<FileSample, SniffError> {
    let (file, size) = open_sized(path)?;
    read_head(path, file, size, max_bytes)
}

/// 同 `read_sample`，但文件大小超过 `max_file_size` 时不读取，返回 None
pub fn read_sample_within(path: &Path, max_bytes: usize, max_file_size: Option<u64>) -> Result<Option<FileSample>, SniffError> {
    let (file, size) = open_sized(path)?;
    if max_file_size.map_or(false, |max| size > max) { return Ok(None); }
    read_head(path, file, size, max_bytes).map(Some)
}

fn open_sized(path: &Path) -> Result<(File, u64), SniffError> {
    let file = File::open(path).map_err(|e| SniffError::io(path, e))?;
    let size = file.metadata().map_err(|e| SniffError::io(path, e))?.len();
    Ok((file, size))
}

fn read_head(path: &Path, file: File, size: u64, max_bytes: usize) -> Result<FileSample, SniffError> {
    let mut bytes = Vec::with_capacity(max_bytes.min(size as usize));
    BufReader::new(file)
        .take(max_bytes as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| SniffError::io(path, e))?;

    let name = path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(FileSample::from_bytes(FileInfo::new(name, size), bytes))
}

/// 非二进制样本按 UTF-8 有损解码，并去掉 BOM
fn decode_text(bytes: &[u8]) -> Option<String> {
    if is_probably_binary(bytes) { return None; }
    let text = String::from_utf8_lossy(bytes);
    Some(text.strip_prefix('\u{feff}').unwrap_or(&*text).to_string())
}

/// 判定缓冲区是否"明显是二进制"
/// 策略（保守，尽量不误杀文本）：
/// - 只要包含任何 NUL 字节（0x00）即认为二进制；
/// - 否则统计可打印 ASCII（含 tab/CR/LF）与 UTF-8 高位字节，占比低于 25% 认为二进制。
pub fn is_probably_binary(buf: &[u8]) -> bool {
    if buf.is_empty() { return false; }
    if buf.contains(&0) { return true; }
    let printable = buf
        .iter()
        .filter(|&&b| matches!(b, 0x09 | 0x0A | 0x0D) || (0x20..=0x7E).contains(&b) || b >= 0x80)
        .count();
    (printable as f32 / buf.len() as f32) < 0.25
}
