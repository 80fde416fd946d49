//! 目录扫描主流程与并行调度
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::detector::FileTypeDetector;
use crate::options::{ScanOptions, ScanStats};
use crate::result::DetectionResult;
use crate::sample::read_sample_within;
use crate::types::OutputItem;

/// 单个文件的处理结果；None 表示跳过（超限或读取失败）
type Outcome = Option<DetectionResult>;

/// 扫描 `input`（文件或目录）并将结果以 JSON 数组流式写入 `out`
/// 稳定性保证：先收集文件并按路径排序，串行与并行的输出顺序一致。
pub fn sniff_and_write(input: &Path, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    let files = collect_files(input, opts.max_depth).with_context(|| format!("walk {}", input.display()))?;
    let detector = FileTypeDetector::new(opts.detect);
    let mut stats = ScanStats::default();

    // 决策：线程数>1 且文件数>1 时走并行调度；否则串行
    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    info!(files = files.len(), threads, "sniffing");

    write!(out, "[")?;
    let mut first = true;
    if threads > 1 && files.len() > 1 {
        sniff_parallel(&files, out, opts, detector, threads, &mut stats, &mut first)?;
    } else {
        for path in &files {
            let outcome = sniff_one(path, opts, &detector);
            write_outcome(out, path, outcome, &mut stats, &mut first)?;
        }
    }
    write!(out, "]")?;

    info!(
        files_scanned = stats.files_scanned,
        files_skipped = stats.files_skipped,
        unknown = stats.unknown_detected,
        "sniff finished"
    );
    Ok(stats)
}

/// 遍历输入（单文件直接返回自身），按路径排序
fn collect_files(input: &Path, max_depth: Option<usize>) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(input).follow_links(false);
    if let Some(depth) = max_depth { walker = walker.max_depth(depth); }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            // 根路径本身不可访问时直接报错，子项错误跳过
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => { warn!(error = %e, "skipping unreadable entry"); continue; }
        };
        if entry.file_type().is_file() { files.push(entry.into_path()); }
    }
    files.sort();
    Ok(files)
}

/// 采样 + 检测单个文件
fn sniff_one(path: &Path, opts: &ScanOptions, detector: &FileTypeDetector) -> Outcome {
    let sample = match read_sample_within(path, opts.max_sample_bytes, opts.max_file_size) {
        Ok(Some(s)) => s,
        Ok(None) => { debug!(path = %path.display(), "over size limit"); return None; }
        Err(e) => { warn!(error = %e, "sample failed"); return None; }
    };
    Some(detector.detect(&sample.file, sample.text.as_deref(), Some(&sample.bytes)))
}

fn write_outcome(out: &mut dyn Write, path: &Path, outcome: Outcome, stats: &mut ScanStats, first: &mut bool) -> Result<()> {
    let result = match outcome {
        Some(r) => r,
        None => { stats.files_skipped += 1; return Ok(()); }
    };
    stats.files_scanned += 1;
    if result.is_unknown() { stats.unknown_detected += 1; }

    let path_str = path.to_string_lossy();
    let item = OutputItem::from_result(&path_str, &result);
    if !*first { write!(out, ",")?; } else { *first = false; }
    serde_json::to_writer(&mut *out, &item)?;
    stats.outputs_written += 1;
    Ok(())
}

/// 并行调度：
/// - Rayon 线程池并行采样与检测
/// - 当前线程作为唯一 Writer，按 idx 重排后流式写 JSON，保证稳定顺序
fn sniff_parallel(
    files: &[PathBuf],
    out: &mut dyn Write,
    opts: &ScanOptions,
    detector: FileTypeDetector,
    threads: usize,
    stats: &mut ScanStats,
    first: &mut bool,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().context("build rayon pool")?;

    // 通道用于 worker → writer 传递结果
    let (tx, rx) = channel::bounded::<(usize, Outcome)>(256);
    let jobs: Vec<(usize, PathBuf)> = files.iter().cloned().enumerate().collect();
    let worker_opts = opts.clone();

    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            jobs.par_iter().for_each_with(tx, |tx, (idx, path)| {
                let _ = tx.send((*idx, sniff_one(path, &worker_opts, &detector)));
            });
        });
        // 结束后 Sender 全部被丢弃，Receiver 将收到关闭信号
    });

    // Writer：维护 next_idx 与缓存，按序输出
    let mut next_idx: usize = 0;
    let mut pending: BTreeMap<usize, Outcome> = BTreeMap::new();
    let mut write_err = None;
    'recv: while let Ok((idx, outcome)) = rx.recv() {
        pending.insert(idx, outcome);
        while let Some(outcome) = pending.remove(&next_idx) {
            if let Err(e) = write_outcome(out, &files[next_idx], outcome, stats, first) {
                write_err = Some(e);
                break 'recv;
            }
            next_idx += 1;
        }
    }

    // 丢弃 Receiver 让 worker 的 send 失败后尽快退出，再等待扫描线程结束
    drop(rx);
    let joined = scan_thread.join();
    if let Some(e) = write_err { return Err(e); }
    if joined.is_err() {
        anyhow::bail!("scan worker panicked");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_single_file_input() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let files = collect_files(tmp.path(), None).unwrap();
        assert_eq!(files, vec![tmp.path().to_path_buf()]);
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(collect_files(Path::new("/no/such/dir/for/filesniff"), None).is_err());
    }

    #[test]
    fn depth_limit_applies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("top.txt"), "x").unwrap();
        std::fs::write(dir.path().join("nested").join("deep.txt"), "y").unwrap();
        assert_eq!(collect_files(dir.path(), Some(1)).unwrap().len(), 1);
        assert_eq!(collect_files(dir.path(), None).unwrap().len(), 2);
    }

    /// 任何写入都失败的输出
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parallel_write_failure_is_returned_after_workers_stop() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<PathBuf> = (0..32)
            .map(|i| {
                let p = dir.path().join(format!("f{i:02}.csv"));
                std::fs::write(&p, "a,b\n1,2\n").unwrap();
                p
            })
            .collect();

        let opts = ScanOptions::default();
        let mut stats = ScanStats::default();
        let mut first = true;
        let res = sniff_parallel(&files, &mut BrokenSink, &opts, FileTypeDetector::new(opts.detect), 4, &mut stats, &mut first);
        assert!(res.is_err());
        assert_eq!(stats.outputs_written, 0);
    }
}
