use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filesniff_core::{detect_file_type, load_config, read_sample, sniff_and_write, ScanOptions};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "filesniff", version, about = "按扩展名、文件头与内容识别文件类型")]
struct Cli {
    /// 配置文件路径（TOML），默认尝试 ./filesniff.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描文件或目录并生成 result.json
    Scan {
        /// 输入路径（文件或目录）
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）
        #[arg(long, default_value = "./result.json")]
        output: PathBuf,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long)]
        threads: Option<String>,

        /// 最大扫描文件大小（单位字节），超过则跳过
        #[arg(long)]
        max_file_size: Option<u64>,

        /// 每个文件采样的字节数
        #[arg(long)]
        sample_bytes: Option<usize>,

        /// 递归深度
        #[arg(long)]
        max_depth: Option<usize>,

        /// 关闭深度检查
        #[arg(long)]
        no_deep: bool,
    },
    /// 检测单个文件，输出完整结果（JSON）
    Detect {
        /// 文件路径
        path: PathBuf,

        /// 每个文件采样的字节数
        #[arg(long)]
        sample_bytes: Option<usize>,

        /// 关闭深度检查
        #[arg(long)]
        no_deep: bool,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref()).context("load config")?;
    let mut opts: ScanOptions = cfg.scan_options().context("invalid config")?;

    match cli.command {
        Commands::Scan { input, output, threads, max_file_size, sample_bytes, max_depth, no_deep } => {
            info!(?input, ?output, "starting scan");

            // 命令行参数覆盖配置文件
            if let Some(t) = threads.as_deref() { opts.threads = parse_threads(t)?; }
            if max_file_size.is_some() { opts.max_file_size = max_file_size; }
            if let Some(n) = sample_bytes { opts.max_sample_bytes = n.max(1); }
            if max_depth.is_some() { opts.max_depth = max_depth; }
            if no_deep { opts.detect.deep_inspection = false; }

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);
            let stats = sniff_and_write(&input, &mut out, &opts).context("sniff and write failed")?;
            out.flush().context("flush output")?;

            info!(
                files_scanned = stats.files_scanned,
                files_skipped = stats.files_skipped,
                unknown = stats.unknown_detected,
                outputs_written = stats.outputs_written,
                "scan finished"
            );
        }
        Commands::Detect { path, sample_bytes, no_deep } => {
            let max = sample_bytes.unwrap_or(opts.max_sample_bytes).max(1);
            let sample = read_sample(&path, max).with_context(|| format!("read {}", path.display()))?;
            let deep = opts.detect.deep_inspection && !no_deep;
            let result = detect_file_type(&sample.file, sample.text.as_deref(), Some(&sample.bytes), deep);

            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &result)?;
            writeln!(lock)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写 stderr，避免污染 detect 的 JSON 输出
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数："auto" 为 None，其他须为 ≥1 的整数
fn parse_threads(s: &str) -> Result<Option<usize>> {
    if s.eq_ignore_ascii_case("auto") { return Ok(None); }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => anyhow::bail!("invalid --threads value {s:?}, expected \"auto\" or a positive integer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn threads_parsing() {
        assert_eq!(parse_threads("auto").unwrap(), None);
        assert_eq!(parse_threads("4").unwrap(), Some(4));
        assert!(parse_threads("0").is_err());
        assert!(parse_threads("lots").is_err());
    }

    #[test]
    fn scan_flags_parse() {
        let cli = Cli::try_parse_from(["filesniff", "scan", "--input", "data", "--threads", "2", "--no-deep"]).unwrap();
        match cli.command {
            Commands::Scan { input, threads, no_deep, .. } => {
                assert_eq!(input, PathBuf::from("data"));
                assert_eq!(threads.as_deref(), Some("2"));
                assert!(no_deep);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
