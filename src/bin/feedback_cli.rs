//! feedback-cli — 反馈数据文件的查看、导出与清理工具
//!
//! Usage:
//!   feedback-cli stats [--file <path>]                 Show summary statistics
//!   feedback-cli trends [--file <path>]                Show improvement areas
//!   feedback-cli export [--file <path>] [--out <path>] Export CSV
//!   feedback-cli list [--file <path>] [--limit N]      List recent feedback
//!   feedback-cli clear --yes [--file <path>]           Delete all feedback

use anyhow::{bail, Context};
use feedback_store::{FeedbackConfig, FeedbackStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let rest = &args[2..];
    let result = match args[1].as_str() {
        "stats" => cmd_stats(rest),
        "trends" => cmd_trends(rest),
        "export" => cmd_export(rest),
        "list" => cmd_list(rest),
        "clear" => cmd_clear(rest),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"feedback-cli — 反馈数据命令行工具

USAGE:
    feedback-cli <COMMAND> [OPTIONS]

COMMANDS:
    stats                       Show totals, average and rating distribution
    trends                      Show improvement areas and dominant feedback type
    export [--out <path>]       Export CSV (stdout when --out is omitted)
    list [--limit N]            List the most recent feedback (default 5)
    clear --yes                 Delete every record and the data file
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --file <path>               Feedback data file

ENVIRONMENT:
    FEEDBACK_DATA_FILE          Feedback data file (default feedback_data/feedback_data.json)
    RUST_LOG                    Log filter (default warn)"#
    );
}

fn cmd_version() {
    println!("feedback-cli {}", env!("CARGO_PKG_VERSION"));
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn open_store(args: &[String], recent_limit: Option<usize>) -> anyhow::Result<FeedbackStore> {
    let mut config = FeedbackConfig::from_env().context("loading configuration")?;
    if let Some(path) = flag_value(args, "--file") {
        config = config.with_data_file(PathBuf::from(path));
    }
    if let Some(limit) = recent_limit {
        config = config.with_recent_limit(limit);
    }

    // Surface read errors here; the store itself would silently start empty.
    let probe = feedback_store::FilePersistence::from_config(&config);
    probe
        .try_load()
        .with_context(|| format!("reading {}", probe.path().display()))?;

    let mut store = FeedbackStore::new(config)?;
    store.ensure_initialized();
    Ok(store)
}

fn cmd_stats(args: &[String]) -> anyhow::Result<()> {
    let mut store = open_store(args, None)?;
    let stats = store.stats().clone();
    if stats.is_empty() {
        println!("📊 暂无反馈数据");
        return Ok(());
    }

    println!("总反馈数: {}", stats.total_count);
    println!("平均评分: {:.1}⭐", stats.average_rating);
    println!("满意度:   {:.1}%", stats.satisfaction_rate);
    println!();
    println!("评分分布:");
    for rating in (1..=5u8).rev() {
        println!(
            "  {:<5} {}次 ({:.1}%)",
            "⭐".repeat(rating as usize),
            stats.count_for(rating),
            stats.percentage_for(rating)
        );
    }
    Ok(())
}

fn cmd_trends(args: &[String]) -> anyhow::Result<()> {
    let mut store = open_store(args, None)?;
    let Some(report) = store.analyze_trends() else {
        println!("📊 暂无反馈数据");
        return Ok(());
    };

    println!("总反馈数:   {}", report.total_feedback);
    println!("平均评分:   {:.2}", report.avg_rating);
    println!("低评分数量: {}", report.low_rating_count);
    if report.improvement_areas.is_empty() {
        println!("改进建议:   无");
    } else {
        println!("改进建议:");
        for area in &report.improvement_areas {
            println!("  - {}", area);
        }
    }
    if let Some(concern) = &report.specific_concern {
        println!("集中反馈:   {}", concern);
    }
    Ok(())
}

fn cmd_export(args: &[String]) -> anyhow::Result<()> {
    let mut store = open_store(args, None)?;
    let csv = store.export_csv();
    if csv.is_empty() {
        eprintln!("⚠️ 暂无数据可导出");
        return Ok(());
    }
    match flag_value(args, "--out") {
        Some(out) => {
            std::fs::write(out, csv).with_context(|| format!("writing {}", out))?;
            println!("exported {} records to {}", store.len(), out);
        }
        None => print!("{csv}"),
    }
    Ok(())
}

fn cmd_list(args: &[String]) -> anyhow::Result<()> {
    let limit = match flag_value(args, "--limit") {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("invalid --limit {}", raw))?,
        None => feedback_store::config::DEFAULT_RECENT_LIMIT,
    };
    let mut store = open_store(args, Some(limit))?;
    let recent = store.stats().recent.clone();
    if recent.is_empty() {
        println!("📊 暂无反馈数据");
        return Ok(());
    }
    for record in recent {
        let when = record
            .parsed_timestamp()
            .map(|t| t.format("%m-%d %H:%M").to_string())
            .unwrap_or_else(|| record.timestamp.chars().take(16).collect());
        let kind = if record.feedback_type.is_empty() {
            "未知"
        } else {
            record.feedback_type.as_str()
        };
        println!(
            "• ⭐{:.1} - {} ({}) {}",
            record.effective_rating(),
            kind,
            when,
            record.interaction_id
        );
        if let Some(comment) = record.comment.as_deref().filter(|c| !c.is_empty()) {
            println!("    {}", comment);
        }
    }
    Ok(())
}

fn cmd_clear(args: &[String]) -> anyhow::Result<()> {
    if !has_flag(args, "--yes") {
        bail!("refusing to clear without --yes");
    }
    let mut store = open_store(args, None)?;
    let count = store.len();
    if !store.clear() {
        bail!("could not delete {}", store.persistence().path().display());
    }
    println!("🗑️ 已清除 {} 条反馈", count);
    Ok(())
}
