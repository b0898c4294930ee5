//! Report generation for screen results.
//!
//! Generates reports in two formats:
//! - JSON (for programmatic use; the canonical output)
//! - Markdown (for reading)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use screener_common::Error;

use super::engine::ScreenResult;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// JSON format (machine-readable)
    #[default]
    Json,
    /// Markdown format (human-readable)
    Markdown,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(Error::InvalidInput(format!("Unknown report format: {}", s))),
        }
    }
}

// ============================================================================
// Screen Report
// ============================================================================

/// Report generator for screen results.
pub struct ScreenReport {
    result: ScreenResult,
}

impl ScreenReport {
    pub fn new(result: ScreenResult) -> Self {
        Self { result }
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Markdown => self.to_markdown(),
        }
    }

    /// Save report to file. A missing extension is filled in from the format.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format);

        let file_path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create report directory")?;
        }

        std::fs::write(&file_path, content)
            .with_context(|| format!("Failed to write report file {}", file_path.display()))?;

        Ok(file_path)
    }

    /// Pretty-printed JSON with Chinese text left unescaped.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut md = String::new();

        md.push_str(&format!(
            "# A股筛选结果\n\n**范围**: {}\n**时间**: {}\n\n",
            r.scope,
            r.screen_time.format("%Y-%m-%d %H:%M:%S")
        ));

        md.push_str("## 筛选摘要\n\n");
        md.push_str(&format!("- **扫描**: {} 只股票\n", r.total_scanned));
        md.push_str(&format!("- **入选**: {} 只股票\n\n", r.count));

        if !r.filter_results.is_empty() {
            md.push_str("### 筛选漏斗\n\n");
            md.push_str("| 条件 | 列 | 通过 | 淘汰 | 淘汰率 |\n");
            md.push_str("|------|----|------|------|--------|\n");
            for fr in &r.filter_results {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.1}% |\n",
                    fr.stage,
                    fr.column.as_deref().unwrap_or("(缺失，跳过)"),
                    fr.passed,
                    fr.eliminated,
                    fr.elimination_rate
                ));
            }
            md.push('\n');
        }

        md.push_str("## 入选股票\n\n");
        if r.results.is_empty() {
            md.push_str("_无符合条件的股票_\n");
            return md;
        }

        md.push_str("| # | 代码 | 名称 | 最新价 | 涨跌幅 | 市盈率 | 市净率 | 总市值(亿) | 评分 |\n");
        md.push_str("|---|------|------|--------|--------|--------|--------|------------|------|\n");
        for (i, row) in r.results.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                row.code,
                row.name,
                cell(row.price, 2),
                row.change_pct.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "-".into()),
                cell(row.pe, 2),
                cell(row.pb, 2),
                cell(row.market_cap_yi, 2),
                row.score
            ));
        }

        md
    }

    pub fn result(&self) -> &ScreenResult {
        &self.result
    }
}

fn cell(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", decimals, v))
}

// ============================================================================
// Tests
// ============================================================================
