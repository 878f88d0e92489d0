//! 运输统计报告.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use ctb_berry::pipeline::{SectionIssue, SideReport};
use serde::Serialize;

/// 单只动物单侧的摘要.
#[derive(Clone, Debug, PartialEq)]
pub struct SideSummary {
    pub transport: f64,
    pub processed: usize,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl From<&SideReport> for SideSummary {
    fn from(r: &SideReport) -> Self {
        let describe = |issues: &[SectionIssue]| -> Vec<String> {
            issues
                .iter()
                .map(|i| format!("{}: {}", i.name, i.error))
                .collect()
        };
        Self {
            transport: r.transport,
            processed: r.processed.len(),
            skipped: describe(&r.skipped),
            failed: describe(&r.failed),
        }
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Animal_Side")]
    key: &'a str,
    #[serde(rename = "Transport %")]
    transport: Option<f64>,
    #[serde(rename = "Processed")]
    processed: Option<usize>,
    #[serde(rename = "Skipped")]
    skipped: Option<usize>,
    #[serde(rename = "Failed")]
    failed: Option<usize>,
    #[serde(rename = "Error")]
    error: Option<&'a str>,
}

/// 整个批次的结果, 每只动物每侧一行.
#[derive(Debug, Default)]
pub struct TransportResult {
    rows: Vec<(String, Result<SideSummary, String>)>,
}

/// 将单行结果写进 `w` 中.
fn describe_into<W: Write>(
    key: &str,
    outcome: &Result<SideSummary, String>,
    w: &mut W,
) -> io::Result<()> {
    const S4: &str = "    ";

    match outcome {
        Ok(s) => {
            writeln!(w, "`{key}`: {:.1}%", s.transport)?;
            write!(w, "{S4}Processed sections: {}", s.processed)?;
            for (label, list) in [("Skipped", &s.skipped), ("Failed", &s.failed)] {
                if list.is_empty() {
                    continue;
                }
                write!(w, "\n{S4}{label} sections: {}", list.len())?;
                for item in list {
                    write!(w, "\n{S4}{S4}{item}")?;
                }
            }
        }
        Err(e) => write!(w, "`{key}` FAILED: {e}")?,
    }
    Ok(())
}

impl TransportResult {
    /// 追加一行结果.
    pub fn push(&mut self, key: String, outcome: anyhow::Result<SideSummary>) {
        self.rows.push((key, outcome.map_err(|e| format!("{e:#}"))));
    }

    /// 失败的单元个数.
    pub fn num_failed(&self) -> usize {
        self.rows.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// 打印逐单元摘要与失败汇总.
    pub fn analyze(&self) -> io::Result<()> {
        let mut buf = Vec::with_capacity(512);
        let mut stdout = io::stdout().lock();
        utils::sep_to(&mut stdout)?;
        for (key, outcome) in &self.rows {
            describe_into(key, outcome, &mut buf)?;
            writeln!(stdout, "{}", String::from_utf8_lossy(&buf))?;
            buf.clear();
            utils::sep_to(&mut stdout)?;
        }
        writeln!(
            stdout,
            "{} of {} animal/side units failed",
            self.num_failed(),
            self.rows.len()
        )
    }

    /// 以 CSV 写入 `w`.
    pub fn write_csv<W: Write>(&self, w: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(w);
        for (key, outcome) in &self.rows {
            let row = match outcome {
                Ok(s) => CsvRow {
                    key: key.as_str(),
                    transport: Some(s.transport),
                    processed: Some(s.processed),
                    skipped: Some(s.skipped.len()),
                    failed: Some(s.failed.len()),
                    error: None,
                },
                Err(e) => CsvRow {
                    key: key.as_str(),
                    transport: None,
                    processed: None,
                    skipped: None,
                    failed: None,
                    error: Some(e.as_str()),
                },
            };
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// 在 `dir` 下写入 `ctb_transport_{unix 秒}.csv`, 返回其路径.
    pub fn save(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let path = dir.join(format!("ctb_transport_{secs}.csv"));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Cannot create `{}`", path.display()))?;
        self.write_csv(file)
            .with_context(|| format!("Cannot write `{}`", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{SideSummary, TransportResult};

    fn sample() -> TransportResult {
        let mut r = TransportResult::default();
        r.push(
            "35_left".to_string(),
            Ok(SideSummary {
                transport: 65.0,
                processed: 2,
                skipped: vec!["slide 1 slice 3.tif: missing".to_string()],
                failed: vec![],
            }),
        );
        r.push("35_right".to_string(), Err(anyhow::anyhow!("no sections")));
        r
    }

    #[test]
    fn test_write_csv() {
        let r = sample();
        assert_eq!(r.num_failed(), 1);
        let mut buf = Vec::new();
        r.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Animal_Side,Transport %,Processed,Skipped,Failed,Error");
        assert_eq!(lines[1], "35_left,65.0,2,1,0,");
        assert_eq!(lines[2], "35_right,,,,,no sections");
    }
}
