//! 端末向けのテキスト出力
//!
//! 各関数は文字列を返し、出力は呼び出し側が行う。

use alistamiento_common::field_mapping::names;
use alistamiento_common::progress::{display_progress, PHASE_WEIGHTS};
use alistamiento_common::stats::{days_remaining, DashboardSummary, GroupCount, PhaseRate};
use alistamiento_common::value::{display_string, format_number, is_truthy};
use alistamiento_common::{CascadedOptions, FilterDimension, Record};
use std::fmt::{self, Write};

/// 一覧表の列（見出し, 表示名）
const COLUMNS: &[(&str, &str)] = &[
    ("Serie", names::SERIE),
    ("Modelo", names::MODELO),
    ("Cliente", names::TITLE),
    ("Sede", names::SEDE),
    ("Asesor", names::ASESOR),
    ("Ciclo", names::CICLO),
    ("Observaciones", names::OBSERVACIONES),
];

/// 列幅の上限（超えた分は … で切る）
const MAX_WIDTH: usize = 28;

/// 書き込み関数の結果を文字列で受け取る
fn render(write: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    if let Err(err) = write(&mut out) {
        tracing::warn!(error = %err, "出力の組み立てに失敗");
    }
    out
}

pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

fn cell(record: &Record, name: &str) -> String {
    match record.fields.get(name) {
        Some(v) if is_truthy(v) => display_string(v),
        _ => "-".to_string(),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_WIDTH {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_WIDTH - 1).collect();
        cut.push('…');
        cut
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

/// レコード一覧表
pub fn render_table(records: &[&Record]) -> String {
    let mut header: Vec<String> = vec!["ID".into()];
    header.extend(COLUMNS.iter().map(|(title, _)| title.to_string()));
    header.push("Avance".into());
    header.push("Días".into());

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            let mut row = vec![record.id.clone()];
            row.extend(COLUMNS.iter().map(|(_, name)| truncate(&cell(record, name))));
            row.push(percent(display_progress(&record.fields)));
            row.push(
                days_remaining(&record.fields)
                    .map(format_number)
                    .unwrap_or_else(|| "-".into()),
            );
            row
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    render(|out| {
        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| pad(c, *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        writeln!(out, "{}", line(&header))?;
        writeln!(
            out,
            "{}",
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
        )?;
        for row in &rows {
            writeln!(out, "{}", line(row))?;
        }
        write!(out, "{} registro(s)", records.len())?;
        Ok(())
    })
}

/// ダッシュボードの集計値
pub fn render_summary(summary: &DashboardSummary) -> String {
    render(|out| {
        writeln!(out, "Total de máquinas:      {}", summary.total)?;
        writeln!(out, "Completadas (100%):     {}", summary.status.completed)?;
        writeln!(out, "En proceso:             {}", summary.status.in_progress)?;
        writeln!(out, "Pendientes (0%):        {}", summary.status.pending)?;
        writeln!(out, "Avance promedio:        {}", percent(summary.average_progress))?;
        write!(
            out,
            "Días restantes promedio: {:.1}",
            summary.average_days_remaining
        )?;
        Ok(())
    })
}

/// グループ別件数（棒グラフ付き）
pub fn render_groups(title: &str, groups: &[GroupCount]) -> String {
    render(|out| {
        writeln!(out, "{}", title)?;
        let width = groups
            .iter()
            .map(|g| g.name.chars().count())
            .max()
            .unwrap_or(0);
        let max = groups.iter().map(|g| g.count).max().unwrap_or(0);

        for group in groups {
            let bar_len = if max == 0 { 0 } else { group.count * 20 / max };
            writeln!(
                out,
                "  {}  {:>3} {}",
                pad(&group.name, width),
                group.count,
                "█".repeat(bar_len.max(1))
            )?;
        }
        if groups.is_empty() {
            out.push_str("  (sin datos)\n");
        }
        Ok(())
    })
}

/// フェーズ別完了率
pub fn render_phase_rates(rates: &[PhaseRate]) -> String {
    render(|out| {
        out.push_str("Fase  Peso     Completadas  Tasa\n");
        for (rate, weight) in rates.iter().zip(PHASE_WEIGHTS.iter()) {
            writeln!(
                out,
                "{:<4}  {:>6}  {:>11}  {}",
                rate.phase,
                percent(weight * 100.0),
                rate.completed,
                percent(rate.rate)
            )?;
        }
        Ok(())
    })
}

/// 絞り込みの選択肢
pub fn render_options(options: &CascadedOptions) -> String {
    render(|out| {
        for dimension in FilterDimension::CATEGORICAL {
            let values = options.get(dimension);
            writeln!(out, "{} ({})", dimension.label(), values.len())?;
            for value in values {
                writeln!(out, "  {}", value)?;
            }
        }
        Ok(())
    })
}

/// 1台分の詳細（フェーズ状態と添付ファイル）
pub fn render_record(record: &Record, attachments: &[String]) -> String {
    render(|out| {
        writeln!(out, "ID {}", record.id)?;
        for (title, name) in COLUMNS {
            writeln!(out, "  {:<14} {}", title, cell(record, name))?;
        }
        writeln!(out, "  {:<14} {}", "OTT", cell(record, names::OTT))?;
        writeln!(out, "  {:<14} {}", "Prioridad", cell(record, names::PRIORIDAD))?;
        writeln!(out, "  {:<14} {}", "Compromiso", cell(record, names::FECHA_COMPROMISO_COMERCIAL))?;
        writeln!(out, "  {:<14} {}", "Final", cell(record, names::FECHA_FINAL_ALISTAMIENTO))?;
        writeln!(out, "  {:<14} {}", "Avance", percent(display_progress(&record.fields)))?;

        let phases: Vec<String> = names::PHASES
            .iter()
            .map(|phase| format!("{}={}", phase, cell(record, phase)))
            .collect();
        for chunk in phases.chunks(8) {
            writeln!(out, "  {}", chunk.join(" "))?;
        }

        if attachments.is_empty() {
            out.push_str("  Sin adjuntos\n");
        } else {
            writeln!(out, "  Adjuntos: {}", attachments.join(", "))?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alistamiento_common::stats::GroupCount;
    use alistamiento_common::Fields;
    use serde_json::json;

    fn record() -> Record {
        let fields: Fields = [
            ("Title", json!("Constructora Andina")),
            ("Serie", json!("SN-1")),
            ("Sede", json!("Bogotá")),
            ("PorcentajeAvanceTotal", json!(45.5)),
            ("DiasRestantes", json!(3)),
        ]
        .into_iter()
        .collect();
        Record::new("7", fields)
    }

    #[test]
    fn test_render_collects_written_lines() {
        let text = render(|out| {
            writeln!(out, "uno")?;
            write!(out, "dos {}", 2)
        });
        assert_eq!(text, "uno\ndos 2");
    }

    #[test]
    fn test_table_columns() {
        let r = record();
        let table = render_table(&[&r]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("ID"));
        assert!(lines[2].contains("SN-1"));
        assert!(lines[2].contains("45.50%"));
        assert!(lines[2].contains("Bogotá"));
        assert_eq!(lines[3], "1 registro(s)");
    }

    #[test]
    fn test_truncate_long_values() {
        let long = "x".repeat(40);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_WIDTH);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_groups_render_bars() {
        let groups = vec![
            GroupCount { name: "Bogotá".into(), count: 4 },
            GroupCount { name: "Cali".into(), count: 2 },
        ];
        let out = render_groups("Por sede", &groups);
        assert!(out.starts_with("Por sede\n"));
        assert!(out.contains(&"█".repeat(20)));
        let cali = out.lines().nth(2).unwrap();
        assert!(cali.ends_with(&format!(" {}", "█".repeat(10))));
        assert!(render_groups("Vacío", &[]).contains("sin datos"));
    }

    #[test]
    fn test_record_detail_lists_attachments() {
        let out = render_record(&record(), &["acta.pdf".into()]);
        assert!(out.contains("Adjuntos: acta.pdf"));
        assert!(out.contains("F1=-"));
    }
}
