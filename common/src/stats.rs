//! ダッシュボード集計モジュール
//!
//! 絞り込み済みのレコードから件数・グループ別件数・上位N件を導出する。
//! 進捗率はすべて `progress::overall_progress` の解釈規則で読む。

use crate::field_mapping::names;
use crate::progress::overall_progress;
use crate::types::{Fields, Record};
use crate::value::{display_string, is_truthy, to_number};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// 「期限間近」一覧の既定件数
pub const DEFAULT_EXPIRING_LIMIT: usize = 15;

/// モデル別グラフに出す件数
pub const TOP_MODELS: usize = 5;

/// 完了フェーズを表す値
pub const PHASE_DONE: &str = "100%";

/// 状態別件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// 100%
    pub completed: usize,
    /// 0% より大きく 100% 未満
    pub in_progress: usize,
    /// 0%
    pub pending: usize,
}

/// 状態ごとに件数を数える
pub fn status_counts<'a, I>(records: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = StatusCounts::default();
    for record in records {
        let progress = overall_progress(&record.fields);
        if progress == 100.0 {
            counts.completed += 1;
        } else if progress > 0.0 && progress < 100.0 {
            counts.in_progress += 1;
        } else if progress == 0.0 {
            counts.pending += 1;
        }
    }
    counts
}

/// グループ化の軸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    Site,
    Agent,
    Model,
}

impl GroupDimension {
    pub fn field_name(self) -> &'static str {
        match self {
            GroupDimension::Site => names::SEDE,
            GroupDimension::Agent => names::ASESOR,
            GroupDimension::Model => names::MODELO,
        }
    }

    /// 値が無いレコードのラベル
    pub fn unassigned_label(self) -> &'static str {
        match self {
            GroupDimension::Site => "Sin sede",
            GroupDimension::Agent => "Sin asignar",
            GroupDimension::Model => "Sin modelo",
        }
    }
}

/// グループ名と件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// 軸ごとに件数を数える（グループは最初に出現した順）
pub fn group_by_count<'a, I>(records: I, dimension: GroupDimension) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    count_in_order(records.into_iter().map(|r| {
        group_key(&r.fields, dimension.field_name())
            .unwrap_or_else(|| dimension.unassigned_label().to_string())
    }))
}

/// モデル別件数の先頭5グループ
///
/// 件数の多い順ではなく、最初に出現した5グループを返す。
pub fn top_models<'a, I>(records: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups = group_by_count(records, GroupDimension::Model);
    groups.truncate(TOP_MODELS);
    groups
}

/// 優先度別件数（"Prioridad n"、番号順）
pub fn priority_groups<'a, I>(records: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups = count_in_order(records.into_iter().map(|r| {
        let priority = group_key(&r.fields, names::PRIORIDAD).unwrap_or_else(|| "0".to_string());
        format!("Prioridad {}", priority)
    }));

    groups.sort_by(|a, b| {
        let pa = priority_number(&a.name);
        let pb = priority_number(&b.name);
        pa.partial_cmp(&pb).unwrap_or(Ordering::Equal)
    });
    groups
}

fn priority_number(name: &str) -> f64 {
    name.split(' ')
        .nth(1)
        .and_then(|n| n.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn group_key(fields: &Fields, field: &str) -> Option<String> {
    fields
        .get(field)
        .filter(|v| is_truthy(v))
        .map(display_string)
}

fn count_in_order(keys: impl Iterator<Item = String>) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = Vec::new();
    for key in keys {
        match groups.iter_mut().find(|g| g.name == key) {
            Some(group) => group.count += 1,
            None => groups.push(GroupCount { name: key, count: 1 }),
        }
    }
    groups
}

/// 進捗率の昇順に並べる（同率は元の順序）
pub fn sort_by_progress<'a>(records: &[&'a Record]) -> Vec<&'a Record> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        overall_progress(&a.fields)
            .partial_cmp(&overall_progress(&b.fields))
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// フェーズ別の完了率
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseRate {
    pub phase: &'static str,
    pub completed: usize,
    /// 全件に対する割合（%）
    pub rate: f64,
}

/// F1..F16 それぞれについて "100%" のレコードの割合を求める
pub fn phase_completion_rates(records: &[&Record]) -> Vec<PhaseRate> {
    let total = records.len();
    names::PHASES
        .iter()
        .map(|phase| {
            let completed = records
                .iter()
                .filter(|r| matches!(r.fields.get(phase), Some(Value::String(s)) if s == PHASE_DONE))
                .count();
            let rate = if total == 0 {
                0.0
            } else {
                completed as f64 / total as f64 * 100.0
            };
            PhaseRate {
                phase,
                completed,
                rate,
            }
        })
        .collect()
}

/// 残り日数（ストアの計算列）。読めなければ `None`
pub fn days_remaining(fields: &Fields) -> Option<f64> {
    to_number(fields.get(names::DIAS_RESTANTES))
}

/// 期限間近のレコード
///
/// 残り日数が0以上かつ未完了のものを残り日数の昇順に並べ、先頭 `limit` 件を返す。
pub fn expiring_soon<'a>(records: &[&'a Record], limit: usize) -> Vec<&'a Record> {
    let mut candidates: Vec<(f64, &'a Record)> = records
        .iter()
        .filter_map(|r| {
            let days = days_remaining(&r.fields)?;
            (days >= 0.0 && overall_progress(&r.fields) < 100.0).then_some((days, *r))
        })
        .collect();

    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    candidates.into_iter().take(limit).map(|(_, r)| r).collect()
}

/// ダッシュボードの集計値
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub status: StatusCounts,
    /// 平均進捗率（%）
    pub average_progress: f64,
    /// 平均残り日数
    pub average_days_remaining: f64,
}

/// 件数・状態別件数・平均値をまとめて計算する
pub fn summarize(records: &[&Record]) -> DashboardSummary {
    let total = records.len();
    if total == 0 {
        return DashboardSummary::default();
    }

    let progress_sum: f64 = records.iter().map(|r| overall_progress(&r.fields)).sum();
    let days_sum: f64 = records
        .iter()
        .map(|r| days_remaining(&r.fields).unwrap_or(0.0))
        .sum();

    DashboardSummary {
        total,
        status: status_counts(records.iter().copied()),
        average_progress: progress_sum / total as f64,
        average_days_remaining: days_sum / total as f64,
    }
}
