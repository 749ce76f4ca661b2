//! カスケードフィルタモジュール
//!
//! 全レコードとフィルタ状態から、
//! - すべての条件を満たすレコード
//! - 各ドロップダウンの選択肢（その次元「以外」の条件だけで絞った値の一覧）
//! を計算する。
//!
//! 状態は毎回まるごと置き換える前提で、結果はキャッシュしない。

use crate::collate::sort_locale;
use crate::date;
use crate::error::{Error, Result};
use crate::field_mapping::{internal_name, names};
use crate::progress::overall_progress;
use crate::types::{Fields, Record};
use crate::value::{display_string, is_truthy};
use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// フィルタ状態のスナップショット
///
/// すべて空文字（ciclo は空集合）のとき絞り込みなし。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    #[serde(rename = "sede")]
    pub site: String,
    #[serde(rename = "asesor")]
    pub agent: String,
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "serie")]
    pub serial: String,
    /// UIでは選択できるが絞り込みには使われない
    #[serde(rename = "fase")]
    pub phase: String,
    #[serde(rename = "observaciones")]
    pub remarks: String,
    /// 複数選択
    #[serde(rename = "ciclo")]
    pub cycles: Vec<String>,
    #[serde(rename = "fechaCompromisoDesde")]
    pub commitment_from: String,
    #[serde(rename = "fechaCompromisoHasta")]
    pub commitment_to: String,
    #[serde(rename = "fechaFinalDesde")]
    pub final_from: String,
    #[serde(rename = "fechaFinalHasta")]
    pub final_to: String,
    /// "100" | ">0" | "0" | ""
    #[serde(rename = "porcentajeAvance")]
    pub progress: String,
}

/// フィルタの次元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterDimension {
    Site,
    Agent,
    Client,
    Serial,
    Phase,
    Remarks,
    Cycle,
    CommitmentDate,
    FinalDate,
    Progress,
}

impl FilterDimension {
    /// 選択肢を持つ次元（ドロップダウン）
    pub const CATEGORICAL: [FilterDimension; 6] = [
        FilterDimension::Site,
        FilterDimension::Agent,
        FilterDimension::Client,
        FilterDimension::Serial,
        FilterDimension::Remarks,
        FilterDimension::Cycle,
    ];

    /// 対応するフィールドの表示名
    pub fn field_name(self) -> Option<&'static str> {
        match self {
            FilterDimension::Site => Some(names::SEDE),
            FilterDimension::Agent => Some(names::ASESOR),
            FilterDimension::Client => Some(names::TITLE),
            FilterDimension::Serial => Some(names::SERIE),
            FilterDimension::Remarks => Some(names::OBSERVACIONES),
            FilterDimension::Cycle => Some(names::CICLO),
            FilterDimension::CommitmentDate => Some(names::FECHA_COMPROMISO_COMERCIAL),
            FilterDimension::FinalDate => Some(names::FECHA_FINAL_ALISTAMIENTO),
            FilterDimension::Phase | FilterDimension::Progress => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterDimension::Site => "Sede",
            FilterDimension::Agent => "Asesor",
            FilterDimension::Client => "Cliente",
            FilterDimension::Serial => "Serie",
            FilterDimension::Phase => "Fase",
            FilterDimension::Remarks => "Observaciones",
            FilterDimension::Cycle => "Ciclo",
            FilterDimension::CommitmentDate => "Fecha compromiso",
            FilterDimension::FinalDate => "Fecha final alistamiento",
            FilterDimension::Progress => "Porcentaje de avance",
        }
    }
}

/// 進捗率の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressBucket {
    /// 100%
    Completed,
    /// 0% より大きく 100% 未満
    InProgress,
    /// 0%
    NotStarted,
}

impl ProgressBucket {
    /// "100" / ">0" / "0" を解釈する。それ以外は `None`（絞り込みなし）
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "100" => Some(ProgressBucket::Completed),
            ">0" => Some(ProgressBucket::InProgress),
            "0" => Some(ProgressBucket::NotStarted),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressBucket::Completed => "100",
            ProgressBucket::InProgress => ">0",
            ProgressBucket::NotStarted => "0",
        }
    }

    pub fn contains(self, progress: f64) -> bool {
        match self {
            ProgressBucket::Completed => progress == 100.0,
            ProgressBucket::InProgress => progress > 0.0 && progress < 100.0,
            ProgressBucket::NotStarted => progress == 0.0,
        }
    }
}

impl FilterState {
    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let state: Self = serde_json::from_str(json)?;
        Ok(state)
    }

    /// JSONファイルから読み込み（内容も検証する）
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let state = Self::from_json(&content)?;
        state.validate()?;
        Ok(state)
    }

    /// 日付が `YYYY-MM-DD`、進捗区分が既知の値か確認する
    ///
    /// 絞り込み自体は不正な値でも失敗しない（区分は無視、日付は文字列比較）。
    pub fn validate(&self) -> Result<()> {
        for date in [
            &self.commitment_from,
            &self.commitment_to,
            &self.final_from,
            &self.final_to,
        ] {
            if !date.is_empty() && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                return Err(Error::InvalidFilter(format!("fecha no válida '{}'", date)));
            }
        }

        if !self.progress.is_empty() && self.progress_bucket().is_none() {
            return Err(Error::InvalidFilter(format!(
                "porcentajeAvance no válido '{}'",
                self.progress
            )));
        }
        Ok(())
    }

    /// すべて解除した状態
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn progress_bucket(&self) -> Option<ProgressBucket> {
        ProgressBucket::parse(&self.progress)
    }

    /// 次元ごとに有効な条件があるか
    pub fn is_active(&self, dimension: FilterDimension) -> bool {
        match dimension {
            FilterDimension::Site => !self.site.is_empty(),
            FilterDimension::Agent => !self.agent.is_empty(),
            FilterDimension::Client => !self.client.is_empty(),
            FilterDimension::Serial => !self.serial.is_empty(),
            FilterDimension::Phase => !self.phase.is_empty(),
            FilterDimension::Remarks => !self.remarks.is_empty(),
            FilterDimension::Cycle => !self.cycles.is_empty(),
            FilterDimension::CommitmentDate => {
                !self.commitment_from.is_empty() || !self.commitment_to.is_empty()
            }
            FilterDimension::FinalDate => !self.final_from.is_empty() || !self.final_to.is_empty(),
            FilterDimension::Progress => !self.progress.is_empty(),
        }
    }

    /// 何か1つでも条件が入っているか
    pub fn has_active_filters(&self) -> bool {
        self.text_values().iter().any(|v| !v.is_empty()) || !self.cycles.is_empty()
    }

    fn text_values(&self) -> [&str; 11] {
        [
            self.site.as_str(),
            self.agent.as_str(),
            self.client.as_str(),
            self.serial.as_str(),
            self.phase.as_str(),
            self.remarks.as_str(),
            self.commitment_from.as_str(),
            self.commitment_to.as_str(),
            self.final_from.as_str(),
            self.final_to.as_str(),
            self.progress.as_str(),
        ]
    }

    /// 単一値の次元を差し替えた新しい状態を返す
    ///
    /// 日付範囲は `with_commitment_range` / `with_final_range` を使う。
    /// ciclo に渡した値は単独選択になる（空文字なら解除）。
    pub fn with_value(&self, dimension: FilterDimension, value: &str) -> Self {
        let mut next = self.clone();
        let value = value.to_string();
        match dimension {
            FilterDimension::Site => next.site = value,
            FilterDimension::Agent => next.agent = value,
            FilterDimension::Client => next.client = value,
            FilterDimension::Serial => next.serial = value,
            FilterDimension::Phase => next.phase = value,
            FilterDimension::Remarks => next.remarks = value,
            FilterDimension::Progress => next.progress = value,
            FilterDimension::Cycle => {
                next.cycles = if value.is_empty() { Vec::new() } else { vec![value] }
            }
            FilterDimension::CommitmentDate => {
                next.commitment_from = value.clone();
                next.commitment_to = value;
            }
            FilterDimension::FinalDate => {
                next.final_from = value.clone();
                next.final_to = value;
            }
        }
        next
    }

    pub fn with_commitment_range(&self, from: &str, to: &str) -> Self {
        Self {
            commitment_from: from.to_string(),
            commitment_to: to.to_string(),
            ..self.clone()
        }
    }

    pub fn with_final_range(&self, from: &str, to: &str) -> Self {
        Self {
            final_from: from.to_string(),
            final_to: to.to_string(),
            ..self.clone()
        }
    }

    /// ciclo の選択を切り替える（あれば外し、無ければ末尾に追加）
    pub fn toggle_cycle(&self, cycle: &str) -> Self {
        let mut cycles = self.cycles.clone();
        if let Some(pos) = cycles.iter().position(|c| c == cycle) {
            cycles.remove(pos);
        } else {
            cycles.push(cycle.to_string());
        }
        Self {
            cycles,
            ..self.clone()
        }
    }

    /// 現在の選択肢すべてを選ぶ
    pub fn select_all_cycles(&self, options: &[String]) -> Self {
        Self {
            cycles: options.to_vec(),
            ..self.clone()
        }
    }

    pub fn clear_cycles(&self) -> Self {
        Self {
            cycles: Vec::new(),
            ..self.clone()
        }
    }

    /// レコードがすべての条件を満たすか（`except` の次元は無視）
    pub fn matches_in<Tz: TimeZone>(
        &self,
        fields: &Fields,
        except: Option<FilterDimension>,
        tz: &Tz,
    ) -> bool {
        self.matches_text(fields, except, FilterDimension::Site, &self.site)
            && self.matches_text(fields, except, FilterDimension::Agent, &self.agent)
            && self.matches_text(fields, except, FilterDimension::Client, &self.client)
            && self.matches_text(fields, except, FilterDimension::Serial, &self.serial)
            && self.matches_text(fields, except, FilterDimension::Remarks, &self.remarks)
            && self.matches_cycle(fields, except)
            && self.matches_date_range(
                fields,
                except,
                FilterDimension::CommitmentDate,
                (self.commitment_from.as_str(), self.commitment_to.as_str()),
                tz,
            )
            && self.matches_date_range(
                fields,
                except,
                FilterDimension::FinalDate,
                (self.final_from.as_str(), self.final_to.as_str()),
                tz,
            )
            && self.matches_progress(fields, except)
    }

    /// ローカルタイムゾーンでの `matches_in`
    pub fn matches(&self, fields: &Fields, except: Option<FilterDimension>) -> bool {
        self.matches_in(fields, except, &Local)
    }

    fn matches_text(
        &self,
        fields: &Fields,
        except: Option<FilterDimension>,
        dimension: FilterDimension,
        wanted: &str,
    ) -> bool {
        if except == Some(dimension) || wanted.is_empty() {
            return true;
        }
        let Some(field) = dimension.field_name() else {
            return true;
        };
        matches!(fields.get(field), Some(Value::String(s)) if s == wanted)
    }

    fn matches_cycle(&self, fields: &Fields, except: Option<FilterDimension>) -> bool {
        if except == Some(FilterDimension::Cycle) || self.cycles.is_empty() {
            return true;
        }
        let cycle = match fields.get(names::CICLO) {
            Some(value @ (Value::String(_) | Value::Number(_))) => display_string(value),
            _ => String::new(),
        };
        self.cycles.contains(&cycle)
    }

    fn matches_date_range<Tz: TimeZone>(
        &self,
        fields: &Fields,
        except: Option<FilterDimension>,
        dimension: FilterDimension,
        (from, to): (&str, &str),
        tz: &Tz,
    ) -> bool {
        if except == Some(dimension) || (from.is_empty() && to.is_empty()) {
            return true;
        }
        let Some(field) = dimension.field_name() else {
            return true;
        };

        // 範囲指定中は日付が無い・読めないレコードを落とす
        let value = match fields.get(field) {
            Some(v) if is_truthy(v) => v,
            _ => return false,
        };
        let Some(day) = date::to_date_only_string_in(value, tz) else {
            return false;
        };

        if !from.is_empty() && day.as_str() < from {
            return false;
        }
        if !to.is_empty() && day.as_str() > to {
            return false;
        }
        true
    }

    fn matches_progress(&self, fields: &Fields, except: Option<FilterDimension>) -> bool {
        if except == Some(FilterDimension::Progress) {
            return true;
        }
        match self.progress_bucket() {
            Some(bucket) => bucket.contains(overall_progress(fields)),
            None => true,
        }
    }
}

/// すべての条件で絞り込む
pub fn apply_filters<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
    apply_filters_except_in(records, state, None, &Local)
}

/// 指定次元以外の条件で絞り込む
pub fn apply_filters_except<'a>(
    records: &'a [Record],
    state: &FilterState,
    except: Option<FilterDimension>,
) -> Vec<&'a Record> {
    apply_filters_except_in(records, state, except, &Local)
}

/// タイムゾーン指定版
pub fn apply_filters_except_in<'a, Tz: TimeZone>(
    records: &'a [Record],
    state: &FilterState,
    except: Option<FilterDimension>,
    tz: &Tz,
) -> Vec<&'a Record> {
    let filtered: Vec<&Record> = records
        .iter()
        .filter(|r| state.matches_in(&r.fields, except, tz))
        .collect();
    tracing::debug!(
        total = records.len(),
        matched = filtered.len(),
        except = ?except,
        "filters applied"
    );
    filtered
}

/// 次元の選択肢を計算する
///
/// その次元以外の条件で絞ったレコードから値を集め、
/// 空値を除いて重複をなくし、ロケール順に並べる。
pub fn cascaded_options(
    records: &[Record],
    state: &FilterState,
    dimension: FilterDimension,
) -> Vec<String> {
    cascaded_options_in(records, state, dimension, &Local)
}

/// タイムゾーン指定版
pub fn cascaded_options_in<Tz: TimeZone>(
    records: &[Record],
    state: &FilterState,
    dimension: FilterDimension,
    tz: &Tz,
) -> Vec<String> {
    let Some(field) = dimension.field_name() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut options: Vec<String> = apply_filters_except_in(records, state, Some(dimension), tz)
        .into_iter()
        .filter_map(|r| exact_value(&r.fields, field))
        .filter(|v| is_truthy(v))
        .map(display_string)
        .filter(|v| seen.insert(v.clone()))
        .collect();

    sort_locale(&mut options);
    options
}

/// 選択肢用の値は表示名、内部名の順に完全一致で引く（あいまい一致は使わない）
fn exact_value<'a>(fields: &'a Fields, field: &str) -> Option<&'a Value> {
    fields
        .raw(field)
        .or_else(|| internal_name(field).and_then(|internal| fields.raw(internal)))
}

/// 全ドロップダウンの選択肢
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadedOptions {
    pub sites: Vec<String>,
    pub agents: Vec<String>,
    pub clients: Vec<String>,
    pub serials: Vec<String>,
    pub remarks: Vec<String>,
    pub cycles: Vec<String>,
}

impl CascadedOptions {
    pub fn compute(records: &[Record], state: &FilterState) -> Self {
        Self::compute_in(records, state, &Local)
    }

    pub fn compute_in<Tz: TimeZone>(records: &[Record], state: &FilterState, tz: &Tz) -> Self {
        Self {
            sites: cascaded_options_in(records, state, FilterDimension::Site, tz),
            agents: cascaded_options_in(records, state, FilterDimension::Agent, tz),
            clients: cascaded_options_in(records, state, FilterDimension::Client, tz),
            serials: cascaded_options_in(records, state, FilterDimension::Serial, tz),
            remarks: cascaded_options_in(records, state, FilterDimension::Remarks, tz),
            cycles: cascaded_options_in(records, state, FilterDimension::Cycle, tz),
        }
    }

    pub fn get(&self, dimension: FilterDimension) -> &[String] {
        match dimension {
            FilterDimension::Site => &self.sites,
            FilterDimension::Agent => &self.agents,
            FilterDimension::Client => &self.clients,
            FilterDimension::Serial => &self.serials,
            FilterDimension::Remarks => &self.remarks,
            FilterDimension::Cycle => &self.cycles,
            _ => &[],
        }
    }
}

/// テーブルのシリアル簡易検索（部分一致・大文字小文字無視）
///
/// ダッシュボードの serie フィルタ（完全一致）とは別の入口。
pub fn search_by_serial<'a>(records: &[&'a Record], query: &str) -> Vec<&'a Record> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .copied()
        .filter(|r| match r.fields.get(names::SERIE) {
            Some(v @ (Value::String(_) | Value::Number(_))) => {
                display_string(v).to_lowercase().contains(&needle)
            }
            _ => false,
        })
        .collect()
}
