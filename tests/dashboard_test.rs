//! デモデータを使ったダッシュボードの流れのテスト
//!
//! 絞り込み → 選択肢 → 集計が一貫していることを検証

use alistamiento::cli::FilterArgs;
use alistamiento::store::{demo_records, ListStore, MemoryStore};
use alistamiento_common::stats::{self, GroupDimension};
use alistamiento_common::{
    apply_filters, apply_filters_except, CascadedOptions, FilterDimension, FilterState, Record,
};
use chrono::NaiveDate;
use tempfile::tempdir;

fn records() -> Vec<Record> {
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    MemoryStore::new(demo_records(today)).fetch_all().unwrap()
}

/// 絞り込みなしでは全件
#[test]
fn test_no_filters_returns_everything() {
    let all = records();
    let filtered = apply_filters(&all, &FilterState::default());
    assert_eq!(filtered.len(), all.len());
}

/// 選択肢はその次元以外の条件で絞った結果から作られる
#[test]
fn test_options_ignore_own_dimension() {
    let all = records();
    let state = FilterState::default().with_value(FilterDimension::Site, "Bogotá");
    let options = CascadedOptions::compute(&all, &state);

    // 自分自身の条件は無視されるので他のサイトも選べる
    assert!(options.sites.len() > 1);
    assert!(options.sites.contains(&"Bogotá".to_string()));

    // 他の次元はボゴタの機械だけから作られる
    let filtered = apply_filters(&all, &state);
    assert_eq!(filtered.len(), 3);
    assert!(options.agents.iter().all(|agent| {
        filtered
            .iter()
            .any(|r| r.fields.get("Asesor").and_then(|v| v.as_str()) == Some(agent.as_str()))
    }));
}

/// 複数の条件が有効でも、選択肢のどれを選んでも結果は空にならない
#[test]
fn test_every_offered_option_is_reachable() {
    let all = records();
    let state = FilterState::default()
        .with_value(FilterDimension::Site, "Bogotá")
        .with_value(FilterDimension::Progress, ">0");
    assert!(!apply_filters(&all, &state).is_empty());
    let options = CascadedOptions::compute(&all, &state);

    for dimension in FilterDimension::CATEGORICAL {
        for value in options.get(dimension) {
            let next = if dimension == FilterDimension::Cycle {
                state.toggle_cycle(value)
            } else {
                state.with_value(dimension, value)
            };
            assert!(
                !apply_filters(&all, &next).is_empty(),
                "{:?}={} で結果が空",
                dimension,
                value
            );
        }
    }
}

/// 除外した次元以外の条件はすべて満たす
#[test]
fn test_except_is_superset_of_full_filter() {
    let all = records();
    let state = FilterState::default()
        .with_value(FilterDimension::Site, "Medellín")
        .with_value(FilterDimension::Remarks, "Libre");

    let full = apply_filters(&all, &state);
    let relaxed = apply_filters_except(&all, &state, Some(FilterDimension::Remarks));
    assert!(full.len() <= relaxed.len());
    assert!(full.iter().all(|r| relaxed.iter().any(|x| x.id == r.id)));
}

/// 状態別件数の合計は件数と一致する
#[test]
fn test_status_counts_partition_records() {
    let all = records();
    let refs: Vec<&Record> = all.iter().collect();
    let summary = stats::summarize(&refs);

    assert_eq!(summary.total, all.len());
    assert_eq!(
        summary.status.completed + summary.status.in_progress + summary.status.pending,
        all.len()
    );
    assert_eq!(summary.status.completed, 2);
    assert_eq!(summary.status.pending, 1);

    let by_site = stats::group_by_count(refs.iter().copied(), GroupDimension::Site);
    assert_eq!(by_site.iter().map(|g| g.count).sum::<usize>(), all.len());
    assert_eq!(by_site[0].name, "Bogotá");
}

/// 期限間近は未完了かつ残り日数0以上、残り日数順
#[test]
fn test_expiring_soon_from_demo() {
    let all = records();
    let refs: Vec<&Record> = all.iter().collect();
    let expiring = stats::expiring_soon(&refs, 3);

    let days: Vec<f64> = expiring
        .iter()
        .filter_map(|r| stats::days_remaining(&r.fields))
        .collect();
    assert_eq!(days, vec![0.0, 1.0, 4.0]);
}

/// フラグとファイルから絞り込み状態を組み立てる
#[test]
fn test_filter_args_to_state() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("filtros.json");
    std::fs::write(&path, r#"{"sede": "Cali", "ciclo": ["Ciclo 1"], "porcentajeAvance": "0"}"#).unwrap();

    let args = FilterArgs {
        filtros: Some(path),
        asesor: Some("Juan Suarez".into()),
        ciclo: vec!["Ciclo 1".into(), "Ciclo 2".into()],
        compromiso_desde: Some("2025-06-01".into()),
        avance: Some(">0".into()),
        ..Default::default()
    };
    let state = args.to_state().unwrap();

    assert_eq!(state.site, "Cali");
    assert_eq!(state.agent, "Juan Suarez");
    assert_eq!(state.cycles, vec!["Ciclo 1", "Ciclo 2"]);
    assert_eq!(state.commitment_from, "2025-06-01");
    assert_eq!(state.progress, ">0");

    let bad = FilterArgs {
        final_hasta: Some("01/06/2025".into()),
        ..Default::default()
    };
    assert!(bad.to_state().is_err());
}
