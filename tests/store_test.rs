//! ローカルJSONストアのテスト
//!
//! 作成・更新・削除・添付と計算列の付与を検証

use alistamiento::store::{self, JsonFileStore, ListStore, DAYS_COLUMN, PROGRESS_COLUMN};
use alistamiento_common::progress::overall_progress;
use alistamiento_common::stats::days_remaining;
use alistamiento_common::{Fields, RecordDraft};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tempfile::tempdir;

fn draft(serial: &str) -> RecordDraft {
    let commitment = Local::now().date_naive() + Duration::days(5);
    RecordDraft {
        client: "Constructora Andina".into(),
        serial: serial.into(),
        priority: Some(1),
        model: "ZX200-3".into(),
        ott: "OTT-1".into(),
        agent: "Juan Guerrero".into(),
        request_date: "2025-05-02".into(),
        commitment_date: commitment.format("%Y-%m-%d").to_string(),
        cycle_start_date: "2025-05-05".into(),
        site: "Bogotá".into(),
        ..Default::default()
    }
}

/// 作成したレコードはファイルに内部名で保存され、正規化されて返る
#[test]
fn test_create_persists_internal_names() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datos.json");
    let mut store = JsonFileStore::open(&path).unwrap();

    let mut form = draft("SN-1");
    form.phases[0] = "100%".into();
    let created = store.create(form.to_store_fields().unwrap()).unwrap();

    assert_eq!(created.id, "1");
    assert_eq!(created.fields.get("Serie"), Some(&json!("SN-1")));
    assert_eq!(overall_progress(&created.fields), 2.27);
    assert_eq!(days_remaining(&created.fields), Some(5.0));
    assert!(created.created_date_time.is_some());

    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let fields = &saved["value"][0]["fields"];
    assert_eq!(fields["field_0"], json!("SN-1"));
    assert_eq!(fields[PROGRESS_COLUMN], json!(2.27));
    assert_eq!(fields[DAYS_COLUMN], json!(5));
    assert!(fields.get("Serie").is_none());
}

/// 再オープンしても内容が残り、IDは最大値+1
#[test]
fn test_reopen_and_next_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datos.json");

    {
        let mut store = JsonFileStore::open(&path).unwrap();
        store.create(draft("SN-1").to_store_fields().unwrap()).unwrap();
        store.create(draft("SN-2").to_store_fields().unwrap()).unwrap();
        store.delete("1").unwrap();
    }

    let mut store = JsonFileStore::open(&path).unwrap();
    let all = store.fetch_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "2");

    let created = store.create(draft("SN-3").to_store_fields().unwrap()).unwrap();
    assert_eq!(created.id, "3");
}

/// 一覧APIのレスポンス形式と素の配列の両方を読める
#[test]
fn test_open_plain_array() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("lista.json");
    std::fs::write(
        &path,
        r#"[{"id": "5", "fields": {"Title": "Cliente", "field_28": "Cali", "_x0025__x0020_avance_x0020_total": 100}}]"#,
    )
    .unwrap();

    let store = JsonFileStore::open(&path).unwrap();
    let record = store.fetch_by_id("5").unwrap();
    assert_eq!(record.fields.raw("Sede"), Some(&json!("Cali")));
    assert_eq!(record.fields.raw("PorcentajeAvanceTotal"), Some(&json!(100)));
}

/// 更新は指定フィールドだけを上書きし、計算列を再計算する
#[test]
fn test_update_patches_fields() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = JsonFileStore::open(dir.path().join("datos.json")).unwrap();
    store.create(draft("SN-1").to_store_fields().unwrap()).unwrap();

    let patch: Fields = [("Observaciones", json!("Reservada")), ("F7", json!("100%"))]
        .into_iter()
        .collect();
    let updated = store.update("1", patch).unwrap();

    assert_eq!(updated.fields.get("Observaciones"), Some(&json!("Reservada")));
    assert_eq!(updated.fields.get("Serie"), Some(&json!("SN-1")));
    assert_eq!(overall_progress(&updated.fields), 13.64);
    assert_eq!(updated.fields.raw("field_17"), Some(&json!("100%")));
}

/// 添付ファイルはレコードごとのフォルダに保存され、削除で消える
#[test]
fn test_attachments_lifecycle() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datos.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    store.create(draft("SN-1").to_store_fields().unwrap()).unwrap();

    store.upload_attachment("1", "acta.pdf", b"%PDF-1.4").unwrap();
    store.upload_attachment("1", "../fotos/frente.jpg", b"jpg").unwrap();
    assert_eq!(store.list_attachments("1").unwrap(), vec!["acta.pdf", "frente.jpg"]);

    let stored = dir.path().join("datos.attachments").join("1").join("acta.pdf");
    assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.4");

    store.delete("1").unwrap();
    assert!(!stored.exists());
    assert!(store.upload_attachment("1", "otro.pdf", b"").is_err());
}

/// 読めないデータファイルはデモデータに切り替わる
#[test]
fn test_open_store_falls_back_to_demo() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("roto.json");
    std::fs::write(&path, "no es json").unwrap();

    let fallback = store::open_store(Some(path.as_path()), false);
    assert_eq!(fallback.fetch_all().unwrap().len(), store::demo_records(Local::now().date_naive()).len());

    let empty = store::open_store(Some(dir.path().join("nuevo.json").as_path()), false);
    assert!(empty.fetch_all().unwrap().is_empty());

    let demo = store::open_store(Some(path.as_path()), true);
    assert!(!demo.fetch_all().unwrap().is_empty());
}

/// 書き込みに失敗した作成・削除はメモリ上の一覧も変えない
#[test]
fn test_failed_write_leaves_store_unchanged() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datos.json");
    let mut store = JsonFileStore::open(&path).unwrap();
    store.create(draft("SN-1").to_store_fields().unwrap()).unwrap();

    // データファイルをディレクトリに差し替えて書き込みを失敗させる
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(store.create(draft("SN-2").to_store_fields().unwrap()).is_err());
    assert!(store.delete("1").is_err());
    let patch: Fields = [("Observaciones", json!("Reservada"))].into_iter().collect();
    assert!(store.update("1", patch).is_err());

    let all = store.fetch_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "1");
    assert!(all[0].fields.get("Observaciones").map_or(true, |v| v != &json!("Reservada")));
}
