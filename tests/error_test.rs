//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use alistamiento::error::AlistamientoError;
use alistamiento::store::{JsonFileStore, ListStore};
use alistamiento_common::Fields;
use tempfile::tempdir;

/// 存在しないIDの取得
#[test]
fn test_fetch_unknown_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let store = JsonFileStore::open(dir.path().join("datos.json")).unwrap();

    let err = store.fetch_by_id("42").unwrap_err();
    assert!(matches!(err, AlistamientoError::RecordNotFound(ref id) if id == "42"));
}

/// 存在しないIDの更新・削除
#[test]
fn test_update_and_delete_unknown_id() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = JsonFileStore::open(dir.path().join("datos.json")).unwrap();

    assert!(matches!(
        store.update("7", Fields::new()),
        Err(AlistamientoError::RecordNotFound(_))
    ));
    assert!(matches!(store.delete("7"), Err(AlistamientoError::RecordNotFound(_))));
    // 失敗した書き込みでファイルは作られない
    assert!(!dir.path().join("datos.json").exists());
}

/// 壊れたデータファイル
#[test]
fn test_open_malformed_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("datos.json");
    std::fs::write(&path, "{ no es json").unwrap();

    let err = JsonFileStore::open(&path).unwrap_err();
    assert!(matches!(err, AlistamientoError::JsonParse(_)));
}

/// データファイルの代わりにディレクトリを指定した場合
#[test]
fn test_open_directory_as_store() {
    let dir = tempdir().expect("Failed to create temp dir");
    let err = JsonFileStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, AlistamientoError::Store(_)));
}

/// AlistamientoErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        AlistamientoError::Config("sin directorio".to_string()),
        AlistamientoError::RecordNotFound("12".to_string()),
        AlistamientoError::InvalidInput("fecha".to_string()),
        AlistamientoError::Store("sin permisos".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }

    let err = AlistamientoError::RecordNotFound("12".to_string());
    assert_eq!(err.to_string(), "Registro no encontrado: 12");
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: AlistamientoError = io_err.into();

    assert!(matches!(err, AlistamientoError::Io(_)));
    assert!(err.to_string().contains("E/S"));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_transparent() {
    let common_err = alistamiento_common::Error::InvalidDraft("La serie es obligatoria".to_string());
    let err: AlistamientoError = common_err.into();

    assert!(matches!(err, AlistamientoError::Common(_)));
    assert_eq!(err.to_string(), "Invalid draft: La serie es obligatoria");
}
