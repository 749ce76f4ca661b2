//! alistamiento CLI ライブラリ
//!
//! 設定・ストア・端末出力。業務ロジックは `alistamiento_common` にある。

pub mod cli;
pub mod config;
pub mod error;
pub mod report;
pub mod store;
