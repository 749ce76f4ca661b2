use crate::error::{AlistamientoError, Result};
use alistamiento_common::{FilterDimension, FilterState};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "alistamiento")]
#[command(about = "Seguimiento del alistamiento de maquinaria pesada", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// データファイル（設定・環境変数より優先）
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// 組み込みのデモデータを使う
    #[arg(long, global = true)]
    pub mock: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 件数・状態別件数・グループ別件数を表示
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// 絞り込んだレコードを一覧表示
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// シリアル番号で検索（部分一致）
        #[arg(long)]
        buscar_serie: Option<String>,

        /// 進捗率の昇順に並べる
        #[arg(long)]
        por_avance: bool,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 各絞り込み項目の選択肢を表示
    Options {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// 期限間近の未完了レコードを表示
    Expiring {
        #[command(flatten)]
        filters: FilterArgs,

        /// 表示件数（デフォルト: 設定値）
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// フェーズ別の完了率を表示
    Phases {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// 1台分の詳細と進捗率を表示
    Progress {
        /// レコードID
        id: String,
    },

    /// フォームJSONからレコードを作成
    Create {
        /// 入力フォームJSON
        #[arg(short, long)]
        input: PathBuf,

        /// 添付ファイル
        #[arg(long = "adjunto")]
        attachments: Vec<PathBuf>,
    },

    /// フォームJSONでレコードを更新
    Update {
        /// レコードID
        id: String,

        /// 入力フォームJSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// レコードを削除
    Delete {
        /// レコードID
        id: String,
    },

    /// レコードにファイルを添付
    Attach {
        /// レコードID
        id: String,

        /// 添付するファイル
        file: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// データファイルを設定
        #[arg(long)]
        set_data_file: Option<PathBuf>,

        /// 期限間近一覧の件数を設定
        #[arg(long)]
        expiring_limit: Option<usize>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 絞り込み条件のフラグ
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// 絞り込み条件のJSONファイル（フラグで上書き可）
    #[arg(long)]
    pub filtros: Option<PathBuf>,

    #[arg(long)]
    pub sede: Option<String>,

    #[arg(long)]
    pub asesor: Option<String>,

    /// 顧客名
    #[arg(long)]
    pub cliente: Option<String>,

    #[arg(long)]
    pub serie: Option<String>,

    #[arg(long)]
    pub observaciones: Option<String>,

    /// 周期（複数指定でOR）
    #[arg(long)]
    pub ciclo: Vec<String>,

    /// 商業約束日の下限（YYYY-MM-DD）
    #[arg(long)]
    pub compromiso_desde: Option<String>,

    /// 商業約束日の上限（YYYY-MM-DD）
    #[arg(long)]
    pub compromiso_hasta: Option<String>,

    /// 整備完了日の下限（YYYY-MM-DD）
    #[arg(long)]
    pub final_desde: Option<String>,

    /// 整備完了日の上限（YYYY-MM-DD）
    #[arg(long)]
    pub final_hasta: Option<String>,

    /// 進捗区分
    #[arg(long, value_parser = ["100", ">0", "0"])]
    pub avance: Option<String>,
}

impl FilterArgs {
    /// フラグから絞り込み状態を組み立てる
    pub fn to_state(&self) -> Result<FilterState> {
        let mut state = match &self.filtros {
            Some(path) => FilterState::from_file(path)?,
            None => FilterState::default(),
        };

        let categorical = [
            (FilterDimension::Site, &self.sede),
            (FilterDimension::Agent, &self.asesor),
            (FilterDimension::Client, &self.cliente),
            (FilterDimension::Serial, &self.serie),
            (FilterDimension::Remarks, &self.observaciones),
        ];
        for (dimension, value) in categorical {
            if let Some(value) = value {
                state = state.with_value(dimension, value);
            }
        }

        for cycle in &self.ciclo {
            if !state.cycles.contains(cycle) {
                state = state.toggle_cycle(cycle);
            }
        }

        let dates = [
            (&self.compromiso_desde, &mut state.commitment_from),
            (&self.compromiso_hasta, &mut state.commitment_to),
            (&self.final_desde, &mut state.final_from),
            (&self.final_hasta, &mut state.final_to),
        ];
        for (flag, slot) in dates {
            if let Some(date) = flag {
                check_date(date)?;
                *slot = date.clone();
            }
        }

        if let Some(bucket) = &self.avance {
            state.progress = bucket.clone();
        }

        Ok(state)
    }
}

fn check_date(date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AlistamientoError::InvalidInput(format!("Fecha no válida: '{}' (use AAAA-MM-DD)", date)))
}
