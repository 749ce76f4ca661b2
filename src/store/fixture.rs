use super::{build_record, fill_computed_columns, find_index, normalized, patch_record, sanitize_file_name, today, ListStore};
use crate::error::Result;
use alistamiento_common::field_mapping::denormalize;
use alistamiento_common::{Fields, Record, RecordDraft};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// 組み込みデモデータを保持するメモリ上のストア
///
/// 変更はプロセス終了とともに失われる。
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
    attachments: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            attachments: HashMap::new(),
        }
    }

    /// デモデータ入りのストア
    pub fn demo() -> Self {
        Self::new(demo_records(today()))
    }
}

impl ListStore for MemoryStore {
    fn fetch_all(&self) -> Result<Vec<Record>> {
        Ok(self.records.iter().map(normalized).collect())
    }

    fn fetch_by_id(&self, id: &str) -> Result<Record> {
        let index = find_index(&self.records, id)?;
        Ok(normalized(&self.records[index]))
    }

    fn create(&mut self, fields: Fields) -> Result<Record> {
        let record = build_record(&self.records, fields);
        tracing::debug!(id = %record.id, "デモデータにレコードを追加");
        self.records.push(record.clone());
        Ok(normalized(&record))
    }

    fn update(&mut self, id: &str, fields: Fields) -> Result<Record> {
        let index = find_index(&self.records, id)?;
        patch_record(&mut self.records[index], fields);
        Ok(normalized(&self.records[index]))
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let index = find_index(&self.records, id)?;
        self.records.remove(index);
        self.attachments.remove(id);
        Ok(())
    }

    fn upload_attachment(&mut self, id: &str, file_name: &str, _content: &[u8]) -> Result<()> {
        find_index(&self.records, id)?;
        let name = sanitize_file_name(file_name)?;
        self.attachments.entry(id.to_string()).or_default().push(name);
        Ok(())
    }

    fn list_attachments(&self, id: &str) -> Result<Vec<String>> {
        find_index(&self.records, id)?;
        Ok(self.attachments.get(id).cloned().unwrap_or_default())
    }
}

struct Demo {
    client: &'static str,
    serial: &'static str,
    priority: i64,
    model: &'static str,
    agent: &'static str,
    site: &'static str,
    remarks: &'static str,
    cycle: u32,
    /// F1.. の先頭から "100%" にするフェーズ数
    done: usize,
    /// 次のフェーズの状態
    partial: &'static str,
    /// 今日から商業約束日までの日数
    commitment_in: i64,
    finished: bool,
}

const DEMO: &[Demo] = &[
    Demo { client: "Constructora Andina", serial: "HCMDCF30A00123", priority: 1, model: "ZX200-3", agent: "Juan Guerrero", site: "Bogotá", remarks: "Ok dinero y OC", cycle: 1, done: 16, partial: "0%", commitment_in: -3, finished: true },
    Demo { client: "Vías del Pacífico", serial: "HCMDAV50C00871", priority: 2, model: "ZX75US-3", agent: "Claudia Bogotá", site: "Bogotá", remarks: "Reservada", cycle: 2, done: 9, partial: "50%", commitment_in: 4, finished: false },
    Demo { client: "Agregados del Valle", serial: "1FF135USC00412", priority: 1, model: "ZX135US-3", agent: "Juan Suarez", site: "Cali", remarks: "Lista, Pendiente Entrega", cycle: 1, done: 15, partial: "75%", commitment_in: 1, finished: false },
    Demo { client: "Minera La Estrella", serial: "HCM1U600E00052", priority: 3, model: "ZX120-3", agent: "Luis Anchundia", site: "Medellín", remarks: "Sin alistamiento", cycle: 1, done: 0, partial: "0%", commitment_in: 20, finished: false },
    Demo { client: "Obras Caribe", serial: "SD45D-880102", priority: 2, model: "SD45D", agent: "Felipe Moreno", site: "Barranquilla", remarks: "Libre", cycle: 3, done: 5, partial: "25%", commitment_in: 9, finished: false },
    Demo { client: "Puerto Heroica", serial: "CAT00D6MXKR2210", priority: 4, model: "D6M", agent: "Claudia Echeverri", site: "Cartagena", remarks: "Entregada al cliente", cycle: 1, done: 16, partial: "0%", commitment_in: -15, finished: true },
    Demo { client: "Agropecuaria El Retiro", serial: "HCMDBM50V00310", priority: 2, model: "ZX40U-5A", agent: "Edgar Bustos", site: "Guarne", remarks: "Ok dinero y OC", cycle: 2, done: 3, partial: "50%", commitment_in: 0, finished: false },
    Demo { client: "Concretos Sabana", serial: "HCMDCF30A00988", priority: 1, model: "ZX200-3", agent: "Fabian Corrales", site: "Bogotá", remarks: "Reservada", cycle: 1, done: 12, partial: "25%", commitment_in: 6, finished: false },
    Demo { client: "Infraestructura Antioquia", serial: "SH75X-3B-1044", priority: 3, model: "SH75", agent: "Luis Anchundia", site: "Medellín", remarks: "Libre", cycle: 4, done: 7, partial: "0%", commitment_in: -2, finished: false },
    Demo { client: "Canteras del Norte", serial: "HCM1U600E00177", priority: 5, model: "ZX120-3", agent: "Juan Suarez", site: "Cali", remarks: "Sin alistamiento", cycle: 1, done: 0, partial: "25%", commitment_in: 30, finished: false },
];

/// デモデータ（ストア内部名・計算列付き）
///
/// 日付は `today` を基準に決める。
pub fn demo_records(today: NaiveDate) -> Vec<Record> {
    DEMO.iter()
        .enumerate()
        .map(|(i, demo)| {
            let commitment = today + Duration::days(demo.commitment_in);
            let request = commitment - Duration::days(45);
            let cycle_start = request + Duration::days(3);

            let mut phases: Vec<String> = vec!["0%".to_string(); 16];
            for phase in phases.iter_mut().take(demo.done) {
                *phase = "100%".to_string();
            }
            if let Some(next) = phases.get_mut(demo.done) {
                *next = demo.partial.to_string();
            }

            let draft = RecordDraft {
                client: demo.client.into(),
                serial: demo.serial.into(),
                priority: Some(demo.priority),
                model: demo.model.into(),
                ott: format!("OTT-{}", 4100 + i * 7),
                agent: demo.agent.into(),
                request_date: date(request),
                remarks: demo.remarks.into(),
                commitment_date: date(commitment),
                cycle_start_date: date(cycle_start),
                phases,
                site: demo.site.into(),
                cycle: demo.cycle,
                final_date: demo
                    .finished
                    .then(|| date(commitment - Duration::days(1))),
            };

            let mut fields = denormalize(&draft.to_friendly_fields());
            fill_computed_columns(&mut fields, today);

            let timestamp = format!("{}T12:00:00Z", date(request));
            Record {
                id: (i + 1).to_string(),
                fields,
                created_date_time: Some(timestamp.clone()),
                last_modified_date_time: Some(timestamp),
            }
        })
        .collect()
}

fn date(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
