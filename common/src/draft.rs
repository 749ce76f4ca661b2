//! 作成・編集フォームの下書き
//!
//! フォーム入力を型付きで保持し、検証してストア送信用のフィールドマップを作る。
//! `Title` は顧客名として扱う。

use crate::date::{to_form_date, to_store_date};
use crate::error::{Error, Result};
use crate::field_mapping::{denormalize, names};
use crate::progress::{PHASE_COUNT, PHASE_OPTIONS};
use crate::types::{Fields, Record};
use crate::value::{display_string, format_number, is_truthy, to_number};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// フェーズの初期値
pub const DEFAULT_PHASE: &str = "0%";

/// 機械1台分の入力フォーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(rename = "Title", default)]
    pub client: String,

    #[serde(rename = "Serie", default)]
    pub serial: String,

    #[serde(rename = "Prioridad", default)]
    pub priority: Option<i64>,

    #[serde(rename = "Modelo", default)]
    pub model: String,

    #[serde(rename = "OTT", default)]
    pub ott: String,

    #[serde(rename = "Asesor", default)]
    pub agent: String,

    #[serde(rename = "FechaSolicitud", default)]
    pub request_date: String,

    #[serde(rename = "Observaciones", default)]
    pub remarks: String,

    #[serde(rename = "FechaCompromisoComercial", default)]
    pub commitment_date: String,

    #[serde(rename = "FechaInicioCiclo", default)]
    pub cycle_start_date: String,

    /// F1..F16 の順。足りない分は "0%" で埋める
    #[serde(rename = "Fases", default)]
    pub phases: Vec<String>,

    #[serde(rename = "Sede", default)]
    pub site: String,

    #[serde(rename = "Ciclo", default = "default_cycle")]
    pub cycle: u32,

    #[serde(rename = "FechaFinalAlistamiento", default)]
    pub final_date: Option<String>,
}

fn default_cycle() -> u32 {
    1
}

impl Default for RecordDraft {
    fn default() -> Self {
        Self {
            client: String::new(),
            serial: String::new(),
            priority: Some(0),
            model: String::new(),
            ott: String::new(),
            agent: String::new(),
            request_date: String::new(),
            remarks: String::new(),
            commitment_date: String::new(),
            cycle_start_date: String::new(),
            phases: vec![DEFAULT_PHASE.to_string(); PHASE_COUNT],
            site: String::new(),
            cycle: default_cycle(),
            final_date: None,
        }
    }
}

impl RecordDraft {
    /// 既存レコードから編集用の初期値を作る
    pub fn from_record(record: &Record) -> Self {
        let fields = &record.fields;

        let phases = names::PHASES
            .iter()
            .map(|phase| match fields.get(phase) {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(p) if p != 0.0 => format!("{}%", format_number(p)),
                    _ => DEFAULT_PHASE.to_string(),
                },
                _ => DEFAULT_PHASE.to_string(),
            })
            .collect();

        let final_date = form_date(fields, names::FECHA_FINAL_ALISTAMIENTO);

        Self {
            client: text(fields, names::TITLE),
            serial: text(fields, names::SERIE),
            priority: to_number(fields.get(names::PRIORIDAD)).map(|p| p as i64),
            model: text(fields, names::MODELO),
            ott: text(fields, names::OTT),
            agent: text(fields, names::ASESOR),
            request_date: form_date(fields, names::FECHA_SOLICITUD),
            remarks: text(fields, names::OBSERVACIONES),
            commitment_date: form_date(fields, names::FECHA_COMPROMISO_COMERCIAL),
            cycle_start_date: form_date(fields, names::FECHA_INICIO_CICLO),
            phases,
            site: text(fields, names::SEDE),
            cycle: parse_cycle(fields.get(names::CICLO)),
            final_date: (!final_date.is_empty()).then_some(final_date),
        }
    }

    /// JSONファイルから読み込む
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 必須項目・日付形式・フェーズ値を検証する
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.client, "El cliente es obligatorio"),
            (&self.serial, "La serie es obligatoria"),
            (&self.model, "El modelo es obligatorio"),
            (&self.ott, "El OTT es obligatorio"),
            (&self.agent, "El asesor es obligatorio"),
            (&self.site, "La sede es obligatoria"),
        ];
        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidDraft(message.to_string()));
            }
        }

        if self.priority.is_none() {
            return Err(Error::InvalidDraft("La prioridad es obligatoria".into()));
        }
        if self.cycle < 1 {
            return Err(Error::InvalidDraft("El ciclo debe ser mayor a 0".into()));
        }

        for (label, date) in [
            ("FechaSolicitud", &self.request_date),
            ("FechaCompromisoComercial", &self.commitment_date),
            ("FechaInicioCiclo", &self.cycle_start_date),
        ] {
            if date.is_empty() {
                return Err(Error::InvalidDraft(format!("{}: la fecha es obligatoria", label)));
            }
            check_date(label, date)?;
        }
        if let Some(date) = self.final_date.as_deref().filter(|d| !d.is_empty()) {
            check_date("FechaFinalAlistamiento", date)?;
        }

        if self.phases.len() > PHASE_COUNT {
            return Err(Error::InvalidDraft(format!(
                "se esperaban {} fases, hay {}",
                PHASE_COUNT,
                self.phases.len()
            )));
        }
        for (phase, value) in names::PHASES.iter().zip(&self.phases) {
            if !PHASE_OPTIONS.contains(&value.as_str()) {
                return Err(Error::InvalidDraft(format!(
                    "{}: valor de fase no válido '{}'",
                    phase, value
                )));
            }
        }

        Ok(())
    }

    /// 表示名のフィールドマップ（日付はUTC深夜のISO文字列）
    pub fn to_friendly_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(names::TITLE, Value::from(self.client.as_str()));
        fields.insert(names::SERIE, Value::from(self.serial.as_str()));
        fields.insert(names::PRIORIDAD, Value::from(self.priority.unwrap_or(0)));
        fields.insert(names::MODELO, Value::from(self.model.as_str()));
        fields.insert(names::OTT, Value::from(self.ott.as_str()));
        fields.insert(names::ASESOR, Value::from(self.agent.as_str()));
        fields.insert(names::FECHA_SOLICITUD, Value::from(to_store_date(&self.request_date)));
        fields.insert(names::OBSERVACIONES, Value::from(self.remarks.as_str()));
        fields.insert(
            names::FECHA_COMPROMISO_COMERCIAL,
            Value::from(to_store_date(&self.commitment_date)),
        );
        fields.insert(
            names::FECHA_INICIO_CICLO,
            Value::from(to_store_date(&self.cycle_start_date)),
        );
        for (i, phase) in names::PHASES.iter().enumerate() {
            let value = self
                .phases
                .get(i)
                .map(String::as_str)
                .unwrap_or(DEFAULT_PHASE);
            fields.insert(*phase, Value::from(value));
        }
        fields.insert(names::SEDE, Value::from(self.site.as_str()));
        fields.insert(names::CICLO, Value::from(format!("Ciclo {}", self.cycle)));

        let final_date = match self.final_date.as_deref() {
            Some(d) if !d.is_empty() => Value::from(to_store_date(d)),
            _ => Value::Null,
        };
        fields.insert(names::FECHA_FINAL_ALISTAMIENTO, final_date);
        fields
    }

    /// 検証してストア内部名のフィールドマップに変換する
    pub fn to_store_fields(&self) -> Result<Fields> {
        self.validate()?;
        Ok(denormalize(&self.to_friendly_fields()))
    }
}

fn text(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(v) if is_truthy(v) => display_string(v),
        _ => String::new(),
    }
}

fn form_date(fields: &Fields, name: &str) -> String {
    match fields.get(name) {
        Some(Value::String(s)) => to_form_date(s),
        _ => String::new(),
    }
}

fn check_date(label: &str, date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::InvalidDraft(format!("{}: fecha no válida '{}'", label, date)))
}

/// "Ciclo 2" / 2 / "2" → 2。読めない値や0は1
fn parse_cycle(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::String(s)) => s.replace("Ciclo ", "").trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1.0 && n.is_finite() => n as u32,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_draft() -> RecordDraft {
        RecordDraft {
            client: "Constructora Andina".into(),
            serial: "HCMDCF30A00123".into(),
            priority: Some(2),
            model: "ZX200-3".into(),
            ott: "OTT-4471".into(),
            agent: "Juan Guerrero".into(),
            request_date: "2025-05-02".into(),
            remarks: "Libre".into(),
            commitment_date: "2025-06-15".into(),
            cycle_start_date: "2025-05-05".into(),
            site: "Bogotá".into(),
            cycle: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(valid_draft().validate().is_ok());
    }

    #[test]
    fn test_missing_required_field() {
        let draft = RecordDraft {
            agent: "  ".into(),
            ..valid_draft()
        };
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid draft: El asesor es obligatorio");
    }

    #[test]
    fn test_cycle_must_be_positive() {
        let draft = RecordDraft {
            cycle: 0,
            ..valid_draft()
        };
        assert!(matches!(draft.validate(), Err(Error::InvalidDraft(m)) if m.contains("ciclo")));
    }

    #[test]
    fn test_invalid_dates_and_phases() {
        let draft = RecordDraft {
            commitment_date: "15/06/2025".into(),
            ..valid_draft()
        };
        assert!(draft.validate().is_err());

        let mut draft = valid_draft();
        draft.phases[3] = "30%".into();
        let err = draft.validate().unwrap_err();
        assert!(err.to_string().contains("F4"));
    }

    #[test]
    fn test_store_fields_use_internal_names() {
        let mut draft = valid_draft();
        draft.phases[0] = "100%".into();
        let fields = draft.to_store_fields().unwrap();

        assert_eq!(fields.raw("Title"), Some(&json!("Constructora Andina")));
        assert_eq!(fields.raw("field_0"), Some(&json!("HCMDCF30A00123")));
        assert_eq!(fields.raw("field_1"), Some(&json!(2)));
        assert_eq!(fields.raw("field_9"), Some(&json!("2025-06-15T00:00:00Z")));
        assert_eq!(fields.raw("field_11"), Some(&json!("100%")));
        assert_eq!(fields.raw("field_26"), Some(&json!("0%")));
        assert_eq!(fields.raw("field_28"), Some(&json!("Bogotá")));
        assert_eq!(fields.raw("field_29"), Some(&json!("Ciclo 2")));
        assert_eq!(fields.raw("FechaFinalAlistamiento"), Some(&Value::Null));
        assert!(fields.raw("Serie").is_none());
    }

    #[test]
    fn test_final_date_is_sent_when_present() {
        let draft = RecordDraft {
            final_date: Some("2025-06-10".into()),
            ..valid_draft()
        };
        let fields = draft.to_store_fields().unwrap();
        assert_eq!(
            fields.raw("FechaFinalAlistamiento"),
            Some(&json!("2025-06-10T00:00:00Z"))
        );
    }

    #[test]
    fn test_from_record_defaults() {
        let fields: Fields = [
            ("Title", json!("Cliente Uno")),
            ("field_0", json!("SER-1")),
            ("field_1", json!(3)),
            ("field_9", json!("2025-07-01T00:00:00Z")),
            ("field_12", json!("50%")),
            ("field_29", json!("Ciclo 4")),
        ]
        .into_iter()
        .collect();
        let draft = RecordDraft::from_record(&Record::new("9", fields));

        assert_eq!(draft.client, "Cliente Uno");
        assert_eq!(draft.serial, "SER-1");
        assert_eq!(draft.priority, Some(3));
        assert_eq!(draft.commitment_date, "2025-07-01");
        assert_eq!(draft.request_date, "");
        assert_eq!(draft.phases.len(), 16);
        assert_eq!(draft.phases[1], "50%");
        assert_eq!(draft.phases[15], "0%");
        assert_eq!(draft.cycle, 4);
        assert_eq!(draft.final_date, None);
    }

    #[test]
    fn test_parse_cycle_forms() {
        assert_eq!(parse_cycle(Some(&json!("Ciclo 3"))), 3);
        assert_eq!(parse_cycle(Some(&json!(2))), 2);
        assert_eq!(parse_cycle(Some(&json!("otro"))), 1);
        assert_eq!(parse_cycle(Some(&json!(0))), 1);
        assert_eq!(parse_cycle(None), 1);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let draft = RecordDraft::from_json(r#"{"Title":"X","Fases":["100%"]}"#).unwrap();
        assert_eq!(draft.cycle, 1);
        assert_eq!(draft.phases, vec!["100%"]);
        assert_eq!(draft.priority, None);
        let fields = draft.to_friendly_fields();
        assert_eq!(fields.raw("F1"), Some(&json!("100%")));
        assert_eq!(fields.raw("F2"), Some(&json!("0%")));
    }
}
