//! Weekly lesson timetable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, DateFormat};
use super::{decode, list_or_empty, EpochMillis};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSlot {
    pub start: EpochMillis,
    pub end: EpochMillis,
    /// e.g. `Lezione/Esercitazione`.
    pub kind: String,
    pub subject: String,
    pub professor: Professor,
    pub room: String,
    pub room_url: Option<String>,
}

#[derive(Deserialize)]
struct RawTimetable {
    #[serde(default, deserialize_with = "list_or_empty")]
    orari: Vec<RawSlot>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct RawSlot {
    ORA_INIZIO: String,
    ORA_FINE: String,
    TIPOLOGIA_EVENTO: String,
    TITOLO_MATERIA: String,
    #[serde(default)]
    NOME: String,
    #[serde(default)]
    COGNOME: String,
    #[serde(default)]
    AULA: String,
    #[serde(default)]
    URL_MAPPA_AULA: Option<String>,
}

/// Normalize the `orari_lezioni.php` payload, keeping upstream order.
pub fn normalize_timetable(raw: &Value) -> Result<Vec<TimetableSlot>, ParseError> {
    let raw: RawTimetable = decode("timetable", raw)?;
    raw.orari
        .into_iter()
        .map(|o| {
            Ok(TimetableSlot {
                start: parse_date(&o.ORA_INIZIO, DateFormat::DayMonthYearTimeSeconds)?,
                end: parse_date(&o.ORA_FINE, DateFormat::DayMonthYearTimeSeconds)?,
                kind: o.TIPOLOGIA_EVENTO,
                subject: o.TITOLO_MATERIA,
                professor: Professor {
                    name: o.NOME,
                    surname: o.COGNOME,
                },
                room: o.AULA,
                room_url: o.URL_MAPPA_AULA.filter(|u| !u.is_empty()),
            })
        })
        .collect()
}
