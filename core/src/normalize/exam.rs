//! Exam sessions (it: appelli).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, DateFormat};
use super::{decode, list_or_empty, opt_int_lenient, EpochMillis};
use super::rules;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamSession {
    /// Course code as seen by the student, e.g. `01URPOV`.
    pub exam_id: String,
    pub exam_name: String,
    pub date: EpochMillis,
    pub room: String,
    /// e.g. `Scritto e Orale`.
    pub kind: String,
    /// Why the student cannot sign up, if they cannot.
    pub signup_error: Option<String>,
    pub signup_deadline: EpochMillis,
    pub user_is_signed_up: bool,
}

#[derive(Deserialize)]
struct RawExamPage {
    esami: RawExamList,
}

#[derive(Deserialize)]
struct RawExamList {
    #[serde(default, deserialize_with = "list_or_empty")]
    data: Vec<RawExamSession>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct RawExamSession {
    COD_INS_STUDENTE: String,
    NOME_INS: String,
    DATA_APPELLO: String,
    ORA_APPELLO: String,
    #[serde(default)]
    AULA: String,
    #[serde(default)]
    DESC_TIPO: String,
    #[serde(default)]
    DESCR_MSG: Option<String>,
    SCADENZA: String,
    #[serde(default, deserialize_with = "opt_int_lenient")]
    ID_ISCRIZIONE: Option<i64>,
}

impl RawExamSession {
    fn into_session(self) -> Result<ExamSession, ParseError> {
        let when = format!("{} {}", self.DATA_APPELLO.trim(), self.ORA_APPELLO.trim());
        Ok(ExamSession {
            date: parse_date(&when, DateFormat::DayMonthYearTime)?,
            signup_deadline: parse_date(&self.SCADENZA, DateFormat::DayMonthYearTime)?,
            signup_error: rules::signup_error(self.DESCR_MSG.as_deref()),
            user_is_signed_up: rules::is_signed_up(self.ID_ISCRIZIONE),
            exam_id: self.COD_INS_STUDENTE,
            exam_name: self.NOME_INS,
            room: self.AULA,
            kind: self.DESC_TIPO,
        })
    }
}

/// Normalize the `esami.php` listing. Sessions come back ordered by date,
/// earliest first; sessions on the same instant keep upstream order.
pub fn normalize_exam_sessions(raw: &Value) -> Result<Vec<ExamSession>, ParseError> {
    let page: RawExamPage = decode("exam session", raw)?;
    let mut sessions = page
        .esami
        .data
        .into_iter()
        .map(RawExamSession::into_session)
        .collect::<Result<Vec<_>, _>>()?;
    sessions.sort_by_key(|s| s.date);
    Ok(sessions)
}
