//! Seat and lesson bookings (`booking_api.php`).

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, DateFormat};
use super::{decode, list_or_empty, object_or_none, EpochMillis};
use crate::error::ParseError;

/// A booked slot. For a study room, e.g. context `AULE_STUDIO`, subcontext
/// `AS_LINGOTTO_2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub context_id: String,
    pub context_name: String,
    pub subcontext_id: String,
    pub subcontext_name: String,
    pub start_time: EpochMillis,
    pub end_time: EpochMillis,
    /// Only set for lesson bookings, e.g. `01PECQW`.
    pub course_id: Option<String>,
}

impl Booking {
    /// Barcode shown at the entrance for `username`.
    pub fn barcode_url(username: &str) -> String {
        format!("https://didattica.polito.it/bc/barcode.php?barcode={username}&width=500&height=200&format=gif")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedTitle {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcontextText {
    pub title: String,
    pub privacy_notice: Option<String>,
    pub green_pass_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSubcontext {
    pub id: String,
    pub ita: SubcontextText,
    pub eng: SubcontextText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContext {
    pub id: String,
    pub ita: LocalizedTitle,
    pub eng: LocalizedTitle,
    /// Empty for contexts without sub-areas, e.g. lessons.
    pub subcontexts: Vec<BookingSubcontext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSlot {
    pub start: EpochMillis,
    pub end: EpochMillis,
    pub bookable_from: EpochMillis,
    pub bookable_until: EpochMillis,
    pub bookable: bool,
    pub seats_total: u32,
    pub seats_taken: u32,
}

impl BookingSlot {
    pub fn seats_free(&self) -> u32 {
        self.seats_total.saturating_sub(self.seats_taken)
    }
}

#[derive(Deserialize)]
struct RawPayload<T> {
    booking_api: T,
}

#[derive(Deserialize)]
struct RawBookings {
    #[serde(default, deserialize_with = "list_or_empty")]
    data: Vec<RawBooking>,
}

#[derive(Deserialize)]
struct RawBooking {
    id_ambito: String,
    descr_ambito: String,
    id_subambito: String,
    nome_subambito: String,
    d_ini_turno_ts: EpochMillis,
    d_fin_turno_ts: EpochMillis,
    #[serde(default)]
    lezione: Option<String>,
}

#[derive(Deserialize)]
struct RawContexts {
    #[serde(default, deserialize_with = "list_or_empty")]
    ambiti: Vec<RawContext>,
}

#[derive(Deserialize)]
struct RawContext {
    id: String,
    titolo_ita: String,
    #[serde(default)]
    descr_ita: String,
    titolo_eng: String,
    #[serde(default)]
    descr_eng: String,
    #[serde(default, deserialize_with = "object_or_none")]
    subambiti: Option<RawSubcontextList>,
}

#[derive(Deserialize)]
struct RawSubcontextList {
    #[serde(default, deserialize_with = "list_or_empty")]
    subambiti: Vec<RawSubcontext>,
}

#[derive(Deserialize)]
struct RawSubcontext {
    id: String,
    titolo_ita: String,
    titolo_eng: String,
    #[serde(default)]
    opt_tpl_privacy: Option<String>,
    #[serde(default)]
    opt_tpl_gp: Option<String>,
}

#[derive(Deserialize)]
struct RawSlots {
    #[serde(default, deserialize_with = "list_or_empty")]
    turni: Vec<RawSlot>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct RawSlot {
    d_ini: String,
    d_fin: String,
    d_ini_preno_ts: EpochMillis,
    d_fin_preno_ts: EpochMillis,
    bookable: bool,
    posti: u32,
    postiOccupati: u32,
}

fn lesson_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<h3><b>([^<]+)</h3></b>").expect("valid lesson header pattern"))
}

/// The course code is the last word of the lesson header.
fn course_id(lesson: &str) -> Option<String> {
    let header = lesson_header().captures(lesson)?.get(1)?.as_str();
    header.split(' ').next_back().map(str::to_owned)
}

/// Normalize the `getBookings` payload.
pub fn normalize_bookings(raw: &Value) -> Result<Vec<Booking>, ParseError> {
    let payload: RawPayload<RawBookings> = decode("booking", raw)?;
    Ok(payload
        .booking_api
        .data
        .into_iter()
        .map(|b| Booking {
            course_id: b.lezione.as_deref().and_then(course_id),
            context_id: b.id_ambito,
            context_name: b.descr_ambito,
            subcontext_id: b.id_subambito,
            subcontext_name: b.nome_subambito,
            start_time: b.d_ini_turno_ts,
            end_time: b.d_fin_turno_ts,
        })
        .collect())
}

/// Normalize the `getAmbiti` payload. English texts are trimmed.
pub fn normalize_booking_contexts(raw: &Value) -> Result<Vec<BookingContext>, ParseError> {
    let payload: RawPayload<RawContexts> = decode("booking contexts", raw)?;
    Ok(payload
        .booking_api
        .ambiti
        .into_iter()
        .map(|c| BookingContext {
            id: c.id,
            ita: LocalizedTitle {
                title: c.titolo_ita,
                description: c.descr_ita,
            },
            eng: LocalizedTitle {
                title: c.titolo_eng.trim().to_owned(),
                description: c.descr_eng.trim().to_owned(),
            },
            subcontexts: c
                .subambiti
                .map(|s| s.subambiti)
                .unwrap_or_default()
                .into_iter()
                .map(|s| BookingSubcontext {
                    id: s.id,
                    ita: SubcontextText {
                        title: s.titolo_ita,
                        privacy_notice: s.opt_tpl_privacy.clone(),
                        green_pass_notice: s.opt_tpl_gp.clone(),
                    },
                    eng: SubcontextText {
                        title: s.titolo_eng.trim().to_owned(),
                        privacy_notice: s.opt_tpl_privacy,
                        green_pass_notice: s.opt_tpl_gp,
                    },
                })
                .collect(),
        })
        .collect())
}

/// Normalize the `getTurni` payload.
pub fn normalize_booking_slots(raw: &Value) -> Result<Vec<BookingSlot>, ParseError> {
    let payload: RawPayload<RawSlots> = decode("booking slots", raw)?;
    payload
        .booking_api
        .turni
        .into_iter()
        .map(|t| {
            Ok(BookingSlot {
                start: parse_date(&t.d_ini, DateFormat::DayMonthYearTime)?,
                end: parse_date(&t.d_fin, DateFormat::DayMonthYearTime)?,
                bookable_from: t.d_ini_preno_ts,
                bookable_until: t.d_fin_preno_ts,
                bookable: t.bookable,
                seats_total: t.posti,
                seats_taken: t.postiOccupati,
            })
        })
        .collect()
}
