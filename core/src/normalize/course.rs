//! Course listing entries and the course detail page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, parse_optional_date, DateFormat};
use super::duration::parse_duration_minutes;
use super::material::{into_items, MaterialItem, RawMaterial};
use super::{decode, list_or_empty, object_or_none, string_field, string_or_number, EpochMillis};
use super::rules;
use crate::error::ParseError;

/// A course as listed in the study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCourseInfo {
    pub name: String,
    pub code: String,
    pub num_credits: u32,
    /// Teaching assignment id (it: id incarico); absent for courses without one.
    pub id_incarico: Option<i64>,
    pub category: Option<String>,
    pub overbooking: bool,
}

impl BasicCourseInfo {
    /// Whether the course is fictitious (thesis, internship, ...).
    pub fn is_dummy(&self) -> bool {
        rules::is_dummy_category(self.category.as_deref())
    }
}

/// A notice published by a professor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub published_at: EpochMillis,
    pub expires_at: Option<EpochMillis>,
    /// Raw HTML.
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub title: String,
    pub date: EpochMillis,
    pub url: String,
    pub cover_url: String,
    pub duration_minutes: Option<u32>,
}

/// Virtual classroom recordings grouped by academic year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcRecordings {
    pub current: Vec<Recording>,
    /// Earlier years, keyed by the year upstream reports.
    pub other_years: BTreeMap<String, Vec<Recording>>,
}

impl VcRecordings {
    pub fn year(&self, year: &str) -> Option<&[Recording]> {
        self.other_years.get(year).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.other_years.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A virtual classroom lesson being streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveLesson {
    pub id_incarico: i64,
    pub meeting_id: String,
    pub title: String,
    pub date: EpochMillis,
}

/// Where to join a live lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveLessonStatus {
    pub running: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoParagraph {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetails {
    /// Calendar year in which the academic year ends.
    pub calendar_year: String,
    /// Year of the degree the course belongs to; 1 is the first year of both BSc and MSc.
    pub degree_year: u8,
    /// Teaching period (1 or 2).
    pub year_period: u8,
    pub professor_name: String,
    pub professor_surname: String,
    pub notices: Vec<Notice>,
    pub material: Vec<MaterialItem>,
    pub live_lessons: Vec<LiveLesson>,
    /// In-class recordings (it: videolezioni).
    pub recordings: Vec<Recording>,
    pub vc_recordings: VcRecordings,
    pub info: Vec<InfoParagraph>,
}

#[derive(Deserialize)]
pub(crate) struct RawPlanCourse {
    nome_ins: String,
    #[serde(deserialize_with = "string_or_number")]
    cod_ins: String,
    n_cfe: u32,
    #[serde(default, deserialize_with = "super::opt_int_lenient")]
    id_inc_1: Option<i64>,
    #[serde(default)]
    categoria: Option<String>,
    #[serde(default)]
    overbooking: Option<String>,
}

impl From<RawPlanCourse> for BasicCourseInfo {
    fn from(raw: RawPlanCourse) -> Self {
        Self {
            overbooking: rules::has_overbooking(raw.overbooking.as_deref()),
            name: raw.nome_ins,
            code: raw.cod_ins,
            num_credits: raw.n_cfe,
            id_incarico: raw.id_inc_1,
            category: raw.categoria.filter(|c| !c.is_empty()),
        }
    }
}

/// Courses taken outside the plan use a different name key and never overbook.
#[derive(Deserialize)]
pub(crate) struct RawExtraCourse {
    nome_ins_1: String,
    #[serde(deserialize_with = "string_or_number")]
    cod_ins: String,
    n_cfe: u32,
    #[serde(default, deserialize_with = "super::opt_int_lenient")]
    id_inc_1: Option<i64>,
}

impl From<RawExtraCourse> for BasicCourseInfo {
    fn from(raw: RawExtraCourse) -> Self {
        Self {
            name: raw.nome_ins_1,
            code: raw.cod_ins,
            num_credits: raw.n_cfe,
            id_incarico: raw.id_inc_1,
            category: None,
            overbooking: false,
        }
    }
}

#[derive(Deserialize)]
struct RawCourseDetails {
    info_corso: RawCourseInfo,
    #[serde(default, deserialize_with = "list_or_empty")]
    avvisi: Vec<RawNotice>,
    #[serde(default, deserialize_with = "list_or_empty")]
    materiale: Vec<RawMaterial>,
    #[serde(default, deserialize_with = "object_or_none")]
    videolezioni: Option<RawLessonRecordings>,
    #[serde(default, deserialize_with = "object_or_none")]
    virtualclassroom: Option<RawVirtualClassroom>,
    #[serde(default)]
    guida: Value,
}

#[derive(Deserialize)]
struct RawCourseInfo {
    #[serde(deserialize_with = "string_or_number")]
    a_acc: String,
    periodo: String,
    nome_doce: String,
    cognome_doce: String,
}

#[derive(Deserialize)]
struct RawNotice {
    id: i64,
    data_inizio: String,
    #[serde(default)]
    data_fine: Option<String>,
    info: String,
}

#[derive(Deserialize)]
struct RawLessonRecordings {
    #[serde(default, deserialize_with = "list_or_empty")]
    lista_videolezioni: Vec<RawRecording>,
}

#[derive(Deserialize)]
struct RawVirtualClassroom {
    #[serde(default, deserialize_with = "list_or_empty")]
    live: Vec<RawLiveLesson>,
    #[serde(default, deserialize_with = "list_or_empty")]
    registrazioni: Vec<RawRecording>,
    #[serde(default, deserialize_with = "list_or_empty")]
    vc_altri_anni: Vec<RawYearRecordings>,
}

#[derive(Deserialize)]
struct RawYearRecordings {
    #[serde(deserialize_with = "string_or_number")]
    anno: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    vc: Vec<RawRecording>,
}

#[derive(Deserialize)]
struct RawRecording {
    titolo: String,
    data: String,
    video_url: String,
    #[serde(default)]
    cover_url: String,
    #[serde(default)]
    duration: String,
}

#[derive(Deserialize)]
struct RawLiveLesson {
    id_inc: i64,
    #[serde(deserialize_with = "string_or_number")]
    meetingid: String,
    titolo: String,
    data: String,
}

#[derive(Deserialize)]
struct RawParagraph {
    titolo: String,
    testo: String,
}

#[derive(Deserialize)]
struct RawLiveStatus {
    isrunning: bool,
    url: String,
}

impl RawRecording {
    fn into_recording(self, format: DateFormat) -> Result<Recording, ParseError> {
        Ok(Recording {
            date: parse_date(&self.data, format)?,
            duration_minutes: parse_duration_minutes(&self.duration),
            title: self.titolo,
            url: self.video_url,
            cover_url: self.cover_url,
        })
    }

    /// In-class recordings carry a time only for some lessons.
    fn lesson_date_format(&self) -> DateFormat {
        if self.data.contains(':') {
            DateFormat::DayMonthYearTime
        } else {
            DateFormat::DayMonthYear
        }
    }
}

fn vc_recordings(raw: Vec<RawRecording>) -> Result<Vec<Recording>, ParseError> {
    raw.into_iter()
        .map(|r| r.into_recording(DateFormat::DayMonthYearTime))
        .collect()
}

/// Split `periodo` (`"<degree year>-<teaching period>"`).
fn parse_period(periodo: &str) -> Result<(u8, u8), ParseError> {
    let invalid = || ParseError::new("course", format!("unexpected info_corso.periodo {periodo:?}"));
    let (year, period) = periodo.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.trim().parse().map_err(|_| invalid())?;
    let period = period.trim().parse().map_err(|_| invalid())?;
    Ok((year, period))
}

/// Normalize the `materia_dettaglio.php` payload of the course called `course_name`.
pub fn normalize_course_details(raw: &Value, course_name: &str) -> Result<CourseDetails, ParseError> {
    let raw: RawCourseDetails = decode("course", raw)?;
    let (degree_year, year_period) = parse_period(&raw.info_corso.periodo)?;

    let notices = raw
        .avvisi
        .into_iter()
        .map(|a| {
            Ok(Notice {
                id: a.id,
                published_at: parse_date(&a.data_inizio, DateFormat::DayMonthYear)?,
                expires_at: parse_optional_date(a.data_fine.as_deref(), DateFormat::DayMonthYear)?,
                html: a.info,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    let recordings = raw
        .videolezioni
        .map(|v| v.lista_videolezioni)
        .unwrap_or_default()
        .into_iter()
        .map(|r| {
            let format = r.lesson_date_format();
            r.into_recording(format)
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    let mut live_lessons = Vec::new();
    let mut vc = VcRecordings::default();
    if let Some(classroom) = raw.virtualclassroom {
        for live in classroom.live {
            live_lessons.push(LiveLesson {
                date: parse_date(&live.data, DateFormat::DayMonthYearTime)?,
                id_incarico: live.id_inc,
                meeting_id: live.meetingid,
                title: live.titolo,
            });
        }
        vc.current = vc_recordings(classroom.registrazioni)?;
        for year in classroom.vc_altri_anni {
            vc.other_years.insert(year.anno, vc_recordings(year.vc)?);
        }
    }

    let info = if raw.guida.is_array() {
        decode::<Vec<RawParagraph>>("course", &raw.guida)?
            .into_iter()
            .map(|p| InfoParagraph {
                title: p.titolo.replace(course_name, "").trim().to_string(),
                text: p.testo,
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(CourseDetails {
        calendar_year: raw.info_corso.a_acc,
        degree_year,
        year_period,
        professor_name: raw.info_corso.nome_doce,
        professor_surname: raw.info_corso.cognome_doce,
        notices,
        material: into_items(raw.materiale, 1)?,
        live_lessons,
        recordings,
        vc_recordings: vc,
        info,
    })
}

/// Normalize the `goto_virtualclassroom.php` payload.
pub fn normalize_live_lesson_status(raw: &Value) -> Result<LiveLessonStatus, ParseError> {
    let raw: RawLiveStatus = decode("live lesson", raw)?;
    Ok(LiveLessonStatus {
        running: raw.isrunning,
        url: raw.url,
    })
}

/// Normalize the `download.php` payload into a direct download URL.
pub fn normalize_download_url(raw: &Value) -> Result<String, ParseError> {
    string_field("download", raw, "directurl")
}
