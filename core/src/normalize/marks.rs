//! Exam marks and the yearly course plan.
//!
//! Two endpoints feed this module: `studente.php` (permanent record and
//! course plan) and `valutazioni.php` (provisional marks).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::course::{BasicCourseInfo, RawExtraCourse, RawPlanCourse};
use super::date::{parse_date, DateFormat};
use super::{decode, decode_list, list_or_empty, opt_string_or_number, EpochMillis};
use super::rules;
use crate::error::ParseError;

/// A mark in the permanent record (it: libretto).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentMark {
    pub name: String,
    pub num_credits: u32,
    pub mark: String,
    pub date: EpochMillis,
}

/// A mark not yet recorded permanently (it: valutazione provvisoria).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalMark {
    pub name: String,
    pub mark: Option<String>,
    pub date: EpochMillis,
    pub failed: bool,
    pub absent: bool,
    /// One of `P`, `C`, `R`, `V`.
    pub status: String,
    pub professor_id: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePlan {
    pub standard: Vec<BasicCourseInfo>,
    /// Courses from other years or outside the plan.
    pub extra: Vec<BasicCourseInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marks {
    pub permanent: Vec<PermanentMark>,
    pub provisional: Vec<ProvisionalMark>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursesInfo {
    pub marks: Marks,
    pub course_plan: CoursePlan,
}

#[derive(Deserialize)]
struct RawStudent {
    #[serde(default, deserialize_with = "list_or_empty")]
    libretto: Vec<RawPermanentMark>,
    #[serde(default, deserialize_with = "list_or_empty")]
    carico_didattico: Vec<RawPlanCourse>,
    /// Year -> list of courses; blank when there are none.
    #[serde(default)]
    altri_corsi: Value,
}

#[derive(Deserialize)]
struct RawPermanentMark {
    nome_ins: String,
    n_cfe: u32,
    desc_voto: String,
    d_esame: String,
}

#[derive(Deserialize)]
struct RawProvisionalPage {
    #[serde(default, deserialize_with = "list_or_empty")]
    valutazioni_provvisorie: Vec<RawProvisionalMark>,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct RawProvisionalMark {
    NOME_INS: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    VOTO_ESAME: Option<String>,
    DATA_ESAME: String,
    #[serde(default)]
    FALLITO: Option<String>,
    #[serde(default)]
    ASSENTE: Option<String>,
    STATO: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    MAT_DOCENTE: Option<String>,
    #[serde(default)]
    T_MESSAGGIO: Option<String>,
}

fn extra_courses(raw: &Value) -> Result<Vec<BasicCourseInfo>, ParseError> {
    let mut courses = Vec::new();
    match raw {
        Value::Object(years) => {
            for (year, list) in years {
                let list: Vec<RawExtraCourse> = decode_list("course plan", list).map_err(|e| {
                    ParseError::new("course plan", format!("altri_corsi[{year}]: {}", e.message))
                })?;
                courses.extend(list.into_iter().map(BasicCourseInfo::from));
            }
        }
        other => {
            let list: Vec<RawExtraCourse> = decode_list("course plan", other)?;
            courses.extend(list.into_iter().map(BasicCourseInfo::from));
        }
    }
    Ok(courses)
}

/// Permanent marks from the `studente.php` payload.
pub fn normalize_permanent_marks(raw: &Value) -> Result<Vec<PermanentMark>, ParseError> {
    let student: RawStudent = decode("marks", raw)?;
    permanent_marks(student.libretto)
}

fn permanent_marks(raw: Vec<RawPermanentMark>) -> Result<Vec<PermanentMark>, ParseError> {
    raw.into_iter()
        .map(|m| {
            Ok(PermanentMark {
                date: parse_date(&m.d_esame, DateFormat::DayMonthYear)?,
                name: m.nome_ins,
                num_credits: m.n_cfe,
                mark: m.desc_voto,
            })
        })
        .collect()
}

/// Course plan from the `studente.php` payload.
pub fn normalize_course_plan(raw: &Value) -> Result<CoursePlan, ParseError> {
    let student: RawStudent = decode("course plan", raw)?;
    Ok(CoursePlan {
        standard: student.carico_didattico.into_iter().map(BasicCourseInfo::from).collect(),
        extra: extra_courses(&student.altri_corsi)?,
    })
}

/// Provisional marks from the `valutazioni.php` payload.
pub fn normalize_provisional_marks(raw: &Value) -> Result<Vec<ProvisionalMark>, ParseError> {
    let page: RawProvisionalPage = decode("marks", raw)?;
    page.valutazioni_provvisorie
        .into_iter()
        .map(|v| {
            if !rules::is_known_provisional_status(&v.STATO) {
                return Err(ParseError::new(
                    "marks",
                    format!("unknown provisional mark status {:?}", v.STATO),
                ));
            }
            Ok(ProvisionalMark {
                date: parse_date(&v.DATA_ESAME, DateFormat::DashedDayMonthYear)?,
                failed: rules::is_flag_set(v.FALLITO.as_deref()),
                absent: rules::is_flag_set(v.ASSENTE.as_deref()),
                name: v.NOME_INS,
                mark: v.VOTO_ESAME,
                status: v.STATO,
                professor_id: v.MAT_DOCENTE,
                message: v.T_MESSAGGIO,
            })
        })
        .collect()
}

/// Combine both payloads into one view.
pub fn normalize_courses_info(student: &Value, provisional: &Value) -> Result<CoursesInfo, ParseError> {
    Ok(CoursesInfo {
        marks: Marks {
            permanent: normalize_permanent_marks(student)?,
            provisional: normalize_provisional_marks(provisional)?,
        },
        course_plan: normalize_course_plan(student)?,
    })
}
