//! Feature calls: one portal endpoint in, one normalized entity out.
//!
//! Every function posts through `Session::call`, so all of them require an
//! authenticated session and share its timeout, credentials and observer.
//! Normalizer failures are reported as `PortalError::Parse` carrying the
//! endpoint.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error::{ParseError, PortalError};
use crate::normalize::booking::{
    normalize_booking_contexts, normalize_booking_slots, normalize_bookings, Booking, BookingContext, BookingSlot,
};
use crate::normalize::course::{
    normalize_course_details, normalize_download_url, normalize_live_lesson_status, BasicCourseInfo,
    CourseDetails, LiveLesson, LiveLessonStatus,
};
use crate::normalize::date::format_day;
use crate::normalize::exam::{normalize_exam_sessions, ExamSession};
use crate::normalize::marks::{
    normalize_course_plan, normalize_permanent_marks, normalize_provisional_marks, CoursesInfo, Marks,
};
use crate::normalize::notification::{normalize_notifications, Notification};
use crate::normalize::ticket::{normalize_ticket, normalize_tickets, Ticket};
use crate::normalize::timetable::{normalize_timetable, TimetableSlot};
use crate::normalize::user::{normalize_mail_summary, normalize_webmail_url, MailSummary};
use crate::normalize::EpochMillis;
use crate::session::Session;
use crate::transport::Transport;

const STUDENT: &str = "studente.php";
const PROVISIONAL_MARKS: &str = "valutazioni.php";
const COURSE_DETAILS: &str = "materia_dettaglio.php";
const DOWNLOAD: &str = "download.php";
const VIRTUAL_CLASSROOM: &str = "goto_virtualclassroom.php";
const EXAMS: &str = "esami.php";
const NOTIFICATIONS: &str = "messaggi.php";
const TICKETS: &str = "ticket.php";
const BOOKINGS: &str = "booking_api.php";
const TIMETABLE: &str = "orari_lezioni.php";
const MAIL: &str = "mail.php";
const WEBMAIL: &str = "goto_webmail.php";
const PING: &str = "ping.php";

fn normalized<E>(endpoint: &str, result: Result<E, ParseError>) -> Result<E, PortalError> {
    result.map_err(|e| {
        tracing::warn!(endpoint, what = e.what, "unexpected payload shape");
        PortalError::parse(endpoint, e)
    })
}

/// Marks, provisional marks and the course plan.
pub async fn get_courses_info<T: Transport>(session: &Session<T>) -> Result<CoursesInfo, PortalError> {
    let empty = json!({});
    let (student, provisional) = tokio::try_join!(
        session.call(STUDENT, &empty),
        session.call(PROVISIONAL_MARKS, &empty)
    )?;
    Ok(CoursesInfo {
        marks: Marks {
            permanent: normalized(STUDENT, normalize_permanent_marks(&student))?,
            provisional: normalized(PROVISIONAL_MARKS, normalize_provisional_marks(&provisional))?,
        },
        course_plan: normalized(STUDENT, normalize_course_plan(&student))?,
    })
}

/// Full details of a course; looked up by teaching assignment when it has one,
/// by course code otherwise.
pub async fn get_course_details<T: Transport>(
    session: &Session<T>,
    course: &BasicCourseInfo,
) -> Result<CourseDetails, PortalError> {
    let body = match course.id_incarico {
        Some(id) => json!({ "incarico": id }),
        None => json!({ "cod_ins": course.code }),
    };
    let data = session.call(COURSE_DETAILS, &body).await?;
    normalized(COURSE_DETAILS, normalize_course_details(&data, &course.name))
}

pub async fn get_download_url<T: Transport>(session: &Session<T>, file_code: &str) -> Result<String, PortalError> {
    let data = session.call(DOWNLOAD, &json!({ "code": file_code })).await?;
    normalized(DOWNLOAD, normalize_download_url(&data))
}

pub async fn get_live_lesson_status<T: Transport>(
    session: &Session<T>,
    lesson: &LiveLesson,
) -> Result<LiveLessonStatus, PortalError> {
    let body = json!({ "id_inc": lesson.id_incarico, "meetingid": lesson.meeting_id });
    let data = session.call(VIRTUAL_CLASSROOM, &body).await?;
    normalized(VIRTUAL_CLASSROOM, normalize_live_lesson_status(&data))
}

/// Exam sessions open for signup, earliest first.
pub async fn get_exam_sessions<T: Transport>(session: &Session<T>) -> Result<Vec<ExamSession>, PortalError> {
    let data = session.call(EXAMS, &json!({ "operazione": "LISTA" })).await?;
    normalized(EXAMS, normalize_exam_sessions(&data))
}

pub async fn get_notifications<T: Transport>(session: &Session<T>) -> Result<Vec<Notification>, PortalError> {
    let data = session.call(NOTIFICATIONS, &json!({ "operazione": "list" })).await?;
    normalized(NOTIFICATIONS, normalize_notifications(&data))
}

pub async fn mark_notification_read<T: Transport>(session: &Session<T>, id: i64) -> Result<(), PortalError> {
    session
        .call(NOTIFICATIONS, &json!({ "operazione": "read", "msgid": id }))
        .await
        .map(drop)
}

pub async fn delete_notification<T: Transport>(session: &Session<T>, id: i64) -> Result<(), PortalError> {
    session
        .call(NOTIFICATIONS, &json!({ "operazione": "del", "msgid": id }))
        .await
        .map(drop)
}

pub async fn get_tickets<T: Transport>(session: &Session<T>) -> Result<Vec<Ticket>, PortalError> {
    let data = session.call(TICKETS, &json!({ "operazione": "getListaTicket" })).await?;
    normalized(TICKETS, normalize_tickets(&data))
}

pub async fn get_ticket<T: Transport>(session: &Session<T>, ticket_id: i64) -> Result<Ticket, PortalError> {
    let body = json!({ "operazione": "getTicket", "id_ticket": ticket_id });
    let data = session.call(TICKETS, &body).await?;
    normalized(TICKETS, normalize_ticket(&data))
}

/// Post a reply in a ticket thread. `html` must use `<br>` for line breaks.
pub async fn reply_to_ticket<T: Transport>(session: &Session<T>, ticket_id: i64, html: &str) -> Result<(), PortalError> {
    let body = json!({ "operazione": "sendRisposta", "testo": html, "id_ticket": ticket_id });
    session.call(TICKETS, &body).await.map(drop)
}

pub async fn get_bookings<T: Transport>(session: &Session<T>) -> Result<Vec<Booking>, PortalError> {
    let data = session.call(BOOKINGS, &json!({ "operazione": "getBookings" })).await?;
    normalized(BOOKINGS, normalize_bookings(&data))
}

pub async fn get_booking_contexts<T: Transport>(session: &Session<T>) -> Result<Vec<BookingContext>, PortalError> {
    let data = session.call(BOOKINGS, &json!({ "operazione": "getAmbiti" })).await?;
    normalized(BOOKINGS, normalize_booking_contexts(&data))
}

/// Slots of a booking context between `from` and `to`.
pub async fn get_booking_slots<T: Transport>(
    session: &Session<T>,
    context_id: &str,
    subcontext_id: Option<&str>,
    from: EpochMillis,
    to: EpochMillis,
) -> Result<Vec<BookingSlot>, PortalError> {
    let mut body = json!({ "operazione": "getTurni", "ambito": context_id, "from": from, "to": to });
    if let Some(subcontext) = subcontext_id {
        body["subambito"] = Value::from(subcontext);
    }
    let data = session.call(BOOKINGS, &body).await?;
    normalized(BOOKINGS, normalize_booking_slots(&data))
}

/// Lessons of the week containing `day`.
pub async fn get_timetable<T: Transport>(
    session: &Session<T>,
    day: NaiveDate,
) -> Result<Vec<TimetableSlot>, PortalError> {
    let data = session.call(TIMETABLE, &json!({ "data_rif": format_day(day) })).await?;
    normalized(TIMETABLE, normalize_timetable(&data))
}

pub async fn get_unread_mail<T: Transport>(session: &Session<T>) -> Result<MailSummary, PortalError> {
    let data = session.call(MAIL, &json!({})).await?;
    normalized(MAIL, normalize_mail_summary(&data))
}

/// Per-user link to the web mail client.
pub async fn get_webmail_url<T: Transport>(session: &Session<T>) -> Result<String, PortalError> {
    let data = session.call(WEBMAIL, &json!({})).await?;
    normalized(WEBMAIL, normalize_webmail_url(&data))
}

/// Check that the portal accepts the session.
pub async fn ping<T: Transport>(session: &Session<T>) -> Result<(), PortalError> {
    session.call(PING, &json!({})).await.map(drop)
}
