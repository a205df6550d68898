//! Push notification inbox (it: messaggi).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, DateFormat};
use super::{decode, list_or_empty, object_or_none, opt_int_lenient, EpochMillis};
use super::rules;
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    /// e.g. `individuale`, `avvisidoc`, `matdid`, `test`.
    pub topic: String,
    pub time: EpochMillis,
    pub is_read: bool,
    /// Teaching assignment the notification refers to; set only for course-scoped topics.
    pub course: Option<i64>,
}

#[derive(Deserialize)]
struct RawInbox {
    #[serde(default, deserialize_with = "list_or_empty")]
    messaggi: Vec<RawNotification>,
}

#[derive(Deserialize)]
struct RawNotification {
    id: i64,
    title: String,
    #[serde(default)]
    msg: Option<String>,
    transazione: String,
    time_proc: String,
    is_read: bool,
    #[serde(default, deserialize_with = "object_or_none")]
    attr_notifica: Option<RawAttributes>,
}

#[derive(Deserialize)]
struct RawAttributes {
    #[serde(default, deserialize_with = "opt_int_lenient")]
    inc: Option<i64>,
}

impl RawNotification {
    fn into_notification(self) -> Result<Notification, ParseError> {
        let course = if rules::is_course_scoped_topic(&self.transazione) {
            let inc = self.attr_notifica.and_then(|a| a.inc).ok_or_else(|| {
                ParseError::new(
                    "notification",
                    format!("{} notification {} has no course", self.transazione, self.id),
                )
            })?;
            Some(inc)
        } else {
            None
        };

        Ok(Notification {
            time: parse_date(&self.time_proc, DateFormat::YearMonthDayTimeSeconds)?,
            id: self.id,
            title: self.title,
            body: self.msg,
            topic: self.transazione,
            is_read: self.is_read,
            course,
        })
    }
}

/// Normalize the `messaggi.php` list payload.
pub fn normalize_notifications(raw: &Value) -> Result<Vec<Notification>, ParseError> {
    let inbox: RawInbox = decode("notification", raw)?;
    inbox
        .messaggi
        .into_iter()
        .map(RawNotification::into_notification)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(id: i64, topic: &str, attr: Value) -> Value {
        json!({
            "id": id,
            "title": "Titolo",
            "msg": null,
            "transazione": topic,
            "time_proc": "2021/11/03 10:15:00",
            "is_read": false,
            "attr_notifica": attr
        })
    }

    #[test]
    fn course_is_present_only_for_course_topics() {
        let raw = json!({"messaggi": [
            message(1, "avvisidoc", json!({"inc": 123})),
            message(2, "matdid", json!({"inc": "456"})),
            message(3, "individuale", json!({"inc": 789})),
            message(4, "test", json!("")),
        ]});
        let notifications = normalize_notifications(&raw).unwrap();
        let courses: Vec<Option<i64>> = notifications.iter().map(|n| n.course).collect();
        assert_eq!(courses, vec![Some(123), Some(456), None, None]);
        assert_eq!(notifications[0].time, 1_635_930_900_000);
        assert_eq!(notifications[0].body, None);
    }

    #[test]
    fn course_topic_without_course_is_rejected() {
        let raw = json!({"messaggi": [message(9, "matdid", json!(null))]});
        let err = normalize_notifications(&raw).unwrap_err();
        assert!(err.message.contains("has no course"));
    }

    #[test]
    fn empty_inbox() {
        assert!(normalize_notifications(&json!({"messaggi": ""})).unwrap().is_empty());
        assert!(normalize_notifications(&json!({})).unwrap().is_empty());
    }
}
