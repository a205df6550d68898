//! Derived values computed from upstream codes and sentinels.
//!
//! Kept as tables so each rule can be read, and tested, on its own.

/// Course categories for fictitious courses (thesis, internship).
pub const DUMMY_COURSE_CATEGORIES: &[&str] = &["T", "A"];

/// Signup id meaning "not signed up" in an exam session.
pub const NOT_SIGNED_UP: i64 = -1;

/// Upstream spelling of a true flag.
pub const FLAG_YES: &str = "S";

/// Upstream spelling of "no overbooking"; anything else means overbooking.
pub const OVERBOOKING_NO: &str = "N";

/// Exam signup check messages that mean "no problem".
pub const SIGNUP_CHECK_PASSED: &[&str] = &["CONTROLLO SUPERATO", ""];

/// Notification topics that refer to a specific course.
pub const COURSE_SCOPED_TOPICS: &[&str] = &["avvisidoc", "matdid"];

/// Statuses a provisional mark may be in.
pub const PROVISIONAL_STATUSES: &[&str] = &["P", "C", "R", "V"];

pub fn is_dummy_category(category: Option<&str>) -> bool {
    category.is_some_and(|c| DUMMY_COURSE_CATEGORIES.contains(&c))
}

/// An absent signup id is treated as not signed up.
pub fn is_signed_up(signup_id: Option<i64>) -> bool {
    signup_id.is_some_and(|id| id != NOT_SIGNED_UP)
}

pub fn is_flag_set(flag: Option<&str>) -> bool {
    flag == Some(FLAG_YES)
}

pub fn has_overbooking(flag: Option<&str>) -> bool {
    flag != Some(OVERBOOKING_NO)
}

/// `None` when the upstream message reports a passed signup check.
pub fn signup_error(message: Option<&str>) -> Option<String> {
    let message = message.map(str::trim).unwrap_or_default();
    if SIGNUP_CHECK_PASSED.contains(&message) {
        None
    } else {
        Some(message.to_string())
    }
}

pub fn is_course_scoped_topic(topic: &str) -> bool {
    COURSE_SCOPED_TOPICS.contains(&topic)
}

pub fn is_known_provisional_status(status: &str) -> bool {
    PROVISIONAL_STATUSES.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_course_table() {
        let cases = [
            (Some("T"), true),
            (Some("A"), true),
            (Some("B"), false),
            (Some("t"), false),
            (Some(""), false),
            (None, false),
        ];
        for (category, expected) in cases {
            assert_eq!(is_dummy_category(category), expected, "{category:?}");
        }
    }

    #[test]
    fn signup_table() {
        let cases = [(Some(-1), false), (Some(0), true), (Some(4_812_311), true), (Some(-2), true), (None, false)];
        for (id, expected) in cases {
            assert_eq!(is_signed_up(id), expected, "{id:?}");
        }
    }

    #[test]
    fn flag_table() {
        let cases = [(Some("S"), true), (Some("N"), false), (Some("s"), false), (None, false)];
        for (flag, expected) in cases {
            assert_eq!(is_flag_set(flag), expected, "{flag:?}");
        }
    }

    #[test]
    fn overbooking_table() {
        let cases = [(Some("N"), false), (Some("S"), true), (Some(""), true), (None, true)];
        for (flag, expected) in cases {
            assert_eq!(has_overbooking(flag), expected, "{flag:?}");
        }
    }

    #[test]
    fn signup_error_table() {
        let cases = [
            (Some("CONTROLLO SUPERATO"), None),
            (Some(""), None),
            (None, None),
            (Some("Iscrizione chiusa"), Some("Iscrizione chiusa".to_string())),
        ];
        for (message, expected) in cases {
            assert_eq!(signup_error(message), expected, "{message:?}");
        }
    }

    #[test]
    fn course_scoped_topics() {
        assert!(is_course_scoped_topic("avvisidoc"));
        assert!(is_course_scoped_topic("matdid"));
        assert!(!is_course_scoped_topic("individuale"));
        assert!(!is_course_scoped_topic("test"));
    }

    #[test]
    fn provisional_statuses() {
        for status in ["P", "C", "R", "V"] {
            assert!(is_known_provisional_status(status));
        }
        assert!(!is_known_provisional_status("X"));
    }
}
