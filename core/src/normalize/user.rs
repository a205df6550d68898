//! Student identity and mailbox.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, list_or_empty, string_field, string_or_number};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalData {
    /// Current student id (it: matricola), e.g. `123456`.
    pub current_id: String,
    /// Past and present student ids.
    pub ids: Vec<String>,
    pub name: String,
    pub surname: String,
    /// Degree type in Italian, e.g. `Corso di Laurea in`.
    pub degree_type: String,
    /// Degree name in Italian, e.g. `INGEGNERIA INFORMATICA`.
    pub degree_name: String,
}

/// What `login.php` hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Absent when logging in with a token the portal keeps valid.
    pub token: Option<String>,
    pub personal_data: PersonalData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSummary {
    pub total: u64,
    pub unread: u64,
}

#[derive(Deserialize)]
struct RawLogin {
    #[serde(default)]
    login: Option<RawToken>,
    anagrafica: RawPersonalData,
}

#[derive(Deserialize)]
struct RawToken {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct RawPersonalData {
    #[serde(deserialize_with = "string_or_number")]
    matricola: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    all_matricolas: Vec<Value>,
    nome: String,
    cognome: String,
    #[serde(default)]
    tipo_corso_laurea: String,
    #[serde(default)]
    nome_corso_laurea: String,
}

#[derive(Deserialize)]
struct RawMailbox {
    mail: RawMailCounts,
}

#[derive(Deserialize)]
struct RawMailCounts {
    messages: u64,
    unread: u64,
}

fn id_text(value: Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ParseError::new("login", format!("unexpected student id {other}"))),
    }
}

/// Normalize the `login.php` payload.
pub fn normalize_login(raw: &Value) -> Result<LoginOutcome, ParseError> {
    let raw: RawLogin = decode("login", raw)?;
    let person = raw.anagrafica;
    let ids = person
        .all_matricolas
        .into_iter()
        .map(id_text)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoginOutcome {
        token: raw.login.and_then(|l| l.token).filter(|t| !t.is_empty()),
        personal_data: PersonalData {
            current_id: person.matricola,
            ids,
            name: person.nome,
            surname: person.cognome,
            degree_type: person.tipo_corso_laurea,
            degree_name: person.nome_corso_laurea,
        },
    })
}

/// Normalize the `mail.php` payload.
pub fn normalize_mail_summary(raw: &Value) -> Result<MailSummary, ParseError> {
    let raw: RawMailbox = decode("mail", raw)?;
    Ok(MailSummary {
        total: raw.mail.messages,
        unread: raw.mail.unread,
    })
}

/// Normalize the `goto_webmail.php` payload into the per-user webmail URL.
pub fn normalize_webmail_url(raw: &Value) -> Result<String, ParseError> {
    string_field("webmail", raw, "url")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_with_token_and_identity() {
        let raw = json!({
            "login": {"token": "abcdef0123"},
            "anagrafica": {
                "matricola": "123456",
                "all_matricolas": ["123456", 98765],
                "nome": "Ada",
                "cognome": "Lovelace",
                "tipo_corso_laurea": "Corso di Laurea in",
                "nome_corso_laurea": "INGEGNERIA INFORMATICA"
            }
        });
        let outcome = normalize_login(&raw).unwrap();
        assert_eq!(outcome.token.as_deref(), Some("abcdef0123"));
        assert_eq!(outcome.personal_data.ids, vec!["123456", "98765"]);
        assert_eq!(outcome.personal_data.degree_name, "INGEGNERIA INFORMATICA");
    }

    #[test]
    fn login_without_token_section() {
        let raw = json!({"anagrafica": {"matricola": 123456, "nome": "Ada", "cognome": "Lovelace"}});
        let outcome = normalize_login(&raw).unwrap();
        assert_eq!(outcome.token, None);
        assert_eq!(outcome.personal_data.current_id, "123456");
        assert!(outcome.personal_data.ids.is_empty());
    }

    #[test]
    fn login_without_identity_fails() {
        assert!(normalize_login(&json!({"login": {"token": "t"}})).is_err());
    }

    #[test]
    fn mail_summary() {
        let summary = normalize_mail_summary(&json!({"mail": {"messages": 120, "unread": 3}})).unwrap();
        assert_eq!(summary, MailSummary { total: 120, unread: 3 });
        assert_eq!(
            normalize_webmail_url(&json!({"url": "https://mail"})).unwrap(),
            "https://mail"
        );
    }
}
