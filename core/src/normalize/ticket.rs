//! Support tickets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, list_or_empty, EpochMillis};
use crate::error::ParseError;

/// Ticket state code for an open ticket; `2` means closed.
pub const TICKET_OPEN: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
    /// HTML of the first message.
    pub description: String,
    pub created_at: EpochMillis,
    pub last_updated: EpochMillis,
    pub state: u8,
    pub unread: u32,
}

impl Ticket {
    pub fn is_open(&self) -> bool {
        self.state == TICKET_OPEN
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTicket {
    id: i64,
    oggetto: String,
    #[serde(default)]
    descrizione: String,
    data_apertura: EpochMillis,
    data_aggiornamento: EpochMillis,
    id_stato: u8,
    #[serde(default, rename = "countnonlette")]
    unread: u32,
}

impl From<RawTicket> for Ticket {
    fn from(raw: RawTicket) -> Self {
        Self {
            id: raw.id,
            title: raw.oggetto,
            description: raw.descrizione,
            created_at: raw.data_apertura,
            last_updated: raw.data_aggiornamento,
            state: raw.id_stato,
            unread: raw.unread,
        }
    }
}

#[derive(Deserialize)]
struct RawTicketList {
    #[serde(default, deserialize_with = "list_or_empty")]
    ticket: Vec<RawTicket>,
}

#[derive(Deserialize)]
struct RawSingleTicket {
    ticket: RawTicket,
}

/// Normalize the `getListaTicket` payload.
pub fn normalize_tickets(raw: &Value) -> Result<Vec<Ticket>, ParseError> {
    let list: RawTicketList = decode("ticket", raw)?;
    Ok(list.ticket.into_iter().map(Ticket::from).collect())
}

/// Normalize the `getTicket` payload.
pub fn normalize_ticket(raw: &Value) -> Result<Ticket, ParseError> {
    let single: RawSingleTicket = decode("ticket", raw)?;
    Ok(single.ticket.into())
}
