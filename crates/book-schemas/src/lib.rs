//! Domain types shared by the book store, the outbox relay, and the
//! producer-side use cases: `Book`, `BookEvent`, and the keyset pagination
//! types. The numeric `EventType`/`EventStatus` discriminants are the wire
//! contract (§6) and must not be renumbered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;

pub use error::Kind as ErrorKind;

/// The business entity. `id` is assigned on `Create` and is immutable after
/// that; `removed` is a tombstone, never a physical delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub year: i16,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Closed enumeration of outbox event kinds. Numeric values are the wire
/// contract consumers route on via the `event_type` message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventType {
    Created = 1,
    Updated = 2,
    Deleted = 3,
}

impl EventType {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a numeric code read back from the `book_event.type` column.
    /// Rejects any value outside {1,2,3} rather than silently coercing it.
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            1 => Some(EventType::Created),
            2 => Some(EventType::Updated),
            3 => Some(EventType::Deleted),
            _ => None,
        }
    }
}

/// Outbox row status. Transitions form the DAG
/// `{New, Unlock} -> Lock -> {deleted, Unlock}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventStatus {
    New = 1,
    Lock = 2,
    Unlock = 3,
}

impl EventStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            1 => Some(EventStatus::New),
            2 => Some(EventStatus::Lock),
            3 => Some(EventStatus::Unlock),
            _ => None,
        }
    }
}

/// One row of `book_event`, the outbox entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BookEvent {
    pub id: i64,
    pub book_id: i64,
    pub event_type: EventType,
    pub status: EventStatus,
    pub payload: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

/// An in-memory pagination marker. Never constructed from untrusted input
/// directly — always goes through [`crate::error::Kind`]-checked decoding in
/// `book-db`'s cursor codec.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub value: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Sort key for the `book` keyset list. `Id` is the only globally unique key
/// in this system; the others require `created_at` as a tie-breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Id,
    Title,
    Year,
}

impl SortBy {
    pub fn column(self) -> &'static str {
        match self {
            SortBy::Id => "id",
            SortBy::Title => "title",
            SortBy::Year => "year",
        }
    }

    /// Only `id` is a globally unique sort key in this schema.
    pub fn is_unique(self) -> bool {
        matches!(self, SortBy::Id)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(SortBy::Id),
            "title" => Some(SortBy::Title),
            "year" => Some(SortBy::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// `>` for ascending order, `<` for descending — the keyset predicate
    /// operator (§4.2).
    pub fn cursor_op(self) -> &'static str {
        match self {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginationParams {
    pub limit: u64,
    pub cursor: Option<Cursor>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// Opaque page marker handed back to the caller; empty when the page
/// fetched is the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub next_cursor: String,
}

#[derive(Debug, Clone)]
pub struct ResponseBooks {
    pub data: Vec<Book>,
    pub page_info: PageInfo,
}

/// Implemented by any row type the pagination engine can build a cursor
/// from: it must expose its sort-key field as a string and its creation
/// timestamp (used as the keyset tie-breaker for non-unique sort keys).
pub trait Paginatable {
    fn field_as_string(&self, sort_by: SortBy) -> String;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Paginatable for Book {
    fn field_as_string(&self, sort_by: SortBy) -> String {
        match sort_by {
            SortBy::Id => self.id.to_string(),
            SortBy::Title => self.title.clone(),
            SortBy::Year => self.year.to_string(),
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
