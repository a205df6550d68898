//! Course material tree.
//!
//! Upstream nodes carry a `tipo` discriminator: `FILE` leaves and `DIR`
//! folders with a nested `files` list. An unknown discriminator is a hard
//! `ParseError`: dropping a node would silently lose part of a listing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::date::{parse_date, DateFormat};
use super::{decode, decode_list, list_or_empty, string_or_number, EpochMillis};
use crate::error::ParseError;

/// Folders nested deeper than this are rejected.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tipo")]
pub(crate) enum RawMaterial {
    #[serde(rename = "FILE")]
    File {
        #[serde(deserialize_with = "string_or_number")]
        code: String,
        descrizione: String,
        nomefile: String,
        cont_type: String,
        size_kb: u64,
        data_ins: String,
    },
    #[serde(rename = "DIR")]
    Dir {
        #[serde(deserialize_with = "string_or_number")]
        code: String,
        descrizione: String,
        #[serde(default, deserialize_with = "list_or_empty")]
        files: Vec<RawMaterial>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFile {
    pub code: String,
    /// User-facing name, not necessarily a valid filename.
    pub display_name: String,
    pub internal_filename: String,
    pub mime_type: String,
    pub size_kb: u64,
    pub created_at: EpochMillis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialDirectory {
    pub code: String,
    pub display_name: String,
    pub children: Vec<MaterialItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MaterialItem {
    File(MaterialFile),
    Directory(MaterialDirectory),
}

impl MaterialItem {
    pub fn code(&self) -> &str {
        match self {
            MaterialItem::File(f) => &f.code,
            MaterialItem::Directory(d) => &d.code,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            MaterialItem::File(f) => &f.display_name,
            MaterialItem::Directory(d) => &d.display_name,
        }
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> usize {
        match self {
            MaterialItem::File(_) => 1,
            MaterialItem::Directory(d) => d.children.iter().map(MaterialItem::file_count).sum(),
        }
    }

    /// Depth of this subtree; a file has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            MaterialItem::File(_) => 1,
            MaterialItem::Directory(d) => 1 + d.children.iter().map(MaterialItem::depth).max().unwrap_or(0),
        }
    }

    /// Depth-first iterator over every file in this subtree.
    pub fn files(&self) -> Vec<&MaterialFile> {
        let mut out = Vec::new();
        collect_files(self, &mut out);
        out
    }
}

fn collect_files<'a>(item: &'a MaterialItem, out: &mut Vec<&'a MaterialFile>) {
    match item {
        MaterialItem::File(f) => out.push(f),
        MaterialItem::Directory(d) => d.children.iter().for_each(|child| collect_files(child, out)),
    }
}

impl RawMaterial {
    pub(crate) fn into_item(self, depth: usize) -> Result<MaterialItem, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::new(
                "material",
                format!("folders nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        match self {
            RawMaterial::File {
                code,
                descrizione,
                nomefile,
                cont_type,
                size_kb,
                data_ins,
            } => Ok(MaterialItem::File(MaterialFile {
                created_at: parse_date(&data_ins, DateFormat::YearMonthDayTimeSeconds)?,
                code,
                display_name: descrizione,
                internal_filename: nomefile,
                mime_type: cont_type,
                size_kb,
            })),
            RawMaterial::Dir {
                code,
                descrizione,
                files,
            } => Ok(MaterialItem::Directory(MaterialDirectory {
                code,
                display_name: descrizione,
                children: into_items(files, depth + 1)?,
            })),
        }
    }
}

pub(crate) fn into_items(raw: Vec<RawMaterial>, depth: usize) -> Result<Vec<MaterialItem>, ParseError> {
    raw.into_iter().map(|item| item.into_item(depth)).collect()
}

/// Normalize one material node and everything below it.
pub fn normalize_material(raw: &Value) -> Result<MaterialItem, ParseError> {
    decode::<RawMaterial>("material", raw)?.into_item(1)
}

/// Normalize a top-level material listing; a blank listing is empty.
pub fn normalize_material_list(raw: &Value) -> Result<Vec<MaterialItem>, ParseError> {
    let items = decode_list::<RawMaterial>("material", raw)?;
    into_items(items, 1)
}
