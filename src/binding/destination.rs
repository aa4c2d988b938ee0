// ABOUTME: Destination classification for bind targets (table name, record, mapping, collections)
// ABOUTME: Turns a caller value into a tagged destination and a fresh binding context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::record::{derive_fields, resolve_table_name, scan_record, Record};
use super::{BindShape, BindingContext};
use crate::errors::{BindError, BindResult};
use crate::value::{MapRow, Value};
use tracing::debug;

/// Type-erased struct destination, either a single record or a record collection
pub trait RecordTarget: Send {
    /// Declared name of the record type
    fn type_name(&self) -> &'static str;

    /// Table name, honoring the record's naming capability
    fn table_name(&self) -> String;

    /// Column names derived from the record's declared fields
    fn derive_fields(&self) -> Vec<String>;

    /// Scan one row of values, positionally matched to `fields`
    ///
    /// # Errors
    ///
    /// Returns a scan error when the row does not fit the record
    fn scan_row(&mut self, fields: &[String], values: Vec<Value>) -> BindResult<()>;
}

/// Scans straight into the caller's record
struct SingleRecord<'d, R> {
    dest: &'d mut R,
}

impl<R: Record> RecordTarget for SingleRecord<'_, R> {
    fn type_name(&self) -> &'static str {
        R::type_name()
    }

    fn table_name(&self) -> String {
        resolve_table_name(&*self.dest)
    }

    fn derive_fields(&self) -> Vec<String> {
        derive_fields::<R>()
    }

    fn scan_row(&mut self, fields: &[String], values: Vec<Value>) -> BindResult<()> {
        scan_record(&mut *self.dest, fields, values)
    }
}

/// Scans each row into a copy of a zero-valued template, then appends it
struct RecordCollection<'d, R> {
    dest: &'d mut Vec<R>,
    template: R,
}

impl<R: Record> RecordTarget for RecordCollection<'_, R> {
    fn type_name(&self) -> &'static str {
        R::type_name()
    }

    fn table_name(&self) -> String {
        resolve_table_name(&self.template)
    }

    fn derive_fields(&self) -> Vec<String> {
        derive_fields::<R>()
    }

    fn scan_row(&mut self, fields: &[String], values: Vec<Value>) -> BindResult<()> {
        let mut row = self.template.clone();
        scan_record(&mut row, fields, values)?;
        self.dest.push(row);
        Ok(())
    }
}

/// A bind target, tagged by shape
pub enum Destination<'d> {
    /// Bare table name, no field metadata
    Table(String),
    /// One record
    Record(Box<dyn RecordTarget + 'd>),
    /// Growable collection of records
    RecordList(Box<dyn RecordTarget + 'd>),
    /// One open key/value row
    Mapping(&'d mut MapRow),
    /// Growable collection of key/value rows
    MappingList(&'d mut Vec<MapRow>),
    /// A value of a kind no shape accepts, carrying its type name
    Unsupported(&'static str),
}

impl Destination<'_> {
    /// Shape of this destination, `None` when unsupported
    #[must_use]
    pub const fn shape(&self) -> Option<BindShape> {
        match self {
            Self::Table(_) => Some(BindShape::TableName),
            Self::Record(_) => Some(BindShape::Record),
            Self::RecordList(_) => Some(BindShape::RecordList),
            Self::Mapping(_) => Some(BindShape::Mapping),
            Self::MappingList(_) => Some(BindShape::MappingList),
            Self::Unsupported(_) => None,
        }
    }
}

/// Conversion of a caller value into a [`Destination`]
pub trait IntoDestination<'d> {
    /// Wrap `self` as a destination
    fn into_destination(self) -> Destination<'d>;
}

impl<'d> IntoDestination<'d> for Destination<'d> {
    fn into_destination(self) -> Destination<'d> {
        self
    }
}

impl<'d> IntoDestination<'d> for &str {
    fn into_destination(self) -> Destination<'d> {
        Destination::Table(self.to_owned())
    }
}

impl<'d> IntoDestination<'d> for String {
    fn into_destination(self) -> Destination<'d> {
        Destination::Table(self)
    }
}

impl<'d, R: Record> IntoDestination<'d> for &'d mut R {
    fn into_destination(self) -> Destination<'d> {
        Destination::Record(Box::new(SingleRecord { dest: self }))
    }
}

impl<'d, R: Record> IntoDestination<'d> for &'d mut Vec<R> {
    fn into_destination(self) -> Destination<'d> {
        Destination::RecordList(Box::new(RecordCollection {
            dest: self,
            template: R::default(),
        }))
    }
}

impl<'d> IntoDestination<'d> for &'d mut MapRow {
    fn into_destination(self) -> Destination<'d> {
        Destination::Mapping(self)
    }
}

impl<'d> IntoDestination<'d> for &'d mut Vec<MapRow> {
    fn into_destination(self) -> Destination<'d> {
        Destination::MappingList(self)
    }
}

impl<'d> IntoDestination<'d> for &'d mut Value {
    fn into_destination(self) -> Destination<'d> {
        Destination::Unsupported("Value")
    }
}

impl<'d> IntoDestination<'d> for &'d mut Vec<Value> {
    fn into_destination(self) -> Destination<'d> {
        Destination::Unsupported("Vec<Value>")
    }
}

/// Classify a destination and build a fresh binding context for it
///
/// `preset_fields` is a field list the caller supplied for this bind. When it
/// is non-empty it is used as-is; otherwise record shapes derive their fields
/// from the record's declared fields.
///
/// # Errors
///
/// Returns a classification error for destinations no shape accepts
pub fn classify(
    destination: Destination<'_>,
    preset_fields: Vec<String>,
) -> BindResult<BindingContext<'_>> {
    let Some(shape) = destination.shape() else {
        let type_name = match destination {
            Destination::Unsupported(name) => name,
            _ => "unknown",
        };
        return Err(BindError::classification(type_name));
    };

    let mut table_name = None;
    let mut fields = Vec::new();
    let mut row_limit = None;
    match &destination {
        Destination::Table(name) => table_name = Some(name.clone()),
        Destination::Record(target) | Destination::RecordList(target) => {
            table_name = Some(target.table_name());
            fields = if preset_fields.is_empty() {
                target.derive_fields()
            } else {
                preset_fields
            };
            if shape == BindShape::Record {
                row_limit = Some(1);
            }
        }
        Destination::Mapping(_) | Destination::MappingList(_) | Destination::Unsupported(_) => {}
    }

    debug!(
        shape = ?shape,
        table = table_name.as_deref().unwrap_or(""),
        fields = fields.len(),
        "Classified bind destination"
    );

    Ok(BindingContext {
        shape,
        table_name,
        fields,
        row_limit,
        target: destination,
    })
}
