// ABOUTME: Binding engine: destination shapes, per-bind context, and row materialization
// ABOUTME: Classifies bind targets once and streams cursor rows into them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Binding Engine
//!
//! A bind turns a caller value into a [`BindingContext`]: the destination's
//! [`BindShape`], its table name, the ordered column list for record shapes,
//! and a live handle to the value that reads will populate. The shape is
//! fixed for the lifetime of the context; every later step matches on it
//! rather than re-inspecting the destination.

/// Destination classification
pub mod destination;

/// Row materialization from a cursor into the bound destination
pub mod materialize;

/// Record contract and field metadata extraction
pub mod record;

pub use destination::{classify, Destination, IntoDestination, RecordTarget};
pub use materialize::materialize;
pub use record::{derive_fields, scan_record, unknown_column, FieldSpec, NameProvider, Record};

use serde::Serialize;
use std::fmt;

/// How a bound destination is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindShape {
    /// Bare table name; used only to name the target table
    TableName,
    /// A single record
    Record,
    /// A growable collection of records
    RecordList,
    /// A single open key/value row
    Mapping,
    /// A growable collection of key/value rows
    MappingList,
}

impl BindShape {
    /// Whether the shape carries a record field list
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record | Self::RecordList)
    }
}

impl fmt::Display for BindShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TableName => "table_name",
            Self::Record => "record",
            Self::RecordList => "record_list",
            Self::Mapping => "mapping",
            Self::MappingList => "mapping_list",
        };
        f.write_str(name)
    }
}

/// State of one bind: shape, table, field list, and the destination handle
///
/// Built fresh by every bind and never mutated afterwards except through
/// materialization into its destination.
pub struct BindingContext<'d> {
    pub(crate) shape: BindShape,
    pub(crate) table_name: Option<String>,
    pub(crate) fields: Vec<String>,
    pub(crate) row_limit: Option<usize>,
    pub(crate) target: Destination<'d>,
}

impl BindingContext<'_> {
    /// Shape assigned at bind time
    #[must_use]
    pub const fn shape(&self) -> BindShape {
        self.shape
    }

    /// Resolved table name; unset for mapping shapes
    #[must_use]
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Ordered column names; empty unless the shape is a record shape
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Implicit row limit for reads; `Some(1)` for a single record
    #[must_use]
    pub const fn row_limit(&self) -> Option<usize> {
        self.row_limit
    }
}

impl fmt::Debug for BindingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("shape", &self.shape)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("row_limit", &self.row_limit)
            .finish_non_exhaustive()
    }
}
