// ABOUTME: Record contract and field metadata extraction for struct-shaped destinations
// ABOUTME: Maps declared fields to column names via tag overrides and the ignore marker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::binding::IGNORE_TAG;
use crate::errors::{BindError, BindResult};
use crate::value::Value;
use std::any;

/// One declared field of a record, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as declared on the struct
    pub name: &'static str,
    /// Column override; `Some("-")` excludes the field
    pub tag: Option<&'static str>,
}

impl FieldSpec {
    /// Field whose column name is the field name
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, tag: None }
    }

    /// Field mapped to an explicit column
    #[must_use]
    pub const fn tagged(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            tag: Some(column),
        }
    }

    /// Field excluded from binding
    #[must_use]
    pub const fn ignored(name: &'static str) -> Self {
        Self {
            name,
            tag: Some(IGNORE_TAG),
        }
    }

    /// Whether the naming convention excludes this field
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.tag == Some(IGNORE_TAG)
    }

    /// Column name: the tag when present, the field name otherwise
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self.tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => self.name,
        }
    }
}

/// Optional capability: a record that names its own table
pub trait NameProvider {
    /// Table name used instead of the type name
    fn bind_name(&self) -> String;
}

/// A struct-shaped destination populated one row at a time
///
/// `Default` provides the zero-valued per-row template and `Clone` the fresh
/// copy each collection row is scanned into.
///
/// ```rust,ignore
/// #[derive(Debug, Default, Clone)]
/// struct User { id: i64, name: String }
///
/// impl Record for User {
///     fn fields() -> Vec<FieldSpec> {
///         vec![FieldSpec::new("id"), FieldSpec::tagged("name", "user_name")]
///     }
///
///     fn set_field(&mut self, column: &str, value: Value) -> BindResult<()> {
///         match column {
///             "id" => self.id = FromValue::from_value(value)?,
///             "user_name" => self.name = FromValue::from_value(value)?,
///             other => return Err(unknown_column::<Self>(other)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Record: Default + Clone + Send + 'static {
    /// Declared fields in declaration order
    fn fields() -> Vec<FieldSpec>;

    /// Store one column value into the field mapped to `column`
    ///
    /// # Errors
    ///
    /// Returns a scan error if the column is unknown or the value does not fit
    fn set_field(&mut self, column: &str, value: Value) -> BindResult<()>;

    /// Declared type name, the default table name
    #[must_use]
    fn type_name() -> &'static str {
        short_type_name(any::type_name::<Self>())
    }

    /// The naming capability, when the record implements [`NameProvider`]
    fn name_provider(&self) -> Option<&dyn NameProvider> {
        None
    }
}

/// Strip module path and generic arguments: `app::models::User<T>` -> `User`
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Column names for a record type, in declaration order, ignored fields omitted
#[must_use]
pub fn derive_fields<R: Record>() -> Vec<String> {
    R::fields()
        .iter()
        .filter(|field| !field.is_ignored())
        .map(|field| field.column().to_owned())
        .collect()
}

/// Table name for a record instance: the naming capability wins over the type name
#[must_use]
pub fn resolve_table_name<R: Record>(record: &R) -> String {
    record
        .name_provider()
        .map_or_else(|| R::type_name().to_owned(), |provider| provider.bind_name())
}

/// Scan error for a column the record has no field for
#[must_use]
pub fn unknown_column<R: Record>(column: &str) -> BindError {
    BindError::scan(format!(
        "column '{column}' has no matching field on {}",
        R::type_name()
    ))
}

/// Positionally scan one row into a record: `fields[i]` receives `values[i]`
///
/// # Errors
///
/// Returns a scan error when the column count differs from the field count,
/// or when any single field rejects its value
pub fn scan_record<R: Record>(
    record: &mut R,
    fields: &[String],
    values: Vec<Value>,
) -> BindResult<()> {
    if fields.len() != values.len() {
        return Err(BindError::scan(format!(
            "expected {} destination fields in scan, {} has {}",
            values.len(),
            R::type_name(),
            fields.len()
        )));
    }

    for (column, value) in fields.iter().zip(values) {
        record.set_field(column, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FromValue;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Account {
        id: i64,
        owner: String,
        cached_score: f64,
    }

    impl Record for Account {
        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::new("id"),
                FieldSpec::tagged("owner", "owner_name"),
                FieldSpec::ignored("cached_score"),
            ]
        }

        fn set_field(&mut self, column: &str, value: Value) -> BindResult<()> {
            match column {
                "id" => self.id = FromValue::from_value(value)?,
                "owner_name" => self.owner = FromValue::from_value(value)?,
                other => return Err(unknown_column::<Self>(other)),
            }
            Ok(())
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Ledger;

    impl NameProvider for Ledger {
        fn bind_name(&self) -> String {
            "ledger_entries".to_owned()
        }
    }

    impl Record for Ledger {
        fn fields() -> Vec<FieldSpec> {
            Vec::new()
        }

        fn set_field(&mut self, column: &str, _value: Value) -> BindResult<()> {
            Err(unknown_column::<Self>(column))
        }

        fn name_provider(&self) -> Option<&dyn NameProvider> {
            Some(self)
        }
    }

    #[test]
    fn test_derive_fields_in_declaration_order() {
        assert_eq!(derive_fields::<Account>(), vec!["id", "owner_name"]);
    }

    #[test]
    fn test_table_name_defaults_to_type_name() {
        assert_eq!(resolve_table_name(&Account::default()), "Account");
    }

    #[test]
    fn test_name_provider_overrides_type_name() {
        assert_eq!(resolve_table_name(&Ledger), "ledger_entries");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::User"), "User");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_scan_record_positional() {
        let mut account = Account::default();
        let fields = derive_fields::<Account>();
        scan_record(
            &mut account,
            &fields,
            vec![Value::Integer(9), Value::Text("ana".to_owned())],
        )
        .unwrap();

        assert_eq!(account.id, 9);
        assert_eq!(account.owner, "ana");
    }

    #[test]
    fn test_scan_record_count_mismatch() {
        let mut account = Account::default();
        let err = scan_record(
            &mut account,
            &["id".to_owned()],
            vec![Value::Integer(1), Value::Integer(2)],
        )
        .unwrap_err();

        assert_eq!(err.code, crate::errors::ErrorCode::ScanFailed);
    }
}
