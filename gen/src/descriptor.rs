//! Per-type persistence metadata.
//!
//! [`TypeDescriptor::from_fields`] folds the parsed tags of one struct, in
//! declaration order, into the single record the synthesizer renders from.
//! Column order is preserved throughout: the select list, the member
//! pointers and the display names all enumerate the key first and then the
//! remaining columns exactly as they were declared.

use std::collections::BTreeSet;

use syn::Ident;
use syn::ext::IdentExt;

use crate::error::{GenError, Result};
use crate::tag::{AuditRole, FieldTag};

/// One named struct field together with its parsed tag.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub ident: Ident,
    pub tag: FieldTag,
}

impl FieldInfo {
    pub fn new(ident: Ident, tag: FieldTag) -> Self {
        Self { ident, tag }
    }

    /// Field name as written in source, without any `r#` prefix.
    pub fn name(&self) -> String {
        self.ident.unraw().to_string()
    }
}

/// A struct field mapped to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnField {
    pub field: Ident,
    pub column: String,
}

impl ColumnField {
    pub fn field_name(&self) -> String {
        self.field.unraw().to_string()
    }
}

/// Aggregated persistence metadata for one struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type name as written in source, without any `r#` prefix.
    pub name: String,
    /// Type identifier, raw prefix kept.
    pub ident: Ident,
    /// Modules enclosing the type relative to the scanned module, outermost
    /// first.
    pub module_path: Vec<Ident>,
    pub table: String,
    pub key: Option<ColumnField>,
    /// Non-key columns in declaration order.
    pub columns: Vec<ColumnField>,
    pub user_audit_field: Option<Ident>,
    pub time_audit_field: Option<Ident>,
    /// Column names left out of UPDATE statements.
    pub no_update_columns: BTreeSet<String>,
}

impl TypeDescriptor {
    /// Builds the descriptor for one struct.
    ///
    /// Returns `Ok(None)` when no field carries a `sql` column; such types
    /// are skipped without complaint.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::DuplicateKey`] when two fields are tagged `key`,
    /// and [`GenError::MissingTable`] when persisted fields exist but no
    /// field names the table.
    pub fn from_fields(ident: &Ident, fields: &[FieldInfo]) -> Result<Option<Self>> {
        let name = ident.unraw().to_string();
        let name = name.as_str();
        let mut table = None;
        let mut key: Option<ColumnField> = None;
        let mut columns = Vec::with_capacity(fields.len());
        let mut user_audit_field = None;
        let mut time_audit_field = None;
        let mut no_update_columns = BTreeSet::new();
        let mut persisted = false;

        for info in fields {
            match info.tag.audit {
                AuditRole::User => user_audit_field = Some(info.ident.clone()),
                AuditRole::Time => time_audit_field = Some(info.ident.clone()),
                AuditRole::None => {}
            }

            let Some(column) = &info.tag.sql_column else {
                continue;
            };
            persisted = true;

            // Last one wins.
            if let Some(tagged) = &info.tag.table {
                table = Some(tagged.clone());
            }

            let entry = ColumnField {
                field: info.ident.clone(),
                column: column.clone(),
            };
            if info.tag.is_key {
                if let Some(existing) = &key {
                    return Err(GenError::DuplicateKey {
                        type_name: name.to_string(),
                        first: existing.field_name(),
                        second: entry.field_name(),
                    });
                }
                key = Some(entry);
                continue;
            }

            if !info.tag.updatable {
                no_update_columns.insert(column.clone());
            }
            columns.push(entry);
        }

        if !persisted {
            return Ok(None);
        }
        let table = table.ok_or_else(|| GenError::MissingTable(name.to_string()))?;

        Ok(Some(Self {
            name: name.to_string(),
            ident: ident.clone(),
            module_path: Vec::new(),
            table,
            key,
            columns,
            user_audit_field,
            time_audit_field,
            no_update_columns,
        }))
    }

    /// Sets the enclosing module path.
    pub fn with_module_path(mut self, module_path: Vec<Ident>) -> Self {
        self.module_path = module_path;
        self
    }

    /// Type path relative to the scanned module, e.g. `inner::Row`.
    pub fn qualified_name(&self) -> String {
        self.module_path
            .iter()
            .map(|segment| segment.unraw().to_string())
            .chain(std::iter::once(self.name.clone()))
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Key column, or `""` for keyless types.
    pub fn key_column(&self) -> &str {
        self.key.as_ref().map_or("", |key| key.column.as_str())
    }

    /// Key struct field name, or `""` for keyless types.
    pub fn key_field_name(&self) -> String {
        self.key.as_ref().map(ColumnField::field_name).unwrap_or_default()
    }

    /// Columns written by UPDATE, in declaration order.
    pub fn update_columns(&self) -> impl Iterator<Item = &ColumnField> {
        self.columns
            .iter()
            .filter(|entry| !self.no_update_columns.contains(&entry.column))
    }

    /// Key column first, then every other column.
    pub fn select_fields(&self) -> String {
        self.key
            .iter()
            .chain(&self.columns)
            .map(|entry| entry.column.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Every non-key column.
    pub fn insert_fields(&self) -> String {
        join_columns(self.columns.iter())
    }

    /// Non-key columns minus the no-update set.
    pub fn update_fields(&self) -> String {
        join_columns(self.update_columns())
    }

    /// Field names aligned with the select list.
    pub fn member_names(&self) -> Vec<String> {
        self.key
            .iter()
            .chain(&self.columns)
            .map(ColumnField::field_name)
            .collect()
    }
}

fn join_columns<'a>(entries: impl Iterator<Item = &'a ColumnField>) -> String {
    entries
        .map(|entry| entry.column.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::call_site())
    }

    fn field(name: &str, tag: &str) -> FieldInfo {
        FieldInfo::new(ident(name), FieldTag::parse(tag))
    }

    fn user_fields() -> Vec<FieldInfo> {
        vec![
            field("id", r#"sql:"id" key:"true" table:"users""#),
            field("username", r#"sql:"username""#),
            field("first", r#"sql:"firstname""#),
            field("user_id", r#"sql:"userid" audit:"user""#),
            field("modified", r#"sql:"modified" audit:"time""#),
            field("created", r#"sql:"created" update:"false""#),
            field("scratch", ""),
        ]
    }

    #[test]
    fn test_builds_user_descriptor() {
        let desc = TypeDescriptor::from_fields(&ident("User"), &user_fields())
            .unwrap()
            .unwrap();

        assert_eq!(desc.table, "users");
        assert_eq!(desc.key_column(), "id");
        assert_eq!(desc.key_field_name(), "id");
        assert_eq!(
            desc.select_fields(),
            "id,username,firstname,userid,modified,created"
        );
        assert_eq!(
            desc.insert_fields(),
            "username,firstname,userid,modified,created"
        );
        assert_eq!(desc.update_fields(), "username,firstname,userid,modified");
        assert_eq!(
            desc.member_names(),
            ["id", "username", "first", "user_id", "modified", "created"]
        );
        assert_eq!(desc.user_audit_field.unwrap().to_string(), "user_id");
        assert_eq!(desc.time_audit_field.unwrap().to_string(), "modified");
        assert!(desc.no_update_columns.contains("created"));
    }

    #[test]
    fn test_no_persisted_fields_yields_none() {
        let fields = vec![field("a", r#"json:"a""#), field("b", "")];
        assert!(TypeDescriptor::from_fields(&ident("Plain"), &fields).unwrap().is_none());
    }

    #[test]
    fn test_last_table_wins() {
        let fields = vec![
            field("id", r#"sql:"id" key:"true" table:"first""#),
            field("name", r#"sql:"name" table:"second""#),
        ];
        let desc = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap().unwrap();
        assert_eq!(desc.table, "second");
    }

    #[test]
    fn test_table_on_unpersisted_field_is_ignored() {
        let fields = vec![
            field("id", r#"sql:"id" key:"true" table:"kept""#),
            field("skip", r#"table:"ignored""#),
        ];
        let desc = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap().unwrap();
        assert_eq!(desc.table, "kept");
    }

    #[test]
    fn test_keyless_type() {
        let fields = vec![
            field("name", r#"sql:"name" table:"log""#),
            field("line", r#"sql:"line""#),
        ];
        let desc = TypeDescriptor::from_fields(&ident("Log"), &fields).unwrap().unwrap();
        assert!(desc.key.is_none());
        assert_eq!(desc.key_column(), "");
        assert_eq!(desc.key_field_name(), "");
        assert_eq!(desc.select_fields(), "name,line");
        assert_eq!(desc.insert_fields(), "name,line");
    }

    #[test]
    fn test_key_only_type() {
        let fields = vec![field("id", r#"sql:"id" key:"true" table:"seq""#)];
        let desc = TypeDescriptor::from_fields(&ident("Seq"), &fields).unwrap().unwrap();
        assert_eq!(desc.select_fields(), "id");
        assert_eq!(desc.insert_fields(), "");
        assert_eq!(desc.update_fields(), "");
        assert!(desc.columns.is_empty());
    }

    #[test]
    fn test_no_update_key_is_not_recorded() {
        let fields = vec![
            field("id", r#"sql:"id" key:"true" table:"t" update:"false""#),
            field("name", r#"sql:"name""#),
        ];
        let desc = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap().unwrap();
        assert!(desc.no_update_columns.is_empty());
        assert_eq!(desc.update_fields(), "name");
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let fields = vec![
            field("id", r#"sql:"id" key:"true" table:"t""#),
            field("other", r#"sql:"other" key:"true""#),
        ];
        let err = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap_err();
        assert!(matches!(err, GenError::DuplicateKey { ref first, ref second, .. }
            if first == "id" && second == "other"));
    }

    #[test]
    fn test_missing_table_is_rejected() {
        let fields = vec![field("name", r#"sql:"name""#)];
        let err = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap_err();
        assert!(matches!(err, GenError::MissingTable(ref name) if name == "T"));
    }

    #[test]
    fn test_audit_without_sql_is_recorded() {
        let fields = vec![
            field("id", r#"sql:"id" key:"true" table:"t""#),
            field("user_id", r#"audit:"user""#),
        ];
        let desc = TypeDescriptor::from_fields(&ident("T"), &fields).unwrap().unwrap();
        assert_eq!(desc.user_audit_field.as_ref().unwrap().to_string(), "user_id");
        assert_eq!(desc.select_fields(), "id");
    }

    #[test]
    fn test_qualified_name() {
        let fields = vec![field("id", r#"sql:"id" key:"true" table:"t""#)];
        let desc = TypeDescriptor::from_fields(&ident("Row"), &fields)
            .unwrap()
            .unwrap()
            .with_module_path(vec![ident("inner"), ident("deep")]);
        assert_eq!(desc.qualified_name(), "inner::deep::Row");
    }

    #[test]
    fn test_qualified_name_drops_raw_prefix() {
        let fields = vec![field("id", r#"sql:"id" key:"true" table:"t""#)];
        let desc = TypeDescriptor::from_fields(&ident("Row"), &fields)
            .unwrap()
            .unwrap()
            .with_module_path(vec![Ident::new_raw("type", Span::call_site())]);
        assert_eq!(desc.qualified_name(), "type::Row");
        assert_eq!(desc.module_path[0].to_string(), "r#type");
    }
}
