//! Descriptors that parameterize the generic CRUD wrapper.
//!
//! One `EntityDescriptor` captures everything that used to differ between
//! copy-pasted entity pages: operation names and documents, payload
//! encoding, identifier field, scope, columns, privileges and export.

use bon::Builder;
use convert_case::{Case, Casing};
use serde_json::Value;
use strum_macros::{Display, EnumString};
use utils::tokenize::Record;

pub const COMPANY_ID_FIELD: &str = "companyId";
pub const FARM_ID_FIELD: &str = "farmId";
pub const TOKENIZED_VAR: &str = "tokenized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

/// How an operation's variables and results are shaped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    /// A single `tokenized` string argument; list results are tokens.
    #[default]
    Tokenized,
    /// Flat named arguments; list results are plain arrays.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub operation_name: String,
    /// Top-level field read from `data`.
    pub field: String,
    pub document: String,
    pub encoding: PayloadEncoding,
}

impl Operation {
    /// Query whose result is one token string. The `tokenized` argument is
    /// optional so unscoped lists can omit it.
    pub fn tokenized_query(field: &str) -> Self {
        let operation_name = field.to_case(Case::Pascal);
        Self {
            kind: OperationKind::Query,
            document: format!(
                "query {operation_name}($tokenized: String) {{\n  {field}(tokenized: $tokenized)\n}}"
            ),
            operation_name,
            field: field.to_string(),
            encoding: PayloadEncoding::Tokenized,
        }
    }

    pub fn tokenized_mutation(field: &str) -> Self {
        let operation_name = field.to_case(Case::Pascal);
        Self {
            kind: OperationKind::Mutation,
            document: format!(
                "mutation {operation_name}($tokenized: String!) {{\n  {field}(tokenized: $tokenized)\n}}"
            ),
            operation_name,
            field: field.to_string(),
            encoding: PayloadEncoding::Tokenized,
        }
    }

    /// Operation with a hand-written document taking flat arguments.
    pub fn plain(kind: OperationKind, field: &str, document: &str) -> Self {
        Self {
            kind,
            operation_name: field.to_case(Case::Pascal),
            field: field.to_string(),
            document: document.to_string(),
            encoding: PayloadEncoding::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeLevel {
    #[default]
    Global,
    Company,
    CompanyAndFarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePayload {
    /// Send the whole (stripped) row.
    #[default]
    Row,
    /// Send only `{ <id_field>: id }`.
    IdOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub label: String,
}

impl Column {
    pub fn new(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
        }
    }
}

/// Privilege names gating each action; `None` means always allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPrivileges {
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
    pub export: Option<String>,
}

impl ActionPrivileges {
    /// `<prefix>:create`, `<prefix>:update`, ...
    pub fn for_entity(prefix: &str) -> Self {
        Self {
            create: Some(format!("{prefix}:{}", Action::Create)),
            update: Some(format!("{prefix}:{}", Action::Update)),
            delete: Some(format!("{prefix}:{}", Action::Delete)),
            export: Some(format!("{prefix}:{}", Action::Export)),
        }
    }

    pub fn get(&self, action: Action) -> Option<&str> {
        match action {
            Action::Create => self.create.as_deref(),
            Action::Update => self.update.as_deref(),
            Action::Delete => self.delete.as_deref(),
            Action::Export => self.export.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    pub operation: Operation,
    pub file_name: String,
}

fn default_transport_only_fields() -> Vec<String> {
    ["__typename", "createdAt", "updatedAt"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Builder)]
pub struct EntityDescriptor {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub label: String,
    #[builder(into, default = String::from("id"))]
    pub id_field: String,
    #[builder(default)]
    pub columns: Vec<Column>,
    #[builder(default)]
    pub scope: ScopeLevel,
    pub list: Operation,
    pub create: Option<Operation>,
    pub update: Option<Operation>,
    pub delete: Option<Operation>,
    #[builder(default)]
    pub delete_payload: DeletePayload,
    pub export: Option<ExportSpec>,
    #[builder(default)]
    pub privileges: ActionPrivileges,
    /// Top-level fields dropped before a write; `__typename` is dropped at
    /// any depth regardless.
    #[builder(default = default_transport_only_fields())]
    pub transport_only_fields: Vec<String>,
}

impl EntityDescriptor {
    pub fn operation(&self, action: Action) -> Option<&Operation> {
        match action {
            Action::Create => self.create.as_ref(),
            Action::Update => self.update.as_ref(),
            Action::Delete => self.delete.as_ref(),
            Action::Export => self.export.as_ref().map(|e| &e.operation),
        }
    }

    /// The record's identifier, if it has a usable one.
    pub fn identifier(&self, record: &Record) -> Option<String> {
        match record.get(&self.id_field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Field names shown in the table; falls back to every scalar field of
    /// `sample` when no columns are declared.
    pub fn column_fields<'a>(&'a self, sample: Option<&'a Record>) -> Vec<&'a str> {
        if !self.columns.is_empty() {
            return self.columns.iter().map(|c| c.field.as_str()).collect();
        }
        sample
            .map(|row| {
                row.iter()
                    .filter(|(_, v)| !v.is_object() && !v.is_array())
                    .map(|(k, _)| k.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn export_file_name(&self) -> String {
        self.export
            .as_ref()
            .map(|e| e.file_name.clone())
            .unwrap_or_else(|| format!("{}.xlsx", self.label))
    }
}
