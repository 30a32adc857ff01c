//! Descriptor-driven request wrapper shared by every master-data entity.

use std::sync::Arc;

use models::entity::{
    Action, COMPANY_ID_FIELD, DeletePayload, EntityDescriptor, FARM_ID_FIELD, Operation,
    OperationKind, PayloadEncoding, ScopeLevel, TOKENIZED_VAR,
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};
use utils::tokenize::{Record, TokenCodec, TokenizeError};

use super::{
    export::{ExportArtifact, ExportError},
    graphql::{GraphqlError, GraphqlRequest, GraphqlTransport},
};

#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Graphql(#[from] GraphqlError),
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{entity} does not support {action}")]
    Unsupported { entity: String, action: Action },
    #[error("not allowed to {action} {entity}")]
    Forbidden { entity: String, action: Action },
    #[error("select a {0} first")]
    ScopeIncomplete(&'static str),
}

/// Company/farm selection that scoped entities are listed and saved under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub company_id: Option<String>,
    pub farm_id: Option<String>,
}

impl Scope {
    pub fn require(&self, level: ScopeLevel) -> Result<(), EntityError> {
        let needs_company = level != ScopeLevel::Global;
        let needs_farm = level == ScopeLevel::CompanyAndFarm;
        if needs_company && self.company_id.is_none() {
            return Err(EntityError::ScopeIncomplete("company"));
        }
        if needs_farm && self.farm_id.is_none() {
            return Err(EntityError::ScopeIncomplete("farm"));
        }
        Ok(())
    }

    /// Scope fields relevant to `level`, keyed by their wire names.
    pub fn to_record(&self, level: ScopeLevel) -> Record {
        let mut record = Record::new();
        if level != ScopeLevel::Global {
            if let Some(company) = &self.company_id {
                record.insert(COMPANY_ID_FIELD.into(), Value::String(company.clone()));
            }
        }
        if level == ScopeLevel::CompanyAndFarm {
            if let Some(farm) = &self.farm_id {
                record.insert(FARM_ID_FIELD.into(), Value::String(farm.clone()));
            }
        }
        record
    }
}

/// Drop `__typename` everywhere and `top_level` keys at the root.
pub fn strip_transport_fields(record: &Record, top_level: &[String]) -> Record {
    fn strip_value(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(k, _)| k.as_str() != "__typename")
                    .map(|(k, v)| (k.clone(), strip_value(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(strip_value).collect()),
            other => other.clone(),
        }
    }

    record
        .iter()
        .filter(|(k, _)| k.as_str() != "__typename" && !top_level.iter().any(|f| f == *k))
        .map(|(k, v)| (k.clone(), strip_value(v)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Value),
    Updated(Value),
}

/// What to do with the remaining rows once one delete fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    #[default]
    StopOnFirstError,
    ContinueOnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Deleted,
    Failed(String),
    /// Never attempted because an earlier row failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    pub id: Option<String>,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub rows: Vec<RowResult>,
}

impl DeleteReport {
    fn count(&self, f: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| f(&r.outcome)).count()
    }

    pub fn deleted(&self) -> usize {
        self.count(|o| *o == RowOutcome::Deleted)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == RowOutcome::Skipped)
    }

    pub fn is_complete(&self) -> bool {
        self.deleted() == self.rows.len()
    }

    pub fn first_failure(&self) -> Option<&str> {
        self.rows.iter().find_map(|r| match &r.outcome {
            RowOutcome::Failed(reason) => Some(reason.as_str()),
            _ => None,
        })
    }
}

/// List/save/delete/export for one entity, as described by its descriptor.
#[derive(Clone)]
pub struct EntityService {
    transport: Arc<dyn GraphqlTransport>,
    codec: TokenCodec,
    descriptor: Arc<EntityDescriptor>,
}

impl EntityService {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        codec: TokenCodec,
        descriptor: EntityDescriptor,
    ) -> Self {
        Self {
            transport,
            codec,
            descriptor: Arc::new(descriptor),
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    fn operation(&self, action: Action) -> Result<&Operation, EntityError> {
        self.descriptor
            .operation(action)
            .ok_or_else(|| EntityError::Unsupported {
                entity: self.descriptor.name.clone(),
                action,
            })
    }

    /// Variables for `operation` carrying `payload`. Tokenized queries with
    /// nothing to carry send no variables at all.
    fn variables(&self, operation: &Operation, payload: Record) -> Result<Value, EntityError> {
        match operation.encoding {
            PayloadEncoding::Plain => Ok(Value::Object(payload)),
            PayloadEncoding::Tokenized
                if payload.is_empty() && operation.kind == OperationKind::Query =>
            {
                Ok(json!({}))
            }
            PayloadEncoding::Tokenized => {
                let token = self.codec.encode(&payload)?;
                Ok(json!({ TOKENIZED_VAR: token }))
            }
        }
    }

    /// Run `operation` and return its top-level field (`Null` if absent).
    async fn run(&self, operation: &Operation, payload: Record) -> Result<Value, EntityError> {
        let variables = self.variables(operation, payload)?;
        let request = GraphqlRequest::new(operation, variables);
        let mut data = self.transport.execute(&request).await?;
        Ok(data
            .get_mut(&operation.field)
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// Rows for the current scope. Unreadable results degrade to no rows.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<Record>, EntityError> {
        let descriptor = &self.descriptor;
        scope.require(descriptor.scope)?;
        let operation = &descriptor.list;
        let field = self.run(operation, scope.to_record(descriptor.scope)).await?;

        let rows = match (operation.encoding, field) {
            (_, Value::Null) => Vec::new(),
            (PayloadEncoding::Tokenized, Value::String(token)) => {
                match self.codec.decode_collection(Some(&token)) {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(entity = %descriptor.name, error = %e, "could not decode list token");
                        Vec::new()
                    }
                }
            }
            (PayloadEncoding::Plain, Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
            (_, other) => {
                warn!(
                    entity = %descriptor.name,
                    field = %operation.field,
                    value_type = json_type(&other),
                    "unexpected list result"
                );
                Vec::new()
            }
        };

        debug!(entity = %descriptor.name, rows = rows.len(), "listed rows");
        Ok(rows)
    }

    /// Create or update depending on whether the form carries an identifier.
    pub async fn save(&self, form: &Record, scope: &Scope) -> Result<SaveOutcome, EntityError> {
        let descriptor = &self.descriptor;
        scope.require(descriptor.scope)?;

        let action = match descriptor.identifier(form) {
            Some(_) => Action::Update,
            None => Action::Create,
        };
        let operation = self.operation(action)?;

        let mut payload = strip_transport_fields(form, &descriptor.transport_only_fields);
        if action == Action::Create {
            // An explicit null/blank id would be read by the server as an update.
            payload.remove(&descriptor.id_field);
        }
        payload.extend(scope.to_record(descriptor.scope));

        let response = self.run(operation, payload).await?;
        info!(entity = %descriptor.name, action = %action, "saved");
        Ok(match action {
            Action::Update => SaveOutcome::Updated(response),
            _ => SaveOutcome::Created(response),
        })
    }

    fn delete_payload(&self, row: &Record) -> Option<Record> {
        let descriptor = &self.descriptor;
        descriptor.identifier(row)?;
        Some(match descriptor.delete_payload {
            DeletePayload::Row => strip_transport_fields(row, &descriptor.transport_only_fields),
            DeletePayload::IdOnly => {
                let mut payload = Record::new();
                if let Some(id) = row.get(&descriptor.id_field) {
                    payload.insert(descriptor.id_field.clone(), id.clone());
                }
                payload
            }
        })
    }

    /// Delete `rows` one request at a time, in order.
    pub async fn delete_batch(
        &self,
        rows: &[Record],
        policy: DeletePolicy,
    ) -> Result<DeleteReport, EntityError> {
        let operation = self.operation(Action::Delete)?;
        let mut report = DeleteReport::default();
        let mut halted = false;

        for row in rows {
            let id = self.descriptor.identifier(row);
            if halted {
                report.rows.push(RowResult {
                    id,
                    outcome: RowOutcome::Skipped,
                });
                continue;
            }

            let outcome = match self.delete_payload(row) {
                None => RowOutcome::Failed("row has no identifier".to_string()),
                Some(payload) => match self.run(operation, payload).await {
                    Ok(_) => RowOutcome::Deleted,
                    Err(e) => RowOutcome::Failed(e.to_string()),
                },
            };

            if let RowOutcome::Failed(reason) = &outcome {
                warn!(entity = %self.descriptor.name, id = ?id, reason = %reason, "delete failed");
                halted = policy == DeletePolicy::StopOnFirstError;
            }
            report.rows.push(RowResult { id, outcome });
        }

        info!(
            entity = %self.descriptor.name,
            deleted = report.deleted(),
            failed = report.failed(),
            skipped = report.skipped(),
            "delete batch finished"
        );
        Ok(report)
    }

    pub async fn export(&self, scope: &Scope) -> Result<ExportArtifact, EntityError> {
        let descriptor = &self.descriptor;
        scope.require(descriptor.scope)?;
        let operation = self.operation(Action::Export)?;
        let response = self.run(operation, scope.to_record(descriptor.scope)).await?;
        Ok(ExportArtifact::from_response(
            &response,
            &descriptor.export_file_name(),
        )?)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
