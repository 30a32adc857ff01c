use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{
    ActionPrivileges, Column, DeletePayload, EntityDescriptor, ExportSpec, Operation,
    OperationKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Machinery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub purchase_year: Option<i32>,
    #[serde(default)]
    pub condition: Option<String>,
}

const LIST: &str = "query AllMachineries {
  allMachineries {
    id
    code
    name
    brand
    purchaseYear
    condition
  }
}";

const CREATE: &str = "mutation CreateMachinery($code: String!, $name: String!, $brand: String, $purchaseYear: Int, $condition: String) {
  createMachinery(code: $code, name: $name, brand: $brand, purchaseYear: $purchaseYear, condition: $condition)
}";

const UPDATE: &str = "mutation UpdateMachinery($id: String!, $code: String!, $name: String!, $brand: String, $purchaseYear: Int, $condition: String) {
  updateMachinery(id: $id, code: $code, name: $name, brand: $brand, purchaseYear: $purchaseYear, condition: $condition)
}";

const DELETE: &str = "mutation DeleteMachinery($id: String!) {
  deleteMachinery(id: $id)
}";

const EXPORT: &str = "mutation ExportMachinery {
  exportMachinery
}";

/// Machinery still uses flat GraphQL arguments instead of tokens.
pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("machinery")
        .label("Machinery")
        .columns(vec![
            Column::new("code", "Code"),
            Column::new("name", "Machine"),
            Column::new("brand", "Brand"),
            Column::new("purchaseYear", "Year"),
            Column::new("condition", "Condition"),
        ])
        .list(Operation::plain(OperationKind::Query, "allMachineries", LIST))
        .create(Operation::plain(OperationKind::Mutation, "createMachinery", CREATE))
        .update(Operation::plain(OperationKind::Mutation, "updateMachinery", UPDATE))
        .delete(Operation::plain(OperationKind::Mutation, "deleteMachinery", DELETE))
        .delete_payload(DeletePayload::IdOnly)
        .export(ExportSpec {
            operation: Operation::plain(OperationKind::Mutation, "exportMachinery", EXPORT),
            file_name: "Machinery.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("machinery"))
        .build()
}
