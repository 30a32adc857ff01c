use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entity::{
    ActionPrivileges, Column, DeletePayload, EntityDescriptor, ExportSpec, Operation, ScopeLevel,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct RuminantPen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub farm_id: Option<String>,
    pub code: String,
    pub name: String,
    /// Head capacity.
    #[serde(default)]
    pub capacity: Option<i64>,
    /// Cattle, goat, sheep, buffalo...
    #[serde(default)]
    pub animal_type: Option<String>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("ruminant-pen")
        .label("Ruminant Pen")
        .id_field("uuid")
        .scope(ScopeLevel::CompanyAndFarm)
        .columns(vec![
            Column::new("code", "Code"),
            Column::new("name", "Pen"),
            Column::new("animalType", "Animal"),
            Column::new("capacity", "Capacity"),
        ])
        .list(Operation::tokenized_query("tokenizedAllRuminantPens"))
        .create(Operation::tokenized_mutation("createRuminantPen"))
        .update(Operation::tokenized_mutation("updateRuminantPen"))
        .delete(Operation::tokenized_mutation("deleteRuminantPen"))
        .delete_payload(DeletePayload::IdOnly)
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportRuminantPen"),
            file_name: "Ruminant Pen.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("ruminant-pen"))
        .build()
}
