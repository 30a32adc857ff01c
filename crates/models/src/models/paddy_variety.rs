use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entity::{ActionPrivileges, Column, EntityDescriptor, ExportSpec, Operation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PaddyVariety {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub uuid: Option<Uuid>,
    pub variety_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Seed price per kilogram.
    #[serde(default)]
    pub seed_price: Option<f64>,
    /// Harvest (grain) price per kilogram.
    #[serde(default)]
    pub grain_price: Option<f64>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("paddy-variety")
        .label("Paddy Variety")
        .id_field("uuid")
        .columns(vec![
            Column::new("varietyName", "Variety"),
            Column::new("seedPrice", "Seed Price"),
            Column::new("grainPrice", "Grain Price"),
        ])
        .list(Operation::tokenized_query("tokenizedAllPaddyVarieties"))
        .create(Operation::tokenized_mutation("tokenizedCreatePaddyVariety"))
        .update(Operation::tokenized_mutation("tokenizedUpdatePaddyVariety"))
        .delete(Operation::tokenized_mutation("tokenizedDeletePaddyVariety"))
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportPaddyVariety"),
            file_name: "Paddy Variety.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("paddy-variety"))
        .build()
}
