use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{Column, EntityDescriptor, Operation, ScopeLevel};

/// Farm belonging to a company. Read-only here; used for scope selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: String,
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub area_hectares: Option<f64>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("farm")
        .label("Farm")
        .scope(ScopeLevel::Company)
        .columns(vec![
            Column::new("name", "Farm"),
            Column::new("location", "Location"),
            Column::new("areaHectares", "Area (ha)"),
        ])
        .list(Operation::tokenized_query("tokenizedAllFarms"))
        .build()
}
