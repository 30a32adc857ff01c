use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entity::{
    ActionPrivileges, Column, EntityDescriptor, ExportSpec, Operation, ScopeLevel,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PoultryHouse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub farm_id: Option<String>,
    pub code: String,
    pub name: String,
    /// Bird capacity.
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub house_type: Option<String>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("poultry-house")
        .label("Poultry House")
        .id_field("uuid")
        .scope(ScopeLevel::CompanyAndFarm)
        .columns(vec![
            Column::new("code", "Code"),
            Column::new("name", "House"),
            Column::new("houseType", "Type"),
            Column::new("capacity", "Capacity"),
        ])
        .list(Operation::tokenized_query("tokenizedAllPoultryHouses"))
        .create(Operation::tokenized_mutation("tokenizedCreatePoultryHouse"))
        .update(Operation::tokenized_mutation("tokenizedUpdatePoultryHouse"))
        .delete(Operation::tokenized_mutation("tokenizedDeletePoultryHouse"))
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportPoultryHouse"),
            file_name: "Poultry House.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("poultry-house"))
        .build()
}
