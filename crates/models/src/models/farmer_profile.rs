use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{
    ActionPrivileges, Column, EntityDescriptor, ExportSpec, Operation, ScopeLevel,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct FarmerProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    pub name: String,
    /// National identity number.
    #[serde(default)]
    pub identity_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("farmer-profile")
        .label("Farmer Profile")
        .scope(ScopeLevel::Company)
        .columns(vec![
            Column::new("name", "Name"),
            Column::new("identityNumber", "Identity No."),
            Column::new("phone", "Phone"),
            Column::new("village", "Village"),
        ])
        .list(Operation::tokenized_query("tokenizedAllFarmerProfiles"))
        .create(Operation::tokenized_mutation("tokenizedCreateFarmerProfile"))
        .update(Operation::tokenized_mutation("tokenizedUpdateFarmerProfile"))
        .delete(Operation::tokenized_mutation("tokenizedDeleteFarmerProfile"))
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportFarmerProfile"),
            file_name: "Farmer Profile.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("farmer-profile"))
        .build()
}
