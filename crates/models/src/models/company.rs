use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{Column, EntityDescriptor, Operation};

/// Company owning farms. Read-only here; used for scope selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("company")
        .label("Company")
        .columns(vec![Column::new("name", "Company"), Column::new("address", "Address")])
        .list(Operation::tokenized_query("tokenizedAllCompanies"))
        .build()
}
