use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{ActionPrivileges, Column, EntityDescriptor, ExportSpec, Operation};

/// Master-data category, e.g. land or crop classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub prefix_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn descriptor() -> EntityDescriptor {
    EntityDescriptor::builder()
        .name("category")
        .label("Category")
        .columns(vec![
            Column::new("name", "Name"),
            Column::new("prefixCode", "Prefix Code"),
            Column::new("description", "Description"),
        ])
        .list(Operation::tokenized_query("tokenizedAllCategories"))
        .create(Operation::tokenized_mutation("tokenizedCreateCategory"))
        .update(Operation::tokenized_mutation("tokenizedUpdateCategory"))
        .delete(Operation::tokenized_mutation("tokenizedDeleteCategory"))
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportCategory"),
            file_name: "Category.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("category"))
        .build()
}
