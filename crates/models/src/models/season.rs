use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{ActionPrivileges, Column, DeletePayload, EntityDescriptor, ExportSpec, Operation};

/// Planting season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn descriptor() -> EntityDescriptor {
    // Season mutations are not prefixed and delete by id only.
    EntityDescriptor::builder()
        .name("season")
        .label("Season")
        .columns(vec![
            Column::new("name", "Season"),
            Column::new("startDate", "Start"),
            Column::new("endDate", "End"),
        ])
        .list(Operation::tokenized_query("tokenizedAllSeasons"))
        .create(Operation::tokenized_mutation("createSeason"))
        .update(Operation::tokenized_mutation("updateSeason"))
        .delete(Operation::tokenized_mutation("deleteSeason"))
        .delete_payload(DeletePayload::IdOnly)
        .export(ExportSpec {
            operation: Operation::tokenized_mutation("exportSeason"),
            file_name: "Season.xlsx".to_string(),
        })
        .privileges(ActionPrivileges::for_entity("season"))
        .build()
}
