use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "analysis_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i64,
    pub video_filename: String,
    // ml_task_id is assigned by the ML service once the task is submitted,
    // so it is absent on freshly created rows.
    #[sea_orm(unique)]
    pub ml_task_id: Option<String>,
    pub status: String,
    pub created_at: DateTime,
    pub completed_at: Option<DateTime>,
    pub total_duration_seconds: Option<i32>,
    pub total_tables: Option<i32>,
    pub average_occupancy_rate: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::table_zone::Entity")]
    TableZones,
    #[sea_orm(has_many = "super::occupancy_period::Entity")]
    OccupancyPeriods,
}

impl Related<super::table_zone::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TableZones.def()
    }
}

impl Related<super::occupancy_period::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OccupancyPeriods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
