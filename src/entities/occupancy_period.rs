use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "occupancy_period")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i64,
    pub analysis_task_id: i64,
    // Correlates with table_zones.table_id within the same task.
    pub table_id: i32,
    #[sea_orm(column_type = "Float")]
    pub period_start_seconds: f32,
    #[sea_orm(column_type = "Float")]
    pub period_end_seconds: f32,
    pub is_occupied: bool,
    #[sea_orm(column_type = "Float")]
    pub duration_seconds: f32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::analysis_task::Entity",
        from = "Column::AnalysisTaskId",
        to = "super::analysis_task::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    AnalysisTask,
}

impl Related<super::analysis_task::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisTask.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
