use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "table_zones")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i64,
    pub analysis_task_id: i64,
    // Physical table number within the video frame, not a database key.
    pub table_id: i32,
    #[sea_orm(column_type = "Float")]
    pub bbox_x1: f32,
    #[sea_orm(column_type = "Float")]
    pub bbox_x2: f32,
    #[sea_orm(column_type = "Float")]
    pub bbox_y1: f32,
    #[sea_orm(column_type = "Float")]
    pub bbox_y2: f32,
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
