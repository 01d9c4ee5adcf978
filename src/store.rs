use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait, Unchanged,
};

use crate::config::StoreConfig;
use crate::entities::{analysis_task, occupancy_period, table_zone};
use crate::error::StoreError;

/// Status assigned to tasks created without an explicit status.
pub const STATUS_CREATED: &str = "CREATED";

/// Row id of children that have been added to an aggregate but not yet
/// flushed with [`AnalysisTaskStore::save`]. Storage assigns the real id.
const UNSAVED: i64 = 0;

/// A task to be persisted, including any pre-attached children.
#[derive(Debug, Clone, Default)]
pub struct NewAnalysisTask {
    pub video_filename: String,
    pub ml_task_id: Option<String>,
    /// Defaults to [`STATUS_CREATED`] when `None`.
    pub status: Option<String>,
    /// Defaults to the current UTC time when `None`.
    pub created_at: Option<chrono::NaiveDateTime>,
    pub completed_at: Option<chrono::NaiveDateTime>,
    pub total_duration_seconds: Option<i32>,
    pub total_tables: Option<i32>,
    pub average_occupancy_rate: Option<f64>,
    pub table_zones: Vec<NewTableZone>,
    pub periods: Vec<NewOccupancyPeriod>,
}

impl NewAnalysisTask {
    pub fn new(video_filename: impl Into<String>) -> Self {
        Self {
            video_filename: video_filename.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), StoreError> {
        validate_video_filename(&self.video_filename)
    }
}

#[derive(Debug, Clone)]
pub struct NewTableZone {
    pub table_id: i32,
    pub bbox_x1: f32,
    pub bbox_x2: f32,
    pub bbox_y1: f32,
    pub bbox_y2: f32,
}

#[derive(Debug, Clone)]
pub struct NewOccupancyPeriod {
    pub table_id: i32,
    pub period_start_seconds: f32,
    pub period_end_seconds: f32,
    pub is_occupied: bool,
    pub duration_seconds: f32,
}

impl NewOccupancyPeriod {
    /// Builds a period with `duration_seconds` derived from the interval.
    pub fn new(table_id: i32, start: f32, end: f32, is_occupied: bool) -> Self {
        Self {
            table_id,
            period_start_seconds: start,
            period_end_seconds: end,
            is_occupied,
            duration_seconds: end - start,
        }
    }
}

/// An `analysis_tasks` row together with its owned child collections.
///
/// Children added or removed here are only reflected in storage on the next
/// [`AnalysisTaskStore::save`]; the aggregate tracks removed row ids so the
/// flush can delete them (orphan removal).
#[derive(Debug, Clone)]
pub struct TaskAggregate {
    pub task: analysis_task::Model,
    zones: Vec<table_zone::Model>,
    periods: Vec<occupancy_period::Model>,
    removed_zone_ids: Vec<i64>,
    removed_period_ids: Vec<i64>,
}

impl TaskAggregate {
    fn assembled(
        task: analysis_task::Model,
        zones: Vec<table_zone::Model>,
        periods: Vec<occupancy_period::Model>,
    ) -> Self {
        Self {
            task,
            zones,
            periods,
            removed_zone_ids: Vec::new(),
            removed_period_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.task.id
    }

    pub fn table_zones(&self) -> &[table_zone::Model] {
        &self.zones
    }

    pub fn periods(&self) -> &[occupancy_period::Model] {
        &self.periods
    }

    /// Appends a zone to the collection with its back-reference set to this
    /// task. Persisted on the next save.
    pub fn add_table_zone(&mut self, zone: NewTableZone) -> &table_zone::Model {
        self.zones.push(table_zone::Model {
            id: UNSAVED,
            analysis_task_id: self.task.id,
            table_id: zone.table_id,
            bbox_x1: zone.bbox_x1,
            bbox_x2: zone.bbox_x2,
            bbox_y1: zone.bbox_y1,
            bbox_y2: zone.bbox_y2,
        });
        &self.zones[self.zones.len() - 1]
    }

    /// Appends a period to the collection with its back-reference set to this
    /// task. Persisted on the next save.
    pub fn add_period(&mut self, period: NewOccupancyPeriod) -> &occupancy_period::Model {
        self.periods.push(occupancy_period::Model {
            id: UNSAVED,
            analysis_task_id: self.task.id,
            table_id: period.table_id,
            period_start_seconds: period.period_start_seconds,
            period_end_seconds: period.period_end_seconds,
            is_occupied: period.is_occupied,
            duration_seconds: period.duration_seconds,
        });
        &self.periods[self.periods.len() - 1]
    }

    /// Detaches a zone from the collection. An already-persisted zone is
    /// deleted from storage on the next save. Returns `false` when the zone
    /// is not part of this aggregate.
    pub fn remove_table_zone(&mut self, zone: &table_zone::Model) -> bool {
        match self.zones.iter().position(|z| z == zone) {
            Some(pos) => {
                let removed = self.zones.remove(pos);
                if removed.id != UNSAVED {
                    self.removed_zone_ids.push(removed.id);
                }
                true
            }
            None => false,
        }
    }

    /// Detaches a period from the collection. An already-persisted period is
    /// deleted from storage on the next save. Returns `false` when the period
    /// is not part of this aggregate.
    pub fn remove_period(&mut self, period: &occupancy_period::Model) -> bool {
        match self.periods.iter().position(|p| p == period) {
            Some(pos) => {
                let removed = self.periods.remove(pos);
                if removed.id != UNSAVED {
                    self.removed_period_ids.push(removed.id);
                }
                true
            }
            None => false,
        }
    }
}

/// Repository over the `AnalysisTask` aggregate. Every multi-row operation
/// runs in a single transaction; partial writes are never visible.
#[derive(Debug, Clone)]
pub struct AnalysisTaskStore {
    db: DatabaseConnection,
}

impl AnalysisTaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(url).await?;
        Ok(Self::new(db))
    }

    pub async fn connect_from_env() -> Result<Self, StoreError> {
        let config = StoreConfig::from_env()?;
        Self::connect(&config.database_url).await
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Persists a new task and any pre-attached children atomically.
    ///
    /// `status` and `created_at` are defaulted here, at the call site, rather
    /// than in a storage-side hook.
    pub async fn create(&self, new: NewAnalysisTask) -> Result<TaskAggregate, StoreError> {
        new.validate()?;
        let txn = self.db.begin().await?;

        let task = analysis_task::ActiveModel {
            video_filename: Set(new.video_filename),
            ml_task_id: Set(new.ml_task_id),
            status: Set(new.status.unwrap_or_else(|| STATUS_CREATED.to_string())),
            created_at: Set(new.created_at.unwrap_or_else(|| Utc::now().naive_utc())),
            completed_at: Set(new.completed_at),
            total_duration_seconds: Set(new.total_duration_seconds),
            total_tables: Set(new.total_tables),
            average_occupancy_rate: Set(new.average_occupancy_rate),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut zones = Vec::with_capacity(new.table_zones.len());
        for zone in new.table_zones {
            let inserted = table_zone::ActiveModel {
                analysis_task_id: Set(task.id),
                table_id: Set(zone.table_id),
                bbox_x1: Set(zone.bbox_x1),
                bbox_x2: Set(zone.bbox_x2),
                bbox_y1: Set(zone.bbox_y1),
                bbox_y2: Set(zone.bbox_y2),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            zones.push(inserted);
        }

        let mut periods = Vec::with_capacity(new.periods.len());
        for period in new.periods {
            let inserted = occupancy_period::ActiveModel {
                analysis_task_id: Set(task.id),
                table_id: Set(period.table_id),
                period_start_seconds: Set(period.period_start_seconds),
                period_end_seconds: Set(period.period_end_seconds),
                is_occupied: Set(period.is_occupied),
                duration_seconds: Set(period.duration_seconds),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            periods.push(inserted);
        }

        txn.commit().await?;
        tracing::info!(
            task_id = task.id,
            video = %task.video_filename,
            "created analysis task"
        );
        Ok(TaskAggregate::assembled(task, zones, periods))
    }

    /// Fetches the task row only; children are loaded separately with
    /// [`load_children`](Self::load_children).
    pub async fn find_by_id(&self, id: i64) -> Result<analysis_task::Model, StoreError> {
        analysis_task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("analysis task {id}")))
    }

    pub async fn find_by_ml_task_id(
        &self,
        ml_task_id: &str,
    ) -> Result<analysis_task::Model, StoreError> {
        analysis_task::Entity::find()
            .filter(analysis_task::Column::MlTaskId.eq(ml_task_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("analysis task for ml task {ml_task_id}")))
    }

    /// Fetches both child collections for an already-loaded task row. This is
    /// the explicit counterpart of lazy collection loading: no I/O happens on
    /// field access, only here.
    pub async fn load_children(
        &self,
        task: analysis_task::Model,
    ) -> Result<TaskAggregate, StoreError> {
        let zones = task
            .find_related(table_zone::Entity)
            .order_by_asc(table_zone::Column::Id)
            .all(&self.db)
            .await?;
        let periods = task
            .find_related(occupancy_period::Entity)
            .order_by_asc(occupancy_period::Column::Id)
            .all(&self.db)
            .await?;
        Ok(TaskAggregate::assembled(task, zones, periods))
    }

    /// `find_by_id` followed by `load_children`.
    pub async fn load(&self, id: i64) -> Result<TaskAggregate, StoreError> {
        let task = self.find_by_id(id).await?;
        self.load_children(task).await
    }

    /// Flushes the aggregate: updates the root row, inserts children added
    /// since the last save, and deletes children removed since the last save.
    /// All-or-nothing; on error the aggregate keeps its pending changes.
    pub async fn save(&self, aggregate: &mut TaskAggregate) -> Result<(), StoreError> {
        validate_video_filename(&aggregate.task.video_filename)?;
        let txn = self.db.begin().await?;

        analysis_task::ActiveModel {
            id: Unchanged(aggregate.task.id),
            video_filename: Set(aggregate.task.video_filename.clone()),
            ml_task_id: Set(aggregate.task.ml_task_id.clone()),
            status: Set(aggregate.task.status.clone()),
            created_at: Set(aggregate.task.created_at),
            completed_at: Set(aggregate.task.completed_at),
            total_duration_seconds: Set(aggregate.task.total_duration_seconds),
            total_tables: Set(aggregate.task.total_tables),
            average_occupancy_rate: Set(aggregate.task.average_occupancy_rate),
        }
        .update(&txn)
        .await?;

        // Inserted rows are written back to the aggregate only after commit,
        // so a failed flush leaves the pending children pending.
        let mut inserted_zones = Vec::new();
        for (idx, zone) in aggregate.zones.iter().enumerate() {
            if zone.id != UNSAVED {
                continue;
            }
            let inserted = table_zone::ActiveModel {
                analysis_task_id: Set(zone.analysis_task_id),
                table_id: Set(zone.table_id),
                bbox_x1: Set(zone.bbox_x1),
                bbox_x2: Set(zone.bbox_x2),
                bbox_y1: Set(zone.bbox_y1),
                bbox_y2: Set(zone.bbox_y2),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted_zones.push((idx, inserted));
        }

        let mut inserted_periods = Vec::new();
        for (idx, period) in aggregate.periods.iter().enumerate() {
            if period.id != UNSAVED {
                continue;
            }
            let inserted = occupancy_period::ActiveModel {
                analysis_task_id: Set(period.analysis_task_id),
                table_id: Set(period.table_id),
                period_start_seconds: Set(period.period_start_seconds),
                period_end_seconds: Set(period.period_end_seconds),
                is_occupied: Set(period.is_occupied),
                duration_seconds: Set(period.duration_seconds),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted_periods.push((idx, inserted));
        }

        if !aggregate.removed_zone_ids.is_empty() {
            table_zone::Entity::delete_many()
                .filter(table_zone::Column::Id.is_in(aggregate.removed_zone_ids.clone()))
                .exec(&txn)
                .await?;
        }
        if !aggregate.removed_period_ids.is_empty() {
            occupancy_period::Entity::delete_many()
                .filter(occupancy_period::Column::Id.is_in(aggregate.removed_period_ids.clone()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        for (idx, model) in inserted_zones {
            aggregate.zones[idx] = model;
        }
        for (idx, model) in inserted_periods {
            aggregate.periods[idx] = model;
        }
        aggregate.removed_zone_ids.clear();
        aggregate.removed_period_ids.clear();
        tracing::debug!(task_id = aggregate.task.id, "saved analysis task aggregate");
        Ok(())
    }

    pub async fn delete(&self, aggregate: TaskAggregate) -> Result<(), StoreError> {
        self.delete_task(aggregate.task).await
    }

    /// Deletes the task row; the cascade foreign keys remove all owned
    /// `table_zones` and `occupancy_period` rows with it.
    pub async fn delete_task(&self, task: analysis_task::Model) -> Result<(), StoreError> {
        let id = task.id;
        let result = analysis_task::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("analysis task {id}")));
        }
        tracing::info!(task_id = id, "deleted analysis task");
        Ok(())
    }
}

fn validate_video_filename(filename: &str) -> Result<(), StoreError> {
    if filename.trim().is_empty() {
        return Err(StoreError::Validation(
            "video_filename is required".to_string(),
        ));
    }
    if filename.chars().count() > 500 {
        return Err(StoreError::Validation(
            "video_filename exceeds 500 characters".to_string(),
        ));
    }
    Ok(())
}
