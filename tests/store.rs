use cafe_storage::entities::{analysis_task, occupancy_period, table_zone};
use cafe_storage::migrator::Migrator;
use cafe_storage::{
    AnalysisTaskStore, NewAnalysisTask, NewOccupancyPeriod, NewTableZone, StoreError,
    STATUS_CREATED,
};
use sea_orm::{ColumnTrait, ConnectOptions, Database, EntityTrait, PaginatorTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;

// A single pooled connection keeps the in-memory database alive for the
// whole test.
async fn store() -> AnalysisTaskStore {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    AnalysisTaskStore::new(db)
}

fn zone(table_id: i32) -> NewTableZone {
    NewTableZone {
        table_id,
        bbox_x1: 0.0,
        bbox_x2: 10.0,
        bbox_y1: 0.0,
        bbox_y2: 10.0,
    }
}

#[tokio::test]
async fn create_defaults_status_and_created_at() {
    let store = store().await;

    let aggregate = store
        .create(NewAnalysisTask::new("a.mp4"))
        .await
        .expect("create task");

    assert!(aggregate.id() > 0);
    assert_eq!(aggregate.task.status, STATUS_CREATED);
    assert_eq!(aggregate.task.video_filename, "a.mp4");

    let row = store.find_by_id(aggregate.id()).await.expect("find task");
    assert_eq!(row.status, STATUS_CREATED);
    assert_eq!(row.created_at, aggregate.task.created_at);
}

#[tokio::test]
async fn create_preserves_explicit_status_and_created_at() {
    let store = store().await;
    let created_at = chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();

    let aggregate = store
        .create(NewAnalysisTask {
            status: Some("QUEUED".to_string()),
            created_at: Some(created_at),
            ..NewAnalysisTask::new("b.mp4")
        })
        .await
        .expect("create task");

    let row = store.find_by_id(aggregate.id()).await.expect("find task");
    assert_eq!(row.status, "QUEUED");
    assert_eq!(row.created_at, created_at);
}

#[tokio::test]
async fn create_persists_preattached_children() {
    let store = store().await;

    let aggregate = store
        .create(NewAnalysisTask {
            table_zones: vec![zone(1), zone(2)],
            periods: vec![NewOccupancyPeriod::new(1, 0.0, 30.0, true)],
            ..NewAnalysisTask::new("c.mp4")
        })
        .await
        .expect("create task");

    assert_eq!(aggregate.table_zones().len(), 2);
    assert_eq!(aggregate.periods().len(), 1);
    for z in aggregate.table_zones() {
        assert!(z.id > 0);
        assert_eq!(z.analysis_task_id, aggregate.id());
    }

    let zone_rows = table_zone::Entity::find()
        .filter(table_zone::Column::AnalysisTaskId.eq(aggregate.id()))
        .count(store.db())
        .await
        .expect("count zones");
    assert_eq!(zone_rows, 2);
}

#[tokio::test]
async fn missing_video_filename_is_a_validation_error() {
    let store = store().await;

    let err = store
        .create(NewAnalysisTask::new(""))
        .await
        .expect_err("empty filename must fail");
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn duplicate_ml_task_id_is_a_uniqueness_error() {
    let store = store().await;

    store
        .create(NewAnalysisTask {
            ml_task_id: Some("ml-42".to_string()),
            ..NewAnalysisTask::new("first.mp4")
        })
        .await
        .expect("first task");

    let err = store
        .create(NewAnalysisTask {
            ml_task_id: Some("ml-42".to_string()),
            ..NewAnalysisTask::new("second.mp4")
        })
        .await
        .expect_err("second task must fail");
    assert!(err.is_unique_violation());
}

#[tokio::test]
async fn find_by_ml_task_id_hits_and_misses() {
    let store = store().await;

    let aggregate = store
        .create(NewAnalysisTask {
            ml_task_id: Some("ml-7".to_string()),
            ..NewAnalysisTask::new("d.mp4")
        })
        .await
        .expect("create task");

    let row = store.find_by_ml_task_id("ml-7").await.expect("find task");
    assert_eq!(row.id, aggregate.id());

    let err = store
        .find_by_ml_task_id("ml-missing")
        .await
        .expect_err("miss must fail");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn save_flushes_added_children_and_root_updates() {
    let store = store().await;
    let mut aggregate = store
        .create(NewAnalysisTask::new("e.mp4"))
        .await
        .expect("create task");

    aggregate.add_table_zone(zone(1));
    aggregate.add_period(NewOccupancyPeriod::new(1, 5.0, 20.0, false));
    aggregate.task.status = "COMPLETED".to_string();
    aggregate.task.completed_at = Some(chrono::Utc::now().naive_utc());
    aggregate.task.total_tables = Some(1);
    aggregate.task.average_occupancy_rate = Some(0.25);
    store.save(&mut aggregate).await.expect("save aggregate");

    // Inserted children got their storage ids back.
    assert!(aggregate.table_zones()[0].id > 0);
    assert!(aggregate.periods()[0].id > 0);

    let reloaded = store.load(aggregate.id()).await.expect("reload");
    assert_eq!(reloaded.task.status, "COMPLETED");
    assert!(reloaded.task.completed_at.is_some());
    assert_eq!(reloaded.task.total_tables, Some(1));
    assert_eq!(reloaded.table_zones(), aggregate.table_zones());
    assert_eq!(reloaded.periods(), aggregate.periods());
}

#[tokio::test]
async fn removed_child_is_deleted_on_next_save() {
    let store = store().await;
    let mut aggregate = store
        .create(NewAnalysisTask {
            table_zones: vec![zone(1), zone(2)],
            ..NewAnalysisTask::new("f.mp4")
        })
        .await
        .expect("create task");

    let doomed = aggregate.table_zones()[0].clone();
    assert!(aggregate.remove_table_zone(&doomed));
    assert!(!aggregate.table_zones().contains(&doomed));
    store.save(&mut aggregate).await.expect("save aggregate");

    let remaining = table_zone::Entity::find()
        .filter(table_zone::Column::AnalysisTaskId.eq(aggregate.id()))
        .all(store.db())
        .await
        .expect("list zones");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].table_id, 2);
}

#[tokio::test]
async fn removed_period_is_deleted_on_next_save() {
    let store = store().await;
    let mut aggregate = store
        .create(NewAnalysisTask {
            periods: vec![
                NewOccupancyPeriod::new(1, 0.0, 10.0, true),
                NewOccupancyPeriod::new(2, 10.0, 25.0, false),
            ],
            ..NewAnalysisTask::new("j.mp4")
        })
        .await
        .expect("create task");

    let doomed = aggregate.periods()[0].clone();
    assert!(aggregate.remove_period(&doomed));
    assert!(!aggregate.periods().contains(&doomed));
    store.save(&mut aggregate).await.expect("save aggregate");

    let remaining = occupancy_period::Entity::find()
        .filter(occupancy_period::Column::AnalysisTaskId.eq(aggregate.id()))
        .all(store.db())
        .await
        .expect("list periods");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].table_id, 2);
}

#[tokio::test]
async fn load_children_only_returns_own_children() {
    let store = store().await;
    let first = store
        .create(NewAnalysisTask {
            table_zones: vec![zone(1)],
            ..NewAnalysisTask::new("g.mp4")
        })
        .await
        .expect("first task");
    store
        .create(NewAnalysisTask {
            table_zones: vec![zone(9)],
            periods: vec![NewOccupancyPeriod::new(9, 0.0, 1.0, true)],
            ..NewAnalysisTask::new("h.mp4")
        })
        .await
        .expect("second task");

    let task = store.find_by_id(first.id()).await.expect("find task");
    let aggregate = store.load_children(task).await.expect("load children");
    assert_eq!(aggregate.table_zones().len(), 1);
    assert_eq!(aggregate.table_zones()[0].table_id, 1);
    assert!(aggregate.periods().is_empty());
}

#[tokio::test]
async fn delete_cascades_to_all_children() {
    let store = store().await;
    let aggregate = store
        .create(NewAnalysisTask {
            table_zones: vec![zone(1), zone(2)],
            periods: vec![
                NewOccupancyPeriod::new(1, 0.0, 10.0, true),
                NewOccupancyPeriod::new(2, 10.0, 25.0, false),
            ],
            ..NewAnalysisTask::new("i.mp4")
        })
        .await
        .expect("create task");
    let task_id = aggregate.id();

    store.delete(aggregate).await.expect("delete task");

    let err = store.find_by_id(task_id).await.expect_err("task is gone");
    assert!(err.is_not_found());

    let orphan_zones = table_zone::Entity::find()
        .filter(table_zone::Column::AnalysisTaskId.eq(task_id))
        .count(store.db())
        .await
        .expect("count zones");
    let orphan_periods = occupancy_period::Entity::find()
        .filter(occupancy_period::Column::AnalysisTaskId.eq(task_id))
        .count(store.db())
        .await
        .expect("count periods");
    assert_eq!(orphan_zones, 0);
    assert_eq!(orphan_periods, 0);
}

// End-to-end walk through the aggregate lifecycle: create, attach a zone,
// detach it again, then confirm the row never outlives the collection.
#[tokio::test]
async fn zone_lifecycle_round_trip() {
    let store = store().await;
    let mut aggregate = store
        .create(NewAnalysisTask::new("a.mp4"))
        .await
        .expect("create task");
    assert_eq!(aggregate.task.status, STATUS_CREATED);

    let added = aggregate.add_table_zone(zone(1)).clone();
    assert_eq!(added.analysis_task_id, aggregate.id());
    assert!(aggregate.table_zones().contains(&added));
    store.save(&mut aggregate).await.expect("save with zone");

    let persisted = aggregate.table_zones()[0].clone();
    assert!(aggregate.remove_table_zone(&persisted));
    assert!(aggregate.table_zones().is_empty());
    store.save(&mut aggregate).await.expect("save without zone");

    let row = table_zone::Entity::find_by_id(persisted.id)
        .one(store.db())
        .await
        .expect("query zone");
    assert!(row.is_none());

    let total = analysis_task::Entity::find()
        .count(store.db())
        .await
        .expect("count tasks");
    assert_eq!(total, 1);
}
