pub mod config;
pub mod entities;
pub mod error;
pub mod migrator;
pub mod store;
pub mod telemetry;

pub use sea_orm;

pub use error::StoreError;
pub use store::{
    AnalysisTaskStore, NewAnalysisTask, NewOccupancyPeriod, NewTableZone, TaskAggregate,
    STATUS_CREATED,
};
