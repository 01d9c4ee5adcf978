pub mod analysis_task;
pub mod occupancy_period;
pub mod table_zone;

pub use analysis_task::Entity as AnalysisTask;
pub use occupancy_period::Entity as OccupancyPeriod;
pub use table_zone::Entity as TableZone;
