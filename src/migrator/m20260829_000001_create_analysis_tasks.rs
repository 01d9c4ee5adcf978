use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Aggregate root
        manager
            .create_table(
                Table::create()
                    .table(AnalysisTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalysisTasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::VideoFilename)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::MlTaskId)
                            .string()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::Status)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalysisTasks::CreatedAt)
                            .date_time()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnalysisTasks::CompletedAt).date_time())
                    .col(ColumnDef::new(AnalysisTasks::TotalDurationSeconds).integer())
                    .col(ColumnDef::new(AnalysisTasks::TotalTables).integer())
                    .col(ColumnDef::new(AnalysisTasks::AverageOccupancyRate).double())
                    .to_owned(),
            )
            .await?;

        // Table detection zones, owned by a task
        manager
            .create_table(
                Table::create()
                    .table(TableZones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TableZones::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TableZones::AnalysisTaskId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TableZones::TableId).integer().not_null())
                    .col(ColumnDef::new(TableZones::BboxX1).float().not_null())
                    .col(ColumnDef::new(TableZones::BboxX2).float().not_null())
                    .col(ColumnDef::new(TableZones::BboxY1).float().not_null())
                    .col(ColumnDef::new(TableZones::BboxY2).float().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-table_zone-analysis_task_id")
                            .from(TableZones::Table, TableZones::AnalysisTaskId)
                            .to(AnalysisTasks::Table, AnalysisTasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Occupied/free intervals produced by the analyzer, owned by a task
        manager
            .create_table(
                Table::create()
                    .table(OccupancyPeriod::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OccupancyPeriod::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OccupancyPeriod::AnalysisTaskId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OccupancyPeriod::TableId).integer().not_null())
                    .col(
                        ColumnDef::new(OccupancyPeriod::PeriodStartSeconds)
                            .float()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OccupancyPeriod::PeriodEndSeconds)
                            .float()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OccupancyPeriod::IsOccupied)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OccupancyPeriod::DurationSeconds)
                            .float()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-occupancy_period-analysis_task_id")
                            .from(OccupancyPeriod::Table, OccupancyPeriod::AnalysisTaskId)
                            .to(AnalysisTasks::Table, AnalysisTasks::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OccupancyPeriod::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TableZones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnalysisTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AnalysisTasks {
    Table,
    Id,
    VideoFilename,
    MlTaskId,
    Status,
    CreatedAt,
    CompletedAt,
    TotalDurationSeconds,
    TotalTables,
    AverageOccupancyRate,
}

#[derive(DeriveIden)]
enum TableZones {
    Table,
    Id,
    AnalysisTaskId,
    TableId,
    BboxX1,
    BboxX2,
    BboxY1,
    BboxY2,
}

#[derive(DeriveIden)]
enum OccupancyPeriod {
    Table,
    Id,
    AnalysisTaskId,
    TableId,
    PeriodStartSeconds,
    PeriodEndSeconds,
    IsOccupied,
    DurationSeconds,
}
