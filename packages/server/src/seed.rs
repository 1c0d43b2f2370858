use sea_orm::sea_query::{ForeignKey, ForeignKeyAction, Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{output, vote};

/// Ensure the integrity constraints of the `votes` table exist.
///
/// SeaORM's schema-sync only derives single-column foreign keys from the
/// entity relations, so the composite keys into `outputs` and the canonical
/// ordering check are created here on startup.
pub async fn ensure_constraints(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, system_column) in [
        ("fk_votes_output_a", vote::Column::SystemIdA),
        ("fk_votes_output_b", vote::Column::SystemIdB),
    ] {
        if constraint_exists(db, name).await? {
            continue;
        }
        let stmt = ForeignKey::create()
            .name(name)
            .from(vote::Entity, (vote::Column::PromptId, system_column))
            .to(output::Entity, (output::Column::PromptId, output::Column::SystemId))
            .on_delete(ForeignKeyAction::Restrict)
            .on_update(ForeignKeyAction::Cascade)
            .to_string(PostgresQueryBuilder);
        db.execute_unprepared(&stmt).await?;
        info!("Created constraint {}", name);
    }

    // Byte order, matching how votes are canonicalized before insert. The
    // database collation would disagree on mixed-case ids.
    const ORDER_CHECK: &str = "ck_votes_canonical_order";
    if !constraint_exists(db, ORDER_CHECK).await? {
        db.execute_unprepared(&format!(
            r#"ALTER TABLE "votes" ADD CONSTRAINT "{ORDER_CHECK}" CHECK ("system_id_a" COLLATE "C" < "system_id_b" COLLATE "C")"#
        ))
        .await?;
        info!("Created constraint {}", ORDER_CHECK);
    }

    Ok(())
}

async fn constraint_exists(db: &DatabaseConnection, name: &str) -> Result<bool, DbErr> {
    let row = db
        .query_one_raw(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT 1 FROM pg_constraint WHERE conname = $1",
            [name.into()],
        ))
        .await?;
    Ok(row.is_some())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Per-session lookups: exclusion during selection, session vote counts.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_votes_session_prompt")
        .table(vote::Entity)
        .col(vote::Column::SessionId)
        .col(vote::Column::PromptId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_votes_session_prompt exists"),
        Err(e) => warn!("Failed to create index idx_votes_session_prompt: {}", e),
    }

    // Coverage aggregation: counted votes grouped by prompt.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_votes_prompt_vote")
        .table(vote::Entity)
        .col(vote::Column::PromptId)
        .col(vote::Column::Vote)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_votes_prompt_vote exists"),
        Err(e) => warn!("Failed to create index idx_votes_prompt_vote: {}", e),
    }

    Ok(())
}
