//! Study progress of recruited annotators.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

use crate::entity::participant;

/// Record that the session agreed to take part. Keeps the first consent date.
pub async fn record_consent<C: ConnectionTrait>(db: &C, session_id: &str) -> Result<(), DbErr> {
    let model = participant::ActiveModel {
        session_id: Set(session_id.to_string()),
        consent_date: Set(Some(Utc::now())),
        finish_date: Set(None),
        comments: Set(None),
    };

    let result = participant::Entity::insert(model)
        .on_conflict(
            OnConflict::column(participant::Column::SessionId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Record that the session finished the study, with its free-text comments.
pub async fn record_finish<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
    comments: &str,
) -> Result<(), DbErr> {
    let model = participant::ActiveModel {
        session_id: Set(session_id.to_string()),
        consent_date: Set(None),
        finish_date: Set(Some(Utc::now())),
        comments: Set(Some(comments.to_string())),
    };

    participant::Entity::insert(model)
        .on_conflict(
            OnConflict::column(participant::Column::SessionId)
                .update_columns([
                    participant::Column::FinishDate,
                    participant::Column::Comments,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

pub async fn find_participant<C: ConnectionTrait>(
    db: &C,
    session_id: &str,
) -> Result<Option<participant::Model>, DbErr> {
    participant::Entity::find_by_id(session_id.to_string())
        .one(db)
        .await
}
