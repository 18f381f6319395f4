use async_trait::async_trait;
use df_core::models::{AnswerId, Interaction, InteractionAction, InteractionId, QuestionId, UserId};
use df_core::traits::InteractionRepo;
use sqlx::Row;
use uuid::Uuid;

use crate::{from_micros, id_list, micros, SqliteStore};

#[async_trait]
impl InteractionRepo for SqliteStore {
    async fn insert_interaction(&self, interaction: Interaction) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO interactions (id, user_id, action, question_id, answer_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(interaction.id.0)
        .bind(interaction.user.0)
        .bind(interaction.action.as_str())
        .bind(interaction.question.map(|q| q.0))
        .bind(interaction.answer.map(|a| a.0))
        .bind(micros(interaction.created_at))
        .execute(&mut *tx)
        .await?;

        for (position, tag) in interaction.tags.iter().enumerate() {
            sqlx::query("INSERT INTO interaction_tags (interaction_id, position, tag_id) VALUES (?, ?, ?)")
                .bind(interaction.id.0)
                .bind(position as i64)
                .bind(tag.0)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn has_interaction(&self, user: UserId, question: QuestionId, action: InteractionAction) -> anyhow::Result<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM interactions WHERE user_id = ? AND question_id = ? AND action = ?)",
        )
        .bind(user.0)
        .bind(question.0)
        .bind(action.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(found != 0)
    }

    async fn interactions_for_user(&self, user: UserId) -> anyhow::Result<Vec<Interaction>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            "SELECT id, action, question_id, answer_id, created_at FROM interactions \
             WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(user.0)
        .fetch_all(&mut *conn)
        .await?;

        let mut interactions = Vec::with_capacity(rows.len());
        for row in rows {
            let id = InteractionId(row.try_get("id")?);
            let action: String = row.try_get("action")?;
            let question: Option<Uuid> = row.try_get("question_id")?;
            let answer: Option<Uuid> = row.try_get("answer_id")?;
            interactions.push(Interaction {
                id,
                user,
                action: action.parse()?,
                question: question.map(QuestionId),
                answer: answer.map(AnswerId),
                tags: id_list(
                    &mut conn,
                    "SELECT tag_id FROM interaction_tags WHERE interaction_id = ? ORDER BY position",
                    id.0,
                )
                .await?,
                created_at: from_micros(row.try_get("created_at")?),
            });
        }
        Ok(interactions)
    }

    async fn delete_for_question(&self, question: QuestionId) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM interactions WHERE question_id = ?")
            .bind(question.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_answer(&self, answer: AnswerId) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM interactions WHERE answer_id = ?")
            .bind(answer.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_for_user(&self, user: UserId) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM interactions WHERE user_id = ?")
            .bind(user.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
