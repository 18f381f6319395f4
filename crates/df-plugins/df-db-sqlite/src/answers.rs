use async_trait::async_trait;
use df_core::models::{Answer, AnswerId, QuestionId, UserId};
use df_core::query::{AnswerOrder, AnswerQuery};
use df_core::traits::AnswerRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::votes::{vote_sets, VoteTable};
use crate::{fold, from_micros, micros, push_search, push_window, SqliteStore};

const ANSWER_COLUMNS: &str = "SELECT a.id, a.content, a.author_id, a.question_id, a.created_at FROM answers a";
const UPVOTE_COUNT: &str = "(SELECT COUNT(*) FROM answer_votes v WHERE v.answer_id = a.id AND v.direction = 1)";

async fn hydrate_answers(conn: &mut SqliteConnection, rows: Vec<SqliteRow>) -> anyhow::Result<Vec<Answer>> {
    let mut answers = Vec::with_capacity(rows.len());
    for row in rows {
        let id = AnswerId(row.try_get("id")?);
        let (upvotes, downvotes) = vote_sets(conn, VoteTable::ANSWER, id.0).await?;
        answers.push(Answer {
            id,
            content: row.try_get("content")?,
            author: UserId(row.try_get("author_id")?),
            question: QuestionId(row.try_get("question_id")?),
            upvotes,
            downvotes,
            created_at: from_micros(row.try_get("created_at")?),
        });
    }
    Ok(answers)
}

fn answer_order(order: AnswerOrder) -> String {
    match order {
        AnswerOrder::HighestUpvotes => format!(" ORDER BY {UPVOTE_COUNT} DESC, a.created_at DESC"),
        AnswerOrder::LowestUpvotes => format!(" ORDER BY {UPVOTE_COUNT} ASC, a.created_at DESC"),
        AnswerOrder::NewestFirst => " ORDER BY a.created_at DESC, a.rowid DESC".to_string(),
        AnswerOrder::OldestFirst => " ORDER BY a.created_at ASC, a.rowid ASC".to_string(),
    }
}

fn push_answer_filters(qb: &mut QueryBuilder<'static, Sqlite>, query: &AnswerQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(question) = query.question {
        qb.push(" AND a.question_id = ").push_bind(question.0);
    }
    if let Some(author) = query.author {
        qb.push(" AND a.author_id = ").push_bind(author.0);
    }
    if let Some(search) = &query.search {
        push_search(qb, &["a.content_key"], search);
    }
}

#[async_trait]
impl AnswerRepo for SqliteStore {
    async fn insert_answer(&self, answer: Answer) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO answers (id, content, content_key, author_id, question_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(answer.id.0)
        .bind(&answer.content)
        .bind(fold(&answer.content))
        .bind(answer.author.0)
        .bind(answer.question.0)
        .bind(micros(answer.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_answer(&self, id: AnswerId) -> anyhow::Result<Option<Answer>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("{ANSWER_COLUMNS} WHERE a.id = ?");
        let Some(row) = sqlx::query(&sql).bind(id.0).fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };
        Ok(hydrate_answers(&mut conn, vec![row]).await?.pop())
    }

    async fn find_answers(&self, query: AnswerQuery) -> anyhow::Result<(Vec<Answer>, u64)> {
        let mut conn = self.pool.acquire().await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM answers a");
        push_answer_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select = QueryBuilder::new(ANSWER_COLUMNS);
        push_answer_filters(&mut select, &query);
        select.push(answer_order(query.order));
        push_window(&mut select, query.window);
        let rows = select.build().fetch_all(&mut *conn).await?;

        let answers = hydrate_answers(&mut conn, rows).await?;
        Ok((answers, total as u64))
    }

    async fn delete_answer(&self, id: AnswerId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM answers WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_answers_for_question(&self, question: QuestionId) -> anyhow::Result<Vec<AnswerId>> {
        let mut tx = self.pool.begin().await?;
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM answers WHERE question_id = ? ORDER BY rowid")
            .bind(question.0)
            .fetch_all(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM answers WHERE question_id = ?")
            .bind(question.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(ids.into_iter().map(AnswerId).collect())
    }
}
