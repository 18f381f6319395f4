use async_trait::async_trait;
use df_core::models::{Question, QuestionId, TagId, UserId};
use df_core::query::{QuestionOrder, QuestionQuery};
use df_core::traits::QuestionRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};

use crate::votes::{vote_sets, VoteTable};
use crate::{fold, from_micros, id_list, micros, push_search, push_window, SqliteStore};

const QUESTION_COLUMNS: &str =
    "SELECT q.id, q.title, q.content, q.author_id, q.views, q.created_at FROM questions q";

const UPVOTE_COUNT: &str =
    "(SELECT COUNT(*) FROM question_votes v WHERE v.question_id = q.id AND v.direction = 1)";
const ANSWER_COUNT: &str = "(SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id)";

fn question_from_row(row: &SqliteRow) -> sqlx::Result<Question> {
    let views: i64 = row.try_get("views")?;
    Ok(Question {
        id: QuestionId(row.try_get("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: UserId(row.try_get("author_id")?),
        tags: Vec::new(),
        upvotes: Vec::new(),
        downvotes: Vec::new(),
        views: views.max(0) as u64,
        answers: Vec::new(),
        created_at: from_micros(row.try_get("created_at")?),
    })
}

/// Fills in the embedded lists (tags, vote sets, answers).
pub(crate) async fn hydrate_questions(
    conn: &mut SqliteConnection,
    rows: Vec<SqliteRow>,
) -> anyhow::Result<Vec<Question>> {
    let mut questions = Vec::with_capacity(rows.len());
    for row in rows {
        let mut question = question_from_row(&row)?;
        question.tags = id_list(
            conn,
            "SELECT tag_id FROM question_tags WHERE question_id = ? ORDER BY position",
            question.id.0,
        )
        .await?;
        (question.upvotes, question.downvotes) = vote_sets(conn, VoteTable::QUESTION, question.id.0).await?;
        question.answers = id_list(
            conn,
            "SELECT id FROM answers WHERE question_id = ? ORDER BY created_at, rowid",
            question.id.0,
        )
        .await?;
        questions.push(question);
    }
    Ok(questions)
}

fn question_order(order: QuestionOrder) -> String {
    match order {
        QuestionOrder::NewestFirst => " ORDER BY q.created_at DESC, q.rowid DESC".to_string(),
        QuestionOrder::OldestFirst => " ORDER BY q.created_at ASC, q.rowid ASC".to_string(),
        QuestionOrder::MostVoted => format!(" ORDER BY {UPVOTE_COUNT} DESC, q.created_at DESC"),
        QuestionOrder::MostViewed => " ORDER BY q.views DESC, q.created_at DESC".to_string(),
        QuestionOrder::MostAnswered => format!(" ORDER BY {ANSWER_COUNT} DESC, q.created_at DESC"),
        QuestionOrder::Insertion => " ORDER BY q.rowid ASC".to_string(),
        QuestionOrder::Hottest => format!(" ORDER BY q.views DESC, {UPVOTE_COUNT} DESC, q.rowid ASC"),
    }
}

fn push_question_filters(qb: &mut QueryBuilder<'static, Sqlite>, query: &QuestionQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &query.search {
        push_search(qb, &["q.title_key", "q.content_key"], search);
    }
    if let Some(tags) = &query.tagged_any {
        if tags.is_empty() {
            qb.push(" AND 0");
        } else {
            qb.push(" AND EXISTS (SELECT 1 FROM question_tags qt WHERE qt.question_id = q.id AND qt.tag_id IN (");
            let mut ids = qb.separated(", ");
            for tag in tags {
                ids.push_bind(tag.0);
            }
            qb.push("))");
        }
    }
    if let Some(author) = query.author {
        qb.push(" AND q.author_id = ").push_bind(author.0);
    }
    if let Some(excluded) = query.exclude_author {
        qb.push(" AND q.author_id <> ").push_bind(excluded.0);
    }
    if let Some(user) = query.saved_by {
        qb.push(" AND EXISTS (SELECT 1 FROM saved_questions s WHERE s.question_id = q.id AND s.user_id = ")
            .push_bind(user.0)
            .push(")");
    }
    if query.unanswered_only {
        qb.push(" AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id)");
    }
}

impl SqliteStore {
    async fn append_question_tags(
        conn: &mut SqliteConnection,
        id: QuestionId,
        tags: &[TagId],
    ) -> anyhow::Result<()> {
        let mut position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM question_tags WHERE question_id = ?",
        )
        .bind(id.0)
        .fetch_one(&mut *conn)
        .await?;

        for tag in tags {
            let inserted = sqlx::query(
                "INSERT OR IGNORE INTO question_tags (question_id, tag_id, position) VALUES (?, ?, ?)",
            )
            .bind(id.0)
            .bind(tag.0)
            .bind(position)
            .execute(&mut *conn)
            .await?;
            if inserted.rows_affected() > 0 {
                position += 1;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl QuestionRepo for SqliteStore {
    async fn insert_question(&self, question: Question) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO questions (id, title, title_key, content, content_key, author_id, views, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(question.id.0)
        .bind(&question.title)
        .bind(fold(&question.title))
        .bind(&question.content)
        .bind(fold(&question.content))
        .bind(question.author.0)
        .bind(i64::try_from(question.views).unwrap_or(i64::MAX))
        .bind(micros(question.created_at))
        .execute(&mut *tx)
        .await?;
        Self::append_question_tags(&mut tx, question.id, &question.tags).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_question(&self, id: QuestionId) -> anyhow::Result<Option<Question>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("{QUESTION_COLUMNS} WHERE q.id = ?");
        let Some(row) = sqlx::query(&sql).bind(id.0).fetch_optional(&mut *conn).await? else {
            return Ok(None);
        };
        Ok(hydrate_questions(&mut conn, vec![row]).await?.pop())
    }

    async fn find_questions(&self, query: QuestionQuery) -> anyhow::Result<(Vec<Question>, u64)> {
        let mut conn = self.pool.acquire().await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM questions q");
        push_question_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select = QueryBuilder::new(QUESTION_COLUMNS);
        push_question_filters(&mut select, &query);
        select.push(question_order(query.order));
        push_window(&mut select, query.window);
        let rows = select.build().fetch_all(&mut *conn).await?;

        let questions = hydrate_questions(&mut conn, rows).await?;
        Ok((questions, total as u64))
    }

    async fn link_tags(&self, id: QuestionId, tags: Vec<TagId>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::append_question_tags(&mut tx, id, &tags).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_question(&self, id: QuestionId, title: String, content: String) -> anyhow::Result<Option<Question>> {
        let (title_key, content_key) = (fold(&title), fold(&content));
        let result = sqlx::query("UPDATE questions SET title = ?, title_key = ?, content = ?, content_key = ? WHERE id = ?")
            .bind(title)
            .bind(title_key)
            .bind(content)
            .bind(content_key)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_question(id).await
    }

    async fn increment_views(&self, id: QuestionId) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE questions SET views = views + 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&self, id: QuestionId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM questions WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(())
    }
}
