use async_trait::async_trait;
use chrono::Utc;
use df_core::error::AppError;
use df_core::models::{QuestionId, Tag, TagId, TagStat};
use df_core::query::{TagOrder, TagQuery};
use df_core::traits::TagRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::{fold, from_micros, id_list, micros, push_search, push_window, SqliteStore};

const TAG_COLUMNS: &str = "SELECT t.id, t.name, t.created_at FROM tags t";
const QUESTION_COUNT: &str = "(SELECT COUNT(*) FROM tag_questions tq WHERE tq.tag_id = t.id)";

async fn hydrate_tag(conn: &mut SqliteConnection, row: &SqliteRow) -> anyhow::Result<Tag> {
    let id = TagId(row.try_get("id")?);
    let questions = id_list(conn, "SELECT question_id FROM tag_questions WHERE tag_id = ? ORDER BY rowid", id.0).await?;
    Ok(Tag {
        id,
        name: row.try_get("name")?,
        questions,
        created_at: from_micros(row.try_get("created_at")?),
    })
}

async fn load_tag(conn: &mut SqliteConnection, id: Uuid) -> anyhow::Result<Option<Tag>> {
    let sql = format!("{TAG_COLUMNS} WHERE t.id = ?");
    match sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await? {
        Some(row) => Ok(Some(hydrate_tag(conn, &row).await?)),
        None => Ok(None),
    }
}

fn tag_order(order: TagOrder) -> String {
    match order {
        TagOrder::MostQuestions => format!(" ORDER BY {QUESTION_COUNT} DESC, t.rowid ASC"),
        TagOrder::NewestFirst => " ORDER BY t.created_at DESC, t.rowid DESC".to_string(),
        TagOrder::OldestFirst => " ORDER BY t.created_at ASC, t.rowid ASC".to_string(),
        TagOrder::Name => " ORDER BY t.name_key ASC, t.rowid ASC".to_string(),
    }
}

fn push_tag_filters(qb: &mut QueryBuilder<'static, Sqlite>, query: &TagQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &query.search {
        push_search(qb, &["t.name_key"], search);
    }
}

#[async_trait]
impl TagRepo for SqliteStore {
    async fn upsert_and_link(&self, name: &str, question: QuestionId) -> anyhow::Result<Tag> {
        let mut tx = self.pool.begin().await?;

        // Conflict and lookup both go through the unique lowercase key, so
        // any casing of an existing tag resolves to it.
        let key = fold(name);
        sqlx::query("INSERT OR IGNORE INTO tags (id, name, name_key, created_at) VALUES (?, ?, ?, ?)")
            .bind(TagId::generate().0)
            .bind(name)
            .bind(&key)
            .bind(micros(Utc::now()))
            .execute(&mut *tx)
            .await?;
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tags WHERE name_key = ?")
            .bind(&key)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(id) = id else {
            return Err(AppError::Creation(format!("tag '{name}' could not be stored")).into());
        };

        sqlx::query("INSERT OR IGNORE INTO tag_questions (tag_id, question_id) VALUES (?, ?)")
            .bind(id)
            .bind(question.0)
            .execute(&mut *tx)
            .await?;

        let tag = load_tag(&mut tx, id).await?;
        tx.commit().await?;
        tag.ok_or_else(|| AppError::not_found("Tag", id).into())
    }

    async fn find_tag(&self, id: TagId) -> anyhow::Result<Option<Tag>> {
        let mut conn = self.pool.acquire().await?;
        load_tag(&mut conn, id.0).await
    }

    async fn find_tags_by_ids(&self, ids: Vec<TagId>) -> anyhow::Result<Vec<Tag>> {
        let mut conn = self.pool.acquire().await?;
        let mut tags = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tag) = load_tag(&mut conn, id.0).await? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    async fn find_tags(&self, query: TagQuery) -> anyhow::Result<(Vec<Tag>, u64)> {
        let mut conn = self.pool.acquire().await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM tags t");
        push_tag_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select = QueryBuilder::new(TAG_COLUMNS);
        push_tag_filters(&mut select, &query);
        select.push(tag_order(query.order));
        push_window(&mut select, query.window);
        let rows = select.build().fetch_all(&mut *conn).await?;

        let mut tags = Vec::with_capacity(rows.len());
        for row in &rows {
            tags.push(hydrate_tag(&mut conn, row).await?);
        }
        Ok((tags, total as u64))
    }

    async fn top_tags(&self, limit: u64) -> anyhow::Result<Vec<TagStat>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, COUNT(tq.question_id) AS question_count \
             FROM tags t LEFT JOIN tag_questions tq ON tq.tag_id = t.id \
             GROUP BY t.id, t.name \
             ORDER BY question_count DESC, t.rowid ASC \
             LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> anyhow::Result<TagStat> {
                let count: i64 = row.try_get("question_count")?;
                Ok(TagStat {
                    id: TagId(row.try_get("id")?),
                    name: row.try_get("name")?,
                    question_count: count.max(0) as u64,
                })
            })
            .collect()
    }

    async fn unlink_question(&self, question: QuestionId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM tag_questions WHERE question_id = ?")
            .bind(question.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_question, seed_user, store};
    use df_core::pagination::Window;

    #[tokio::test]
    async fn names_resolve_case_insensitively_and_keep_first_spelling() {
        let store = store().await;
        let author = seed_user(&store, "ferris").await;
        let first = seed_question(&store, author.id, "Hooks").await;
        let second = seed_question(&store, author.id, "State").await;

        let react = store.upsert_and_link("React", first.id).await.unwrap();
        let again = store.upsert_and_link("react", second.id).await.unwrap();
        assert_eq!(react.id, again.id);
        assert_eq!(again.name, "React");
        assert_eq!(again.questions, vec![first.id, second.id]);

        let relinked = store.upsert_and_link("REACT", first.id).await.unwrap();
        assert_eq!(relinked.questions.len(), 2);

        let query = TagQuery { search: None, order: TagOrder::Name, window: Window { skip: 0, limit: 10 } };
        let (_, total) = store.find_tags(query).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn non_ascii_names_fold_to_one_tag() {
        let store = store().await;
        let author = seed_user(&store, "ferris").await;
        let q = seed_question(&store, author.id, "Pattern matching").await;

        let upper = store.upsert_and_link("Élixir", q.id).await.unwrap();
        let lower = store.upsert_and_link("élixir", q.id).await.unwrap();
        assert_eq!(upper.id, lower.id);
        assert_eq!(lower.name, "Élixir");

        let query = TagQuery { search: Some("ÉLIX".into()), order: TagOrder::Name, window: Window { skip: 0, limit: 10 } };
        let (found, total) = store.find_tags(query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].id, upper.id);
    }

    #[tokio::test]
    async fn top_tags_rank_by_question_count() {
        let store = store().await;
        let author = seed_user(&store, "ferris").await;
        let a = seed_question(&store, author.id, "A").await;
        let b = seed_question(&store, author.id, "B").await;

        store.upsert_and_link("lonely", a.id).await.unwrap();
        store.upsert_and_link("rust", a.id).await.unwrap();
        store.upsert_and_link("rust", b.id).await.unwrap();

        let top = store.top_tags(5).await.unwrap();
        assert_eq!(top[0].name, "rust");
        assert_eq!(top[0].question_count, 2);
        assert_eq!(top[1].question_count, 1);

        store.unlink_question(a.id).await.unwrap();
        let top = store.top_tags(1).await.unwrap();
        assert_eq!((top.len(), top[0].question_count), (1, 1));
    }

    #[tokio::test]
    async fn by_ids_preserves_order_and_skips_unknown() {
        let store = store().await;
        let author = seed_user(&store, "ferris").await;
        let q = seed_question(&store, author.id, "A").await;
        let x = store.upsert_and_link("x", q.id).await.unwrap();
        let y = store.upsert_and_link("y", q.id).await.unwrap();

        let tags = store.find_tags_by_ids(vec![y.id, TagId::generate(), x.id]).await.unwrap();
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["y", "x"]);
    }
}
