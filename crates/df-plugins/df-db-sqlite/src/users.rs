use async_trait::async_trait;
use chrono::Utc;
use df_core::models::{NewUser, QuestionId, User, UserId, UserUpdate};
use df_core::query::{UserOrder, UserQuery};
use df_core::traits::UserRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqliteConnection};
use uuid::Uuid;

use crate::{creation_error, fold, from_micros, id_list, micros, push_search, push_window, SqliteStore};

const USER_COLUMNS: &str = "SELECT u.id, u.clerk_id, u.name, u.username, u.email, u.bio, u.location, \
     u.portfolio_website, u.picture, u.reputation, u.joined_at FROM users u";

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        clerk_id: row.try_get("clerk_id")?,
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        bio: row.try_get("bio")?,
        location: row.try_get("location")?,
        portfolio_website: row.try_get("portfolio_website")?,
        picture: row.try_get("picture")?,
        reputation: row.try_get("reputation")?,
        saved: Vec::new(),
        joined_at: from_micros(row.try_get("joined_at")?),
    })
}

async fn hydrate_user(conn: &mut SqliteConnection, row: SqliteRow) -> anyhow::Result<User> {
    let mut user = user_from_row(&row)?;
    user.saved = id_list(
        conn,
        "SELECT question_id FROM saved_questions WHERE user_id = ? ORDER BY rowid",
        user.id.0,
    )
    .await?;
    Ok(user)
}

fn user_order(order: UserOrder) -> &'static str {
    match order {
        UserOrder::NewestFirst => " ORDER BY u.joined_at DESC, u.rowid DESC",
        UserOrder::OldestFirst => " ORDER BY u.joined_at ASC, u.rowid ASC",
        UserOrder::HighestReputation => " ORDER BY u.reputation DESC, u.rowid ASC",
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'static, sqlx::Sqlite>, query: &UserQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &query.search {
        push_search(qb, &["u.name_key", "u.username_key"], search);
    }
}

impl SqliteStore {
    async fn user_where(&self, column: &str, key: UserKey<'_>) -> anyhow::Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("{USER_COLUMNS} WHERE u.{column} = ?");
        let query = sqlx::query(&sql);
        let query = match key {
            UserKey::Id(id) => query.bind(id),
            UserKey::Clerk(clerk_id) => query.bind(clerk_id.to_string()),
        };
        match query.fetch_optional(&mut *conn).await? {
            Some(row) => Ok(Some(hydrate_user(&mut conn, row).await?)),
            None => Ok(None),
        }
    }
}

enum UserKey<'a> {
    Id(Uuid),
    Clerk(&'a str),
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<User> {
        let created = User {
            id: UserId::generate(),
            clerk_id: user.clerk_id,
            name: user.name,
            username: user.username,
            email: user.email,
            bio: user.bio,
            location: user.location,
            portfolio_website: user.portfolio_website,
            picture: user.picture,
            reputation: 0,
            saved: Vec::new(),
            joined_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, clerk_id, name, name_key, username, username_key, email, bio, location, portfolio_website, picture, reputation, joined_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(created.id.0)
        .bind(&created.clerk_id)
        .bind(&created.name)
        .bind(fold(&created.name))
        .bind(&created.username)
        .bind(fold(&created.username))
        .bind(&created.email)
        .bind(&created.bio)
        .bind(&created.location)
        .bind(&created.portfolio_website)
        .bind(&created.picture)
        .bind(micros(created.joined_at))
        .execute(&self.pool)
        .await
        .map_err(|e| creation_error(e, "user"))?;

        Ok(created)
    }

    async fn find_user(&self, id: UserId) -> anyhow::Result<Option<User>> {
        self.user_where("id", UserKey::Id(id.0)).await
    }

    async fn find_user_by_clerk_id(&self, clerk_id: &str) -> anyhow::Result<Option<User>> {
        self.user_where("clerk_id", UserKey::Clerk(clerk_id)).await
    }

    async fn update_user(&self, clerk_id: &str, update: UserUpdate) -> anyhow::Result<Option<User>> {
        let name_key = update.name.as_deref().map(fold);
        let username_key = update.username.as_deref().map(fold);
        let result = sqlx::query(
            "UPDATE users SET \
                name = COALESCE(?, name), \
                name_key = COALESCE(?, name_key), \
                username = COALESCE(?, username), \
                username_key = COALESCE(?, username_key), \
                email = COALESCE(?, email), \
                bio = COALESCE(?, bio), \
                location = COALESCE(?, location), \
                portfolio_website = COALESCE(?, portfolio_website), \
                picture = COALESCE(?, picture) \
             WHERE clerk_id = ?",
        )
        .bind(update.name)
        .bind(name_key)
        .bind(update.username)
        .bind(username_key)
        .bind(update.email)
        .bind(update.bio)
        .bind(update.location)
        .bind(update.portfolio_website)
        .bind(update.picture)
        .bind(clerk_id)
        .execute(&self.pool)
        .await
        .map_err(|e| creation_error(e, "user update"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_user_by_clerk_id(clerk_id).await
    }

    async fn delete_user(&self, id: UserId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?").bind(id.0).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_users(&self, query: UserQuery) -> anyhow::Result<(Vec<User>, u64)> {
        let mut conn = self.pool.acquire().await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users u");
        push_user_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select = QueryBuilder::new(USER_COLUMNS);
        push_user_filters(&mut select, &query);
        select.push(user_order(query.order));
        push_window(&mut select, query.window);
        let rows = select.build().fetch_all(&mut *conn).await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(hydrate_user(&mut conn, row).await?);
        }
        Ok((users, total as u64))
    }

    async fn adjust_reputation(&self, id: UserId, delta: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reputation = reputation + ? WHERE id = ?")
            .bind(delta)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_question(&self, user: UserId, question: QuestionId) -> anyhow::Result<()> {
        sqlx::query("INSERT OR IGNORE INTO saved_questions (user_id, question_id) VALUES (?, ?)")
            .bind(user.0)
            .bind(question.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unsave_question(&self, user: UserId, question: QuestionId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM saved_questions WHERE user_id = ? AND question_id = ?")
            .bind(user.0)
            .bind(question.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_user, seed_question, seed_user, store};
    use df_core::error::AppError;
    use df_core::pagination::Window;

    #[tokio::test]
    async fn duplicate_username_is_a_creation_error() {
        let store = store().await;
        seed_user(&store, "ferris").await;

        let mut clash = new_user("ferris");
        clash.clerk_id = "user_other".into();
        clash.email = "other@example.com".into();
        let err = store.insert_user(clash).await.unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Creation(_)));
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let store = store().await;
        let user = seed_user(&store, "corro").await;

        let updated = store
            .update_user(&user.clerk_id, UserUpdate { bio: Some("Unsafe crab".into()), ..Default::default() })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Unsafe crab"));
        assert_eq!(updated.username, "corro");

        let missing = store.update_user("user_nobody", UserUpdate::default()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn reputation_may_go_negative() {
        let store = store().await;
        let user = seed_user(&store, "ferris").await;
        store.adjust_reputation(user.id, 3).await.unwrap();
        store.adjust_reputation(user.id, -8).await.unwrap();
        assert_eq!(store.find_user(user.id).await.unwrap().unwrap().reputation, -5);
    }

    #[tokio::test]
    async fn saved_list_has_set_semantics() {
        let store = store().await;
        let user = seed_user(&store, "ferris").await;
        let question = seed_question(&store, user.id, "Lifetimes").await;

        store.save_question(user.id, question.id).await.unwrap();
        store.save_question(user.id, question.id).await.unwrap();
        let found = store.find_user_by_clerk_id(&user.clerk_id).await.unwrap().unwrap();
        assert_eq!(found.saved, vec![question.id]);

        store.unsave_question(user.id, question.id).await.unwrap();
        assert!(store.find_user(user.id).await.unwrap().unwrap().saved.is_empty());
    }

    #[tokio::test]
    async fn listing_searches_name_and_username() {
        let store = store().await;
        seed_user(&store, "ferris").await;
        seed_user(&store, "corro").await;

        let query = UserQuery {
            search: Some("FER".into()),
            order: UserOrder::NewestFirst,
            window: Window { skip: 0, limit: 10 },
        };
        let (users, total) = store.list_users(query).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].username, "ferris");
    }
}
