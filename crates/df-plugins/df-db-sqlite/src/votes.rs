use async_trait::async_trait;
use df_core::models::{UserId, VoteDirection, VoteTally, VoteTarget, VoteToggle};
use df_core::traits::VoteRepo;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::SqliteStore;

/// Where one target kind keeps its votes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VoteTable {
    parent: &'static str,
    votes: &'static str,
    key: &'static str,
}

impl VoteTable {
    pub(crate) const QUESTION: VoteTable = VoteTable { parent: "questions", votes: "question_votes", key: "question_id" };
    pub(crate) const ANSWER: VoteTable = VoteTable { parent: "answers", votes: "answer_votes", key: "answer_id" };

    fn of(target: VoteTarget) -> Self {
        match target {
            VoteTarget::Question(_) => Self::QUESTION,
            VoteTarget::Answer(_) => Self::ANSWER,
        }
    }
}

fn direction_value(direction: VoteDirection) -> i64 {
    match direction {
        VoteDirection::Up => 1,
        VoteDirection::Down => -1,
    }
}

/// Upvoters and downvoters of one target, in the order they voted.
pub(crate) async fn vote_sets(
    conn: &mut SqliteConnection,
    table: VoteTable,
    target: Uuid,
) -> sqlx::Result<(Vec<UserId>, Vec<UserId>)> {
    let sql = format!("SELECT user_id, direction FROM {} WHERE {} = ? ORDER BY rowid", table.votes, table.key);
    let rows = sqlx::query(&sql).bind(target).fetch_all(&mut *conn).await?;

    let (mut up, mut down) = (Vec::new(), Vec::new());
    for row in rows {
        let voter = UserId(row.try_get("user_id")?);
        if row.try_get::<i64, _>("direction")? > 0 {
            up.push(voter);
        } else {
            down.push(voter);
        }
    }
    Ok((up, down))
}

fn direction_of(value: i64) -> VoteDirection {
    if value > 0 {
        VoteDirection::Up
    } else {
        VoteDirection::Down
    }
}

#[async_trait]
impl VoteRepo for SqliteStore {
    async fn apply_vote(&self, target: VoteTarget, voter: UserId, direction: VoteDirection) -> anyhow::Result<Option<VoteToggle>> {
        let table = VoteTable::of(target);
        let id = target.id();
        let mut tx = self.pool.begin().await?;

        let author_sql = format!("SELECT author_id FROM {} WHERE id = ?", table.parent);
        let author: Option<Uuid> = sqlx::query_scalar(&author_sql).bind(id).fetch_optional(&mut *tx).await?;
        let Some(author) = author else {
            return Ok(None);
        };

        let prior_sql = format!("SELECT direction FROM {} WHERE {} = ? AND user_id = ?", table.votes, table.key);
        let prior: Option<i64> = sqlx::query_scalar(&prior_sql)
            .bind(id)
            .bind(voter.0)
            .fetch_optional(&mut *tx)
            .await?;
        let prior = prior.map(direction_of);

        if prior == Some(direction) {
            let sql = format!("DELETE FROM {} WHERE {} = ? AND user_id = ?", table.votes, table.key);
            sqlx::query(&sql).bind(id).bind(voter.0).execute(&mut *tx).await?;
        } else {
            // A (target, voter) row is either up or down, so this also moves
            // the voter out of the opposite set.
            let sql = format!(
                "INSERT INTO {votes} ({key}, user_id, direction) VALUES (?, ?, ?) \
                 ON CONFLICT ({key}, user_id) DO UPDATE SET direction = excluded.direction",
                votes = table.votes,
                key = table.key,
            );
            sqlx::query(&sql)
                .bind(id)
                .bind(voter.0)
                .bind(direction_value(direction))
                .execute(&mut *tx)
                .await?;
        }

        let (upvotes, downvotes) = vote_sets(&mut tx, table, id).await?;
        tx.commit().await?;
        Ok(Some(VoteToggle { prior, tally: VoteTally { author: UserId(author), upvotes, downvotes } }))
    }
}
