//! # Reputation Ledger
//!
//! Reputation lives on the User document and only moves through the named
//! deltas below, each applied as an atomic increment.

use std::sync::Arc;

use df_core::error::Result;
use df_core::models::UserId;
use df_core::traits::UserRepo;
use tracing::debug;

use crate::vote::VoteTransition;

pub const ASK_QUESTION: i64 = 10;
pub const POST_ANSWER: i64 = 10;
/// Half the asking credit. Kept as-is; the asymmetry predates this code.
pub const DELETE_QUESTION: i64 = -5;
pub const DELETE_ANSWER: i64 = -10;
pub const VOTER_CREDIT: i64 = 1;
pub const AUTHOR_CREDIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationEvent {
    AskedQuestion,
    PostedAnswer,
    DeletedQuestion,
    DeletedAnswer,
    /// Applied to the voter
    CastVote(VoteTransition),
    /// Applied to the author of the voted content
    ReceivedVote(VoteTransition),
}

impl ReputationEvent {
    pub fn delta(self) -> i64 {
        match self {
            ReputationEvent::AskedQuestion => ASK_QUESTION,
            ReputationEvent::PostedAnswer => POST_ANSWER,
            ReputationEvent::DeletedQuestion => DELETE_QUESTION,
            ReputationEvent::DeletedAnswer => DELETE_ANSWER,
            ReputationEvent::CastVote(t) => VOTER_CREDIT * t.credit_sign(),
            ReputationEvent::ReceivedVote(t) => AUTHOR_CREDIT * t.credit_sign(),
        }
    }
}

#[derive(Clone)]
pub struct ReputationLedger {
    users: Arc<dyn UserRepo>,
}

impl ReputationLedger {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    /// Applies the event's delta to `user`. A zero delta issues no write.
    pub async fn record(&self, user: UserId, event: ReputationEvent) -> Result<()> {
        let delta = event.delta();
        if delta == 0 {
            return Ok(());
        }
        self.users.adjust_reputation(user, delta).await?;
        debug!(%user, ?event, delta, "reputation adjusted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use df_core::models::VoteDirection;
    use df_core::traits::MockUserRepo;
    use mockall::predicate::eq;

    #[test]
    fn content_deltas() {
        assert_eq!(ReputationEvent::AskedQuestion.delta(), 10);
        assert_eq!(ReputationEvent::PostedAnswer.delta(), 10);
        assert_eq!(ReputationEvent::DeletedQuestion.delta(), -5);
        assert_eq!(ReputationEvent::DeletedAnswer.delta(), -10);
    }

    #[test]
    fn vote_deltas_follow_the_transition() {
        let cast = VoteTransition::Cast(VoteDirection::Down);
        let revoke = VoteTransition::Revoke(VoteDirection::Up);
        let swap = VoteTransition::Swap(VoteDirection::Up);
        assert_eq!(ReputationEvent::CastVote(cast).delta(), 1);
        assert_eq!(ReputationEvent::ReceivedVote(cast).delta(), 10);
        assert_eq!(ReputationEvent::CastVote(revoke).delta(), -1);
        assert_eq!(ReputationEvent::ReceivedVote(revoke).delta(), -10);
        assert_eq!(ReputationEvent::CastVote(swap).delta(), 0);
        assert_eq!(ReputationEvent::ReceivedVote(swap).delta(), 0);
    }

    #[tokio::test]
    async fn record_increments_by_delta() {
        let user = UserId::generate();
        let mut users = MockUserRepo::new();
        users
            .expect_adjust_reputation()
            .with(eq(user), eq(-5))
            .times(1)
            .returning(|_, _| Ok(()));

        let ledger = ReputationLedger::new(Arc::new(users));
        ledger.record(user, ReputationEvent::DeletedQuestion).await.unwrap();
    }

    #[tokio::test]
    async fn zero_delta_skips_the_store() {
        let users = MockUserRepo::new();
        let ledger = ReputationLedger::new(Arc::new(users));
        let swap = VoteTransition::Swap(VoteDirection::Down);
        ledger
            .record(UserId::generate(), ReputationEvent::ReceivedVote(swap))
            .await
            .unwrap();
    }
}
