//! # Vote Engine
//!
//! Toggles a voter's up/down state on a Question or Answer and moves
//! reputation for the voter and the content author accordingly.
//!
//! | stored    | requested | transition | voter | author |
//! |-----------|-----------|------------|-------|--------|
//! | neither   | up / down | cast       | +1    | +10    |
//! | upvoted   | up        | revoke     | −1    | −10    |
//! | downvoted | down      | revoke     | −1    | −10    |
//! | upvoted   | down      | swap       | 0     | 0      |
//! | downvoted | up        | swap       | 0     | 0      |
//!
//! A swap keeps the credit already granted when the vote was cast, so an
//! up followed by a down nets the voter +1 and the author +10.
//!
//! The transition comes from the vote the store holds for the voter, read in
//! the same update that changes it. The caller's `has_upvoted` and
//! `has_downvoted` flags are only compared against it for diagnostics.
//!
//! The caller must reject anonymous requests before getting here.

use df_core::error::{AppError, Result};
use df_core::models::{Interaction, InteractionAction, UserId, VoteDirection, VoteTally, VoteTarget};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::reputation::{ReputationEvent, ReputationLedger};
use crate::Repos;

/// What a vote request does given the voter's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "direction", rename_all = "snake_case")]
pub enum VoteTransition {
    /// No prior vote; the voter joins the requested set
    Cast(VoteDirection),
    /// Same direction requested again; the voter leaves that set
    Revoke(VoteDirection),
    /// Opposite vote existed; the voter moves into the requested set
    Swap(VoteDirection),
}

impl VoteTransition {
    /// Transition from the vote the voter held before this request.
    pub fn from_prior(prior: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match prior {
            None => VoteTransition::Cast(requested),
            Some(held) if held == requested => VoteTransition::Revoke(requested),
            Some(_) => VoteTransition::Swap(requested),
        }
    }

    /// Multiplier applied to the fixed voter and author credits.
    pub fn credit_sign(self) -> i64 {
        match self {
            VoteTransition::Cast(_) => 1,
            VoteTransition::Revoke(_) => -1,
            VoteTransition::Swap(_) => 0,
        }
    }

    fn interaction(self) -> Option<InteractionAction> {
        match self {
            VoteTransition::Revoke(_) => None,
            VoteTransition::Cast(d) | VoteTransition::Swap(d) => Some(match d {
                VoteDirection::Up => InteractionAction::Upvote,
                VoteDirection::Down => InteractionAction::Downvote,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VoteParams {
    pub target: VoteTarget,
    pub voter: UserId,
    pub direction: VoteDirection,
    /// What the caller believes the voter holds. Never decides the transition.
    pub has_upvoted: bool,
    pub has_downvoted: bool,
}

impl VoteParams {
    fn claimed_prior(&self) -> Option<VoteDirection> {
        match (self.has_upvoted, self.has_downvoted) {
            (true, false) => Some(VoteDirection::Up),
            (false, true) => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteOutcome {
    pub transition: VoteTransition,
    pub tally: VoteTally,
}

#[derive(Clone)]
pub struct VoteEngine {
    repos: Repos,
    ledger: ReputationLedger,
}

impl VoteEngine {
    pub fn new(repos: Repos) -> Self {
        let ledger = ReputationLedger::new(repos.users.clone());
        Self { repos, ledger }
    }

    #[instrument(skip(self), err)]
    pub async fn apply_vote(&self, params: VoteParams) -> Result<VoteOutcome> {
        let toggle = self
            .repos
            .votes
            .apply_vote(params.target, params.voter, params.direction)
            .await?
            .ok_or_else(|| AppError::not_found(params.target.kind(), params.target.id()))?;
        if toggle.prior != params.claimed_prior() || (params.has_upvoted && params.has_downvoted) {
            debug!(stored = ?toggle.prior, has_upvoted = params.has_upvoted, has_downvoted = params.has_downvoted, "stale vote flags ignored");
        }
        let transition = VoteTransition::from_prior(toggle.prior, params.direction);
        let tally = toggle.tally;

        self.ledger
            .record(params.voter, ReputationEvent::CastVote(transition))
            .await?;
        self.ledger
            .record(tally.author, ReputationEvent::ReceivedVote(transition))
            .await?;

        if let Some(action) = transition.interaction() {
            self.log_vote(params.voter, params.target, action).await?;
        }

        info!(target_kind = params.target.kind(), target_id = %params.target.id(), ?transition, "vote applied");
        Ok(VoteOutcome { transition, tally })
    }

    /// Appends the vote to the interaction log with the parent question's tags.
    async fn log_vote(&self, voter: UserId, target: VoteTarget, action: InteractionAction) -> Result<()> {
        let (question_id, answer_id) = match target {
            VoteTarget::Question(id) => (id, None),
            VoteTarget::Answer(id) => match self.repos.answers.find_answer(id).await? {
                Some(answer) => (answer.question, Some(answer.id)),
                None => return Ok(()),
            },
        };
        let Some(question) = self.repos.questions.find_question(question_id).await? else {
            return Ok(());
        };

        let mut interaction = Interaction::record(voter, action).on_question(&question);
        if let Some(answer) = answer_id {
            interaction = interaction.on_answer(answer);
        }
        self.repos.interactions.insert_interaction(interaction).await?;
        Ok(())
    }
}
