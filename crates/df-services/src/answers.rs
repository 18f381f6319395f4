//! # Answers

use chrono::Utc;
use df_core::error::{AppError, Result};
use df_core::models::{Answer, AnswerId, Interaction, InteractionAction, QuestionId, UserId};
use df_core::pagination::{Page, PageRequest};
use df_core::query::{AnswerQuery, AnswerSort};
use tracing::{info, instrument};

use crate::reputation::{ReputationEvent, ReputationLedger};
use crate::{required, Repos};

#[derive(Debug, Clone)]
pub struct CreateAnswerParams {
    pub content: String,
    pub author: UserId,
    pub question: QuestionId,
}

#[derive(Debug, Clone)]
pub struct GetAnswersParams {
    pub question: QuestionId,
    pub sort: AnswerSort,
    pub page: PageRequest,
}

#[derive(Debug, Clone)]
pub struct DeleteAnswerParams {
    pub answer: AnswerId,
    pub actor: UserId,
}

#[derive(Clone)]
pub struct AnswerService {
    repos: Repos,
    ledger: ReputationLedger,
}

impl AnswerService {
    pub fn new(repos: Repos) -> Self {
        Self { ledger: ReputationLedger::new(repos.users.clone()), repos }
    }

    #[instrument(skip(self), fields(question = %params.question), err)]
    pub async fn create_answer(&self, params: CreateAnswerParams) -> Result<Answer> {
        let content = required("content", params.content)?;
        let question = self
            .repos
            .questions
            .find_question(params.question)
            .await?
            .ok_or_else(|| AppError::not_found("Question", params.question))?;

        let answer = Answer {
            id: AnswerId::generate(),
            content,
            author: params.author,
            question: question.id,
            upvotes: Vec::new(),
            downvotes: Vec::new(),
            created_at: Utc::now(),
        };
        self.repos.answers.insert_answer(answer.clone()).await?;

        let interaction = Interaction::record(params.author, InteractionAction::Answer)
            .on_question(&question)
            .on_answer(answer.id);
        self.repos.interactions.insert_interaction(interaction).await?;
        self.ledger.record(params.author, ReputationEvent::PostedAnswer).await?;

        info!(answer = %answer.id, "answer created");
        Ok(answer)
    }

    #[instrument(skip(self), err)]
    pub async fn get_answers(&self, params: GetAnswersParams) -> Result<Page<Answer>> {
        let window = params.page.window()?;
        let query = AnswerQuery {
            question: Some(params.question),
            author: None,
            search: None,
            order: params.sort.order(),
            window,
        };
        let (answers, total) = self.repos.answers.find_answers(query).await?;
        Ok(Page::new(answers, total, window))
    }

    /// Removes the answer (which unlinks it from its question) and its
    /// interactions, then debits the author.
    #[instrument(skip(self), fields(answer = %params.answer), err)]
    pub async fn delete_answer(&self, params: DeleteAnswerParams) -> Result<()> {
        let answer = self
            .repos
            .answers
            .find_answer(params.answer)
            .await?
            .ok_or_else(|| AppError::not_found("Answer", params.answer))?;
        if answer.author != params.actor {
            return Err(AppError::Unauthorized("only the author can delete an answer".into()));
        }

        self.repos.answers.delete_answer(answer.id).await?;
        self.repos.interactions.delete_for_answer(answer.id).await?;
        self.ledger.record(answer.author, ReputationEvent::DeletedAnswer).await?;
        info!(answer = %answer.id, question = %answer.question, "answer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{question, Mocks};
    use df_core::models::TagId;
    use df_core::pagination::Window;
    use df_core::query::AnswerOrder;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn create_links_interaction_with_question_tags() {
        let author = UserId::generate();
        let tags = vec![TagId::generate()];
        let parent = question(QuestionId::generate(), UserId::generate(), tags.clone());
        let question_id = parent.id;

        let mut mocks = Mocks::default();
        mocks.questions.expect_find_question().returning(move |_| Ok(Some(parent.clone())));
        mocks
            .answers
            .expect_insert_answer()
            .withf(move |a| a.question == question_id && a.author == author)
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .interactions
            .expect_insert_interaction()
            .withf(move |i| {
                i.action == InteractionAction::Answer && i.question == Some(question_id) && i.tags == tags && i.answer.is_some()
            })
            .times(1)
            .returning(|_| Ok(()));
        mocks
            .users
            .expect_adjust_reputation()
            .with(eq(author), eq(10))
            .times(1)
            .returning(|_, _| Ok(()));

        let answer = AnswerService::new(mocks.into_repos())
            .create_answer(CreateAnswerParams { content: "Use Arc.".into(), author, question: question_id })
            .await
            .unwrap();
        assert_eq!(answer.question, question_id);
    }

    #[tokio::test]
    async fn answering_a_missing_question_is_not_found() {
        let mut mocks = Mocks::default();
        mocks.questions.expect_find_question().returning(|_| Ok(None));
        mocks.answers.expect_insert_answer().never();
        let err = AnswerService::new(mocks.into_repos())
            .create_answer(CreateAnswerParams {
                content: "orphan".into(),
                author: UserId::generate(),
                question: QuestionId::generate(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(kind, _) if kind == "Question"));
    }

    #[tokio::test]
    async fn delete_removes_interactions_and_debits_ten() {
        let author = UserId::generate();
        let answer = Answer {
            id: AnswerId::generate(),
            content: "Box it.".into(),
            author,
            question: QuestionId::generate(),
            upvotes: vec![],
            downvotes: vec![],
            created_at: Utc::now(),
        };
        let id = answer.id;

        let mut mocks = Mocks::default();
        mocks.answers.expect_find_answer().returning(move |_| Ok(Some(answer.clone())));
        mocks.answers.expect_delete_answer().with(eq(id)).times(1).returning(|_| Ok(()));
        mocks.interactions.expect_delete_for_answer().with(eq(id)).times(1).returning(|_| Ok(2));
        mocks
            .users
            .expect_adjust_reputation()
            .with(eq(author), eq(-10))
            .times(1)
            .returning(|_, _| Ok(()));

        AnswerService::new(mocks.into_repos())
            .delete_answer(DeleteAnswerParams { answer: id, actor: author })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn listing_maps_sort_key() {
        let question_id = QuestionId::generate();
        let mut mocks = Mocks::default();
        mocks
            .answers
            .expect_find_answers()
            .withf(move |q| {
                q.question == Some(question_id)
                    && q.order == AnswerOrder::LowestUpvotes
                    && q.window == Window { skip: 10, limit: 10 }
            })
            .returning(|_| Ok((vec![], 12)));

        let page = AnswerService::new(mocks.into_repos())
            .get_answers(GetAnswersParams {
                question: question_id,
                sort: AnswerSort::LowestUpvotes,
                page: PageRequest::new(2, 10),
            })
            .await
            .unwrap();
        assert!(page.is_next);
    }
}
