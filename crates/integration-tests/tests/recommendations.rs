use std::collections::HashSet;

use df_core::error::AppError;
use df_core::models::{QuestionId, UserId};
use df_core::pagination::PageRequest;
use df_core::query::HomeFilter;
use df_services::questions::{GetQuestionsParams, ViewQuestionParams};
use df_services::recommend::RecommendParams;
use integration_tests::TestForum;

fn ids(items: &[df_core::models::Question]) -> HashSet<QuestionId> {
    items.iter().map(|q| q.id).collect()
}

#[tokio::test]
async fn own_questions_never_come_back_as_recommendations() {
    let t = TestForum::new().await;
    let me = t.member("me").await;
    let other = t.member("other").await;

    let mine = t.ask(&me, "My borrow checker woes", &["rust"]).await;
    let shared = t.ask(&other, "Rust iterator adaptors", &["Rust", "iterators"]).await;
    let unrelated = t.ask(&other, "Goroutine leaks", &["go"]).await;

    let page = t
        .forum
        .recommender
        .recommend(RecommendParams { user: me.id, page: PageRequest::default(), search: None })
        .await
        .unwrap();

    let found = ids(&page.items);
    assert!(found.contains(&shared.id));
    assert!(!found.contains(&mine.id));
    assert!(!found.contains(&unrelated.id));
    assert_eq!(page.total, 1);
    assert!(!page.is_next);
}

#[tokio::test]
async fn viewing_widens_the_tag_set() {
    let t = TestForum::new().await;
    let me = t.member("me").await;
    let other = t.member("other").await;
    let go = t.ask(&other, "Goroutine leaks", &["go"]).await;
    let more_go = t.ask(&other, "Go generics", &["go", "generics"]).await;

    t.forum
        .questions
        .view_question(ViewQuestionParams { question: go.id, viewer: Some(me.id) })
        .await
        .unwrap();

    let first = t
        .forum
        .questions
        .get_questions(GetQuestionsParams {
            filter: HomeFilter::Recommended,
            page: PageRequest::new(1, 1),
            viewer: Some(me.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.total, 2);
    assert!(first.is_next);

    let second = t
        .forum
        .questions
        .get_questions(GetQuestionsParams {
            filter: HomeFilter::Recommended,
            page: PageRequest::new(2, 1),
            viewer: Some(me.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.is_next);

    let seen = ids(&[first.items, second.items].concat());
    assert_eq!(seen, HashSet::from([go.id, more_go.id]));
}

#[tokio::test]
async fn search_text_narrows_recommendations() {
    let t = TestForum::new().await;
    let me = t.member("me").await;
    let other = t.member("other").await;
    t.ask(&me, "Lifetimes again", &["rust"]).await;
    let serde = t.ask(&other, "Serde flatten quirks", &["rust"]).await;
    t.ask(&other, "Tokio select! fairness", &["rust"]).await;

    let page = t
        .forum
        .recommender
        .recommend(RecommendParams {
            user: me.id,
            page: PageRequest::default(),
            search: Some("SERDE".into()),
        })
        .await
        .unwrap();
    assert_eq!(ids(&page.items), HashSet::from([serde.id]));
}

#[tokio::test]
async fn no_history_means_no_recommendations() {
    let t = TestForum::new().await;
    let me = t.member("me").await;
    let other = t.member("other").await;
    t.ask(&other, "Unsafe cell", &["rust"]).await;

    let page = t
        .forum
        .recommender
        .recommend(RecommendParams { user: me.id, page: PageRequest::default(), search: None })
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.is_next);

    let anonymous = t
        .forum
        .questions
        .get_questions(GetQuestionsParams { filter: HomeFilter::Recommended, ..Default::default() })
        .await
        .unwrap();
    assert!(anonymous.items.is_empty());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let t = TestForum::new().await;
    let err = t
        .forum
        .recommender
        .recommend(RecommendParams { user: UserId::generate(), page: PageRequest::default(), search: None })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(..)));
}
