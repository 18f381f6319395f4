use df_core::error::AppError;
use df_core::models::InteractionAction;
use df_core::pagination::PageRequest;
use df_core::traits::{AnswerRepo, InteractionRepo, TagRepo};
use df_services::answers::{CreateAnswerParams, DeleteAnswerParams};
use df_services::questions::{CreateQuestionParams, DeleteQuestionParams, EditQuestionParams, GetQuestionsParams, ViewQuestionParams};
use df_services::tags::GetAllTagsParams;
use integration_tests::TestForum;

#[tokio::test]
async fn deleting_a_question_removes_its_cascade_and_debits_the_author() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let helper = t.member("helper").await;
    let q = t.ask(&author, "Arc<Mutex<T>> or channels?", &["rust", "concurrency"]).await;

    let mut answers = Vec::new();
    for content in ["Channels, usually.", "Depends on contention."] {
        let answer = t
            .forum
            .answers
            .create_answer(CreateAnswerParams { content: content.into(), author: helper.id, question: q.id })
            .await
            .unwrap();
        answers.push(answer.id);
    }

    let mut logged = t.store.interactions_for_user(author.id).await.unwrap();
    logged.extend(t.store.interactions_for_user(helper.id).await.unwrap());
    assert_eq!(logged.iter().filter(|i| i.question == Some(q.id)).count(), 3);
    let before = t.reload(&author).await.reputation;

    t.forum
        .questions
        .delete_question(DeleteQuestionParams { question: q.id, actor: author.id })
        .await
        .unwrap();

    let err = t.forum.questions.get_question(q.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(..)));
    for id in answers {
        assert!(t.store.find_answer(id).await.unwrap().is_none());
    }
    assert!(t.store.interactions_for_user(author.id).await.unwrap().is_empty());
    assert!(t.store.interactions_for_user(helper.id).await.unwrap().is_empty());
    for tag in q.tags {
        let tag = t.store.find_tag(tag).await.unwrap().expect("tags outlive their questions");
        assert!(!tag.questions.contains(&q.id));
    }
    assert_eq!(t.reload(&author).await.reputation, before - 5);
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let stranger = t.member("stranger").await;
    let q = t.ask(&author, "What is a GAT?", &["rust"]).await;

    let err = t
        .forum
        .questions
        .edit_question(EditQuestionParams {
            question: q.id,
            editor: stranger.id,
            title: "Hijacked".into(),
            content: "spam".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = t
        .forum
        .questions
        .delete_question(DeleteQuestionParams { question: q.id, actor: stranger.id })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let edited = t
        .forum
        .questions
        .edit_question(EditQuestionParams {
            question: q.id,
            editor: author.id,
            title: "What is a generic associated type?".into(),
            content: "Asking for a friend.".into(),
        })
        .await
        .unwrap();
    assert_eq!(edited.title, "What is a generic associated type?");
    assert_eq!(edited.tags, q.tags);
}

#[tokio::test]
async fn tag_names_resolve_case_insensitively() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let first = t.ask(&author, "Hooks rules", &["React"]).await;
    let second = t.ask(&author, "Server components", &["react", "REACT"]).await;

    assert_eq!(first.tags.len(), 1);
    assert_eq!(second.tags, first.tags);

    let tags = t.forum.tags.get_all_tags(GetAllTagsParams::default()).await.unwrap();
    assert_eq!(tags.total, 1);
    assert_eq!(tags.items[0].name, "React");
    assert_eq!(tags.items[0].questions.len(), 2);
}

#[tokio::test]
async fn accented_tag_names_and_search_fold_beyond_ascii() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let first = t.ask(&author, "Évaluation paresseuse", &["Élixir"]).await;
    let second = t.ask(&author, "GenServer state", &["élixir"]).await;
    assert_eq!(second.tags, first.tags);

    let tags = t.forum.tags.get_all_tags(GetAllTagsParams::default()).await.unwrap();
    assert_eq!(tags.total, 1);
    assert_eq!(tags.items[0].name, "Élixir");

    let found = t
        .forum
        .questions
        .get_questions(GetQuestionsParams { search: Some("ÉVALUATION".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].id, first.id);
}

#[tokio::test]
async fn blank_tag_leaves_no_partial_question() {
    let t = TestForum::new().await;
    let author = t.member("author").await;

    let err = t
        .forum
        .questions
        .create_question(CreateQuestionParams {
            title: "Half written".into(),
            content: "Should never be stored".into(),
            author: author.id,
            tags: vec!["rust".into(), "  ".into()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let questions = t.forum.questions.get_questions(GetQuestionsParams::default()).await.unwrap();
    assert_eq!(questions.total, 0);
    let tags = t.forum.tags.get_all_tags(GetAllTagsParams::default()).await.unwrap();
    assert_eq!(tags.total, 0);
    assert_eq!(t.reload(&author).await.reputation, 0);
}

#[tokio::test]
async fn answer_credits_and_deletion_debits_the_answerer() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let helper = t.member("helper").await;
    let q = t.ask(&author, "How do I read a file?", &["rust", "io"]).await;
    let start = t.reload(&helper).await.reputation;

    let answer = t
        .forum
        .answers
        .create_answer(CreateAnswerParams {
            content: "std::fs::read_to_string".into(),
            author: helper.id,
            question: q.id,
        })
        .await
        .unwrap();
    assert_eq!(t.reload(&helper).await.reputation, start + 10);
    assert_eq!(t.forum.questions.get_question(q.id).await.unwrap().answers, vec![answer.id]);

    t.forum
        .answers
        .delete_answer(DeleteAnswerParams { answer: answer.id, actor: helper.id })
        .await
        .unwrap();
    assert_eq!(t.reload(&helper).await.reputation, start);
    assert!(t.forum.questions.get_question(q.id).await.unwrap().answers.is_empty());
}

#[tokio::test]
async fn views_count_every_time_but_log_once_per_user() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let reader = t.member("reader").await;
    let q = t.ask(&author, "Cow<'_, str> explained", &["rust"]).await;

    for viewer in [Some(reader.id), Some(reader.id), None] {
        t.forum
            .questions
            .view_question(ViewQuestionParams { question: q.id, viewer })
            .await
            .unwrap();
    }

    assert_eq!(t.forum.questions.get_question(q.id).await.unwrap().views, 3);
    let views = t
        .store
        .interactions_for_user(reader.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|i| i.action == InteractionAction::View)
        .count();
    assert_eq!(views, 1);
}

#[tokio::test]
async fn page_zero_is_rejected() {
    let t = TestForum::new().await;
    let params = GetAllTagsParams { page: PageRequest::new(0, 10), ..Default::default() };
    let err = t.forum.tags.get_all_tags(params).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
