//! Shared fixtures for the end-to-end suites.
//!
//! Every suite runs the real services over a fresh in-memory SQLite store.

use std::sync::Arc;

use actix_web::web;
use df_api::AppState;
use df_core::models::{NewUser, Question, User};
use df_core::traits::IdentityProvider;
use df_db_sqlite::SqliteStore;
use df_services::questions::CreateQuestionParams;
use df_services::{Forum, Repos};

/// A forum wired to its own private store.
pub struct TestForum {
    pub store: Arc<SqliteStore>,
    pub forum: Forum,
}

impl TestForum {
    pub async fn new() -> Self {
        let store = Arc::new(SqliteStore::new("sqlite::memory:").await.expect("in-memory store"));
        let forum = Forum::new(Repos::from_store(store.clone()));
        Self { store, forum }
    }

    /// Shared state for an app over the same store the fixtures write to.
    pub fn app_state(&self, identity: Option<Arc<dyn IdentityProvider>>) -> web::Data<AppState> {
        web::Data::new(AppState { forum: self.forum.clone(), identity })
    }

    pub async fn member(&self, handle: &str) -> User {
        self.forum.users.create_user(new_user(handle)).await.expect("create member")
    }

    /// Re-reads the user so reputation reflects every applied delta.
    pub async fn reload(&self, user: &User) -> User {
        self.forum.users.get_user(user.id).await.expect("reload member")
    }

    pub async fn ask(&self, author: &User, title: &str, tags: &[&str]) -> Question {
        self.forum
            .questions
            .create_question(CreateQuestionParams {
                title: title.into(),
                content: format!("{title}: details inside"),
                author: author.id,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .await
            .expect("ask question")
    }
}

pub fn new_user(handle: &str) -> NewUser {
    NewUser {
        clerk_id: format!("user_{handle}"),
        name: handle.to_uppercase(),
        username: handle.to_string(),
        email: format!("{handle}@example.com"),
        bio: None,
        location: None,
        portfolio_website: None,
        picture: format!("https://img.example.com/{handle}.png"),
    }
}
