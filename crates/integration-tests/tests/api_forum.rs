use actix_web::http::StatusCode;
use actix_web::{test, App};
use df_api::configure_routes;
use df_api::identity::IDENTITY_HEADER;
use integration_tests::TestForum;
use serde_json::{json, Value};

#[actix_web::test]
async fn ask_vote_and_read_back_over_http() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let voter = t.member("voter").await;
    let app = test::init_service(App::new().app_data(t.app_state(None)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/questions")
        .insert_header((IDENTITY_HEADER, author.clerk_id.as_str()))
        .set_json(json!({ "title": "Is Rc Send?", "content": "The compiler says no.", "tags": ["rust"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let question: Value = test::read_body_json(resp).await;
    let id = question["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/questions/{id}/vote"))
        .insert_header((IDENTITY_HEADER, voter.clerk_id.as_str()))
        .set_json(json!({ "direction": "up" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let outcome: Value = test::read_body_json(resp).await;
    assert_eq!(outcome["transition"], json!({ "kind": "cast", "direction": "up" }));
    assert_eq!(outcome["tally"]["upvotes"], json!([voter.id.to_string()]));

    let req = test::TestRequest::get().uri(&format!("/questions/{id}")).to_request();
    let stored: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stored["upvotes"], json!([voter.id.to_string()]));
    assert_eq!(stored["downvotes"], json!([]));

    assert_eq!(t.reload(&voter).await.reputation, 1);
    assert_eq!(t.reload(&author).await.reputation, 20);
}

#[actix_web::test]
async fn anonymous_vote_changes_nothing() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let q = t.ask(&author, "Send vs Sync", &["rust"]).await;
    let app = test::init_service(App::new().app_data(t.app_state(None)).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/questions/{}/vote", q.id))
        .set_json(json!({ "direction": "down" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let stored = t.forum.questions.get_question(q.id).await.unwrap();
    assert!(stored.downvotes.is_empty());
    assert_eq!(t.reload(&author).await.reputation, 10);
}

#[actix_web::test]
async fn delete_is_reserved_for_the_author() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let stranger = t.member("stranger").await;
    let q = t.ask(&author, "Drop order in structs", &["rust"]).await;
    let app = test::init_service(App::new().app_data(t.app_state(None)).configure(configure_routes)).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/questions/{}", q.id))
        .insert_header((IDENTITY_HEADER, stranger.clerk_id.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&format!("/questions/{}", q.id))
        .insert_header((IDENTITY_HEADER, author.clerk_id.as_str()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&format!("/questions/{}", q.id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[actix_web::test]
async fn tag_listing_pages_by_question_count() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    t.ask(&author, "Tokio runtime flavours", &["tokio", "rust"]).await;
    t.ask(&author, "Axum vs actix", &["Rust", "web"]).await;
    let app = test::init_service(App::new().app_data(t.app_state(None)).configure(configure_routes)).await;

    let req = test::TestRequest::get().uri("/tags?filter=popular&page=1&page_size=2").to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["is_next"], true);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["name"], "rust");

    let req = test::TestRequest::get().uri("/tags/popular").to_request();
    let popular: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(popular[0]["name"], "rust");
    assert_eq!(popular[0]["question_count"], 2);
}

#[actix_web::test]
async fn saving_toggles_and_lists() {
    let t = TestForum::new().await;
    let author = t.member("author").await;
    let reader = t.member("reader").await;
    let q = t.ask(&author, "When to use PhantomData", &["rust"]).await;
    let app = test::init_service(App::new().app_data(t.app_state(None)).configure(configure_routes)).await;

    let save = || {
        test::TestRequest::post()
            .uri(&format!("/questions/{}/save", q.id))
            .insert_header((IDENTITY_HEADER, reader.clerk_id.as_str()))
            .to_request()
    };
    let saved: Value = test::call_and_read_body_json(&app, save()).await;
    assert_eq!(saved, json!({ "saved": true }));

    let req = test::TestRequest::get()
        .uri("/me/saved")
        .insert_header((IDENTITY_HEADER, reader.clerk_id.as_str()))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["items"][0]["id"], q.id.to_string());

    let unsaved: Value = test::call_and_read_body_json(&app, save()).await;
    assert_eq!(unsaved, json!({ "saved": false }));
}
