//! HTTP tests driving the complete router

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestRequest, TestResponse, TestServer};
use chrono::{Duration, Utc};
use tempfile::TempDir;

use super::{build_router, AppState};
use crate::config::Config;
use crate::db::{create_test_pool, migrations};
use crate::models::{CategoryInput, ListParams, LocationInput, Post, PostInput, User};
use crate::services::media::POST_IMAGE_DIR;
use crate::services::{LoginInput, RegisterInput};

const PASSWORD: &str = "correct-horse-9";

struct TestApp {
    server: TestServer,
    state: AppState,
    media: TempDir,
}

/// A logged-in account
struct Account {
    user: User,
    cookie: HeaderValue,
}

impl TestApp {
    async fn new() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let media = TempDir::new().expect("Failed to create media dir");
        let mut config = Config::default();
        config.media.path = media.path().to_path_buf();

        let state = AppState::new(pool, &config).expect("Failed to build state");
        let server = TestServer::new(build_router(state.clone())).expect("Failed to start server");
        Self {
            server,
            state,
            media,
        }
    }

    /// Register `username` and open a session for it
    async fn account(&self, username: &str) -> Account {
        let user = self
            .state
            .user_service
            .register(RegisterInput::new(username, PASSWORD))
            .await
            .unwrap();
        let session = self
            .state
            .user_service
            .login(LoginInput::new(username, PASSWORD))
            .await
            .unwrap();
        Account {
            user,
            cookie: HeaderValue::from_str(&format!("sessionid={}", session.id)).unwrap(),
        }
    }

    fn get(&self, path: &str, account: Option<&Account>) -> TestRequest {
        with_cookie(self.server.get(path), account)
    }

    fn post(&self, path: &str, account: Option<&Account>) -> TestRequest {
        with_cookie(self.server.post(path), account)
    }

    async fn category(&self, slug: &str, is_published: bool) -> i64 {
        self.state
            .category_service
            .create(CategoryInput {
                title: format!("Category {}", slug),
                description: "Posts about things".to_string(),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .unwrap()
            .id
    }

    async fn location(&self, name: &str) -> i64 {
        self.state
            .location_service
            .create(LocationInput {
                name: name.to_string(),
                is_published: true,
            })
            .await
            .unwrap()
            .id
    }

    async fn post_by(&self, author: &Account, title: &str, hours: i64, category_id: i64) -> Post {
        self.state
            .post_service
            .create(
                &author.user,
                PostInput {
                    title: title.to_string(),
                    text: "Line one\nLine two".to_string(),
                    pub_date: Utc::now() + Duration::hours(hours),
                    is_published: true,
                    category_id: Some(category_id),
                    location_id: None,
                    image: None,
                },
            )
            .await
            .unwrap()
    }
}

fn with_cookie(request: TestRequest, account: Option<&Account>) -> TestRequest {
    match account {
        Some(account) => request.add_header(header::COOKIE, account.cookie.clone()),
        None => request,
    }
}

fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_string()
}

fn count_cards(html: &str) -> usize {
    html.matches("class=\"post-card\"").count()
}

fn post_form(title: &str, category_id: i64, location_id: i64) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title)
        .add_text("text", "Body of the post")
        .add_text("pub_date", "2024-05-01T10:30")
        .add_text("category", category_id.to_string())
        .add_text("location", location_id.to_string())
}

#[tokio::test]
async fn test_index_shows_only_visible_posts() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let open = app.category("open", true).await;
    let closed = app.category("closed", false).await;

    app.post_by(&author, "Visible post", -1, open).await;
    app.post_by(&author, "Tomorrow post", 24, open).await;
    app.post_by(&author, "Hidden category post", -1, closed).await;
    let draft = app.post_by(&author, "Draft post", -1, open).await;
    app.state
        .post_service
        .update(
            draft.id,
            PostInput {
                is_published: false,
                ..PostInput::from_post(&draft)
            },
        )
        .await
        .unwrap();

    let response = app.get("/", None).await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Visible post"));
    assert!(!html.contains("Tomorrow post"));
    assert!(!html.contains("Hidden category post"));
    assert!(!html.contains("Draft post"));
    assert_eq!(count_cards(&html), 1);
}

#[tokio::test]
async fn test_index_paginates_by_ten() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    for i in 0..12 {
        app.post_by(&author, &format!("Post {}", i), -1 - i, category)
            .await;
    }

    let first = app.get("/", None).await.text();
    assert_eq!(count_cards(&first), 10);
    // newest first
    assert!(first.contains("Post 0"));
    assert!(!first.contains("Post 11<"));

    let second = app.get("/?page=2", None).await.text();
    assert_eq!(count_cards(&second), 2);
    assert!(second.contains("Post 11"));

    let below = app.get("/?page=0", None).await;
    below.assert_status_ok();
    assert_eq!(count_cards(&below.text()), 0);
}

#[tokio::test]
async fn test_scheduled_post_only_on_own_profile() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let reader = app.account("reader").await;
    let category = app.category("travel", true).await;
    app.post_by(&author, "Future trip", 24, category).await;

    assert!(!app.get("/", None).await.text().contains("Future trip"));

    let own = app.get("/profile/author/", Some(&author)).await;
    own.assert_status_ok();
    assert!(own.text().contains("Future trip"));

    let other = app.get("/profile/author/", Some(&reader)).await;
    other.assert_status_ok();
    assert!(!other.text().contains("Future trip"));

    app.get("/profile/nobody/", None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unpublished_category_is_gated() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let reader = app.account("reader").await;
    let category = app.category("secret", true).await;
    let post = app.post_by(&author, "Secret post", -1, category).await;

    app.get("/category/secret/", None).await.assert_status_ok();

    app.state
        .category_service
        .update(
            category,
            CategoryInput {
                title: "Secret".to_string(),
                description: "Hidden now".to_string(),
                slug: "secret".to_string(),
                is_published: false,
            },
        )
        .await
        .unwrap();

    let gated = app.get("/category/secret/", None).await;
    gated.assert_status(StatusCode::NOT_FOUND);
    assert!(gated.text().contains("Page not found"));
    assert!(!app.get("/", None).await.text().contains("Secret post"));

    let path = format!("/posts/{}/", post.id);
    app.get(&path, Some(&author)).await.assert_status_ok();
    app.get(&path, Some(&reader))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.get(&path, None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_detail_escapes_and_breaks_lines() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    let post = app.post_by(&author, "<b>Bold</b>", -1, category).await;

    let html = app
        .get(&format!("/posts/{}/", post.id), None)
        .await
        .text();
    assert!(html.contains("&lt;b&gt;Bold&lt;&#x2F;b&gt;") || html.contains("&lt;b&gt;Bold"));
    assert!(html.contains("Line one<br>Line two"));
}

#[tokio::test]
async fn test_login_required_pages_redirect() {
    let app = TestApp::new().await;

    let response = app.get("/posts/create/", None).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=%2Fposts%2Fcreate%2F");

    let response = app.get("/profile/edit/", None).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/?next="));
}

#[tokio::test]
async fn test_create_post_with_image() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    let place = app.location("Sochi").await;

    let form = post_form("By the sea", category, place).add_part(
        "image",
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("sea.png")
            .mime_type("image/png"),
    );
    let response = app
        .post("/posts/create/", Some(&author))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/author/");

    let page = app
        .state
        .post_service
        .list_profile(&author.user, Some(&author.user), &ListParams::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let post = &page.items[0].post;
    assert_eq!(post.title, "By the sea");
    assert_eq!(post.author_id, author.user.id);
    let image = post.image.as_deref().expect("image stored");
    assert!(image.starts_with("post_image/") && image.ends_with(".png"));
    assert!(app.media.path().join(image).exists());
}

#[tokio::test]
async fn test_create_post_rerenders_on_errors() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    let place = app.location("Sochi").await;

    let form = post_form("", category, place).add_part(
        "image",
        Part::bytes(b"not an image".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain"),
    );
    let response = app
        .post("/posts/create/", Some(&author))
        .multipart(form)
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("class=\"errors\""));
    assert_eq!(app.state.post_service.count().await.unwrap(), 0);
}

fn stored_images(app: &TestApp) -> usize {
    std::fs::read_dir(app.media.path().join(POST_IMAGE_DIR))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_rejected_post_form_stores_no_image() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    let place = app.location("Sochi").await;
    let png = || {
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("sea.png")
            .mime_type("image/png")
    };

    let response = app
        .post("/posts/create/", Some(&author))
        .multipart(post_form("By the sea", 9999, place).add_part("image", png()))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("class=\"errors\""));
    assert_eq!(app.state.post_service.count().await.unwrap(), 0);
    assert_eq!(stored_images(&app), 0);

    let post = app.post_by(&author, "Original", -1, category).await;
    let response = app
        .post(&format!("/posts/{}/edit/", post.id), Some(&author))
        .multipart(post_form("Edited", category, 9999).add_part("image", png()))
        .await;
    response.assert_status_ok();
    assert_eq!(stored_images(&app), 0);
    let unchanged = app.state.post_service.get(post.id).await.unwrap();
    assert_eq!(unchanged.post.title, "Original");
}

#[tokio::test]
async fn test_non_author_cannot_edit_or_delete() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let intruder = app.account("intruder").await;
    let category = app.category("travel", true).await;
    let place = app.location("Sochi").await;
    let post = app.post_by(&author, "Original", -1, category).await;
    let detail = format!("/posts/{}/", post.id);

    for account in [Some(&intruder), None] {
        let response = app
            .post(&format!("/posts/{}/edit/", post.id), account)
            .multipart(post_form("Hijacked", category, place))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), detail);

        let response = app
            .post(&format!("/posts/{}/delete/", post.id), account)
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), detail);

        let response = app.get(&format!("/posts/{}/edit/", post.id), account).await;
        response.assert_status(StatusCode::SEE_OTHER);
    }

    let stored = app.state.post_service.get(post.id).await.unwrap();
    assert_eq!(stored.post.title, "Original");
}

#[tokio::test]
async fn test_author_edits_and_deletes_post() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let category = app.category("travel", true).await;
    let place = app.location("Sochi").await;
    let post = app.post_by(&author, "Original", -1, category).await;

    let page = app
        .get(&format!("/posts/{}/edit/", post.id), Some(&author))
        .await;
    page.assert_status_ok();
    assert!(page.text().contains("Original"));

    let response = app
        .post(&format!("/posts/{}/edit/", post.id), Some(&author))
        .multipart(post_form("Renamed", category, place))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}/", post.id));
    let stored = app.state.post_service.get(post.id).await.unwrap();
    assert_eq!(stored.post.title, "Renamed");
    assert_eq!(stored.post.location_id, Some(place));

    let response = app
        .post(&format!("/posts/{}/delete/", post.id), Some(&author))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/author/");
    app.get(&format!("/posts/{}/", post.id), Some(&author))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = TestApp::new().await;
    let author = app.account("author").await;
    let reader = app.account("reader").await;
    let category = app.category("travel", true).await;
    let post = app.post_by(&author, "Discuss me", -1, category).await;
    let other = app.post_by(&author, "Other post", -1, category).await;
    let detail = format!("/posts/{}/", post.id);

    let response = app
        .post(&format!("/posts/{}/comment/", post.id), None)
        .form(&[("text", "anonymous")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/"));

    let empty = app
        .post(&format!("/posts/{}/comment/", post.id), Some(&reader))
        .form(&[("text", "   ")])
        .await;
    empty.assert_status_ok();
    assert!(empty.text().contains("class=\"errors\""));

    for text in ["First!", "Second", "Third"] {
        let response = app
            .post(&format!("/posts/{}/comment/", post.id), Some(&reader))
            .form(&[("text", text)])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), detail);
    }
    let comments = app.state.comment_service.list_by_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 3);
    let second = comments[1].comment.id;

    // the post author does not own the comment
    let response = app
        .post(
            &format!("/posts/{}/edit_comment/{}/", post.id, second),
            Some(&author),
        )
        .form(&[("text", "changed")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), detail);

    app.get(
        &format!("/posts/{}/edit_comment/{}/", other.id, second),
        Some(&reader),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);

    let response = app
        .post(
            &format!("/posts/{}/edit_comment/{}/", post.id, second),
            Some(&reader),
        )
        .form(&[("text", "Second, edited")])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let response = app
        .post(
            &format!("/posts/{}/delete_comment/{}/", post.id, comments[0].comment.id),
            Some(&reader),
        )
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let texts: Vec<String> = app
        .state
        .comment_service
        .list_by_post(post.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.comment.text)
        .collect();
    assert_eq!(texts, vec!["Second, edited", "Third"]);

    let html = app.get(&detail, None).await.text();
    assert!(html.contains("Second, edited"));
    assert!(!html.contains("First!"));
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new().await;
    app.account("taken").await;

    let cases = [
        ("newbie", "correct-horse-9", "different-horse", "password2"),
        ("newbie", "short", "short", "password2"),
        ("newbie", "1234567890", "1234567890", "password2"),
        ("taken", PASSWORD, PASSWORD, "username"),
    ];
    for (username, password1, password2, _field) in cases {
        let response = app
            .post("/auth/registration/", None)
            .form(&[
                ("username", username),
                ("password1", password1),
                ("password2", password2),
            ])
            .await;
        response.assert_status_ok();
        assert!(
            response.text().contains("class=\"errors\""),
            "no errors shown for {} / {}",
            username,
            password1
        );
    }
    assert!(app
        .state
        .user_service
        .get_by_username("newbie")
        .await
        .unwrap()
        .is_none());

    let response = app
        .post("/auth/registration/", None)
        .form(&[
            ("username", "newbie"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/");
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new().await;
    app.account("walker").await;

    let bad = app
        .post("/auth/login/", None)
        .form(&[("username", "walker"), ("password", "wrong-password")])
        .await;
    bad.assert_status_ok();
    assert!(bad.text().contains("class=\"errors\""));
    assert!(bad.headers().get(header::SET_COOKIE).is_none());

    let good = app
        .post("/auth/login/?next=/pages/rules/", None)
        .form(&[("username", "walker"), ("password", PASSWORD)])
        .await;
    good.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&good), "/pages/rules/");
    let set_cookie = good
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("sessionid="));
    let cookie = HeaderValue::from_str(set_cookie.split(';').next().unwrap()).unwrap();

    let offsite = app
        .post("/auth/login/", None)
        .form(&[
            ("username", "walker"),
            ("password", PASSWORD),
            ("next", "//evil.example/"),
        ])
        .await;
    assert_eq!(location(&offsite), "/");

    app.server
        .get("/posts/create/")
        .add_header(header::COOKIE, cookie.clone())
        .await
        .assert_status_ok();

    let logout = app
        .server
        .post("/auth/logout/")
        .add_header(header::COOKIE, cookie.clone())
        .await;
    logout.assert_status_ok();
    assert!(logout.text().contains("Logged out"));

    app.server
        .get("/posts/create/")
        .add_header(header::COOKIE, cookie)
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_password_change() {
    let app = TestApp::new().await;
    let account = app.account("walker").await;

    let wrong = app
        .post("/auth/password_change/", Some(&account))
        .form(&[
            ("old_password", "not-my-password"),
            ("new_password1", "brand-new-secret"),
            ("new_password2", "brand-new-secret"),
        ])
        .await;
    wrong.assert_status_ok();
    assert!(wrong.text().contains("class=\"errors\""));

    let done = app
        .post("/auth/password_change/", Some(&account))
        .form(&[
            ("old_password", PASSWORD),
            ("new_password1", "brand-new-secret"),
            ("new_password2", "brand-new-secret"),
        ])
        .await;
    done.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&done), "/auth/password_change/done/");
    assert!(done.headers().get(header::SET_COOKIE).is_some());

    assert!(app
        .state
        .user_service
        .login(LoginInput::new("walker", "brand-new-secret"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_profile_edit() {
    let app = TestApp::new().await;
    let account = app.account("walker").await;
    app.account("runner").await;

    let page = app.get("/profile/edit/", Some(&account)).await;
    page.assert_status_ok();
    assert!(page.text().contains("value=\"walker\""));

    let taken = app
        .post("/profile/edit/", Some(&account))
        .form(&[
            ("username", "runner"),
            ("first_name", ""),
            ("last_name", ""),
            ("email", ""),
        ])
        .await;
    taken.assert_status_ok();
    assert!(taken.text().contains("already exists"));

    let response = app
        .post("/profile/edit/", Some(&account))
        .form(&[
            ("username", "wanderer"),
            ("first_name", "Leo"),
            ("last_name", "Tolstoy"),
            ("email", "leo@example.com"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/wanderer/");
    assert!(app
        .get("/profile/wanderer/", None)
        .await
        .text()
        .contains("Leo Tolstoy"));
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let app = TestApp::new().await;
    let admin = app.account("admin").await;
    let member = app.account("member").await;
    assert!(admin.user.is_staff);
    assert!(!member.user.is_staff);

    let response = app.get("/admin/", None).await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login/"));

    let forbidden = app.get("/admin/posts/", Some(&member)).await;
    forbidden.assert_status(StatusCode::FORBIDDEN);
    assert!(forbidden.text().contains("Access denied"));

    app.get("/admin/", Some(&admin)).await.assert_status_ok();
}

#[tokio::test]
async fn test_admin_manages_categories_and_posts() {
    let app = TestApp::new().await;
    let admin = app.account("admin").await;
    let author = app.account("author").await;

    let response = app
        .post("/admin/categories/add/", Some(&admin))
        .form(&[
            ("title", "Travel"),
            ("description", "Trips"),
            ("slug", "travel"),
            ("is_published", "on"),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let duplicate = app
        .post("/admin/categories/add/", Some(&admin))
        .form(&[("title", "Again"), ("description", "Trips"), ("slug", "travel")])
        .await;
    duplicate.assert_status_ok();
    assert!(duplicate.text().contains("already exists"));

    let category = app
        .state
        .category_service
        .get_published_by_slug("travel")
        .await
        .unwrap();
    let visible = app.post_by(&author, "Shown post", -1, category.id).await;
    app.post_by(&author, "Later post", 48, category.id).await;

    let published = app
        .get("/admin/posts/?is_published=published", Some(&admin))
        .await
        .text();
    assert!(published.contains("Shown post"));
    assert!(!published.contains("Later post"));

    let hidden = app
        .get("/admin/posts/?is_published=not_published", Some(&admin))
        .await
        .text();
    assert!(hidden.contains("Later post"));
    assert!(!hidden.contains("Shown post"));

    let search = app
        .get(&format!("/admin/posts/?q={}", visible.id), Some(&admin))
        .await
        .text();
    assert!(search.contains("Shown post"));

    let response = app
        .post(&format!("/admin/posts/{}/change/", visible.id), Some(&admin))
        .form(&[
            ("title", "Shown post"),
            ("text", "Edited by staff"),
            ("pub_date", "2024-05-01T10:30"),
            ("category", category.id.to_string().as_str()),
            ("location", ""),
        ])
        .await;
    // location is required
    response.assert_status_ok();

    let place = app.location("Kazan").await;
    let response = app
        .post(&format!("/admin/posts/{}/change/", visible.id), Some(&admin))
        .form(&[
            ("title", "Shown post"),
            ("text", "Edited by staff"),
            ("pub_date", "2024-05-01T10:30"),
            ("category", category.id.to_string().as_str()),
            ("location", place.to_string().as_str()),
        ])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let stored = app.state.post_service.get(visible.id).await.unwrap();
    assert!(!stored.post.is_published);
    assert_eq!(stored.post.author_id, author.user.id);

    let response = app
        .post(
            &format!("/admin/categories/{}/delete/", category.id),
            Some(&admin),
        )
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let orphan = app.state.post_service.get(visible.id).await.unwrap();
    assert_eq!(orphan.post.category_id, None);
}

#[tokio::test]
async fn test_unknown_routes_and_bad_ids_are_not_found() {
    let app = TestApp::new().await;

    for path in ["/nowhere/", "/posts/abc/", "/posts/999/", "/category/missing/"] {
        let response = app.get(path, None).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("Page not found"), "{}", path);
    }
}

#[tokio::test]
async fn test_static_pages_and_assets() {
    let app = TestApp::new().await;

    let about = app.get("/pages/about/", None).await;
    about.assert_status_ok();
    assert!(about.text().contains("About"));
    app.get("/pages/rules/", None).await.assert_status_ok();

    let css = app.get("/static/css/style.css", None).await;
    css.assert_status_ok();
    assert_eq!(
        css.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );
    app.get("/static/css/missing.css", None)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
