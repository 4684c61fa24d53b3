/// HTTP tests for the page views. Each test spawns the full router on an
/// ephemeral port with its own database.
mod common;

use common::{fixture, spawn_app, PASSWORD};

const SIGNUP_LINK: &str = r#"<a href="/signup" class="btn btn-primary">Sign up</a>"#;
const USER_FORM: &str = r#"<form method="POST" id="user_form">"#;

#[tokio::test]
async fn root_shows_signup_call_to_action() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(SIGNUP_LINK));
}

#[tokio::test]
async fn signup_page_renders() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/signup")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"<h2 class="join-message">Join Warbler today.</h2>"#));
    assert!(html.contains(USER_FORM));
}

#[tokio::test]
async fn signup_creates_account_and_signs_in() {
    let app = spawn_app().await;
    let resp = app
        .client()
        .post(app.url("/signup"))
        .form(&[
            ("username", "newbie"),
            ("email", "newbie@gmail.com"),
            ("password", PASSWORD),
            ("image_url", ""),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers()["location"], "/");
    assert!(resp.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .starts_with("warbler_session="));
}

#[tokio::test]
async fn signup_with_taken_username_rerenders_form() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .post(f.app.url("/signup"))
        .form(&[
            ("username", "user1"),
            ("email", "someone@gmail.com"),
            ("password", PASSWORD),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("Username already taken"));
    assert!(html.contains(USER_FORM));
}

#[tokio::test]
async fn login_page_renders_form() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/login")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(USER_FORM));
}

#[tokio::test]
async fn login_with_good_credentials_redirects() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .post(f.app.url("/login"))
        .form(&[("username", "user1"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 302);
}

#[tokio::test]
async fn login_with_bad_password_rerenders_form() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .post(f.app.url("/login"))
        .form(&[("username", "user1"), ("password", "wrong")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains(USER_FORM));
    assert!(html.contains("Invalid credentials."));
}

#[tokio::test]
async fn login_then_home_shows_timeline() {
    let f = fixture().await;
    let browser = f.app.browser();
    let resp = browser
        .post(f.app.url("/login"))
        .form(&[("username", "user1"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("thisisatest"));
    assert!(!html.contains(SIGNUP_LINK));
}

#[tokio::test]
async fn logging_in_again_replaces_the_old_session() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[0]);
    assert_eq!(f.app.session_count(f.users[0]), 1);

    let resp = browser
        .post(f.app.url("/login"))
        .form(&[("username", "user1"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(f.app.session_count(f.users[0]), 1);
}

#[tokio::test]
async fn signing_up_while_signed_in_ends_the_old_session() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[0]);

    browser
        .post(f.app.url("/signup"))
        .form(&[
            ("username", "newbie"),
            ("email", "newbie@gmail.com"),
            ("password", PASSWORD),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(f.app.session_count(f.users[0]), 0);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[0]);

    let resp = browser.get(f.app.url("/logout")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.url().path().ends_with("/login"));

    let resp = browser
        .get(f.app.url(&format!("/users/{}/followers", f.users[0])))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains(SIGNUP_LINK));
}

#[tokio::test]
async fn users_lists_everyone() {
    let f = fixture().await;
    let html = f
        .app
        .client()
        .get(f.app.url("/users"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    for name in ["@user1", "@user2", "@user3", "@user4"] {
        assert!(html.contains(name), "missing {name}");
    }
}

#[tokio::test]
async fn follow_buttons_only_shown_to_signed_in_viewers() {
    let f = fixture().await;
    let anonymous = f
        .app
        .client()
        .get(f.app.url("/users"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!anonymous.contains("/users/follow/"));
    assert!(!anonymous.contains("/users/stop-following/"));

    let signed_in = f
        .app
        .browser_as(f.users[0])
        .get(f.app.url("/users"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(signed_in.contains(&format!("/users/follow/{}", f.users[1])));
    assert!(!signed_in.contains(&format!("/users/follow/{}", f.users[0])));
}

#[tokio::test]
async fn user_show_lists_only_that_user() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .get(f.app.url(&format!("/users/{}", f.users[0])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("@user1"));
    assert!(!html.contains("@user2"));
    assert!(html.contains("thisisatest"));
    assert!(!html.contains("<p>three</p>"));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/users/9999")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn user_search_filters_by_username() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .get(f.app.url("/users?q=user1"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("@user1"));
    assert!(!html.contains("@user2"));
}

#[tokio::test]
async fn user_search_with_no_match_says_so() {
    let f = fixture().await;
    let html = f
        .app
        .client()
        .get(f.app.url("/users?q=nobody"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Sorry, no users found"));
}

#[tokio::test]
async fn followers_page_lists_followers() {
    let f = fixture().await;
    f.setup_follows();
    let resp = f
        .app
        .browser_as(f.users[0])
        .get(f.app.url(&format!("/users/{}/followers", f.users[0])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("@user3"));
    assert!(!html.contains("@user2"));
}

#[tokio::test]
async fn following_page_lists_followed_users() {
    let f = fixture().await;
    f.setup_follows();
    let resp = f
        .app
        .browser_as(f.users[2])
        .get(f.app.url(&format!("/users/{}/following", f.users[2])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("@user1"));
    assert!(!html.contains("@user2"));
}

#[tokio::test]
async fn following_page_requires_login() {
    let f = fixture().await;
    f.setup_follows();
    let url = f.app.url(&format!("/users/{}/following", f.users[2]));

    let resp = f.app.client().get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers()["location"], "/");

    let resp = f.app.browser().get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(SIGNUP_LINK));
}

#[tokio::test]
async fn followers_page_requires_login() {
    let f = fixture().await;
    f.setup_follows();
    let resp = f
        .app
        .browser()
        .get(f.app.url(&format!("/users/{}/followers", f.users[2])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(SIGNUP_LINK));
}

/// Anonymous requests to signed-in-only routes bounce to the landing page.
fn assert_redirects_to_landing(resp: reqwest::Response) {
    assert_eq!(resp.status(), 302);
    assert_eq!(resp.headers()["location"], "/");
}

#[tokio::test]
async fn likes_page_requires_login() {
    let f = fixture().await;
    f.setup_likes();
    let resp = f
        .app
        .client()
        .get(f.app.url(&format!("/users/{}/likes", f.users[2])))
        .send()
        .await
        .unwrap();
    assert_redirects_to_landing(resp);
}

#[tokio::test]
async fn follow_requires_login() {
    let f = fixture().await;
    let resp = f
        .app
        .client()
        .post(f.app.url(&format!("/users/follow/{}", f.users[0])))
        .send()
        .await
        .unwrap();
    assert_redirects_to_landing(resp);

    let conn = f.app.pool.get().unwrap();
    assert!(warbler::social::graph::followers(&conn, f.users[0])
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stop_following_requires_login() {
    let f = fixture().await;
    f.setup_follows();
    let resp = f
        .app
        .client()
        .post(f.app.url(&format!("/users/stop-following/{}", f.users[0])))
        .send()
        .await
        .unwrap();
    assert_redirects_to_landing(resp);

    let conn = f.app.pool.get().unwrap();
    assert_eq!(
        warbler::social::graph::followers(&conn, f.users[0]).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn new_message_page_requires_login() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/messages/new")).send().await.unwrap();
    assert_redirects_to_landing(resp);
}

#[tokio::test]
async fn likes_page_lists_liked_messages() {
    let f = fixture().await;
    f.setup_likes();
    let resp = f
        .app
        .browser_as(f.users[2])
        .get(f.app.url(&format!("/users/{}/likes", f.users[2])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains("thisisatest"));
    assert!(!html.contains("<p>second</p>"));
}

#[tokio::test]
async fn like_creates_a_like() {
    let f = fixture().await;
    let resp = f
        .app
        .browser_as(f.users[2])
        .post(f.app.url(&format!("/users/add_like/{}", f.msgs[0])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(f.app.like_count(f.users[2]), 1);
}

#[tokio::test]
async fn like_again_removes_the_like() {
    let f = fixture().await;
    f.setup_likes();
    assert_eq!(f.app.like_count(f.users[2]), 1);

    let resp = f
        .app
        .browser_as(f.users[2])
        .post(f.app.url(&format!("/users/add_like/{}", f.msgs[0])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(f.app.like_count(f.users[2]), 0);
}

#[tokio::test]
async fn like_requires_login() {
    let f = fixture().await;
    let resp = f
        .app
        .browser()
        .post(f.app.url(&format!("/users/add_like/{}", f.msgs[0])))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains(SIGNUP_LINK));
    assert_eq!(f.app.like_count(f.users[2]), 0);
}

#[tokio::test]
async fn like_of_missing_message_is_not_found() {
    let f = fixture().await;
    let resp = f
        .app
        .browser_as(f.users[2])
        .post(f.app.url("/users/add_like/9999"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn follow_and_stop_following() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[0]);
    let following_url = f.app.url(&format!("/users/{}/following", f.users[0]));

    let resp = browser
        .post(f.app.url(&format!("/users/follow/{}", f.users[3])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.url().as_str(), following_url);
    assert!(resp.text().await.unwrap().contains("@user4"));

    let resp = browser
        .post(f.app.url(&format!("/users/stop-following/{}", f.users[3])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(!resp.text().await.unwrap().contains("@user4"));
}

#[tokio::test]
async fn new_message_is_posted_and_shown() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[3]);

    let resp = browser
        .post(f.app.url("/messages/new"))
        .form(&[("text", "hello from user4")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("hello from user4"));
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let f = fixture().await;
    let text = "x".repeat(141);
    let resp = f
        .app
        .browser_as(f.users[3])
        .post(f.app.url("/messages/new"))
        .form(&[("text", text.as_str())])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp
        .text()
        .await
        .unwrap()
        .contains("Messages are limited to 140 characters."));
}

#[tokio::test]
async fn only_the_author_can_delete_a_message() {
    let f = fixture().await;
    let delete_url = f.app.url(&format!("/messages/{}/delete", f.msgs[0]));

    let resp = f
        .app
        .client()
        .post(&delete_url)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);

    f.app
        .browser_as(f.users[1])
        .post(&delete_url)
        .send()
        .await
        .unwrap();
    let resp = f
        .app
        .client()
        .get(f.app.url(&format!("/messages/{}", f.msgs[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    f.app
        .browser_as(f.users[0])
        .post(&delete_url)
        .send()
        .await
        .unwrap();
    let resp = f
        .app
        .client()
        .get(f.app.url(&format!("/messages/{}", f.msgs[0])))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn profile_edit_requires_current_password() {
    let f = fixture().await;
    let browser = f.app.browser_as(f.users[0]);
    let form = |password: &'static str| {
        [
            ("username", "user1"),
            ("email", "user1@gmail.com"),
            ("bio", "Hello, I warble."),
            ("location", "Here"),
            ("password", password),
        ]
    };

    let resp = browser
        .post(f.app.url("/users/profile"))
        .form(&form("wrong"))
        .send()
        .await
        .unwrap();
    assert!(resp.text().await.unwrap().contains("Wrong password"));

    let resp = browser
        .post(f.app.url("/users/profile"))
        .form(&form(PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("Hello, I warble."));
}

#[tokio::test]
async fn deleting_account_removes_user() {
    let f = fixture().await;
    let resp = f
        .app
        .browser_as(f.users[1])
        .post(f.app.url("/users/delete"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.url().path().ends_with("/signup"));

    let html = f
        .app
        .client()
        .get(f.app.url("/users"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!html.contains("@user2"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = spawn_app().await;
    let resp = app.client().get(app.url("/nowhere")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stylesheet_is_served() {
    let app = spawn_app().await;
    let resp = app
        .client()
        .get(app.url("/assets/css/style.css"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/css");
}

#[tokio::test]
async fn missing_asset_gets_the_not_found_page() {
    let app = spawn_app().await;
    let resp = app
        .client()
        .get(app.url("/assets/css/nope.css"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
    assert!(resp.text().await.unwrap().contains("<h1>404</h1>"));
}
