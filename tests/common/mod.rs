#![allow(dead_code)]

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{redirect, Client, Url};
use tempfile::TempDir;

use warbler::auth::{identity, session};
use warbler::config::Config;
use warbler::db;
use warbler::social::engagement;
use warbler::state::{AppState, DbPool};

pub const PASSWORD: &str = "password";

/// A running server on an ephemeral port, backed by a throwaway database.
pub struct TestApp {
    pub base_url: String,
    pub pool: DbPool,
    pub config: Config,
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database.path = Some(dir.path().join("warbler_test.db"));
    config.auth.password_cost = 4;

    let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
    db::drop_all(&pool).unwrap();
    db::run_migrations(&pool).expect("Failed to run migrations");

    let app = warbler::routes::app(AppState {
        db: pool.clone(),
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        pool,
        config,
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Client that reports redirects instead of following them.
    pub fn client(&self) -> Client {
        Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap()
    }

    /// Client that follows redirects, like a browser.
    pub fn browser(&self) -> Client {
        Client::builder().cookie_store(true).build().unwrap()
    }

    /// Browser already signed in as `user_id`.
    pub fn browser_as(&self, user_id: i64) -> Client {
        let token = {
            let conn = self.pool.get().unwrap();
            session::create_session(&conn, user_id, self.config.auth.session_hours).unwrap()
        };
        let jar = Jar::default();
        let url: Url = self.base_url.parse().unwrap();
        jar.add_cookie_str(
            &format!("{}={}; Path=/", self.config.auth.cookie_name, token),
            &url,
        );
        Client::builder()
            .cookie_provider(Arc::new(jar))
            .build()
            .unwrap()
    }

    pub fn seed_user(&self, username: &str) -> i64 {
        let new_user = identity::signup(
            username,
            &format!("{}@gmail.com", username),
            PASSWORD,
            None,
            self.config.auth.password_cost,
        )
        .unwrap();
        let conn = self.pool.get().unwrap();
        new_user.insert(&conn).unwrap().id
    }

    pub fn seed_message(&self, user_id: i64, text: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        engagement::create_message(&conn, user_id, text).unwrap().id
    }

    pub fn session_count(&self, user_id: i64) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    pub fn like_count(&self, user_id: i64) -> i64 {
        let conn = self.pool.get().unwrap();
        engagement::like_count(&conn, user_id).unwrap()
    }
}

/// Four users; user1 wrote msgs 1 and 2, user2 wrote msgs 3 and 4.
pub struct Fixture {
    pub app: TestApp,
    pub users: [i64; 4],
    pub msgs: [i64; 4],
}

pub async fn fixture() -> Fixture {
    let app = spawn_app().await;
    let users = [
        app.seed_user("user1"),
        app.seed_user("user2"),
        app.seed_user("user3"),
        app.seed_user("user4"),
    ];
    let msgs = [
        app.seed_message(users[0], "thisisatest"),
        app.seed_message(users[0], "second"),
        app.seed_message(users[1], "three"),
        app.seed_message(users[1], "four"),
    ];
    Fixture { app, users, msgs }
}

impl Fixture {
    /// user3 follows user1, user4 follows user2.
    pub fn setup_follows(&self) {
        let conn = self.app.pool.get().unwrap();
        warbler::social::graph::follow(&conn, self.users[2], self.users[0]).unwrap();
        warbler::social::graph::follow(&conn, self.users[3], self.users[1]).unwrap();
    }

    /// user3 likes msg 1, user4 likes msg 2.
    pub fn setup_likes(&self) {
        let conn = self.app.pool.get().unwrap();
        engagement::add_like(&conn, self.users[2], self.msgs[0]).unwrap();
        engagement::add_like(&conn, self.users[3], self.msgs[1]).unwrap();
    }
}
