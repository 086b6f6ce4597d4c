use crate::handlers::{auth, chat, community, insights, journal, pages};
use crate::state::AppState;
use axum::{routing::{get, post}, Router};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/signup", post(pages::signup))
        .route("/login/anonymous", post(pages::login_anonymously))
        .route("/logout", post(pages::logout))
        .route("/journal", post(pages::journal_form))
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/login", post(auth::sign_in))
        .route("/api/auth/anonymous", post(auth::sign_in_anonymously))
        .route("/api/auth/oauth/:provider", get(auth::sign_in_with_oauth))
        .route("/api/auth/logout", post(auth::sign_out))
        .route("/api/me", get(auth::me))
        .route("/api/journal", get(journal::list_entries).post(journal::create_entry))
        .route("/api/dashboard", get(insights::dashboard))
        .route("/api/analysis", get(insights::analysis))
        .route("/api/predict-sentiment", post(insights::predict_sentiment))
        .route("/api/community/posts", get(community::list_posts).post(community::create_post))
        .route("/api/community/posts/:post_id/like", post(community::like_post))
        .route("/api/community/posts/:post_id/comments", post(community::add_comment))
        .route("/api/presence", post(chat::heartbeat))
        .route("/api/chat/users", get(chat::list_users))
        .route("/api/chat/:peer/messages", get(chat::list_messages).post(chat::send_message))
        .route("/api/chat/:peer/stream", get(chat::stream_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
