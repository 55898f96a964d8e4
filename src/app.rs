use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Settings;
use crate::handlers::{
    character_handlers, comment_handlers, image_handlers, post_handlers, session_handlers,
    AppState, AppStateInner,
};
use crate::models::{
    CleanupResponse, Character, Comment, CommentForm, Post, PostForm, Session,
    UpdateSessionRequest,
};
use crate::repository::{
    Database, SqliteCommentRepository, SqlitePostRepository, SqliteSessionRepository,
};
use crate::services::{
    AvatarPipeline, Clock, CommentService, HttpClientService, PostService, RickAndMortyClient,
    SessionService,
};
use crate::storage::ObjectStore;

/// Multipart uploads are capped at 32 MiB.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        session_handlers::create_session,
        session_handlers::get_session,
        session_handlers::update_session,
        session_handlers::delete_session,
        session_handlers::cleanup_sessions,
        session_handlers::logout,
        character_handlers::random_character,
        character_handlers::list_characters,
        character_handlers::health,
        post_handlers::create_post,
        post_handlers::list_posts,
        post_handlers::list_posts_by_author,
        post_handlers::get_post,
        post_handlers::update_post,
        post_handlers::delete_post,
        post_handlers::archive_post,
        post_handlers::unarchive_post,
        comment_handlers::create_comment,
        comment_handlers::list_comments_by_post,
        comment_handlers::get_comment,
        comment_handlers::update_comment,
        comment_handlers::delete_comment,
        image_handlers::serve_image,
    ),
    components(schemas(
        Session,
        UpdateSessionRequest,
        CleanupResponse,
        Character,
        Post,
        PostForm,
        Comment,
        CommentForm,
    )),
    tags(
        (name = "Sessions", description = "Anonymous, time-boxed identities"),
        (name = "Characters", description = "External character catalog"),
        (name = "Posts", description = "Threads"),
        (name = "Comments", description = "Replies to posts"),
        (name = "Images", description = "Stored attachments and avatars"),
        (name = "Health", description = "Liveness")
    ),
    info(
        title = "Anonymous Board API",
        description = "Anonymous forum backend with character-based sessions"
    )
)]
pub struct ApiDoc;

/// Wires repositories, the catalog client and services on top of an open
/// database and object store.
pub fn build_state(
    settings: &Settings,
    db: Database,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let http = HttpClientService::new();
    let characters = Arc::new(RickAndMortyClient::new(http.clone(), &settings.catalog));

    let session_repo = Arc::new(SqliteSessionRepository::new(db.clone()));
    let post_repo = Arc::new(SqlitePostRepository::new(db.clone()));
    let comment_repo = Arc::new(SqliteCommentRepository::new(db));

    let avatars = AvatarPipeline::new(Arc::new(http), store.clone());
    let sessions = SessionService::new(
        session_repo,
        characters.clone(),
        avatars,
        clock.clone(),
        Duration::hours(settings.session.ttl_hours),
    );
    let posts = PostService::new(
        post_repo.clone(),
        comment_repo.clone(),
        store.clone(),
        clock.clone(),
        Duration::minutes(settings.posts.ttl_minutes),
    );
    let comments = CommentService::new(comment_repo, post_repo, store.clone(), clock);

    Arc::new(AppStateInner {
        sessions,
        posts,
        comments,
        characters,
        store,
    })
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(allowed_origin, "invalid CORS origin, cross-origin requests disabled");
            cors
        }
    }
}

pub fn build_router(state: AppState, allowed_origin: &str) -> Router {
    let api = Router::new()
        .route("/api/health", get(character_handlers::health))
        .route("/api/sessions", post(session_handlers::create_session))
        .route("/api/sessions/cleanup", post(session_handlers::cleanup_sessions))
        .route("/api/sessions/logout", post(session_handlers::logout))
        .route(
            "/api/sessions/:id",
            get(session_handlers::get_session)
                .put(session_handlers::update_session)
                .delete(session_handlers::delete_session),
        )
        .route("/api/characters", get(character_handlers::list_characters))
        .route("/api/characters/random", get(character_handlers::random_character))
        .route(
            "/api/posts",
            get(post_handlers::list_posts).post(post_handlers::create_post),
        )
        .route("/api/posts/author", get(post_handlers::list_posts_by_author))
        .route(
            "/api/posts/:id",
            get(post_handlers::get_post)
                .put(post_handlers::update_post)
                .delete(post_handlers::delete_post),
        )
        .route("/api/posts/:id/archive", post(post_handlers::archive_post))
        .route("/api/posts/:id/unarchive", post(post_handlers::unarchive_post))
        .route("/api/comments", post(comment_handlers::create_comment))
        .route("/api/comments/post", get(comment_handlers::list_comments_by_post))
        .route(
            "/api/comments/:id",
            get(comment_handlers::get_comment)
                .put(comment_handlers::update_comment)
                .delete(comment_handlers::delete_comment),
        )
        .route("/images/:partition/:name", get(image_handlers::serve_image));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origin))
}
