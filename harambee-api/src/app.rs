/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use harambee_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = harambee_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use harambee_shared::{
    auth::{jwt, middleware::AuthContext},
    models::user::User,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/                             # API v1 (versioned)
///     ├── /auth/                       # register, login, refresh (public)
///     ├── /users/me                    # Profile, password, preferences, notifications
///     ├── /clubs/                      # Clubs and everything nested in them:
///     │   └── /:club_id/
///     │       ├── /members             # Roster, roles
///     │       ├── /join-requests       # Submit and decide join requests
///     │       ├── /logs                # Club activity log
///     │       ├── /communities/        # Sub-groups with tasks, chat, polls
///     │       ├── /topics/             # Forum
///     │       ├── /knowledge-base/     # Versioned articles
///     │       ├── /goals/              # Simple club goals
///     │       └── /tasks               # Club-scoped task listing
///     ├── /tasks/                      # Top-level tasks (personal + club)
///     ├── /enhanced-tasks/             # Rich tasks: checklist, comments, time, deps
///     ├── /goals/                      # Planning hierarchy (goals → objectives → KRs)
///     ├── /objectives/                 # Objective + key result operations
///     └── /admin/                      # Site administration (admin role)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. Authentication (per-group JWT layer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public: no auth required
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let user_routes = Router::new()
        .route("/me", get(routes::users::get_profile))
        .route("/me", put(routes::users::update_profile))
        .route("/me/password", put(routes::users::change_password))
        .route("/me/preferences", put(routes::users::update_preferences))
        .route("/me/notifications", get(routes::users::list_notifications))
        .route(
            "/me/notifications/:id/read",
            put(routes::users::mark_notification_read),
        );

    let club_routes = Router::new()
        .route("/", get(routes::clubs::list_clubs))
        .route("/", post(routes::clubs::create_club))
        .route("/mine", get(routes::clubs::list_my_clubs))
        .route("/:club_id", get(routes::clubs::get_club))
        .route("/:club_id", put(routes::clubs::update_club))
        .route("/:club_id", delete(routes::clubs::delete_club))
        .route("/:club_id/logs", get(routes::clubs::list_logs))
        // Roster
        .route("/:club_id/members", get(routes::members::list_members))
        .route(
            "/:club_id/members/:user_id/role",
            put(routes::members::change_role),
        )
        .route(
            "/:club_id/members/:user_id",
            delete(routes::members::remove_member),
        )
        // Join requests
        .route(
            "/:club_id/join-requests",
            post(routes::members::submit_join_request),
        )
        .route(
            "/:club_id/join-requests",
            get(routes::members::list_join_requests),
        )
        .route(
            "/:club_id/join-requests/:request_id/approve",
            post(routes::members::approve_join_request),
        )
        .route(
            "/:club_id/join-requests/:request_id/reject",
            post(routes::members::reject_join_request),
        )
        // Communities
        .route(
            "/:club_id/communities",
            get(routes::communities::list_communities),
        )
        .route(
            "/:club_id/communities",
            post(routes::communities::create_community),
        )
        .route(
            "/:club_id/communities/:community_id",
            get(routes::communities::get_community),
        )
        .route(
            "/:club_id/communities/:community_id",
            delete(routes::communities::delete_community),
        )
        .route(
            "/:club_id/communities/:community_id/approve",
            post(routes::communities::approve_community),
        )
        .route(
            "/:club_id/communities/:community_id/reject",
            post(routes::communities::reject_community),
        )
        .route(
            "/:club_id/communities/:community_id/archive",
            post(routes::communities::archive_community),
        )
        .route(
            "/:club_id/communities/:community_id/unarchive",
            post(routes::communities::unarchive_community),
        )
        .route(
            "/:club_id/communities/:community_id/join",
            post(routes::communities::join_community),
        )
        .route(
            "/:club_id/communities/:community_id/leave",
            post(routes::communities::leave_community),
        )
        .route(
            "/:club_id/communities/:community_id/members",
            get(routes::communities::list_community_members),
        )
        // Community tasks
        .route(
            "/:club_id/communities/:community_id/tasks",
            get(routes::communities::list_tasks),
        )
        .route(
            "/:club_id/communities/:community_id/tasks",
            post(routes::communities::create_task),
        )
        .route(
            "/:club_id/communities/:community_id/tasks/:task_id",
            put(routes::communities::update_task),
        )
        .route(
            "/:club_id/communities/:community_id/tasks/:task_id",
            delete(routes::communities::delete_task),
        )
        // Chat
        .route(
            "/:club_id/communities/:community_id/chat",
            get(routes::communities::list_chat),
        )
        .route(
            "/:club_id/communities/:community_id/chat",
            post(routes::communities::post_chat_message),
        )
        // Polls
        .route(
            "/:club_id/communities/:community_id/polls",
            get(routes::polls::list_polls),
        )
        .route(
            "/:club_id/communities/:community_id/polls",
            post(routes::polls::create_poll),
        )
        .route(
            "/:club_id/communities/:community_id/polls/:poll_id",
            get(routes::polls::get_poll),
        )
        .route(
            "/:club_id/communities/:community_id/polls/:poll_id/vote",
            post(routes::polls::vote),
        )
        .route(
            "/:club_id/communities/:community_id/polls/:poll_id/close",
            post(routes::polls::close_poll),
        )
        // Forum
        .route("/:club_id/topics", get(routes::forum::list_topics))
        .route("/:club_id/topics", post(routes::forum::create_topic))
        .route("/:club_id/topics/:topic_id", get(routes::forum::get_topic))
        .route("/:club_id/topics/:topic_id", put(routes::forum::update_topic))
        .route(
            "/:club_id/topics/:topic_id",
            delete(routes::forum::delete_topic),
        )
        .route(
            "/:club_id/topics/:topic_id/replies",
            post(routes::forum::create_reply),
        )
        .route(
            "/:club_id/topics/:topic_id/replies/:reply_id",
            delete(routes::forum::delete_reply),
        )
        // Knowledge base
        .route(
            "/:club_id/knowledge-base",
            get(routes::knowledge::list_articles),
        )
        .route(
            "/:club_id/knowledge-base",
            post(routes::knowledge::create_article),
        )
        .route(
            "/:club_id/knowledge-base/:article_id",
            get(routes::knowledge::get_article),
        )
        .route(
            "/:club_id/knowledge-base/:article_id",
            put(routes::knowledge::update_article),
        )
        .route(
            "/:club_id/knowledge-base/:article_id",
            delete(routes::knowledge::delete_article),
        )
        // Simple club goals
        .route("/:club_id/goals", get(routes::club_goals::list_goals))
        .route("/:club_id/goals", post(routes::club_goals::create_goal))
        .route(
            "/:club_id/goals/:goal_id",
            put(routes::club_goals::update_goal),
        )
        .route(
            "/:club_id/goals/:goal_id",
            delete(routes::club_goals::delete_goal),
        )
        // Club-scoped task listing
        .route("/:club_id/tasks", get(routes::tasks::list_club_tasks));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:task_id", get(routes::tasks::get_task))
        .route("/:task_id", put(routes::tasks::update_task))
        .route("/:task_id", delete(routes::tasks::delete_task))
        .route("/:task_id/assignees", put(routes::tasks::set_assignees));

    let enhanced_task_routes = Router::new()
        .route("/", get(routes::enhanced_tasks::list_tasks))
        .route("/", post(routes::enhanced_tasks::create_task))
        .route("/:task_id", get(routes::enhanced_tasks::get_task))
        .route("/:task_id", put(routes::enhanced_tasks::update_task))
        .route("/:task_id", delete(routes::enhanced_tasks::delete_task))
        .route(
            "/:task_id/progress",
            put(routes::enhanced_tasks::update_progress),
        )
        .route(
            "/:task_id/comments",
            get(routes::enhanced_tasks::list_comments),
        )
        .route(
            "/:task_id/comments",
            post(routes::enhanced_tasks::add_comment),
        )
        .route(
            "/:task_id/time-log",
            get(routes::enhanced_tasks::list_time_entries),
        )
        .route("/:task_id/time-log", post(routes::enhanced_tasks::log_time))
        .route(
            "/:task_id/checklist",
            post(routes::enhanced_tasks::add_checklist_item),
        )
        .route(
            "/:task_id/checklist/:item_id/toggle",
            put(routes::enhanced_tasks::toggle_checklist_item),
        )
        .route(
            "/:task_id/dependencies",
            get(routes::enhanced_tasks::list_dependencies),
        )
        .route(
            "/:task_id/dependencies",
            post(routes::enhanced_tasks::add_dependency),
        )
        .route(
            "/:task_id/dependencies/:depends_on_id",
            delete(routes::enhanced_tasks::remove_dependency),
        );

    let goal_routes = Router::new()
        .route("/", get(routes::goals::list_goals))
        .route("/", post(routes::goals::create_goal))
        .route("/:goal_id", get(routes::goals::get_goal))
        .route("/:goal_id", put(routes::goals::update_goal))
        .route("/:goal_id", delete(routes::goals::delete_goal))
        .route("/:goal_id/objectives", get(routes::goals::list_objectives))
        .route("/:goal_id/objectives", post(routes::goals::create_objective))
        .route("/:goal_id/activity", get(routes::goals::list_activity));

    let objective_routes = Router::new()
        .route("/:objective_id", get(routes::goals::get_objective))
        .route("/:objective_id", put(routes::goals::update_objective))
        .route("/:objective_id", delete(routes::goals::delete_objective))
        .route(
            "/:objective_id/key-results",
            get(routes::goals::list_key_results),
        )
        .route(
            "/:objective_id/key-results",
            post(routes::goals::create_key_result),
        )
        .route(
            "/:objective_id/key-results/:key_result_id",
            put(routes::goals::update_key_result),
        )
        .route(
            "/:objective_id/key-results/:key_result_id",
            delete(routes::goals::delete_key_result),
        );

    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:user_id/block", put(routes::admin::block_user))
        .route("/users/:user_id/unblock", put(routes::admin::unblock_user))
        .route("/users/:user_id/role", put(routes::admin::change_user_role))
        .route("/users/:user_id", delete(routes::admin::delete_user))
        .route("/clubs", get(routes::admin::list_clubs_by_status))
        .route("/clubs/:club_id/approve", post(routes::admin::approve_club))
        .route("/clubs/:club_id/reject", post(routes::admin::reject_club))
        .route("/stats", get(routes::admin::stats));

    // Everything except /health and /v1/auth requires a valid token
    let authed = Router::new()
        .nest("/users", user_routes)
        .nest("/clubs", club_routes)
        .nest("/tasks", task_routes)
        .nest("/enhanced-tasks", enhanced_task_routes)
        .nest("/goals", goal_routes)
        .nest("/objectives", objective_routes)
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(authed);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the Bearer token, resolves the account, and injects an
/// `AuthContext` into request extensions. Blocked accounts are rejected
/// here with 403 even if their token is otherwise valid, and the context's
/// role comes from the database rather than the token so a role change
/// takes effect without re-login.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use crate::error::ApiError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if user.is_blocked {
        return Err(ApiError::Forbidden("Account is blocked".to_string()));
    }

    let auth_context = AuthContext {
        user_id: user.id,
        email: user.email,
        role: user.role,
    };

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
