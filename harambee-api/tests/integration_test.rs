/// Integration tests for the Harambee Hub API
///
/// These tests verify the system end-to-end against a live Postgres:
/// - Registration and login
/// - Club approval workflow and visibility
/// - Join request lifecycle
/// - Task progress/status coupling
/// - Admin moderation
///
/// They are ignored by default; run with a `DATABASE_URL` pointing at a
/// disposable database:
///
/// ```text
/// cargo test -p harambee-api -- --ignored
/// ```

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use harambee_shared::models::club::{Club, ClubStatus};
use serde_json::json;
use tower::Service as _;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Health endpoint needs no token
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

/// Register then log in with the same credentials
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("signup-{}@example.com", uuid::Uuid::new_v4());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": email,
                "password": "Sup3rSecret",
                "name": "Signup Test"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let registered = body_json(response).await;
    assert!(registered["access_token"].is_string());
    assert!(registered["refresh_token"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": email,
                "password": "Sup3rSecret"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logged_in = body_json(response).await;
    assert_eq!(logged_in["user_id"], registered["user_id"]);

    ctx.cleanup().await.unwrap();
}

/// A wrong password gets the same 401 as an unknown email
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_login_rejects_bad_credentials() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "email": ctx.user.email,
                "password": "not-the-password"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Authenticated surface rejects requests without a token
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// New clubs start pending and stay out of the public listing
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_club_creation_starts_pending() {
    let ctx = TestContext::new().await.unwrap();

    let name = format!("Chess Club {}", uuid::Uuid::new_v4());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/clubs")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": name }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let club = body_json(response).await;
    assert_eq!(club["status"], "pending");

    // The public listing only shows approved clubs
    let request = Request::builder()
        .method("GET")
        .uri("/v1/clubs")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listing = body_json(response).await;
    let listed = listing
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["id"] == club["id"]);
    assert!(!listed, "pending club leaked into the public listing");

    ctx.cleanup().await.unwrap();
}

/// Approval is a single decision: the second attempt conflicts
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_club_approval_flow() {
    let ctx = TestContext::new().await.unwrap();

    let (admin, _) = ctx.create_user("moderator").await.unwrap();
    let (_, admin_token) = ctx.make_site_admin(admin.id).await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/clubs")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "name": format!("Hiking Club {}", uuid::Uuid::new_v4()) }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let club = body_json(response).await;
    let club_id: uuid::Uuid = club["id"].as_str().unwrap().parse().unwrap();

    let approve = |token: String| {
        Request::builder()
            .method("POST")
            .uri(format!("/v1/admin/clubs/{}/approve", club_id))
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    };

    // Non-admins cannot reach the admin surface
    let response = ctx
        .app
        .clone()
        .call(approve(ctx.jwt_token.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.app.clone().call(approve(admin_token.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let approved = body_json(response).await;
    assert_eq!(approved["status"], "approved");

    // Approval seeds the creator as owner
    let role = harambee_shared::models::membership::ClubMember::get_role(&ctx.db, club_id, ctx.user.id)
        .await
        .unwrap();
    assert_eq!(
        role,
        Some(harambee_shared::models::membership::ClubRole::Owner)
    );

    // Deciding twice conflicts
    let response = ctx.app.clone().call(approve(admin_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let club = Club::find_by_id(&ctx.db, club_id).await.unwrap().unwrap();
    assert_eq!(club.status, ClubStatus::Approved);

    ctx.cleanup().await.unwrap();
}

/// Join request lifecycle: submit, approve, membership appears
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_join_request_flow() {
    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Book Club").await.unwrap();
    let (applicant, applicant_token) = ctx.create_user("applicant").await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/clubs/{}/join-requests", club.id))
        .header("authorization", format!("Bearer {}", applicant_token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "message": "I would love to join" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let join_request = body_json(response).await;
    let request_id = join_request["id"].as_str().unwrap();

    // The owner sees it pending
    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/clubs/{}/join-requests", club.id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending = body_json(response).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("POST")
        .uri(format!(
            "/v1/clubs/{}/join-requests/{}/approve",
            club.id, request_id
        ))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The applicant is now a member
    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/clubs/{}/members", club.id))
        .header("authorization", format!("Bearer {}", applicant_token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let members = body_json(response).await;
    let joined = members
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["user_id"] == applicant.id.to_string());
    assert!(joined, "approved applicant missing from member list");

    ctx.cleanup().await.unwrap();
}

/// Progress and status stay coupled on task updates
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_task_progress_status_coupling() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "title": "Write the report" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await;
    assert_eq!(task["status"], "pending");
    assert_eq!(task["progress"], 0);
    let task_id = task["id"].as_str().unwrap().to_string();

    // Partial progress advances a pending task
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "progress": 40 }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = body_json(response).await;
    assert_eq!(task["status"], "in-progress");
    assert_eq!(task["progress"], 40);

    // Full progress completes the task
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "progress": 100 }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = body_json(response).await;
    assert_eq!(task["status"], "completed");
    assert_eq!(task["progress"], 100);

    // A status rollback alone cannot reopen a task at full progress
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "pending" }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = body_json(response).await;
    assert_eq!(task["status"], "completed");

    // Reopening with reduced progress works
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "status": "in-progress", "progress": 60 }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let task = body_json(response).await;
    assert_eq!(task["status"], "in-progress");
    assert_eq!(task["progress"], 60);

    ctx.cleanup().await.unwrap();
}

/// Other users' personal tasks read as missing, not forbidden
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_personal_task_is_private() {
    let ctx = TestContext::new().await.unwrap();

    let (_, other_token) = ctx.create_user("outsider").await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "Private errand" }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let task = body_json(response).await;
    let task_id = task["id"].as_str().unwrap();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", format!("Bearer {}", other_token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

/// Blocked accounts are rejected at the auth layer
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_blocked_account_locked_out() {
    let ctx = TestContext::new().await.unwrap();

    let (target, target_token) = ctx.create_user("troublemaker").await.unwrap();
    let (admin, _) = ctx.create_user("moderator").await.unwrap();
    let (_, admin_token) = ctx.make_site_admin(admin.id).await.unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/v1/admin/users/{}/block", target.id))
        .header("authorization", format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The existing token no longer gets through
    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", format!("Bearer {}", target_token))
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// Only one pending join request per user and club
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_duplicate_pending_join_request_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Cycling Club").await.unwrap();
    let (_, applicant_token) = ctx.create_user("applicant").await.unwrap();

    let submit = || {
        Request::builder()
            .method("POST")
            .uri(format!("/v1/clubs/{}/join-requests", club.id))
            .header("authorization", format!("Bearer {}", applicant_token))
            .header("content-type", "application/json")
            .body(Body::from(json!({}).to_string()))
            .unwrap()
    };

    let response = ctx.app.clone().call(submit()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Resubmitting while the first is still pending fails
    let response = ctx.app.clone().call(submit()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// One vote per poll, across ALL options
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_poll_double_vote_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Movie Club").await.unwrap();
    let community = ctx
        .create_approved_community(club.id, "Film Noir")
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!(
            "/v1/clubs/{}/communities/{}/polls",
            club.id, community.id
        ))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "question": "Which screening next?",
                "options": ["The Third Man", "Double Indemnity"]
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let poll = body_json(response).await;
    let poll_id = poll["id"].as_str().unwrap().to_string();
    let options = poll["options"].as_array().unwrap();
    let first_option = options[0]["id"].as_str().unwrap();
    let second_option = options[1]["id"].as_str().unwrap();

    let vote = |option_id: &str| {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/v1/clubs/{}/communities/{}/polls/{}/vote",
                club.id, community.id, poll_id
            ))
            .header("authorization", ctx.auth_header())
            .header("content-type", "application/json")
            .body(Body::from(json!({ "option_id": option_id }).to_string()))
            .unwrap()
    };

    let response = ctx.app.clone().call(vote(first_option)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Switching to another option is still a second vote
    let response = ctx.app.clone().call(vote(second_option)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

/// Chat round-trip: posted messages come back oldest first
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_community_chat_round_trip() {
    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Chat Club").await.unwrap();
    let community = ctx
        .create_approved_community(club.id, "General")
        .await
        .unwrap();

    for content in ["first message", "second message"] {
        let request = Request::builder()
            .method("POST")
            .uri(format!(
                "/v1/clubs/{}/communities/{}/chat",
                club.id, community.id
            ))
            .header("authorization", ctx.auth_header())
            .header("content-type", "application/json")
            .body(Body::from(json!({ "content": content }).to_string()))
            .unwrap();

        let response = ctx.app.clone().call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let request = Request::builder()
        .method("GET")
        .uri(format!(
            "/v1/clubs/{}/communities/{}/chat",
            club.id, community.id
        ))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = body_json(response).await;
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "first message");
    assert_eq!(messages[1]["content"], "second message");

    ctx.cleanup().await.unwrap();
}

/// Community writes require an approved, unarchived community
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_community_writes_gated() {
    use harambee_shared::models::community::Community;

    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Gardening Club").await.unwrap();

    // Still pending: not approved, so writes read as missing
    let community = Community::create(
        &ctx.db,
        club.id,
        "Allotments",
        "Pending community",
        ctx.user.id,
    )
    .await
    .unwrap();

    let post_chat = || {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/v1/clubs/{}/communities/{}/chat",
                club.id, community.id
            ))
            .header("authorization", ctx.auth_header())
            .header("content-type", "application/json")
            .body(Body::from(json!({ "content": "hello" }).to_string()))
            .unwrap()
    };

    let response = ctx.app.clone().call(post_chat()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Community::approve(&ctx.db, club.id, community.id)
        .await
        .unwrap()
        .unwrap();

    // Archived: visible but read-only
    Community::set_archived(&ctx.db, club.id, community.id, true)
        .await
        .unwrap()
        .unwrap();

    let response = ctx.app.clone().call(post_chat()).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Approved and unarchived: writes go through
    Community::set_archived(&ctx.db, club.id, community.id, false)
        .await
        .unwrap()
        .unwrap();

    let response = ctx.app.clone().call(post_chat()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    ctx.cleanup().await.unwrap();
}

/// Club admins change member roles; the owner's row stays untouchable
#[tokio::test]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_role_change_by_club_admin() {
    use harambee_shared::models::membership::{ClubMember, ClubRole};

    let ctx = TestContext::new().await.unwrap();

    let club = ctx.create_approved_club("Debate Club").await.unwrap();
    let (admin, admin_token) = ctx.create_user("club-admin").await.unwrap();
    let (member, _) = ctx.create_user("club-member").await.unwrap();

    ClubMember::add(&ctx.db, club.id, admin.id, ClubRole::Admin)
        .await
        .unwrap();
    ClubMember::add(&ctx.db, club.id, member.id, ClubRole::Member)
        .await
        .unwrap();

    let change_role = |target: uuid::Uuid, role: &str| {
        Request::builder()
            .method("PUT")
            .uri(format!("/v1/clubs/{}/members/{}/role", club.id, target))
            .header("authorization", format!("Bearer {}", admin_token))
            .header("content-type", "application/json")
            .body(Body::from(json!({ "role": role }).to_string()))
            .unwrap()
    };

    // An admin (not the owner) promotes a member
    let response = ctx
        .app
        .clone()
        .call(change_role(member.id, "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let role = ClubMember::get_role(&ctx.db, club.id, member.id)
        .await
        .unwrap();
    assert_eq!(role, Some(ClubRole::Admin));

    // The owner's row cannot be changed
    let response = ctx
        .app
        .clone()
        .call(change_role(ctx.user.id, "member"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A non-member target reads as missing, not as the owner guard
    let response = ctx
        .app
        .clone()
        .call(change_role(uuid::Uuid::new_v4(), "admin"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}
