/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - Test database setup (migrations run on connect)
/// - Test account creation and JWT minting
/// - An app router wired against the test database

use harambee_api::app::{build_router, AppState};
use harambee_api::config::Config;
use harambee_shared::auth::jwt::{create_token, Claims, TokenType};
use harambee_shared::db::migrations::run_migrations;
use harambee_shared::models::club::{Club, ClubStatus, CreateClub};
use harambee_shared::models::community::Community;
use harambee_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh account and a migrated database
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        // Requests authenticate with a minted token, so the hash is never
        // checked outside the explicit login tests.
        let user = User::create(
            &db,
            CreateUser {
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
                name: "Test User".to_string(),
            },
        )
        .await?;

        let jwt_token = token_for(&user, &config)?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Creates another account with its own access token
    pub async fn create_user(&self, name: &str) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                email: format!("{}-{}@example.com", name, Uuid::new_v4()),
                password_hash: "test_hash".to_string(),
                name: name.to_string(),
            },
        )
        .await?;

        let token = token_for(&user, &self.config)?;

        Ok((user, token))
    }

    /// Promotes an account to site admin and mints a fresh token for it
    pub async fn make_site_admin(&self, user_id: Uuid) -> anyhow::Result<(User, String)> {
        let user = User::set_role(&self.db, user_id, UserRole::Admin)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {user_id} not found"))?;

        let token = token_for(&user, &self.config)?;

        Ok((user, token))
    }

    /// Creates an approved club owned by the context user
    ///
    /// Approval seeds the creator as owner, so the context user is a member
    /// of the returned club.
    pub async fn create_approved_club(&self, name: &str) -> anyhow::Result<Club> {
        let club = Club::create(
            &self.db,
            CreateClub {
                name: format!("{} {}", name, Uuid::new_v4()),
                description: "Integration test club".to_string(),
                purpose: "Testing".to_string(),
                category: "general".to_string(),
                created_by: self.user.id,
            },
        )
        .await?;

        let club = Club::approve(&self.db, club.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("club was already decided"))?;

        assert_eq!(club.status, ClubStatus::Approved);

        Ok(club)
    }

    /// Creates an approved community inside a club
    ///
    /// Creation enrolls the creator (the context user) as community admin.
    pub async fn create_approved_community(
        &self,
        club_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Community> {
        let community = Community::create(
            &self.db,
            club_id,
            name,
            "Integration test community",
            self.user.id,
        )
        .await?;

        let community = Community::approve(&self.db, club_id, community.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("community was already decided"))?;

        Ok(community)
    }

    /// Cleans up test data
    ///
    /// Deleting the account cascades to clubs it created and everything
    /// under them.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}

fn token_for(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(user.id, user.email.clone(), user.role, TokenType::Access);
    let token = create_token(&claims, &config.jwt.secret)?;
    Ok(token)
}
