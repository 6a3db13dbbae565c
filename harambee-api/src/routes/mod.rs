/// API route handlers
///
/// - `health`: health check
/// - `auth`: registration, login, token refresh
/// - `users`: own profile, password, preferences, notifications
/// - `clubs`: club CRUD and logs
/// - `members`: roster, roles, join requests
/// - `communities`: sub-groups with tasks and chat
/// - `polls`: community polls and voting
/// - `forum`: topics and replies
/// - `knowledge`: knowledge-base articles
/// - `club_goals`: simple club goals
/// - `tasks`: top-level tasks
/// - `enhanced_tasks`: rich tasks (checklist, comments, time, dependencies)
/// - `goals`: planning hierarchy (goals, objectives, key results, activity)
/// - `admin`: site administration

pub mod admin;
pub mod auth;
pub mod club_goals;
pub mod clubs;
pub mod communities;
pub mod enhanced_tasks;
pub mod forum;
pub mod goals;
pub mod health;
pub mod knowledge;
pub mod members;
pub mod polls;
pub mod tasks;
pub mod users;
