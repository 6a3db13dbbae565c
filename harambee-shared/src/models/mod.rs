/// Database models
///
/// One module per aggregate:
///
/// - `user`: accounts, preferences, notifications
/// - `club`: clubs, approval state machine, club logs
/// - `membership`: club rosters and roles
/// - `join_request`: pending join requests
/// - `community`: sub-groups with rosters, chat, ad-hoc tasks
/// - `poll`: community polls, options, votes
/// - `forum`: club forum topics and replies
/// - `knowledge`: versioned knowledge-base articles
/// - `club_goal`: simple club-embedded goals
/// - `task`: top-level personal/club tasks
/// - `enhanced_task`: rich tasks (checklists, comments, time, dependencies)
/// - `goal` / `objective`: OKR planning hierarchy with key results
/// - `activity_log`: append-only audit trail

pub mod activity_log;
pub mod club;
pub mod club_goal;
pub mod community;
pub mod enhanced_task;
pub mod forum;
pub mod goal;
pub mod join_request;
pub mod knowledge;
pub mod membership;
pub mod objective;
pub mod poll;
pub mod task;
pub mod user;
