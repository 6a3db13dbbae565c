/// Authentication and authorization
///
/// - `jwt`: Token creation and validation
/// - `password`: Argon2id hashing and verification
/// - `middleware`: Request authentication context
/// - `authorization`: Centralized club/community/site policy checks

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
