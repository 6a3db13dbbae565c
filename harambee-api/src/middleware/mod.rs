/// HTTP middleware
///
/// - `security`: security-related response headers

pub mod security;
