/// Database layer
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: Migration runner and status helpers

pub mod migrations;
pub mod pool;
