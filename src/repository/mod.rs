pub mod connection;

pub use connection::{PgStatementExecutor, establish_connection, probe, redact_url};
