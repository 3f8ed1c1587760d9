// Database row types, one file per table family. Shapes here mirror the
// schema in db.rs; request/response types live next to their handlers.

pub mod analysis;
pub mod metrics;
pub mod upload;
pub mod user;
