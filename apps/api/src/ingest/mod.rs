// CSV ingestion and normalization engine.
// Implements: delimiter detection, header normalization, schema
// classification, field aliasing and coercion, windowed upload management.
// Detection and coercion are heuristics that degrade to documented
// defaults; persistence is all-or-nothing per file.

pub mod decode;
pub mod delimiter;
pub mod fields;
pub mod handlers;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod window;
