// Read-side queries over imported rows, shaped for the dashboard.

pub mod handlers;
