// Resume records: persistence in the user's key-value namespace, the
// upload -> rasterize -> analyze pipeline, and the HTTP handlers.

pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod repository;
