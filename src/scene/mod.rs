//! Scene and generated-asset data model.

/// Per-scene generated assets (decoded image and narration handles).
pub mod asset;
/// Scene descriptions and transition styles.
pub mod model;
