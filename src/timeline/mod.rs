/// Interval schedule derived from per-scene durations.
pub mod builder;
