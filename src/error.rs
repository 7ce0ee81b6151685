use thiserror::Error;

/// Fatal failures surfaced by the film core.
///
/// Out-of-range sample positions and negative channel values are diagnostics
/// (counted and logged), never errors; allocation failure aborts in the
/// allocator and is not represented here.
#[derive(Error, Debug)]
pub enum FilmError {
    #[error("invalid film configuration: {0}")]
    Configuration(String),
    #[error("{operation} called in {state} state")]
    State {
        operation: &'static str,
        state: &'static str,
    },
}
