//! Result aggregation and the presenter-facing session.

pub mod model;
pub mod session;

pub use model::{OpenTarget, Position, ResultModel, SearchState};
pub use session::{NavCommand, ResultPresenter, SearchSession};
