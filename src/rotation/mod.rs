//! Dish rotation: working pools derived from history, randomized draws
//! without repetition, and confirmation of drawn days into records.

mod confirm;
mod generator;
mod pool;
mod remaining;
mod session;

pub use confirm::PoolState;
pub use generator::Recommendation;
pub use pool::{Category, MealSet, Pool, PoolSizes};
pub use remaining::compute_remaining_pool;
pub use session::{PoolStatus, Session};
