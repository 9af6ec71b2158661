pub mod bus;
pub mod distance;
pub mod live_event;
pub mod live_fix;
pub mod marker;
pub mod progress;
pub mod search;
pub mod stop;

mod loose;

pub use bus::{Bus, BusUpdate};
pub use live_event::{LiveCommand, LiveEvent, SelectError};
pub use live_fix::LiveFix;
pub use marker::MarkerAnimator;
pub use progress::{LegProgress, ProgressState};
pub use search::{QueryError, SearchQuery};
pub use stop::Stop;
