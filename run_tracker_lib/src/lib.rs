pub mod distance;
pub mod path;
pub mod position_fix;
pub mod session_state;
pub mod validator;

pub use distance::distance_meters;
pub use path::{PathAccumulator, PathSnapshot};
pub use position_fix::{Coordinate, PositionFix, RawFix};
pub use session_state::SessionState;
pub use validator::{FixValidator, RejectionReason, ValidatorConfig};
