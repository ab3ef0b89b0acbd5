pub mod aar;
pub mod error;
pub mod insight;
pub mod unit;
pub mod user;
pub mod utils;

pub use aar::{Aar, AarId, AarItem, Bucket, EventId, TrainingEvent, collect_bucket};
pub use error::{AarError, Result, ResultExt, ValidationError, ValidationErrorKind};
pub use insight::{FrictionPoint, InsightReport, Level, Recommendation, Trend};
pub use unit::{Echelon, Unit, UnitId};
pub use user::{AssignmentKind, Role, UnitAssignment, User, UserId};
pub use utils::{ParseWithDefault, enum_to_str, log_filter_error, log_filter_warn};
