pub mod asset;
pub mod field;
pub mod record;
pub mod session;
pub mod trade;
pub mod user;

pub use asset::{Asset, InspectionStatus};
pub use field::CanonicalField;
pub use record::{RawRecord, RelationTag};
pub use session::{HolderStats, Progress, RemoteFile, Session};
pub use trade::{AnnotatedTradeEntry, TradeLogEntry, TradeLogGroup};
pub use user::{User, UserDirectory};
