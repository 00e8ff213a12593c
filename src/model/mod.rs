//! Call-center model documents.
//!
//! A model describes one simulated day: the customer types with their
//! arrival profiles and patience, the agent pool, and how many sub-days
//! (independent repetitions) the engine should simulate.

mod callcenter;
mod caller;
mod profile;

pub use callcenter::{CallCenterModel, MODEL_VERSION};
pub use caller::CallerType;
pub use profile::ArrivalProfile;
