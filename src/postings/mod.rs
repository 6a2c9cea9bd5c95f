mod browse;
mod eligibility;
mod manage;
mod visibility;

pub use browse::Listing;
pub use eligibility::{can_apply, ApplyContext, Eligibility, Ineligibility};
pub use visibility::is_visible;
