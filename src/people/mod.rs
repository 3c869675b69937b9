/*!

Individuals of a replicate: their fixed category, their double-buffered disease state, and the
PrEP flag assigned by the intervention.

*/

mod category;
mod context_ext;
mod disease;
mod people_data;

// `ContextPeopleExt` is the public API to `PeopleData`.
pub(crate) use people_data::PeopleData;

pub use category::{Category, Gender, Orientation};
pub use context_ext::ContextPeopleExt;
pub use disease::DiseaseState;
