pub mod display;
pub mod error;
pub mod ids;
pub mod ops;
pub mod query;
pub mod schema;
pub mod si;
pub mod time;
pub mod value;

pub use display::*;
pub use error::{CatalogError, CatalogResult};
pub use ids::*;
pub use ops::*;
pub use query::*;
pub use schema::*;
pub use si::*;
pub use time::*;
pub use value::*;
