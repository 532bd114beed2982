//! Published draw results
//!
//! A result carries per-province prize tiers as fixed-width numeric strings.
//! Construction validates every tier width, so settlement only ever sees
//! well-formed results. Once settlement has run, the row is flagged and any
//! correction must reverse prior settlement effects first.

pub mod error;
pub mod model;
pub mod repository;

pub use error::DrawError;
pub use model::{DrawResult, PrizeTiers, ProvinceResult};
pub use repository::DrawRepository;
