//! Static plane: daily GTFS archive bundling.

pub mod archive;
pub mod builder;
pub mod model;
pub mod raw;
pub mod validate;
pub mod worker;
