pub mod materialize;
pub mod resolver;
pub mod uri;

pub use materialize::Materializer;
pub use resolver::{DiffLayout, DiffResolver, DiffView, Resource, has_two_sides, sides};
pub use uri::{ContentSide, ContentUri};
