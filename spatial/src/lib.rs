pub mod backend;
pub mod collision;
pub mod config;
pub mod entry;
pub mod error;
pub mod grid;
pub mod linear_search;
pub mod manager;
pub mod object;
pub mod quadtree;
pub mod search;

pub use backend::{Spatial, SpatialKind};
pub use collision::HitEvent;
pub use config::Config;
pub use entry::SpatialEntry;
pub use error::{SpatialError, SpatialResult};
pub use grid::UniformGrid;
pub use linear_search::LinearSearch;
pub use manager::SpatialManager;
pub use object::{Loyalty, ObjectId, ObjectKind, ObjectSnapshot, PartHit, SpatialWorld};
pub use quadtree::{NodeView, Quadtree};
pub use search::{SearchFilter, SearchOptions};
