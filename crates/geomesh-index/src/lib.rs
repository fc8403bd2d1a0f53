//! Nearest-node lookup over a fixed set of named geographic points.
//!
//! The flow is: load rows with [`dataset`], build a [`PointIndex`] once,
//! then answer each query with [`NodeResolver::resolve`]. The index selects
//! a candidate by planar distance in (latitude, longitude) space; the
//! resolver then reports the WGS-84 geodesic distance to that candidate.
//!
//! Planar selection can pick a marginally non-optimal node near the poles or
//! across wide longitude spans, where degrees of longitude shrink. The
//! reported distance is always the true geodesic one for the chosen node.

pub mod dataset;
pub mod distance;
pub mod error;
pub mod handle;
pub mod index;
pub mod map;
pub mod resolver;

pub use dataset::{load_dataset, read_dataset, LoadedDataset, SkippedRow};
pub use distance::{geodesic_km, planar_distance_sq, round_km};
pub use error::{DatasetError, IndexError};
pub use handle::IndexHandle;
pub use index::PointIndex;
pub use map::{MapMarker, MapView, MarkerKind};
pub use resolver::{NodeResolver, ResolutionResult};

pub use geomesh_core::{GeoPoint, QueryLocation};
