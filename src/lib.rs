//! A codec between the GeoTIFF key directory and a structured coordinate
//! reference system model, with WKT and proj-string bridges.
//!
//! The raster file layer hands over the raw key/double/ASCII tag payloads;
//! [`GeoKeyDirectory`] parses them, [`decode`] turns them into a [`Crs`]
//! graph, [`encode`] goes the other way, and the [`wkt`] and [`projstring`]
//! modules exchange the graph with the outside world as text. Authority
//! lookups go through the [`Resolver`] trait so that tests and embedders can
//! substitute their own tables for the built-in [`EpsgRegistry`].

pub mod crs;
pub mod decode;
pub mod encode;
mod endian;
mod error;
pub mod geokeys;
pub mod projstring;
pub mod registry;
pub mod wkt;

pub use crs::{
    Crs, Datum, Ellipsoid, GeographicCrs, PrimeMeridian, ProjMethod, ProjParam, ProjectedCrs,
    Projection, Unit, UnitKind, VerticalCrs,
};
pub use decode::{decode, DecodeError, DecodeOptions, Decoded, Warning};
pub use encode::{encode, EncodeError, EncodeOptions, GeoTiffVersion};
pub use endian::Endian;
pub use error::{SrsError, SrsResult};
pub use geokeys::{GeoKey, GeoKeyDirectory, GeoKeyError, GeoKeyId, GeoKeyValue};
pub use projstring::{from_proj_string, to_proj_string, ProjError};
pub use registry::{EpsgRegistry, Resolver};
pub use wkt::{from_wkt, to_pretty_wkt, to_wkt, WktError};
