//! Static authority data backing the built-in registry.
//!
//! This is a deliberately small EPSG subset: the units, ellipsoids, datums
//! and coordinate systems the codec meets in practice. Anything else is
//! served through the `crs-definitions` fallback in the parent module.

use crate::crs::UnitKind;

pub struct UnitEntry {
    pub code: u16,
    pub kind: UnitKind,
    pub name: &'static str,
    pub factor: f64,
}

pub const UNITS: &[UnitEntry] = &[
    UnitEntry { code: 9001, kind: UnitKind::Linear, name: "metre", factor: 1.0 },
    UnitEntry { code: 9002, kind: UnitKind::Linear, name: "foot", factor: 0.3048 },
    UnitEntry { code: 9003, kind: UnitKind::Linear, name: "us_survey_feet", factor: 0.3048006096012192 },
    UnitEntry { code: 9036, kind: UnitKind::Linear, name: "kilometre", factor: 1000.0 },
    UnitEntry { code: 9101, kind: UnitKind::Angular, name: "radian", factor: 1.0 },
    UnitEntry { code: 9102, kind: UnitKind::Angular, name: "degree", factor: 0.0174532925199433 },
    UnitEntry { code: 9103, kind: UnitKind::Angular, name: "arc-minute", factor: 2.908882086657216e-4 },
    UnitEntry { code: 9104, kind: UnitKind::Angular, name: "arc-second", factor: 4.848136811095361e-6 },
    UnitEntry { code: 9105, kind: UnitKind::Angular, name: "grad", factor: 1.570796326794897e-2 },
    UnitEntry { code: 9106, kind: UnitKind::Angular, name: "gon", factor: 1.570796326794897e-2 },
    UnitEntry { code: 9122, kind: UnitKind::Angular, name: "degree", factor: 0.0174532925199433 },
];

pub struct EllipsoidEntry {
    pub code: u16,
    pub name: &'static str,
    pub proj_name: &'static str,
    pub semi_major: f64,
    pub inv_flattening: f64,
}

pub const ELLIPSOIDS: &[EllipsoidEntry] = &[
    EllipsoidEntry { code: 7030, name: "WGS 84", proj_name: "WGS84", semi_major: 6378137.0, inv_flattening: 298.257223563 },
    EllipsoidEntry { code: 7019, name: "GRS 1980", proj_name: "GRS80", semi_major: 6378137.0, inv_flattening: 298.257222101 },
    EllipsoidEntry { code: 7008, name: "Clarke 1866", proj_name: "clrk66", semi_major: 6378206.4, inv_flattening: 294.978698213898 },
    EllipsoidEntry { code: 7011, name: "Clarke 1880 (IGN)", proj_name: "clrk80ign", semi_major: 6378249.2, inv_flattening: 293.466021293627 },
    EllipsoidEntry { code: 7004, name: "Bessel 1841", proj_name: "bessel", semi_major: 6377397.155, inv_flattening: 299.1528128 },
    EllipsoidEntry { code: 7022, name: "International 1924", proj_name: "intl", semi_major: 6378388.0, inv_flattening: 297.0 },
    EllipsoidEntry { code: 7043, name: "WGS 72", proj_name: "WGS72", semi_major: 6378135.0, inv_flattening: 298.26 },
];

pub struct PrimeMeridianEntry {
    pub code: u16,
    pub name: &'static str,
    /// Degrees east of Greenwich.
    pub longitude: f64,
}

pub const PRIME_MERIDIANS: &[PrimeMeridianEntry] = &[
    PrimeMeridianEntry { code: 8901, name: "Greenwich", longitude: 0.0 },
    PrimeMeridianEntry { code: 8903, name: "Paris", longitude: 2.33722917 },
    PrimeMeridianEntry { code: 8904, name: "Bogota", longitude: -74.08091666678081 },
];

pub struct DatumEntry {
    pub code: u16,
    pub name: &'static str,
    pub proj_name: Option<&'static str>,
    pub ellipsoid: u16,
}

pub const DATUMS: &[DatumEntry] = &[
    DatumEntry { code: 6326, name: "World Geodetic System 1984", proj_name: Some("WGS84"), ellipsoid: 7030 },
    DatumEntry { code: 6269, name: "North American Datum 1983", proj_name: Some("NAD83"), ellipsoid: 7019 },
    DatumEntry { code: 6267, name: "North American Datum 1927", proj_name: Some("NAD27"), ellipsoid: 7008 },
    DatumEntry { code: 6258, name: "European Terrestrial Reference System 1989", proj_name: None, ellipsoid: 7019 },
    DatumEntry { code: 6807, name: "Nouvelle Triangulation Francaise (Paris)", proj_name: None, ellipsoid: 7011 },
    DatumEntry { code: 6322, name: "World Geodetic System 1972", proj_name: None, ellipsoid: 7043 },
];

pub struct GeographicEntry {
    pub code: u16,
    pub name: &'static str,
    pub datum: u16,
    pub prime_meridian: u16,
    pub unit: u16,
}

pub const GEOGRAPHIC: &[GeographicEntry] = &[
    GeographicEntry { code: 4326, name: "WGS 84", datum: 6326, prime_meridian: 8901, unit: 9102 },
    GeographicEntry { code: 4269, name: "NAD83", datum: 6269, prime_meridian: 8901, unit: 9102 },
    GeographicEntry { code: 4267, name: "NAD27", datum: 6267, prime_meridian: 8901, unit: 9102 },
    GeographicEntry { code: 4258, name: "ETRS89", datum: 6258, prime_meridian: 8901, unit: 9102 },
    GeographicEntry { code: 4322, name: "WGS 72", datum: 6322, prime_meridian: 8901, unit: 9102 },
    GeographicEntry { code: 4807, name: "NTF (Paris)", datum: 6807, prime_meridian: 8903, unit: 9105 },
];

/// Geographic 3D codes and their 2D base.
pub const GEOGRAPHIC_3D: &[(u16, u16, &str)] = &[
    (4979, 4326, "WGS 84"),
];

/// Geocentric codes and their datum.
pub const GEOCENTRIC: &[(u16, u16, &str)] = &[
    (4328, 6326, "WGS 84 (geocentric)"),
    (4978, 6326, "WGS 84 (geocentric)"),
];

pub struct VerticalEntry {
    pub code: u16,
    pub name: &'static str,
    pub datum_code: u16,
    pub datum_name: &'static str,
    pub unit: u16,
}

pub const VERTICAL: &[VerticalEntry] = &[
    VerticalEntry { code: 3855, name: "EGM2008 height", datum_code: 1027, datum_name: "EGM2008 geoid", unit: 9001 },
    VerticalEntry { code: 5773, name: "EGM96 height", datum_code: 5171, datum_name: "EGM96 geoid", unit: 9001 },
    VerticalEntry { code: 5714, name: "MSL height", datum_code: 5100, datum_name: "Mean Sea Level", unit: 9001 },
    VerticalEntry { code: 5720, name: "NGF-IGN69 height", datum_code: 5119, datum_name: "Nivellement General de la France - IGN69", unit: 9001 },
];

/// Vertical CS codes in this range denote heights above a reference
/// ellipsoid rather than a geoid or tide gauge.
pub fn is_ellipsoidal_height(code: u16) -> bool {
    (5001..=5033).contains(&code)
}
