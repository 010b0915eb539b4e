//! Authority lookups behind an injectable trait.
//!
//! The decoder and encoder only ever see [`Resolver`]; tests substitute
//! fixture tables for the built-in [`EpsgRegistry`]. Lookups are pure reads
//! over immutable data and safe to share across threads.

use crate::crs::{
    AxisOrder, Crs, Datum, Ellipsoid, GeocentricCrs, GeographicCrs, PrimeMeridian, ProjMethod,
    ProjParam, ProjectedCrs, Projection, Unit, UnitKind, VerticalCrs, VerticalDatum,
    SAME_TOLERANCE,
};
use crate::projstring;

pub(crate) mod tables;

pub use tables::is_ellipsoidal_height;

/// Code -> definition and definition -> code lookups.
///
/// `find_*` methods return a code only when every compared field matches:
/// names exactly, numbers within the comparison tolerance. A definition that
/// carries any override away from the authority values never matches, so
/// encoding can fall back to spelling it out instead of silently dropping
/// the override.
pub trait Resolver {
    fn resolve_unit(&self, code: u16) -> Option<Unit>;
    fn resolve_unit_by_name(&self, name: &str) -> Option<Unit>;
    fn resolve_crs(&self, code: u16) -> Option<Crs>;
    fn resolve_datum(&self, code: u16) -> Option<Datum>;
    fn resolve_ellipsoid(&self, code: u16) -> Option<Ellipsoid>;
    fn resolve_prime_meridian(&self, code: u16) -> Option<PrimeMeridian>;
    fn resolve_vertical(&self, code: u16) -> Option<VerticalCrs>;
    /// Projection conversion codes (e.g. the UTM zone conversions).
    fn resolve_conversion(&self, code: u16) -> Option<Projection>;
    fn find_crs_code(&self, crs: &Crs) -> Option<u16>;
    fn find_unit_code(&self, unit: &Unit) -> Option<u16>;
}

/// The built-in registry: a static EPSG subset plus a `crs-definitions`
/// fallback for codes outside it.
#[derive(Clone, Copy, Debug, Default)]
pub struct EpsgRegistry;

fn nearly(a: f64, b: f64) -> bool {
    (a - b).abs() <= SAME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn unit_from_entry(entry: &tables::UnitEntry) -> Unit {
    Unit {
        kind: entry.kind,
        name: entry.name.to_string(),
        factor: entry.factor,
        authority_code: Some(entry.code),
    }
}

fn ellipsoid_from_entry(entry: &tables::EllipsoidEntry) -> Ellipsoid {
    Ellipsoid::new(entry.name, entry.semi_major, entry.inv_flattening).with_code(entry.code)
}

impl EpsgRegistry {
    fn geographic(&self, code: u16) -> Option<GeographicCrs> {
        let entry = tables::GEOGRAPHIC.iter().find(|e| e.code == code)?;
        Some(GeographicCrs {
            name: entry.name.to_string(),
            authority_code: Some(entry.code),
            datum: self.resolve_datum(entry.datum)?,
            prime_meridian: self.resolve_prime_meridian(entry.prime_meridian)?,
            angular_unit: self.resolve_unit(entry.unit)?,
            axis_order: AxisOrder::default(),
        })
    }

    fn utm(&self, code: u16) -> Option<ProjectedCrs> {
        let (gcs_code, zone, south) = match code {
            32601..=32660 => (4326, code - 32600, false),
            32701..=32760 => (4326, code - 32700, true),
            26901..=26923 => (4269, code - 26900, false),
            26701..=26722 => (4267, code - 26700, false),
            _ => return None,
        };
        let geographic = self.geographic(gcs_code)?;
        let hemisphere = if south { "S" } else { "N" };
        let name = format!("{} / UTM zone {zone}{hemisphere}", geographic.name);
        Some(ProjectedCrs {
            name,
            authority_code: Some(code),
            geographic,
            projection: utm_projection(zone, south),
            linear_unit: self.resolve_unit(9001)?,
            axis_order: AxisOrder::default(),
        })
    }

    fn pseudo_mercator(&self) -> Option<ProjectedCrs> {
        let geographic = self.geographic(4326)?;
        Some(ProjectedCrs {
            name: "WGS 84 / Pseudo-Mercator".to_string(),
            authority_code: Some(3857),
            geographic,
            projection: Projection::new(ProjMethod::Mercator)
                .with(ProjParam::CentralMeridian, 0.0)
                .with(ProjParam::ScaleFactor, 1.0)
                .with(ProjParam::FalseEasting, 0.0)
                .with(ProjParam::FalseNorthing, 0.0),
            linear_unit: self.resolve_unit(9001)?,
            axis_order: AxisOrder::default(),
        })
    }
}

fn utm_projection(zone: u16, south: bool) -> Projection {
    Projection::new(ProjMethod::TransverseMercator)
        .with(ProjParam::LatitudeOfOrigin, 0.0)
        .with(ProjParam::CentralMeridian, zone as f64 * 6.0 - 183.0)
        .with(ProjParam::ScaleFactor, 0.9996)
        .with(ProjParam::FalseEasting, 500000.0)
        .with(
            ProjParam::FalseNorthing,
            if south { 10000000.0 } else { 0.0 },
        )
}

impl Resolver for EpsgRegistry {
    fn resolve_unit(&self, code: u16) -> Option<Unit> {
        tables::UNITS
            .iter()
            .find(|e| e.code == code)
            .map(unit_from_entry)
    }

    fn resolve_unit_by_name(&self, name: &str) -> Option<Unit> {
        tables::UNITS
            .iter()
            .find(|e| e.name == name)
            .map(unit_from_entry)
    }

    fn resolve_ellipsoid(&self, code: u16) -> Option<Ellipsoid> {
        tables::ELLIPSOIDS
            .iter()
            .find(|e| e.code == code)
            .map(ellipsoid_from_entry)
    }

    fn resolve_prime_meridian(&self, code: u16) -> Option<PrimeMeridian> {
        tables::PRIME_MERIDIANS.iter().find(|e| e.code == code).map(|e| PrimeMeridian {
            name: e.name.to_string(),
            authority_code: Some(e.code),
            longitude: e.longitude,
        })
    }

    fn resolve_datum(&self, code: u16) -> Option<Datum> {
        let entry = tables::DATUMS.iter().find(|e| e.code == code)?;
        Some(Datum {
            name: entry.name.to_string(),
            authority_code: Some(entry.code),
            ellipsoid: self.resolve_ellipsoid(entry.ellipsoid)?,
            towgs84: None,
        })
    }

    fn resolve_vertical(&self, code: u16) -> Option<VerticalCrs> {
        let entry = tables::VERTICAL.iter().find(|e| e.code == code)?;
        Some(VerticalCrs {
            name: entry.name.to_string(),
            authority_code: Some(entry.code),
            datum: VerticalDatum {
                name: entry.datum_name.to_string(),
                authority_code: Some(entry.datum_code),
                datum_type: 2005,
            },
            unit: self.resolve_unit(entry.unit)?,
        })
    }

    fn resolve_conversion(&self, code: u16) -> Option<Projection> {
        match code {
            16001..=16060 => Some(utm_projection(code - 16000, false)),
            16101..=16160 => Some(utm_projection(code - 16100, true)),
            _ => None,
        }
    }

    fn resolve_crs(&self, code: u16) -> Option<Crs> {
        if let Some(gcs) = self.geographic(code) {
            return Some(Crs::Geographic2D(gcs));
        }
        if let Some((code3d, base, name)) = tables::GEOGRAPHIC_3D
            .iter()
            .find(|(c, _, _)| *c == code)
        {
            let mut gcs = self.geographic(*base)?;
            gcs.name = name.to_string();
            gcs.authority_code = Some(*code3d);
            return Some(Crs::Geographic3D(gcs));
        }
        if let Some((_, datum, name)) = tables::GEOCENTRIC.iter().find(|(c, _, _)| *c == code) {
            return Some(Crs::Geocentric(GeocentricCrs {
                name: name.to_string(),
                authority_code: Some(code),
                datum: self.resolve_datum(*datum)?,
                prime_meridian: PrimeMeridian::greenwich(),
                linear_unit: self.resolve_unit(9001)?,
            }));
        }
        if let Some(vertical) = self.resolve_vertical(code) {
            return Some(Crs::Vertical(vertical));
        }
        if let Some(pcs) = self.utm(code) {
            return Some(Crs::Projected(pcs));
        }
        if code == 3857 {
            return Some(Crs::Projected(self.pseudo_mercator()?));
        }

        // Outside the built-in subset, fall back to the proj string shipped
        // with crs-definitions. Names are lost on that path.
        let def = crs_definitions::from_code(code)?;
        let mut crs = projstring::from_proj_string(def.proj4).ok()?;
        match &mut crs {
            Crs::Geographic2D(gcs) => gcs.authority_code = Some(code),
            Crs::Projected(pcs) => pcs.authority_code = Some(code),
            Crs::Geocentric(ccs) => ccs.authority_code = Some(code),
            _ => {}
        }
        Some(crs)
    }

    fn find_crs_code(&self, crs: &Crs) -> Option<u16> {
        match crs {
            Crs::Geographic2D(gcs) => tables::GEOGRAPHIC
                .iter()
                .find(|entry| {
                    entry.name == gcs.name
                        && self
                            .geographic(entry.code)
                            .is_some_and(|candidate| {
                                Crs::Geographic2D(candidate).is_same(crs)
                            })
                })
                .map(|entry| entry.code),
            Crs::Geographic3D(gcs) => tables::GEOGRAPHIC_3D
                .iter()
                .find(|(code, _, name)| {
                    *name == gcs.name
                        && self
                            .resolve_crs(*code)
                            .is_some_and(|candidate| candidate.is_same(crs))
                })
                .map(|(code, _, _)| *code),
            Crs::Projected(pcs) => {
                for code in utm_candidates(pcs).into_iter().chain([3857]) {
                    if let Some(candidate) = self.resolve_crs(code) {
                        if candidate.name() == Some(pcs.name.as_str()) && candidate.is_same(crs) {
                            return Some(code);
                        }
                    }
                }
                None
            }
            Crs::Geocentric(_) => tables::GEOCENTRIC
                .iter()
                .find(|(code, _, name)| {
                    crs.name() == Some(*name)
                        && self
                            .resolve_crs(*code)
                            .is_some_and(|candidate| candidate.is_same(crs))
                })
                .map(|(code, _, _)| *code),
            Crs::Vertical(vcs) => tables::VERTICAL
                .iter()
                .find(|entry| {
                    entry.name == vcs.name
                        && self
                            .resolve_vertical(entry.code)
                            .is_some_and(|candidate| {
                                Crs::Vertical(candidate).is_same(crs)
                            })
                })
                .map(|entry| entry.code),
            _ => None,
        }
    }

    fn find_unit_code(&self, unit: &Unit) -> Option<u16> {
        tables::UNITS
            .iter()
            .find(|entry| {
                entry.kind == unit.kind && entry.name == unit.name && nearly(entry.factor, unit.factor)
            })
            .map(|entry| entry.code)
    }
}

/// Candidate UTM codes for a transverse-mercator definition, derived from
/// its central meridian and false northing.
fn utm_candidates(pcs: &ProjectedCrs) -> Vec<u16> {
    if pcs.projection.method != ProjMethod::TransverseMercator {
        return vec![];
    }
    let cm = pcs.projection.parameter(ProjParam::CentralMeridian);
    let zone = (cm + 183.0) / 6.0;
    if zone.fract() != 0.0 || !(1.0..=60.0).contains(&zone) {
        return vec![];
    }
    let zone = zone as u16;
    let south = pcs.projection.parameter(ProjParam::FalseNorthing) == 10000000.0;
    if south {
        vec![32700 + zone]
    } else {
        vec![32600 + zone, 26900 + zone, 26700 + zone]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_round_trips_through_find() {
        let registry = EpsgRegistry;
        let crs = registry.resolve_crs(4326).unwrap();
        assert_eq!(registry.find_crs_code(&crs), Some(4326));
    }

    #[test]
    fn utm_code_resolution() {
        let registry = EpsgRegistry;
        let crs = registry.resolve_crs(32631).unwrap();
        let Crs::Projected(pcs) = &crs else {
            panic!("expected projected crs");
        };
        assert_eq!(pcs.name, "WGS 84 / UTM zone 31N");
        assert_eq!(pcs.projection.parameter(ProjParam::CentralMeridian), 3.0);
        assert_eq!(registry.find_crs_code(&crs), Some(32631));
    }

    #[test]
    fn nad27_utm_zone_11() {
        let registry = EpsgRegistry;
        let crs = registry.resolve_crs(26711).unwrap();
        assert_eq!(crs.name(), Some("NAD27 / UTM zone 11N"));
        assert_eq!(registry.find_crs_code(&crs), Some(26711));
    }

    #[test]
    fn overridden_definition_finds_no_code() {
        let registry = EpsgRegistry;
        let Some(Crs::Geographic2D(mut gcs)) = registry.resolve_crs(4269) else {
            panic!("expected geographic crs");
        };
        gcs.datum.towgs84 = Some([1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(registry.find_crs_code(&Crs::Geographic2D(gcs)), None);
    }

    #[test]
    fn unit_lookup_is_exact() {
        let registry = EpsgRegistry;
        assert_eq!(registry.find_unit_code(&Unit::degree()), Some(9102));
        assert_eq!(
            registry.find_unit_code(&Unit::angular("custom", 1.23)),
            None
        );
        // Same factor, different name: no match.
        assert_eq!(
            registry.find_unit_code(&Unit::angular("Degree", 0.0174532925199433)),
            None
        );
    }

    #[test]
    fn vertical_lookup() {
        let registry = EpsgRegistry;
        let Some(Crs::Vertical(vcs)) = registry.resolve_crs(3855) else {
            panic!("expected vertical crs");
        };
        assert_eq!(vcs.name, "EGM2008 height");
        assert_eq!(vcs.datum.authority_code, Some(1027));
        assert!(is_ellipsoidal_height(5030));
        assert!(!is_ellipsoidal_height(3855));
    }
}
