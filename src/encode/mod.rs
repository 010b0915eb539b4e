//! CRS graph -> GeoKey directory.
//!
//! Per component the encoder first tries to cite an authority code, either
//! the one carried by the graph (after verifying it still matches the
//! resolver's definition, datum shift aside) or one found by exact reverse
//! lookup. Anything that cannot be cited is spelled out in full, including
//! unit factors, so a reader without authority tables loses nothing.

use std::fmt::Display;

use crate::crs::{
    Crs, Datum, GeocentricCrs, GeographicCrs, LocalCrs, PrimeMeridian, ProjectedCrs, Unit,
    VerticalCrs,
};
use crate::decode::USER_DEFINED;
use crate::geokeys::{GeoKeyDirectory, GeoKeyId, GeoKeyValue};
use crate::registry::Resolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GeoTiffVersion {
    /// Legacy key layout: a 3D geographic CRS splits into a 2D code plus an
    /// ellipsoidal-height vertical key.
    #[default]
    V1_0,
    /// Revision 1.1 layout: a 3D geographic CRS is a single code.
    V1_1,
}

#[derive(Clone, Debug)]
pub struct EncodeOptions {
    pub version: GeoTiffVersion,
    pub write_citations: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            version: GeoTiffVersion::default(),
            write_citations: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EncodeError {
    /// The graph has no key-directory representation, e.g. a compound CRS
    /// whose components are themselves compound.
    Unrepresentable(String),
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Unrepresentable(detail) => write!(f, "unrepresentable CRS: {detail}"),
        }
    }
}

impl std::error::Error for EncodeError {}

pub fn encode(
    crs: &Crs,
    resolver: &dyn Resolver,
    options: &EncodeOptions,
) -> Result<GeoKeyDirectory, EncodeError> {
    let mut encoder = Encoder {
        resolver,
        options,
        directory: GeoKeyDirectory::new(),
    };
    if options.version == GeoTiffVersion::V1_1 {
        encoder.directory.revision = (1, 1);
    }
    encoder.crs(crs)?;
    Ok(encoder.directory)
}

struct Encoder<'a> {
    resolver: &'a dyn Resolver,
    options: &'a EncodeOptions,
    directory: GeoKeyDirectory,
}

impl<'a> Encoder<'a> {
    fn crs(&mut self, crs: &Crs) -> Result<(), EncodeError> {
        match crs {
            Crs::Geographic2D(gcs) => {
                self.directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
                self.geographic(gcs);
            }
            Crs::Geographic3D(gcs) => self.geographic3d(gcs),
            Crs::Projected(pcs) => self.projected(pcs),
            Crs::Geocentric(ccs) => self.geocentric(ccs),
            Crs::Vertical(vcs) => self.vertical(vcs),
            Crs::Compound(compound) => {
                match compound.horizontal.as_ref() {
                    Crs::Geographic2D(_) | Crs::Geographic3D(_) | Crs::Projected(_) => {
                        self.crs(&compound.horizontal)?
                    }
                    other => {
                        return Err(EncodeError::Unrepresentable(format!(
                            "compound horizontal component {other}"
                        )))
                    }
                }
                match compound.vertical.as_ref() {
                    Crs::Vertical(vcs) => self.vertical(vcs),
                    other => {
                        return Err(EncodeError::Unrepresentable(format!(
                            "compound vertical component {other}"
                        )))
                    }
                }
            }
            Crs::Local(local) => self.local(local),
            // Nothing to say; an empty directory reads back as Unknown.
            Crs::Unknown => {}
        }
        Ok(())
    }

    /// The code to cite for a component, if citing is honest: a carried
    /// code is verified against the resolver (datum shift aside), and an
    /// uncoded definition gets one chance at exact reverse lookup.
    fn citable_geographic(&self, gcs: &GeographicCrs) -> Option<u16> {
        if let Some(code) = gcs.authority_code {
            return match self.resolver.resolve_crs(code) {
                Some(Crs::Geographic2D(authority)) if gcs.matches_authority(&authority) => {
                    Some(code)
                }
                _ => None,
            };
        }
        self.resolver.find_crs_code(&Crs::Geographic2D(gcs.clone()))
    }

    fn citable_projected(&self, pcs: &ProjectedCrs) -> Option<u16> {
        if let Some(code) = pcs.authority_code {
            return match self.resolver.resolve_crs(code) {
                Some(Crs::Projected(authority)) if pcs.matches_authority(&authority) => Some(code),
                _ => None,
            };
        }
        self.resolver.find_crs_code(&Crs::Projected(pcs.clone()))
    }

    fn geographic(&mut self, gcs: &GeographicCrs) {
        match self.citable_geographic(gcs) {
            Some(code) => {
                self.directory
                    .set_short(GeoKeyId::GeographicTypeGeoKey, code);
                self.citation(GeoKeyId::GeogCitationGeoKey, &gcs.name);
                self.angular_unit_keys(&gcs.angular_unit);
                self.towgs84(&gcs.datum);
            }
            None => self.geographic_spelled_out(gcs),
        }
    }

    fn geographic_spelled_out(&mut self, gcs: &GeographicCrs) {
        self.directory
            .set_short(GeoKeyId::GeographicTypeGeoKey, USER_DEFINED);

        let fragments = format!(
            "GCS Name = {}|Datum = {}|Ellipsoid = {}|Primem = {}|AUnits = {}|",
            gcs.name,
            gcs.datum.name,
            gcs.datum.ellipsoid.name,
            gcs.prime_meridian.name,
            gcs.angular_unit.name,
        );
        self.citation(GeoKeyId::GeogCitationGeoKey, &fragments);

        self.datum_keys(&gcs.datum);
        self.prime_meridian_keys(&gcs.prime_meridian, &gcs.angular_unit);
        self.angular_unit_keys(&gcs.angular_unit);
        self.towgs84(&gcs.datum);
    }

    fn geographic3d(&mut self, gcs: &GeographicCrs) {
        self.directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);

        if self.options.version == GeoTiffVersion::V1_1 {
            let code = gcs
                .authority_code
                .filter(|code| {
                    matches!(
                        self.resolver.resolve_crs(*code),
                        Some(Crs::Geographic3D(authority)) if gcs.matches_authority(&authority)
                    )
                })
                .or_else(|| self.resolver.find_crs_code(&Crs::Geographic3D(gcs.clone())));
            if let Some(code) = code {
                self.directory
                    .set_short(GeoKeyId::GeographicTypeGeoKey, code);
                self.citation(GeoKeyId::GeogCitationGeoKey, &gcs.name);
                self.angular_unit_keys(&gcs.angular_unit);
                self.towgs84(&gcs.datum);
                return;
            }
        }

        // Legacy layout: 2D code plus ellipsoidal height keys.
        let mut base = gcs.clone();
        base.authority_code = self
            .resolver
            .find_crs_code(&Crs::Geographic2D(base.clone()));
        self.geographic(&base);
        self.directory
            .set_short(GeoKeyId::VerticalCSTypeGeoKey, 5030);
        self.directory
            .set_short(GeoKeyId::VerticalUnitsGeoKey, 9001);
    }

    fn projected(&mut self, pcs: &ProjectedCrs) {
        self.directory.set_short(GeoKeyId::GTModelTypeGeoKey, 1);
        self.citation(GeoKeyId::GTCitationGeoKey, &pcs.name);

        match self.citable_projected(pcs) {
            Some(code) => {
                self.directory
                    .set_short(GeoKeyId::ProjectedCSTypeGeoKey, code);
                self.linear_unit_keys(&pcs.linear_unit);
                self.towgs84(&pcs.geographic.datum);
            }
            None => {
                self.directory
                    .set_short(GeoKeyId::ProjectedCSTypeGeoKey, USER_DEFINED);
                self.geographic(&pcs.geographic);
                self.directory
                    .set_short(GeoKeyId::ProjectionGeoKey, USER_DEFINED);
                self.directory.set_short(
                    GeoKeyId::ProjCoordTransGeoKey,
                    pcs.projection.method.into(),
                );
                for (param, key) in pcs.projection.method.parameter_keys() {
                    if let Some(value) = pcs.projection.parameters.get(param) {
                        self.directory.set_double(*key, *value);
                    }
                }
                self.linear_unit_keys(&pcs.linear_unit);
            }
        }
    }

    fn geocentric(&mut self, ccs: &GeocentricCrs) {
        self.directory.set_short(GeoKeyId::GTModelTypeGeoKey, 3);

        let code = ccs
            .authority_code
            .filter(|code| {
                matches!(
                    self.resolver.resolve_crs(*code),
                    Some(Crs::Geocentric(authority))
                        if Crs::Geocentric(authority.clone()).is_same(&Crs::Geocentric(ccs.clone()))
                )
            })
            .or_else(|| self.resolver.find_crs_code(&Crs::Geocentric(ccs.clone())));

        match code {
            Some(code) => {
                self.directory
                    .set_short(GeoKeyId::GeographicTypeGeoKey, code);
                self.citation(GeoKeyId::GeogCitationGeoKey, &ccs.name);
            }
            None => {
                self.directory
                    .set_short(GeoKeyId::GeographicTypeGeoKey, USER_DEFINED);
                let fragments = format!(
                    "GCS Name = {}|Datum = {}|Ellipsoid = {}|Primem = {}|",
                    ccs.name, ccs.datum.name, ccs.datum.ellipsoid.name, ccs.prime_meridian.name,
                );
                self.citation(GeoKeyId::GeogCitationGeoKey, &fragments);
                self.datum_keys(&ccs.datum);
                self.prime_meridian_keys(&ccs.prime_meridian, &Unit::degree());
            }
        }

        self.geog_linear_unit_keys(&ccs.linear_unit);
        self.towgs84(&ccs.datum);
    }

    fn vertical(&mut self, vcs: &VerticalCrs) {
        let code = vcs
            .authority_code
            .filter(|code| {
                matches!(
                    self.resolver.resolve_vertical(*code),
                    Some(authority)
                        if Crs::Vertical(authority.clone()).is_same(&Crs::Vertical(vcs.clone()))
                )
            })
            .or_else(|| self.resolver.find_crs_code(&Crs::Vertical(vcs.clone())));

        self.directory.set_short(
            GeoKeyId::VerticalCSTypeGeoKey,
            code.unwrap_or(USER_DEFINED),
        );
        self.citation(GeoKeyId::VerticalCitationGeoKey, &vcs.name);
        self.directory.set_short(
            GeoKeyId::VerticalDatumGeoKey,
            vcs.datum.authority_code.unwrap_or(USER_DEFINED),
        );

        let unit_code = vcs
            .unit
            .authority_code
            .or_else(|| self.resolver.find_unit_code(&vcs.unit))
            .unwrap_or(USER_DEFINED);
        self.directory
            .set_short(GeoKeyId::VerticalUnitsGeoKey, unit_code);
    }

    fn local(&mut self, local: &LocalCrs) {
        self.citation(GeoKeyId::GTCitationGeoKey, &local.name);
        self.linear_unit_keys(&local.linear_unit);
    }

    fn datum_keys(&mut self, datum: &Datum) {
        let datum_code = datum.authority_code.filter(|code| {
            matches!(
                self.resolver.resolve_datum(*code),
                Some(authority) if authority.name == datum.name
            )
        });
        self.directory.set_short(
            GeoKeyId::GeogGeodeticDatumGeoKey,
            datum_code.unwrap_or(USER_DEFINED),
        );

        let ellipsoid = &datum.ellipsoid;
        let ellipsoid_code = ellipsoid.authority_code.filter(|code| {
            matches!(
                self.resolver.resolve_ellipsoid(*code),
                Some(authority)
                    if nearly(authority.semi_major, ellipsoid.semi_major)
                        && nearly(authority.inv_flattening, ellipsoid.inv_flattening)
            )
        });
        self.directory.set_short(
            GeoKeyId::GeogEllipsoidGeoKey,
            ellipsoid_code.unwrap_or(USER_DEFINED),
        );
        self.directory
            .set_double(GeoKeyId::GeogSemiMajorAxisGeoKey, ellipsoid.semi_major);
        self.directory.set_double(
            GeoKeyId::GeogInvFlatteningGeoKey,
            ellipsoid.inv_flattening,
        );
    }

    fn prime_meridian_keys(&mut self, pm: &PrimeMeridian, angular_unit: &Unit) {
        if let Some(code) = pm.authority_code {
            if self.resolver.resolve_prime_meridian(code).is_some() {
                self.directory
                    .set_short(GeoKeyId::GeogPrimeMeridianGeoKey, code);
                return;
            }
        }
        if pm.longitude != 0.0 {
            self.directory
                .set_short(GeoKeyId::GeogPrimeMeridianGeoKey, USER_DEFINED);
            // Stored in the angular unit of the CRS.
            let raw = pm.longitude.to_radians() / angular_unit.factor;
            self.directory
                .set_double(GeoKeyId::GeogPrimeMeridianLongGeoKey, raw);
        }
    }

    fn angular_unit_keys(&mut self, unit: &Unit) {
        let code = self.unit_code(unit);
        self.directory.set_short(
            GeoKeyId::GeogAngularUnitsGeoKey,
            code.unwrap_or(USER_DEFINED),
        );
        self.directory
            .set_double(GeoKeyId::GeogAngularUnitSizeGeoKey, unit.factor);
    }

    fn linear_unit_keys(&mut self, unit: &Unit) {
        let code = self.unit_code(unit);
        self.directory.set_short(
            GeoKeyId::ProjLinearUnitsGeoKey,
            code.unwrap_or(USER_DEFINED),
        );
        self.directory
            .set_double(GeoKeyId::ProjLinearUnitSizeGeoKey, unit.factor);
        if code.is_none() && self.options.write_citations {
            let fragment = format!("LUnits = {} ({})|", unit.factor, unit.name);
            self.citation(GeoKeyId::PCSCitationGeoKey, &fragment);
        }
    }

    fn geog_linear_unit_keys(&mut self, unit: &Unit) {
        let code = self.unit_code(unit);
        self.directory.set_short(
            GeoKeyId::GeogLinearUnitsGeoKey,
            code.unwrap_or(USER_DEFINED),
        );
        self.directory
            .set_double(GeoKeyId::GeogLinearUnitSizeGeoKey, unit.factor);
    }

    fn unit_code(&self, unit: &Unit) -> Option<u16> {
        unit.authority_code
            .filter(|code| {
                matches!(
                    self.resolver.resolve_unit(*code),
                    Some(authority) if nearly(authority.factor, unit.factor)
                )
            })
            .or_else(|| self.resolver.find_unit_code(unit))
    }

    fn towgs84(&mut self, datum: &Datum) {
        if let Some(towgs84) = datum.towgs84 {
            self.directory.set(
                GeoKeyId::GeogTOWGS84GeoKey,
                GeoKeyValue::Double(towgs84.to_vec()),
            );
        }
    }

    fn citation<I: Into<u16>>(&mut self, key: I, text: &str) {
        if self.options.write_citations && !text.is_empty() {
            self.directory.set_string(key, text);
        }
    }
}

fn nearly(a: f64, b: f64) -> bool {
    (a - b).abs() <= crate::crs::SAME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}
