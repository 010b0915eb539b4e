//! GeoKey directory -> CRS graph.
//!
//! Decoding is deliberately permissive: real-world producers leave keys out,
//! write contradictory ones, or hide information in citation text. Semantic
//! problems therefore accumulate as warnings and decoding carries on with
//! documented fallbacks; only a structurally malformed directory (caught at
//! directory construction) or strict mode can make this path fail.

use std::fmt::Display;

use tracing::warn;

use crate::crs::{
    AxisOrder, CompoundCrs, Crs, Datum, Ellipsoid, GeocentricCrs, GeographicCrs, LocalCrs,
    PrimeMeridian, ProjMethod, ProjParam, ProjectedCrs, Projection, Unit, UnitKind, VerticalCrs,
    VerticalDatum,
};
use crate::geokeys::{GeoKeyDirectory, GeoKeyId};
use crate::registry::{is_ellipsoidal_height, Resolver};

mod citation;

pub use citation::CitationHints;

use citation::{is_fragmented, scrape};

pub const USER_DEFINED: u16 = 32767;

#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Wrap a vertical component into a Compound result instead of
    /// reporting the horizontal CRS only.
    pub report_compound: bool,
    /// Consult the resolver for cited authority codes.
    pub import_from_authority: bool,
    /// Promote warnings to hard failures.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            report_compound: false,
            import_from_authority: true,
            strict: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Warning {
    UnresolvableReference { key: GeoKeyId, code: u16 },
    AmbiguousDefinition(String),
    DefaultedUnit(UnitKind),
    DefaultedEllipsoid,
    UnknownMethod(u16),
    UnknownModelType(u16),
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnresolvableReference { key, code } => {
                write!(f, "{key:?} cites code {code} not known to the resolver")
            }
            Warning::AmbiguousDefinition(detail) => write!(f, "{detail}"),
            Warning::DefaultedUnit(UnitKind::Linear) => {
                write!(f, "no linear unit specified, assuming metre")
            }
            Warning::DefaultedUnit(UnitKind::Angular) => {
                write!(f, "no angular unit specified, assuming degree")
            }
            Warning::DefaultedEllipsoid => {
                write!(f, "ellipsoid unretrievable, assuming WGS 84 parameters")
            }
            Warning::UnknownMethod(code) => {
                write!(f, "unknown coordinate transformation method {code}")
            }
            Warning::UnknownModelType(code) => write!(f, "unknown model type {code}"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum DecodeError {
    /// A warning promoted by strict mode.
    Strict(Warning),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Strict(warning) => write!(f, "strict mode: {warning}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode result. The vertical component is always exposed here when the
/// directory carries one; whether it also gets folded into `crs` is up to
/// [`DecodeOptions::report_compound`].
#[derive(Clone, Debug)]
pub struct Decoded {
    pub crs: Crs,
    pub vertical: Option<VerticalCrs>,
    pub warnings: Vec<Warning>,
}

pub fn decode(
    directory: &GeoKeyDirectory,
    resolver: &dyn Resolver,
    options: &DecodeOptions,
) -> Result<Decoded, DecodeError> {
    let mut decoder = Decoder {
        directory,
        resolver,
        options,
        warnings: vec![],
    };

    let horizontal = decoder.horizontal();
    let vertical = decoder.vertical();

    let (crs, vertical) = match (horizontal, vertical) {
        (Crs::Geographic2D(gcs), Some((_, true))) => {
            // Ellipsoidal height on a geographic CRS is really its third
            // dimension, not an independent vertical system.
            let mut gcs3 = gcs;
            gcs3.authority_code = resolver.find_crs_code(&Crs::Geographic3D(gcs3.clone()));
            (Crs::Geographic3D(gcs3), None)
        }
        (horizontal, Some((vertical, _)))
            if options.report_compound && !horizontal.is_unknown() =>
        {
            let name = match horizontal.name() {
                Some(horizontal_name) => format!("{} + {}", horizontal_name, vertical.name),
                None => vertical.name.clone(),
            };
            let compound = Crs::Compound(CompoundCrs {
                name,
                horizontal: Box::new(horizontal),
                vertical: Box::new(Crs::Vertical(vertical.clone())),
            });
            (compound, Some(vertical))
        }
        (horizontal, Some((vertical, _))) => (horizontal, Some(vertical)),
        (horizontal, None) => (horizontal, None),
    };

    if options.strict {
        if let Some(warning) = decoder.warnings.first() {
            return Err(DecodeError::Strict(warning.clone()));
        }
    }

    Ok(Decoded {
        crs,
        vertical,
        warnings: decoder.warnings,
    })
}

struct Decoder<'a> {
    directory: &'a GeoKeyDirectory,
    resolver: &'a dyn Resolver,
    options: &'a DecodeOptions,
    warnings: Vec<Warning>,
}

impl<'a> Decoder<'a> {
    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// A SHORT key value with the user-defined sentinel mapped to None.
    fn code(&self, key: GeoKeyId) -> Option<u16> {
        self.directory
            .short(key)
            .filter(|code| *code != USER_DEFINED && *code != 0)
    }

    fn has(&self, key: GeoKeyId) -> bool {
        self.directory.get(key).is_some()
    }

    fn resolve_crs(&mut self, key: GeoKeyId, code: u16) -> Option<Crs> {
        if !self.options.import_from_authority {
            return None;
        }
        let resolved = self.resolver.resolve_crs(code);
        if resolved.is_none() {
            self.warn(Warning::UnresolvableReference { key, code });
        }
        resolved
    }

    fn horizontal(&mut self) -> Crs {
        match self.directory.short(GeoKeyId::GTModelTypeGeoKey) {
            Some(1) => self.projected(),
            Some(2) => {
                let (gcs, dim3) = self.geographic(None);
                if dim3 {
                    Crs::Geographic3D(gcs)
                } else {
                    Crs::Geographic2D(gcs)
                }
            }
            Some(3) => self.geocentric(),
            Some(USER_DEFINED) | None => self.undeclared_model(),
            Some(other) => {
                self.warn(Warning::UnknownModelType(other));
                Crs::Unknown
            }
        }
    }

    /// No usable model key: infer the model from whichever keys are present,
    /// or fall back to a citation-named local system.
    fn undeclared_model(&mut self) -> Crs {
        if self.has(GeoKeyId::ProjectedCSTypeGeoKey)
            || self.has(GeoKeyId::ProjCoordTransGeoKey)
            || self.has(GeoKeyId::ProjectionGeoKey)
        {
            return self.projected();
        }
        if self.has(GeoKeyId::GeographicTypeGeoKey)
            || self.has(GeoKeyId::GeogGeodeticDatumGeoKey)
            || self.has(GeoKeyId::GeogEllipsoidGeoKey)
        {
            let (gcs, dim3) = self.geographic(None);
            return if dim3 {
                Crs::Geographic3D(gcs)
            } else {
                Crs::Geographic2D(gcs)
            };
        }

        let citation = self
            .directory
            .string(GeoKeyId::GTCitationGeoKey)
            .or_else(|| self.directory.string(GeoKeyId::PCSCitationGeoKey));
        match citation {
            Some(text) => {
                let hints = scrape(text);
                Crs::Local(LocalCrs {
                    name: text.to_string(),
                    linear_unit: self.local_linear_unit(&hints),
                })
            }
            None => Crs::Unknown,
        }
    }

    fn local_linear_unit(&mut self, hints: &CitationHints) -> Unit {
        if let Some(unit) = self.explicit_linear_unit(GeoKeyId::ProjLinearUnitsGeoKey, hints) {
            return unit;
        }
        if let Some(name) = &hints.linear_unit_name {
            if let Some(unit) = self.resolver.resolve_unit_by_name(name) {
                return unit;
            }
            if matches!(name.as_str(), "meters" | "meter" | "m") {
                return Unit::metre();
            }
        }
        Unit::metre()
    }

    /// The geographic CRS spelled by the Geog* keys, overriding `seed`
    /// (typically the base CRS of a code-resolved projected system).
    /// The second value is true when the cited code is a 3D system.
    fn geographic(&mut self, seed: Option<GeographicCrs>) -> (GeographicCrs, bool) {
        let code = self.code(GeoKeyId::GeographicTypeGeoKey);
        let mut dim3 = false;
        let mut baseline = None;
        if let Some(code) = code {
            match self.resolve_crs(GeoKeyId::GeographicTypeGeoKey, code) {
                Some(Crs::Geographic2D(gcs)) => baseline = Some(gcs),
                Some(Crs::Geographic3D(gcs)) => {
                    baseline = Some(gcs);
                    dim3 = true;
                }
                Some(_) => self.warn(Warning::UnresolvableReference {
                    key: GeoKeyId::GeographicTypeGeoKey,
                    code,
                }),
                None => {}
            }
        }
        let resolved = baseline.clone();
        let baseline = baseline.or(seed);

        let citation = self.directory.string(GeoKeyId::GeogCitationGeoKey);
        let hints = citation.map(scrape).unwrap_or_default();

        let angular_unit = self.angular_unit(&baseline, &hints);
        let datum = self.datum(&baseline, &hints);
        let prime_meridian = self.prime_meridian(&baseline, &hints, &angular_unit);

        let name = citation
            .and_then(plain_name)
            .map(str::to_string)
            .or(hints.gcs_name.clone())
            .or_else(|| baseline.as_ref().map(|gcs| gcs.name.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        let mut gcs = GeographicCrs {
            name,
            authority_code: code.or_else(|| baseline.as_ref().and_then(|b| b.authority_code)),
            datum,
            prime_meridian,
            angular_unit,
            axis_order: AxisOrder::default(),
        };

        // A resolved code stays on the result only while the definition
        // still matches the authority one; a datum shift override alone
        // does not break the match.
        if let (Some(_), Some(resolved)) = (gcs.authority_code, &resolved) {
            if !gcs.matches_authority(resolved) {
                gcs.authority_code = None;
            }
        }

        (gcs, dim3)
    }

    fn datum(&mut self, baseline: &Option<GeographicCrs>, hints: &CitationHints) -> Datum {
        let datum_code = self.code(GeoKeyId::GeogGeodeticDatumGeoKey);
        let mut datum = None;
        if let Some(code) = datum_code {
            if self.options.import_from_authority {
                datum = self.resolver.resolve_datum(code);
                if datum.is_none() {
                    self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::GeogGeodeticDatumGeoKey,
                        code,
                    });
                }
            }
        }
        let mut datum = datum
            .or_else(|| baseline.as_ref().map(|gcs| gcs.datum.clone()))
            .unwrap_or_else(|| {
                let name = hints
                    .datum_name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let mut datum = Datum::new(name, self.default_ellipsoid(hints));
                datum.authority_code = datum_code;
                datum
            });

        self.apply_ellipsoid_keys(&mut datum.ellipsoid, hints);

        if let Some(values) = self.directory.doubles(GeoKeyId::GeogTOWGS84GeoKey) {
            if values.len() == 3 || values.len() == 7 {
                let mut towgs84 = [0.0; 7];
                towgs84[..values.len()].copy_from_slice(&values);
                datum.towgs84 = Some(towgs84);
            }
        }

        datum
    }

    fn default_ellipsoid(&mut self, hints: &CitationHints) -> Ellipsoid {
        let has_shape_keys = self.has(GeoKeyId::GeogSemiMajorAxisGeoKey)
            || self.has(GeoKeyId::GeogEllipsoidGeoKey);
        if !has_shape_keys {
            self.warn(Warning::DefaultedEllipsoid);
        }
        let name = hints
            .ellipsoid_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        Ellipsoid::new(name, 6378137.0, 298.257223563)
    }

    fn apply_ellipsoid_keys(&mut self, ellipsoid: &mut Ellipsoid, hints: &CitationHints) {
        if let Some(code) = self.code(GeoKeyId::GeogEllipsoidGeoKey) {
            if self.options.import_from_authority {
                match self.resolver.resolve_ellipsoid(code) {
                    Some(resolved) => *ellipsoid = resolved,
                    None => self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::GeogEllipsoidGeoKey,
                        code,
                    }),
                }
            } else {
                ellipsoid.authority_code = Some(code);
            }
        }

        let semi_major = self.directory.double(GeoKeyId::GeogSemiMajorAxisGeoKey);
        let semi_minor = self.directory.double(GeoKeyId::GeogSemiMinorAxisGeoKey);
        let inv_flattening = self.directory.double(GeoKeyId::GeogInvFlatteningGeoKey);

        if let Some(a) = semi_major {
            ellipsoid.semi_major = a;
        }
        if let Some(rf) = inv_flattening {
            ellipsoid.inv_flattening = rf;
        } else if let Some(b) = semi_minor {
            ellipsoid.inv_flattening = if b == ellipsoid.semi_major {
                0.0
            } else {
                ellipsoid.semi_major / (ellipsoid.semi_major - b)
            };
        }
        if (semi_major.is_some() || semi_minor.is_some() || inv_flattening.is_some())
            && hints.ellipsoid_name.is_some()
        {
            ellipsoid.name = hints.ellipsoid_name.clone().unwrap();
        }
    }

    fn prime_meridian(
        &mut self,
        baseline: &Option<GeographicCrs>,
        hints: &CitationHints,
        angular_unit: &Unit,
    ) -> PrimeMeridian {
        let mut pm = None;
        if let Some(code) = self.code(GeoKeyId::GeogPrimeMeridianGeoKey) {
            if self.options.import_from_authority {
                pm = self.resolver.resolve_prime_meridian(code);
                if pm.is_none() {
                    self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::GeogPrimeMeridianGeoKey,
                        code,
                    });
                }
            }
        }
        let mut pm = pm
            .or_else(|| baseline.as_ref().map(|gcs| gcs.prime_meridian.clone()))
            .unwrap_or_else(PrimeMeridian::greenwich);

        if let Some(raw) = self.directory.double(GeoKeyId::GeogPrimeMeridianLongGeoKey) {
            // Stored in the angular unit of the CRS.
            pm.longitude = (raw * angular_unit.factor).to_degrees();
            if let Some(name) = &hints.prime_meridian_name {
                pm.name = name.clone();
            }
        }
        pm
    }

    fn angular_unit(&mut self, baseline: &Option<GeographicCrs>, hints: &CitationHints) -> Unit {
        let size = self.directory.double(GeoKeyId::GeogAngularUnitSizeGeoKey);

        let mut unit = None;
        if let Some(code) = self.code(GeoKeyId::GeogAngularUnitsGeoKey) {
            unit = self.resolver.resolve_unit(code);
            if unit.is_none() {
                self.warn(Warning::UnresolvableReference {
                    key: GeoKeyId::GeogAngularUnitsGeoKey,
                    code,
                });
            }
        }

        match (unit, size) {
            (Some(mut unit), Some(size)) => {
                if !nearly(unit.factor, size) {
                    unit.factor = size;
                    unit.authority_code = None;
                }
                unit
            }
            (Some(unit), None) => unit,
            (None, Some(size)) => {
                let name = hints
                    .angular_unit_name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                Unit::angular(name, size)
            }
            (None, None) => match baseline {
                Some(gcs) => gcs.angular_unit.clone(),
                None => {
                    self.warn(Warning::DefaultedUnit(UnitKind::Angular));
                    Unit::degree()
                }
            },
        }
    }

    fn explicit_linear_unit(&mut self, key: GeoKeyId, hints: &CitationHints) -> Option<Unit> {
        let size_key = match key {
            GeoKeyId::ProjLinearUnitsGeoKey => GeoKeyId::ProjLinearUnitSizeGeoKey,
            _ => GeoKeyId::GeogLinearUnitSizeGeoKey,
        };
        let size = self.directory.double(size_key);

        let mut unit = None;
        if let Some(code) = self.code(key) {
            unit = self.resolver.resolve_unit(code);
            if unit.is_none() {
                self.warn(Warning::UnresolvableReference { key, code });
            }
        }

        match (unit, size) {
            (Some(mut unit), Some(size)) => {
                if !nearly(unit.factor, size) {
                    unit.factor = size;
                    unit.authority_code = None;
                }
                Some(unit)
            }
            (Some(unit), None) => Some(unit),
            (None, Some(size)) => {
                let name = hints
                    .linear_unit
                    .as_ref()
                    .and_then(|(_, name)| name.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                Some(Unit::linear(name, size))
            }
            (None, None) => hints
                .linear_unit
                .as_ref()
                .map(|(factor, name)| {
                    Unit::linear(name.clone().unwrap_or_else(|| "unknown".to_string()), *factor)
                }),
        }
    }

    fn projected(&mut self) -> Crs {
        let pcs_code = self.code(GeoKeyId::ProjectedCSTypeGeoKey);
        let mut baseline = None;
        if let Some(code) = pcs_code {
            match self.resolve_crs(GeoKeyId::ProjectedCSTypeGeoKey, code) {
                Some(Crs::Projected(pcs)) => baseline = Some(pcs),
                Some(_) => self.warn(Warning::UnresolvableReference {
                    key: GeoKeyId::ProjectedCSTypeGeoKey,
                    code,
                }),
                None => {}
            }
        }

        let (geographic, _) =
            self.geographic(baseline.as_ref().map(|pcs| pcs.geographic.clone()));

        let projection = match self.projection(&baseline) {
            Some(projection) => projection,
            None => return Crs::Unknown,
        };

        let citation = self.directory.string(GeoKeyId::PCSCitationGeoKey);
        let hints = citation.map(scrape).unwrap_or_default();
        let linear_unit = self
            .explicit_linear_unit(GeoKeyId::ProjLinearUnitsGeoKey, &hints)
            .or_else(|| baseline.as_ref().map(|pcs| pcs.linear_unit.clone()))
            .unwrap_or_else(|| {
                self.warn(Warning::DefaultedUnit(UnitKind::Linear));
                Unit::metre()
            });

        let name = self
            .directory
            .string(GeoKeyId::GTCitationGeoKey)
            .and_then(plain_name)
            .or_else(|| citation.and_then(plain_name))
            .map(str::to_string)
            .or_else(|| baseline.as_ref().map(|pcs| pcs.name.clone()))
            .unwrap_or_else(|| "unnamed".to_string());

        let mut projection = projection;
        if let Some(baseline) = &baseline {
            if !nearly(baseline.linear_unit.factor, linear_unit.factor) {
                // Length parameters inherited from the resolved definition
                // are in its unit; re-express them in the override unit.
                // Explicitly keyed values are already in the file's unit.
                let rescale = baseline.linear_unit.factor / linear_unit.factor;
                let keys: Vec<(ProjParam, GeoKeyId)> = projection
                    .method
                    .parameter_keys()
                    .iter()
                    .filter(|(param, _)| !param.is_angular() && *param != ProjParam::ScaleFactor)
                    .copied()
                    .collect();
                for (param, key) in keys {
                    if self.directory.double(key).is_none() {
                        if let Some(value) = projection.parameters.get_mut(&param) {
                            *value *= rescale;
                        }
                    }
                }
            }
        }

        let mut pcs = ProjectedCrs {
            name,
            authority_code: pcs_code,
            geographic,
            projection,
            linear_unit,
            axis_order: AxisOrder::default(),
        };

        if let (Some(_), Some(baseline)) = (pcs.authority_code, &baseline) {
            if !pcs.matches_authority(baseline) {
                pcs.authority_code = None;
            }
        }

        Crs::Projected(pcs)
    }

    /// Method and parameters, in priority order: explicit transformation
    /// keys, then a cited conversion code, then whatever the resolved
    /// projected CRS carried.
    fn projection(&mut self, baseline: &Option<ProjectedCrs>) -> Option<Projection> {
        let conversion = match self.code(GeoKeyId::ProjectionGeoKey) {
            Some(code) if self.options.import_from_authority => {
                let conversion = self.resolver.resolve_conversion(code);
                if conversion.is_none() {
                    self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::ProjectionGeoKey,
                        code,
                    });
                }
                conversion
            }
            _ => None,
        };

        let method = match self.directory.short(GeoKeyId::ProjCoordTransGeoKey) {
            Some(code) => match ProjMethod::try_from(code) {
                Ok(method) => Some(method),
                Err(_) => {
                    self.warn(Warning::UnknownMethod(code));
                    None
                }
            },
            None => None,
        };

        let mut projection = match (method, conversion, baseline) {
            (Some(method), conversion, _) => {
                let mut projection = Projection::new(method);
                if let Some(conversion) = conversion {
                    if conversion.method == method {
                        projection.parameters = conversion.parameters;
                    }
                }
                projection
            }
            (None, Some(conversion), _) => conversion,
            (None, None, Some(baseline)) => baseline.projection.clone(),
            (None, None, None) => return None,
        };

        for (param, key) in projection.method.parameter_keys() {
            if let Some(value) = self.directory.double(*key) {
                projection.parameters.insert(*param, value);
            }
        }

        // Producers sometimes write both parametrizations of the same
        // method. The natural-origin scale form wins deterministically.
        if projection.method.dual_parametrization()
            && projection.parameters.contains_key(&ProjParam::ScaleFactor)
            && projection
                .parameters
                .contains_key(&ProjParam::StandardParallel1)
        {
            projection.parameters.remove(&ProjParam::StandardParallel1);
            self.warn(Warning::AmbiguousDefinition(format!(
                "both a standard parallel and a scale at natural origin given for {:?}, using the scale form",
                projection.method
            )));
        }

        Some(projection)
    }

    fn geocentric(&mut self) -> Crs {
        let code = self.code(GeoKeyId::GeographicTypeGeoKey);
        let mut baseline = None;
        if let Some(code) = code {
            match self.resolve_crs(GeoKeyId::GeographicTypeGeoKey, code) {
                Some(Crs::Geocentric(ccs)) => baseline = Some(ccs),
                Some(_) | None => {}
            }
        }

        let citation = self.directory.string(GeoKeyId::GeogCitationGeoKey);
        let hints = citation.map(scrape).unwrap_or_default();

        let seed = baseline.as_ref().map(|ccs| GeographicCrs {
            name: ccs.name.clone(),
            authority_code: ccs.authority_code,
            datum: ccs.datum.clone(),
            prime_meridian: ccs.prime_meridian.clone(),
            angular_unit: Unit::degree(),
            axis_order: AxisOrder::default(),
        });
        let datum = self.datum(&seed, &hints);
        let prime_meridian = self.prime_meridian(&seed, &hints, &Unit::degree());

        let linear_unit = self
            .explicit_linear_unit(GeoKeyId::GeogLinearUnitsGeoKey, &hints)
            .or_else(|| baseline.as_ref().map(|ccs| ccs.linear_unit.clone()))
            .unwrap_or_else(|| {
                self.warn(Warning::DefaultedUnit(UnitKind::Linear));
                Unit::metre()
            });

        let name = citation
            .and_then(plain_name)
            .map(str::to_string)
            .or(hints.gcs_name)
            .or_else(|| baseline.as_ref().map(|ccs| ccs.name.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        Crs::Geocentric(GeocentricCrs {
            name,
            authority_code: code,
            datum,
            prime_meridian,
            linear_unit,
        })
    }

    /// The vertical component, when any vertical key is present. The bool
    /// marks an ellipsoidal-height system (a 3D geographic CRS in disguise).
    fn vertical(&mut self) -> Option<(VerticalCrs, bool)> {
        let present = self.has(GeoKeyId::VerticalCSTypeGeoKey)
            || self.has(GeoKeyId::VerticalDatumGeoKey)
            || self.has(GeoKeyId::VerticalUnitsGeoKey)
            || self.has(GeoKeyId::VerticalCitationGeoKey);
        if !present {
            return None;
        }

        let code = self.code(GeoKeyId::VerticalCSTypeGeoKey);
        let ellipsoidal = code.is_some_and(is_ellipsoidal_height);

        let mut baseline = None;
        if let Some(code) = code {
            if !ellipsoidal && self.options.import_from_authority {
                baseline = self.resolver.resolve_vertical(code);
                if baseline.is_none() {
                    self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::VerticalCSTypeGeoKey,
                        code,
                    });
                }
            }
        }

        let name = self
            .directory
            .string(GeoKeyId::VerticalCitationGeoKey)
            .map(str::to_string)
            .or_else(|| baseline.as_ref().map(|vcs| vcs.name.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        let datum = match self.code(GeoKeyId::VerticalDatumGeoKey) {
            Some(datum_code) => match &baseline {
                Some(vcs) if vcs.datum.authority_code == Some(datum_code) => vcs.datum.clone(),
                _ => VerticalDatum {
                    name: "unknown".to_string(),
                    authority_code: Some(datum_code),
                    datum_type: 2005,
                },
            },
            None => baseline
                .as_ref()
                .map(|vcs| vcs.datum.clone())
                .unwrap_or_else(|| VerticalDatum {
                    name: "unknown".to_string(),
                    authority_code: None,
                    datum_type: 2005,
                }),
        };

        let unit = match self.code(GeoKeyId::VerticalUnitsGeoKey) {
            Some(unit_code) => match self.resolver.resolve_unit(unit_code) {
                Some(unit) => unit,
                None => {
                    self.warn(Warning::UnresolvableReference {
                        key: GeoKeyId::VerticalUnitsGeoKey,
                        code: unit_code,
                    });
                    Unit::metre()
                }
            },
            None => match &baseline {
                Some(vcs) => vcs.unit.clone(),
                None => {
                    self.warn(Warning::DefaultedUnit(UnitKind::Linear));
                    Unit::metre()
                }
            },
        };

        Some((
            VerticalCrs {
                name,
                authority_code: code,
                datum,
                unit,
            },
            ellipsoidal,
        ))
    }
}

fn nearly(a: f64, b: f64) -> bool {
    (a - b).abs() <= crate::crs::SAME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// The citation head usable as a display name: the part before the first
/// separator, unless it is fragment metadata.
fn plain_name(citation: &str) -> Option<&str> {
    let head = citation.split('|').next()?.trim();
    if head.is_empty() || is_fragmented(head) {
        None
    } else {
        Some(head)
    }
}

