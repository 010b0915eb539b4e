//! PROJ parameter-string bridge.
//!
//! Covers the common projection methods and the ellipsoid/datum/unit
//! vocabulary the registry knows. Values follow proj conventions on the
//! string side (`+x_0` in metres, angles in degrees) and are converted to
//! the graph's conventions (lengths in the CRS linear unit) on the way in.

use std::fmt::Display;

use crate::crs::{
    AxisOrder, Crs, Datum, Ellipsoid, GeocentricCrs, GeographicCrs, PrimeMeridian, ProjMethod,
    ProjParam, ProjectedCrs, Projection, Unit,
};
use crate::registry::tables;
use crate::wkt::format_number;

#[derive(Debug, Clone, PartialEq)]
pub enum ProjError {
    MissingProjection,
    UnknownProjection(String),
    BadParameter(String),
    Unrepresentable(String),
}

impl Display for ProjError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjError::MissingProjection => write!(f, "no +proj parameter"),
            ProjError::UnknownProjection(name) => write!(f, "unknown projection +proj={name}"),
            ProjError::BadParameter(detail) => write!(f, "bad parameter: {detail}"),
            ProjError::Unrepresentable(detail) => {
                write!(f, "no proj string representation: {detail}")
            }
        }
    }
}

impl std::error::Error for ProjError {}

struct ProjParams {
    pairs: Vec<(String, Option<String>)>,
}

impl ProjParams {
    fn parse(text: &str) -> Self {
        let pairs = text
            .split_whitespace()
            .map(|token| {
                let token = token.trim_start_matches('+');
                match token.split_once('=') {
                    Some((key, value)) => (key.to_string(), Some(value.to_string())),
                    None => (token.to_string(), None),
                }
            })
            .collect();
        Self { pairs }
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    fn number(&self, key: &str) -> Result<Option<f64>, ProjError> {
        match self.value(key) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ProjError::BadParameter(format!("+{key}={raw}"))),
            None => Ok(None),
        }
    }
}

pub fn from_proj_string(text: &str) -> Result<Crs, ProjError> {
    let params = ProjParams::parse(text);
    let proj = params.value("proj").ok_or(ProjError::MissingProjection)?;

    let datum = parse_datum(&params)?;
    let prime_meridian = parse_prime_meridian(&params)?;
    let gcs_name = datum
        .authority_code
        .and_then(|code| {
            tables::GEOGRAPHIC
                .iter()
                .find(|entry| entry.datum == code)
                .map(|entry| entry.name.to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    let geographic = GeographicCrs {
        name: gcs_name,
        authority_code: None,
        datum,
        prime_meridian,
        angular_unit: Unit::degree(),
        axis_order: AxisOrder::default(),
    };

    match proj {
        "longlat" | "latlong" | "lonlat" | "latlon" => Ok(Crs::Geographic2D(geographic)),
        "geocent" => Ok(Crs::Geocentric(GeocentricCrs {
            name: geographic.name.clone(),
            authority_code: None,
            datum: geographic.datum,
            prime_meridian: geographic.prime_meridian,
            linear_unit: Unit::metre(),
        })),
        _ => projected_from_params(proj, &params, geographic).map(Crs::Projected),
    }
}

fn parse_datum(params: &ProjParams) -> Result<Datum, ProjError> {
    let mut datum = None;
    if let Some(name) = params.value("datum") {
        let entry = tables::DATUMS
            .iter()
            .find(|entry| entry.proj_name == Some(name))
            .ok_or_else(|| ProjError::BadParameter(format!("+datum={name}")))?;
        let ellipsoid_entry = tables::ELLIPSOIDS
            .iter()
            .find(|e| e.code == entry.ellipsoid)
            .expect("datum table references known ellipsoid");
        datum = Some(Datum {
            name: entry.name.to_string(),
            authority_code: Some(entry.code),
            ellipsoid: Ellipsoid::new(
                ellipsoid_entry.name,
                ellipsoid_entry.semi_major,
                ellipsoid_entry.inv_flattening,
            )
            .with_code(ellipsoid_entry.code),
            towgs84: None,
        });
    }

    let mut datum = match datum {
        Some(datum) => datum,
        None => {
            let ellipsoid = if let Some(name) = params.value("ellps") {
                let entry = tables::ELLIPSOIDS
                    .iter()
                    .find(|entry| entry.proj_name == name)
                    .ok_or_else(|| ProjError::BadParameter(format!("+ellps={name}")))?;
                Ellipsoid::new(entry.name, entry.semi_major, entry.inv_flattening)
                    .with_code(entry.code)
            } else if let Some(a) = params.number("a")? {
                if let Some(rf) = params.number("rf")? {
                    Ellipsoid::new("unknown", a, rf)
                } else if let Some(b) = params.number("b")? {
                    Ellipsoid::from_semi_minor("unknown", a, b)
                } else {
                    Ellipsoid::new("unknown", a, 0.0)
                }
            } else if let Some(radius) = params.number("R")? {
                Ellipsoid::new("unknown", radius, 0.0)
            } else {
                // proj defaults to WGS 84 when nothing is said.
                Ellipsoid::new("WGS 84", 6378137.0, 298.257223563).with_code(7030)
            };
            Datum::new("unknown", ellipsoid)
        }
    };

    if let Some(raw) = params.value("towgs84") {
        let values: Result<Vec<f64>, _> = raw.split(',').map(str::trim).map(str::parse).collect();
        let values = values.map_err(|_| ProjError::BadParameter(format!("+towgs84={raw}")))?;
        if values.is_empty() || values.len() > 7 {
            return Err(ProjError::BadParameter(format!("+towgs84={raw}")));
        }
        let mut towgs84 = [0.0; 7];
        towgs84[..values.len()].copy_from_slice(&values);
        datum.towgs84 = Some(towgs84);
    }

    Ok(datum)
}

fn parse_prime_meridian(params: &ProjParams) -> Result<PrimeMeridian, ProjError> {
    match params.value("pm") {
        None => Ok(PrimeMeridian::greenwich()),
        Some(raw) => {
            if let Some(entry) = tables::PRIME_MERIDIANS
                .iter()
                .find(|entry| entry.name.eq_ignore_ascii_case(raw))
            {
                return Ok(PrimeMeridian {
                    name: entry.name.to_string(),
                    authority_code: Some(entry.code),
                    longitude: entry.longitude,
                });
            }
            let longitude = raw
                .parse()
                .map_err(|_| ProjError::BadParameter(format!("+pm={raw}")))?;
            Ok(PrimeMeridian::new("unnamed", longitude))
        }
    }
}

fn parse_linear_unit(params: &ProjParams) -> Result<Unit, ProjError> {
    if let Some(name) = params.value("units") {
        return match name {
            "m" => Ok(Unit::metre()),
            "ft" => Ok(Unit::linear("foot", 0.3048).with_code(9002)),
            "us-ft" => Ok(Unit::linear("us_survey_feet", 0.3048006096012192).with_code(9003)),
            "km" => Ok(Unit::linear("kilometre", 1000.0).with_code(9036)),
            other => Err(ProjError::BadParameter(format!("+units={other}"))),
        };
    }
    if let Some(to_meter) = params.number("to_meter")? {
        return Ok(Unit::linear("unknown", to_meter));
    }
    Ok(Unit::metre())
}

fn projected_from_params(
    proj: &str,
    params: &ProjParams,
    geographic: GeographicCrs,
) -> Result<ProjectedCrs, ProjError> {
    use ProjParam::*;

    let lat_0 = params.number("lat_0")?;
    let lon_0 = params.number("lon_0")?;
    let lonc = params.number("lonc")?;
    let lat_1 = params.number("lat_1")?;
    let lat_2 = params.number("lat_2")?;
    let lat_ts = params.number("lat_ts")?;
    let k = match params.number("k")? {
        Some(k) => Some(k),
        None => params.number("k_0")?,
    };
    let alpha = params.number("alpha")?;
    let gamma = params.number("gamma")?;

    let mut name = "unnamed".to_string();
    let mut projection;
    match proj {
        "utm" => {
            let zone = params
                .number("zone")?
                .ok_or_else(|| ProjError::BadParameter("+proj=utm without +zone".to_string()))?
                as u16;
            if !(1..=60).contains(&zone) {
                return Err(ProjError::BadParameter(format!("+zone={zone}")));
            }
            let south = params.has("south");
            name = format!(
                "UTM Zone {zone}, {} Hemisphere",
                if south { "Southern" } else { "Northern" }
            );
            projection = Projection::new(ProjMethod::TransverseMercator)
                .with(LatitudeOfOrigin, 0.0)
                .with(CentralMeridian, zone as f64 * 6.0 - 183.0)
                .with(ScaleFactor, 0.9996)
                .with(FalseEasting, 500000.0)
                .with(FalseNorthing, if south { 10000000.0 } else { 0.0 });
        }
        "tmerc" => {
            projection = Projection::new(ProjMethod::TransverseMercator)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0))
                .with(ScaleFactor, k.unwrap_or(1.0));
        }
        "merc" => {
            projection = Projection::new(ProjMethod::Mercator)
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
            match lat_ts {
                Some(lat_ts) if k.is_none() => {
                    projection = projection.with(StandardParallel1, lat_ts);
                }
                _ => {
                    projection = projection.with(ScaleFactor, k.unwrap_or(1.0));
                }
            }
        }
        "lcc" => {
            if let Some(lat_2) = lat_2 {
                projection = Projection::new(ProjMethod::LambertConfConic2SP)
                    .with(StandardParallel1, lat_1.unwrap_or(0.0))
                    .with(StandardParallel2, lat_2)
                    .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                    .with(CentralMeridian, lon_0.unwrap_or(0.0));
            } else {
                projection = Projection::new(ProjMethod::LambertConfConic1SP)
                    .with(LatitudeOfOrigin, lat_0.or(lat_1).unwrap_or(0.0))
                    .with(CentralMeridian, lon_0.unwrap_or(0.0))
                    .with(ScaleFactor, k.unwrap_or(1.0));
            }
        }
        "stere" => {
            let origin = lat_0.unwrap_or(0.0);
            if origin.abs() == 90.0 {
                projection = Projection::new(ProjMethod::PolarStereographic)
                    .with(LatitudeOfOrigin, lat_ts.unwrap_or(origin))
                    .with(StraightVerticalPoleLong, lon_0.unwrap_or(0.0))
                    .with(ScaleFactor, k.unwrap_or(1.0));
            } else {
                projection = Projection::new(ProjMethod::Stereographic)
                    .with(LatitudeOfOrigin, origin)
                    .with(CentralMeridian, lon_0.unwrap_or(0.0))
                    .with(ScaleFactor, k.unwrap_or(1.0));
            }
        }
        "sterea" => {
            projection = Projection::new(ProjMethod::ObliqueStereographic)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0))
                .with(ScaleFactor, k.unwrap_or(1.0));
        }
        "laea" => {
            projection = Projection::new(ProjMethod::LambertAzimEqualArea)
                .with(LatitudeOfCenter, lat_0.unwrap_or(0.0))
                .with(LongitudeOfCenter, lon_0.unwrap_or(0.0));
        }
        "aea" => {
            projection = Projection::new(ProjMethod::AlbersEqualArea)
                .with(StandardParallel1, lat_1.unwrap_or(0.0))
                .with(StandardParallel2, lat_2.unwrap_or(0.0))
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "cea" => {
            projection = Projection::new(ProjMethod::CylindricalEqualArea)
                .with(StandardParallel1, lat_ts.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "eqc" => {
            projection = Projection::new(ProjMethod::Equirectangular)
                .with(StandardParallel1, lat_ts.unwrap_or(0.0))
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "eqdc" => {
            projection = Projection::new(ProjMethod::EquidistantConic)
                .with(StandardParallel1, lat_1.unwrap_or(0.0))
                .with(StandardParallel2, lat_2.unwrap_or(0.0))
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "mill" => {
            projection = Projection::new(ProjMethod::MillerCylindrical)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "gnom" => {
            projection = Projection::new(ProjMethod::Gnomonic)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "ortho" => {
            projection = Projection::new(ProjMethod::Orthographic)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "aeqd" => {
            projection = Projection::new(ProjMethod::AzimuthalEquidistant)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "cass" => {
            projection = Projection::new(ProjMethod::CassiniSoldner)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "poly" => {
            projection = Projection::new(ProjMethod::Polyconic)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "nzmg" => {
            projection = Projection::new(ProjMethod::NewZealandMapGrid)
                .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                .with(CentralMeridian, lon_0.unwrap_or(0.0));
        }
        "robin" => {
            projection = Projection::new(ProjMethod::Robinson)
                .with(LongitudeOfCenter, lon_0.unwrap_or(0.0));
        }
        "sinu" => {
            projection = Projection::new(ProjMethod::Sinusoidal)
                .with(LongitudeOfCenter, lon_0.unwrap_or(0.0));
        }
        "vandg" => {
            projection = Projection::new(ProjMethod::VanDerGrinten)
                .with(LongitudeOfCenter, lon_0.unwrap_or(0.0));
        }
        "somerc" => {
            projection = Projection::new(ProjMethod::ObliqueMercatorAzimuthCenter)
                .with(LatitudeOfCenter, lat_0.unwrap_or(0.0))
                .with(LongitudeOfCenter, lonc.or(lon_0).unwrap_or(0.0))
                .with(Azimuth, 90.0)
                .with(RectifiedGridAngle, 90.0)
                .with(ScaleFactor, k.unwrap_or(1.0));
        }
        "omerc" => {
            projection = Projection::new(ProjMethod::ObliqueMercator)
                .with(LatitudeOfCenter, lat_0.unwrap_or(0.0))
                .with(LongitudeOfCenter, lonc.or(lon_0).unwrap_or(0.0))
                .with(Azimuth, alpha.unwrap_or(0.0))
                .with(ScaleFactor, k.unwrap_or(1.0));
            if let Some(gamma) = gamma {
                projection = projection.with(RectifiedGridAngle, gamma);
            }
        }
        "labrd" => {
            projection = Projection::new(ProjMethod::ObliqueMercatorLaborde)
                .with(LatitudeOfCenter, lat_0.unwrap_or(0.0))
                .with(LongitudeOfCenter, lonc.or(lon_0).unwrap_or(0.0))
                .with(Azimuth, alpha.unwrap_or(0.0))
                .with(ScaleFactor, k.unwrap_or(1.0));
        }
        other => return Err(ProjError::UnknownProjection(other.to_string())),
    }

    let linear_unit = parse_linear_unit(params)?;
    // proj false origins are in metres; the graph stores them in the CRS
    // linear unit.
    if !projection.parameters.contains_key(&FalseEasting) {
        let x_0 = params.number("x_0")?.unwrap_or(0.0);
        let y_0 = params.number("y_0")?.unwrap_or(0.0);
        projection = projection
            .with(FalseEasting, x_0 / linear_unit.factor)
            .with(FalseNorthing, y_0 / linear_unit.factor);
    }

    Ok(ProjectedCrs {
        name,
        authority_code: None,
        geographic,
        projection,
        linear_unit,
        axis_order: AxisOrder::default(),
    })
}

pub fn to_proj_string(crs: &Crs) -> Result<String, ProjError> {
    match crs {
        Crs::Geographic2D(gcs) | Crs::Geographic3D(gcs) => {
            let mut parts = vec!["+proj=longlat".to_string()];
            push_datum(&mut parts, &gcs.datum);
            push_prime_meridian(&mut parts, &gcs.prime_meridian);
            parts.push("+no_defs".to_string());
            Ok(parts.join(" "))
        }
        Crs::Geocentric(ccs) => {
            let mut parts = vec!["+proj=geocent".to_string()];
            push_datum(&mut parts, &ccs.datum);
            push_prime_meridian(&mut parts, &ccs.prime_meridian);
            parts.push("+units=m".to_string());
            parts.push("+no_defs".to_string());
            Ok(parts.join(" "))
        }
        Crs::Projected(pcs) => projected_to_proj(pcs),
        other => Err(ProjError::Unrepresentable(format!("{other}"))),
    }
}

fn push_datum(parts: &mut Vec<String>, datum: &Datum) {
    let proj_datum = datum.authority_code.and_then(|code| {
        tables::DATUMS
            .iter()
            .find(|entry| entry.code == code)
            .and_then(|entry| entry.proj_name)
    });

    if let Some(name) = proj_datum {
        if datum.towgs84.is_none() {
            parts.push(format!("+datum={name}"));
            return;
        }
    }

    let ellipsoid = &datum.ellipsoid;
    let known = tables::ELLIPSOIDS.iter().find(|entry| {
        nearly(entry.semi_major, ellipsoid.semi_major)
            && nearly(entry.inv_flattening, ellipsoid.inv_flattening)
    });
    match known {
        Some(entry) => parts.push(format!("+ellps={}", entry.proj_name)),
        None => {
            parts.push(format!("+a={}", format_number(ellipsoid.semi_major)));
            if ellipsoid.is_sphere() {
                parts.push(format!("+b={}", format_number(ellipsoid.semi_major)));
            } else {
                parts.push(format!(
                    "+rf={}",
                    format_number(ellipsoid.inv_flattening)
                ));
            }
        }
    }

    if let Some(towgs84) = datum.towgs84 {
        let values: Vec<String> = towgs84.iter().map(|v| format_number(*v)).collect();
        parts.push(format!("+towgs84={}", values.join(",")));
    }
}

fn push_prime_meridian(parts: &mut Vec<String>, pm: &PrimeMeridian) {
    if pm.longitude == 0.0 {
        return;
    }
    let named = tables::PRIME_MERIDIANS
        .iter()
        .find(|entry| nearly(entry.longitude, pm.longitude) && entry.code != 8901);
    match named {
        Some(entry) => parts.push(format!("+pm={}", entry.name.to_lowercase())),
        None => parts.push(format!("+pm={}", format_number(pm.longitude))),
    }
}

fn push_linear_unit(parts: &mut Vec<String>, unit: &Unit) {
    if nearly(unit.factor, 1.0) {
        parts.push("+units=m".to_string());
    } else if nearly(unit.factor, 0.3048) {
        parts.push("+units=ft".to_string());
    } else if nearly(unit.factor, 0.3048006096012192) {
        parts.push("+units=us-ft".to_string());
    } else {
        parts.push(format!("+to_meter={}", format_number(unit.factor)));
    }
}

fn projected_to_proj(pcs: &ProjectedCrs) -> Result<String, ProjError> {
    use ProjParam::*;

    let projection = &pcs.projection;
    let get = |param: ProjParam| projection.parameter(param);
    let fe_metres = get(FalseEasting) * pcs.linear_unit.factor;
    let fn_metres = get(FalseNorthing) * pcs.linear_unit.factor;

    let mut parts: Vec<String> = vec![];

    let utm_zone = (get(CentralMeridian) + 183.0) / 6.0;
    if projection.method == ProjMethod::TransverseMercator
        && nearly(get(ScaleFactor), 0.9996)
        && nearly(fe_metres, 500000.0)
        && get(LatitudeOfOrigin) == 0.0
        && utm_zone.fract() == 0.0
        && (1.0..=60.0).contains(&utm_zone)
        && (fn_metres == 0.0 || nearly(fn_metres, 10000000.0))
    {
        parts.push("+proj=utm".to_string());
        parts.push(format!("+zone={}", utm_zone as u16));
        if fn_metres != 0.0 {
            parts.push("+south".to_string());
        }
    } else {
        match projection.method {
            ProjMethod::TransverseMercator | ProjMethod::TransverseMercatorSouthOriented => {
                parts.push("+proj=tmerc".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::Mercator => {
                parts.push("+proj=merc".to_string());
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                if projection.parameters.contains_key(&StandardParallel1) {
                    push_angle(&mut parts, "lat_ts", get(StandardParallel1));
                } else {
                    push_scale(&mut parts, get(ScaleFactor));
                }
            }
            ProjMethod::LambertConfConic2SP => {
                parts.push("+proj=lcc".to_string());
                push_angle(&mut parts, "lat_1", get(StandardParallel1));
                push_angle(&mut parts, "lat_2", get(StandardParallel2));
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::LambertConfConic1SP => {
                parts.push("+proj=lcc".to_string());
                push_angle(&mut parts, "lat_1", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::PolarStereographic => {
                parts.push("+proj=stere".to_string());
                let origin = get(LatitudeOfOrigin);
                let pole = if origin < 0.0 { -90.0 } else { 90.0 };
                push_angle(&mut parts, "lat_0", pole);
                if origin.abs() != 90.0 {
                    push_angle(&mut parts, "lat_ts", origin);
                }
                push_angle(&mut parts, "lon_0", get(StraightVerticalPoleLong));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::Stereographic => {
                parts.push("+proj=stere".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::ObliqueStereographic => {
                parts.push("+proj=sterea".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::LambertAzimEqualArea => {
                parts.push("+proj=laea".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfCenter));
                push_angle(&mut parts, "lon_0", get(LongitudeOfCenter));
            }
            ProjMethod::AlbersEqualArea => {
                parts.push("+proj=aea".to_string());
                push_angle(&mut parts, "lat_1", get(StandardParallel1));
                push_angle(&mut parts, "lat_2", get(StandardParallel2));
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::CylindricalEqualArea => {
                parts.push("+proj=cea".to_string());
                push_angle(&mut parts, "lat_ts", get(StandardParallel1));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::Equirectangular => {
                parts.push("+proj=eqc".to_string());
                push_angle(&mut parts, "lat_ts", get(StandardParallel1));
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::EquidistantConic => {
                parts.push("+proj=eqdc".to_string());
                push_angle(&mut parts, "lat_1", get(StandardParallel1));
                push_angle(&mut parts, "lat_2", get(StandardParallel2));
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::MillerCylindrical => {
                parts.push("+proj=mill".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
                parts.push("+R_A".to_string());
            }
            ProjMethod::Gnomonic => {
                parts.push("+proj=gnom".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::Orthographic => {
                parts.push("+proj=ortho".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::AzimuthalEquidistant => {
                parts.push("+proj=aeqd".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::CassiniSoldner => {
                parts.push("+proj=cass".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::Polyconic => {
                parts.push("+proj=poly".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::NewZealandMapGrid => {
                parts.push("+proj=nzmg".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfOrigin));
                push_angle(&mut parts, "lon_0", get(CentralMeridian));
            }
            ProjMethod::Robinson => {
                parts.push("+proj=robin".to_string());
                push_angle(&mut parts, "lon_0", get(LongitudeOfCenter));
            }
            ProjMethod::Sinusoidal => {
                parts.push("+proj=sinu".to_string());
                push_angle(&mut parts, "lon_0", get(LongitudeOfCenter));
            }
            ProjMethod::VanDerGrinten => {
                parts.push("+proj=vandg".to_string());
                push_angle(&mut parts, "lon_0", get(LongitudeOfCenter));
                parts.push("+R_A".to_string());
            }
            ProjMethod::ObliqueMercatorAzimuthCenter => {
                parts.push("+proj=somerc".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfCenter));
                push_angle(&mut parts, "lonc", get(LongitudeOfCenter));
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::ObliqueMercator => {
                parts.push("+proj=omerc".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfCenter));
                push_angle(&mut parts, "lonc", get(LongitudeOfCenter));
                push_angle(&mut parts, "alpha", get(Azimuth));
                if projection.parameters.contains_key(&RectifiedGridAngle) {
                    push_angle(&mut parts, "gamma", get(RectifiedGridAngle));
                }
                push_scale(&mut parts, get(ScaleFactor));
            }
            ProjMethod::ObliqueMercatorLaborde => {
                parts.push("+proj=labrd".to_string());
                push_angle(&mut parts, "lat_0", get(LatitudeOfCenter));
                push_angle(&mut parts, "lonc", get(LongitudeOfCenter));
                push_angle(&mut parts, "alpha", get(Azimuth));
                push_scale(&mut parts, get(ScaleFactor));
            }
        }
        parts.push(format!("+x_0={}", format_number(fe_metres)));
        parts.push(format!("+y_0={}", format_number(fn_metres)));
    }

    push_datum(&mut parts, &pcs.geographic.datum);
    push_prime_meridian(&mut parts, &pcs.geographic.prime_meridian);
    push_linear_unit(&mut parts, &pcs.linear_unit);
    parts.push("+no_defs".to_string());
    Ok(parts.join(" "))
}

fn push_angle(parts: &mut Vec<String>, key: &str, value: f64) {
    parts.push(format!("+{key}={}", format_number(value)));
}

fn push_scale(parts: &mut Vec<String>, value: f64) {
    let value = if value == 0.0 { 1.0 } else { value };
    parts.push(format!("+k_0={}", format_number(value)));
}

fn nearly(a: f64, b: f64) -> bool {
    (a - b).abs() <= crate::crs::SAME_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn longlat_with_datum() {
        let crs = from_proj_string("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        let Crs::Geographic2D(gcs) = &crs else {
            panic!("expected geographic");
        };
        assert_eq!(gcs.name, "WGS 84");
        assert_eq!(gcs.datum.ellipsoid.authority_code, Some(7030));

        let round = from_proj_string(&to_proj_string(&crs).unwrap()).unwrap();
        assert!(crs.is_same(&round));
    }

    #[test]
    fn utm_shorthand() {
        let crs = from_proj_string("+proj=utm +zone=11 +datum=NAD27 +units=m +no_defs").unwrap();
        let Crs::Projected(pcs) = &crs else {
            panic!("expected projected");
        };
        assert_eq!(pcs.projection.method, ProjMethod::TransverseMercator);
        assert_eq!(
            pcs.projection.parameter(ProjParam::CentralMeridian),
            -117.0
        );
        assert_eq!(pcs.projection.parameter(ProjParam::FalseEasting), 500000.0);

        let text = to_proj_string(&crs).unwrap();
        assert!(text.contains("+proj=utm"));
        assert!(text.contains("+zone=11"));
        let round = from_proj_string(&text).unwrap();
        assert!(crs.is_same(&round));
    }

    #[test]
    fn mercator_lat_ts_form() {
        let crs = from_proj_string("+proj=merc +lat_ts=47.667 +lon_0=0 +datum=NAD83").unwrap();
        let Crs::Projected(pcs) = &crs else {
            panic!("expected projected");
        };
        assert_eq!(
            pcs.projection.parameter(ProjParam::StandardParallel1),
            47.667
        );
        assert!(!pcs
            .projection
            .parameters
            .contains_key(&ProjParam::ScaleFactor));

        let round = from_proj_string(&to_proj_string(&crs).unwrap()).unwrap();
        assert!(crs.is_same(&round));
    }

    #[test]
    fn false_origins_rescale_with_units() {
        let crs =
            from_proj_string("+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=50000 +y_0=0 +ellps=GRS80 +units=km")
                .unwrap();
        let Crs::Projected(pcs) = &crs else {
            panic!("expected projected");
        };
        // 50 km false easting, expressed in kilometres.
        assert_relative_eq!(
            pcs.projection.parameter(ProjParam::FalseEasting),
            50.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn round_trips_for_method_sweep() {
        let strings = [
            "+proj=eqdc +lat_0=1 +lon_0=2 +lat_1=3 +lat_2=4 +x_0=5 +y_0=6 +datum=WGS84",
            "+proj=mill +lat_0=1 +lon_0=2 +x_0=3 +y_0=4 +R_A +datum=WGS84",
            "+proj=gnom +lat_0=1 +lon_0=2 +x_0=3 +y_0=4 +datum=WGS84",
            "+proj=robin +lon_0=1 +x_0=2 +y_0=3 +datum=WGS84",
            "+proj=sinu +lon_0=1 +x_0=2 +y_0=3 +datum=WGS84",
            "+proj=vandg +datum=WGS84",
            "+proj=stere +lat_0=90 +lat_ts=70 +lon_0=-45 +k_0=1 +datum=WGS84",
            "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 +k_0=0.9999079 +x_0=155000 +y_0=463000 +ellps=bessel",
            "+proj=geocent +datum=WGS84",
        ];
        for text in strings {
            let crs = from_proj_string(text).unwrap();
            let round = from_proj_string(&to_proj_string(&crs).unwrap()).unwrap();
            assert!(crs.is_same(&round), "{text} did not round trip");
        }
    }

    #[test]
    fn unknown_projection_is_an_error() {
        assert_eq!(
            from_proj_string("+proj=madeup +lat_0=1"),
            Err(ProjError::UnknownProjection("madeup".to_string()))
        );
        assert_eq!(from_proj_string("+ellps=WGS84"), Err(ProjError::MissingProjection));
    }

    #[test]
    fn towgs84_parsing() {
        let crs = from_proj_string(
            "+proj=longlat +ellps=clrk80ign +pm=paris +towgs84=-168,-60,320 +no_defs",
        )
        .unwrap();
        let Crs::Geographic2D(gcs) = &crs else {
            panic!("expected geographic");
        };
        assert_eq!(
            gcs.datum.towgs84,
            Some([-168.0, -60.0, 320.0, 0.0, 0.0, 0.0, 0.0])
        );
        assert_relative_eq!(gcs.prime_meridian.longitude, 2.33722917, epsilon = 1e-8);
    }
}
