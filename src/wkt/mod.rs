//! The legacy WKT bridge: CRS graph to text and back.
//!
//! Serialization is canonical (fixed node order, 15-digit numbers); parsing
//! accepts the usual dialect latitude in brackets and whitespace. Together
//! with [`Crs::is_same`] this is the round-trip oracle for the key codec.

use crate::crs::{
    AxisOrder, CompoundCrs, Crs, Datum, Ellipsoid, GeocentricCrs, GeographicCrs, LocalCrs,
    PrimeMeridian, ProjMethod, ProjParam, ProjectedCrs, Projection, Unit, UnitKind, VerticalCrs,
    VerticalDatum,
};

mod error;
mod parse;

pub use error::WktError;
pub use parse::{format_number, WktNode, WktValue};

pub fn to_wkt(crs: &Crs) -> String {
    match crs_node(crs) {
        Some(node) => node.to_compact(),
        None => String::new(),
    }
}

pub fn to_pretty_wkt(crs: &Crs) -> String {
    match crs_node(crs) {
        Some(node) => node.to_pretty(),
        None => String::new(),
    }
}

pub fn from_wkt(text: &str) -> Result<Crs, WktError> {
    let node = WktNode::parse(text.trim())?;
    crs_from_node(&node)
}

fn crs_node(crs: &Crs) -> Option<WktNode> {
    match crs {
        Crs::Geographic2D(gcs) => Some(geographic_node(gcs, false)),
        Crs::Geographic3D(gcs) => Some(geographic_node(gcs, true)),
        Crs::Projected(pcs) => Some(projected_node(pcs)),
        Crs::Geocentric(ccs) => Some(geocentric_node(ccs)),
        Crs::Vertical(vcs) => Some(vertical_node(vcs)),
        Crs::Compound(compound) => {
            let mut node = WktNode::new("COMPD_CS").text(&compound.name);
            node = node.node(crs_node(&compound.horizontal)?);
            node = node.node(crs_node(&compound.vertical)?);
            Some(node)
        }
        Crs::Local(local) => Some(
            WktNode::new("LOCAL_CS")
                .text(&local.name)
                .node(unit_node(&local.linear_unit))
                .node(WktNode::new("AXIS").text("X").bare("EAST"))
                .node(WktNode::new("AXIS").text("Y").bare("NORTH")),
        ),
        Crs::Unknown => None,
    }
}

fn authority_node(code: u16) -> WktNode {
    WktNode::new("AUTHORITY")
        .text("EPSG")
        .text(code.to_string())
}

fn unit_node(unit: &Unit) -> WktNode {
    let mut node = WktNode::new("UNIT").text(&unit.name).number(unit.factor);
    if let Some(code) = unit.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn datum_node(datum: &Datum) -> WktNode {
    let ellipsoid = &datum.ellipsoid;
    let mut spheroid = WktNode::new("SPHEROID")
        .text(&ellipsoid.name)
        .number(ellipsoid.semi_major)
        .number(ellipsoid.inv_flattening);
    if let Some(code) = ellipsoid.authority_code {
        spheroid = spheroid.node(authority_node(code));
    }

    let mut node = WktNode::new("DATUM")
        .text(wkt_datum_name(&datum.name))
        .node(spheroid);
    if let Some(towgs84) = datum.towgs84 {
        let mut shift = WktNode::new("TOWGS84");
        for value in towgs84 {
            shift = shift.number(value);
        }
        node = node.node(shift);
    }
    if let Some(code) = datum.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

/// Legacy WKT datum names traditionally use underscores.
fn wkt_datum_name(name: &str) -> String {
    name.replace(' ', "_")
}

fn prime_meridian_node(pm: &PrimeMeridian, angular_unit: &Unit) -> WktNode {
    // The longitude is expressed in the angular unit of the CRS.
    let value = pm.longitude.to_radians() / angular_unit.factor;
    let mut node = WktNode::new("PRIMEM").text(&pm.name).number(value);
    if let Some(code) = pm.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn geographic_node(gcs: &GeographicCrs, dim3: bool) -> WktNode {
    let mut node = WktNode::new("GEOGCS")
        .text(&gcs.name)
        .node(datum_node(&gcs.datum))
        .node(prime_meridian_node(&gcs.prime_meridian, &gcs.angular_unit))
        .node(unit_node(&gcs.angular_unit))
        .node(WktNode::new("AXIS").text("Latitude").bare("NORTH"))
        .node(WktNode::new("AXIS").text("Longitude").bare("EAST"));
    if dim3 {
        node = node.node(
            WktNode::new("AXIS")
                .text("Ellipsoidal height")
                .bare("UP"),
        );
    }
    if let Some(code) = gcs.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn projection_wkt_name(projection: &Projection) -> &'static str {
    if projection.method == ProjMethod::Mercator
        && projection.parameters.contains_key(&ProjParam::StandardParallel1)
        && !projection.parameters.contains_key(&ProjParam::ScaleFactor)
    {
        return "Mercator_2SP";
    }
    projection.method.wkt_name()
}

fn projected_node(pcs: &ProjectedCrs) -> WktNode {
    let mut node = WktNode::new("PROJCS")
        .text(&pcs.name)
        .node(geographic_node(&pcs.geographic, false))
        .node(WktNode::new("PROJECTION").text(projection_wkt_name(&pcs.projection)));
    for (param, _) in pcs.projection.method.parameter_keys() {
        if let Some(value) = pcs.projection.parameters.get(param) {
            node = node.node(
                WktNode::new("PARAMETER")
                    .text(param.wkt_name())
                    .number(*value),
            );
        }
    }
    node = node
        .node(unit_node(&pcs.linear_unit))
        .node(WktNode::new("AXIS").text("Easting").bare("EAST"))
        .node(WktNode::new("AXIS").text("Northing").bare("NORTH"));
    if let Some(code) = pcs.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn geocentric_node(ccs: &GeocentricCrs) -> WktNode {
    let mut node = WktNode::new("GEOCCS")
        .text(&ccs.name)
        .node(datum_node(&ccs.datum))
        .node(prime_meridian_node(&ccs.prime_meridian, &Unit::degree()))
        .node(unit_node(&ccs.linear_unit))
        .node(WktNode::new("AXIS").text("Geocentric X").bare("OTHER"))
        .node(WktNode::new("AXIS").text("Geocentric Y").bare("OTHER"))
        .node(WktNode::new("AXIS").text("Geocentric Z").bare("NORTH"));
    if let Some(code) = ccs.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn vertical_node(vcs: &VerticalCrs) -> WktNode {
    let mut datum = WktNode::new("VERT_DATUM")
        .text(&vcs.datum.name)
        .number(vcs.datum.datum_type as f64);
    if let Some(code) = vcs.datum.authority_code {
        datum = datum.node(authority_node(code));
    }
    let mut node = WktNode::new("VERT_CS")
        .text(&vcs.name)
        .node(datum)
        .node(unit_node(&vcs.unit))
        .node(WktNode::new("AXIS").text("Up").bare("UP"));
    if let Some(code) = vcs.authority_code {
        node = node.node(authority_node(code));
    }
    node
}

fn crs_from_node(node: &WktNode) -> Result<Crs, WktError> {
    match node.keyword.as_str() {
        "GEOGCS" => {
            let (gcs, dim3) = geographic_from_node(node)?;
            Ok(if dim3 {
                Crs::Geographic3D(gcs)
            } else {
                Crs::Geographic2D(gcs)
            })
        }
        "PROJCS" => projected_from_node(node).map(Crs::Projected),
        "GEOCCS" => geocentric_from_node(node).map(Crs::Geocentric),
        "VERT_CS" => vertical_from_node(node).map(Crs::Vertical),
        "COMPD_CS" => {
            let name = node.text_at(0).ok_or(WktError::Missing("compound name"))?;
            let mut components = node.nodes().filter(|child| {
                matches!(
                    child.keyword.as_str(),
                    "GEOGCS" | "PROJCS" | "GEOCCS" | "VERT_CS"
                )
            });
            let horizontal = components.next().ok_or(WktError::Missing("compound horizontal"))?;
            let vertical = components.next().ok_or(WktError::Missing("compound vertical"))?;
            Ok(Crs::Compound(CompoundCrs {
                name: name.to_string(),
                horizontal: Box::new(crs_from_node(horizontal)?),
                vertical: Box::new(crs_from_node(vertical)?),
            }))
        }
        "LOCAL_CS" => {
            let name = node.text_at(0).ok_or(WktError::Missing("local CS name"))?;
            let linear_unit = match node.child("UNIT") {
                Some(unit) => unit_from_node(unit, UnitKind::Linear)?,
                None => Unit::metre(),
            };
            Ok(Crs::Local(LocalCrs {
                name: name.to_string(),
                linear_unit,
            }))
        }
        other => Err(WktError::UnknownRoot(other.to_string())),
    }
}

fn unit_from_node(node: &WktNode, kind: UnitKind) -> Result<Unit, WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("unit name"))?;
    let factor = node.number_at(1).ok_or(WktError::Missing("unit factor"))?;
    Ok(Unit {
        kind,
        name: name.to_string(),
        factor,
        authority_code: node.authority_code(),
    })
}

fn datum_from_node(node: &WktNode) -> Result<Datum, WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("datum name"))?;
    let spheroid = node.child("SPHEROID").ok_or(WktError::Missing("SPHEROID"))?;
    let ellipsoid = Ellipsoid {
        name: spheroid
            .text_at(0)
            .ok_or(WktError::Missing("spheroid name"))?
            .to_string(),
        authority_code: spheroid.authority_code(),
        semi_major: spheroid
            .number_at(1)
            .ok_or(WktError::Missing("semi-major axis"))?,
        inv_flattening: spheroid
            .number_at(2)
            .ok_or(WktError::Missing("inverse flattening"))?,
    };

    let towgs84 = node.child("TOWGS84").map(|shift| {
        let values = shift.numbers();
        let mut towgs84 = [0.0; 7];
        let n = values.len().min(7);
        towgs84[..n].copy_from_slice(&values[..n]);
        towgs84
    });

    Ok(Datum {
        name: name.to_string(),
        authority_code: node.authority_code(),
        ellipsoid,
        towgs84,
    })
}

fn geographic_from_node(node: &WktNode) -> Result<(GeographicCrs, bool), WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("GEOGCS name"))?;
    let datum = datum_from_node(node.child("DATUM").ok_or(WktError::Missing("DATUM"))?)?;
    let angular_unit = match node.child("UNIT") {
        Some(unit) => unit_from_node(unit, UnitKind::Angular)?,
        None => Unit::degree(),
    };

    let prime_meridian = match node.child("PRIMEM") {
        Some(primem) => {
            let raw = primem
                .number_at(1)
                .ok_or(WktError::Missing("prime meridian longitude"))?;
            PrimeMeridian {
                name: primem
                    .text_at(0)
                    .ok_or(WktError::Missing("prime meridian name"))?
                    .to_string(),
                authority_code: primem.authority_code(),
                longitude: (raw * angular_unit.factor).to_degrees(),
            }
        }
        None => PrimeMeridian::greenwich(),
    };

    let dim3 = node.children("AXIS").any(|axis| {
        axis.values
            .iter()
            .any(|value| matches!(value, WktValue::Keyword(direction) if direction == "UP"))
    });

    Ok((
        GeographicCrs {
            name: name.to_string(),
            authority_code: node.authority_code(),
            datum,
            prime_meridian,
            angular_unit,
            axis_order: AxisOrder::default(),
        },
        dim3,
    ))
}

fn projected_from_node(node: &WktNode) -> Result<ProjectedCrs, WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("PROJCS name"))?;
    let (geographic, _) =
        geographic_from_node(node.child("GEOGCS").ok_or(WktError::Missing("GEOGCS"))?)?;

    let projection_node = node
        .child("PROJECTION")
        .ok_or(WktError::Missing("PROJECTION"))?;
    let method_name = projection_node
        .text_at(0)
        .ok_or(WktError::Missing("projection name"))?;
    let method = ProjMethod::from_wkt_name(method_name)
        .ok_or_else(|| WktError::UnknownProjection(method_name.to_string()))?;

    let mut projection = Projection::new(method);
    for parameter in node.children("PARAMETER") {
        let Some(param_name) = parameter.text_at(0) else {
            continue;
        };
        let Some(value) = parameter.number_at(1) else {
            continue;
        };
        // Unknown parameter names are skipped, matching the permissive
        // treatment of unknown keys elsewhere.
        if let Some(param) = ProjParam::from_wkt_name(param_name) {
            projection.parameters.insert(param, value);
        }
    }

    // The UNIT child of the PROJCS itself, not of the nested GEOGCS.
    let linear_unit = match node.children("UNIT").next() {
        Some(unit) => unit_from_node(unit, UnitKind::Linear)?,
        None => Unit::metre(),
    };

    Ok(ProjectedCrs {
        name: name.to_string(),
        authority_code: node.authority_code(),
        geographic,
        projection,
        linear_unit,
        axis_order: AxisOrder::default(),
    })
}

fn geocentric_from_node(node: &WktNode) -> Result<GeocentricCrs, WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("GEOCCS name"))?;
    let datum = datum_from_node(node.child("DATUM").ok_or(WktError::Missing("DATUM"))?)?;
    let prime_meridian = match node.child("PRIMEM") {
        Some(primem) => PrimeMeridian {
            name: primem
                .text_at(0)
                .ok_or(WktError::Missing("prime meridian name"))?
                .to_string(),
            authority_code: primem.authority_code(),
            longitude: primem
                .number_at(1)
                .ok_or(WktError::Missing("prime meridian longitude"))?,
        },
        None => PrimeMeridian::greenwich(),
    };
    let linear_unit = match node.child("UNIT") {
        Some(unit) => unit_from_node(unit, UnitKind::Linear)?,
        None => Unit::metre(),
    };
    Ok(GeocentricCrs {
        name: name.to_string(),
        authority_code: node.authority_code(),
        datum,
        prime_meridian,
        linear_unit,
    })
}

fn vertical_from_node(node: &WktNode) -> Result<VerticalCrs, WktError> {
    let name = node.text_at(0).ok_or(WktError::Missing("VERT_CS name"))?;
    let datum_node = node
        .child("VERT_DATUM")
        .ok_or(WktError::Missing("VERT_DATUM"))?;
    let datum = VerticalDatum {
        name: datum_node
            .text_at(0)
            .ok_or(WktError::Missing("vertical datum name"))?
            .to_string(),
        authority_code: datum_node.authority_code(),
        datum_type: datum_node.number_at(1).unwrap_or(2005.0) as u16,
    };
    let unit = match node.child("UNIT") {
        Some(unit) => unit_from_node(unit, UnitKind::Linear)?,
        None => Unit::metre(),
    };
    Ok(VerticalCrs {
        name: name.to_string(),
        authority_code: node.authority_code(),
        datum,
        unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NTF_PARIS: &str = r#"GEOGCS["NTF (Paris)",DATUM["Nouvelle_Triangulation_Francaise_Paris",SPHEROID["Clarke 1880 (IGN)",6378249.2,293.4660212936265,AUTHORITY["EPSG","7011"]],TOWGS84[-168,-60,320,0,0,0,0],AUTHORITY["EPSG","6807"]],PRIMEM["Paris",2.5969213],UNIT["grad",0.01570796326794897],AUTHORITY["EPSG","4807"]]"#;

    #[test]
    fn geographic_round_trip() {
        let crs = from_wkt(NTF_PARIS).unwrap();
        let Crs::Geographic2D(gcs) = &crs else {
            panic!("expected geographic");
        };
        assert_eq!(gcs.authority_code, Some(4807));
        assert_eq!(gcs.datum.towgs84.unwrap()[2], 320.0);
        // 2.5969213 grads east of Greenwich.
        assert_relative_eq!(gcs.prime_meridian.longitude, 2.33722917, epsilon = 1e-6);

        let again = from_wkt(&to_wkt(&crs)).unwrap();
        assert!(crs.is_same(&again));
    }

    #[test]
    fn projected_round_trip() {
        let wkt = r#"PROJCS["Global Mercator",GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.2572221010002,AUTHORITY["EPSG","7019"]],TOWGS84[0,0,0,0,0,0,0],AUTHORITY["EPSG","6269"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4269"]],PROJECTION["Mercator_2SP"],PARAMETER["standard_parallel_1",47.667],PARAMETER["central_meridian",0],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]]]"#;
        let crs = from_wkt(wkt).unwrap();
        let Crs::Projected(pcs) = &crs else {
            panic!("expected projected");
        };
        assert_eq!(pcs.projection.method, ProjMethod::Mercator);
        assert_eq!(
            pcs.projection.parameter(ProjParam::StandardParallel1),
            47.667
        );

        let serialized = to_wkt(&crs);
        assert!(serialized.contains(r#"PROJECTION["Mercator_2SP"]"#));
        let again = from_wkt(&serialized).unwrap();
        assert!(crs.is_same(&again));
    }

    #[test]
    fn compound_round_trip() {
        let wkt = r#"COMPD_CS["unknown",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],VERT_CS["EGM2008 height",VERT_DATUM["EGM2008 geoid",2005,AUTHORITY["EPSG","1027"]],UNIT["metre",1],AXIS["Up",UP]]]"#;
        let crs = from_wkt(wkt).unwrap();
        let Crs::Compound(compound) = &crs else {
            panic!("expected compound");
        };
        let Crs::Vertical(vertical) = compound.vertical.as_ref() else {
            panic!("expected vertical component");
        };
        assert_eq!(vertical.datum.authority_code, Some(1027));

        let again = from_wkt(&to_wkt(&crs)).unwrap();
        assert!(crs.is_same(&again));
    }

    #[test]
    fn three_axes_mean_three_dimensions() {
        let crs = from_wkt(NTF_PARIS).unwrap();
        let Crs::Geographic2D(gcs) = crs else {
            panic!("expected 2D");
        };
        let wkt3d = to_wkt(&Crs::Geographic3D(gcs));
        assert!(matches!(from_wkt(&wkt3d).unwrap(), Crs::Geographic3D(_)));
    }

    #[test]
    fn malformed_text_is_fatal() {
        assert!(from_wkt("GEOGCS[").is_err());
        assert!(from_wkt("NOTACS[\"x\"]").is_err());
        assert!(from_wkt(r#"GEOGCS["missing datum"]"#).is_err());
    }

    #[test]
    fn unit_precision_survives() {
        let wkt = r#"GEOGCS["WGS 84 (arc-second)",DATUM["WGS_1984 (arc-second)",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["arc-second",4.848136811095361e-06]]"#;
        let crs = from_wkt(wkt).unwrap();
        let serialized = to_wkt(&crs);
        assert!(serialized.contains(r#"UNIT["arc-second",4.84813681109536E-6"#));
        let Crs::Geographic2D(gcs) = from_wkt(&serialized).unwrap() else {
            panic!("expected geographic");
        };
        assert_relative_eq!(
            gcs.angular_unit.factor,
            4.848136811095361e-6,
            max_relative = 1e-9
        );
    }

    #[test]
    fn local_cs_keeps_citation_name() {
        let crs = Crs::Local(LocalCrs {
            name: "Projection Name = UTM Units = meters GeoTIFF Units = meters".to_string(),
            linear_unit: Unit::metre(),
        });
        let wkt = to_wkt(&crs);
        assert!(wkt.starts_with(
            r#"LOCAL_CS["Projection Name = UTM Units = meters GeoTIFF Units = meters""#
        ));
        assert!(crs.is_same(&from_wkt(&wkt).unwrap()));
    }
}
