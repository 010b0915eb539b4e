//! End-to-end round trips through the key codec, with the WKT bridge as the
//! equivalence oracle.

use approx::assert_relative_eq;

use srstiff::crs::VerticalDatum;
use srstiff::decode::USER_DEFINED;
use srstiff::{
    decode, encode, from_proj_string, from_wkt, to_proj_string, to_wkt, Crs, Datum, DecodeError,
    DecodeOptions, Ellipsoid, EncodeOptions, EpsgRegistry, GeoKeyDirectory, GeoKeyError,
    GeoKeyId, GeoKeyValue, GeoTiffVersion, GeographicCrs, PrimeMeridian, ProjMethod, ProjParam,
    Projection, Resolver, Unit, VerticalCrs, Warning,
};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn round_trip(crs: &Crs) -> srstiff::Decoded {
    init_tracing();
    let registry = EpsgRegistry;
    let directory = encode(crs, &registry, &EncodeOptions::default()).unwrap();
    decode(&directory, &registry, &DecodeOptions::default()).unwrap()
}

/// A resolver with no data, for exercising the unresolvable-reference path.
struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve_unit(&self, _: u16) -> Option<Unit> {
        None
    }
    fn resolve_unit_by_name(&self, _: &str) -> Option<Unit> {
        None
    }
    fn resolve_crs(&self, _: u16) -> Option<Crs> {
        None
    }
    fn resolve_datum(&self, _: u16) -> Option<Datum> {
        None
    }
    fn resolve_ellipsoid(&self, _: u16) -> Option<Ellipsoid> {
        None
    }
    fn resolve_prime_meridian(&self, _: u16) -> Option<PrimeMeridian> {
        None
    }
    fn resolve_vertical(&self, _: u16) -> Option<VerticalCrs> {
        None
    }
    fn resolve_conversion(&self, _: u16) -> Option<Projection> {
        None
    }
    fn find_crs_code(&self, _: &Crs) -> Option<u16> {
        None
    }
    fn find_unit_code(&self, _: &Unit) -> Option<u16> {
        None
    }
}

#[test]
fn round_trip_by_authority_code() {
    let registry = EpsgRegistry;
    for code in [4326u16, 4269, 4267, 4807, 32631, 32730, 26711, 3857, 4328, 4979] {
        let crs = registry.resolve_crs(code).unwrap();
        let decoded = round_trip(&crs);
        assert!(
            crs.is_same(&decoded.crs),
            "EPSG:{code} changed across the round trip:\n{}\n{}",
            to_wkt(&crs),
            to_wkt(&decoded.crs),
        );
        assert_eq!(decoded.crs.authority_code(), Some(code), "EPSG:{code}");
        assert!(decoded.warnings.is_empty(), "EPSG:{code}: {:?}", decoded.warnings);
    }
}

#[test]
fn round_trip_spelled_out_definitions() {
    let proj_strings = [
        "+proj=vandg +datum=WGS84",
        "+proj=eqdc +lat_0=1 +lon_0=2 +lat_1=3 +lat_2=4 +x_0=5 +y_0=6 +datum=WGS84",
        "+proj=mill +lat_0=1 +lon_0=2 +x_0=3 +y_0=4 +R_A +datum=WGS84",
        "+proj=gnom +lat_0=1 +lon_0=2 +x_0=3 +y_0=4 +datum=WGS84",
        "+proj=robin +lon_0=1 +x_0=2 +y_0=3 +datum=WGS84",
        "+proj=sinu +lon_0=1 +x_0=2 +y_0=3 +datum=WGS84",
        "+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=50000 +y_0=0 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0",
        "+proj=longlat +ellps=clrk80ign +pm=paris +towgs84=-168,-60,320",
    ];
    for text in proj_strings {
        let crs = from_proj_string(text).unwrap();
        let decoded = round_trip(&crs);
        assert!(
            crs.is_same(&decoded.crs),
            "{text} changed across the round trip:\n{}\n{}",
            to_wkt(&crs),
            to_wkt(&decoded.crs),
        );
    }
}

#[test]
fn angular_unit_precision() {
    let units = [
        ("arc-second", 4.848136811095361e-6),
        ("arc-minute", 2.908882086657216e-4),
        ("grad", 1.570796326794897e-2),
        ("gon", 1.570796326794897e-2),
        ("radian", 1.0),
        ("custom", 1.23),
    ];
    for (name, factor) in units {
        let crs = Crs::Geographic2D(GeographicCrs {
            name: format!("WGS 84 ({name})"),
            authority_code: None,
            datum: Datum::new(
                format!("WGS_1984 ({name})"),
                Ellipsoid::new("WGS 84", 6378137.0, 298.257223563),
            ),
            prime_meridian: PrimeMeridian::greenwich(),
            angular_unit: Unit::angular(name, factor),
            axis_order: Default::default(),
        });
        let decoded = round_trip(&crs);
        let Crs::Geographic2D(gcs) = &decoded.crs else {
            panic!("{name}: expected geographic result");
        };
        assert_eq!(gcs.angular_unit.name, name);
        assert_relative_eq!(gcs.angular_unit.factor, factor, max_relative = 1e-9);
        assert!(crs.is_same(&decoded.crs), "{name} unit broke equivalence");
    }
}

#[test]
fn towgs84_override_keeps_code_and_values() {
    let registry = EpsgRegistry;
    let Crs::Geographic2D(mut gcs) = registry.resolve_crs(4269).unwrap() else {
        panic!("expected geographic crs");
    };
    let shift = [584.8, 67.0, 400.3, 0.105, 0.013, -2.378, 10.29];
    gcs.datum.towgs84 = Some(shift);
    let crs = Crs::Geographic2D(gcs);

    let directory = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    // Cited by code, with the shift carried as an explicit override.
    assert_eq!(directory.short(GeoKeyId::GeographicTypeGeoKey), Some(4269));
    assert_eq!(
        directory.doubles(GeoKeyId::GeogTOWGS84GeoKey).unwrap(),
        shift.to_vec()
    );

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let Crs::Geographic2D(gcs) = &decoded.crs else {
        panic!("expected geographic result");
    };
    assert_eq!(gcs.authority_code, Some(4269));
    assert_eq!(gcs.datum.towgs84, Some(shift));
    assert!(to_wkt(&decoded.crs).contains("TOWGS84[584.8,67,400.3,0.105,0.013,-2.378,10.29]"));
}

#[test]
fn linear_unit_override_drops_projected_code() {
    let registry = EpsgRegistry;
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 1);
    directory.set_short(GeoKeyId::ProjectedCSTypeGeoKey, 32631);
    directory.set_short(GeoKeyId::ProjLinearUnitsGeoKey, 9003);

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let Crs::Projected(pcs) = &decoded.crs else {
        panic!("expected projected result");
    };
    // The definition no longer matches the authority one.
    assert_eq!(pcs.authority_code, None);
    assert_eq!(pcs.linear_unit.name, "us_survey_feet");
    // The false easting is re-expressed in the override unit.
    assert_relative_eq!(
        pcs.projection.parameter(ProjParam::FalseEasting),
        500000.0 / 0.3048006096012192,
        max_relative = 1e-9
    );
    assert!(!to_wkt(&decoded.crs).contains("32631"));
}

#[test]
fn ambiguous_mercator_prefers_scale_form() {
    let registry = EpsgRegistry;
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 1);
    directory.set_short(GeoKeyId::ProjectedCSTypeGeoKey, USER_DEFINED);
    directory.set_short(GeoKeyId::GeographicTypeGeoKey, 4269);
    directory.set_short(GeoKeyId::ProjCoordTransGeoKey, ProjMethod::Mercator.into());
    directory.set_double(GeoKeyId::ProjStdParallel1GeoKey, 47.667);
    directory.set_double(GeoKeyId::ProjScaleAtNatOriginGeoKey, 1.0);
    directory.set_double(GeoKeyId::ProjNatOriginLongGeoKey, 0.0);
    directory.set_short(GeoKeyId::ProjLinearUnitsGeoKey, 9001);

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let Crs::Projected(pcs) = &decoded.crs else {
        panic!("expected projected result");
    };
    assert_eq!(pcs.projection.parameter(ProjParam::ScaleFactor), 1.0);
    assert!(!pcs
        .projection
        .parameters
        .contains_key(&ProjParam::StandardParallel1));
    assert!(decoded
        .warnings
        .iter()
        .any(|warning| matches!(warning, Warning::AmbiguousDefinition(_))));

    // Strict mode turns the same directory into a failure.
    let strict = DecodeOptions {
        strict: true,
        ..Default::default()
    };
    assert!(matches!(
        decode(&directory, &registry, &strict),
        Err(DecodeError::Strict(_))
    ));
}

fn compound_directory() -> GeoKeyDirectory {
    let registry = EpsgRegistry;
    let horizontal = registry.resolve_crs(26711).unwrap();
    let mut directory = encode(&horizontal, &registry, &EncodeOptions::default()).unwrap();
    directory.set_short(GeoKeyId::VerticalCSTypeGeoKey, 3855);
    directory.set_string(GeoKeyId::VerticalCitationGeoKey, "EGM2008 height");
    directory.set_short(GeoKeyId::VerticalDatumGeoKey, 1027);
    directory.set_short(GeoKeyId::VerticalUnitsGeoKey, 9001);
    directory
}

#[test]
fn compound_reporting_is_gated() {
    let registry = EpsgRegistry;
    let directory = compound_directory();

    let flat = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    assert!(matches!(flat.crs, Crs::Projected(_)));
    let flat_vertical = flat.vertical.expect("vertical component must be exposed");

    let compound_options = DecodeOptions {
        report_compound: true,
        ..Default::default()
    };
    let wrapped = decode(&directory, &registry, &compound_options).unwrap();
    let Crs::Compound(compound) = &wrapped.crs else {
        panic!("expected compound result");
    };
    assert_eq!(
        compound.name,
        "NAD27 / UTM zone 11N + EGM2008 height"
    );
    let Crs::Vertical(wrapped_vertical) = compound.vertical.as_ref() else {
        panic!("expected vertical component");
    };

    // Same values on both paths.
    assert_eq!(flat_vertical.datum.authority_code, Some(1027));
    assert_eq!(
        flat_vertical.datum.authority_code,
        wrapped_vertical.datum.authority_code
    );
    assert_eq!(flat_vertical.unit.factor, wrapped_vertical.unit.factor);
    assert_eq!(flat_vertical.authority_code, Some(3855));
}

#[test]
fn compound_round_trip() {
    let registry = EpsgRegistry;
    let directory = compound_directory();
    let options = DecodeOptions {
        report_compound: true,
        ..Default::default()
    };
    let decoded = decode(&directory, &registry, &options).unwrap();
    let directory2 = encode(&decoded.crs, &registry, &EncodeOptions::default()).unwrap();
    let decoded2 = decode(&directory2, &registry, &options).unwrap();
    assert!(decoded.crs.is_same(&decoded2.crs));
}

#[test]
fn ellipsoidal_height_promotes_to_3d() {
    let registry = EpsgRegistry;
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
    directory.set_short(GeoKeyId::GeographicTypeGeoKey, 4326);
    directory.set_short(GeoKeyId::VerticalCSTypeGeoKey, 5030);
    directory.set_short(GeoKeyId::VerticalUnitsGeoKey, 9001);

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let Crs::Geographic3D(gcs) = &decoded.crs else {
        panic!("expected 3D geographic result, got {}", decoded.crs);
    };
    assert_eq!(gcs.authority_code, Some(4979));
    assert!(decoded.vertical.is_none());
}

#[test]
fn geographic_3d_dialects() {
    let registry = EpsgRegistry;
    let crs = registry.resolve_crs(4979).unwrap();

    let legacy = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    assert_eq!(legacy.revision, (1, 0));
    assert_eq!(legacy.short(GeoKeyId::GeographicTypeGeoKey), Some(4326));
    assert_eq!(legacy.short(GeoKeyId::VerticalCSTypeGeoKey), Some(5030));

    let versioned = encode(
        &crs,
        &registry,
        &EncodeOptions {
            version: GeoTiffVersion::V1_1,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(versioned.revision, (1, 1));
    assert_eq!(versioned.short(GeoKeyId::GeographicTypeGeoKey), Some(4979));
    assert_eq!(versioned.short(GeoKeyId::VerticalCSTypeGeoKey), None);

    for directory in [legacy, versioned] {
        let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
        assert!(crs.is_same(&decoded.crs), "{}", to_wkt(&decoded.crs));
        assert_eq!(decoded.crs.authority_code(), Some(4979));
    }
}

#[test]
fn malformed_directory_is_fatal() {
    // The citation claims 20 ASCII bytes where only 5 exist.
    let raw = vec![
        1, 1, 0, 2, //
        1024, 0, 1, 2, //
        2049, 34737, 20, 0, //
    ];
    let err = GeoKeyDirectory::from_tag_values(&raw, &[], "WGS84").unwrap_err();
    assert!(matches!(err, GeoKeyError::ValueOutOfBounds { key: 2049, .. }));
}

#[test]
fn unresolvable_code_warns_and_keeps_code() {
    init_tracing();
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
    directory.set_short(GeoKeyId::GeographicTypeGeoKey, 4326);

    let decoded = decode(&directory, &EmptyResolver, &DecodeOptions::default()).unwrap();
    assert!(matches!(
        decoded.warnings.first(),
        Some(Warning::UnresolvableReference {
            key: GeoKeyId::GeographicTypeGeoKey,
            code: 4326
        })
    ));
    let Crs::Geographic2D(gcs) = &decoded.crs else {
        panic!("expected geographic result");
    };
    // The code stays as informative metadata even though it did not resolve.
    assert_eq!(gcs.authority_code, Some(4326));
}

#[test]
fn import_toggle_skips_resolution() {
    let registry = EpsgRegistry;
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
    directory.set_short(GeoKeyId::GeographicTypeGeoKey, 4326);
    directory.set_short(GeoKeyId::GeogAngularUnitsGeoKey, 9102);

    let options = DecodeOptions {
        import_from_authority: false,
        ..Default::default()
    };
    let decoded = decode(&directory, &registry, &options).unwrap();
    let Crs::Geographic2D(gcs) = &decoded.crs else {
        panic!("expected geographic result");
    };
    // Keys still decode, but the authority baseline is never consulted.
    assert_eq!(gcs.authority_code, Some(4326));
    assert_eq!(gcs.name, "unknown");
}

#[test]
fn custom_linear_unit_survives_via_citation() {
    let wkt = r#"PROJCS["UTM Zone 32, Northern Hemisphere",GEOGCS["GRS 1980(IUGG, 1980)",DATUM["unknown",SPHEROID["GRS80",6378137,298.257222101],TOWGS84[0,0,0,0,0,0,0]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",9],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",50000000],PARAMETER["false_northing",0],UNIT["Centimeter",0.01]]"#;
    let crs = from_wkt(wkt).unwrap();

    let registry = EpsgRegistry;
    let directory = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    let citation = directory
        .string(GeoKeyId::PCSCitationGeoKey)
        .expect("citation with unit hint");
    assert!(citation.contains("LUnits = 0.01 (Centimeter)"));

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let Crs::Projected(pcs) = &decoded.crs else {
        panic!("expected projected result");
    };
    assert_eq!(pcs.name, "UTM Zone 32, Northern Hemisphere");
    assert_eq!(pcs.linear_unit.name, "Centimeter");
    assert_eq!(pcs.linear_unit.factor, 0.01);
    assert!(crs.is_same(&decoded.crs));
}

#[test]
fn citation_only_directory_is_a_local_cs() {
    let registry = EpsgRegistry;
    let mut directory = GeoKeyDirectory::new();
    directory.set_string(
        GeoKeyId::GTCitationGeoKey,
        "Projection Name = UTM Units = meters GeoTIFF Units = meters",
    );

    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let wkt = to_wkt(&decoded.crs);
    assert!(wkt.starts_with(
        r#"LOCAL_CS["Projection Name = UTM Units = meters GeoTIFF Units = meters""#
    ));

    let directory2 = encode(&decoded.crs, &registry, &EncodeOptions::default()).unwrap();
    let decoded2 = decode(&directory2, &registry, &DecodeOptions::default()).unwrap();
    assert!(decoded.crs.is_same(&decoded2.crs));
}

#[test]
fn projected_name_comes_from_citation() {
    let registry = EpsgRegistry;
    let crs = from_proj_string("+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +datum=WGS84").unwrap();
    let Crs::Projected(mut pcs) = crs else {
        panic!("expected projected");
    };
    pcs.name = "mycitation".to_string();
    let crs = Crs::Projected(pcs);

    let directory = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    assert_eq!(directory.string(GeoKeyId::GTCitationGeoKey), Some("mycitation"));
    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    assert!(to_wkt(&decoded.crs).starts_with(r#"PROJCS["mycitation""#));
}

#[test]
fn custom_datum_keeps_known_ellipsoid_code() {
    let wkt = r#"GEOGCS["WGS 84 based",DATUM["WGS_1984_based",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;
    let crs = from_wkt(wkt).unwrap();
    let decoded = round_trip(&crs);
    let Crs::Geographic2D(gcs) = &decoded.crs else {
        panic!("expected geographic result");
    };
    assert_eq!(gcs.datum.ellipsoid.authority_code, Some(7030));
    assert_eq!(gcs.datum.ellipsoid.name, "WGS 84");
    assert_eq!(gcs.name, "WGS 84 based");
    assert!(crs.is_same(&decoded.crs));
}

#[test]
fn vertical_crs_round_trip() {
    let registry = EpsgRegistry;
    let crs = registry.resolve_crs(5773).unwrap();
    let decoded = round_trip(&crs);
    let Crs::Vertical(vcs) = &decoded.crs else {
        panic!("expected vertical result");
    };
    assert_eq!(vcs.authority_code, Some(5773));
    assert_eq!(vcs.datum.authority_code, Some(5171));
    assert!(crs.is_same(&decoded.crs));
}

#[test]
fn user_defined_vertical_datum_survives() {
    let registry = EpsgRegistry;
    let crs = Crs::Vertical(VerticalCrs {
        name: "NGF-IGN69 height".to_string(),
        authority_code: None,
        datum: VerticalDatum {
            name: "Nivellement General de la France - IGN69".to_string(),
            authority_code: Some(5119),
            datum_type: 2005,
        },
        unit: Unit::metre(),
    });
    let decoded = round_trip(&crs);
    let Crs::Vertical(vcs) = &decoded.crs else {
        panic!("expected vertical result");
    };
    assert_eq!(vcs.name, "NGF-IGN69 height");
    assert_eq!(vcs.datum.authority_code, Some(5119));
}

#[test]
fn wkt_to_keys_to_proj_pipeline() {
    // The full translation chain: text in, keys in the middle, text out.
    let registry = EpsgRegistry;
    let crs = from_proj_string("+proj=vandg +datum=WGS84").unwrap();
    let directory = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    let decoded = decode(&directory, &registry, &DecodeOptions::default()).unwrap();
    let proj = to_proj_string(&decoded.crs).unwrap();
    let again = from_proj_string(&proj).unwrap();
    assert!(crs.is_same(&again), "{proj}");
}

#[test]
fn byte_level_round_trip() {
    use srstiff::Endian;

    let registry = EpsgRegistry;
    let crs = registry.resolve_crs(26711).unwrap();
    let directory = encode(&crs, &registry, &EncodeOptions::default()).unwrap();
    for endian in [Endian::Little, Endian::Big] {
        let (d, f, a) = directory.to_bytes(endian);
        let parsed = GeoKeyDirectory::from_bytes(&d, &f, &a, endian).unwrap();
        let decoded = decode(&parsed, &registry, &DecodeOptions::default()).unwrap();
        assert!(crs.is_same(&decoded.crs));
    }
}

#[test]
fn directory_value_types_survive_storage() {
    let mut directory = GeoKeyDirectory::new();
    directory.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
    directory.set(
        GeoKeyId::GeogTOWGS84GeoKey,
        GeoKeyValue::Double(vec![1.0, 2.0, 3.0]),
    );
    directory.set_string(GeoKeyId::GeogCitationGeoKey, "NAD83");
    let (d, f, a) = directory.to_tag_values();
    let parsed = GeoKeyDirectory::from_tag_values(&d, &f, &a).unwrap();
    assert_eq!(parsed, {
        let mut expected = GeoKeyDirectory::new();
        expected.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
        expected.set_string(GeoKeyId::GeogCitationGeoKey, "NAD83");
        expected.set(
            GeoKeyId::GeogTOWGS84GeoKey,
            GeoKeyValue::Double(vec![1.0, 2.0, 3.0]),
        );
        expected
    });
}
