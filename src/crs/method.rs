// Coordinate transformation method codes from the GeoTIFF requirements,
// http://geotiff.maptools.org/spec/geotiff6.html#6.3.3.3

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::geokeys::GeoKeyId;

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, TryFromPrimitive, Eq, Hash)]
#[repr(u16)]
pub enum ProjMethod {
    TransverseMercator = 1,
    ObliqueMercator = 3,
    ObliqueMercatorLaborde = 4,
    ObliqueMercatorAzimuthCenter = 5,
    Mercator = 7,
    LambertConfConic2SP = 8,
    LambertConfConic1SP = 9,
    LambertAzimEqualArea = 10,
    AlbersEqualArea = 11,
    AzimuthalEquidistant = 12,
    EquidistantConic = 13,
    Stereographic = 14,
    PolarStereographic = 15,
    ObliqueStereographic = 16,
    Equirectangular = 17,
    CassiniSoldner = 18,
    Gnomonic = 19,
    MillerCylindrical = 20,
    Orthographic = 21,
    Polyconic = 22,
    Robinson = 23,
    Sinusoidal = 24,
    VanDerGrinten = 25,
    NewZealandMapGrid = 26,
    TransverseMercatorSouthOriented = 27,
    CylindricalEqualArea = 28,
}

/// Projection parameters, named after their legacy WKT spelling.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum ProjParam {
    LatitudeOfOrigin,
    CentralMeridian,
    StandardParallel1,
    StandardParallel2,
    LatitudeOfCenter,
    LongitudeOfCenter,
    Azimuth,
    RectifiedGridAngle,
    ScaleFactor,
    FalseEasting,
    FalseNorthing,
    StraightVerticalPoleLong,
}

impl ProjParam {
    pub fn wkt_name(&self) -> &'static str {
        match self {
            ProjParam::LatitudeOfOrigin => "latitude_of_origin",
            ProjParam::CentralMeridian => "central_meridian",
            ProjParam::StandardParallel1 => "standard_parallel_1",
            ProjParam::StandardParallel2 => "standard_parallel_2",
            ProjParam::LatitudeOfCenter => "latitude_of_center",
            ProjParam::LongitudeOfCenter => "longitude_of_center",
            ProjParam::Azimuth => "azimuth",
            ProjParam::RectifiedGridAngle => "rectified_grid_angle",
            ProjParam::ScaleFactor => "scale_factor",
            ProjParam::FalseEasting => "false_easting",
            ProjParam::FalseNorthing => "false_northing",
            ProjParam::StraightVerticalPoleLong => "straight_vertical_longitude_from_pole",
        }
    }

    pub fn from_wkt_name(name: &str) -> Option<Self> {
        Some(match name {
            "latitude_of_origin" => ProjParam::LatitudeOfOrigin,
            "central_meridian" => ProjParam::CentralMeridian,
            "standard_parallel_1" => ProjParam::StandardParallel1,
            "standard_parallel_2" => ProjParam::StandardParallel2,
            "latitude_of_center" => ProjParam::LatitudeOfCenter,
            "longitude_of_center" => ProjParam::LongitudeOfCenter,
            "azimuth" => ProjParam::Azimuth,
            "rectified_grid_angle" => ProjParam::RectifiedGridAngle,
            "scale_factor" => ProjParam::ScaleFactor,
            "false_easting" => ProjParam::FalseEasting,
            "false_northing" => ProjParam::FalseNorthing,
            "straight_vertical_longitude_from_pole" => ProjParam::StraightVerticalPoleLong,
            _ => return None,
        })
    }

    /// True for angle-valued parameters (stored in degrees).
    pub fn is_angular(&self) -> bool {
        !matches!(
            self,
            ProjParam::ScaleFactor | ProjParam::FalseEasting | ProjParam::FalseNorthing
        )
    }
}

impl ProjMethod {
    /// The legacy WKT PROJECTION name. Mercator resolves to its 1SP spelling;
    /// `wkt_name_for_params` picks the 2SP spelling when a standard parallel
    /// is the operative parametrization.
    pub fn wkt_name(&self) -> &'static str {
        match self {
            ProjMethod::TransverseMercator => "Transverse_Mercator",
            ProjMethod::ObliqueMercator => "Hotine_Oblique_Mercator",
            ProjMethod::ObliqueMercatorLaborde => "Laborde_Oblique_Mercator",
            ProjMethod::ObliqueMercatorAzimuthCenter => "Hotine_Oblique_Mercator_Azimuth_Center",
            ProjMethod::Mercator => "Mercator_1SP",
            ProjMethod::LambertConfConic2SP => "Lambert_Conformal_Conic_2SP",
            ProjMethod::LambertConfConic1SP => "Lambert_Conformal_Conic_1SP",
            ProjMethod::LambertAzimEqualArea => "Lambert_Azimuthal_Equal_Area",
            ProjMethod::AlbersEqualArea => "Albers_Conic_Equal_Area",
            ProjMethod::AzimuthalEquidistant => "Azimuthal_Equidistant",
            ProjMethod::EquidistantConic => "Equidistant_Conic",
            ProjMethod::Stereographic => "Stereographic",
            ProjMethod::PolarStereographic => "Polar_Stereographic",
            ProjMethod::ObliqueStereographic => "Oblique_Stereographic",
            ProjMethod::Equirectangular => "Equirectangular",
            ProjMethod::CassiniSoldner => "Cassini_Soldner",
            ProjMethod::Gnomonic => "Gnomonic",
            ProjMethod::MillerCylindrical => "Miller_Cylindrical",
            ProjMethod::Orthographic => "Orthographic",
            ProjMethod::Polyconic => "Polyconic",
            ProjMethod::Robinson => "Robinson",
            ProjMethod::Sinusoidal => "Sinusoidal",
            ProjMethod::VanDerGrinten => "VanDerGrinten",
            ProjMethod::NewZealandMapGrid => "New_Zealand_Map_Grid",
            ProjMethod::TransverseMercatorSouthOriented => "Transverse_Mercator_South_Orientated",
            ProjMethod::CylindricalEqualArea => "Cylindrical_Equal_Area",
        }
    }

    pub fn from_wkt_name(name: &str) -> Option<Self> {
        Some(match name {
            "Transverse_Mercator" => ProjMethod::TransverseMercator,
            "Hotine_Oblique_Mercator" => ProjMethod::ObliqueMercator,
            "Laborde_Oblique_Mercator" => ProjMethod::ObliqueMercatorLaborde,
            "Hotine_Oblique_Mercator_Azimuth_Center" => ProjMethod::ObliqueMercatorAzimuthCenter,
            "Swiss_Oblique_Cylindrical" => ProjMethod::ObliqueMercatorAzimuthCenter,
            "Mercator_1SP" | "Mercator_2SP" => ProjMethod::Mercator,
            "Lambert_Conformal_Conic_2SP" => ProjMethod::LambertConfConic2SP,
            "Lambert_Conformal_Conic_1SP" => ProjMethod::LambertConfConic1SP,
            "Lambert_Azimuthal_Equal_Area" => ProjMethod::LambertAzimEqualArea,
            "Albers_Conic_Equal_Area" => ProjMethod::AlbersEqualArea,
            "Azimuthal_Equidistant" => ProjMethod::AzimuthalEquidistant,
            "Equidistant_Conic" => ProjMethod::EquidistantConic,
            "Stereographic" => ProjMethod::Stereographic,
            "Polar_Stereographic" => ProjMethod::PolarStereographic,
            "Oblique_Stereographic" => ProjMethod::ObliqueStereographic,
            "Equirectangular" => ProjMethod::Equirectangular,
            "Cassini_Soldner" => ProjMethod::CassiniSoldner,
            "Gnomonic" => ProjMethod::Gnomonic,
            "Miller_Cylindrical" => ProjMethod::MillerCylindrical,
            "Orthographic" => ProjMethod::Orthographic,
            "Polyconic" => ProjMethod::Polyconic,
            "Robinson" => ProjMethod::Robinson,
            "Sinusoidal" => ProjMethod::Sinusoidal,
            "VanDerGrinten" => ProjMethod::VanDerGrinten,
            "New_Zealand_Map_Grid" => ProjMethod::NewZealandMapGrid,
            "Transverse_Mercator_South_Orientated" => {
                ProjMethod::TransverseMercatorSouthOriented
            }
            "Cylindrical_Equal_Area" => ProjMethod::CylindricalEqualArea,
            _ => return None,
        })
    }

    /// The keys each parameter of this method is stored under. This table is
    /// the single source of truth for both directions of the codec; methods
    /// listing both a scale and a standard parallel leave the choice between
    /// the two parametrizations to the decoder's precedence rule.
    pub fn parameter_keys(&self) -> &'static [(ProjParam, GeoKeyId)] {
        use GeoKeyId::*;
        use ProjParam::*;
        match self {
            ProjMethod::TransverseMercator | ProjMethod::TransverseMercatorSouthOriented => &[
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (ScaleFactor, ProjScaleAtNatOriginGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::Mercator => &[
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (ScaleFactor, ProjScaleAtNatOriginGeoKey),
                (StandardParallel1, ProjStdParallel1GeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::LambertConfConic2SP => &[
                (StandardParallel1, ProjStdParallel1GeoKey),
                (StandardParallel2, ProjStdParallel2GeoKey),
                (LatitudeOfOrigin, ProjFalseOriginLatGeoKey),
                (CentralMeridian, ProjFalseOriginLongGeoKey),
                (FalseEasting, ProjFalseOriginEastingGeoKey),
                (FalseNorthing, ProjFalseOriginNorthingGeoKey),
            ],
            ProjMethod::LambertConfConic1SP => &[
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (ScaleFactor, ProjScaleAtNatOriginGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::ObliqueMercator
            | ProjMethod::ObliqueMercatorLaborde
            | ProjMethod::ObliqueMercatorAzimuthCenter => &[
                (LatitudeOfCenter, ProjCenterLatGeoKey),
                (LongitudeOfCenter, ProjCenterLongGeoKey),
                (Azimuth, ProjAzimuthAngleGeoKey),
                (RectifiedGridAngle, ProjRectifiedGridAngleGeoKey),
                (ScaleFactor, ProjScaleAtCenterGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::LambertAzimEqualArea => &[
                (LatitudeOfCenter, ProjCenterLatGeoKey),
                (LongitudeOfCenter, ProjCenterLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::AlbersEqualArea | ProjMethod::EquidistantConic => &[
                (StandardParallel1, ProjStdParallel1GeoKey),
                (StandardParallel2, ProjStdParallel2GeoKey),
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::Stereographic | ProjMethod::ObliqueStereographic => &[
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (ScaleFactor, ProjScaleAtNatOriginGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::PolarStereographic => &[
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (StraightVerticalPoleLong, ProjStraightVertPoleLongGeoKey),
                (ScaleFactor, ProjScaleAtNatOriginGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::Equirectangular => &[
                (StandardParallel1, ProjStdParallel1GeoKey),
                (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::CassiniSoldner | ProjMethod::Polyconic | ProjMethod::NewZealandMapGrid => {
                &[
                    (LatitudeOfOrigin, ProjNatOriginLatGeoKey),
                    (CentralMeridian, ProjNatOriginLongGeoKey),
                    (FalseEasting, ProjFalseEastingGeoKey),
                    (FalseNorthing, ProjFalseNorthingGeoKey),
                ]
            }
            ProjMethod::Gnomonic
            | ProjMethod::Orthographic
            | ProjMethod::AzimuthalEquidistant => &[
                (LatitudeOfOrigin, ProjCenterLatGeoKey),
                (CentralMeridian, ProjCenterLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::MillerCylindrical => &[
                (LatitudeOfOrigin, ProjCenterLatGeoKey),
                (CentralMeridian, ProjCenterLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::Robinson | ProjMethod::Sinusoidal | ProjMethod::VanDerGrinten => &[
                (LongitudeOfCenter, ProjCenterLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
            ProjMethod::CylindricalEqualArea => &[
                (StandardParallel1, ProjStdParallel1GeoKey),
                (CentralMeridian, ProjNatOriginLongGeoKey),
                (FalseEasting, ProjFalseEastingGeoKey),
                (FalseNorthing, ProjFalseNorthingGeoKey),
            ],
        }
    }

    /// True when the method accepts both a scale-at-origin and a
    /// standard-parallel parametrization, which producers sometimes mix.
    pub fn dual_parametrization(&self) -> bool {
        matches!(self, ProjMethod::Mercator)
    }
}
