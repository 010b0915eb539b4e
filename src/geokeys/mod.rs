// https://docs.ogc.org/is/19-008r4/19-008r4.html#_requirements_class_geokeydirectorytag

use std::fmt::Display;

use num_traits::NumCast;

use crate::endian::Endian;

mod error;
mod id;
mod value;

pub use error::GeoKeyError;
pub use id::GeoKeyId;
pub use value::GeoKeyValue;

/// TIFF tag codes a key entry may reference as its value location.
pub const DIRECTORY_TAG: u16 = 34735;
pub const DOUBLE_PARAMS_TAG: u16 = 34736;
pub const ASCII_PARAMS_TAG: u16 = 34737;

/// The key directory of a GeoTIFF file, decoupled from the tag store that
/// carries it. The file layer hands over the three raw tag payloads and gets
/// them back on write; everything in between works on typed keys.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoKeyDirectory {
    pub version: u16,
    pub revision: (u16, u16),
    keys: Vec<GeoKey>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoKey {
    pub id: u16,
    pub value: GeoKeyValue,
}

impl GeoKey {
    pub fn id(&self) -> Option<GeoKeyId> {
        GeoKeyId::try_from(self.id).ok()
    }
}

impl Default for GeoKeyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoKeyDirectory {
    pub fn new() -> Self {
        Self {
            version: 1,
            revision: (1, 0),
            keys: vec![],
        }
    }

    /// Parse from the raw tag payloads: the SHORT directory array and the
    /// DOUBLE/ASCII side arrays. Structural problems fail the whole parse;
    /// no partial directory is returned.
    pub fn from_tag_values(
        directory: &[u16],
        doubles: &[f64],
        ascii: &str,
    ) -> Result<Self, GeoKeyError> {
        if directory.len() < 4 {
            return Err(GeoKeyError::BadHeader);
        }

        let version = directory[0];
        let revision = directory[1];
        let minor_revision = directory[2];
        let key_count = directory[3] as usize;

        if version != 1 {
            return Err(GeoKeyError::UnsupportedVersion(version));
        }
        if directory.len() < 4 + key_count * 4 {
            return Err(GeoKeyError::BadHeader);
        }

        let mut keys = Vec::with_capacity(key_count);
        for i in 0..key_count {
            let entry = &directory[(i + 1) * 4..(i + 2) * 4];
            let (id, location, count, offset) = (entry[0], entry[1], entry[2], entry[3]);

            let out_of_bounds = GeoKeyError::ValueOutOfBounds {
                key: id,
                offset,
                count,
            };
            let start = offset as usize;
            let end = start + count as usize;

            let value = match location {
                0 => match count {
                    0 => GeoKeyValue::Undefined,
                    1 => GeoKeyValue::Short(vec![offset]),
                    _ => return Err(out_of_bounds),
                },
                DIRECTORY_TAG => {
                    if end > directory.len() {
                        return Err(out_of_bounds);
                    }
                    GeoKeyValue::Short(directory[start..end].to_vec())
                }
                DOUBLE_PARAMS_TAG => {
                    if end > doubles.len() {
                        return Err(out_of_bounds);
                    }
                    GeoKeyValue::Double(doubles[start..end].to_vec())
                }
                ASCII_PARAMS_TAG => {
                    let bytes = ascii.as_bytes();
                    if end > bytes.len() {
                        return Err(out_of_bounds);
                    }
                    GeoKeyValue::Ascii(
                        String::from_utf8_lossy(&bytes[start..end])
                            .trim_end_matches(|c| c == '|' || c == '\0')
                            .to_string(),
                    )
                }
                _ => return Err(GeoKeyError::BadKeyLocation { key: id, location }),
            };

            keys.push(GeoKey { id, value });
        }

        Ok(Self {
            version,
            revision: (revision, minor_revision),
            keys,
        })
    }

    /// Parse from raw tag bytes with explicit endianness.
    pub fn from_bytes(
        directory: &[u8],
        doubles: &[u8],
        ascii: &[u8],
        endian: Endian,
    ) -> Result<Self, GeoKeyError> {
        let directory: Vec<u16> = endian
            .decode_all(directory)
            .ok_or(GeoKeyError::BadHeader)?;
        let doubles: Vec<f64> = endian.decode_all(doubles).ok_or(GeoKeyError::BadHeader)?;
        let ascii = String::from_utf8_lossy(ascii);
        Self::from_tag_values(&directory, &doubles, &ascii)
    }

    /// Serialize back into the three tag payloads. Keys are written sorted
    /// ascending by id, as the container format requires; multi-valued SHORT
    /// keys land after the entry block in the directory array itself.
    pub fn to_tag_values(&self) -> (Vec<u16>, Vec<f64>, String) {
        let mut sorted: Vec<&GeoKey> = self.keys.iter().collect();
        sorted.sort_by_key(|key| key.id);

        let mut directory = vec![
            self.version,
            self.revision.0,
            self.revision.1,
            sorted.len() as u16,
        ];
        let mut shorts: Vec<u16> = vec![];
        let mut doubles = vec![];
        let mut ascii = String::new();
        let entry_block = 4 * (sorted.len() + 1) as u16;

        for key in sorted {
            directory.push(key.id);
            match &key.value {
                GeoKeyValue::Short(vec) => match vec.len() {
                    0 => directory.extend([0, 0, 0]),
                    1 => directory.extend([0, 1, vec[0]]),
                    n => {
                        directory.extend([
                            DIRECTORY_TAG,
                            n as u16,
                            entry_block + shorts.len() as u16,
                        ]);
                        shorts.extend(vec);
                    }
                },
                GeoKeyValue::Double(vec) => {
                    directory.extend([
                        DOUBLE_PARAMS_TAG,
                        vec.len() as u16,
                        doubles.len() as u16,
                    ]);
                    doubles.extend(vec);
                }
                GeoKeyValue::Ascii(s) => {
                    directory.extend([
                        ASCII_PARAMS_TAG,
                        s.len() as u16 + 1,
                        ascii.len() as u16,
                    ]);
                    ascii.push_str(s);
                    ascii.push('|');
                }
                GeoKeyValue::Undefined => directory.extend([0, 0, 0]),
            }
        }

        directory.extend(shorts);
        (directory, doubles, ascii)
    }

    /// Serialize into raw tag bytes with explicit endianness.
    pub fn to_bytes(&self, endian: Endian) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let (directory, doubles, ascii) = self.to_tag_values();
        let mut ascii = ascii.into_bytes();
        if !ascii.is_empty() {
            ascii.push(0);
        }
        (
            endian.encode_all(&directory),
            endian.encode_all(&doubles),
            ascii,
        )
    }

    /// Last occurrence wins when a key id was written more than once.
    pub fn get<I: Into<u16>>(&self, id: I) -> Option<&GeoKeyValue> {
        let id = id.into();
        self.keys.iter().rev().find(|key| key.id == id).map(|key| &key.value)
    }

    pub fn short<I: Into<u16>>(&self, id: I) -> Option<u16> {
        self.get(id).and_then(|value| value.as_number())
    }

    pub fn double<I: Into<u16>>(&self, id: I) -> Option<f64> {
        self.get(id).and_then(|value| value.as_number())
    }

    pub fn doubles<I: Into<u16>>(&self, id: I) -> Option<Vec<f64>> {
        self.get(id).and_then(|value| value.as_vec())
    }

    pub fn string<I: Into<u16>>(&self, id: I) -> Option<&str> {
        self.get(id).and_then(|value| value.as_str())
    }

    pub fn number<T: NumCast, I: Into<u16>>(&self, id: I) -> Option<T> {
        self.get(id).and_then(|value| value.as_number())
    }

    /// Replaces an existing key in place, otherwise appends.
    pub fn set<I: Into<u16>>(&mut self, id: I, value: GeoKeyValue) {
        let id = id.into();
        let key = GeoKey { id, value };
        if let Some(index) = self.keys.iter().position(|k| k.id == id) {
            self.keys[index] = key;
        } else {
            self.keys.push(key);
        }
    }

    pub fn set_short<I: Into<u16>>(&mut self, id: I, value: u16) {
        self.set(id, GeoKeyValue::Short(vec![value]));
    }

    pub fn set_double<I: Into<u16>>(&mut self, id: I, value: f64) {
        self.set(id, GeoKeyValue::Double(vec![value]));
    }

    pub fn set_string<I: Into<u16>, S: Into<String>>(&mut self, id: I, value: S) {
        self.set(id, GeoKeyValue::Ascii(value.into()));
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &GeoKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Display for GeoKeyDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GeoKeyDirectory {{version: {}, revision: {}.{}}}",
            self.version, self.revision.0, self.revision.1
        )?;
        for key in self.keys.iter() {
            write!(f, "\n  {key}")?;
        }
        Ok(())
    }
}

impl Display for GeoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{id:?}: {}", self.value),
            None => write!(f, "0x{:04X}: {}", self.id, self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GeoKeyDirectory {
        let mut dir = GeoKeyDirectory::new();
        dir.set_short(GeoKeyId::GTModelTypeGeoKey, 2);
        dir.set_short(GeoKeyId::GeographicTypeGeoKey, 4326);
        dir.set_string(GeoKeyId::GTCitationGeoKey, "WGS 84");
        dir.set_double(GeoKeyId::GeogAngularUnitSizeGeoKey, 0.0174532925199433);
        dir.set(
            GeoKeyId::GeogTOWGS84GeoKey,
            GeoKeyValue::Double(vec![0.0; 7]),
        );
        dir
    }

    #[test]
    fn tag_value_round_trip() {
        let dir = sample();
        let (directory, doubles, ascii) = dir.to_tag_values();
        let parsed = GeoKeyDirectory::from_tag_values(&directory, &doubles, &ascii).unwrap();
        assert_eq!(parsed.len(), dir.len());
        assert_eq!(parsed.short(GeoKeyId::GTModelTypeGeoKey), Some(2));
        assert_eq!(parsed.short(GeoKeyId::GeographicTypeGeoKey), Some(4326));
        assert_eq!(parsed.string(GeoKeyId::GTCitationGeoKey), Some("WGS 84"));
        assert_eq!(
            parsed.double(GeoKeyId::GeogAngularUnitSizeGeoKey),
            Some(0.0174532925199433)
        );
        assert_eq!(
            parsed.doubles(GeoKeyId::GeogTOWGS84GeoKey).unwrap().len(),
            7
        );
    }

    #[test]
    fn byte_round_trip_both_endians() {
        let dir = sample();
        for endian in [Endian::Little, Endian::Big] {
            let (d, f, a) = dir.to_bytes(endian);
            let parsed = GeoKeyDirectory::from_bytes(&d, &f, &a, endian).unwrap();
            assert_eq!(parsed.string(GeoKeyId::GTCitationGeoKey), Some("WGS 84"));
            assert_eq!(
                parsed.double(GeoKeyId::GeogAngularUnitSizeGeoKey),
                Some(0.0174532925199433)
            );
        }
    }

    #[test]
    fn duplicate_keys_last_wins() {
        // Hand-built directory carrying GTModelTypeGeoKey twice.
        let directory = vec![
            1, 1, 0, 2, //
            1024, 0, 1, 1, //
            1024, 0, 1, 2, //
        ];
        let dir = GeoKeyDirectory::from_tag_values(&directory, &[], "").unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.short(GeoKeyId::GTModelTypeGeoKey), Some(2));
    }

    #[test]
    fn ascii_out_of_bounds_fails() {
        let directory = vec![
            1, 1, 0, 1, //
            1026, ASCII_PARAMS_TAG, 20, 0, //
        ];
        let err = GeoKeyDirectory::from_tag_values(&directory, &[], "short").unwrap_err();
        assert!(matches!(err, GeoKeyError::ValueOutOfBounds { key: 1026, .. }));
    }

    #[test]
    fn double_out_of_bounds_fails() {
        let directory = vec![
            1, 1, 0, 1, //
            2062, DOUBLE_PARAMS_TAG, 7, 2, //
        ];
        let err =
            GeoKeyDirectory::from_tag_values(&directory, &[0.0, 0.0, 0.0], "").unwrap_err();
        assert!(matches!(err, GeoKeyError::ValueOutOfBounds { key: 2062, .. }));
    }

    #[test]
    fn truncated_header_fails() {
        let err = GeoKeyDirectory::from_tag_values(&[1, 1], &[], "").unwrap_err();
        assert_eq!(err, GeoKeyError::BadHeader);
    }

    #[test]
    fn unknown_location_fails() {
        let directory = vec![
            1, 1, 0, 1, //
            1026, 42, 1, 0, //
        ];
        let err = GeoKeyDirectory::from_tag_values(&directory, &[], "").unwrap_err();
        assert_eq!(
            err,
            GeoKeyError::BadKeyLocation {
                key: 1026,
                location: 42
            }
        );
    }
}
