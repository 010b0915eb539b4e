//! Best-effort mining of citation strings.
//!
//! Several producers pack structured hints into the free-text citation keys
//! as `Name = Value` fragments, e.g.
//! `GCS Name = GRS 1980(IUGG, 1980)|Datum = unknown|LUnits = 0.01 (Centimeter)`.
//! Everything recognizable is extracted; everything else is ignored and the
//! raw text stays available as a plain name.

/// Markers scanned for in citation text. Values run to the `|` separator
/// when one is present, otherwise to the next whitespace-delimited token.
const GCS_NAME: &str = "GCS Name = ";
const DATUM: &str = "Datum = ";
const ELLIPSOID: &str = "Ellipsoid = ";
const PRIMEM: &str = "Primem = ";
const AUNITS: &str = "AUnits = ";
const LUNITS: &str = "LUnits = ";
const UNITS: &str = "Units = ";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CitationHints {
    pub gcs_name: Option<String>,
    pub datum_name: Option<String>,
    pub ellipsoid_name: Option<String>,
    pub prime_meridian_name: Option<String>,
    pub angular_unit_name: Option<String>,
    /// Factor to metre plus an optional unit name.
    pub linear_unit: Option<(f64, Option<String>)>,
    /// A linear unit referenced by name only (ESRI Imagine style).
    pub linear_unit_name: Option<String>,
}

impl CitationHints {
    pub fn is_empty(&self) -> bool {
        *self == CitationHints::default()
    }
}

/// True when the text is fragment metadata rather than a displayable name.
pub fn is_fragmented(text: &str) -> bool {
    text.contains(" = ")
}

pub fn scrape(text: &str) -> CitationHints {
    let mut hints = CitationHints::default();

    hints.gcs_name = field(text, GCS_NAME);
    hints.datum_name = field(text, DATUM);
    hints.ellipsoid_name = field(text, ELLIPSOID);
    hints.prime_meridian_name = field(text, PRIMEM);
    hints.angular_unit_name = field(text, AUNITS);

    if let Some(value) = field(text, LUNITS) {
        let mut tokens = value.split_whitespace();
        if let Some(factor) = tokens.next().and_then(|t| t.parse::<f64>().ok()) {
            let name = tokens
                .next()
                .map(|t| t.trim_matches(|c| c == '(' || c == ')').to_string());
            hints.linear_unit = Some((factor, name));
        }
    }

    // "Units = meters" style references carry a name only. Skip matches that
    // are really the tail of "LUnits = " or "AUnits = ".
    let mut search = 0;
    while let Some(found) = text[search..].find(UNITS) {
        let at = search + found;
        let preceded = at > 0 && text[..at].ends_with(|c: char| c.is_ascii_alphabetic());
        if !preceded {
            if let Some(token) = text[at + UNITS.len()..].split_whitespace().next() {
                hints.linear_unit_name = Some(token.trim_end_matches('|').to_string());
            }
            break;
        }
        search = at + UNITS.len();
    }

    hints
}

fn field(text: &str, marker: &str) -> Option<String> {
    let at = text.find(marker)?;
    // Reject tails of longer markers, e.g. "LUnits = " containing "Units = ".
    if at > 0 && text[..at].ends_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let rest = &text[at + marker.len()..];
    let value = match rest.find('|') {
        Some(end) => &rest[..end],
        None => rest,
    };
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
