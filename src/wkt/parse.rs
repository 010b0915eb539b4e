//! The node-tree grammar shared by every legacy WKT dialect: a keyword
//! followed by a bracketed, comma-separated list of quoted strings, numbers,
//! bare keywords and nested nodes. Both `[]` and `()` brackets are accepted
//! on input; `[]` is written on output.

use std::fmt::Write as _;

use super::WktError;

#[derive(Clone, Debug, PartialEq)]
pub enum WktValue {
    Number(f64),
    Text(String),
    Keyword(String),
    Node(WktNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub values: Vec<WktValue>,
}

impl WktNode {
    pub fn new<S: Into<String>>(keyword: S) -> Self {
        Self {
            keyword: keyword.into(),
            values: vec![],
        }
    }

    pub fn text<S: Into<String>>(mut self, value: S) -> Self {
        self.values.push(WktValue::Text(value.into()));
        self
    }

    pub fn number(mut self, value: f64) -> Self {
        self.values.push(WktValue::Number(value));
        self
    }

    pub fn bare<S: Into<String>>(mut self, value: S) -> Self {
        self.values.push(WktValue::Keyword(value.into()));
        self
    }

    pub fn node(mut self, child: WktNode) -> Self {
        self.values.push(WktValue::Node(child));
        self
    }

    pub fn parse(text: &str) -> Result<Self, WktError> {
        let mut parser = Parser {
            text: text.as_bytes(),
            position: 0,
        };
        parser.skip_whitespace();
        let node = parser.node()?;
        parser.skip_whitespace();
        if parser.position < parser.text.len() {
            return Err(WktError::Unexpected {
                position: parser.position,
                found: parser.text[parser.position] as char,
            });
        }
        Ok(node)
    }

    pub fn text_at(&self, index: usize) -> Option<&str> {
        match self.values.get(index) {
            Some(WktValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn number_at(&self, index: usize) -> Option<f64> {
        match self.values.get(index) {
            Some(WktValue::Number(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn child(&self, keyword: &str) -> Option<&WktNode> {
        self.children(keyword).next()
    }

    pub fn children<'a, 'b>(
        &'a self,
        keyword: &'b str,
    ) -> impl Iterator<Item = &'a WktNode> + use<'a, 'b> {
        self.values.iter().filter_map(move |value| match value {
            WktValue::Node(node) if node.keyword == keyword => Some(node),
            _ => None,
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WktNode> {
        self.values.iter().filter_map(|value| match value {
            WktValue::Node(node) => Some(node),
            _ => None,
        })
    }

    pub fn numbers(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|value| match value {
                WktValue::Number(number) => Some(*number),
                _ => None,
            })
            .collect()
    }

    /// The code of a direct AUTHORITY child, e.g. `AUTHORITY["EPSG","4326"]`.
    pub fn authority_code(&self) -> Option<u16> {
        let authority = self.child("AUTHORITY")?;
        authority.text_at(1)?.parse().ok()
    }

    pub fn to_compact(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    pub fn to_pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_compact(&self, out: &mut String) {
        out.push_str(&self.keyword);
        out.push('[');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match value {
                WktValue::Number(number) => out.push_str(&format_number(*number)),
                WktValue::Text(text) => {
                    let _ = write!(out, "\"{text}\"");
                }
                WktValue::Keyword(keyword) => out.push_str(keyword),
                WktValue::Node(node) => node.write_compact(out),
            }
        }
        out.push(']');
    }

    fn write_pretty(&self, out: &mut String, indent: usize) {
        out.push_str(&self.keyword);
        out.push('[');
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match value {
                WktValue::Number(number) => out.push_str(&format_number(*number)),
                WktValue::Text(text) => {
                    let _ = write!(out, "\"{text}\"");
                }
                WktValue::Keyword(keyword) => out.push_str(keyword),
                WktValue::Node(node) => {
                    out.push('\n');
                    out.push_str(&" ".repeat(indent + 4));
                    node.write_pretty(out, indent + 4);
                }
            }
        }
        out.push(']');
    }
}

/// 15-significant-digit formatting with trailing zeros trimmed, switching to
/// scientific notation for very small or very large magnitudes.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if !(-5..15).contains(&exponent) {
        let formatted = format!("{value:.14E}");
        let (mantissa, exponent) = formatted.split_once('E').unwrap();
        let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
        format!("{mantissa}E{exponent}")
    } else {
        let decimals = (14 - exponent).max(0) as usize;
        let formatted = format!("{value:.decimals$}");
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }
}

struct Parser<'a> {
    text: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while self
            .peek()
            .is_some_and(|byte| byte.is_ascii_whitespace())
        {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.position).copied()
    }

    fn node(&mut self) -> Result<WktNode, WktError> {
        let keyword = self.keyword()?;
        self.skip_whitespace();
        match self.peek() {
            Some(b'[') | Some(b'(') => self.position += 1,
            Some(found) => {
                return Err(WktError::Unexpected {
                    position: self.position,
                    found: found as char,
                })
            }
            None => return Err(WktError::UnexpectedEnd),
        }

        let mut values = vec![];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b']') | Some(b')') => {
                    self.position += 1;
                    break;
                }
                Some(b',') => {
                    self.position += 1;
                }
                Some(_) => values.push(self.value()?),
                None => return Err(WktError::UnexpectedEnd),
            }
        }

        Ok(WktNode { keyword, values })
    }

    fn value(&mut self) -> Result<WktValue, WktError> {
        match self.peek() {
            Some(b'"') => self.quoted().map(WktValue::Text),
            Some(byte) if byte.is_ascii_alphabetic() || byte == b'_' => {
                let start = self.position;
                let keyword = self.keyword()?;
                self.skip_whitespace();
                if matches!(self.peek(), Some(b'[') | Some(b'(')) {
                    self.position = start;
                    self.node().map(WktValue::Node)
                } else {
                    Ok(WktValue::Keyword(keyword))
                }
            }
            Some(_) => self.number().map(WktValue::Number),
            None => Err(WktError::UnexpectedEnd),
        }
    }

    fn keyword(&mut self) -> Result<String, WktError> {
        let start = self.position;
        while self.peek().is_some_and(|byte| {
            byte.is_ascii_alphanumeric() || byte == b'_'
        }) {
            self.position += 1;
        }
        if self.position == start {
            return match self.peek() {
                Some(found) => Err(WktError::Unexpected {
                    position: self.position,
                    found: found as char,
                }),
                None => Err(WktError::UnexpectedEnd),
            };
        }
        Ok(String::from_utf8_lossy(&self.text[start..self.position]).into_owned())
    }

    fn quoted(&mut self) -> Result<String, WktError> {
        self.position += 1; // opening quote
        let start = self.position;
        while let Some(byte) = self.peek() {
            if byte == b'"' {
                let text = String::from_utf8_lossy(&self.text[start..self.position]).into_owned();
                self.position += 1;
                return Ok(text);
            }
            self.position += 1;
        }
        Err(WktError::UnexpectedEnd)
    }

    fn number(&mut self) -> Result<f64, WktError> {
        let start = self.position;
        while self.peek().is_some_and(|byte| {
            byte.is_ascii_digit()
                || matches!(byte, b'+' | b'-' | b'.' | b'e' | b'E')
        }) {
            self.position += 1;
        }
        std::str::from_utf8(&self.text[start..self.position])
            .ok()
            .and_then(|token| token.parse().ok())
            .ok_or(WktError::BadNumber { position: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_nodes() {
        let node = WktNode::parse(
            r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#,
        )
        .unwrap();
        assert_eq!(node.keyword, "GEOGCS");
        assert_eq!(node.text_at(0), Some("WGS 84"));
        let spheroid = node.child("DATUM").unwrap().child("SPHEROID").unwrap();
        assert_eq!(spheroid.number_at(1), Some(6378137.0));
    }

    #[test]
    fn accepts_parentheses_and_whitespace() {
        let node = WktNode::parse("LOCAL_CS(\"x\",\n    UNIT(\"metre\", 1))").unwrap();
        assert_eq!(node.keyword, "LOCAL_CS");
        assert_eq!(node.child("UNIT").unwrap().number_at(1), Some(1.0));
    }

    #[test]
    fn bare_keywords_are_values() {
        let node = WktNode::parse(r#"AXIS["Latitude",NORTH]"#).unwrap();
        assert_eq!(
            node.values[1],
            WktValue::Keyword("NORTH".to_string())
        );
    }

    #[test]
    fn truncated_input_fails() {
        assert_eq!(
            WktNode::parse(r#"GEOGCS["WGS 84""#).unwrap_err(),
            WktError::UnexpectedEnd
        );
    }

    #[test]
    fn compact_round_trip() {
        let text = r#"PROJCS["x",GEOGCS["y",DATUM["d",SPHEROID["s",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["scale_factor",0.9996],UNIT["metre",1],AXIS["Easting",EAST]]"#;
        let node = WktNode::parse(text).unwrap();
        assert_eq!(node.to_compact(), text);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.9996), "0.9996");
        assert_eq!(format_number(6378137.0), "6378137");
        assert_eq!(format_number(298.257223563), "298.257223563");
        assert_eq!(format_number(0.0174532925199433), "0.0174532925199433");
        assert_eq!(format_number(1.23), "1.23");
        assert_eq!(format_number(4.848136811095361e-6), "4.84813681109536E-6");
    }

    #[test]
    fn pretty_indents_nodes() {
        let node = WktNode::parse(r#"GEOGCS["x",DATUM["d",SPHEROID["s",1,0]]]"#).unwrap();
        let pretty = node.to_pretty();
        assert!(pretty.starts_with("GEOGCS[\"x\",\n    DATUM[\"d\",\n        SPHEROID["));
    }
}
