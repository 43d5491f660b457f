//! Size descriptor parsing.
//!
//! Sources that publish authoritative metadata do so as a small XML document
//! carrying the panorama's full pixel dimensions and tile size. Element
//! placement varies between sources, so lookup is by local name anywhere in
//! the tree rather than by a fixed path.

use thiserror::Error;

/// Authoritative panorama dimensions from a source's metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeDescriptor {
    /// Full panorama width in pixels
    pub width: u32,
    /// Full panorama height in pixels
    pub height: u32,
    /// Uniform tile size in pixels
    pub tile_size: u32,
}

/// Errors parsing a size descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor is not valid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("descriptor is missing element <{0}>")]
    MissingElement(&'static str),

    #[error("descriptor element <{element}> has invalid value {value:?}")]
    InvalidValue { element: &'static str, value: String },
}

/// Parse a size descriptor from raw XML bytes.
pub fn parse_descriptor(bytes: &[u8]) -> Result<SizeDescriptor, DescriptorError> {
    let text = String::from_utf8_lossy(bytes);
    let doc = roxmltree::Document::parse(&text)?;

    let width = element_value(&doc, "maxWidth")?;
    let height = element_value(&doc, "maxHeight")?;
    let tile_size = element_value(&doc, "tileSize")?;

    Ok(SizeDescriptor {
        width,
        height,
        tile_size,
    })
}

fn element_value(doc: &roxmltree::Document, name: &'static str) -> Result<u32, DescriptorError> {
    let node = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .ok_or(DescriptorError::MissingElement(name))?;

    let text = node.text().unwrap_or("").trim();
    text.parse::<u32>()
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| DescriptorError::InvalidValue {
            element: name,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <kml xmlns="http://earth.google.com/kml/2.1">
          <Document>
            <GigapanPhoto>
              <maxWidth>59783</maxWidth>
              <maxHeight>24658</maxHeight>
              <tileSize>256</tileSize>
            </GigapanPhoto>
          </Document>
        </kml>"#;

    #[test]
    fn test_parse_sample_descriptor() {
        let d = parse_descriptor(SAMPLE.as_bytes()).unwrap();
        assert_eq!(d.width, 59783);
        assert_eq!(d.height, 24658);
        assert_eq!(d.tile_size, 256);
    }

    #[test]
    fn test_element_found_regardless_of_nesting() {
        let flat = "<r><maxWidth>10</maxWidth><maxHeight>20</maxHeight><tileSize>5</tileSize></r>";
        let d = parse_descriptor(flat.as_bytes()).unwrap();
        assert_eq!(d.width, 10);
        assert_eq!(d.height, 20);
        assert_eq!(d.tile_size, 5);
    }

    #[test]
    fn test_missing_element() {
        let xml = "<r><maxWidth>10</maxWidth><tileSize>5</tileSize></r>";
        let err = parse_descriptor(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, DescriptorError::MissingElement("maxHeight")));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let xml = "<r><maxWidth>0</maxWidth><maxHeight>20</maxHeight><tileSize>5</tileSize></r>";
        let err = parse_descriptor(xml.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::InvalidValue {
                element: "maxWidth",
                ..
            }
        ));
    }

    #[test]
    fn test_not_xml() {
        assert!(parse_descriptor(b"not xml at all <<<").is_err());
    }
}
