use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::{FileOptions, ZipWriter};

use super::{GeometryMode, NamedPoint};
use crate::utils::error::{ConversionError, Result};

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
const POLYGON_STYLE: &str = "polygonStyle";
/// Name of the main document inside a KMZ archive.
pub const KMZ_DOCUMENT: &str = "doc.kml";

fn export_error(e: impl std::fmt::Display) -> ConversionError {
    ConversionError::ExportError {
        format: "kml".to_string(),
        message: e.to_string(),
    }
}

struct KmlWriter {
    xml: Writer<Cursor<Vec<u8>>>,
}

impl KmlWriter {
    fn new() -> Self {
        Self {
            xml: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.xml.write_event(event).map_err(export_error)
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.xml.into_inner().into_inner()).map_err(export_error)
    }
}

fn coordinate(point: &NamedPoint) -> String {
    format!("{},{},0", point.point.longitude(), point.point.latitude())
}

/// KML document with one placemark per point, or a single closed polygon
/// when asked for one and at least three points exist.
pub fn render_kml(points: &[NamedPoint], document_name: &str, geometry: GeometryMode) -> Result<String> {
    let mut kml = KmlWriter::new();
    kml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    kml.event(Event::Start(
        BytesStart::new("kml").with_attributes([("xmlns", KML_NAMESPACE)]),
    ))?;
    kml.start("Document")?;
    kml.text_element("name", document_name)?;

    match geometry {
        GeometryMode::Polygon if points.len() >= 3 => write_polygon(&mut kml, points, document_name)?,
        GeometryMode::Polygon => {
            tracing::warn!(
                "A polygon needs at least 3 points, got {}; writing placemarks instead",
                points.len()
            );
            write_placemarks(&mut kml, points)?;
        }
        GeometryMode::Points => write_placemarks(&mut kml, points)?,
    }

    kml.end("Document")?;
    kml.end("kml")?;
    kml.finish()
}

fn write_placemarks(kml: &mut KmlWriter, points: &[NamedPoint]) -> Result<()> {
    for point in points {
        kml.start("Placemark")?;
        kml.text_element("name", &point.name)?;
        kml.start("Point")?;
        kml.text_element("coordinates", &coordinate(point))?;
        kml.end("Point")?;
        kml.end("Placemark")?;
    }
    Ok(())
}

fn write_polygon(kml: &mut KmlWriter, points: &[NamedPoint], name: &str) -> Result<()> {
    kml.event(Event::Start(
        BytesStart::new("Style").with_attributes([("id", POLYGON_STYLE)]),
    ))?;
    kml.start("LineStyle")?;
    kml.text_element("color", "ff0000ff")?;
    kml.text_element("width", "2")?;
    kml.end("LineStyle")?;
    kml.start("PolyStyle")?;
    kml.text_element("color", "7f00ff00")?;
    kml.text_element("fill", "1")?;
    kml.text_element("outline", "1")?;
    kml.end("PolyStyle")?;
    kml.end("Style")?;

    // The ring is closed by repeating the first point.
    let ring: Vec<String> = points
        .iter()
        .chain(points.first())
        .map(coordinate)
        .collect();

    kml.start("Placemark")?;
    kml.text_element("name", name)?;
    kml.text_element("styleUrl", &format!("#{}", POLYGON_STYLE))?;
    kml.start("Polygon")?;
    kml.text_element("altitudeMode", "clampToGround")?;
    kml.start("outerBoundaryIs")?;
    kml.start("LinearRing")?;
    kml.text_element("coordinates", &ring.join(" "))?;
    kml.end("LinearRing")?;
    kml.end("outerBoundaryIs")?;
    kml.end("Polygon")?;
    kml.end("Placemark")
}

/// Zips a KML document into a KMZ archive holding it as `doc.kml`.
pub fn package_kmz(kml: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file::<_, ()>(KMZ_DOCUMENT, FileOptions::default())?;
    zip.write_all(kml.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
