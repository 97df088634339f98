//! Common test fixtures for firesmoke tests.
//!
//! This module provides pre-defined documents that represent the shapes the
//! pipeline meets in practice: engine KML output in its various layouts,
//! normalised incident feeds and the raw RSS they come from.

/// The incident used by the end-to-end scenarios.
pub mod scenario {
    pub const DAY: &str = "2025-05-11";
    pub const GUID: &str = "A1";
    pub const TITLE: &str = "Grass fire on FM 1826";
    pub const LAT: f64 = 30.30;
    pub const LON: f64 = -97.73;
    pub const WIND_SPEED: &str = "4 mph";
    pub const WIND_DIRECTION: &str = "S";

    pub fn day() -> chrono::NaiveDate {
        chrono::NaiveDate::from_ymd_opt(2025, 5, 11).expect("valid scenario day")
    }
}

/// Plume documents as produced by the KML converter.
pub mod kml {
    /// KML 2.2 document with a nested Folder holding one polygon Placemark.
    pub const NESTED_POLYGON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>2025-05-11_A1_1</name>
    <Folder>
      <name>Plume</name>
      <Placemark>
        <name>contour 1</name>
        <Polygon>
          <outerBoundaryIs>
            <LinearRing>
              <coordinates>
                -97.73,30.30,0 -97.72,30.31,0 -97.71,30.30,0 -97.73,30.30,0
              </coordinates>
            </LinearRing>
          </outerBoundaryIs>
          <innerBoundaryIs>
            <LinearRing>
              <coordinates>-97.725,30.302 -97.722,30.304 -97.72,30.302 -97.725,30.302</coordinates>
            </LinearRing>
          </innerBoundaryIs>
        </Polygon>
      </Placemark>
    </Folder>
  </Document>
</kml>"#;

    /// Only geometry in the document is a MultiGeometry mixing a point and a polygon.
    pub const COLLECTION_ONLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Placemark>
    <MultiGeometry>
      <Point><coordinates>-97.73,30.30,0</coordinates></Point>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>0,0 0,1 1,1 0,0</coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </MultiGeometry>
  </Placemark>
</kml>"#;

    /// Two polygons in one MultiGeometry; the first member wins.
    pub const MULTI_POLYGON: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <MultiGeometry>
        <Polygon><outerBoundaryIs><LinearRing>
          <coordinates>10,10 10,11 11,11 10,10</coordinates>
        </LinearRing></outerBoundaryIs></Polygon>
        <Polygon><outerBoundaryIs><LinearRing>
          <coordinates>20,20 20,21 21,21 20,20</coordinates>
        </LinearRing></outerBoundaryIs></Polygon>
      </MultiGeometry>
    </Placemark>
  </Document>
</kml>"#;

    /// Legacy KML 2.0 namespace, as written by older converters.
    pub const KML20_POLYGON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://earth.google.com/kml/2.0">
  <Document>
    <Placemark>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>-97.7,30.3 -97.6,30.4 -97.5,30.3 -97.7,30.3</coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;

    /// Well-formed document without any polygon.
    pub const POINT_ONLY: &str = r#"<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark><name>source</name><Point><coordinates>-97.73,30.30</coordinates></Point></Placemark>
  </Document>
</kml>"#;

    /// Structurally broken (mismatched closing tag) but still carrying a ring.
    pub const BROKEN_WITH_RING: &str = r#"<kml xmlns="http://earth.google.com/kml/2.0">
  <Document>
    <Placemark>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>1,2,0 3,4,0 bogus 5,6 1,2</coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygn>
    </Placemark>
  </Document>
</kml>"#;

    /// Build a one-placemark plume document around `ring` (`[lon, lat]` pairs).
    pub fn polygon_kml(ring: &[[f64; 2]]) -> String {
        let coords = ring
            .iter()
            .map(|[lon, lat]| format!("{},{},0", lon, lat))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <Polygon><outerBoundaryIs><LinearRing>
        <coordinates>{}</coordinates>
      </LinearRing></outerBoundaryIs></Polygon>
    </Placemark>
  </Document>
</kml>"#,
            coords
        )
    }
}

/// Incident feed payloads.
pub mod feed {
    use serde_json::{json, Value};

    /// Raw RSS as served by the incident feed.
    pub const RSS_TWO_ITEMS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Active Fires</title>
    <item>
      <title>Grass fire on FM 1826</title>
      <link>https://maps.example.com/?q=30.30,-97.73</link>
      <description>Crews on scene &amp; advancing</description>
      <pubDate>Sun, 11 May 2025 10:00:00 CDT</pubDate>
      <guid isPermaLink="false">A1</guid>
    </item>
    <item>
      <title>Brush fire</title>
      <link>https://maps.example.com/?q=30.10,-97.90</link>
      <guid isPermaLink="false">B2</guid>
    </item>
  </channel>
</rss>"#;

    /// One normalised feed item.
    pub fn item(guid: &str, title: &str, lat: f64, lon: f64) -> Value {
        json!({
            "guid": {"@isPermaLink": "false", "#text": guid},
            "title": title,
            "link": format!("https://maps.example.com/?q={},{}", lat, lon),
            "description": format!("{} description", title),
            "pubDate": "Sun, 11 May 2025 10:00:00 CDT"
        })
    }

    /// Normalised feed document; a single item is stored as an object, not a list.
    pub fn document(items: Vec<Value>) -> Value {
        let item = match items.len() {
            0 => Value::Null,
            1 => items.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(items),
        };
        if item.is_null() {
            json!({"rss": {"@version": "2.0", "channel": {"title": "Active Fires"}}})
        } else {
            json!({"rss": {"@version": "2.0", "channel": {"title": "Active Fires", "item": item}}})
        }
    }
}
