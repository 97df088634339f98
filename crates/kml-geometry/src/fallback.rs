//! Last-resort ring scan over raw KML text.
//!
//! Used only after the structured parse has produced no ring. The scan does
//! not require matching end tags and stops quietly at the first XML error,
//! keeping whatever it has already found.

use firesmoke_common::Ring;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::parse_coordinates;

/// First non-empty `LinearRing/coordinates` text in document order.
pub fn first_linear_ring(xml: &str) -> Option<Ring> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(_) => return None,
        };

        match event {
            Event::Start(e) => path.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) if in_ring_coordinates(&path) => {
                if let Ok(text) = t.unescape() {
                    let ring = parse_coordinates(&text);
                    if !ring.is_empty() {
                        return Some(ring);
                    }
                }
            }
            Event::Eof => return None,
            _ => {}
        }
        buf.clear();
    }
}

fn in_ring_coordinates(path: &[Vec<u8>]) -> bool {
    matches!(
        path,
        [.., parent, leaf] if parent.as_slice() == b"LinearRing" && leaf.as_slice() == b"coordinates"
    )
}
