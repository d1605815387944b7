//! Best-effort scraping of capture metadata embedded in the submessage.
//!
//! The mobile client appends location and orientation to the free-text
//! context using fixed markers, e.g.
//! `촬영 위치: 37.55,126.99 (Jung-gu, Seoul)` and `촬영 방향: portrait`.
//! This format is fragile by nature: extraction never fails, it just
//! yields an empty string when a marker or its delimiter is absent.

/// Marker preceding the capture location segment.
pub const LOCATION_MARKER: &str = "촬영 위치:";

/// Marker preceding the capture orientation segment.
pub const ORIENTATION_MARKER: &str = "촬영 방향:";

/// Capture orientation recognized in the submessage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationHint {
    Landscape,
    Portrait,
}

/// Extract the capture location: text between the location marker and the
/// closing parenthesis of its `(district, city)` suffix.
pub fn extract_location(submessage: &str) -> String {
    let Some(idx) = submessage.find(LOCATION_MARKER) else {
        return String::new();
    };
    let start = idx + LOCATION_MARKER.len();
    match submessage[start..].find(')') {
        Some(rel) if rel > 0 => submessage[start..start + rel].trim().to_string(),
        _ => String::new(),
    }
}

/// Extract the capture orientation: text between the orientation marker and
/// the next comma.
pub fn extract_orientation(submessage: &str) -> String {
    let Some(idx) = submessage.find(ORIENTATION_MARKER) else {
        return String::new();
    };
    let start = idx + ORIENTATION_MARKER.len();
    match submessage[start..].find(',') {
        Some(rel) if rel > 0 => submessage[start..start + rel].trim().to_string(),
        _ => String::new(),
    }
}

/// Detect a landscape/portrait keyword following the orientation marker,
/// used to enrich the generation prompt.
pub fn orientation_hint(submessage: &str) -> Option<OrientationHint> {
    if submessage.contains("촬영 방향: landscape") {
        Some(OrientationHint::Landscape)
    } else if submessage.contains("촬영 방향: portrait") {
        Some(OrientationHint::Portrait)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_location() {
        let sub = "거리 풍경, 촬영 위치: 37.55,126.99 (Jung-gu, Seoul), 촬영 방향: portrait";
        assert_eq!(extract_location(sub), "37.55,126.99 (Jung-gu, Seoul");
    }

    #[test]
    fn test_extract_location_missing_marker() {
        assert_eq!(extract_location("just a caption"), "");
    }

    #[test]
    fn test_extract_location_unclosed() {
        assert_eq!(extract_location("촬영 위치: 37.55,126.99"), "");
    }

    #[test]
    fn test_extract_orientation() {
        let sub = "촬영 방향: landscape, 촬영 위치: 1,2 (A, B)";
        assert_eq!(extract_orientation(sub), "landscape");
    }

    #[test]
    fn test_extract_orientation_without_trailing_comma() {
        // Orientation as the final segment has no comma delimiter;
        // best-effort extraction yields empty rather than guessing.
        assert_eq!(extract_orientation("촬영 방향: portrait"), "");
    }

    #[test]
    fn test_orientation_hint() {
        assert_eq!(
            orientation_hint("abc 촬영 방향: landscape, def"),
            Some(OrientationHint::Landscape)
        );
        assert_eq!(
            orientation_hint("촬영 방향: portrait"),
            Some(OrientationHint::Portrait)
        );
        assert_eq!(orientation_hint("no markers here"), None);
        assert_eq!(orientation_hint("촬영 방향: upside-down"), None);
    }
}
