//! Sentinel-2 MGRS tiles covering the regions sampled by the pipeline.
use crate::error::{Error, Result};

const REGION_TILES: &[(&str, &[&str])] = &[
    ("Abruzzo", &["33TUG", "33TUH", "33TVG", "33TVH"]),
    ("Molise", &["33TVF", "33TVG", "33TWF", "33TWG"]),
    ("Lazio", &["32TQM", "33TTG", "33TUF", "33TUG", "33TVF"]),
    ("Marche", &["33TUH", "33TUJ", "33TVH"]),
    ("Umbria", &["32TQN", "33TTH", "33TUH"]),
];

/// Tile ids (without the leading `T`) for a region, matched case-insensitively
pub fn tiles_for_region(region: &str) -> Result<&'static [&'static str]> {
    REGION_TILES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(region))
        .map(|(_, tiles)| *tiles)
        .ok_or_else(|| Error::UnknownRegion(region.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abruzzo_includes_sample_tile() {
        let tiles = tiles_for_region("abruzzo").unwrap();
        assert!(tiles.contains(&"33TVG"));
    }

    #[test]
    fn unknown_region_is_an_error() {
        assert!(matches!(
            tiles_for_region("Atlantis"),
            Err(Error::UnknownRegion(r)) if r == "Atlantis"
        ));
    }
}
