// Asset URLs on Community Dragon. Pure string templates; nothing here checks
// that the asset exists.

pub const CDRAGON: &str = "https://raw.communitydragon.org/latest";

pub fn champion_tile_url(champion_id: &str) -> String {
    format!(
        "{CDRAGON}/plugins/rcp-be-lol-game-data/global/default/v1/champion-tiles/{champion_id}/{champion_id}000.jpg"
    )
}

/// Position icon for a service role string (`ADC`, `SUPPORT`, `MID`, ...).
pub fn role_icon_url(role: &str) -> String {
    let position = match role {
        "ADC" => "bottom".to_string(),
        "SUPPORT" | "SUP" => "utility".to_string(),
        "MID" => "middle".to_string(),
        other => other.to_lowercase(),
    };
    format!("{CDRAGON}/plugins/rcp-fe-lol-static-assets/global/default/svg/position-{position}-light.svg")
}

/// RGB colour of a rune tree, keyed by the tree's rune id.
pub fn rune_tree_color(tree_id: u16) -> Option<(u8, u8, u8)> {
    match tree_id {
        8000 => Some((0xFD, 0xE0, 0x47)), // precision
        8100 => Some((0xDC, 0x26, 0x26)), // domination
        8200 => Some((0x63, 0x66, 0xF1)), // sorcery
        8300 => Some((0x38, 0xBD, 0xF8)), // inspiration
        8400 => Some((0x16, 0xA3, 0x4A)), // resolve
        _ => None,
    }
}
