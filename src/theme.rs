//! Decade → visual theme lookup and the era playlist card.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecadeTheme {
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub font_family: &'static str,
    pub background_pattern: &'static str,
}

const fn theme(
    primary_color: &'static str,
    secondary_color: &'static str,
    font_family: &'static str,
    background_pattern: &'static str,
) -> DecadeTheme {
    DecadeTheme { primary_color, secondary_color, font_family, background_pattern }
}

const THEME_2020S: DecadeTheme = theme(
    "#FF3366",
    "#6C5CE7",
    "Inter, sans-serif",
    "linear-gradient(135deg, #FF3366 0%, #6C5CE7 100%)",
);

pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// Theme for the decade containing `year`; unknown decades get the 2020s look.
pub fn decade_theme(year: i32) -> DecadeTheme {
    match decade_of(year) {
        2010 => theme("#00B894", "#0984E3", "Roboto, sans-serif", "linear-gradient(135deg, #00B894 0%, #0984E3 100%)"),
        2000 => theme("#E17055", "#FDCB6E", "Arial, sans-serif", "linear-gradient(135deg, #E17055 0%, #FDCB6E 100%)"),
        1990 => theme("#6C5CE7", "#A8E6CF", "Times New Roman, serif", "linear-gradient(135deg, #6C5CE7 0%, #A8E6CF 100%)"),
        1980 => theme("#FF7675", "#74B9FF", "Helvetica, sans-serif", "linear-gradient(135deg, #FF7675 0%, #74B9FF 100%)"),
        1970 => theme("#55EFC4", "#FFA502", "Courier New, monospace", "linear-gradient(135deg, #55EFC4 0%, #FFA502 100%)"),
        1960 => theme("#FF6B6B", "#4ECDC4", "Georgia, serif", "linear-gradient(135deg, #FF6B6B 0%, #4ECDC4 100%)"),
        1950 => theme("#A8E6CF", "#FFD3A5", "Palatino, serif", "linear-gradient(135deg, #A8E6CF 0%, #FFD3A5 100%)"),
        1940 => theme("#FF8B94", "#B5EAD7", "Bookman, serif", "linear-gradient(135deg, #FF8B94 0%, #B5EAD7 100%)"),
        1930 => theme("#C7CEEA", "#FFB7B2", "Garamond, serif", "linear-gradient(135deg, #C7CEEA 0%, #FFB7B2 100%)"),
        _ => THEME_2020S,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistCard {
    pub name: String,
    pub url: String,
    pub image_url: String,
}

/// Placeholder playlist card pointing at a Spotify search for the year's hits.
pub fn playlist_for_year(year: i32) -> PlaylistCard {
    PlaylistCard {
        name: format!("Top Hits of {}", year),
        url: format!("https://open.spotify.com/search/{}%20hits", year),
        image_url: format!("https://source.unsplash.com/random/400x400/?music,{}", year),
    }
}
