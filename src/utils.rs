//! Utility helpers used across the application (formatting, colors, paging).
//! Keep helpers small and total: none of them can fail.

use crate::api::SPRITE_FALLBACK_BASE;
use crate::models::{Identified, Pokemon};

/// Format an API `name` into a human-friendly form.
///
/// Examples: `mr-mime` -> `Mr Mime`, `ho_oh` -> `Ho Oh`.
pub fn format_name(name: &str) -> String {
    let replaced = name.replace(['-', '_'], " ");
    let parts: Vec<String> = replaced
        .split_whitespace()
        .map(|w| {
            let mut chs = w.chars();
            match chs.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chs.as_str().to_lowercase()
                }
            }
        })
        .collect();
    parts.join(" ")
}

pub fn text_to_lines(s: &str, width: usize) -> Vec<String> {
    // Wrap text into lines no longer than `width` (simple greedy algorithm).
    let mut lines = vec![];
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Color used when a type label has no entry in the table.
pub const FALLBACK_TYPE_COLOR: (u8, u8, u8) = (200, 200, 200);

/// Badge color for a type label (case-insensitive).
pub fn type_color(label: &str) -> (u8, u8, u8) {
    match label.to_lowercase().as_str() {
        "normal" => (168, 168, 120),
        "fire" => (240, 128, 48),
        "water" => (104, 144, 240),
        "grass" => (120, 200, 80),
        "electric" => (248, 208, 48),
        "ice" => (152, 216, 216),
        "fighting" => (192, 48, 40),
        "poison" => (160, 64, 160),
        "ground" => (224, 192, 104),
        "flying" => (168, 144, 240),
        "psychic" => (248, 88, 136),
        "bug" => (168, 184, 32),
        "rock" => (184, 160, 56),
        "ghost" => (112, 88, 152),
        "dragon" => (112, 56, 248),
        "dark" => (112, 88, 72),
        "steel" => (184, 184, 208),
        "fairy" => (238, 153, 172),
        _ => FALLBACK_TYPE_COLOR,
    }
}

/// Whether black text reads better than white on `(r, g, b)`.
pub fn is_light(rgb: (u8, u8, u8)) -> bool {
    let (r, g, b) = rgb;
    let lum = 0.2126 * (r as f32) + 0.7152 * (g as f32) + 0.0722 * (b as f32);
    lum > 160.0
}

/// Short label for a stat name; unknown stats are capitalized.
pub fn stat_abbrev(name: &str) -> String {
    match name {
        "hp" => "HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SpA".to_string(),
        "special-defense" => "SpD".to_string(),
        "speed" => "SPD".to_string(),
        other => {
            let mut c = other.chars();
            match c.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
            }
        }
    }
}

/// Primary sprite URL, or the id-templated one on the sprite asset host.
pub fn sprite_url(p: &Pokemon) -> String {
    match &p.sprite {
        Some(url) if !url.is_empty() => url.clone(),
        _ => format!("{}/{}.png", SPRITE_FALLBACK_BASE, p.id),
    }
}

/// Case-insensitive substring match on a record's name and labels.
/// An empty query matches everything.
pub fn matches_query<T: Identified>(item: &T, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    item.name().to_lowercase().contains(&q)
        || item.labels().iter().any(|l| l.to_lowercase().contains(&q))
}

/// One page of a client-side paginated slice.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// Zero-based page actually returned (clamped to the last page).
    pub page: usize,
    pub page_count: usize,
}

/// Slice `items` into pages of `page_size`; out-of-range pages clamp to the last.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let page_count = items.len().div_ceil(page_size).max(1);
    let page = page.min(page_count - 1);
    let start = (page * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    Page {
        items: &items[start..end],
        page,
        page_count,
    }
}
