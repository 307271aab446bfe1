//! Scaled 8x8 bitmap text.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};

use super::paint::blend_at;

pub const GLYPH: u32 = 8;

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Integer pixel scale for a nominal CSS font size.
pub fn scale_for(font_px: u32) -> u32 {
    (font_px / GLYPH).max(1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub scale: u32,
    pub letter_spacing: u32,
    pub color: Rgba<u8>,
}

impl TextStyle {
    pub fn advance(&self) -> u32 {
        GLYPH * self.scale + self.letter_spacing
    }

    pub fn height(&self) -> u32 {
        GLYPH * self.scale
    }

    pub fn measure(&self, line: &str) -> u32 {
        let count = line.chars().count() as u32;
        if count == 0 {
            return 0;
        }
        count * self.advance() - self.letter_spacing
    }
}

/// Greedy word wrap to `max_width`; words that cannot fit on their own are
/// broken between characters.
pub fn wrap(text: &str, style: &TextStyle, max_width: u32) -> Vec<String> {
    let max_chars = ((max_width + style.letter_spacing) / style.advance()).max(1) as usize;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn draw_line(img: &mut RgbaImage, x: i64, y: i64, line: &str, style: &TextStyle) {
    let scale = i64::from(style.scale);
    let mut cursor_x = x;
    for ch in line.chars() {
        for (row_idx, row) in glyph(ch).iter().enumerate() {
            for col in 0..8i64 {
                if (row >> col) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col * scale;
                let py = y + row_idx as i64 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        blend_at(img, px + sx, py + sy, style.color);
                    }
                }
            }
        }
        cursor_x += i64::from(style.advance());
    }
}
