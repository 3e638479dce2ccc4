/*!
 * Fonts used to write translated text back into a page.
 *
 * CJK fonts are referenced, not embedded: they use the Adobe character
 * collections with UCS-2 CMaps so viewers substitute an installed face.
 */

use log::warn;
use lopdf::{dictionary, Document, Object, ObjectId, StringFormat};

use crate::language_utils;

/// How text is encoded for a font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontEncoding {
    /// Composite font, two-byte big-endian UCS-2 codes
    Ucs2 {
        registry_ordering: &'static str,
        supplement: i64,
        cmap: &'static str,
    },
    /// Simple font, single byte WinAnsi codes
    WinAnsi,
}

/// A named font of the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayFont {
    /// Short name used in configuration (e.g. "china-ss")
    pub name: &'static str,
    /// PDF BaseFont name
    pub base_font: &'static str,
    pub encoding: FontEncoding,
}

const GB1: (&str, i64, &str) = ("GB1", 2, "UniGB-UCS2-H");
const CNS1: (&str, i64, &str) = ("CNS1", 0, "UniCNS-UCS2-H");
const JAPAN1: (&str, i64, &str) = ("Japan1", 2, "UniJIS-UCS2-H");
const KOREA1: (&str, i64, &str) = ("Korea1", 1, "UniKS-UCS2-H");

const fn cid(name: &'static str, base_font: &'static str, collection: (&'static str, i64, &'static str)) -> OverlayFont {
    OverlayFont {
        name,
        base_font,
        encoding: FontEncoding::Ucs2 {
            registry_ordering: collection.0,
            supplement: collection.1,
            cmap: collection.2,
        },
    }
}

/// Every font the overlay knows by name
pub const KNOWN_FONTS: &[OverlayFont] = &[
    cid("china-ss", "STSong-Light", GB1),
    cid("china-s", "STHeiti-Regular", GB1),
    cid("china-ts", "MSung-Light", CNS1),
    cid("china-t", "MHei-Medium", CNS1),
    cid("japan", "HeiseiKakuGo-W5", JAPAN1),
    cid("japan-s", "HeiseiMin-W3", JAPAN1),
    cid("korea", "HYGoThic-Medium", KOREA1),
    cid("korea-s", "HYSMyeongJo-Medium", KOREA1),
    OverlayFont { name: "helv", base_font: "Helvetica", encoding: FontEncoding::WinAnsi },
];

impl OverlayFont {
    /// Look a font up by its configuration name
    pub fn by_name(name: &str) -> Option<OverlayFont> {
        let name = name.trim().to_lowercase();
        KNOWN_FONTS.iter().copied().find(|f| f.name == name)
    }

    /// Whether every character of the text can be encoded for this font
    pub fn can_render(&self, text: &str) -> bool {
        match self.encoding {
            FontEncoding::Ucs2 { .. } => text.chars().all(|c| (c as u32) <= 0xFFFF),
            FontEncoding::WinAnsi => text.chars().all(|c| win_ansi_code(c).is_some()),
        }
    }

    /// Encode text as a PDF string operand, `None` when a character is unsupported
    pub fn encode(&self, text: &str) -> Option<Object> {
        let bytes = match self.encoding {
            FontEncoding::Ucs2 { .. } => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let code = u16::try_from(c as u32).ok()?;
                    bytes.extend_from_slice(&code.to_be_bytes());
                }
                bytes
            }
            FontEncoding::WinAnsi => text.chars().map(win_ansi_code).collect::<Option<Vec<u8>>>()?,
        };
        let format = match self.encoding {
            FontEncoding::Ucs2 { .. } => StringFormat::Hexadecimal,
            FontEncoding::WinAnsi => StringFormat::Literal,
        };
        Some(Object::String(bytes, format))
    }

    /// Add the font dictionaries to the document
    pub fn add_to_document(&self, doc: &mut Document) -> ObjectId {
        match self.encoding {
            FontEncoding::Ucs2 { registry_ordering, supplement, cmap } => {
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => Object::Name(self.base_font.as_bytes().to_vec()),
                    "Flags" => 6,
                    "FontBBox" => vec![Object::Integer(-25), Object::Integer(-254), Object::Integer(1000), Object::Integer(880)],
                    "ItalicAngle" => 0,
                    "Ascent" => 880,
                    "Descent" => -120,
                    "CapHeight" => 880,
                    "StemV" => 93,
                });
                let cid_font_id = doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "CIDFontType0",
                    "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
                    "CIDSystemInfo" => dictionary! {
                        "Registry" => Object::string_literal("Adobe"),
                        "Ordering" => Object::string_literal(registry_ordering),
                        "Supplement" => supplement,
                    },
                    "FontDescriptor" => descriptor_id,
                    "DW" => 1000,
                });
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type0",
                    "BaseFont" => Object::Name(format!("{}-{}", self.base_font, cmap).into_bytes()),
                    "Encoding" => Object::Name(cmap.as_bytes().to_vec()),
                    "DescendantFonts" => vec![Object::Reference(cid_font_id)],
                })
            }
            FontEncoding::WinAnsi => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(self.base_font.as_bytes().to_vec()),
                "Encoding" => "WinAnsiEncoding",
            }),
        }
    }
}

/// WinAnsi code of a character
fn win_ansi_code(c: char) -> Option<u8> {
    let scalar = c as u32;
    match scalar {
        0x20..=0x7E | 0xA0..=0xFF => Some(scalar as u8),
        _ => {
            let code = match c {
                '\u{20AC}' => 0x80,
                '\u{201A}' => 0x82,
                '\u{0192}' => 0x83,
                '\u{201E}' => 0x84,
                '\u{2026}' => 0x85,
                '\u{2020}' => 0x86,
                '\u{2021}' => 0x87,
                '\u{02C6}' => 0x88,
                '\u{2030}' => 0x89,
                '\u{0160}' => 0x8A,
                '\u{2039}' => 0x8B,
                '\u{0152}' => 0x8C,
                '\u{017D}' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{02DC}' => 0x98,
                '\u{2122}' => 0x99,
                '\u{0161}' => 0x9A,
                '\u{203A}' => 0x9B,
                '\u{0153}' => 0x9C,
                '\u{017E}' => 0x9E,
                '\u{0178}' => 0x9F,
                _ => return None,
            };
            Some(code)
        }
    }
}

/// Default chain of font names for a target language
pub fn default_font_names(target_language: &str) -> Vec<&'static str> {
    if language_utils::is_traditional_chinese(target_language) {
        return vec!["china-ts", "china-t", "china-ss"];
    }
    match language_utils::base_language(target_language).as_str() {
        "zh" => vec!["china-ss", "china-s", "china-ts"],
        "ja" => vec!["japan", "japan-s", "china-ss"],
        "ko" => vec!["korea", "korea-s", "china-ss"],
        _ => vec!["helv", "china-ss", "china-s"],
    }
}

/// Resolve the configured chain, falling back to the language default
pub fn resolve_font_chain(configured: &[String], target_language: &str) -> Vec<OverlayFont> {
    let chain: Vec<OverlayFont> = configured
        .iter()
        .filter_map(|name| {
            let font = OverlayFont::by_name(name);
            if font.is_none() {
                warn!("Unknown overlay font '{}', skipping", name);
            }
            font
        })
        .collect();

    if !chain.is_empty() {
        return chain;
    }

    default_font_names(target_language)
        .into_iter()
        .filter_map(OverlayFont::by_name)
        .collect()
}
