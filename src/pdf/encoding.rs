/*!
 * Font encodings and metrics for text extraction.
 *
 * Decodes the bytes of PDF string operands into Unicode text and glyph
 * advances for one page font. Handles ToUnicode CMaps, composite (Type0)
 * fonts with two-byte codes and simple fonts with a base encoding plus
 * `/Differences`.
 */

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

const DEFAULT_WIDTH: f32 = 500.0;
const DEFAULT_ASCENT: f32 = 0.8;
const DEFAULT_DESCENT: f32 = -0.2;

/// Follow indirect references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    for _ in 0..8 {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => obj = target,
                Err(_) => return obj,
            },
            _ => return obj,
        }
    }
    obj
}

/// Numeric value of an integer or real object
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

fn dict_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    dict_get(doc, dict, key).and_then(number)
}

fn stream_bytes(obj: &Object) -> Option<Vec<u8>> {
    match obj {
        Object::Stream(stream) => Some(
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
        ),
        _ => None,
    }
}

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Unicode text for the code (ligatures may map to several chars)
    pub text: String,
    /// Horizontal advance in thousandths of an em
    pub width: f32,
    /// Single byte code 32, which also receives word spacing
    pub is_word_space: bool,
}

#[derive(Debug, Clone)]
enum WidthTable {
    Simple { first_char: u32, widths: Vec<f32>, missing: f32 },
    Composite { widths: HashMap<u32, f32>, default: f32 },
}

impl WidthTable {
    fn width(&self, code: u32) -> f32 {
        match self {
            WidthTable::Simple { first_char, widths, missing } => code
                .checked_sub(*first_char)
                .and_then(|index| widths.get(index as usize).copied())
                .unwrap_or(*missing),
            WidthTable::Composite { widths, default } => widths.get(&code).copied().unwrap_or(*default),
        }
    }
}

/// Everything needed to turn string bytes into text and advances
#[derive(Debug, Clone)]
pub struct FontInfo {
    composite: bool,
    identity_ucs2: bool,
    to_unicode: HashMap<u32, String>,
    simple_table: Vec<Option<String>>,
    widths: WidthTable,
    /// Ascender in em units
    pub ascent: f32,
    /// Descender in em units, usually negative
    pub descent: f32,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            composite: false,
            identity_ucs2: false,
            to_unicode: HashMap::new(),
            simple_table: win_ansi_table(),
            widths: WidthTable::Simple { first_char: 0, widths: Vec::new(), missing: DEFAULT_WIDTH },
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
        }
    }
}

impl FontInfo {
    /// Build the decoding tables of a font dictionary
    pub fn from_dictionary(doc: &Document, font: &Dictionary) -> Self {
        let subtype = match dict_get(doc, font, b"Subtype") {
            Some(Object::Name(name)) => name.clone(),
            _ => Vec::new(),
        };
        let composite = subtype == b"Type0";

        let to_unicode = dict_get(doc, font, b"ToUnicode")
            .and_then(stream_bytes)
            .map(|bytes| parse_to_unicode_cmap(&bytes))
            .unwrap_or_default();

        let mut info = FontInfo { composite, to_unicode, ..FontInfo::default() };

        if composite {
            info.identity_ucs2 = matches!(
                dict_get(doc, font, b"Encoding"),
                Some(Object::Name(name)) if is_unicode_cmap(name)
            );
            let descendant = match dict_get(doc, font, b"DescendantFonts") {
                Some(Object::Array(fonts)) => fonts.first().map(|f| resolve(doc, f)),
                _ => None,
            };
            if let Some(Object::Dictionary(cid_font)) = descendant {
                info.widths = composite_widths(doc, cid_font);
                info.read_descriptor(doc, cid_font);
            } else {
                info.widths = WidthTable::Composite { widths: HashMap::new(), default: 1000.0 };
            }
        } else {
            info.simple_table = simple_encoding_table(doc, font);
            info.widths = simple_widths(doc, font);
            info.read_descriptor(doc, font);
        }

        info
    }

    fn read_descriptor(&mut self, doc: &Document, font: &Dictionary) {
        let Some(Object::Dictionary(descriptor)) = dict_get(doc, font, b"FontDescriptor") else {
            return;
        };
        let ascent = dict_number(doc, descriptor, b"Ascent").unwrap_or(0.0);
        let descent = dict_number(doc, descriptor, b"Descent").unwrap_or(0.0);
        if ascent > 0.0 {
            self.ascent = ascent / 1000.0;
            self.descent = if descent < 0.0 { descent / 1000.0 } else { DEFAULT_DESCENT };
        }
        if let WidthTable::Simple { missing, .. } = &mut self.widths {
            if let Some(width) = dict_number(doc, descriptor, b"MissingWidth").filter(|w| *w > 0.0) {
                *missing = width;
            }
        }
    }

    /// Decode string operand bytes into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| {
                    let code = if pair.len() == 2 {
                        u32::from(pair[0]) << 8 | u32::from(pair[1])
                    } else {
                        u32::from(pair[0])
                    };
                    let text = self.to_unicode.get(&code).cloned().unwrap_or_else(|| {
                        if self.identity_ucs2 {
                            char::from_u32(code).map(String::from).unwrap_or_default()
                        } else {
                            String::new()
                        }
                    });
                    Glyph { text, width: self.widths.width(code), is_word_space: false }
                })
                .collect()
        } else {
            bytes
                .iter()
                .map(|&byte| {
                    let code = u32::from(byte);
                    let text = self
                        .to_unicode
                        .get(&code)
                        .cloned()
                        .or_else(|| self.simple_table.get(byte as usize).cloned().flatten())
                        .unwrap_or_default();
                    Glyph { text, width: self.widths.width(code), is_word_space: byte == b' ' }
                })
                .collect()
        }
    }
}

/// CMaps whose two-byte codes are Unicode values
fn is_unicode_cmap(name: &[u8]) -> bool {
    let name = String::from_utf8_lossy(name);
    name.starts_with("Identity-") || name.contains("-UCS2-") || name.contains("-UTF16-")
}

fn simple_widths(doc: &Document, font: &Dictionary) -> WidthTable {
    let first_char = dict_number(doc, font, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
    let widths = match dict_get(doc, font, b"Widths") {
        Some(Object::Array(values)) => values
            .iter()
            .map(|w| number(resolve(doc, w)).unwrap_or(DEFAULT_WIDTH))
            .collect(),
        _ => Vec::new(),
    };
    WidthTable::Simple { first_char, widths, missing: DEFAULT_WIDTH }
}

fn composite_widths(doc: &Document, cid_font: &Dictionary) -> WidthTable {
    let default = dict_number(doc, cid_font, b"DW").unwrap_or(1000.0);
    let mut widths = HashMap::new();

    if let Some(Object::Array(entries)) = dict_get(doc, cid_font, b"W") {
        let entries: Vec<&Object> = entries.iter().map(|e| resolve(doc, e)).collect();
        let mut i = 0;
        while i < entries.len() {
            let Some(first) = number(entries[i]) else { break };
            match entries.get(i + 1) {
                Some(Object::Array(list)) => {
                    for (offset, w) in list.iter().enumerate() {
                        if let Some(w) = number(resolve(doc, w)) {
                            widths.insert(first as u32 + offset as u32, w);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(w)) = (number(last), entries.get(i + 2).and_then(|w| number(w))) else {
                        break;
                    };
                    let first = first as u32;
                    for code in first..=(last as u32).min(first.saturating_add(0xFFFF)) {
                        widths.insert(code, w);
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    WidthTable::Composite { widths, default }
}

fn simple_encoding_table(doc: &Document, font: &Dictionary) -> Vec<Option<String>> {
    let mut table = win_ansi_table();

    let differences = match dict_get(doc, font, b"Encoding") {
        Some(Object::Dictionary(encoding)) => match dict_get(doc, encoding, b"Differences") {
            Some(Object::Array(diffs)) => Some(diffs),
            _ => None,
        },
        _ => None,
    };

    if let Some(diffs) = differences {
        let mut code: usize = 0;
        for entry in diffs.iter().map(|d| resolve(doc, d)) {
            match entry {
                Object::Integer(start) => code = (*start).max(0) as usize,
                Object::Name(name) => {
                    if code < table.len() {
                        if let Some(text) = glyph_name_to_text(name) {
                            table[code] = Some(text);
                        }
                    }
                    code += 1;
                }
                _ => {}
            }
        }
    }

    table
}

/// Base single byte table, WinAnsiEncoding (also used for Standard and MacRoman)
fn win_ansi_table() -> Vec<Option<String>> {
    const CP1252_HIGH: [u32; 32] = [
        0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
        0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
        0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
    ];

    (0u32..256)
        .map(|code| {
            let scalar = match code {
                0x20..=0x7E | 0xA0..=0xFF => code,
                0x80..=0x9F => CP1252_HIGH[(code - 0x80) as usize],
                _ => 0,
            };
            char::from_u32(scalar).filter(|_| scalar != 0).map(String::from)
        })
        .collect()
}

/// Map an Adobe glyph name to text
pub fn glyph_name_to_text(name: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(name).ok()?;
    let name = name.split('.').next().unwrap_or(name);

    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|c| std::str::from_utf8(c).ok().and_then(|s| u16::from_str_radix(s, 16).ok()))
                .collect();
            return units.map(|u| String::from_utf16_lossy(&u));
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                return Some(c.to_string());
            }
        }
    }
    if name.chars().count() == 1 {
        return Some(name.to_string());
    }

    let text = match name {
        "space" | "nbspace" => " ",
        "exclam" => "!",
        "quotedbl" => "\"",
        "numbersign" => "#",
        "dollar" => "$",
        "percent" => "%",
        "ampersand" => "&",
        "quotesingle" => "'",
        "parenleft" => "(",
        "parenright" => ")",
        "asterisk" => "*",
        "plus" => "+",
        "comma" => ",",
        "hyphen" | "minus" => "-",
        "period" => ".",
        "slash" => "/",
        "zero" => "0",
        "one" => "1",
        "two" => "2",
        "three" => "3",
        "four" => "4",
        "five" => "5",
        "six" => "6",
        "seven" => "7",
        "eight" => "8",
        "nine" => "9",
        "colon" => ":",
        "semicolon" => ";",
        "less" => "<",
        "equal" => "=",
        "greater" => ">",
        "question" => "?",
        "at" => "@",
        "bracketleft" => "[",
        "backslash" => "\\",
        "bracketright" => "]",
        "asciicircum" => "^",
        "underscore" => "_",
        "grave" => "`",
        "braceleft" => "{",
        "bar" => "|",
        "braceright" => "}",
        "asciitilde" => "~",
        "quoteleft" => "\u{2018}",
        "quoteright" => "\u{2019}",
        "quotedblleft" => "\u{201C}",
        "quotedblright" => "\u{201D}",
        "endash" => "\u{2013}",
        "emdash" => "\u{2014}",
        "bullet" => "\u{2022}",
        "ellipsis" => "\u{2026}",
        "degree" => "\u{00B0}",
        "copyright" => "\u{00A9}",
        "registered" => "\u{00AE}",
        "trademark" => "\u{2122}",
        "eacute" => "\u{00E9}",
        "egrave" => "\u{00E8}",
        "agrave" => "\u{00E0}",
        "ccedilla" => "\u{00E7}",
        "udieresis" => "\u{00FC}",
        "odieresis" => "\u{00F6}",
        "adieresis" => "\u{00E4}",
        "germandbls" => "\u{00DF}",
        "dotlessi" => "\u{0131}",
        "fi" => "fi",
        "fl" => "fl",
        "ff" => "ff",
        "ffi" => "ffi",
        "ffl" => "ffl",
        _ => return None,
    };
    Some(text.to_string())
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize_cmap(data: &[u8]) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = data[start..].iter().position(|&b| b == b'>').map_or(data.len(), |p| start + p);
                let digits: Vec<u8> = data[start..end].iter().copied().filter(u8::is_ascii_hexdigit).collect();
                let bytes = digits
                    .chunks(2)
                    .filter_map(|pair| {
                        let hex = if pair.len() == 2 { [pair[0], pair[1]] } else { [pair[0], b'0'] };
                        std::str::from_utf8(&hex).ok().and_then(|s| u8::from_str_radix(s, 16).ok())
                    })
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
                i = end + 1;
            }
            b'[' => {
                tokens.push(CMapToken::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(CMapToken::ArrayEnd);
                i += 1;
            }
            b'(' => {
                let mut depth = 0;
                while i < data.len() {
                    match data[i] {
                        b'\\' => i += 1,
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'(' | b'%')
                {
                    i += 1;
                }
                tokens.push(CMapToken::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }
    tokens
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| if pair.len() == 2 { u16::from(pair[0]) << 8 | u16::from(pair[1]) } else { u16::from(pair[0]) })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Offset the last UTF-16 unit of a destination string
fn offset_utf16(bytes: &[u8], offset: u32) -> String {
    let mut units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| if pair.len() == 2 { u16::from(pair[0]) << 8 | u16::from(pair[1]) } else { u16::from(pair[0]) })
        .collect();
    if let Some(last) = units.last_mut() {
        *last = last.wrapping_add(offset as u16);
    }
    String::from_utf16_lossy(&units)
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap
pub fn parse_to_unicode_cmap(data: &[u8]) -> HashMap<u32, String> {
    let tokens = tokenize_cmap(data);
    let mut map = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            CMapToken::Word(word) if word == "beginbfchar" => {
                i += 1;
                while i + 1 < tokens.len() {
                    match (&tokens[i], &tokens[i + 1]) {
                        (CMapToken::Hex(src), CMapToken::Hex(dst)) => {
                            map.insert(code_of(src), utf16_text(dst));
                            i += 2;
                        }
                        _ => break,
                    }
                }
            }
            CMapToken::Word(word) if word == "beginbfrange" => {
                i += 1;
                while i + 2 < tokens.len() {
                    let (CMapToken::Hex(lo), CMapToken::Hex(hi)) = (&tokens[i], &tokens[i + 1]) else {
                        break;
                    };
                    let (lo, hi) = (code_of(lo), code_of(hi));
                    match &tokens[i + 2] {
                        CMapToken::Hex(dst) => {
                            for code in lo..=hi.min(lo.saturating_add(0xFFFF)) {
                                map.insert(code, offset_utf16(dst, code - lo));
                            }
                            i += 3;
                        }
                        CMapToken::ArrayStart => {
                            let mut j = i + 3;
                            let mut code = lo;
                            while let Some(CMapToken::Hex(dst)) = tokens.get(j) {
                                if code <= hi {
                                    map.insert(code, utf16_text(dst));
                                }
                                code += 1;
                                j += 1;
                            }
                            // skip the closing bracket
                            i = j + 1;
                        }
                        _ => break,
                    }
                }
            }
            _ => i += 1,
        }
    }

    map
}
