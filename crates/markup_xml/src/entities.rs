//! Character and entity reference decoding
use crate::config::Dialect;
use phf::phf_map;
use std::borrow::Cow;

/// Entities every XML processor knows without a DTD
pub static XML_PREDEFINED_ENTITIES: phf::Map<&'static str, &'static str> = phf_map! {
    "lt" => "<",
    "gt" => ">",
    "amp" => "&",
    "apos" => "'",
    "quot" => "\"",
};

/// Named character references of HTML that are commonly found in documents
pub static HTML_NAMED_ENTITIES: phf::Map<&'static str, &'static str> = phf_map! {
    "nbsp" => "\u{00A0}",
    "iexcl" => "\u{00A1}",
    "cent" => "\u{00A2}",
    "pound" => "\u{00A3}",
    "curren" => "\u{00A4}",
    "yen" => "\u{00A5}",
    "brvbar" => "\u{00A6}",
    "sect" => "\u{00A7}",
    "uml" => "\u{00A8}",
    "copy" => "\u{00A9}",
    "ordf" => "\u{00AA}",
    "laquo" => "\u{00AB}",
    "not" => "\u{00AC}",
    "shy" => "\u{00AD}",
    "reg" => "\u{00AE}",
    "macr" => "\u{00AF}",
    "deg" => "\u{00B0}",
    "plusmn" => "\u{00B1}",
    "sup2" => "\u{00B2}",
    "sup3" => "\u{00B3}",
    "acute" => "\u{00B4}",
    "micro" => "\u{00B5}",
    "para" => "\u{00B6}",
    "middot" => "\u{00B7}",
    "cedil" => "\u{00B8}",
    "sup1" => "\u{00B9}",
    "ordm" => "\u{00BA}",
    "raquo" => "\u{00BB}",
    "frac14" => "\u{00BC}",
    "frac12" => "\u{00BD}",
    "frac34" => "\u{00BE}",
    "iquest" => "\u{00BF}",
    "Agrave" => "\u{00C0}",
    "Aacute" => "\u{00C1}",
    "Auml" => "\u{00C4}",
    "Aring" => "\u{00C5}",
    "AElig" => "\u{00C6}",
    "Ccedil" => "\u{00C7}",
    "Eacute" => "\u{00C9}",
    "Ntilde" => "\u{00D1}",
    "Ouml" => "\u{00D6}",
    "times" => "\u{00D7}",
    "Oslash" => "\u{00D8}",
    "Uuml" => "\u{00DC}",
    "szlig" => "\u{00DF}",
    "agrave" => "\u{00E0}",
    "aacute" => "\u{00E1}",
    "acirc" => "\u{00E2}",
    "auml" => "\u{00E4}",
    "aring" => "\u{00E5}",
    "aelig" => "\u{00E6}",
    "ccedil" => "\u{00E7}",
    "egrave" => "\u{00E8}",
    "eacute" => "\u{00E9}",
    "ecirc" => "\u{00EA}",
    "euml" => "\u{00EB}",
    "iuml" => "\u{00EF}",
    "ntilde" => "\u{00F1}",
    "oacute" => "\u{00F3}",
    "ouml" => "\u{00F6}",
    "divide" => "\u{00F7}",
    "oslash" => "\u{00F8}",
    "uuml" => "\u{00FC}",
    "yuml" => "\u{00FF}",
    "OElig" => "\u{0152}",
    "oelig" => "\u{0153}",
    "fnof" => "\u{0192}",
    "circ" => "\u{02C6}",
    "tilde" => "\u{02DC}",
    "Alpha" => "\u{0391}",
    "Beta" => "\u{0392}",
    "Gamma" => "\u{0393}",
    "Delta" => "\u{0394}",
    "Omega" => "\u{03A9}",
    "alpha" => "\u{03B1}",
    "beta" => "\u{03B2}",
    "gamma" => "\u{03B3}",
    "delta" => "\u{03B4}",
    "epsilon" => "\u{03B5}",
    "lambda" => "\u{03BB}",
    "mu" => "\u{03BC}",
    "pi" => "\u{03C0}",
    "sigma" => "\u{03C3}",
    "omega" => "\u{03C9}",
    "ensp" => "\u{2002}",
    "emsp" => "\u{2003}",
    "thinsp" => "\u{2009}",
    "zwnj" => "\u{200C}",
    "zwj" => "\u{200D}",
    "ndash" => "\u{2013}",
    "mdash" => "\u{2014}",
    "lsquo" => "\u{2018}",
    "rsquo" => "\u{2019}",
    "sbquo" => "\u{201A}",
    "ldquo" => "\u{201C}",
    "rdquo" => "\u{201D}",
    "bdquo" => "\u{201E}",
    "dagger" => "\u{2020}",
    "Dagger" => "\u{2021}",
    "bull" => "\u{2022}",
    "hellip" => "\u{2026}",
    "permil" => "\u{2030}",
    "prime" => "\u{2032}",
    "lsaquo" => "\u{2039}",
    "rsaquo" => "\u{203A}",
    "euro" => "\u{20AC}",
    "trade" => "\u{2122}",
    "larr" => "\u{2190}",
    "uarr" => "\u{2191}",
    "rarr" => "\u{2192}",
    "darr" => "\u{2193}",
    "harr" => "\u{2194}",
    "forall" => "\u{2200}",
    "part" => "\u{2202}",
    "exist" => "\u{2203}",
    "empty" => "\u{2205}",
    "isin" => "\u{2208}",
    "sum" => "\u{2211}",
    "minus" => "\u{2212}",
    "radic" => "\u{221A}",
    "infin" => "\u{221E}",
    "ne" => "\u{2260}",
    "le" => "\u{2264}",
    "ge" => "\u{2265}",
    "loz" => "\u{25CA}",
    "spades" => "\u{2660}",
    "clubs" => "\u{2663}",
    "hearts" => "\u{2665}",
    "diams" => "\u{2666}",
};

/// Decodes a character reference like `&#169;` or `&#xA9;`. Invalid code points decode to `None`.
pub fn decode_char_ref(reference: &str) -> Option<char> {
    let body = reference.strip_prefix("&#")?.strip_suffix(';')?;

    let code = match body.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => body.parse::<u32>().ok()?,
    };

    if code == 0 {
        return None;
    }
    char::from_u32(code)
}

/// Looks up a named entity the dialect knows without a DTD. HTML knows the XML entities as well.
pub fn predefined_entity(name: &str, dialect: Dialect) -> Option<&'static str> {
    if let Some(value) = XML_PREDEFINED_ENTITIES.get(name) {
        return Some(*value);
    }

    match dialect {
        Dialect::Xml => None,
        Dialect::Html => HTML_NAMED_ENTITIES.get(name).copied(),
    }
}

/// Decodes a single `&...;` reference. Unknown entities decode to `None`.
pub fn decode_reference(reference: &str, dialect: Dialect) -> Option<Cow<'static, str>> {
    if reference.starts_with("&#") {
        return decode_char_ref(reference).map(|c| Cow::Owned(c.to_string()));
    }

    let name = reference.strip_prefix('&')?.strip_suffix(';')?;
    predefined_entity(name, dialect).map(Cow::Borrowed)
}

/// Replaces all character references and known entities in the text. Unknown entities and stray
/// ampersands are kept as they are.
pub fn unescape(text: &str, dialect: Dialect) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let decoded = rest.find(';').and_then(|end| {
            decode_reference(&rest[..=end], dialect).map(|value| (value, end + 1))
        });

        match decoded {
            Some((value, len)) => {
                out.push_str(&value);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}
