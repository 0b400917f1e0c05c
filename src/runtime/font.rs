//! Font-family derivation and font-face synthesis.

/// Suffix appended to every derived family name, keeping embedded fonts
/// from shadowing system families of the same name.
pub const FAMILY_SUFFIX: &str = "_LABEL";

/// Derive the browser-visible font-family name from an asset path:
/// strip directory and extension, append the suffix, double-quote when
/// the result contains whitespace.
pub fn family_name(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    let name = format!("{stem}{FAMILY_SUFFIX}");
    if name.contains(char::is_whitespace) {
        format!("\"{name}\"")
    } else {
        name
    }
}

/// CSS format hint for a font file extension (with leading dot).
pub fn font_format(ext: &str) -> &'static str {
    match ext {
        ".otf" => "opentype",
        ".woff" => "woff",
        ".woff2" => "woff2",
        ".eot" => "embedded-opentype",
        _ => "truetype",
    }
}

/// The `src` descriptor of a synthesized font face.
pub fn font_face_source(payload: &str, mime: &str, format: &str) -> String {
    if payload.starts_with("data:") {
        format!("url({payload}) format(\"{format}\")")
    } else {
        format!("url(data:{mime};base64,{payload}) format(\"{format}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_name_with_space_is_quoted() {
        // "assets/fonts/My Font.ttf" -> "My Font_LABEL", quoted.
        assert_eq!(family_name("assets/fonts/My Font.ttf"), "\"My Font_LABEL\"");
    }

    #[test]
    fn test_family_name_without_space_is_bare() {
        assert_eq!(family_name("assets/fonts/arial.ttf"), "arial_LABEL");
    }

    #[test]
    fn test_family_name_without_extension_or_directory() {
        assert_eq!(family_name("mono"), format!("mono{FAMILY_SUFFIX}"));
    }

    #[test]
    fn test_font_face_source() {
        assert_eq!(
            font_face_source("AAAA", "font/ttf", "truetype"),
            "url(data:font/ttf;base64,AAAA) format(\"truetype\")"
        );
        assert_eq!(
            font_face_source("data:font/woff;base64,BBBB", "font/woff", "woff"),
            "url(data:font/woff;base64,BBBB) format(\"woff\")"
        );
    }

    #[test]
    fn test_font_format() {
        assert_eq!(font_format(".woff2"), "woff2");
        assert_eq!(font_format(".ttf"), "truetype");
        assert_eq!(font_format(".unknown"), "truetype");
    }
}
