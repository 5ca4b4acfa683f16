use url::Url;

/// Size token appended to Google-hosted photo URLs so every photo comes back
/// at the same resolution regardless of the thumbnail it was read from.
pub const LARGE_PHOTO_SIZE: &str = "s1600";

const PHOTO_HOST_MARKERS: [&str; 2] = ["googleusercontent.com", "ggpht.com"];

/// Icon glyphs are rendered from a private-use font and leak into `innerText`.
fn is_icon_glyph(c: char) -> bool {
    matches!(c as u32, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD)
}

pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw
        .chars()
        .filter(|c| !is_icon_glyph(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    match cleaned.is_empty() {
        true => None,
        false => Some(cleaned),
    }
}

pub fn parse_rating(raw: &str) -> Option<f64> {
    let token = raw.split_whitespace().next()?;
    let rating: f64 = token.replace(',', ".").parse().ok()?;

    match rating.is_finite() && (0.0..=5.0).contains(&rating) {
        true => Some(rating),
        false => None,
    }
}

fn is_thousands_separator(c: char) -> bool {
    matches!(c, ',' | '.' | ' ' | '\u{a0}' | '\u{202f}')
}

/// First run of digits, reading through thousands separators:
/// `"(1,234)"` -> 1234, `"2 310 reviews"` -> 2310.
pub fn parse_review_count(raw: &str) -> Option<u32> {
    let chars: Vec<char> = raw.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;

    let mut digits = String::new();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !(is_thousands_separator(c)
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit()))
        {
            break;
        }
        i += 1;
    }

    digits.parse().ok()
}

fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')')
}

pub fn parse_phone(raw: &str) -> Option<String> {
    raw.split(|c: char| !is_phone_char(c))
        .map(str::trim)
        .find(|run| run.chars().any(|c| c.is_ascii_digit()))
        .map(|run| run.to_string())
}

pub fn parse_website(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) if raw.starts_with('/') => Url::parse("https://www.google.com")
            .and_then(|base| base.join(raw))
            .ok()?,
        Err(_) => return None,
    };

    let target = match (parsed.host_str(), parsed.path()) {
        (Some(host), "/url") if host.ends_with("google.com") => parsed
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .and_then(|(_, value)| Url::parse(&value).ok())?,
        _ => parsed,
    };

    match target.scheme() {
        "http" | "https" => match target.host_str() {
            Some("") | None => None,
            Some(_) => Some(target.to_string()),
        },
        _ => None,
    }
}

/// Rewrites the `=w80-h106-k-no` style size suffix of Google-hosted images to
/// [`LARGE_PHOTO_SIZE`]. Other hosts pass through unchanged.
pub fn normalize_photo_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let google_hosted = url
        .host_str()
        .is_some_and(|host| PHOTO_HOST_MARKERS.iter().any(|marker| host.ends_with(marker)));
    if !google_hosted {
        return Some(url.to_string());
    }

    let mut url = url;
    let path = url.path().to_string();
    let last_slash = path.rfind('/')?;
    let base = match path[last_slash..].find('=') {
        Some(eq) => &path[..last_slash + eq],
        None => path.as_str(),
    };
    url.set_path(&format!("{}={}", base, LARGE_PHOTO_SIZE));
    url.set_query(None);

    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_drops_icon_glyphs_and_collapses_whitespace() {
        assert_eq!(
            clean_text("\u{e0c8}\n  12 Rustaveli Ave,\n Batumi "),
            Some("12 Rustaveli Ave, Batumi".to_string())
        );
        assert_eq!(clean_text(" \u{e0b0} \n"), None);
    }

    #[test]
    fn rating_accepts_comma_decimal_separator() {
        assert_eq!(parse_rating("4,5"), Some(4.5));
        assert_eq!(parse_rating("4.7 stars"), Some(4.7));
        assert_eq!(parse_rating(" 5 "), Some(5.0));
    }

    #[test]
    fn rating_rejects_non_numbers_and_out_of_range() {
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating(""), None);
        assert_eq!(parse_rating("5.1"), None);
        assert_eq!(parse_rating("-1"), None);
        assert_eq!(parse_rating("NaN"), None);
    }

    #[test]
    fn review_count_reads_through_thousands_separators() {
        assert_eq!(parse_review_count("(1,234)"), Some(1234));
        assert_eq!(parse_review_count("2 310 reviews"), Some(2310));
        assert_eq!(parse_review_count("1.204 Rezensionen"), Some(1204));
        assert_eq!(parse_review_count("87 reviews"), Some(87));
        assert_eq!(parse_review_count("12\u{a0}345"), Some(12345));
    }

    #[test]
    fn review_count_stops_at_first_non_separator() {
        assert_eq!(parse_review_count("35, good place"), Some(35));
        assert_eq!(parse_review_count("no reviews"), None);
    }

    #[test]
    fn phone_takes_first_run_with_digits() {
        assert_eq!(
            parse_phone("phone:tel:+995422274444"),
            Some("+995422274444".to_string())
        );
        assert_eq!(
            parse_phone("Phone: +995 (422) 27-44-44 "),
            Some("+995 (422) 27-44-44".to_string())
        );
        assert_eq!(parse_phone("Call us"), None);
    }

    #[test]
    fn website_unwraps_google_redirects() {
        assert_eq!(
            parse_website("/url?q=https://example.ge/menu&sa=U"),
            Some("https://example.ge/menu".to_string())
        );
        assert_eq!(
            parse_website("https://www.google.com/url?q=http://cafe.example/"),
            Some("http://cafe.example/".to_string())
        );
    }

    #[test]
    fn website_rejects_non_http_targets() {
        assert_eq!(parse_website("mailto:info@example.ge"), None);
        assert_eq!(parse_website("javascript:void(0)"), None);
        assert_eq!(parse_website("Website"), None);
        assert_eq!(
            parse_website("https://example.ge"),
            Some("https://example.ge/".to_string())
        );
    }

    #[test]
    fn photo_size_suffix_is_normalized() {
        assert_eq!(
            normalize_photo_url("https://lh5.googleusercontent.com/p/AF1QipN=w80-h106-k-no"),
            Some("https://lh5.googleusercontent.com/p/AF1QipN=s1600".to_string())
        );
        assert_eq!(
            normalize_photo_url("https://lh3.googleusercontent.com/gps-cs-s/AC9h4n=s44"),
            Some("https://lh3.googleusercontent.com/gps-cs-s/AC9h4n=s1600".to_string())
        );
        assert_eq!(
            normalize_photo_url("https://lh5.googleusercontent.com/p/AF1QipN"),
            Some("https://lh5.googleusercontent.com/p/AF1QipN=s1600".to_string())
        );
    }

    #[test]
    fn photo_urls_from_other_hosts_pass_through() {
        assert_eq!(
            normalize_photo_url("https://cdn.example.ge/a.jpg"),
            Some("https://cdn.example.ge/a.jpg".to_string())
        );
        assert_eq!(normalize_photo_url("data:image/png;base64,AAAA"), None);
        assert_eq!(normalize_photo_url("//maps.gstatic.com/x.png"), None);
    }
}
