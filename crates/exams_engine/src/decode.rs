use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use engine_logging::engine_debug;

/// Decode a fetched page into text: BOM -> Content-Type charset -> chardetng guess.
///
/// Malformed sequences are replaced rather than rejected; a page that decodes
/// badly simply yields fewer recognizable links.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(enc) = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
    })
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> String {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        engine_debug!("page had malformed {} sequences", enc.name());
    }
    text.into_owned()
}
