//! Page classification: image-bearing vs text-bearing
//!
//! Image presence is used as a proxy for "this page will likely fail
//! text-layer extraction" (scans, screenshots, photos of text). A page with a
//! decorative image next to extractable text still classifies as
//! image-bearing; the OCR pass is then redundant but not harmful.

use lopdf::{Document, Object, ObjectId};

/// Returns true when the page carries at least one embedded raster image,
/// either as an XObject resource or inline in a content stream.
pub fn page_has_images(doc: &Document, page_id: ObjectId) -> bool {
    if has_image_xobjects(doc, page_id) {
        return true;
    }

    for content_id in doc.get_page_contents(page_id) {
        if let Ok(Object::Stream(stream)) = doc.get_object(content_id) {
            let content = match stream.decompressed_content() {
                Ok(data) => data,
                Err(_) => stream.content.clone(),
            };
            if content_has_inline_images(&content) {
                return true;
            }
        }
    }

    false
}

/// Walk the page's XObject resources looking for `/Subtype /Image` streams.
fn has_image_xobjects(doc: &Document, page_id: ObjectId) -> bool {
    let page_dict = match doc.get_dictionary(page_id) {
        Ok(dict) => dict,
        Err(_) => return false,
    };

    let resources = match page_dict.get(b"Resources") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    let resources = match resources {
        Some(r) => r,
        None => return false,
    };

    let xobject_dict = match resources.get(b"XObject") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    let xobject_dict = match xobject_dict {
        Some(d) => d,
        None => return false,
    };

    for (_, value) in xobject_dict.iter() {
        if let Ok(xobj_ref) = value.as_reference() {
            if let Ok(xobj) = doc.get_object(xobj_ref) {
                if let Ok(stream) = xobj.as_stream() {
                    if let Ok(subtype) = stream.dict.get(b"Subtype") {
                        if let Ok(name) = subtype.as_name() {
                            if name == b"Image" {
                                return true;
                            }
                        }
                    }
                }
            }
        }
    }

    false
}

/// Fast byte scan for the `BI` inline-image operator.
///
/// `BI` must stand alone as an operator token, so require a boundary on both
/// sides to avoid matching identifiers inside string or name tokens.
fn content_has_inline_images(content: &[u8]) -> bool {
    let mut i = 0;
    while i + 1 < content.len() {
        if content[i] == b'B' && content[i + 1] == b'I' {
            let before_ok = i == 0 || content[i - 1].is_ascii_whitespace();
            let after_ok = i + 2 >= content.len() || content[i + 2].is_ascii_whitespace();
            if before_ok && after_ok {
                return true;
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_inline_image_scan() {
        assert!(content_has_inline_images(
            b"q BI /W 4 /H 4 ID \x00\x01 EI Q"
        ));
        // "BI" inside a longer token is not an operator
        assert!(!content_has_inline_images(b"/BIts 4 gs"));
        assert!(!content_has_inline_images(
            b"BT /F1 12 Tf (BIg) Tj ET"
        ));
    }

    #[test]
    fn test_xobject_image_detection() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0u8; 4],
        ));
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"q 100 0 0 100 50 700 cm /Im0 Do Q".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        assert!(page_has_images(&doc, page_id));

        let plain_content = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 12 Tf (Hello) Tj ET".to_vec(),
        ));
        let plain_page = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => plain_content,
            "Resources" => dictionary! {},
        });
        assert!(!page_has_images(&doc, plain_page));
    }
}
