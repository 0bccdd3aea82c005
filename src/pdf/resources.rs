use lopdf::{Dictionary, Object, ObjectId};

/// Resource name the caption font is registered under on every page.
pub const CAPTION_FONT: &str = "F1";

/// Build a page's resources dictionary from its caption font and the image
/// XObjects its content stream paints.
pub fn page_resources(font_id: ObjectId, xobjects: &Dictionary) -> Dictionary {
    let mut font_resources = Dictionary::new();
    font_resources.set(CAPTION_FONT, Object::Reference(font_id));

    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(font_resources));
    resources.set(
        "ProcSet",
        vec![
            Object::Name(b"PDF".to_vec()),
            Object::Name(b"Text".to_vec()),
            Object::Name(b"ImageB".to_vec()),
        ],
    );
    if !xobjects.is_empty() {
        resources.set("XObject", Object::Dictionary(xobjects.clone()));
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_empty_xobject_dictionary() {
        let resources = page_resources((7, 0), &Dictionary::new());
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert_eq!(fonts.get(b"F1").unwrap().as_reference().unwrap(), (7, 0));
        assert!(resources.get(b"XObject").is_err());
    }

    #[test]
    fn carries_page_images() {
        let mut xobjects = Dictionary::new();
        xobjects.set("Im12", Object::Reference((12, 0)));
        let resources = page_resources((7, 0), &xobjects);
        let images = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(images.get(b"Im12").unwrap().as_reference().unwrap(), (12, 0));
    }
}
