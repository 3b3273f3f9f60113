use bytes::Bytes;

/// A single image picked for the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Unsent compose state. Lives only in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

impl Draft {
    /// Nothing to send: no text and no image.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_none()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_alone_is_sendable() {
        let mut draft = Draft::default();
        assert!(draft.is_empty());

        draft.image = Some(ImageAttachment {
            file_name: "a.png".into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"png"),
        });
        assert!(!draft.is_empty());

        draft.clear();
        assert!(draft.is_empty());
    }
}
