//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.quire".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn default_layout() -> String {
        "page".into()
    }

    pub mod slug {
        use super::super::super::SlugMode;

        pub fn path() -> SlugMode {
            SlugMode::default()
        }
    }

    pub mod tags {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "tags".into()
        }
    }

    pub mod rss {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "feed.xml".into()
        }

        pub fn limit() -> usize {
            20
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }
}
