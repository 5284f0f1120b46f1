use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Deserialize;

use crate::model::ParseError;

/// A costume, backdrop or sound of the built-in media library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryAsset {
    pub md5ext: String,
}

/// A sprite of the built-in media library. Sprites reference assets rather
/// than being assets themselves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibrarySprite {
    #[serde(default)]
    pub costumes: Vec<LibraryAsset>,
    #[serde(default)]
    pub sounds: Vec<LibraryAsset>,
}

impl LibrarySprite {
    pub fn assets(&self) -> impl Iterator<Item = &LibraryAsset> {
        self.costumes.iter().chain(self.sounds.iter())
    }
}

/// Content-addressed asset file name: `<md5>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Md5Ext {
    pub md5: String,
    pub extension: String,
}

impl Md5Ext {
    pub fn parse(md5ext: &str) -> Result<Md5Ext, ParseError> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^(?P<md5>[0-9a-f]{32})\.(?P<ext>\w+)$").unwrap());
        let captures = re
            .captures(md5ext)
            .ok_or_else(|| ParseError::malformed("library asset name", md5ext))?;
        Ok(Md5Ext {
            md5: captures["md5"].to_owned(),
            extension: captures["ext"].to_owned(),
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.md5, self.extension)
    }
}
