use std::{collections::HashMap, sync::OnceLock};

use regex_lite::Regex;

use crate::model::ParseError;

/// A `SHASUMS256.txt` style document: one `<sha256> [*]<file name>` per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    sums: HashMap<String, String>,
}

impl ChecksumManifest {
    pub fn parse(text: &str) -> ChecksumManifest {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE
            .get_or_init(|| Regex::new(r"(?m)^(?P<sum>[a-f0-9]{64}) \*?(?P<file>.+?)\r?$").unwrap());
        let sums = re
            .captures_iter(text)
            .map(|captures| (captures["file"].to_owned(), captures["sum"].to_owned()))
            .collect();
        ChecksumManifest { sums }
    }

    pub fn sha256(&self, file_name: &str) -> Result<&str, ParseError> {
        self.sums
            .get(file_name)
            .map(String::as_str)
            .ok_or_else(|| ParseError::malformed("checksum manifest, no entry for", file_name))
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_shasums() {
        let x64 = "a".repeat(64);
        let arm64 = "b".repeat(64);
        let text = format!(
            "{x64} *electron-v1.0.0-linux-x64.zip\n{arm64} electron-v1.0.0-linux-arm64.zip\r\nnot a checksum line\n"
        );
        let manifest = ChecksumManifest::parse(&text);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.sha256("electron-v1.0.0-linux-x64.zip").unwrap(), x64);
        assert_eq!(manifest.sha256("electron-v1.0.0-linux-arm64.zip").unwrap(), arm64);
    }

    #[test]
    fn missing_entry_is_an_error() {
        let manifest = ChecksumManifest::parse("");
        assert!(manifest.is_empty());
        assert!(matches!(
            manifest.sha256("electron.zip"),
            Err(ParseError::MalformedInput { .. })
        ));
    }
}
