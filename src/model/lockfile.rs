use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer,
};

use crate::model::ParseError;

/// A `package-lock.json` document (lockfile version 2 or 3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Lockfile {
    pub packages: Packages,
}

impl Lockfile {
    pub fn from_slice(bytes: &[u8]) -> Result<Lockfile, ParseError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn package(&self, path: &str) -> Option<&PackageEntry> {
        self.packages.get(path)
    }
}

/// Package entries keyed by install path, in the order they are declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packages(Vec<(String, PackageEntry)>);

impl Packages {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageEntry)> {
        self.0.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn get(&self, path: &str) -> Option<&PackageEntry> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == path)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PackageEntry)> for Packages {
    fn from_iter<T: IntoIterator<Item = (String, PackageEntry)>>(iter: T) -> Self {
        Packages(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Packages {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PackagesVisitor;

        impl<'de> Visitor<'de> for PackagesVisitor {
            type Value = Packages;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of install paths to package entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut packages = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((path, entry)) = map.next_entry::<String, PackageEntry>()? {
                    packages.push((path, entry));
                }
                Ok(Packages(packages))
            }
        }

        deserializer.deserialize_map(PackagesVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageEntry {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub resolved: Option<String>,
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default)]
    pub dev: bool,
}

/// Decoded `integrity` field. Only sha512 is produced by npm for registry tarballs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integrity {
    Sha512(Vec<u8>),
}

impl Integrity {
    pub fn parse(integrity: &str) -> Result<Integrity, ParseError> {
        let unsupported = || ParseError::UnsupportedIntegrityAlgorithm(integrity.to_owned());
        let encoded = integrity.strip_prefix("sha512-").ok_or_else(unsupported)?;
        let digest = STANDARD.decode(encoded).map_err(|_| unsupported())?;
        Ok(Integrity::Sha512(digest))
    }

    pub fn to_hex(&self) -> String {
        match self {
            Integrity::Sha512(digest) => hex::encode(digest),
        }
    }
}
