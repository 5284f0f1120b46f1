use crate::model::source::{Checksum, FileSource, Source};

const HEX_URL: &str = "https://packagerdata.turbowarp.org/scratch-microbit-1.2.0.hex.zip";
const HEX_SHA256: &str = "dfd574b709307fe76c44dbb6b0ac8942e7908f4d5c18359fae25fbda3c9f4399";

/// Firmware flashed by the micro:bit extension. Its version does not follow
/// the application, so it is pinned here.
pub fn microbit_sources() -> Vec<Source> {
    vec![FileSource::new(
        HEX_URL,
        Checksum::Sha256(HEX_SHA256.to_owned()),
        "microbit",
        "hex.zip",
    )
    .into()]
}
