//! Name parsers for Sentinel-1 products and orbit files
//!
//! Sentinel-1 product names follow a fixed-width underscore-delimited grammar:
//!
//! ```text
//! MMM_BB_TTTR_LFPP_YYYYMMDDTHHMMSS_YYYYMMDDTHHMMSS_OOOOOO_DDDDDD_CCCC
//! S1A_IW_SLC__1SDV_20180408T043025_20180408T043053_021371_024C9B_1B70
//! ```
//!
//! Orbit ephemerides files carry their own validity window and creation time:
//!
//! ```text
//! S1A_OPER_AUX_POEORB_OPOD_20140828T122040_V20140806T225944_20140808T005944.EOF
//! ```
//!
//! Both parsers are pure and accept archive (`.zip`) and directory (`.SAFE`)
//! style suffixes.

use chrono::NaiveDateTime;

use crate::app::models::{Mission, OrbitType, ValidityWindow};
use crate::errors::{ParseError, ParseResult};

/// Timestamp format used inside Sentinel file names
const TIME_FMT: &str = "%Y%m%dT%H%M%S";

/// Length of the fixed-width product name stem
const PRODUCT_STEM_LEN: usize = 67;

/// Underscore positions in the product name stem
const PRODUCT_SEPARATORS: [usize; 8] = [3, 6, 11, 16, 32, 48, 55, 62];

/// Parsed Sentinel-1 product identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Satellite platform
    pub mission: Mission,
    /// Mode/beam identifier (IW, EW, WV, S1-S6)
    pub beam: String,
    /// Product type with resolution class (e.g. "SLC_", "GRDH")
    pub product_type: String,
    /// Acquisition start/stop
    pub window: ValidityWindow,
    /// Absolute orbit number
    pub absolute_orbit: u32,
    /// Name the product was parsed from
    pub name: String,
}

impl Product {
    /// Parse a product name, path, or archive file name
    pub fn parse(name: &str) -> ParseResult<Self> {
        let stem = product_stem(name)?;

        let invalid = || ParseError::InvalidProductName {
            name: name.to_string(),
        };

        if !PRODUCT_SEPARATORS
            .iter()
            .all(|&i| stem.as_bytes()[i] == b'_')
        {
            return Err(invalid());
        }

        let mission = Mission::parse(&stem[0..3]).map_err(|_| invalid())?;
        let beam = stem[4..6].to_string();
        let product_type = stem[7..11].to_string();
        let start = parse_timestamp(name, &stem[17..32])?;
        let stop = parse_timestamp(name, &stem[33..48])?;
        let absolute_orbit: u32 = stem[49..55].parse().map_err(|_| invalid())?;

        Ok(Self {
            mission,
            beam,
            product_type,
            window: ValidityWindow::new(start, stop)?,
            absolute_orbit,
            name: name.to_string(),
        })
    }

    /// Acquisition start time
    pub fn start_time(&self) -> NaiveDateTime {
        self.window.start
    }

    /// Acquisition stop time
    pub fn stop_time(&self) -> NaiveDateTime {
        self.window.stop
    }
}

/// Parsed orbit ephemerides file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitFile {
    /// Satellite platform the orbit applies to
    pub mission: Mission,
    /// Precise or restituted tier
    pub orbit_type: OrbitType,
    /// Publication timestamp, used as the tie-break between same-window files
    pub created: NaiveDateTime,
    /// Validity window of the contained state vectors
    pub window: ValidityWindow,
    /// File name as published
    pub file_name: String,
}

impl OrbitFile {
    /// Parse an orbit file name or URL path segment
    pub fn parse(name: &str) -> ParseResult<Self> {
        let base = basename(name);
        let stem = base.strip_suffix(".EOF").unwrap_or(base);

        let invalid = || ParseError::InvalidOrbitName {
            name: name.to_string(),
        };

        let tokens: Vec<&str> = stem.split('_').collect();
        // MMM OPER AUX TYPE SITE CREATED VSTART STOP
        if tokens.len() != 8 || tokens[1] != "OPER" || tokens[2] != "AUX" {
            return Err(invalid());
        }

        let mission = Mission::parse(tokens[0]).map_err(|_| invalid())?;
        let orbit_type = match tokens[3] {
            "POEORB" => OrbitType::Precise,
            "RESORB" => OrbitType::Restituted,
            _ => return Err(invalid()),
        };
        let created = parse_timestamp(name, tokens[5])?;
        let start = parse_timestamp(name, tokens[6].strip_prefix('V').ok_or_else(invalid)?)?;
        let stop = parse_timestamp(name, tokens[7])?;

        Ok(Self {
            mission,
            orbit_type,
            created,
            window: ValidityWindow::new(start, stop)?,
            file_name: base.to_string(),
        })
    }
}

/// Last path component, tolerating trailing slashes on `.SAFE` directories
fn basename(name: &str) -> &str {
    name.trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
}

/// Extract the fixed-width stem from a product path or archive name
///
/// The ASCII check must come first: the fixed indices below are byte
/// offsets, and slicing inside a multibyte character would panic.
fn product_stem(name: &str) -> ParseResult<&str> {
    let base = basename(name);
    if !base.is_ascii() || base.len() < PRODUCT_STEM_LEN {
        return Err(ParseError::InvalidProductName {
            name: name.to_string(),
        });
    }
    // Anything after the stem must be an extension (.zip, .SAFE)
    if base.len() > PRODUCT_STEM_LEN && !base[PRODUCT_STEM_LEN..].starts_with('.') {
        return Err(ParseError::InvalidProductName {
            name: name.to_string(),
        });
    }
    Ok(&base[..PRODUCT_STEM_LEN])
}

fn parse_timestamp(name: &str, value: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FMT).map_err(|_| ParseError::InvalidTimestamp {
        name: name.to_string(),
        value: value.to_string(),
    })
}
