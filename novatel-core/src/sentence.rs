//! Classify receiver lines and extract typed fields.
//!
//! Two NovAtel ASCII logs feed the pose fusion:
//!
//! ```text
//! #BESTPOSA,<header...>;SOL_COMPUTED,NARROW_INT,31.12345600,121.65432100,12.3,...*1a2b3c4d
//! #INSPVAXA,<header...>;INS_SOLUTION_GOOD,INS_RTKFIXED,31.1,121.6,12.3,0,0,0,0,0.1,0.2,45.5,...*1a2b3c4d
//! ```
//!
//! Header fields come before the `;`, the payload runs up to the `*` that
//! introduces the checksum. The checksum is not validated.
//!
//! A third family, NMEA `$xxGGA`, is decoded for stream diagnostics only.
//!
//! Every parser returns `None` on short, missing or non-numeric fields so a
//! noisy line never interrupts ingestion.

use serde::Serialize;

/// Prefix of the position log.
pub const POSITION_TAG: &str = "#BESTPOSA";

/// Prefix of the attitude log (matches both INSPVAA and INSPVAXA).
pub const ATTITUDE_TAG: &str = "#INSPVA";

const POSITION_MIN_FIELDS: usize = 4;
const ATTITUDE_MIN_FIELDS: usize = 12;
const FIX_MIN_FIELDS: usize = 10;

// Payload indices
const POS_SOLUTION_STATUS: usize = 0;
const POS_POSITION_TYPE: usize = 1;
const POS_LAT: usize = 2;
const POS_LON: usize = 3;
const POS_HEIGHT: usize = 4;
const ATT_INS_STATUS: usize = 0;
const ATT_AZIMUTH: usize = 11;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Decoded `#BESTPOSA` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub solution_status: String,
    pub position_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub height: Option<f64>,
}

/// Decoded `#INSPVA` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttitudeReport {
    pub ins_status: String,
    /// Azimuth in decimal degrees.
    pub heading: f64,
}

/// Decoded `$xxGGA` fix sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixSentence {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Union type for every recognized line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Sentence {
    Position(PositionReport),
    Attitude(AttitudeReport),
    Fix(FixSentence),
}

impl Sentence {
    /// Short log name for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Sentence::Position(_) => "BESTPOSA",
            Sentence::Attitude(_) => "INSPVA",
            Sentence::Fix(_) => "GGA",
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Split the payload of a `#TAG,header;payload*checksum` line into fields.
///
/// Returns `None` when there is no `;` separator.
pub fn split_payload(line: &str) -> Option<Vec<&str>> {
    let (_, rest) = line.split_once(';')?;
    let body = match rest.split_once('*') {
        Some((body, _checksum)) => body,
        None => rest,
    };
    Some(body.trim().split(',').collect())
}

/// Parse a finite decimal number, tolerating surrounding whitespace.
fn parse_number(field: &str) -> Option<f64> {
    let value: f64 = field.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Decode a `#BESTPOSA` line into latitude/longitude.
pub fn parse_position(line: &str) -> Option<PositionReport> {
    if !line.starts_with(POSITION_TAG) {
        return None;
    }
    let fields = split_payload(line)?;
    if fields.len() < POSITION_MIN_FIELDS {
        return None;
    }

    Some(PositionReport {
        solution_status: fields[POS_SOLUTION_STATUS].trim().to_string(),
        position_type: fields[POS_POSITION_TYPE].trim().to_string(),
        latitude: parse_number(fields[POS_LAT])?,
        longitude: parse_number(fields[POS_LON])?,
        height: fields.get(POS_HEIGHT).and_then(|f| parse_number(f)),
    })
}

/// Decode an `#INSPVA` line into its azimuth.
pub fn parse_attitude(line: &str) -> Option<AttitudeReport> {
    if !line.starts_with(ATTITUDE_TAG) {
        return None;
    }
    let fields = split_payload(line)?;
    if fields.len() < ATTITUDE_MIN_FIELDS {
        return None;
    }

    Some(AttitudeReport {
        ins_status: fields[ATT_INS_STATUS].trim().to_string(),
        heading: parse_number(fields[ATT_AZIMUTH])?,
    })
}

/// Decode an NMEA `$xxGGA` sentence.
///
/// Latitude is `ddmm.mmmm`, longitude `dddmm.mmmm`; both are converted to
/// decimal degrees and negated for the `S`/`W` hemispheres.
///
/// The bare `degrees + minutes / 60` value carries no sign. Callers that
/// expect that unsigned form must take `abs()` of southern or western fixes.
pub fn parse_fix(line: &str) -> Option<FixSentence> {
    if !is_gga(line) {
        return None;
    }
    let line = match line.split_once('*') {
        Some((body, _checksum)) => body,
        None => line,
    };
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < FIX_MIN_FIELDS {
        return None;
    }

    let mut latitude = degrees_minutes(parts[2], 2)?;
    let mut longitude = degrees_minutes(parts[4], 3)?;
    if parts[3].trim() == "S" {
        latitude = -latitude;
    }
    if parts[5].trim() == "W" {
        longitude = -longitude;
    }

    Some(FixSentence {
        latitude,
        longitude,
        altitude: parse_number(parts[9])?,
    })
}

/// Classify a line by its leading token and decode it.
pub fn classify(line: &str) -> Option<Sentence> {
    if line.starts_with(POSITION_TAG) {
        parse_position(line).map(Sentence::Position)
    } else if line.starts_with(ATTITUDE_TAG) {
        parse_attitude(line).map(Sentence::Attitude)
    } else if is_gga(line) {
        parse_fix(line).map(Sentence::Fix)
    } else {
        None
    }
}

/// `$` + two-letter talker + `GGA` + `,`.
fn is_gga(line: &str) -> bool {
    let b = line.as_bytes();
    b.len() >= 7
        && b[0] == b'$'
        && b[1].is_ascii_uppercase()
        && b[2].is_ascii_uppercase()
        && &b[3..6] == b"GGA"
        && b[6] == b','
}

/// Convert `dddmm.mmmm` with `deg_digits` leading degree digits.
fn degrees_minutes(field: &str, deg_digits: usize) -> Option<f64> {
    let field = field.trim();
    let degrees: f64 = parse_number(field.get(..deg_digits)?)?;
    let minutes: f64 = parse_number(field.get(deg_digits..)?)?;
    Some(degrees + minutes / 60.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BESTPOSA: &str = "#BESTPOSA,COM1,0,83.5,FINESTEERING,2167,244820.000,02000000,b1f6,16248;\
        SOL_COMPUTED,NARROW_INT,31.12345600,121.65432100,12.3456,-9.1000,WGS84,0.0123,0.0117,0.0289,\"0\",1.000,0.000,32,28,28,26,00,21,3f,33*6a3f2c8e";

    const INSPVAXA: &str = "#INSPVAXA,COM1,0,73.5,FINESTEERING,2167,244820.000,02000020,18bc,16248;\
        INS_SOLUTION_GOOD,INS_RTKFIXED,31.12345611,121.65432099,12.3456,-9.1000,0.0012,-0.0034,0.0005,0.512,-0.231,45.5,0.01,0.01,0.02,0.001,0.001,0.001,0.05,0.05,0.1,00000000,0*29a3b0f1";

    const GPGGA: &str = "$GPGGA,024520.00,3107.40736,N,12139.25926,E,4,28,0.6,12.35,M,-9.10,M,1.0,0000*6B";

    #[test]
    fn test_split_payload() {
        let fields = split_payload("#X,h1,h2;a, b ,c*ff").unwrap();
        assert_eq!(fields, vec!["a", " b ", "c"]);
        assert!(split_payload("#X,h1,h2,a,b").is_none());
    }

    #[test]
    fn test_split_payload_without_checksum() {
        assert_eq!(split_payload("#X;a,b\r").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_position() {
        let pos = parse_position(BESTPOSA).unwrap();
        assert_eq!(pos.latitude, 31.123456);
        assert_eq!(pos.longitude, 121.654321);
        assert_eq!(pos.height, Some(12.3456));
        assert_eq!(pos.solution_status, "SOL_COMPUTED");
        assert_eq!(pos.position_type, "NARROW_INT");
    }

    #[test]
    fn test_parse_position_minimal_payload() {
        let pos = parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE,10.5,-20.25*00").unwrap();
        assert_eq!(pos.latitude, 10.5);
        assert_eq!(pos.longitude, -20.25);
        assert!(pos.height.is_none());
    }

    #[test]
    fn test_parse_position_short_payload() {
        assert!(parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE*00").is_none());
        assert!(parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE,10.5*00").is_none());
    }

    #[test]
    fn test_parse_position_non_numeric() {
        assert!(parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE,abc,20.0*00").is_none());
        assert!(parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE,10.0,*00").is_none());
        assert!(parse_position("#BESTPOSA,H;SOL_COMPUTED,SINGLE,NaN,20.0*00").is_none());
    }

    #[test]
    fn test_parse_position_no_separator() {
        assert!(parse_position("#BESTPOSA,COM1,0,31.1,121.6").is_none());
    }

    #[test]
    fn test_parse_attitude() {
        let att = parse_attitude(INSPVAXA).unwrap();
        assert_eq!(att.heading, 45.5);
        assert_eq!(att.ins_status, "INS_SOLUTION_GOOD");
    }

    #[test]
    fn test_parse_attitude_short_payload() {
        assert!(parse_attitude("#INSPVAA,H;1,2,3,4,5,6,7,8,9,10,11*00").is_none());
        assert_eq!(
            parse_attitude("#INSPVAA,H;0,1,2,3,4,5,6,7,8,9,10,270.25*00")
                .unwrap()
                .heading,
            270.25
        );
    }

    #[test]
    fn test_parse_attitude_non_numeric() {
        assert!(parse_attitude("#INSPVAA,H;0,1,2,3,4,5,6,7,8,9,10,north*00").is_none());
    }

    #[test]
    fn test_parse_fix() {
        let fix = parse_fix(GPGGA).unwrap();
        assert!((fix.latitude - (31.0 + 7.40736 / 60.0)).abs() < 1e-9);
        assert!((fix.longitude - (121.0 + 39.25926 / 60.0)).abs() < 1e-9);
        assert_eq!(fix.altitude, 12.35);
    }

    #[test]
    fn test_parse_fix_hemispheres() {
        let fix = parse_fix("$GNGGA,000000.00,3351.00000,S,15112.00000,W,1,8,1.0,5.0,M,,M,,").unwrap();
        assert!((fix.latitude + 33.85).abs() < 1e-9);
        assert!((fix.longitude + 151.2).abs() < 1e-9);
    }

    #[test]
    fn test_parse_fix_rejects_empty_and_short() {
        // No fix yet: empty position fields.
        assert!(parse_fix("$GPGGA,024520.00,,,,,0,00,99.9,,M,,M,,*6B").is_none());
        assert!(parse_fix("$GPGGA,024520.00,3107.4,N").is_none());
        assert!(parse_fix("$GPRMC,024520.00,A,3107.4,N,12139.2,E,0,0,010120,,").is_none());
    }

    #[test]
    fn test_classify() {
        assert!(matches!(classify(BESTPOSA), Some(Sentence::Position(_))));
        assert!(matches!(classify(INSPVAXA), Some(Sentence::Attitude(_))));
        assert!(matches!(classify(GPGGA), Some(Sentence::Fix(_))));
        assert!(classify("#RANGEA,COM1;1,2,3*00").is_none());
        assert!(classify("garbage").is_none());
        assert!(classify("").is_none());
    }

    #[test]
    fn test_sentence_kind() {
        assert_eq!(classify(BESTPOSA).unwrap().kind(), "BESTPOSA");
        assert_eq!(classify(GPGGA).unwrap().kind(), "GGA");
    }
}
