//! Archive filename codec.
//!
//! Archives are named `<hostname>-<job>-<YYYY-MM-DD>-<tier>.tar.<ext>`.
//! The name is the only place an archive's date and tier are recorded, so
//! `decode` must invert `encode` exactly and reject everything else.

use super::tier::RotationTier;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;
const CONTAINER: &str = ".tar.";

/// Reasons a host or job name cannot be part of an archive identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} '{value}' contains '{found}', which is not allowed in archive names")]
    ForbiddenChar {
        field: &'static str,
        value: String,
        found: char,
    },
}

/// Reasons a filename is not an archive of a given identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("filename does not belong to {0}")]
    ForeignIdentity(String),

    #[error("invalid date field '{0}'")]
    InvalidDate(String),

    #[error("unknown tier '{0}'")]
    UnknownTier(String),

    #[error("unknown extension '{0}'")]
    UnknownExtension(String),

    #[error("filename does not match the archive grammar")]
    Malformed,
}

/// Compression applied to the tar container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionKind {
    /// Larger archives, faster runs.
    #[default]
    #[serde(rename = "gz", alias = "gzip")]
    Gzip,
    /// Smaller archives, slower runs.
    #[serde(rename = "bz2", alias = "bzip2")]
    Bzip2,
}

impl CompressionKind {
    pub const ALL: [CompressionKind; 2] = [CompressionKind::Gzip, CompressionKind::Bzip2];

    /// Extension following `.tar.` in the filename.
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionKind::Gzip => "gz",
            CompressionKind::Bzip2 => "bz2",
        }
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for CompressionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gz" => Ok(CompressionKind::Gzip),
            "bz2" => Ok(CompressionKind::Bzip2),
            _ => Err(()),
        }
    }
}

/// Host and job pair that owns a set of archives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupIdentity {
    hostname: String,
    job_name: String,
}

impl BackupIdentity {
    /// Build an identity, rejecting values that would make filenames ambiguous.
    ///
    /// Host names may contain `-` (most do); job names may not. With the
    /// job name free of separators and the date field fixed-width, a
    /// filename can only ever decode for the identity that encoded it.
    pub fn new(
        hostname: impl Into<String>,
        job_name: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let hostname = hostname.into();
        let job_name = job_name.into();
        validate_component("hostname", &hostname, false)?;
        validate_component("job name", &job_name, true)?;
        Ok(Self { hostname, job_name })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Strip `<hostname>-<job>-` from `name`, if present.
    fn strip_from<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.hostname.as_str())?
            .strip_prefix('-')?
            .strip_prefix(self.job_name.as_str())?
            .strip_prefix('-')
    }
}

impl fmt::Display for BackupIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.hostname, self.job_name)
    }
}

fn validate_component(
    field: &'static str,
    value: &str,
    forbid_dash: bool,
) -> Result<(), IdentityError> {
    if value.is_empty() {
        return Err(IdentityError::Empty { field });
    }
    if let Some(found) = value
        .chars()
        .find(|c| (forbid_dash && *c == '-') || *c == '/' || *c == '\\' || c.is_whitespace())
    {
        return Err(IdentityError::ForbiddenChar {
            field,
            value: value.to_string(),
            found,
        });
    }
    Ok(())
}

/// Everything an archive filename encodes.
///
/// Dates must fall in years 0 through 9999; the filename carries a fixed
/// four-digit year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveDescriptor {
    pub identity: BackupIdentity,
    pub date: NaiveDate,
    pub tier: RotationTier,
    pub compression: CompressionKind,
}

impl ArchiveDescriptor {
    /// Encode this descriptor as its on-disk filename.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.tar.{}",
            self.identity,
            self.date.format(DATE_FORMAT),
            self.tier,
            self.compression.extension()
        )
    }

    /// Decode a filename belonging to `identity`.
    pub fn decode(file_name: &str, identity: &BackupIdentity) -> Result<Self, NameError> {
        let rest = identity
            .strip_from(file_name)
            .ok_or_else(|| NameError::ForeignIdentity(identity.to_string()))?;

        let (date_field, rest) = match (rest.get(..DATE_LEN), rest.get(DATE_LEN..)) {
            (Some(d), Some(r)) => (d, r),
            _ => return Err(NameError::Malformed),
        };
        let date = parse_date(date_field)?;

        let rest = rest.strip_prefix('-').ok_or(NameError::Malformed)?;
        let (tier_field, ext_field) = rest.split_once(CONTAINER).ok_or(NameError::Malformed)?;

        let tier = tier_field
            .parse::<RotationTier>()
            .map_err(|_| NameError::UnknownTier(tier_field.to_string()))?;
        let compression = ext_field
            .parse::<CompressionKind>()
            .map_err(|_| NameError::UnknownExtension(ext_field.to_string()))?;

        Ok(Self {
            identity: identity.clone(),
            date,
            tier,
            compression,
        })
    }
}

impl fmt::Display for ArchiveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Parse a zero-padded `YYYY-MM-DD` field. chrono alone accepts unpadded
/// months and days, so the shape is checked first.
fn parse_date(field: &str) -> Result<NaiveDate, NameError> {
    let well_formed = field.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !well_formed {
        return Err(NameError::InvalidDate(field.to_string()));
    }
    NaiveDate::parse_from_str(field, DATE_FORMAT)
        .map_err(|_| NameError::InvalidDate(field.to_string()))
}
