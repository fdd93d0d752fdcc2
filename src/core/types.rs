//! Core types used throughout the scangate library.
//!
//! This module defines the closed vocabulary of the subsystem: what kind of
//! file is being scanned, what a scan concluded, and what state a file is in
//! from the access gate's point of view.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of evidence attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Photo or screenshot.
    Image,
    /// Video recording.
    Video,
    /// PDF, office document, or any other attachment.
    Document,
}

impl FileKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }

    /// Parses a kind from its wire name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The conclusion of one scan attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The service accepted the file but has not concluded yet.
    Pending,
    /// No threats detected.
    Clean,
    /// Potentially harmful but not definitively malicious.
    Suspicious,
    /// One or more threats found.
    Infected,
    /// The scan could not be completed. Not evidence either way.
    ScanFailed,
}

impl Verdict {
    /// Parses a verdict string received from the scanning service.
    ///
    /// Only the service vocabulary is recognised; anything else (including
    /// `scan_failed` itself) yields `None` and must be handled as a failure.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "clean" => Some(Self::Clean),
            "suspicious" => Some(Self::Suspicious),
            "infected" => Some(Self::Infected),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    /// Returns the canonical name of this verdict.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Clean => "clean",
            Self::Suspicious => "suspicious",
            Self::Infected => "infected",
            Self::ScanFailed => "scan_failed",
        }
    }

    /// Returns `true` for verdicts that constitute evidence of a threat.
    pub fn is_threat(&self) -> bool {
        matches!(self, Self::Infected | Self::Suspicious)
    }

    /// Returns `true` if the file was confirmed safe.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badge tone a UI should use when rendering a file state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    /// Verified safe.
    Safe,
    /// Not verified yet; offer a scan or rescan action.
    Neutral,
    /// Suspicious content; hard block.
    Warning,
    /// Confirmed threat; hard block.
    Danger,
}

/// State of a file as seen by the access gate and status displays.
///
/// This is a [`Verdict`] extended with `Unscanned`, the implicit state of a
/// file for which no verdict has ever been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// No verdict has been recorded.
    Unscanned,
    /// A scan is in flight or the service has not concluded.
    Pending,
    /// Confirmed safe.
    Clean,
    /// Potentially harmful.
    Suspicious,
    /// Confirmed threat.
    Infected,
    /// The latest scan attempt failed.
    ScanFailed,
}

impl FileState {
    /// Severity rank used for worst-of aggregation (higher is worse).
    ///
    /// `Unscanned` and `ScanFailed` share a rank: neither is confirmed safe.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Unscanned | Self::ScanFailed => 1,
            Self::Pending => 2,
            Self::Suspicious => 3,
            Self::Infected => 4,
        }
    }

    /// Returns the more severe of two states.
    ///
    /// On an `Unscanned`/`ScanFailed` tie, `ScanFailed` is returned so the
    /// result does not depend on argument order.
    pub fn worse(self, other: Self) -> Self {
        match self.severity().cmp(&other.severity()) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal if other == Self::ScanFailed => other,
            std::cmp::Ordering::Equal => self,
        }
    }

    /// Returns the canonical name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unscanned => "unscanned",
            Self::Pending => "pending",
            Self::Clean => "clean",
            Self::Suspicious => "suspicious",
            Self::Infected => "infected",
            Self::ScanFailed => "scan_failed",
        }
    }

    /// Human-readable label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unscanned => "Not verified",
            Self::Pending => "Scanning",
            Self::Clean => "Verified safe",
            Self::Suspicious => "Suspicious content",
            Self::Infected => "Threat detected",
            Self::ScanFailed => "Scan failed",
        }
    }

    /// Badge tone for status displays.
    pub fn badge(&self) -> BadgeTone {
        match self {
            Self::Clean => BadgeTone::Safe,
            Self::Unscanned | Self::Pending | Self::ScanFailed => BadgeTone::Neutral,
            Self::Suspicious => BadgeTone::Warning,
            Self::Infected => BadgeTone::Danger,
        }
    }

    /// Returns `true` if the neutral "not verified" display with a manual
    /// scan action applies.
    pub fn offers_rescan(&self) -> bool {
        matches!(self, Self::Unscanned | Self::Pending | Self::ScanFailed)
    }
}

impl From<Verdict> for FileState {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pending => Self::Pending,
            Verdict::Clean => Self::Clean,
            Verdict::Suspicious => Self::Suspicious,
            Verdict::Infected => Self::Infected,
            Verdict::ScanFailed => Self::ScanFailed,
        }
    }
}

impl From<Option<Verdict>> for FileState {
    fn from(verdict: Option<Verdict>) -> Self {
        verdict.map(Self::from).unwrap_or(Self::Unscanned)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scannable artifact attached to a report.
///
/// File references are owned by the report subsystem; this library only
/// reads them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileReference {
    /// Opaque locator, unique per artifact.
    pub file_url: String,
    /// Owning report.
    pub report_id: String,
    /// What kind of evidence this is.
    pub file_kind: FileKind,
}

impl FileReference {
    /// Creates a new file reference.
    pub fn new(
        file_url: impl Into<String>,
        report_id: impl Into<String>,
        file_kind: FileKind,
    ) -> Self {
        Self {
            file_url: file_url.into(),
            report_id: report_id.into(),
            file_kind,
        }
    }
}
