//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Supported languages
///
/// Drives date and number formatting in certificate templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Thai,
    #[default]
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Thai => "th",
            Language::English => "en",
        }
    }

    /// Full month name for a 1-based month number
    pub fn month_name(&self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        const TH: [&str; 12] = [
            "มกราคม", "กุมภาพันธ์", "มีนาคม", "เมษายน", "พฤษภาคม", "มิถุนายน", "กรกฎาคม",
            "สิงหาคม", "กันยายน", "ตุลาคม", "พฤศจิกายน", "ธันวาคม",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Language::Thai => TH[idx],
            Language::English => EN[idx],
        }
    }
}

/// Physical paper sizes supported by the renderer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PaperFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperFormat {
    /// Portrait (width, height) in millimetres
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PaperFormat::A3 => (297.0, 420.0),
            PaperFormat::A4 => (210.0, 297.0),
            PaperFormat::A5 => (148.0, 210.0),
            PaperFormat::Letter => (215.9, 279.4),
            PaperFormat::Legal => (215.9, 355.6),
        }
    }

    /// Name as used by the CSS `@page { size }` descriptor
    pub fn css_name(&self) -> &'static str {
        match self {
            PaperFormat::A3 => "A3",
            PaperFormat::A4 => "A4",
            PaperFormat::A5 => "A5",
            PaperFormat::Letter => "letter",
            PaperFormat::Legal => "legal",
        }
    }
}

/// Page orientation for generated documents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// A paper format combined with an orientation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageGeometry {
    pub format: PaperFormat,
    pub orientation: Orientation,
}

impl PageGeometry {
    pub const fn new(format: PaperFormat, orientation: Orientation) -> Self {
        Self {
            format,
            orientation,
        }
    }

    /// Certificates are always A4 landscape.
    pub const fn certificate() -> Self {
        Self::new(PaperFormat::A4, Orientation::Landscape)
    }

    /// Effective (width, height) in millimetres after applying orientation.
    pub fn size_mm(&self) -> (f64, f64) {
        let (w, h) = self.format.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Effective (width, height) in PDF points (1 pt = 1/72 inch).
    pub fn size_pt(&self) -> (f64, f64) {
        let (w, h) = self.size_mm();
        (mm_to_pt(w), mm_to_pt(h))
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::certificate()
    }
}

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

/// Date range for queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: chrono::NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_landscape_swaps_dimensions() {
        let (w, h) = PageGeometry::certificate().size_pt();
        assert!((w - 841.89).abs() < 0.01);
        assert!((h - 595.28).abs() < 0.01);
    }

    #[test]
    fn thai_month_names() {
        assert_eq!(Language::Thai.month_name(1), "มกราคม");
        assert_eq!(Language::English.month_name(12), "December");
    }

    #[test]
    fn open_date_range_contains_everything() {
        let range = DateRange {
            start: None,
            end: None,
        };
        assert!(range.contains(chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
