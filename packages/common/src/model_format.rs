#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Source format of an uploaded 3D model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum ModelFormat {
    /// Stereolithography mesh.
    #[serde(rename = "stl")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "stl"))]
    Stl,
    /// Polygon file format.
    #[serde(rename = "ply")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ply"))]
    Ply,
    /// 3D Manufacturing Format package.
    #[serde(rename = "3mf")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "3mf"))]
    ThreeMf,
    /// ISO 10303 CAD exchange file. Needs conversion before it can be rendered.
    #[serde(rename = "step")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "step"))]
    Step,
}

impl ModelFormat {
    pub const ALL: &'static [ModelFormat] = &[Self::Stl, Self::Ply, Self::ThreeMf, Self::Step];

    /// Map a file extension (without the dot, any case) to a format.
    ///
    /// `stp` is accepted as an alias for `step`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            "ply" => Some(Self::Ply),
            "3mf" => Some(Self::ThreeMf),
            "step" | "stp" => Some(Self::Step),
            _ => None,
        }
    }

    /// Derive the format from the extension of an uploaded filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether the viewer can load the original bytes directly.
    ///
    /// 3MF is accepted here even though no viewer path exists for it yet.
    pub fn is_natively_renderable(&self) -> bool {
        matches!(self, Self::Stl | Self::Ply | Self::ThreeMf)
    }

    pub fn requires_conversion(&self) -> bool {
        !self.is_natively_renderable()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::ThreeMf => "3mf",
            Self::Step => "step",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFormatError {
    invalid: String,
}

impl fmt::Display for ParseFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported model format '{}'", self.invalid)
    }
}

impl std::error::Error for ParseFormatError {}

impl FromStr for ModelFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ParseFormatError {
            invalid: s.to_string(),
        })
    }
}
