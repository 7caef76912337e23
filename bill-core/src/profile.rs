use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyFormat;
use crate::error::ProfileError;

/// Points at a JSON file that replaces the embedded business profile.
pub const PROFILE_ENV: &str = "FMU_BILL_PROFILE";

/// Who is issuing the bill: everything printed around the line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub business_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub proprietor: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub footer_lines: Vec<String>,
    #[serde(default)]
    pub currency: CurrencyFormat,
    /// `data:image/png;base64,...`
    #[serde(default)]
    pub logo_data_url: Option<String>,
    /// TTF embedded into the PDF in place of the bundled DejaVu Sans.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl BusinessProfile {
    fn fallback() -> Self {
        Self {
            business_name: "Invoice".to_string(),
            tagline: String::new(),
            proprietor: String::new(),
            phone: String::new(),
            address: String::new(),
            footer_lines: Vec::new(),
            currency: CurrencyFormat::default(),
            logo_data_url: None,
            font_path: None,
        }
    }
}

static EMBEDDED_PROFILE: OnceLock<BusinessProfile> = OnceLock::new();

pub fn embedded_profile() -> &'static BusinessProfile {
    EMBEDDED_PROFILE.get_or_init(|| {
        let json = include_str!("../assets/business_profile.json");
        serde_json::from_str::<BusinessProfile>(json).unwrap_or_else(|e| {
            log::error!("[profile] embedded business_profile.json is invalid: {e}");
            BusinessProfile::fallback()
        })
    })
}

pub fn load_profile_file(path: &Path) -> Result<BusinessProfile, ProfileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// The profile from `FMU_BILL_PROFILE` when it is set and loads, else the
/// embedded one. A broken override is logged, never fatal.
pub fn resolve_profile() -> BusinessProfile {
    let raw = match std::env::var(PROFILE_ENV) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return embedded_profile().clone(),
    };

    let path = PathBuf::from(raw.trim());
    match load_profile_file(&path) {
        Ok(profile) => {
            log::info!("[profile] using {}", path.display());
            profile
        }
        Err(e) => {
            log::warn!("[profile] {e}; falling back to the embedded profile");
            embedded_profile().clone()
        }
    }
}
