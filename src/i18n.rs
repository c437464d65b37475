//! Bilingual labels
//!
//! A plain keyed table. English is the fallback for missing or
//! empty Italian text, and unknown keys render as themselves.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    It,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported language: {0}")]
pub struct UnknownLanguage(String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "it" => Ok(Language::It),
            other => Err(UnknownLanguage(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    pub en: String,
    #[serde(default)]
    pub it: String,
}

impl Localized {
    pub fn new(en: impl Into<String>, it: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            it: it.into(),
        }
    }

    /// Same text in both languages
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            en: text.clone(),
            it: text,
        }
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::It if !self.it.is_empty() => &self.it,
            _ => &self.en,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Translations(BTreeMap<&'static str, Localized>);

impl Translations {
    pub fn builtin() -> Self {
        let entries = [
            ("detail_vol_monthly", "Monthly Volume", "Volume Mensile"),
            ("detail_units", "units", "unità"),
            ("mkt_est_yield", "Est. Monthly Yield", "Rendita Mensile Stimata"),
            ("detail_yield_annual", "Est. Annual Yield", "Rendita Annua Stimata"),
            ("detail_apy", "Implied APY", "APY Implicito"),
            ("detail_royalty", "Royalty Rate", "Tasso Royalty"),
            ("detail_min_bid", "Minimum Bid", "Offerta Minima"),
            ("detail_oracle_feed", "Oracle Live Feed (Simulated)", "Feed Oracolo Live (Simulato)"),
            ("detail_order", "Order", "Ordine"),
            ("dash_title", "Investor Dashboard", "Dashboard Investitore"),
            ("dash_active", "Active Assets", "Asset Attivi"),
            ("dash_dishes", "Dishes", "Piatti"),
            ("dash_unclaimed", "Unclaimed Yield", "Rendita Non Riscossa"),
        ];
        Self(
            entries
                .into_iter()
                .map(|(key, en, it)| (key, Localized::new(en, it)))
                .collect(),
        )
    }

    pub fn lookup<'a>(&'a self, key: &'a str, lang: Language) -> &'a str {
        self.0.get(key).map(|l| l.get(lang)).unwrap_or(key)
    }
}
