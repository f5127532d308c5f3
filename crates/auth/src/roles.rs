use serde::{Deserialize, Serialize};

/// Application role, parsed from the historical free-text role columns.
///
/// The user table stores role labels as strings with inconsistent casing,
/// accents, and spellings accumulated over the years ("Gestor", "GESTOR",
/// "SuperAdm", "Time Negócios", "Time de Negócios"). Parsing is centralized
/// here so the variant list stays in one documented place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Gestor,
    /// Accepts both legacy spellings: "superadm" and "superadmin".
    SuperAdmin,
    Admin,
    Representante,
    /// Accepts "Time Negócios" and "Time de Negócios".
    TimeNegocios,
    /// Any label this engine does not recognize. Carries no privileges.
    Other(String),
}

impl Role {
    /// Parse a stored role label, case- and diacritic-insensitively.
    pub fn parse(label: &str) -> Self {
        match normalize(label).as_str() {
            "gestor" => Self::Gestor,
            "superadm" | "superadmin" => Self::SuperAdmin,
            "admin" => Self::Admin,
            "representante" => Self::Representante,
            "time negocios" | "time de negocios" => Self::TimeNegocios,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    /// Managers are the only identity class allowed to read or write the
    /// access matrix.
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::Gestor | Self::SuperAdmin | Self::Admin)
    }
}

/// Lowercase the label and strip the diacritics that occur in stored data.
fn normalize(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        _ => c,
    }
}
