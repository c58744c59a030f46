use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Kind of bank account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Courant,
    Epargne,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Courant => "Courant",
            AccountType::Epargne => "Epargne",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Courant" => Ok(AccountType::Courant),
            "Epargne" => Ok(AccountType::Epargne),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// Bank account as exposed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compte {
    pub id: i64,
    pub date_creation: NaiveDate,
    pub solde: f64,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

/// Row of the `comptes` table
#[derive(Debug, Clone, FromRow)]
pub struct CompteRow {
    pub id: i64,
    pub date_creation: NaiveDate,
    pub solde: f64,
    pub account_type: String,
}

impl TryFrom<CompteRow> for Compte {
    type Error = String;

    fn try_from(row: CompteRow) -> Result<Self, Self::Error> {
        Ok(Compte {
            id: row.id,
            date_creation: row.date_creation,
            solde: row.solde,
            account_type: row.account_type.parse()?,
        })
    }
}

/// Body of create and update requests.
///
/// `dateCreation` and `solde` may be omitted or sent as empty strings.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompteRequest {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub date_creation: Option<NaiveDate>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(range(
        min = -1_000_000_000_000.0,
        max = 1_000_000_000_000.0,
        message = "Solde must be between -1e12 and 1e12"
    ))]
    pub solde: Option<f64>,

    #[serde(rename = "type")]
    pub account_type: AccountType,
}

impl CompteRequest {
    /// Fill in defaults for a new account created on `today`.
    pub fn into_new_compte(self, today: NaiveDate) -> NewCompte {
        NewCompte {
            date_creation: self.date_creation.unwrap_or(today),
            solde: self.solde.unwrap_or(0.0),
            account_type: self.account_type,
        }
    }

    pub fn into_changes(self) -> CompteChanges {
        CompteChanges {
            date_creation: self.date_creation,
            solde: self.solde,
            account_type: self.account_type,
        }
    }
}

/// Values for a new account
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompte {
    pub date_creation: NaiveDate,
    pub solde: f64,
    pub account_type: AccountType,
}

/// Update to an existing account; `None` keeps the stored value
#[derive(Debug, Clone, PartialEq)]
pub struct CompteChanges {
    pub date_creation: Option<NaiveDate>,
    pub solde: Option<f64>,
    pub account_type: AccountType,
}

impl CompteChanges {
    pub fn apply_to(&self, compte: &mut Compte) {
        if let Some(date) = self.date_creation {
            compte.date_creation = date;
        }
        if let Some(solde) = self.solde {
            compte.solde = solde;
        }
        compte.account_type = self.account_type;
    }
}

/// Treat `null`, a missing field, and `""` the same way.
fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(ref s) if s.trim().is_empty() => Ok(None),
        other => serde_json::from_value(other).map(Some).map_err(D::Error::custom),
    }
}
