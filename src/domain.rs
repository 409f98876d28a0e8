// Domain records for the recipe service. List endpoints answer with JSON
// arrays of fixed-order rows; the constructors here turn a row into a
// named-field struct and fail explicitly when a row is too short instead
// of indexing blindly.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// A service row did not match the shape the record expects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("{entity} row has {got} fields, expected {want}")]
    TooShort {
        entity: &'static str,
        want: usize,
        got: usize,
    },
}

/// Render a loosely-typed scalar field as display text. The service is not
/// consistent about numeric vs string identifiers, so both are accepted.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A registered user and the allergies on file for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub allergies: Vec<String>,
}

impl User {
    /// Build a user from a `[userid, firstname, lastname, allergies]` row.
    /// The allergy field is extracted best-effort: anything that is not an
    /// array becomes an empty list.
    pub fn from_row(row: &[Value]) -> Result<Self, RowError> {
        if row.len() < 4 {
            return Err(RowError::TooShort {
                entity: "user",
                want: 4,
                got: row.len(),
            });
        }
        let allergies = row[3]
            .as_array()
            .map(|items| items.iter().map(scalar_text).collect())
            .unwrap_or_default();
        Ok(Self {
            user_id: scalar_text(&row[0]),
            first_name: scalar_text(&row[1]),
            last_name: scalar_text(&row[2]),
            allergies,
        })
    }
}

/// A catalog recipe. `mealdb_id` is the external TheMealDB identifier,
/// `recipe_id` the identifier assigned by the service. The asset reference
/// is optional and empty when the recipe has no stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub mealdb_id: String,
    pub name: String,
    pub asset: String,
    pub recipe_id: String,
}

impl Recipe {
    /// Build a recipe from a `[mealdbid, name, asset, recipeid]` row.
    pub fn from_row(row: &[Value]) -> Result<Self, RowError> {
        if row.len() < 4 {
            return Err(RowError::TooShort {
                entity: "recipe",
                want: 4,
                got: row.len(),
            });
        }
        let asset = match &row[2] {
            Value::Null => String::new(),
            other => scalar_text(other),
        };
        Ok(Self {
            mealdb_id: scalar_text(&row[0]),
            name: scalar_text(&row[1]),
            asset,
            recipe_id: scalar_text(&row[3]),
        })
    }
}

/// One allergy entry owned by a user. The user relation is enforced by the
/// service; the client only surfaces the service's not-found signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allergy {
    pub allergy_id: String,
    pub name: String,
    pub user_id: String,
}

impl Allergy {
    /// Build an allergy from an `[allergyid, allergyname, userid]` row.
    pub fn from_row(row: &[Value]) -> Result<Self, RowError> {
        if row.len() < 3 {
            return Err(RowError::TooShort {
                entity: "allergy",
                want: 3,
                got: row.len(),
            });
        }
        Ok(Self {
            allergy_id: scalar_text(&row[0]),
            name: scalar_text(&row[1]),
            user_id: scalar_text(&row[2]),
        })
    }
}

/// Descriptor returned by the download endpoint: which object in the
/// results bucket holds the rendered recipe text and what to name it
/// locally. Field names are fixed by the wire format.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DownloadTicket {
    pub local_filename: String,
    #[serde(rename = "bucketkey_results_file")]
    pub bucket_key: String,
}
