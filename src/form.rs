use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::account::{Account, AccountFields, AccountId, INDUSTRIES, INDUSTRY_UNSET};
use crate::error::ValidationErrors;
use crate::store::AccountStore;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    )
    .unwrap();
    static ref URL_REGEX: Regex = Regex::new(
        r"^(?i)(?:https?|ftp)://(?:localhost|[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)+)(?::[0-9]{1,5})?(?:[/?#]\S*)?$"
    )
    .unwrap();
}

pub const MIN_PHONE_LEN: usize = 10;
pub const MAX_REMARK_LEN: usize = 200;

/// The two-valued status choice the form shows.
///
/// This is the only place the UI wording meets the stored boolean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusChoice {
    #[default]
    Active,
    Inactive,
}

impl StatusChoice {
    pub fn from_bool(status: bool) -> Self {
        if status {
            StatusChoice::Active
        } else {
            StatusChoice::Inactive
        }
    }

    pub fn to_bool(self) -> bool {
        matches!(self, StatusChoice::Active)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "active" => Some(StatusChoice::Active),
            "inactive" => Some(StatusChoice::Inactive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusChoice::Active => "active",
            StatusChoice::Inactive => "inactive",
        }
    }
}

/// Raw form input, exactly as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormValues {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub industry: String,
    pub status: StatusChoice,
    pub remark: String,
}

impl FormValues {
    pub fn from_account(account: &Account) -> Self {
        let f = &account.fields;
        FormValues {
            name: f.name.clone(),
            email: f.email.clone(),
            phone: f.phone.clone(),
            website: f.website.clone(),
            industry: f.industry.clone(),
            status: StatusChoice::from_bool(f.status),
            remark: f.remark.clone(),
        }
    }
}

/// Check every field and convert to store fields.
///
/// All violations are collected; nothing is returned unless the whole record
/// is valid.
pub fn validate(values: &FormValues) -> Result<AccountFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if values.name.trim().is_empty() {
        errors.push("name", "Account name is required");
    }

    let email = values.email.trim();
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !EMAIL_REGEX.is_match(email) {
        errors.push("email", "Invalid email");
    }

    let phone = values.phone.trim();
    if phone.is_empty() {
        errors.push("phone", "Phone is required");
    } else if phone.chars().count() < MIN_PHONE_LEN {
        errors.push("phone", "Phone must be at least 10 digits");
    }

    let website = values.website.trim();
    if website.is_empty() {
        errors.push("website", "Website is required");
    } else if !URL_REGEX.is_match(website) {
        errors.push("website", "Must be a valid URL");
    }

    let industry = values.industry.trim();
    if industry != INDUSTRY_UNSET && !INDUSTRIES.contains(&industry) {
        errors.push("industry", "Please select an industry");
    }

    if values.remark.chars().count() > MAX_REMARK_LEN {
        errors.push("remark", "Remark is too long");
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AccountFields {
        name: values.name.trim().to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        website: website.to_string(),
        industry: industry.to_string(),
        status: values.status.to_bool(),
        remark: values.remark.clone(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(AccountId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormOutcome {
    pub id: AccountId,
    pub created: bool,
    pub message: &'static str,
}

/// Create / edit form bound to at most one existing account.
#[derive(Clone, Debug)]
pub struct RecordForm {
    mode: FormMode,
    pub values: FormValues,
}

impl Default for RecordForm {
    fn default() -> Self {
        Self::create()
    }
}

impl RecordForm {
    pub fn create() -> Self {
        RecordForm {
            mode: FormMode::Create,
            values: FormValues::default(),
        }
    }

    pub fn edit(account: &Account) -> Self {
        RecordForm {
            mode: FormMode::Edit(account.id),
            values: FormValues::from_account(account),
        }
    }

    /// Edit form for `id` prefilled with `values`, for callers that only
    /// hold the id.
    pub fn bound(id: AccountId, values: FormValues) -> Self {
        RecordForm {
            mode: FormMode::Edit(id),
            values,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Back to a blank create form.
    pub fn reset(&mut self) {
        *self = Self::create();
    }

    pub fn validate(&self) -> Result<AccountFields, ValidationErrors> {
        validate(&self.values)
    }

    /// Validate and hand the record to the store.
    ///
    /// On failure the form is untouched. On success it is reset.
    ///
    /// # Arguments
    /// * `store` - Store to create in, or replace in when editing
    ///
    /// # Returns
    /// * `Result<FormOutcome, ValidationErrors>` - The affected id and the
    ///   confirmation message, or every field that failed
    pub fn submit(&mut self, store: &mut AccountStore) -> Result<FormOutcome, ValidationErrors> {
        let fields = self.validate()?;

        let outcome = match self.mode {
            FormMode::Create => FormOutcome {
                id: store.create(fields),
                created: true,
                message: "Account successfully registered.",
            },
            FormMode::Edit(id) => {
                store.replace(id, fields);
                FormOutcome {
                    id,
                    created: false,
                    message: "Account details updated successfully.",
                }
            }
        };

        self.reset();
        Ok(outcome)
    }
}
