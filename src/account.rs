use serde::{Deserialize, Serialize};
use std::fmt;

/// Industry value used when an account has no known industry.
pub const INDUSTRY_UNSET: &str = "n/a";

/// Industries offered by the record form.
pub const INDUSTRIES: [&str; 7] = [
    "Technology",
    "Healthcare",
    "Finance",
    "Education",
    "Manufacturing",
    "Real Estate",
    "Media",
];

/// Store-assigned account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The editable part of an account: everything except the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub industry: String,
    /// `true` = active, `false` = inactive.
    pub status: bool,
    pub remark: String,
}

/// A stored account record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub fields: AccountFields,
}

impl Account {
    pub fn new(id: AccountId, fields: AccountFields) -> Self {
        Account { id, fields }
    }

    pub fn is_active(&self) -> bool {
        self.fields.status
    }

    /// Human readable status, as shown in the table and in exports.
    pub fn status_label(&self) -> &'static str {
        status_label(self.fields.status)
    }
}

pub fn status_label(status: bool) -> &'static str {
    if status { "Active" } else { "Inactive" }
}

/// Whether `industry` counts as "no industry" (the sentinel or blank).
pub fn industry_is_unset(industry: &str) -> bool {
    let trimmed = industry.trim();
    trimmed.is_empty() || trimmed == INDUSTRY_UNSET
}

fn seed(
    id: u64,
    name: &str,
    email: &str,
    phone: &str,
    website: &str,
    industry: &str,
    status: bool,
    remark: &str,
) -> Account {
    Account::new(
        AccountId(id),
        AccountFields {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            website: website.to_string(),
            industry: industry.to_string(),
            status,
            remark: remark.to_string(),
        },
    )
}

/// The built-in demo accounts the store starts from and resets to.
pub fn seed_accounts() -> Vec<Account> {
    vec![
        seed(1, "Freda", "fwinger0@fc2.com", "5967957899", "http://fc2.com", "n/a", true, ""),
        seed(2, "Aloysius", "amellanby1@lycos.com", "4988111631", "http://sun.com", "Real Estate", false, "nulla nisl nunc"),
        seed(3, "Dalli", "dturnell2@reference.com", "9919131652", "http://51.la", "Hospital Management", false, ""),
        seed(4, "Kort", "ktrittam3@sakura.ne.jp", "4928500329", "http://walmart.com", "EDP Services", false, "id ornare imperdiet"),
        seed(5, "Heall", "hsilson4@pinterest.com", "3862338325", "http://st.edu", "n/a", false, "auctor gravida sem"),
        seed(6, "Sheeree", "sjeannin5@bigcartel.com", "4335616798", "https://amazon.com", "Automotive Aftermarket", false, "quis turpis"),
        seed(7, "Hildegarde", "hdurdy6@mysql.com", "8059908180", "https://huffpost.com", "Industrial Specialties", true, ""),
        seed(8, "Hulda", "hcruickshanks7@answers.com", "8705495500", "https://yandex.ru", "Package Goods", true, "platea dictumst"),
        seed(9, "Shae", "stales8@google.pl", "4628674456", "http://mayoclinic.com", "Machinery Components", true, "eget orci vehicula"),
        seed(10, "Jana", "jhugk9@wikispaces.com", "4222905888", "https://jugem.jp", "n/a", true, "eu est"),
        seed(11, "Lorin", "lsmith@yahoo.com", "2025550101", "https://github.com", "Software Tech", true, "vanguard project"),
        seed(12, "Merrick", "m.vance@outlook.com", "3125550123", "http://vance.io", "Consulting", false, "follow up next week"),
        seed(13, "Krystal", "krys.lee@gmail.com", "4155550199", "https://stripe.com", "Fintech", true, "priority client"),
        seed(14, "Brant", "b.stokes@apple.com", "5105550144", "https://apple.com", "Electronics", true, ""),
        seed(15, "Sutton", "s.pierce@bbc.co.uk", "2075550155", "http://bbc.com", "Media", false, "review pending"),
        seed(16, "Tiana", "tiana.r@adobe.com", "4085550166", "https://adobe.com", "Creative Tools", true, "creative cloud lead"),
        seed(17, "Vance", "v.joyce@tesla.com", "6505550177", "https://tesla.com", "Automotive", true, "energy sector"),
        seed(18, "Willa", "w.hunt@nike.com", "5035550188", "http://nike.com", "Apparel", false, "out of office"),
        seed(19, "Xander", "x.bolt@uber.com", "4155550111", "http://uber.com", "Logistics", true, "fleet manager"),
        seed(20, "Yara", "y.shah@netflix.com", "3105550122", "http://netflix.com", "Entertainment", true, "content lead"),
        seed(21, "Zane", "z.grey@spotify.com", "2125550133", "http://spotify.com", "Music", false, "subscription trial"),
        seed(22, "Quinn", "q.adams@nasa.gov", "2025550144", "http://nasa.gov", "Aerospace", true, "research grant"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_set_has_unique_ids() {
        let seeds = seed_accounts();
        let ids: HashSet<AccountId> = seeds.iter().map(|a| a.id).collect();
        assert_eq!(seeds.len(), 22);
        assert_eq!(ids.len(), seeds.len(), "seed ids must be unique");
    }

    #[test]
    fn seed_set_status_split() {
        let active = seed_accounts().iter().filter(|a| a.is_active()).count();
        assert_eq!(active, 13);
    }

    #[test]
    fn unset_industry_detection() {
        assert!(industry_is_unset("n/a"));
        assert!(industry_is_unset(" n/a "));
        assert!(industry_is_unset("   "));
        assert!(!industry_is_unset("Media"));
    }
}
