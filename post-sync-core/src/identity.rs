use std::fmt;
use uuid::Uuid;

/// The durable key joining a remote page to its local file across renames.
///
/// Always the 36-character lowercase hyphenated form, whatever form the API used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        let id = Uuid::parse_str(raw.trim())?;
        Ok(Self(id.hyphenated().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
