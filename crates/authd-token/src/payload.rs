use authd_core::TokenType;

/// The plaintext sealed inside every token: a fixed six-field, `?`-delimited
/// tuple. `additional_data` carries the PKCE code challenge for auth codes
/// and is empty for every other token type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token_type: TokenType,
    pub user_name: String,
    pub expiration_s: u64,
    pub client_id: String,
    pub scopes: String,
    pub additional_data: String,
}

impl TokenData {
    pub fn to_payload_string(&self) -> String {
        format!(
            "{}?{}?{}?{}?{}?{}?",
            self.token_type.as_str(),
            self.user_name,
            self.expiration_s,
            self.client_id,
            self.scopes,
            self.additional_data,
        )
    }

    /// Mirrors the original parser: sequentially looks for each `?`
    /// delimiter, failing if any of the six fields is missing.
    pub fn from_payload_string(payload: &str) -> Result<Self, PayloadError> {
        let mut rest = payload;
        let mut next_field = || -> Result<&str, PayloadError> {
            let (field, remainder) = rest.split_once('?').ok_or(PayloadError::Broken)?;
            rest = remainder;
            Ok(field)
        };

        let type_field = next_field()?;
        let user_name = next_field()?.to_string();
        let expiration_field = next_field()?;
        let client_id = next_field()?.to_string();
        let scopes = next_field()?.to_string();
        let additional_data = next_field()?.to_string();

        let token_type = TokenType::from_str(type_field).ok_or(PayloadError::Broken)?;
        let expiration_s = expiration_field
            .parse::<u64>()
            .map_err(|_| PayloadError::Broken)?;

        Ok(TokenData {
            token_type,
            user_name,
            expiration_s,
            client_id,
            scopes,
            additional_data,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    Broken,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("token string is broken")
    }
}

impl std::error::Error for PayloadError {}
