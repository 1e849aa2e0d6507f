use actix_web::{error, http::StatusCode, HttpResponse, HttpResponseBuilder};
use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum AuthError {
    #[display("forbidden")]
    Forbidden,
    #[display("unauthorized")]
    Unauthorized,
}

impl error::ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match *self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponseBuilder::new(self.status_code()).body(self.to_string())
    }
}

/// Why a username/password login was refused.
///
/// Unknown usernames and wrong passwords both surface as `BadCredentials`
/// so callers cannot probe which accounts exist.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    #[display("bad credentials")]
    BadCredentials,
    #[display("account is disabled")]
    Disabled,
    #[display("account is locked")]
    Locked,
    #[display("credential store unavailable")]
    StoreUnavailable,
}
