use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::{CallerIdentity, Role};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const RESTAURANT_ID_HEADER: &str = "x-restaurant-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::unauthenticated(format!("{name} is not valid text"))),
    }
}

fn uuid_header(headers: &HeaderMap, name: &str) -> Result<Option<Uuid>, ApiError> {
    header(headers, name)?
        .map(|raw| {
            raw.parse::<Uuid>()
                .map_err(|_| ApiError::unauthenticated(format!("{name} is not a valid id")))
        })
        .transpose()
}

/// Build the caller identity from the headers set by the authenticating
/// proxy in front of the service.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
    let user_id = uuid_header(headers, USER_ID_HEADER)?
        .ok_or_else(|| ApiError::unauthenticated(format!("{USER_ID_HEADER} header is required")))?;

    let role: Role = header(headers, USER_ROLE_HEADER)?
        .ok_or_else(|| ApiError::unauthenticated(format!("{USER_ROLE_HEADER} header is required")))?
        .parse()
        .map_err(|e| ApiError::unauthenticated(format!("{e}")))?;

    let restaurant_id = uuid_header(headers, RESTAURANT_ID_HEADER)?;

    Ok(CallerIdentity {
        user_id,
        role,
        restaurant_id: if role == Role::Restaurant { restaurant_id } else { None },
    })
}

impl FromRequest for CallerIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_headers(req.headers()))
    }
}
