use rocket::request::{self, FromRequest, Request, Outcome};
use rocket::http::Status;
use mongodb::bson::oid::ObjectId;

use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use rocket_okapi::r#gen::OpenApiGenerator;

use crate::services::JwtService;

/// JWT-based authentication guard
pub struct AuthGuard {
    pub user_id: ObjectId,
    pub email: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let Some(header) = req.headers().get_one("Authorization") else {
            return Outcome::Error((Status::Unauthorized, ()));
        };
        let token = header.trim_start_matches("Bearer ");

        let Ok(claims) = JwtService::verify_token(token, false) else {
            return Outcome::Error((Status::Unauthorized, ()));
        };

        match ObjectId::parse_str(&claims.sub) {
            Ok(user_id) => Outcome::Success(AuthGuard {
                user_id,
                email: claims.email,
            }),
            Err(_) => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

/// Keeps OpenAPI generation working; the guard only reads the
/// Authorization header and adds nothing to the documented parameters.
impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
