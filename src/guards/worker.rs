use rocket::request::{self, Request, FromRequest, Outcome};
use rocket::http::Status;
use rocket::State;
use mongodb::bson::doc;

use rocket_okapi::request::OpenApiFromRequest;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::request::RequestHeaderInput;

use crate::db::DbConn;
use crate::guards::AuthGuard;
use crate::models::{RoleBinding, UserRole, Worker};

/// Role-resolving guard: the caller must hold the `worker` role, and their
/// worker document is loaded so handlers never look it up themselves.
pub struct WorkerGuard {
    pub auth: AuthGuard,
    pub worker: Worker,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WorkerGuard {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let auth_outcome = req.guard::<AuthGuard>().await;

        match auth_outcome {
            Outcome::Success(auth) => {
                let db = req.guard::<&State<DbConn>>().await.unwrap();

                let binding = db
                    .collection::<RoleBinding>("user_roles")
                    .find_one(doc! { "user_id": &auth.user_id, "role": UserRole::Worker.as_str() }, None)
                    .await;

                match binding {
                    Ok(Some(_)) => {
                        let worker = db
                            .collection::<Worker>("workers")
                            .find_one(doc! { "user_id": &auth.user_id }, None)
                            .await;

                        match worker {
                            Ok(Some(worker)) => Outcome::Success(WorkerGuard { auth, worker }),
                            Ok(None) => {
                                println!("Worker guard rejected - no worker document");
                                Outcome::Error((Status::Forbidden, ()))
                            }
                            Err(e) => {
                                println!("Worker guard rejected - DB error: {:?}", e);
                                Outcome::Error((Status::Forbidden, ()))
                            }
                        }
                    }
                    Ok(None) => {
                        println!("Worker guard rejected - no worker role binding");
                        Outcome::Error((Status::Forbidden, ()))
                    }
                    Err(e) => {
                        println!("Worker guard rejected - DB error: {:?}", e);
                        Outcome::Error((Status::Forbidden, ()))
                    }
                }
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for WorkerGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(RequestHeaderInput::None)
    }
}
