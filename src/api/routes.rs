//! Route table
//!
//! Every protected route is gated by [`Authenticate`] and a [`RequireRole`]
//! for the single role allowed to call it.

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use super::handlers::{admin, auth, doctor, index, nurse, user};
use super::middleware::{Authenticate, RequireRole};
use crate::error::ApiError;
use crate::models::Role;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(format!("Invalid request body: {}", err)).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .route("/", web::get().to(index::root))
        .service(
            web::scope("/api")
                .route("", web::get().to(index::welcome))
                .route("/", web::get().to(index::welcome))
                .route("/health", web::get().to(index::health))
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(auth::login))
                        .route("/signup", web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/user/data")
                        .route(web::get().to(user::own_data))
                        .wrap(RequireRole(Role::User))
                        .wrap(Authenticate),
                )
                .service(
                    web::resource("/user/create")
                        .route(web::post().to(doctor::create_patient))
                        .wrap(RequireRole(Role::Doctor))
                        .wrap(Authenticate),
                )
                .service(
                    web::scope("/admin")
                        .route("/users", web::get().to(admin::list_users))
                        .route("/update/{id}", web::put().to(admin::update_user))
                        .route("/delete/{id}", web::delete().to(admin::delete_user))
                        .wrap(RequireRole(Role::Admin))
                        .wrap(Authenticate),
                )
                .service(
                    web::scope("/nurse")
                        .route("/getPatients", web::get().to(nurse::list_patients))
                        .wrap(RequireRole(Role::Nurse))
                        .wrap(Authenticate),
                )
                .service(
                    web::scope("/doctor")
                        .route("/getPatients", web::get().to(doctor::list_patients))
                        .route("/deletePatients/{id}", web::delete().to(doctor::delete_patient))
                        .route("/updatePatients", web::post().to(doctor::update_patient))
                        .route("/predict", web::post().to(doctor::predict))
                        .wrap(RequireRole(Role::Doctor))
                        .wrap(Authenticate),
                ),
        );
}
