#![doc = include_str!("../README.md")]

pub mod config;
pub mod errors;
pub mod routes;

pub type AppResult<T> = Result<T, errors::AppError>;

/// Upload limit, matching the storage ceiling (5 GiB).
#[allow(clippy::cast_possible_truncation)]
pub const UPLOAD_LIMIT: usize = starkeep::MAX_STORAGE_BYTES as usize;

#[macro_export]
macro_rules! create_app {
    ($ctx:expr) => {{
        use ::actix_web::{
            middleware,
            web::{Data, PayloadConfig},
            App,
        };
        use ::starkeep_rest::routes;

        App::new()
            .app_data(Data::clone(&$ctx))
            .app_data(PayloadConfig::new(::starkeep_rest::UPLOAD_LIMIT))
            .wrap(middleware::NormalizePath::trim())
            .wrap(middleware::Logger::default())
            .configure(routes::config)
    }};
}
