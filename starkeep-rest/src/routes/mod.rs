use actix_web::{
    web::{self, ServiceConfig},
    HttpResponse,
};

pub mod admin;
pub mod api;
pub mod files;

/// Admin dashboard page.
pub async fn dashboard() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(include_str!("../../static/index.html"))
}

pub fn config(cfg: &mut ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(dashboard)))
        .service(web::resource("/ping").route(web::post().to(files::ping)))
        .service(web::resource("/upload").route(web::post().to(files::upload)))
        .service(web::resource("/create-dir").route(web::post().to(files::create_dir)))
        .service(web::resource("/files").route(web::get().to(files::list)))
        .service(
            web::resource("/files/{path:.*}")
                .route(web::get().to(files::download))
                .route(web::delete().to(files::delete)),
        )
        .service(web::scope("/admin").configure(admin::config))
        .service(web::scope("/api").configure(api::config));
}
