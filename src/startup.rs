use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_session, health_check, login, logout, refresh, register};
use crate::session_cookie::RefreshCookie;

pub fn run(
    listener: TcpListener,
    auth: AuthService,
    cookie: RefreshCookie,
) -> Result<Server, std::io::Error> {
    let codec = auth.codec().clone();
    let auth = web::Data::new(auth);
    let cookie = web::Data::new(cookie);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(auth.clone())
            .app_data(cookie.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))

            // Protected routes (require a valid access token)
            .service(
                web::resource("/auth/logout")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route(web::post().to(logout)),
            )
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(codec.clone()))
                    .route("/me", web::get().to(current_session)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
