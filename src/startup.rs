use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::{web, App, HttpServer, Resource, Route};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DashboardSettings, Settings};
use crate::mailchimp_client::MailchimpClient;
use crate::routes::{
    api_health, handle_dashboard_insights, handle_dashboard_leads, handle_dashboard_segment,
    handle_get_members, handle_submit_form, health_check, json_error_handler, method_not_allowed,
    query_error_handler,
};

const CORS_MAX_AGE_SECONDS: usize = 3600;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

/// When enabled, form submissions are answered without calling Mailchimp.
pub struct SimulateSubmissions(pub bool);

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let mailchimp_client = MailchimpClient::new(
            config.get_mailchimp_base_url(),
            config.mailchimp.list_id.clone(),
            config.mailchimp.api_key.clone(),
            Some(config.mailchimp.get_timeout()),
        )
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

        if !mailchimp_client.is_configured() {
            tracing::warn!(
                "Mailchimp api key or list id missing, Mailchimp backed endpoints will fail"
            );
        }

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server listening on {}", config.get_address());

        let server = run(
            listener,
            mailchimp_client,
            config.dashboard.clone(),
            config.application.allowed_origins.clone(),
            config.application.simulate_submissions,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "OPTIONS", "PATCH", "DELETE", "POST", "PUT"])
        .allowed_headers(vec![
            header::ACCEPT,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::DATE,
        ])
        .allowed_header("X-CSRF-Token")
        .allowed_header("X-Requested-With")
        .allowed_header("Accept-Version")
        .allowed_header("Content-MD5")
        .allowed_header("X-Api-Version")
        .max_age(CORS_MAX_AGE_SECONDS);

    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }

    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

/// API resource answering any other method with our 405 body.
fn api_resource(path: &str, route: Route) -> Resource {
    web::resource(path)
        .route(route)
        .default_service(web::to(method_not_allowed))
}

pub fn run(
    listener: TcpListener,
    mailchimp_client: MailchimpClient,
    dashboard_settings: DashboardSettings,
    allowed_origins: Vec<String>,
    simulate_submissions: bool,
) -> Result<Server, std::io::Error> {
    let mailchimp_client = web::Data::new(mailchimp_client);
    let dashboard_settings = web::Data::new(dashboard_settings);
    let simulate_submissions = web::Data::new(SimulateSubmissions(simulate_submissions));

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(build_cors(&allowed_origins))
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .route("/health_check", web::get().to(health_check))
            .service(api_resource("/api/health", web::get().to(api_health)))
            .service(api_resource(
                "/api/submit-form",
                web::post().to(handle_submit_form),
            ))
            .service(api_resource(
                "/api/get-members",
                web::get().to(handle_get_members),
            ))
            .service(
                web::scope("/api/dashboard")
                    .service(api_resource(
                        "/insights",
                        web::get().to(handle_dashboard_insights),
                    ))
                    .service(api_resource(
                        "/leads",
                        web::get().to(handle_dashboard_leads),
                    ))
                    .service(api_resource(
                        "/segments/{segment}",
                        web::get().to(handle_dashboard_segment),
                    )),
            )
            .app_data(mailchimp_client.clone())
            .app_data(dashboard_settings.clone())
            .app_data(simulate_submissions.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
