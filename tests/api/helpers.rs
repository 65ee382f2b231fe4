use reqwest::Response;
use secrecy::Secret;
use serde_json::Value;
use std::sync::Once;
use wiremock::MockServer;

use acting_garage_leads::{
    config::{get_configuration, Settings},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

pub const LIST_ID: &str = "0318e55dfd";

// Logs are only printed when TEST_LOG is set, e.g. `TEST_LOG=true cargo test`
static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let name = String::from("test");
        let env_filter = String::from("debug");

        if std::env::var("TEST_LOG").is_ok() {
            init_subscriber(get_subscriber(name, env_filter, std::io::stdout));
        } else {
            init_subscriber(get_subscriber(name, env_filter, std::io::sink));
        }
    });
}

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub mailchimp_server: MockServer,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        TestApp::spawn_app_with(|_| {}).await
    }

    /// Spawns the application after letting `customize` tweak the configuration.
    pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
        init_tracing();

        let mut config = get_configuration().expect("Missing configuration file.");
        let mailchimp_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_mailchimp_base_url(mailchimp_server.uri());
        config.mailchimp.list_id = Some(String::from(LIST_ID));
        config.mailchimp.api_key = Some(Secret::new(String::from("test-api-key-us3")));
        config.application.simulate_submissions = false;
        config.application.allowed_origins = Vec::new();

        customize(&mut config);

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            mailchimp_server,
        }
    }

    pub async fn post_submit_form(&self, body: &Value) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/api/submit-form", self.address);

        client
            .post(&url)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path_and_query: &str) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.address, path_and_query);

        client
            .get(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub fn members_path(&self) -> String {
        format!("/lists/{}/members", LIST_ID)
    }
}

/// Body of a complete lead form.
pub fn lead_form(email: &str) -> Value {
    serde_json::json!({
        "email": email,
        "name": "Lucía García López",
        "phone": "+34 600 000 000",
        "age": "27",
        "interests": "cine-tv",
        "source": "email_campaign",
        "utm_source": "facebook",
        "utm_medium": "cpc",
        "utm_campaign": "spring_intensive"
    })
}

/// Member as returned by the list members endpoint.
pub fn mailchimp_member(
    email: &str,
    source: &str,
    timestamp_opt: &str,
    interest_tag: &str,
) -> Value {
    let campaign = if source == "email_campaign" {
        "spring_intensive"
    } else {
        ""
    };

    serde_json::json!({
        "id": format!("{:x}", md5::compute(email.to_lowercase())),
        "email_address": email,
        "unique_email_id": "a1b2c3",
        "list_id": LIST_ID,
        "status": "subscribed",
        "member_rating": 2,
        "ip_opt": "10.0.0.1",
        "timestamp_opt": timestamp_opt,
        "timestamp_signup": "",
        "last_changed": timestamp_opt,
        "merge_fields": {
            "FNAME": "Lucía",
            "LNAME": "García",
            "PHONE": "600000000",
            "AGE": "27",
            "SOURCE": source,
            "MMERGE5": "",
            "MMERGE11": "",
            "MMERGE12": "",
            "MMERGE13": campaign
        },
        "tags": [
            { "id": 1, "name": "form_submission" },
            { "id": 2, "name": interest_tag }
        ]
    })
}
