use serde_json::Value;
use wiremock::matchers::{any, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{lead_form, TestApp};

fn subscriber_hash(email: &str) -> String {
    format!("{:x}", md5::compute(email.to_lowercase()))
}

#[tokio::test]
async fn submit_form_creates_a_tagged_member() {
    let test_app = TestApp::spawn_app().await;
    let email = "lucia@test.com";
    let member_id = subscriber_hash(email);

    Mock::given(path(test_app.members_path()))
        .and(method("POST"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": member_id,
            "email_address": email
        })))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    Mock::given(path(format!("{}/{}/tags", test_app.members_path(), member_id)))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form(email)).await;

    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Form submitted successfully");
    assert_eq!(body["contactId"], member_id.as_str());
}

#[tokio::test]
async fn submit_form_sends_merge_fields_and_interest_tag() {
    let test_app = TestApp::spawn_app().await;
    let email = "lucia@test.com";

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": subscriber_hash(email)
        })))
        .mount(&test_app.mailchimp_server)
        .await;

    test_app.post_submit_form(&lead_form(email)).await;

    let received_requests = test_app.mailchimp_server.received_requests().await.unwrap();
    let create_requests: Vec<Value> = received_requests
        .iter()
        .filter(|request| request.url.path() == test_app.members_path())
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect();

    assert_eq!(create_requests.len(), 1);

    let create_request = &create_requests[0];

    assert_eq!(create_request["email_address"], email);
    assert_eq!(create_request["status"], "subscribed");
    assert_eq!(create_request["merge_fields"]["FNAME"], "Lucía");
    assert_eq!(create_request["merge_fields"]["LNAME"], "García López");
    assert_eq!(create_request["merge_fields"]["PHONE"], "+34 600 000 000");
    assert_eq!(create_request["merge_fields"]["AGE"], "27");
    assert_eq!(create_request["merge_fields"]["SOURCE"], "email_campaign");
    assert_eq!(create_request["merge_fields"]["MMERGE5"], "cine-tv");
    assert_eq!(create_request["merge_fields"]["MMERGE13"], "spring_intensive");
    assert_eq!(
        create_request["tags"],
        serde_json::json!(["form_submission", "interest_cine_tv"])
    );

    let tag_request = received_requests
        .iter()
        .find(|request| request.url.path().ends_with("/tags"))
        .expect("Member was not tagged");
    let tag_body: Value = serde_json::from_slice(&tag_request.body).unwrap();

    assert_eq!(
        tag_body["tags"][2],
        serde_json::json!({ "name": "source_email_campaign", "status": "active" })
    );
}

#[tokio::test]
async fn submit_form_updates_existing_members() {
    let test_app = TestApp::spawn_app().await;
    let email = "Lucia@Test.com";
    let subscriber_hash = subscriber_hash(email);
    let member_path = format!("{}/{}", test_app.members_path(), subscriber_hash);

    Mock::given(path(test_app.members_path()))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "type": "https://mailchimp.com/developer/marketing/docs/errors/",
            "title": "Member Exists",
            "status": 400,
            "detail": "Lucia@Test.com is already a list member. Use PUT to insert or update list members."
        })))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    Mock::given(path(member_path.clone()))
        .and(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": subscriber_hash
        })))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    Mock::given(path(format!("{}/tags", member_path)))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form(email)).await;

    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Contact updated successfully");
    assert_eq!(body["contactId"], subscriber_hash.as_str());
}

#[tokio::test]
async fn submit_form_returns_500_when_the_update_fails() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "title": "Member Exists",
            "status": 400
        })))
        .mount(&test_app.mailchimp_server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "title": "Internal Server Error",
            "status": 500
        })))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia@test.com")).await;

    assert_eq!(500, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to update existing contact");
    assert_eq!(body["error"]["title"], "Internal Server Error");
}

#[tokio::test]
async fn submit_form_returns_400_when_required_fields_are_missing() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.mailchimp_server)
        .await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases: Vec<(Value, &str)> = vec![
        (serde_json::json!({}), "empty body"),
        (
            serde_json::json!({ "name": "Lucía", "phone": "600000000", "interests": "teatro" }),
            "missing email",
        ),
        (
            serde_json::json!({ "email": "lucia@test.com", "phone": "600000000", "interests": "teatro" }),
            "missing name",
        ),
        (
            serde_json::json!({ "email": "lucia@test.com", "name": "Lucía", "interests": "teatro" }),
            "missing phone",
        ),
        (
            serde_json::json!({ "email": "lucia@test.com", "name": "Lucía", "phone": "600000000" }),
            "missing interests",
        ),
        (
            serde_json::json!({ "email": "lucia@test.com", "name": "Lucía", "phone": "600000000", "interests": "  " }),
            "blank interests",
        ),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_submit_form(&invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );

        let body: Value = response.json().await.unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Missing required fields");
    }
}

#[tokio::test]
async fn submit_form_returns_400_when_email_is_invalid() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia.test.com")).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn submit_form_returns_400_when_body_is_not_json() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/submit-form", test_app.address))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn submit_form_echoes_mailchimp_errors() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "title": "Invalid Resource",
            "status": 400,
            "detail": "The resource submitted could not be validated."
        })))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia@test.com")).await;

    assert_eq!(500, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "The resource submitted could not be validated."
    );
    assert_eq!(body["error"]["title"], "Invalid Resource");
}

#[tokio::test]
async fn submit_form_succeeds_even_if_tagging_fails() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path(test_app.members_path()))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "member-id"
        })))
        .mount(&test_app.mailchimp_server)
        .await;

    Mock::given(path(format!("{}/member-id/tags", test_app.members_path())))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia@test.com")).await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn submit_form_without_mailchimp_configuration_fails() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.mailchimp.api_key = None;
    })
    .await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia@test.com")).await;

    assert_eq!(500, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["message"], "Mailchimp configuration not found");
}

#[tokio::test]
async fn simulated_submissions_never_reach_mailchimp() {
    let test_app = TestApp::spawn_app_with(|config| {
        config.application.simulate_submissions = true;
    })
    .await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.mailchimp_server)
        .await;

    let response = test_app.post_submit_form(&lead_form("lucia@test.com")).await;

    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["message"], "Form submitted successfully (dev mode)");
    assert!(body["contactId"].as_str().unwrap().starts_with("dev_"));
}

#[tokio::test]
async fn submit_form_rejects_other_methods() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get("/api/submit-form").await;

    assert_eq!(405, response.status().as_u16());

    let body: Value = response.json().await.unwrap();

    assert_eq!(body["message"], "Method not allowed");
}
