//! Conversation API integration tests over Postgres

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{authed_request, create_test_jwt, parse_body, ConversationsTestApp};

mod test_create_or_reuse {
    use super::*;

    #[tokio::test]
    async fn test_agent_chat_scenario() {
        let app = ConversationsTestApp::new().await.unwrap();
        let renter = app.create_account(10, "Renter").await.unwrap();
        let agent = app.create_account(20, "Agent").await.unwrap();
        let listing = app.create_listing(55, agent, "Sunny loft").await.unwrap();
        let profile = app.create_agent_profile(7, Some(agent)).await.unwrap();
        let jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();

        let body = json!({
            "target": {"type": "agent", "agent_profile_id": profile, "listing_id": listing},
            "initial_text": "Hello, is it still available?"
        });

        let resp = app
            .test_router()
            .oneshot(authed_request(Method::POST, "/v1/conversations", &jwt, Some(body.clone())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let first = parse_body(resp).await;
        let id: Uuid = first["conversation_id"].as_str().unwrap().parse().unwrap();

        assert_eq!(app.message_rows(id).await.unwrap(), 1);

        let resp = app
            .test_router()
            .oneshot(authed_request(Method::POST, "/v1/conversations", &jwt, Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let second = parse_body(resp).await;
        assert_eq!(second["conversation_id"], first["conversation_id"]);
        assert_eq!(second["was_created"], false);

        assert_eq!(app.message_rows(id).await.unwrap(), 1);
        assert_eq!(app.conversation_rows_between(renter, agent).await.unwrap(), 1);

        let agent_jwt = create_test_jwt(agent, None, &app.config.jwt_secret).unwrap();
        let resp = app
            .test_router()
            .oneshot(authed_request(Method::GET, "/v1/conversations", &agent_jwt, None))
            .await
            .unwrap();
        let inbox = parse_body(resp).await;
        assert_eq!(inbox[0]["unread_count"], 1);
        assert_eq!(inbox[0]["counterpart_name"], "Renter");
        assert_eq!(inbox[0]["context_title"], "Sunny loft");

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_self_contact_rejected() {
        let app = ConversationsTestApp::new().await.unwrap();
        let owner = app.create_account(10, "Owner").await.unwrap();
        let listing = app.create_listing(55, owner, "My place").await.unwrap();
        let jwt = create_test_jwt(owner, None, &app.config.jwt_secret).unwrap();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &jwt,
                Some(json!({"target": {"type": "listing", "listing_id": listing}})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_support_rules() {
        let app = ConversationsTestApp::new().await.unwrap();
        let support = app.support_account();
        let renter = app.account(10);
        let owner = app.account(20);
        let support_listing = app.create_listing(60, support, "Support").await.unwrap();
        let listing = app.create_listing(55, owner, "Loft").await.unwrap();

        // Ordinary user cannot target the support account
        let jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();
        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &jwt,
                Some(json!({"target": {"type": "listing", "listing_id": support_listing}})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Support cannot cold-open a conversation
        let jwt = create_test_jwt(support, None, &app.config.jwt_secret).unwrap();
        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &jwt,
                Some(json!({"target": {"type": "listing", "listing_id": listing}})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(app.conversation_rows_between(support, owner).await.unwrap(), 0);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_unlinked_agent_falls_back_to_profile_id() {
        let app = ConversationsTestApp::new().await.unwrap();
        let renter = app.account(10);
        let profile = app.create_agent_profile(30, None).await.unwrap();
        let jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &jwt,
                Some(json!({"target": {"type": "agent", "agent_profile_id": profile}})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(app.conversation_rows_between(renter, profile).await.unwrap(), 1);

        app.cleanup().await.unwrap();
    }
}

mod test_messaging {
    use super::*;

    #[tokio::test]
    async fn test_send_open_and_page_history() {
        let app = ConversationsTestApp::new().await.unwrap();
        let renter = app.create_account(10, "Renter").await.unwrap();
        let owner = app.create_account(20, "Owner").await.unwrap();
        let listing = app.create_listing(55, owner, "Loft").await.unwrap();
        let renter_jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();
        let owner_jwt = create_test_jwt(owner, None, &app.config.jwt_secret).unwrap();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &renter_jwt,
                Some(json!({"target": {"type": "listing", "listing_id": listing}})),
            ))
            .await
            .unwrap();
        let id = parse_body(resp).await["conversation_id"]
            .as_str()
            .unwrap()
            .to_string();

        for i in 0..12 {
            let jwt = if i % 2 == 0 { &renter_jwt } else { &owner_jwt };
            let resp = app
                .test_router()
                .oneshot(authed_request(
                    Method::POST,
                    &format!("/v1/conversations/{}/messages", id),
                    jwt,
                    Some(json!({ "body": format!("msg {}", i) })),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &owner_jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let opened = parse_body(resp).await;
        assert_eq!(opened["total"], 12);
        assert_eq!(opened["can_load_more"], true);

        let mut loaded: Vec<String> = opened["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["body"].as_str().unwrap().to_string())
            .collect();

        loop {
            let resp = app
                .test_router()
                .oneshot(authed_request(
                    Method::GET,
                    &format!(
                        "/v1/conversations/{}/messages?skip={}&take=5",
                        id,
                        loaded.len()
                    ),
                    &owner_jwt,
                    None,
                ))
                .await
                .unwrap();
            let page = parse_body(resp).await;
            let mut older: Vec<String> = page["messages"]
                .as_array()
                .unwrap()
                .iter()
                .map(|m| m["body"].as_str().unwrap().to_string())
                .collect();
            older.extend(loaded);
            loaded = older;
            if page["can_load_more"] == false {
                break;
            }
        }

        let expected: Vec<String> = (0..12).map(|i| format!("msg {}", i)).collect();
        assert_eq!(loaded, expected);

        // Opening marked the renter's messages read for the owner
        let resp = app
            .test_router()
            .oneshot(authed_request(Method::GET, "/v1/conversations", &owner_jwt, None))
            .await
            .unwrap();
        assert_eq!(parse_body(resp).await[0]["unread_count"], 0);

        let resp = app
            .test_router()
            .oneshot(authed_request(Method::GET, "/v1/conversations", &renter_jwt, None))
            .await
            .unwrap();
        assert_eq!(parse_body(resp).await[0]["unread_count"], 6);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_outsider_cannot_send_or_delete() {
        let app = ConversationsTestApp::new().await.unwrap();
        let renter = app.account(10);
        let owner = app.account(20);
        let outsider = app.account(30);
        let listing = app.create_listing(55, owner, "Loft").await.unwrap();
        let renter_jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();
        let outsider_jwt = create_test_jwt(outsider, None, &app.config.jwt_secret).unwrap();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &renter_jwt,
                Some(json!({"target": {"type": "listing", "listing_id": listing}})),
            ))
            .await
            .unwrap();
        let id = parse_body(resp).await["conversation_id"]
            .as_str()
            .unwrap()
            .to_string();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                &format!("/v1/conversations/{}/messages", id),
                &outsider_jwt,
                Some(json!({"body": "hi"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/v1/conversations/{}", id),
                &outsider_jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        app.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages() {
        let app = ConversationsTestApp::new().await.unwrap();
        let renter = app.account(10);
        let owner = app.account(20);
        let listing = app.create_listing(55, owner, "Loft").await.unwrap();
        let renter_jwt = create_test_jwt(renter, None, &app.config.jwt_secret).unwrap();
        let owner_jwt = create_test_jwt(owner, None, &app.config.jwt_secret).unwrap();

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::POST,
                "/v1/conversations",
                &renter_jwt,
                Some(json!({
                    "target": {"type": "listing", "listing_id": listing},
                    "initial_text": "hello"
                })),
            ))
            .await
            .unwrap();
        let id: Uuid = parse_body(resp).await["conversation_id"]
            .as_str()
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(app.message_rows(id).await.unwrap(), 1);

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::DELETE,
                &format!("/v1/conversations/{}", id),
                &owner_jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(app.message_rows(id).await.unwrap(), 0);

        let resp = app
            .test_router()
            .oneshot(authed_request(
                Method::GET,
                &format!("/v1/conversations/{}", id),
                &renter_jwt,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        app.cleanup().await.unwrap();
    }
}
