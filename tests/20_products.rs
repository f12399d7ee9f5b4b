mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn names(page: &Value) -> Vec<String> {
    page["content"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn first_page_sorted_by_name() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/products?page=0&size=12&sort=name").await?;
    assert_eq!(status, StatusCode::OK);

    let page = &body["data"];
    let names = names(page);
    assert_eq!(&names[..3], &["Macbook Pro", "PC Gamer", "PC Gamer Alfa"]);
    assert!(names.windows(2).all(|w| w[0] <= w[1]));
    assert!(page["totalElements"].as_i64().unwrap_or(0) >= 25);
    assert_eq!(page["first"], true);
    Ok(())
}

#[tokio::test]
async fn category_filter_keeps_full_category_sets() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/products?categoryId=2").await?;
    assert_eq!(status, StatusCode::OK);

    let content = body["data"]["content"].as_array().cloned().unwrap_or_default();
    assert!(!content.is_empty());
    for product in &content {
        let categories = product["categories"].as_array().cloned().unwrap_or_default();
        assert!(categories.iter().any(|c| c["id"] == 2));
    }
    let tv = content.iter().find(|p| p["name"] == "Smart TV").expect("Smart TV listed");
    assert_eq!(tv["categories"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn name_filter_ignores_case() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/products?name=MACBOOK").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["data"]), vec!["Macbook Pro"]);
    Ok(())
}

#[tokio::test]
async fn page_past_the_end_is_empty() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/products?page=100&size=10").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["empty"], true);
    assert!(body["data"]["totalElements"].as_i64().unwrap_or(0) >= 25);
    Ok(())
}

#[tokio::test]
async fn unknown_product_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = common::get_json(server, "/products/100000").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn operator_crud_cycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::login(server, "alex@gmail.com").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/products"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Zeta Phone",
            "description": "Created by the test suite",
            "price": 999.9,
            "imgUrl": null,
            "categories": [{ "id": 2 }, { "id": 3 }]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("location header");
    let created: Value = res.json().await?;
    let id = created["data"]["id"].as_i64().expect("id");
    assert_eq!(location, format!("/products/{}", id));

    let res = client
        .put(server.url(&location))
        .bearer_auth(&token)
        .json(&json!({ "name": "Zeta Phone 2", "price": 899.9, "categories": [{ "id": 1 }] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["data"]["categories"], json!([{ "id": 1, "name": "Books" }]));

    let res = client.delete(server.url(&location)).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (status, _) = common::get_json(server, &location).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() -> Result<()> {
    let server = common::ensure_server().await?;
    let token = common::login(server, "alex@gmail.com").await?;

    let res = reqwest::Client::new()
        .delete(server.url("/categories/3"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn anonymous_writes_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .delete(server.url("/products/1"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
