//! Sends a handful of example documents to a running docingest server.
//!
//! ```text
//! cargo run -p docingest-server --example insert_client [server-url]
//! ```

use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_SERVER_URL: &str = "http://localhost:50052";

async fn insert(client: &Client, server: &str, request: Value) -> anyhow::Result<()> {
    let resp = client
        .post(format!("{server}/v1/documents"))
        .json(&request)
        .send()
        .await?;
    println!("HTTP {}", resp.status());

    let body: Value = resp.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
    let client = Client::new();

    println!("1. Simple JSON document:");
    let simple = json!({
        "title": "Sample Document",
        "author": "John Doe",
        "created": "2024-01-01",
        "content": "This is a sample document."
    });
    insert(
        &client,
        &server,
        json!({
            "json_data": simple.to_string(),
            "collections": ["examples", "samples"]
        }),
    )
    .await?;

    println!("2. Nested document with URI, collections and metadata:");
    let nested = json!({
        "customer": {
            "id": 12345,
            "name": "Acme Corporation",
            "contacts": [
                {"type": "email", "value": "contact@acme.com"},
                {"type": "phone", "value": "+1-555-0123"}
            ]
        },
        "orders": [
            {"id": 1001, "total": 299.99, "status": "shipped"},
            {"id": 1002, "total": 149.50, "status": "pending"}
        ]
    });
    insert(
        &client,
        &server,
        json!({
            "json_data": nested.to_string(),
            "document_uri": "/customers/12345.json",
            "collections": ["customers", "active"],
            "metadata": {"source": "crm_system", "priority": "high"}
        }),
    )
    .await?;

    println!("3. JSON array document:");
    let employees = json!([
        {"name": "Alice", "age": 30, "department": "Engineering"},
        {"name": "Bob", "age": 25, "department": "Marketing"}
    ]);
    insert(
        &client,
        &server,
        json!({
            "json_data": employees.to_string(),
            "collections": ["employees", "directory"],
            "metadata": {"type": "employee_list"}
        }),
    )
    .await?;

    println!("4. Invalid JSON (expected 400):");
    insert(
        &client,
        &server,
        json!({ "json_data": r#"{"name": "Test", "invalid": }"# }),
    )
    .await?;

    Ok(())
}
