//! Drives a running server: upload a document, then ask for domain names.
//!
//! cargo run --example client -- path/to/profile.pdf orbit

use reqwest::{multipart, Client};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let file_path = args.next().ok_or("usage: client <file.pdf|file.docx> <keyword>")?;
    let keyword = args.next().unwrap_or_default();

    let client = Client::new();
    let base_url = std::env::var("DOMAIN_NAMER_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

    println!("Health Check:");
    let health_response = client.get(format!("{}/health", base_url)).send().await?;
    println!("Status: {}", health_response.status());

    println!("\nUpload:");
    let filename = std::path::Path::new(&file_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or("file path has no file name")?;
    let bytes = tokio::fs::read(&file_path).await?;
    let form = multipart::Form::new().part("file", multipart::Part::bytes(bytes).file_name(filename));

    let upload_response = client
        .post(format!("{}/api/upload", base_url))
        .multipart(form)
        .send()
        .await?;
    println!("Status: {}", upload_response.status());
    let upload_json: serde_json::Value = upload_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&upload_json)?);

    println!("\nGenerate:");
    let advise_response = client
        .post(format!("{}/api/advise", base_url))
        .json(&json!({ "keyword": keyword }))
        .send()
        .await?;
    println!("Status: {}", advise_response.status());
    let advise_json: serde_json::Value = advise_response.json().await?;

    match advise_json["text"].as_str() {
        Some(text) => println!("{}", text),
        None => println!("Response: {}", serde_json::to_string_pretty(&advise_json)?),
    }

    Ok(())
}
