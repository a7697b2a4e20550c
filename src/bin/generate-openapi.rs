//! Prints the OpenAPI document as pretty JSON.
//!
//! `cargo run --bin generate-openapi > openapi.json`
use rust_pix_proxy::docs::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    println!("{}", ApiDoc::openapi().to_pretty_json()?);
    Ok(())
}
