//! `thosua ask`

use crate::config::loader::load_config;
use anyhow::{Context, Result};
use std::sync::Arc;
use thosua_diagnosis::{GeminiTransport, RepairAssistant};

pub async fn run(message: &str) -> Result<()> {
    let config = load_config()?;
    let transport = GeminiTransport::new(config.gemini.to_gemini_config()?)
        .context("Failed to create Gemini transport")?;
    let assistant = RepairAssistant::new(Arc::new(transport));

    let reply = assistant
        .ask(&[], message)
        .await
        .context("Assistant request failed")?;
    println!("{}", reply);
    Ok(())
}
