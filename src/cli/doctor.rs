//! `thosua doctor`

use crate::config::loader::load_config;
use crate::config::{AppConfig, ConfigValidator};
use std::path::Path;
use thosua_diagnosis::util::mask_api_key;

pub async fn run() -> anyhow::Result<()> {
    println!("🏥 Thợ Sửa Doctor\n");

    let mut all_ok = true;

    all_ok &= check_env_file();
    let config = match load_config() {
        Ok(config) => {
            println!("Loading configuration... ✅");
            config
        }
        Err(e) => {
            println!("Loading configuration... ❌ {:#}", e);
            return finish(false);
        }
    };
    all_ok &= check_api_key(&config);
    all_ok &= check_settings(&config);

    finish(all_ok)
}

fn finish(all_ok: bool) -> anyhow::Result<()> {
    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to diagnose.");
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        std::process::exit(1);
    }
    Ok(())
}

fn check_env_file() -> bool {
    print!("Checking .env file... ");
    if Path::new(".env").exists() {
        println!("✅ found");
    } else {
        println!("⚠️  not found (environment variables only)");
    }
    true
}

fn check_api_key(config: &AppConfig) -> bool {
    print!("Checking Gemini API key... ");
    match config.gemini.api_key() {
        Some(key) => {
            println!("✅ {}", mask_api_key(key));
            true
        }
        None => {
            println!("❌ not set (GEMINI_API_KEY or [gemini] api_key)");
            false
        }
    }
}

fn check_settings(config: &AppConfig) -> bool {
    print!("Checking settings... ");
    let issues = ConfigValidator::validate(config);
    if issues.is_empty() {
        println!(
            "✅ model={} chat={}s vision={}s retries={} technicians={}",
            config.gemini.model,
            config.gemini.chat_timeout_secs,
            config.gemini.vision_timeout_secs,
            config.gemini.max_retries,
            config.roster().len()
        );
        return true;
    }
    println!("❌");
    for issue in issues {
        println!("   - {}", issue);
    }
    false
}
