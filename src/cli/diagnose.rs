//! `thosua diagnose`

use super::DiagnoseArgs;
use crate::config::loader::load_config;
use anyhow::{Context, Result};
use std::sync::Arc;
use thosua_diagnosis::{DiagnosisInput, DiagnosisResult, Diagnoser, Error, GeminiTransport};

pub async fn run(args: DiagnoseArgs) -> Result<()> {
    let config = load_config()?;
    let transport = GeminiTransport::new(config.gemini.to_gemini_config()?)
        .context("Failed to create Gemini transport")?;
    let diagnoser = Diagnoser::new(Arc::new(transport), config.roster());

    let input = match (args.text, args.image) {
        (Some(text), _) => DiagnosisInput::text(text),
        (None, Some(path)) => DiagnosisInput::image_from_path(&path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?,
        (None, None) => anyhow::bail!("Provide --text or --image"),
    };

    let result = match diagnoser.diagnose(&input).await {
        Ok(result) => result,
        Err(e) if e.is_transport() => {
            tracing::debug!(error = %e, "Diagnosis call failed");
            eprintln!("❌ {}", failure_message(&e));
            eprintln!("   Vui lòng thử lại sau.");
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn print_summary(result: &DiagnosisResult) {
    println!("🔧 Kết quả chẩn đoán\n");
    println!("  Thiết bị:   {}", result.category);
    println!("  Vấn đề:     {}", result.problem);
    println!("  Mức độ:     {}", result.severity);
    println!("  Giải pháp:  {}", result.solution);
    println!("  Chi phí:    {}", result.estimated_cost);

    println!("\n👷 Thợ đề xuất");
    for technician in &result.recommended_technicians {
        println!(
            "  - {} ({}) ⭐ {:.1} · {} việc · từ {}",
            technician.name, technician.specialty, technician.rating, technician.jobs, technician.price
        );
    }
}

/// Vietnamese wording for a failed call
fn failure_message(error: &Error) -> String {
    match error {
        Error::Timeout(ms) => format!(
            "Dịch vụ chẩn đoán không phản hồi sau {} giây",
            ms.div_ceil(1000)
        ),
        Error::RateLimit => "Dịch vụ chẩn đoán đang quá tải".to_string(),
        Error::Network(_) => "Không thể kết nối dịch vụ chẩn đoán".to_string(),
        // Already reduced to a Vietnamese description by the transport
        Error::ServerError(detail) | Error::Api(detail) => detail.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_are_localized() {
        assert_eq!(
            failure_message(&Error::Timeout(30_000)),
            "Dịch vụ chẩn đoán không phản hồi sau 30 giây"
        );
        assert_eq!(
            failure_message(&Error::Network("error sending request".to_string())),
            "Không thể kết nối dịch vụ chẩn đoán"
        );
        assert_eq!(
            failure_message(&Error::ServerError(
                "Dịch vụ chẩn đoán tạm thời gián đoạn (HTTP 503)".to_string()
            )),
            "Dịch vụ chẩn đoán tạm thời gián đoạn (HTTP 503)"
        );
    }
}
