//! Talks to a real model runtime. Enable with `--features live_runtime` and
//! RUN_LIVE_RUNTIME_TESTS=1; the runtime is picked from the normal config.

#[allow(unused_imports)]
use anyhow::Result;
#[allow(unused_imports)]
use serde_json::Map;

#[tokio::test]
#[cfg(feature = "live_runtime")]
async fn test_live_reflection() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    if std::env::var("RUN_LIVE_RUNTIME_TESTS").is_err() {
        eprintln!("Skipping live runtime test - set RUN_LIVE_RUNTIME_TESTS=1 to run");
        return Ok(());
    }

    let config = persona_reflect::Config::load()?;
    let orchestrator = persona_reflect::Orchestrator::from_config(&config)?;
    let result = orchestrator
        .process_dilemma(
            "live-test",
            "I can't decide whether to take a weekend off or finish a side project.",
            Map::new(),
        )
        .await?;

    assert_eq!(result.responses.len(), 4);
    assert!(result.responses.iter().any(|r| !r.is_fallback()));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
