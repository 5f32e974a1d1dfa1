//! Read-only informational commands: models, config

use anyhow::Result;
use serde_json::{Map, Value, json};

use creaturedex_config::Config;
use creaturedex_llm::ModelName;

use super::common::emit_json;

pub fn execute_models_command(json: bool) -> Result<()> {
    if json {
        let models: Vec<Value> = ModelName::ALL
            .into_iter()
            .map(|model| {
                json!({
                    "name": model.as_str(),
                    "wire_model": model.wire_model(),
                    "local": model.is_local(),
                })
            })
            .collect();
        return emit_json(&models);
    }

    println!("Models accepted by the openai provider:");
    for model in ModelName::ALL {
        let location = if model.is_local() { "local" } else { "hosted" };
        println!("  {:<14} {:<8} sent as {}", model.as_str(), location, model.wire_model());
    }
    println!("\nThe anthropic provider accepts claude-* model ids.");
    Ok(())
}

pub fn execute_config_command(json: bool, config: &Config) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let entries: Map<String, Value> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, json!({ "value": value, "source": source })))
            .collect();
        return emit_json(&entries);
    }

    println!("Effective configuration:");
    for (key, (value, source)) in &effective {
        println!("  {key} = {value}  ({source})");
    }
    Ok(())
}
