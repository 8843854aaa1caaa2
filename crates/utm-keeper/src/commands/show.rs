use super::Context;
use chrono::SecondsFormat;
use serde_json::{json, Value};

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&show(ctx))?);
    Ok(())
}

fn show(ctx: &Context) -> Value {
    match ctx.keeper().get_record() {
        Some(record) => json!({
            "key": ctx.config.storage_key,
            "params": record.params,
            "timestamp": record.captured_at,
            "expiresAt": record.expires_at,
            "captured": record.captured_at_utc().map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            "expires": record.expires_at_utc().map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }),
        None => Value::Null,
    }
}
