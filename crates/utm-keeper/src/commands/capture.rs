use super::Context;
use serde_json::{json, Value};
use utm_keeper_core::CaptureOutcome;

pub fn run(ctx: &Context, url: &str) -> anyhow::Result<()> {
    println!("{}", capture(ctx, url)?);
    Ok(())
}

fn capture(ctx: &Context, url: &str) -> anyhow::Result<Value> {
    let keeper = ctx.keeper();
    let outcome = keeper.try_capture(Some(url))?;

    let output = match outcome {
        CaptureOutcome::Stored(record) => json!({
            "stored": true,
            "outcome": "stored",
            "params": record.params,
        }),
        CaptureOutcome::Retained(record) => json!({
            "stored": false,
            "outcome": "retained",
            "params": record.params,
        }),
        CaptureOutcome::NoParams => json!({
            "stored": false,
            "outcome": "no-params",
        }),
    };
    Ok(output)
}
