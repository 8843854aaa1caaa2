use super::Context;

/// Stored parameters as a query string
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", ctx.keeper().to_query_string());
    Ok(())
}

/// Stored parameters as a JSON object
pub fn run_object(ctx: &Context) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&ctx.keeper().to_object())?);
    Ok(())
}
