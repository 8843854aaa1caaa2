use super::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    if !ctx.keeper().clear() {
        anyhow::bail!("failed to clear record {:?}", ctx.config.storage_key);
    }
    println!("cleared {}", ctx.config.storage_key);
    Ok(())
}
