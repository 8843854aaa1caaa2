use super::Context;

pub fn run(ctx: &Context, url: &str) -> anyhow::Result<()> {
    println!("{}", ctx.keeper().append_to_url(url));
    Ok(())
}
