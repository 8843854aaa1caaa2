pub fn run() -> anyhow::Result<()> {
    println!("utm-keeper {}", env!("CARGO_PKG_VERSION"));
    println!("First-touch / last-touch UTM attribution keeper");
    Ok(())
}
