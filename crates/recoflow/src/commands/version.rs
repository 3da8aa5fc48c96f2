pub fn run() -> anyhow::Result<()> {
    println!("recoflow {}", env!("CARGO_PKG_VERSION"));
    println!("Session reconstruction and blended recommendations");
    Ok(())
}
