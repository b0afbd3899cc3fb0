fn main() -> anyhow::Result<()> {
    caspar::run()
}
